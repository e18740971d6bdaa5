//! Provider rate-limit tracking and user-facing advisories
//!
//! Providers report a remaining-call budget and a reset countdown per
//! account during download. None of it ever aborts a run; the messenger
//! turns the numbers into warnings and notices on the progress report.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::LedgerAccount;
use crate::progress::ProgressInformation;

/// Remaining-call budget for one provider account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub account_id: String,
    pub remaining: i64,
    /// Seconds until the budget resets
    pub reset: i64,
}

/// Reset countdowns at or below this are provider filler, not information
const RESET_REPORT_FLOOR: i64 = 60;

/// Remaining-call counts at or below this get a heads-up notice
const LOW_REMAINING_THRESHOLD: i64 = 3;

/// Human-readable reset duration, cascading hours/minutes/seconds
pub fn format_reset(seconds: i64) -> String {
    if seconds <= 0 {
        return "0 seconds".to_string();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut parts = Vec::new();
    if hours == 1 {
        parts.push("1 hour".to_string());
    }
    if hours > 1 {
        parts.push(format!("{} hours", hours));
    }
    if minutes == 1 {
        parts.push("1 minute".to_string());
    }
    if minutes > 1 {
        parts.push(format!("{} minutes", minutes));
    }
    if secs == 1 {
        parts.push("1 second".to_string());
    }
    if secs > 1 {
        parts.push(format!("{} seconds", secs));
    }
    parts.join(", ")
}

/// The advisory text for one account's rate limit
pub fn rate_limit_message(account: &LedgerAccount, limit: &RateLimit) -> String {
    let mut message = if limit.remaining == 0 {
        format!(
            "You have no requests left for bank account \"{}\"",
            account.name
        )
    } else {
        format!(
            "You have {} request(s) left for bank account \"{}\"",
            limit.remaining, account.name
        )
    };
    if let Some(iban) = account.iban.as_deref() {
        if !iban.is_empty() {
            message.push_str(&format!(" (IBAN {})", iban));
        }
    }
    if let Some(number) = account.number.as_deref() {
        if !number.is_empty() {
            message.push_str(&format!(" (account number {})", number));
        }
    }
    if limit.remaining == 0 {
        message.push_str(&format!(". The limit resets in {}.", format_reset(limit.reset)));
    } else {
        message.push('.');
    }
    message
}

/// Report tracked limits against the user's ledger accounts
///
/// Exhausted budgets become warnings, nearly-exhausted budgets become
/// rate-limit notices, everything else stays silent. Limits whose reset
/// countdown sits at the provider's default are skipped entirely.
pub fn report(
    limits: &BTreeMap<u32, RateLimit>,
    user_accounts: &[LedgerAccount],
    progress: &mut ProgressInformation,
) {
    debug!("Add messages about rate limits.");
    for (account_id, limit) in limits {
        if limit.reset <= RESET_REPORT_FLOOR {
            debug!(
                "Account \"{}\" has no interesting rate limit information.",
                account_id
            );
            continue;
        }
        let Some(account) = user_accounts.iter().find(|account| account.id == *account_id)
        else {
            debug!("Found no ledger account to report on, will not report rate limit.");
            continue;
        };
        let message = rate_limit_message(account, limit);
        if limit.remaining == 0 {
            progress.add_warning(0, message);
            continue;
        }
        if limit.remaining <= LOW_REMAINING_THRESHOLD {
            progress.add_rate_limit(0, message);
        }
    }
}
