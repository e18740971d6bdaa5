//! SimpleFIN bridge payload reader
//!
//! SimpleFIN is a read-only aggregator: one token, one account set, unix
//! timestamps and string amounts. It reports no counter-party IBANs, only a
//! payee description, so generated transactions lean on the name side.

use chrono::DateTime;
use serde::Deserialize;
use tracing::warn;

use super::{ImportServiceAccount, ProviderTransaction};
use crate::models::LedgerAccountType;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountSet {
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub accounts: Vec<SimplefinAccount>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimplefinAccount {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub balance: String,
    #[serde(default, rename = "balance-date")]
    pub balance_date: i64,
    #[serde(default)]
    pub transactions: Vec<SimplefinTransaction>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimplefinTransaction {
    pub id: String,
    pub posted: i64,
    pub amount: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub payee: Option<String>,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub pending: Option<bool>,
}

/// Parse a raw account-set response body
pub fn parse(body: &str) -> crate::error::Result<AccountSet> {
    Ok(serde_json::from_str(body)?)
}

/// Ledger account type for a SimpleFIN account kind
///
/// Credit cards are debt accounts; loans and mortgages get their specific
/// ledger types; everything cash-like is an asset.
pub fn ledger_account_type(kind: &str) -> LedgerAccountType {
    match kind.to_lowercase().as_str() {
        "checking" | "savings" | "investment" => LedgerAccountType::Asset,
        "credit" => LedgerAccountType::Debt,
        "loan" => LedgerAccountType::Loan,
        "mortgage" => LedgerAccountType::Mortgage,
        _ => LedgerAccountType::Unknown,
    }
}

/// Lower one SimpleFIN transaction into the shared record
pub fn to_provider_transaction(
    tx: &SimplefinTransaction,
    account_id: &str,
) -> ProviderTransaction {
    let made_on = DateTime::from_timestamp(tx.posted, 0);
    if made_on.is_none() {
        warn!(
            "Transaction \"{}\" has an unusable posted timestamp {}.",
            tx.id, tx.posted
        );
    }
    let status = match tx.pending {
        Some(true) => "pending",
        _ => "posted",
    };
    ProviderTransaction {
        account_id: account_id.to_string(),
        external_id: tx.id.clone(),
        made_on,
        amount: tx.amount.clone(),
        description: tx.description.clone(),
        status: status.to_string(),
        payer_name: tx.payee.clone(),
        payee_name: tx.payee.clone(),
        extra_information: tx.memo.clone(),
        ..ProviderTransaction::default()
    }
}

/// Provider-side account metadata for one SimpleFIN account
pub fn to_service_account(account: &SimplefinAccount) -> ImportServiceAccount {
    ImportServiceAccount {
        id: account.id.clone(),
        name: account.name.clone(),
        currency_code: if account.currency.is_empty() {
            None
        } else {
            Some(account.currency.clone())
        },
        ..ImportServiceAccount::default()
    }
}
