//! Provider and ledger collaborator contracts
//!
//! The pipeline never talks HTTP itself. Downloading, account listing and
//! transaction submission happen behind the async traits here, implemented
//! elsewhere against the real services and by mocks in tests.
//!
//! Every provider reader lowers its native payload into the shared
//! [`ProviderTransaction`] record, which is what the generator consumes.

pub mod gocardless;
pub mod saltedge;
pub mod simplefin;
pub mod token;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::NewAccount;
use crate::error::Result;
use crate::models::{ImportBatch, LedgerAccount};
use crate::normalize::RawTransaction;
use crate::ratelimit::RateLimit;

/// A provider-native transaction lowered to the shape the generator expects
///
/// `amount` is a signed decimal string: positive means money arrived at the
/// provider account, negative means it left. The payer describes the far
/// side of incoming money, the payee the far side of outgoing money.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderTransaction {
    pub account_id: String,
    pub external_id: String,
    pub made_on: Option<DateTime<Utc>>,
    pub amount: String,
    pub currency_code: String,
    #[serde(default)]
    pub currency_id: Option<u32>,
    pub description: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub category: String,
    pub payer_name: Option<String>,
    pub payer_iban: Option<String>,
    pub payee_name: Option<String>,
    pub payee_iban: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub extra_information: Option<String>,
    pub extra_additional: Option<String>,
    pub posting_date: Option<DateTime<Utc>>,
    pub posting_time: Option<String>,
}

impl ProviderTransaction {
    /// Lower a normalized raw record (statement or flat-file source)
    ///
    /// Raw records only know "the opposing side", so it becomes both payer
    /// and payee; the generator picks the right one from the amount's sign.
    /// Records without a usable amount or date produce `None` — this is the
    /// degraded path out of normalization and the caller decides whether to
    /// warn or drop.
    pub fn from_raw(raw: RawTransaction, account_id: &str) -> Option<Self> {
        let amount = raw.amount?;
        let made_on = raw
            .date
            .as_deref()
            .and_then(parse_timestamp)
            .map(|naive| naive.and_utc())?;
        Some(Self {
            account_id: account_id.to_string(),
            external_id: raw.external_id.unwrap_or_default(),
            made_on: Some(made_on),
            amount,
            currency_code: raw.currency_code.unwrap_or_default(),
            currency_id: raw.currency_id,
            description: raw.description.unwrap_or_default(),
            category: raw.category.unwrap_or_default(),
            payer_name: raw.opposing_name.clone(),
            payer_iban: raw.opposing_iban.clone(),
            payee_name: raw.opposing_name,
            payee_iban: raw.opposing_iban,
            tags: raw.tags,
            extra_information: raw.notes,
            ..Self::default()
        })
    }
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(timestamp);
    }
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Account metadata as reported by the provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportServiceAccount {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub iban: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub currency_code: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Result of downloading one provider account
#[derive(Debug, Clone, Default)]
pub struct Download {
    pub transactions: Vec<ProviderTransaction>,
    pub rate_limit: Option<RateLimit>,
}

/// A bank-data provider (aggregator API or bridge)
///
/// Implementations own timeouts, retries and backoff; the conversion
/// routine only sequences the calls.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Download the raw transactions of one account, plus whatever
    /// rate-limit headers the provider surfaced
    async fn download_transactions(&self, account_id: &str) -> Result<Download>;

    /// List all accounts the provider agreement grants access to
    async fn list_accounts(&self) -> Result<Vec<ImportServiceAccount>>;

    /// Fetch metadata of a single account
    async fn account_metadata(&self, account_id: &str) -> Result<ImportServiceAccount>;
}

/// The ledger system receiving the converted transactions
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn list_accounts(&self) -> Result<Vec<LedgerAccount>>;

    /// Find an account matching the provider account, creating it from the
    /// request when nothing matches
    async fn find_or_create_account(
        &self,
        account: &ImportServiceAccount,
        request: &NewAccount,
    ) -> Result<LedgerAccount>;

    async fn submit_transactions(&self, batch: &ImportBatch) -> Result<()>;
}
