//! Salt Edge (account information API) payload reader
//!
//! Salt Edge keeps the interesting parts — payer, payee, posting times,
//! free-text extras — in a nested `extra` object. The reader folds those
//! into the shared record; the generator later concatenates the extras into
//! the transaction notes.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::ProviderTransaction;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaltEdgeTransaction {
    pub id: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub status: String,
    pub made_on: NaiveDate,
    pub amount: Decimal,
    #[serde(default)]
    pub currency_code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub duplicated: bool,
    #[serde(default)]
    pub extra: SaltEdgeExtra,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaltEdgeExtra {
    #[serde(default)]
    pub information: Option<String>,
    #[serde(default)]
    pub additional: Option<String>,
    #[serde(default)]
    pub payer: Option<String>,
    #[serde(default)]
    pub payer_iban: Option<String>,
    #[serde(default)]
    pub payee: Option<String>,
    #[serde(default)]
    pub payee_iban: Option<String>,
    #[serde(default)]
    pub posting_date: Option<NaiveDate>,
    #[serde(default)]
    pub posting_time: Option<String>,
}

/// Lower a Salt Edge transaction into the shared record
pub fn to_provider_transaction(tx: &SaltEdgeTransaction) -> ProviderTransaction {
    ProviderTransaction {
        account_id: tx.account_id.clone(),
        external_id: tx.id.clone(),
        made_on: Some(midnight(tx.made_on)),
        amount: tx.amount.to_string(),
        currency_code: tx.currency_code.clone(),
        description: tx.description.clone(),
        mode: tx.mode.clone(),
        status: tx.status.clone(),
        category: tx.category.clone(),
        payer_name: tx.extra.payer.clone(),
        payer_iban: tx.extra.payer_iban.clone(),
        payee_name: tx.extra.payee.clone(),
        payee_iban: tx.extra.payee_iban.clone(),
        extra_information: tx.extra.information.clone(),
        extra_additional: tx.extra.additional.clone(),
        posting_date: tx.extra.posting_date.map(midnight),
        posting_time: tx.extra.posting_time.clone(),
        ..ProviderTransaction::default()
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}
