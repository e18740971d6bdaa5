//! Error types for Tributary
//!
//! Only fatal conditions are represented here; advisory conditions (rate
//! limit notices, missing-amount anomalies, skipped records) are accumulated
//! in a [`crate::progress::ProgressInformation`] instead of being raised.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Download error: {0}")]
    Download(String),

    #[error("Agreement expired: {0}")]
    AgreementExpired(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Ledger API error: {0}")]
    Ledger(String),

    #[error("Unknown field \"{0}\" requested at index {1}")]
    UnknownField(String, usize),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
