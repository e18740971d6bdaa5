//! Tributary Core Library
//!
//! Conversion pipeline turning heterogeneous bank data into canonical
//! ledger transactions:
//! - Hierarchical statement model and field extractor (CAMT-style files)
//! - Flat-file reader and amount/currency normalization stages
//! - Provider payload readers (GoCardless, Salt Edge, SimpleFIN)
//! - Transaction generator with counter-party and transfer resolution
//! - Duplicate/validity filter
//! - The conversion routine sequencing it all, with per-run progress
//!   reporting and rate-limit advisories
//!
//! Network clients for the providers and the ledger are consumed through
//! traits; this crate contains no HTTP.

pub mod camt;
pub mod config;
pub mod error;
pub mod filter;
pub mod generate;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod providers;
pub mod ratelimit;
pub mod routine;
pub mod tabular;

/// Test utilities including mock provider/ledger clients
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use camt::{StatementTransaction, TIME_FORMAT};
pub use config::{Configuration, NewAccount};
pub use error::{Error, Result};
pub use filter::FilterTransactions;
pub use generate::GenerateTransactions;
pub use models::{
    ImportBatch, LedgerAccount, LedgerAccountType, Transaction, TransactionType,
};
pub use normalize::RawTransaction;
pub use progress::{ProgressInformation, ProgressReport};
pub use providers::{
    Download, ImportServiceAccount, LedgerClient, ProviderClient, ProviderTransaction,
};
pub use ratelimit::RateLimit;
pub use routine::{ConversionResult, RoutineManager};
