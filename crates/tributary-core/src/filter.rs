//! Duplicate and validity filtering of generated batches
//!
//! A transfer between two imported accounts is downloaded twice, once from
//! each side. Both generate the same transfer, so the second occurrence is
//! dropped by content hash. Candidates that lost their amount or date along
//! the way are dropped here too, with a warning, before submission can
//! fail on them.

use std::collections::HashSet;
use std::str::FromStr;

use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::models::{ImportBatch, Transaction, TransactionType};
use crate::progress::ProgressInformation;

#[derive(Debug, Default)]
pub struct FilterTransactions {
    progress: ProgressInformation,
}

impl FilterTransactions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn progress(&self) -> &ProgressInformation {
        &self.progress
    }

    /// Drop unusable and duplicate candidates, keeping the original order
    pub fn filter(&mut self, batches: Vec<ImportBatch>) -> Vec<ImportBatch> {
        let mut seen_transfers: HashSet<String> = HashSet::new();
        let mut kept = Vec::new();

        for (position, batch) in batches.into_iter().enumerate() {
            let index = position + 1;
            let Some(tx) = batch.transactions.first() else {
                continue;
            };

            if Decimal::from_str(&tx.amount).map(|amount| amount.is_zero()).unwrap_or(true) {
                self.progress.add_warning(
                    index,
                    format!(
                        "Transaction \"{}\" has no valid amount and was not imported.",
                        tx.external_id
                    ),
                );
                continue;
            }
            if tx.date.is_empty() {
                self.progress.add_warning(
                    index,
                    format!(
                        "Transaction \"{}\" has no date and was not imported.",
                        tx.external_id
                    ),
                );
                continue;
            }

            if tx.transaction_type == TransactionType::Transfer {
                let hash = transfer_hash(tx);
                if !seen_transfers.insert(hash) {
                    self.progress.add_message(
                        index,
                        format!(
                            "Transaction \"{}\" is the other side of an already imported transfer and was skipped.",
                            tx.external_id
                        ),
                    );
                    continue;
                }
            }

            kept.push(batch);
        }

        debug!("Filtered transactions down to {}.", kept.len());
        kept
    }
}

/// Content hash identifying one transfer regardless of which side reported it
fn transfer_hash(tx: &Transaction) -> String {
    let amount = Decimal::from_str(&tx.amount)
        .map(|amount| amount.abs().to_string())
        .unwrap_or_else(|_| tx.amount.clone());
    let mut sides = [side_key(&tx.source_id, &tx.source_name, &tx.source_iban),
        side_key(&tx.destination_id, &tx.destination_name, &tx.destination_iban)];
    sides.sort();

    let mut hasher = Sha256::new();
    hasher.update(tx.date.as_bytes());
    hasher.update(amount.as_bytes());
    hasher.update(sides[0].as_bytes());
    hasher.update(sides[1].as_bytes());
    hex::encode(hasher.finalize())
}

fn side_key(id: &Option<u32>, name: &Option<String>, iban: &Option<String>) -> String {
    if let Some(id) = id {
        return format!("id:{}", id);
    }
    format!(
        "name:{}|iban:{}",
        name.as_deref().unwrap_or(""),
        iban.as_deref().unwrap_or("")
    )
}
