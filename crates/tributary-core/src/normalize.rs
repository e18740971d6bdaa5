//! Amount and currency normalization stages
//!
//! Raw records arrive with up to four candidate amount columns, depending on
//! how the source bank lays out its export. The stages here are pure
//! `RawTransaction -> RawTransaction` functions composed by the caller, so
//! each one stays independently testable.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::models::TransactionType;

/// A transaction record as read from a source, before normalization
///
/// Created by a provider-specific reader, mutated once by the stages in this
/// module, then consumed by the generator. After the amount stage only the
/// `amount` field carries a value; the candidate columns and the modifier are
/// gone. A record can come out of the amount stage with `amount: None` when
/// no candidate was usable, which downstream consumers must detect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub date: Option<String>,
    pub description: Option<String>,
    pub amount: Option<String>,
    pub amount_debit: Option<String>,
    pub amount_credit: Option<String>,
    pub amount_negated: Option<String>,
    /// `"1"` or `"-1"`, applied to the selected amount
    pub amount_modifier: Option<String>,
    pub foreign_amount: Option<String>,
    pub currency_id: Option<u32>,
    pub currency_code: Option<String>,
    pub foreign_currency_code: Option<String>,
    pub transaction_type: Option<TransactionType>,
    pub opposing_name: Option<String>,
    pub opposing_iban: Option<String>,
    pub opposing_number: Option<String>,
    pub category: Option<String>,
    pub external_id: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// True when the string parses as an exact decimal and is not zero
fn valid_amount(amount: &str) -> bool {
    if amount.is_empty() {
        return false;
    }
    match Decimal::from_str(amount) {
        Ok(value) => !value.is_zero(),
        Err(_) => false,
    }
}

fn first_valid(tx: &RawTransaction) -> Option<String> {
    let candidates = [
        ("amount", &tx.amount),
        ("amount_debit", &tx.amount_debit),
        ("amount_credit", &tx.amount_credit),
        ("amount_negated", &tx.amount_negated),
    ];
    for (field, candidate) in candidates {
        if let Some(value) = candidate {
            if valid_amount(value) {
                debug!(
                    "Field \"{}\" holds a usable value (\"{}\"), assume this is the correct one.",
                    field, value
                );
                return Some(value.clone());
            }
        }
    }
    None
}

/// Select and sign the amount of a raw record
///
/// Candidates are tried in priority order: `amount`, `amount_debit`,
/// `amount_credit`, `amount_negated`. The winner is multiplied by the
/// modifier with exact decimal arithmetic and stored back as `amount`; the
/// other candidates and the modifier are discarded. When no candidate is
/// usable the record is returned without an amount and without a modifier —
/// deliberately not an error, the caller decides what a missing amount means.
pub fn amount_stage(mut tx: RawTransaction) -> RawTransaction {
    let selected = first_valid(&tx);

    let modifier = match tx.amount_modifier.clone() {
        Some(modifier) => modifier,
        None => {
            debug!("Missing amount modifier, defaulting to \"1\".");
            "1".to_string()
        }
    };

    let Some(selected) = selected else {
        error!("No candidate amount field is usable. This will give problems further ahead.");
        tx.amount = None;
        tx.amount_modifier = None;
        return tx;
    };

    let modifier_value = Decimal::from_str(&modifier).unwrap_or(Decimal::ONE);
    let amount = Decimal::from_str(&selected).unwrap_or_default() * modifier_value;
    debug!("Amount is now {}.", amount);

    if let Some(foreign) = tx.foreign_amount.as_deref() {
        if let Ok(foreign_value) = Decimal::from_str(foreign) {
            let foreign_amount = foreign_value * modifier_value;
            debug!("Foreign amount is now {}.", foreign_amount);
            tx.foreign_amount = Some(foreign_amount.to_string());
        }
    }

    tx.amount_debit = None;
    tx.amount_credit = None;
    tx.amount_negated = None;
    tx.amount_modifier = None;
    tx.amount = Some(amount.to_string());

    if amount < Decimal::ZERO {
        debug!("Amount {} is negative, so this is probably a withdrawal.", amount);
        tx.transaction_type = Some(TransactionType::Withdrawal);
    }
    if amount > Decimal::ZERO {
        debug!("Amount {} is positive, so this is probably a deposit.", amount);
        tx.transaction_type = Some(TransactionType::Deposit);
    }

    tx
}

/// Fall back to the primary currency when the record names none
pub fn currency_stage(mut tx: RawTransaction, primary_currency_id: u32) -> RawTransaction {
    let id_missing = tx.currency_id.unwrap_or(0) == 0;
    let code_missing = tx.currency_code.as_deref().unwrap_or("").is_empty();
    if id_missing && code_missing {
        debug!(
            "Set currency to {} because the record carried none.",
            primary_currency_id
        );
        tx.currency_id = Some(primary_currency_id);
        tx.currency_code = None;
    }
    tx
}

/// Run the normalization stages in their fixed order
pub fn normalize(tx: RawTransaction, primary_currency_id: u32) -> RawTransaction {
    currency_stage(amount_stage(tx), primary_currency_id)
}
