//! Statement graph to raw transaction records
//!
//! Walks a message and emits one raw record per entry detail (or one per
//! entry when a bank ships no details), pulling every value through the
//! field extractor so this stays a thin mapping layer.

use tracing::debug;

use super::{Message, StatementTransaction};
use crate::normalize::RawTransaction;

/// Flatten a statement message into raw records ready for normalization
pub fn to_raw_transactions(message: &Message) -> Vec<RawTransaction> {
    let mut records = Vec::new();
    for statement in &message.statements {
        for entry in &statement.entries {
            let tx = StatementTransaction::new(message, statement, entry);
            let splits = tx.count_splits().max(1);
            for index in 0..splits {
                records.push(raw_record(&tx, index));
            }
        }
    }
    debug!("Flattened statement message into {} raw records.", records.len());
    records
}

fn raw_record(tx: &StatementTransaction<'_>, index: usize) -> RawTransaction {
    // level A/B/C fields never fail for known names; treat them as plain strings
    let get = |field: &str| tx.field_by_index(field, index).unwrap_or_default();

    let amount = non_empty(get("entryDetailAmount")).unwrap_or_else(|| tx.amount(index));
    let currency_code =
        non_empty(get("entryDetailAmountCurrency")).unwrap_or_else(|| tx.currency_code(index));
    let description = non_empty(get(
        "entryDetailRemittanceInformationUnstructuredBlockMessage",
    ))
    .or_else(|| {
        non_empty(get(
            "entryDetailRemittanceInformationStructuredBlockAdditionalRemittanceInformation",
        ))
    })
    .or_else(|| non_empty(get("entryAdditionalInfo")))
    .map(|description| description.trim().to_string());
    let external_id = non_empty(get("entryDetailAccountServicerReference"))
        .or_else(|| non_empty(get("entryAccountServicerReference")))
        .or_else(|| non_empty(get("entryReference")));

    // Debit entries carry unsigned amounts; flip them through the modifier.
    let modifier = if get("CdtDbtInd") == "DBIT" { "-1" } else { "1" };

    RawTransaction {
        date: non_empty(get("entryValueDate")).or_else(|| non_empty(get("entryBookingDate"))),
        description,
        amount: Some(amount),
        amount_modifier: Some(modifier.to_string()),
        currency_code: non_empty(currency_code),
        opposing_name: non_empty(get("entryDetailOpposingName")),
        opposing_iban: non_empty(get("entryDetailOpposingAccountIban")),
        opposing_number: non_empty(get("entryDetailOpposingAccountNumber")),
        external_id,
        ..RawTransaction::default()
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
