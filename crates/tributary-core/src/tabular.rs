//! Flat-file (CSV) reader producing raw transaction records
//!
//! Banks disagree about everything: which column holds the amount, whether
//! debits get their own column, whether amounts come pre-negated. The
//! column map says which role lives where; the reader just lifts cells into
//! [`RawTransaction`] fields and leaves interpretation to the normalize
//! stages.

use std::io::Read;

use csv::ReaderBuilder;
use tracing::debug;

use crate::error::Result;
use crate::normalize::RawTransaction;

/// Which column (by index) fills which record field
///
/// Roles left at `None` stay empty in the record. Candidate amount columns
/// may all be mapped at once; the amount stage picks the winner.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    pub date: Option<usize>,
    pub description: Option<usize>,
    pub amount: Option<usize>,
    pub amount_debit: Option<usize>,
    pub amount_credit: Option<usize>,
    pub amount_negated: Option<usize>,
    pub amount_modifier: Option<usize>,
    pub currency_code: Option<usize>,
    pub opposing_name: Option<usize>,
    pub opposing_iban: Option<usize>,
    pub external_id: Option<usize>,
    pub category: Option<usize>,
}

/// Read every row of a delimited file into raw records
pub fn read_records<R: Read>(
    reader: R,
    map: &ColumnMap,
    has_headers: bool,
) -> Result<Vec<RawTransaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let cell = |role: Option<usize>| -> Option<String> {
            role.and_then(|index| record.get(index))
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        records.push(RawTransaction {
            date: cell(map.date),
            description: cell(map.description),
            amount: cell(map.amount),
            amount_debit: cell(map.amount_debit),
            amount_credit: cell(map.amount_credit),
            amount_negated: cell(map.amount_negated),
            amount_modifier: cell(map.amount_modifier),
            currency_code: cell(map.currency_code),
            opposing_name: cell(map.opposing_name),
            opposing_iban: cell(map.opposing_iban),
            external_id: cell(map.external_id),
            category: cell(map.category),
            ..RawTransaction::default()
        });
    }

    debug!("Read {} raw records from flat file.", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionType;
    use crate::normalize;

    #[test]
    fn test_reads_mapped_columns() {
        let csv = "Date,Description,Debit,Credit\n\
                   2024-03-01,COFFEE ROASTERS,4.50,\n\
                   2024-03-02,SALARY,,2500.00\n";
        let map = ColumnMap {
            date: Some(0),
            description: Some(1),
            amount_debit: Some(2),
            amount_credit: Some(3),
            ..ColumnMap::default()
        };
        let records = read_records(csv.as_bytes(), &map, true).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].amount_debit.as_deref(), Some("4.50"));
        assert!(records[0].amount_credit.is_none());
        assert_eq!(records[1].amount_credit.as_deref(), Some("2500.00"));
        assert_eq!(records[1].description.as_deref(), Some("SALARY"));
    }

    #[test]
    fn test_rows_flow_through_normalization() {
        // debit column with a negation modifier in its own column
        let csv = "2024-03-01,COFFEE ROASTERS,4.50,-1\n";
        let map = ColumnMap {
            date: Some(0),
            description: Some(1),
            amount: Some(2),
            amount_modifier: Some(3),
            ..ColumnMap::default()
        };
        let records = read_records(csv.as_bytes(), &map, false).unwrap();
        let normalized = normalize::normalize(records[0].clone(), 1);
        assert_eq!(normalized.amount.as_deref(), Some("-4.50"));
        assert_eq!(
            normalized.transaction_type,
            Some(TransactionType::Withdrawal)
        );
    }

    #[test]
    fn test_short_rows_do_not_error() {
        let csv = "2024-03-01,ONLY TWO CELLS\n";
        let map = ColumnMap {
            date: Some(0),
            description: Some(1),
            amount: Some(5),
            ..ColumnMap::default()
        };
        let records = read_records(csv.as_bytes(), &map, false).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].amount.is_none());
    }
}
