//! GoCardless (bank account data API) payload reader
//!
//! The transactions endpoint returns two lists, `booked` and `pending`.
//! Both are imported; each record remembers which list it came from so the
//! status can surface as a tag on the generated transaction.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::{debug, error};

use super::ProviderTransaction;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionsPayload {
    #[serde(default)]
    pub transactions: TransactionKeys,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionKeys {
    #[serde(default)]
    pub booked: Vec<GocardlessTransaction>,
    #[serde(default)]
    pub pending: Vec<GocardlessTransaction>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GocardlessTransaction {
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub internal_transaction_id: Option<String>,
    #[serde(default)]
    pub booking_date: Option<String>,
    #[serde(default)]
    pub value_date: Option<String>,
    pub transaction_amount: AmountBlock,
    #[serde(default)]
    pub debtor_name: Option<String>,
    #[serde(default)]
    pub debtor_account: Option<AccountBlock>,
    #[serde(default)]
    pub creditor_name: Option<String>,
    #[serde(default)]
    pub creditor_account: Option<AccountBlock>,
    #[serde(default)]
    pub remittance_information_unstructured: Option<String>,
    #[serde(default)]
    pub additional_information: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AmountBlock {
    pub amount: String,
    #[serde(default)]
    pub currency: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountBlock {
    #[serde(default)]
    pub iban: Option<String>,
}

/// Parse a raw transactions response body
pub fn parse(body: &str) -> crate::error::Result<TransactionsPayload> {
    Ok(serde_json::from_str(body)?)
}

/// Merge the booked and pending lists, tagging each record with its origin
pub fn flatten(payload: &TransactionsPayload, account_id: &str) -> Vec<ProviderTransaction> {
    let keys = &payload.transactions;
    if keys.booked.is_empty() && keys.pending.is_empty() {
        error!("No transactions found in response");
    }
    let mut records = Vec::new();
    for (key, set) in [("booked", &keys.booked), ("pending", &keys.pending)] {
        for tx in set {
            records.push(to_provider_transaction(tx, account_id, key));
        }
    }
    debug!(
        "Downloaded {} transaction(s) from bank account \"{}\"",
        records.len(),
        account_id
    );
    records
}

fn to_provider_transaction(
    tx: &GocardlessTransaction,
    account_id: &str,
    key: &str,
) -> ProviderTransaction {
    let made_on = tx
        .booking_date
        .as_deref()
        .or(tx.value_date.as_deref())
        .and_then(parse_date)
        .map(|naive| naive.and_utc());
    let description = tx
        .remittance_information_unstructured
        .clone()
        .or_else(|| tx.additional_information.clone())
        .unwrap_or_default();
    let external_id = tx
        .transaction_id
        .clone()
        .or_else(|| tx.internal_transaction_id.clone())
        .unwrap_or_default();

    ProviderTransaction {
        account_id: account_id.to_string(),
        external_id,
        made_on,
        amount: tx.transaction_amount.amount.clone(),
        currency_code: tx.transaction_amount.currency.clone(),
        description,
        status: key.to_string(),
        payer_name: tx.debtor_name.clone(),
        payer_iban: tx
            .debtor_account
            .as_ref()
            .and_then(|account| account.iban.clone()),
        payee_name: tx.creditor_name.clone(),
        payee_iban: tx
            .creditor_account
            .as_ref()
            .and_then(|account| account.iban.clone()),
        ..ProviderTransaction::default()
    }
}

fn parse_date(value: &str) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_merges_booked_and_pending() {
        let json = r#"{
            "transactions": {
                "booked": [
                    {
                        "transactionId": "tx-1",
                        "bookingDate": "2024-04-02",
                        "transactionAmount": {"amount": "-12.25", "currency": "EUR"},
                        "creditorName": "Acme Stores",
                        "creditorAccount": {"iban": "NL11RABO0101010101"},
                        "remittanceInformationUnstructured": "groceries"
                    }
                ],
                "pending": [
                    {
                        "internalTransactionId": "int-2",
                        "valueDate": "2024-04-03",
                        "transactionAmount": {"amount": "250.00", "currency": "EUR"},
                        "debtorName": "Employer Inc"
                    }
                ]
            }
        }"#;
        let payload = parse(json).unwrap();
        let records = flatten(&payload, "acct-1");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].external_id, "tx-1");
        assert_eq!(records[0].status, "booked");
        assert_eq!(records[0].amount, "-12.25");
        assert_eq!(records[0].payee_name.as_deref(), Some("Acme Stores"));
        assert_eq!(
            records[0].payee_iban.as_deref(),
            Some("NL11RABO0101010101")
        );
        assert_eq!(records[0].description, "groceries");

        assert_eq!(records[1].external_id, "int-2");
        assert_eq!(records[1].status, "pending");
        assert_eq!(records[1].payer_name.as_deref(), Some("Employer Inc"));
        assert_eq!(
            records[1].made_on.unwrap().format("%Y-%m-%d").to_string(),
            "2024-04-03"
        );
    }

    #[test]
    fn test_empty_payload_yields_no_records() {
        let payload = parse("{}").unwrap();
        assert!(flatten(&payload, "acct-1").is_empty());
    }

    #[test]
    fn test_malformed_payload_is_a_json_error() {
        assert!(parse("{not json").is_err());
    }
}
