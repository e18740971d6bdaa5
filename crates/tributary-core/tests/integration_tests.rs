//! Integration tests for tributary-core
//!
//! These tests exercise the full download → generate → filter routine with
//! mock provider and ledger clients, plus the statement-file path through
//! normalization into the generator.

use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};

use tributary_core::providers::gocardless;
use tributary_core::test_utils::{MockLedgerClient, MockProviderClient};
use tributary_core::{
    Configuration, Download, GenerateTransactions, ImportServiceAccount, LedgerAccount,
    LedgerAccountType, NewAccount, ProviderTransaction, RateLimit, RoutineManager,
    TransactionType,
};

fn configuration() -> Configuration {
    let mut configuration = Configuration::default();
    configuration.accounts.insert("acct-1".to_string(), 10);
    configuration.apply_rules = true;
    configuration.default_currency_id = 1;
    configuration
}

fn ledger_accounts() -> Vec<LedgerAccount> {
    vec![
        LedgerAccount {
            id: 10,
            name: "Main Checking".to_string(),
            account_type: LedgerAccountType::Asset,
            iban: Some("NL99BANK0123456789".to_string()),
            number: None,
            currency_code: Some("EUR".to_string()),
        },
        LedgerAccount {
            id: 20,
            name: "Savings".to_string(),
            account_type: LedgerAccountType::Asset,
            iban: Some("NL22INGB0202020202".to_string()),
            number: None,
            currency_code: Some("EUR".to_string()),
        },
    ]
}

fn record(external_id: &str, amount: &str) -> ProviderTransaction {
    ProviderTransaction {
        account_id: "acct-1".to_string(),
        external_id: external_id.to_string(),
        made_on: Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()),
        amount: amount.to_string(),
        currency_code: "EUR".to_string(),
        description: format!("record {}", external_id),
        ..ProviderTransaction::default()
    }
}

fn provider_with(records: Vec<ProviderTransaction>, rate_limit: Option<RateLimit>) -> MockProviderClient {
    let mut downloads = BTreeMap::new();
    downloads.insert(
        "acct-1".to_string(),
        Download {
            transactions: records,
            rate_limit,
        },
    );
    MockProviderClient {
        downloads,
        ..MockProviderClient::default()
    }
}

#[tokio::test]
async fn test_full_conversion_run() {
    let mut transfer_out = record("tx-2", "-200.00");
    transfer_out.payee_name = Some("Savings".to_string());
    transfer_out.payee_iban = Some("NL22INGB0202020202".to_string());

    let mut withdrawal = record("tx-1", "-15.75");
    withdrawal.payee_name = Some("Acme Stores".to_string());

    let provider = provider_with(
        vec![withdrawal, transfer_out, record("tx-3", "2500.00")],
        None,
    );
    let ledger = MockLedgerClient::with_accounts(ledger_accounts());

    let mut routine = RoutineManager::new(configuration(), provider, ledger, None);
    let result = routine.run().await.expect("conversion should succeed");

    assert_eq!(result.transactions.len(), 3);
    assert_eq!(result.report.error_count(), 0);

    let types: Vec<TransactionType> = result
        .transactions
        .iter()
        .map(|batch| batch.transactions[0].transaction_type)
        .collect();
    assert_eq!(
        types,
        vec![
            TransactionType::Withdrawal,
            TransactionType::Transfer,
            TransactionType::Deposit
        ]
    );

    // transfer side resolved to an id, not a name/iban pair
    let transfer = &result.transactions[1].transactions[0];
    assert_eq!(transfer.source_id, Some(10));
    assert_eq!(transfer.destination_id, Some(20));
    assert!(transfer.destination_name.is_none());

    // apply_rules carried from the configuration
    assert!(result.transactions[0].apply_rules);
}

#[tokio::test]
async fn test_zero_downloads_is_a_soft_stop() {
    let provider = provider_with(Vec::new(), None);
    let ledger = MockLedgerClient::with_accounts(ledger_accounts());

    let mut routine = RoutineManager::new(configuration(), provider, ledger, None);
    let result = routine.run().await.expect("soft stop is not a failure");

    assert!(result.transactions.is_empty());
    assert_eq!(result.report.error_count(), 1);
    assert!(result.report.errors[&0][0].contains("[a111]"));
}

#[tokio::test]
async fn test_download_failure_is_fatal() {
    let provider = MockProviderClient {
        fail_download: true,
        ..MockProviderClient::default()
    };
    let ledger = MockLedgerClient::with_accounts(ledger_accounts());

    let mut routine = RoutineManager::new(configuration(), provider, ledger, None);
    let error = routine.run().await.unwrap_err();
    assert!(error.to_string().contains("connection reset"));
}

#[tokio::test]
async fn test_broken_account_mapping_is_fatal() {
    let mut configuration = configuration();
    configuration.accounts.insert("acct-broken".to_string(), 0);

    let provider = provider_with(vec![record("tx-1", "-5.00")], None);
    let ledger = MockLedgerClient::with_accounts(ledger_accounts());

    let mut routine = RoutineManager::new(configuration, provider, ledger, None);
    let error = routine.run().await.unwrap_err();
    assert!(error.to_string().contains("acct-broken"));
}

#[tokio::test]
async fn test_agreement_expiry_is_fatal_during_enrichment() {
    let mut provider = provider_with(vec![record("tx-1", "-5.00")], None);
    provider.agreement_expired = true;
    let ledger = MockLedgerClient::with_accounts(ledger_accounts());

    let mut routine = RoutineManager::new(configuration(), provider, ledger, None);
    let error = routine.run().await.unwrap_err();
    assert!(error.to_string().contains("expired"));
}

#[tokio::test]
async fn test_provider_listing_failure_is_only_advisory() {
    let mut provider = provider_with(vec![record("tx-1", "-5.00")], None);
    provider.fail_listing = true;
    let ledger = MockLedgerClient::with_accounts(ledger_accounts());

    let mut routine = RoutineManager::new(configuration(), provider, ledger, None);
    let result = routine.run().await.expect("listing failure is best-effort");
    assert_eq!(result.transactions.len(), 1);
}

#[tokio::test]
async fn test_exhausted_rate_limit_warns_on_the_report() {
    let limit = RateLimit {
        account_id: "acct-1".to_string(),
        remaining: 0,
        reset: 7200,
    };
    let provider = provider_with(vec![record("tx-1", "-5.00")], Some(limit));
    let ledger = MockLedgerClient::with_accounts(ledger_accounts());

    let mut routine = RoutineManager::new(configuration(), provider, ledger, None);
    let result = routine.run().await.unwrap();

    assert_eq!(result.report.warning_count(), 1);
    let warning = &result.report.warnings[&0][0];
    assert!(warning.contains("no requests left"));
    assert!(warning.contains("Main Checking"));
    assert!(warning.contains("2 hours"));
}

#[tokio::test]
async fn test_new_accounts_are_created_and_used() {
    let mut configuration = configuration();
    configuration.accounts.insert("acct-new".to_string(), 0);
    configuration.new_accounts.insert(
        "acct-new".to_string(),
        NewAccount {
            name: "Brokerage".to_string(),
            account_type: "asset".to_string(),
            currency: "EUR".to_string(),
            opening_balance: None,
        },
    );

    let mut record_new = record("tx-9", "-9.99");
    record_new.account_id = "acct-new".to_string();
    let mut provider = provider_with(vec![record_new], None);
    let moved_download = provider.downloads.remove("acct-1").unwrap();
    provider.downloads.insert("acct-new".to_string(), moved_download);
    provider.downloads.insert("acct-1".to_string(), Download::default());
    provider.service_accounts = vec![ImportServiceAccount {
        id: "acct-new".to_string(),
        name: "Brokerage account".to_string(),
        iban: None,
        number: None,
        currency_code: Some("EUR".to_string()),
        status: None,
    }];
    let ledger = MockLedgerClient::with_accounts(ledger_accounts());

    let mut routine = RoutineManager::new(configuration, provider, ledger, None);
    let result = routine.run().await.expect("creation path should succeed");

    // the record of the fresh account was generated against the created id
    assert_eq!(result.transactions.len(), 1);
    let tx = &result.transactions[0].transactions[0];
    assert_eq!(tx.source_id, Some(1000));
    assert!(result.report.messages[&0][0].contains("acct-new"));
}

#[tokio::test]
async fn test_statement_file_flows_into_the_generator() {
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use tributary_core::camt::{
        self, AccountIdentification, Entry, EntryDetail, GroupHeader, Message, Money, PartyKind,
        RelatedParty, Statement,
    };
    use tributary_core::normalize;

    let message = Message {
        group_header: GroupHeader {
            message_id: "MSG-1".to_string(),
        },
        statements: vec![Statement {
            id: "STMT-1".to_string(),
            created_on: None,
            account: Some(AccountIdentification::Iban("NL99BANK0123456789".to_string())),
            entries: vec![Entry {
                amount: Some(Money::new(Decimal::from_str("45.00").unwrap(), "EUR")),
                value_date: chrono::NaiveDate::from_ymd_opt(2024, 6, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0),
                reference: Some("ENTRY-1".to_string()),
                details: vec![EntryDetail {
                    amount: Some(Money::new(Decimal::from_str("45.00").unwrap(), "EUR")),
                    credit_debit_indicator: Some("DBIT".to_string()),
                    related_parties: vec![RelatedParty {
                        kind: PartyKind::Creditor,
                        name: "Acme Stores".to_string(),
                        address_lines: Vec::new(),
                        account: Some(AccountIdentification::Iban(
                            "NL11RABO0101010101".to_string(),
                        )),
                    }],
                    ..EntryDetail::default()
                }],
                ..Entry::default()
            }],
        }],
    };

    let raw = camt::to_raw_transactions(&message);
    assert_eq!(raw.len(), 1);

    let normalized = normalize::normalize(raw[0].clone(), 1);
    assert_eq!(normalized.amount.as_deref(), Some("-45.00"));

    let entry = ProviderTransaction::from_raw(normalized, "acct-1").unwrap();
    let mut generator = GenerateTransactions::new(configuration());
    let batch = generator.generate(1, &entry).unwrap();
    let tx = &batch.transactions[0];

    assert_eq!(tx.transaction_type, TransactionType::Withdrawal);
    assert_eq!(tx.amount, "45.00");
    assert_eq!(tx.source_id, Some(10));
    assert_eq!(tx.destination_name.as_deref(), Some("Acme Stores"));
    assert_eq!(tx.destination_iban.as_deref(), Some("NL11RABO0101010101"));
}

#[tokio::test]
async fn test_gocardless_payload_through_the_routine() {
    let json = r#"{
        "transactions": {
            "booked": [{
                "transactionId": "gc-1",
                "bookingDate": "2024-04-02",
                "transactionAmount": {"amount": "-12.25", "currency": "EUR"},
                "creditorName": "Acme Stores",
                "remittanceInformationUnstructured": "groceries"
            }],
            "pending": []
        }
    }"#;
    let payload: gocardless::TransactionsPayload = serde_json::from_str(json).unwrap();
    let records = gocardless::flatten(&payload, "acct-1");

    let provider = provider_with(records, None);
    let ledger = MockLedgerClient::with_accounts(ledger_accounts());
    let mut routine = RoutineManager::new(configuration(), provider, ledger, None);
    let result = routine.run().await.unwrap();

    assert_eq!(result.transactions.len(), 1);
    let tx = &result.transactions[0].transactions[0];
    assert_eq!(tx.transaction_type, TransactionType::Withdrawal);
    assert_eq!(tx.amount, "12.25");
    assert_eq!(tx.destination_name.as_deref(), Some("Acme Stores"));
    assert_eq!(tx.description, "groceries");
    // the booked/pending origin travels as a tag
    assert!(tx.tags.contains(&"booked".to_string()));
}
