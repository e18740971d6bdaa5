//! Canonical transaction generation
//!
//! One generator serves every provider because the readers already lowered
//! their payloads into the shared record. The sign of the amount decides
//! the direction, the configured account map pins the known side, and the
//! ledger's own account list decides whether the far side is a plain
//! counter-party, an existing account id, or reason to call the whole thing
//! a transfer.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::config::Configuration;
use crate::error::Result;
use crate::models::{
    ImportBatch, LedgerAccount, LedgerAccountType, Transaction, TransactionType,
};
use crate::progress::ProgressInformation;
use crate::providers::{LedgerClient, ProviderTransaction};

const UNKNOWN_SOURCE: &str = "(unknown source account)";
const UNKNOWN_DESTINATION: &str = "(unknown destination account)";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct GenerateTransactions {
    configuration: Configuration,
    /// provider account id -> ledger account id
    accounts: BTreeMap<String, u32>,
    /// counter-party IBAN or number -> ledger account id
    target_accounts: HashMap<String, u32>,
    /// counter-party IBAN or number -> ledger account type
    target_types: HashMap<String, LedgerAccountType>,
    user_accounts: Vec<LedgerAccount>,
    progress: ProgressInformation,
}

impl GenerateTransactions {
    pub fn new(configuration: Configuration) -> Self {
        let accounts = configuration.accounts.clone();
        Self {
            configuration,
            accounts,
            target_accounts: HashMap::new(),
            target_types: HashMap::new(),
            user_accounts: Vec::new(),
            progress: ProgressInformation::new(),
        }
    }

    /// Register a mapping resolved mid-run (a freshly created ledger account)
    pub fn map_account(&mut self, provider_id: &str, ledger_id: u32) {
        self.accounts.insert(provider_id.to_string(), ledger_id);
    }

    /// Pull the ledger's account list and build the IBAN/number lookups
    pub async fn collect_target_accounts<L: LedgerClient>(&mut self, ledger: &L) -> Result<()> {
        debug!("Collecting ledger accounts for counter-party lookups.");
        let accounts = ledger.list_accounts().await?;
        for account in &accounts {
            for key in [account.iban.as_deref(), account.number.as_deref()] {
                let Some(key) = key else { continue };
                if key.is_empty() {
                    continue;
                }
                self.target_accounts.insert(key.to_string(), account.id);
                self.target_types.insert(key.to_string(), account.account_type);
            }
        }
        debug!("Collected {} ledger accounts.", accounts.len());
        self.user_accounts = accounts;
        Ok(())
    }

    pub fn user_accounts(&self) -> &[LedgerAccount] {
        &self.user_accounts
    }

    pub fn progress(&self) -> &ProgressInformation {
        &self.progress
    }

    /// Generate one batch per downloaded record, walking accounts in order
    pub fn transactions(
        &mut self,
        downloaded: &BTreeMap<String, Vec<ProviderTransaction>>,
    ) -> Vec<ImportBatch> {
        let mut batches = Vec::new();
        let mut index = 0usize;
        for (account, records) in downloaded {
            debug!("Generating transactions for account \"{}\".", account);
            for entry in records {
                index += 1;
                if let Some(batch) = self.generate(index, entry) {
                    batches.push(batch);
                }
            }
        }
        batches
    }

    /// Convert a single provider record into a submission-ready batch
    pub fn generate(&mut self, index: usize, entry: &ProviderTransaction) -> Option<ImportBatch> {
        let Ok(amount) = Decimal::from_str(&entry.amount) else {
            self.progress.add_warning(
                index,
                format!(
                    "Record \"{}\" has no valid amount (\"{}\") and was skipped.",
                    entry.external_id, entry.amount
                ),
            );
            return None;
        };
        if amount.is_zero() {
            self.progress.add_warning(
                index,
                format!("Record \"{}\" has a zero amount and was skipped.", entry.external_id),
            );
            return None;
        }
        let Some(made_on) = entry.made_on else {
            self.progress.add_warning(
                index,
                format!("Record \"{}\" has no date and was skipped.", entry.external_id),
            );
            return None;
        };
        let ledger_account = self.accounts.get(&entry.account_id).copied().unwrap_or(0);
        if ledger_account == 0 {
            self.progress.add_warning(
                index,
                format!(
                    "Provider account \"{}\" is not mapped to a ledger account, record skipped.",
                    entry.account_id
                ),
            );
            return None;
        }

        let mut notes = format!(
            "{} {}",
            entry.extra_information.as_deref().unwrap_or(""),
            entry.extra_additional.as_deref().unwrap_or("")
        )
        .trim()
        .to_string();
        if let Some(time) = entry.posting_time.as_deref() {
            notes.push_str(&format!("\n\npost_time: {}", time));
        }

        let mut tags: Vec<String> = [
            entry.mode.clone(),
            entry.status.clone(),
            entry.category.clone(),
        ]
        .into_iter()
        .chain(entry.tags.iter().cloned())
        .filter(|tag| !tag.is_empty())
        .collect();
        let mut category_name = Some(entry.category.clone()).filter(|name| !name.is_empty());
        let mut category_id = category_name
            .as_deref()
            .and_then(|name| self.configuration.category_id(name));

        if self.configuration.ignore_provider_categories {
            debug!("Remove provider categories and tags.");
            tags.clear();
            category_name = None;
            category_id = None;
        }

        let transaction = Transaction {
            transaction_type: TransactionType::Withdrawal,
            date: made_on.format(TIME_FORMAT).to_string(),
            amount: "0".to_string(),
            currency_code: Some(entry.currency_code.clone()).filter(|code| !code.is_empty()),
            currency_id: entry.currency_id,
            description: entry.description.clone(),
            category_name,
            category_id,
            tags,
            external_id: entry.external_id.clone(),
            internal_reference: Some(entry.account_id.clone()),
            notes,
            book_date: entry
                .posting_date
                .map(|date| date.format(TIME_FORMAT).to_string()),
            ..Transaction::default()
        };

        let transaction = if amount > Decimal::ZERO {
            debug!("Amount is positive: assume transfer or deposit.");
            self.process_positive(entry, transaction, amount, ledger_account)
        } else {
            debug!("Amount is negative: assume transfer or withdrawal.");
            self.process_negative(entry, transaction, amount, ledger_account)
        };

        debug!("Parsed provider transaction \"{}\".", entry.external_id);
        Some(ImportBatch {
            apply_rules: self.configuration.apply_rules,
            error_if_duplicate_hash: self.configuration.ignore_duplicate_transactions,
            transactions: vec![transaction],
        })
    }

    /// Money arrived: the provider account is the destination, the payer is
    /// the unknown side
    fn process_positive(
        &self,
        entry: &ProviderTransaction,
        mut tx: Transaction,
        amount: Decimal,
        ledger_account: u32,
    ) -> Transaction {
        tx.transaction_type = TransactionType::Deposit;
        tx.amount = amount.to_string();
        tx.destination_id = Some(ledger_account);

        let original_name = entry.payer_name.clone().unwrap_or_default();
        let original_iban = entry.payer_iban.clone().unwrap_or_default();
        tx.source_name = Some(if original_name.is_empty() {
            UNKNOWN_SOURCE.to_string()
        } else {
            original_name.clone()
        });
        tx.source_iban = Some(original_iban.clone()).filter(|iban| !iban.is_empty());

        if let Some(account_type) = self.lookup_type(&original_iban) {
            debug!("Found account type \"{}\" for IBAN \"{}\"", account_type, original_iban);
            if account_type == LedgerAccountType::Asset {
                debug!("Changing transaction type to \"transfer\"");
                tx.transaction_type = TransactionType::Transfer;
            }
        }
        if let Some(account_id) = self.lookup_id(&original_iban) {
            debug!("Found account ID #{} for IBAN \"{}\"", account_id, original_iban);
            tx.source_id = Some(account_id);
            tx.source_name = None;
            tx.source_iban = None;
        }

        self.positive_safety_catch(tx, &original_name, &original_iban)
    }

    /// Money left: the provider account is the source, the payee is the
    /// unknown side
    fn process_negative(
        &self,
        entry: &ProviderTransaction,
        mut tx: Transaction,
        amount: Decimal,
        ledger_account: u32,
    ) -> Transaction {
        tx.transaction_type = TransactionType::Withdrawal;
        tx.amount = (-amount).to_string();
        tx.source_id = Some(ledger_account);

        let original_name = entry.payee_name.clone().unwrap_or_default();
        let original_iban = entry.payee_iban.clone().unwrap_or_default();
        tx.destination_name = Some(if original_name.is_empty() {
            UNKNOWN_DESTINATION.to_string()
        } else {
            original_name.clone()
        });
        tx.destination_iban = Some(original_iban.clone()).filter(|iban| !iban.is_empty());

        if let Some(account_type) = self.lookup_type(&original_iban) {
            debug!("Found account type \"{}\" for IBAN \"{}\"", account_type, original_iban);
            if account_type == LedgerAccountType::Asset {
                debug!("Changing transaction type to \"transfer\"");
                tx.transaction_type = TransactionType::Transfer;
            }
        }
        if let Some(account_id) = self.lookup_id(&original_iban) {
            debug!("Found account ID #{} for IBAN \"{}\"", account_id, original_iban);
            tx.destination_id = Some(account_id);
            tx.destination_name = None;
            tx.destination_iban = None;
        }

        self.negative_safety_catch(tx, &original_name, &original_iban)
    }

    fn lookup_type(&self, iban: &str) -> Option<LedgerAccountType> {
        if iban.is_empty() {
            return None;
        }
        self.target_types.get(iban).copied()
    }

    fn lookup_id(&self, iban: &str) -> Option<u32> {
        if iban.is_empty() {
            return None;
        }
        self.target_accounts.get(iban).copied().filter(|id| *id != 0)
    }

    /// A deposit whose source resolved to the destination account would
    /// reference itself; restore the counter-party as a plain name instead
    fn positive_safety_catch(
        &self,
        mut tx: Transaction,
        original_name: &str,
        original_iban: &str,
    ) -> Transaction {
        if tx.source_id.is_some() && tx.source_id == tx.destination_id {
            warn!("Source and destination are the same account, restoring the counter-party.");
            tx.transaction_type = TransactionType::Deposit;
            tx.source_id = None;
            tx.source_name = Some(if original_name.is_empty() {
                UNKNOWN_SOURCE.to_string()
            } else {
                original_name.to_string()
            });
            tx.source_iban = Some(original_iban.to_string()).filter(|iban| !iban.is_empty());
        }
        tx
    }

    fn negative_safety_catch(
        &self,
        mut tx: Transaction,
        original_name: &str,
        original_iban: &str,
    ) -> Transaction {
        if tx.destination_id.is_some() && tx.destination_id == tx.source_id {
            warn!("Source and destination are the same account, restoring the counter-party.");
            tx.transaction_type = TransactionType::Withdrawal;
            tx.destination_id = None;
            tx.destination_name = Some(if original_name.is_empty() {
                UNKNOWN_DESTINATION.to_string()
            } else {
                original_name.to_string()
            });
            tx.destination_iban = Some(original_iban.to_string()).filter(|iban| !iban.is_empty());
        }
        tx
    }
}
