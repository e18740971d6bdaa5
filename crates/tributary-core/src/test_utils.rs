//! Test utilities: mock provider and ledger clients
//!
//! The mocks answer from in-memory fixtures and can be told to fail in the
//! ways the real services fail, so routine tests can exercise every fatal
//! and advisory path without a network.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::NewAccount;
use crate::error::{Error, Result};
use crate::models::{ImportBatch, LedgerAccount, LedgerAccountType};
use crate::providers::{Download, ImportServiceAccount, LedgerClient, ProviderClient};

/// A provider answering from fixtures
#[derive(Default)]
pub struct MockProviderClient {
    pub downloads: BTreeMap<String, Download>,
    pub service_accounts: Vec<ImportServiceAccount>,
    pub fail_download: bool,
    pub agreement_expired: bool,
    pub fail_listing: bool,
}

#[async_trait]
impl ProviderClient for MockProviderClient {
    async fn download_transactions(&self, account_id: &str) -> Result<Download> {
        if self.fail_download {
            return Err(Error::Download("connection reset by peer".to_string()));
        }
        Ok(self.downloads.get(account_id).cloned().unwrap_or_default())
    }

    async fn list_accounts(&self) -> Result<Vec<ImportServiceAccount>> {
        if self.agreement_expired {
            return Err(Error::AgreementExpired(
                "end user agreement has expired".to_string(),
            ));
        }
        if self.fail_listing {
            return Err(Error::Download("HTTP 502 from provider".to_string()));
        }
        Ok(self.service_accounts.clone())
    }

    async fn account_metadata(&self, account_id: &str) -> Result<ImportServiceAccount> {
        self.service_accounts
            .iter()
            .find(|account| account.id == account_id)
            .cloned()
            .ok_or_else(|| Error::Download(format!("no such account \"{}\"", account_id)))
    }
}

/// A ledger answering from fixtures and recording what it was asked to do
pub struct MockLedgerClient {
    pub accounts: Vec<LedgerAccount>,
    pub fail_listing: bool,
    pub fail_creation: bool,
    next_id: AtomicU32,
    pub created: Mutex<Vec<LedgerAccount>>,
    pub submitted: Mutex<Vec<ImportBatch>>,
}

impl Default for MockLedgerClient {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            fail_listing: false,
            fail_creation: false,
            next_id: AtomicU32::new(1000),
            created: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
        }
    }
}

impl MockLedgerClient {
    pub fn with_accounts(accounts: Vec<LedgerAccount>) -> Self {
        Self {
            accounts,
            ..Self::default()
        }
    }
}

#[async_trait]
impl LedgerClient for MockLedgerClient {
    async fn list_accounts(&self) -> Result<Vec<LedgerAccount>> {
        if self.fail_listing {
            return Err(Error::Ledger("HTTP 500 from ledger".to_string()));
        }
        Ok(self.accounts.clone())
    }

    async fn find_or_create_account(
        &self,
        account: &ImportServiceAccount,
        request: &NewAccount,
    ) -> Result<LedgerAccount> {
        if self.fail_creation {
            return Err(Error::Ledger(format!(
                "could not create account \"{}\"",
                request.name
            )));
        }
        let created = LedgerAccount {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: request.name.clone(),
            account_type: request
                .account_type
                .parse()
                .unwrap_or(LedgerAccountType::Asset),
            iban: account.iban.clone(),
            number: account.number.clone(),
            currency_code: Some(request.currency.clone()),
        };
        self.created.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn submit_transactions(&self, batch: &ImportBatch) -> Result<()> {
        self.submitted.lock().unwrap().push(batch.clone());
        Ok(())
    }
}
