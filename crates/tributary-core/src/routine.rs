//! The conversion routine
//!
//! A fixed, linear sequence of phases that turns provider data into
//! submission-ready batches: validate the configuration, download, track
//! rate limits, resolve ledger accounts, stop early when nothing came in,
//! enrich provider account data, generate, filter, and fold every stage's
//! messages into one report.
//!
//! Phases are either fatal (the run aborts, nothing is returned) or
//! advisory (recorded on the report, the run continues). A run owns all of
//! its state; two concurrent runs share nothing.

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{debug, error, warn};

use crate::config::Configuration;
use crate::error::{Error, Result};
use crate::filter::FilterTransactions;
use crate::generate::GenerateTransactions;
use crate::models::ImportBatch;
use crate::progress::{ProgressInformation, ProgressReport};
use crate::providers::{ImportServiceAccount, LedgerClient, ProviderClient, ProviderTransaction};
use crate::ratelimit::{self, RateLimit};

/// The outcome of one conversion run
#[derive(Debug, Default)]
pub struct ConversionResult {
    pub transactions: Vec<ImportBatch>,
    pub report: ProgressReport,
}

pub struct RoutineManager<P: ProviderClient, L: LedgerClient> {
    configuration: Configuration,
    provider: P,
    ledger: L,
    identifier: String,
    progress: ProgressInformation,
    generator: GenerateTransactions,
    filter: FilterTransactions,
    downloaded: BTreeMap<String, Vec<ProviderTransaction>>,
    /// rate limits keyed by provider account, as downloaded
    provider_rate_limits: BTreeMap<String, RateLimit>,
    /// rate limits keyed by ledger account id, ready for reporting
    rate_limits: BTreeMap<u32, RateLimit>,
}

impl<P: ProviderClient, L: LedgerClient> RoutineManager<P, L> {
    pub fn new(
        configuration: Configuration,
        provider: P,
        ledger: L,
        identifier: Option<String>,
    ) -> Self {
        let identifier = identifier
            .unwrap_or_else(|| format!("conv-{}", Utc::now().format("%Y%m%d-%H%M%S")));
        let generator = GenerateTransactions::new(configuration.clone());
        Self {
            configuration,
            provider,
            ledger,
            identifier,
            progress: ProgressInformation::new(),
            generator,
            filter: FilterTransactions::new(),
            downloaded: BTreeMap::new(),
            provider_rate_limits: BTreeMap::new(),
            rate_limits: BTreeMap::new(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Run the full conversion
    pub async fn run(&mut self) -> Result<ConversionResult> {
        debug!("Starting conversion routine \"{}\".", self.identifier);

        self.validate_accounts()?;
        self.download().await?;
        self.collect_rate_limits();
        self.collect_target_accounts().await?;
        self.report_rate_limits();

        if self.break_on_download() {
            return Ok(ConversionResult {
                transactions: Vec::new(),
                report: self.report(),
            });
        }

        self.collect_provider_accounts().await?;

        let transactions = self.generator.transactions(&self.downloaded);
        debug!("Generated {} ledger transactions.", transactions.len());

        let filtered = self.filter.filter(transactions);
        debug!("Filtered down to {} ledger transactions.", filtered.len());

        Ok(ConversionResult {
            transactions: filtered,
            report: self.report(),
        })
    }

    /// Every configured mapping must point at a real ledger account; a zero
    /// id is only acceptable when the run itself will create the account
    fn validate_accounts(&self) -> Result<()> {
        debug!("Validating accounts in configuration.");
        for (key, account_id) in &self.configuration.accounts {
            if *account_id == 0 && !self.configuration.new_accounts.contains_key(key) {
                return Err(Error::Configuration(format!(
                    "Cannot import provider account \"{}\" into ledger account #{}. Recreate your configuration file.",
                    key, account_id
                )));
            }
        }
        Ok(())
    }

    async fn download(&mut self) -> Result<()> {
        debug!("Downloading transactions per configured account.");
        let accounts: Vec<String> = self.configuration.accounts.keys().cloned().collect();
        for account in accounts {
            match self.provider.download_transactions(&account).await {
                Ok(download) => {
                    debug!(
                        "Downloaded {} transaction(s) for account \"{}\".",
                        download.transactions.len(),
                        account
                    );
                    if let Some(rate_limit) = download.rate_limit {
                        self.provider_rate_limits.insert(account.clone(), rate_limit);
                    }
                    self.downloaded.insert(account, download.transactions);
                }
                Err(e) => {
                    error!("Could not download transactions from the provider.");
                    error!("{}", e);
                    self.progress
                        .add_error(0, format!("[a109]: Could not download from the provider: {}", e));
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Join downloaded limits with the configuration; unknown accounts are
    /// logged and skipped
    fn collect_rate_limits(&mut self) {
        for (account, rate_limit) in &self.provider_rate_limits {
            debug!(
                "Rate limit for account {}: {} request(s) left, {} second(s)",
                account, rate_limit.remaining, rate_limit.reset
            );
            let Some(&ledger_id) = self.configuration.accounts.get(account) else {
                error!("Account \"{}\" was not found in your configuration.", account);
                continue;
            };
            self.rate_limits.insert(ledger_id, rate_limit.clone());
        }
    }

    async fn collect_target_accounts(&mut self) -> Result<()> {
        debug!("Collecting target accounts from the ledger.");
        if let Err(e) = self.generator.collect_target_accounts(&self.ledger).await {
            self.progress.add_error(
                0,
                format!("[a110]: Error while collecting target accounts: {}", e),
            );
            return Err(e);
        }
        Ok(())
    }

    fn report_rate_limits(&mut self) {
        ratelimit::report(
            &self.rate_limits,
            self.generator.user_accounts(),
            &mut self.progress,
        );
    }

    /// True when no account produced any records; recorded as an advisory
    /// error, the run still counts as successful
    fn break_on_download(&mut self) -> bool {
        let total: usize = self.downloaded.values().map(Vec::len).sum();
        if total == 0 {
            warn!("Downloaded nothing, will return nothing.");
            self.progress.add_error(
                0,
                "[a111]: No transactions were downloaded from the provider. You may be rate limited or something else went wrong.",
            );
            return true;
        }
        false
    }

    /// Best-effort provider account metadata; only an expired agreement is
    /// fatal
    async fn collect_provider_accounts(&mut self) -> Result<()> {
        match self.provider.list_accounts().await {
            Ok(service_accounts) => self.create_new_accounts(&service_accounts).await,
            Err(Error::AgreementExpired(message)) => {
                self.progress.add_error(
                    0,
                    "[a112]: The connection between your bank and the provider has expired.",
                );
                Err(Error::AgreementExpired(message))
            }
            Err(e) => {
                error!("Could not collect info on all provider accounts, but this info isn't used at the moment anyway.");
                error!("{}", e);
                Ok(())
            }
        }
    }

    /// Create (or find) the ledger accounts requested in the configuration
    /// and register the fresh mappings with the generator
    async fn create_new_accounts(
        &mut self,
        service_accounts: &[ImportServiceAccount],
    ) -> Result<()> {
        let requests = self.configuration.new_accounts.clone();
        for (provider_id, request) in requests {
            if request.name.is_empty() {
                error!(
                    "Account name is required for creating account \"{}\".",
                    provider_id
                );
                continue;
            }
            let Some(service) = service_accounts
                .iter()
                .find(|account| account.id == provider_id)
            else {
                error!(
                    "Existing account data not found for account \"{}\".",
                    provider_id
                );
                continue;
            };
            let account = self.ledger.find_or_create_account(service, &request).await?;
            debug!(
                "Created or found ledger account #{} for provider account \"{}\".",
                account.id, provider_id
            );
            self.generator.map_account(&provider_id, account.id);
            self.progress.add_message(
                0,
                format!(
                    "Linked provider account \"{}\" to ledger account #{} (\"{}\").",
                    provider_id, account.id, account.name
                ),
            );
        }
        Ok(())
    }

    /// Fold every stage's channels into one report
    fn report(&self) -> ProgressReport {
        let mut report = ProgressReport::default();
        report.merge(&[
            &self.progress,
            self.filter.progress(),
            self.generator.progress(),
        ]);
        report
    }
}
