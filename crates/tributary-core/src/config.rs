//! Importer configuration consumed by the conversion routine
//!
//! The configuration file itself is produced elsewhere (web wizard or CLI);
//! this module only defines the shape the pipeline consumes. Maps are
//! BTreeMaps so every run walks accounts in a stable order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Request to create a ledger account for a provider account that has no
/// mapping yet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub name: String,
    #[serde(default = "default_account_type")]
    pub account_type: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub opening_balance: Option<String>,
}

fn default_account_type() -> String {
    "asset".to_string()
}

fn default_currency() -> String {
    "EUR".to_string()
}

/// Conversion configuration
///
/// `accounts` maps provider account identifiers to ledger account ids. An id
/// of zero is a stale or broken mapping and fails validation, unless the
/// same key appears in `new_accounts` and is resolved during the run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Configuration {
    pub accounts: BTreeMap<String, u32>,
    pub new_accounts: BTreeMap<String, NewAccount>,
    pub category_map: BTreeMap<String, u32>,
    pub default_currency_id: u32,
    pub apply_rules: bool,
    pub ignore_duplicate_transactions: bool,
    pub ignore_provider_categories: bool,
}

impl Configuration {
    /// Ledger category id for a provider-supplied category name, if mapped
    pub fn category_id(&self, name: &str) -> Option<u32> {
        self.category_map.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_wizard_output() {
        let json = r#"{
            "accounts": {"acct-aaa": 1, "acct-bbb": 2},
            "newAccounts": {
                "acct-ccc": {"name": "Savings", "openingBalance": "100.00"}
            },
            "categoryMap": {"Groceries": 12},
            "defaultCurrencyId": 1,
            "applyRules": true,
            "ignoreDuplicateTransactions": true,
            "ignoreProviderCategories": false
        }"#;

        let config: Configuration = serde_json::from_str(json).unwrap();
        assert_eq!(config.accounts.get("acct-aaa"), Some(&1));
        assert_eq!(config.category_id("Groceries"), Some(12));
        assert_eq!(config.category_id("Rent"), None);
        assert!(config.apply_rules);

        let new_account = &config.new_accounts["acct-ccc"];
        assert_eq!(new_account.name, "Savings");
        // defaults applied when the wizard omits them
        assert_eq!(new_account.account_type, "asset");
        assert_eq!(new_account.currency, "EUR");
        assert_eq!(new_account.opening_balance.as_deref(), Some("100.00"));
    }

    #[test]
    fn test_empty_configuration_is_valid() {
        let config: Configuration = serde_json::from_str("{}").unwrap();
        assert!(config.accounts.is_empty());
        assert_eq!(config.default_currency_id, 0);
    }
}
