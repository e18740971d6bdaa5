//! Domain models for Tributary
//!
//! The central type is [`Transaction`], the canonical record submitted to the
//! ledger system regardless of which bank or aggregator the data came from.
//! Each side of a transaction references a ledger account either by id or by
//! a name/IBAN pair, never both at once.

use serde::{Deserialize, Serialize};

/// Transaction direction in the ledger system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Withdrawal,
    Deposit,
    Transfer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Withdrawal => "withdrawal",
            Self::Deposit => "deposit",
            Self::Transfer => "transfer",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "withdrawal" => Ok(Self::Withdrawal),
            "deposit" => Ok(Self::Deposit),
            "transfer" => Ok(Self::Transfer),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Account types known to the ledger system
///
/// Only `Asset` matters for classification (a counter-party that is an asset
/// account turns a withdrawal or deposit into a transfer), but the other
/// kinds are kept so provider account types can be mapped faithfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerAccountType {
    Asset,
    Expense,
    Revenue,
    Liabilities,
    Debt,
    Loan,
    Mortgage,
    Unknown,
}

impl LedgerAccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Expense => "expense",
            Self::Revenue => "revenue",
            Self::Liabilities => "liabilities",
            Self::Debt => "debt",
            Self::Loan => "loan",
            Self::Mortgage => "mortgage",
            Self::Unknown => "unknown",
        }
    }
}

impl std::str::FromStr for LedgerAccountType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asset" => Ok(Self::Asset),
            "expense" => Ok(Self::Expense),
            "revenue" => Ok(Self::Revenue),
            "liabilities" => Ok(Self::Liabilities),
            "debt" => Ok(Self::Debt),
            "loan" => Ok(Self::Loan),
            "mortgage" => Ok(Self::Mortgage),
            _ => Ok(Self::Unknown),
        }
    }
}

impl std::fmt::Display for LedgerAccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An account as it exists in the ledger system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerAccount {
    pub id: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: LedgerAccountType,
    #[serde(default)]
    pub iban: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub currency_code: Option<String>,
}

/// The canonical transaction submitted to the ledger system
///
/// Amounts are exact decimal strings, never floats. A side is either an
/// `*_id` reference to an existing ledger account or a `*_name`/`*_iban`
/// pair describing an account the ledger should find or create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub date: String,
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency_id: Option<u32>,
    pub description: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_iban: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_iban: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub external_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_reference: Option<String>,
    pub notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_date: Option<String>,
}

impl Default for Transaction {
    fn default() -> Self {
        Self {
            transaction_type: TransactionType::Withdrawal,
            date: String::new(),
            amount: "0".to_string(),
            foreign_amount: None,
            currency_code: None,
            currency_id: None,
            description: String::new(),
            source_id: None,
            source_name: None,
            source_iban: None,
            destination_id: None,
            destination_name: None,
            destination_iban: None,
            category_name: None,
            category_id: None,
            tags: Vec::new(),
            external_id: String::new(),
            internal_reference: None,
            notes: String::new(),
            book_date: None,
        }
    }
}

/// One generated transaction wrapped with its submission options
///
/// This is the envelope posted to the ledger's transaction-creation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub apply_rules: bool,
    pub error_if_duplicate_hash: bool,
    pub transactions: Vec<Transaction>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_transaction_type_roundtrip() {
        assert_eq!(
            TransactionType::from_str("withdrawal").unwrap(),
            TransactionType::Withdrawal
        );
        assert_eq!(TransactionType::Transfer.to_string(), "transfer");
        assert!(TransactionType::from_str("dividend").is_err());
    }

    #[test]
    fn test_account_type_falls_back_to_unknown() {
        assert_eq!(
            LedgerAccountType::from_str("asset").unwrap(),
            LedgerAccountType::Asset
        );
        assert_eq!(
            LedgerAccountType::from_str("something-else").unwrap(),
            LedgerAccountType::Unknown
        );
    }

    #[test]
    fn test_transaction_serializes_one_reference_per_side() {
        let tx = Transaction {
            transaction_type: TransactionType::Deposit,
            date: "2024-03-01 00:00:00".to_string(),
            amount: "12.34".to_string(),
            destination_id: Some(5),
            source_name: Some("Employer Inc".to_string()),
            source_iban: Some("NL00RABO0123456789".to_string()),
            external_id: "tx-1".to_string(),
            ..Transaction::default()
        };

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "deposit");
        assert_eq!(json["destination_id"], 5);
        assert!(json.get("destination_name").is_none());
        assert_eq!(json["source_name"], "Employer Inc");
        assert!(json.get("source_id").is_none());
    }
}
