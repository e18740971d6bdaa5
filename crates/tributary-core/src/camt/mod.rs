//! Hierarchical bank statement model (CAMT.053-style)
//!
//! A statement file is a four-level graph: one [`Message`] owns statements,
//! a [`Statement`] owns entries, an [`Entry`] owns zero or more
//! [`EntryDetail`] records. The graph is read-only once built; extraction
//! never mutates it.

mod convert;
mod extract;

pub use convert::to_raw_transactions;
pub use extract::StatementTransaction;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

/// Timestamp format used for every extracted date field
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// An amount with its currency, exact decimal
#[derive(Debug, Clone, PartialEq)]
pub struct Money {
    pub amount: Decimal,
    pub currency: String,
}

impl Money {
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }
}

/// How an account is identified in the statement
///
/// Only IBAN identifications surface through the `*AccountIban` fields; the
/// remaining kinds surface through the `*AccountNumber` fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountIdentification {
    Iban(String),
    Bban(String),
    Proprietary(String),
    Upic(String),
    Other(String),
}

impl AccountIdentification {
    pub fn identification(&self) -> &str {
        match self {
            Self::Iban(id)
            | Self::Bban(id)
            | Self::Proprietary(id)
            | Self::Upic(id)
            | Self::Other(id) => id,
        }
    }

    pub fn is_iban(&self) -> bool {
        matches!(self, Self::Iban(_))
    }
}

/// Group header of the message (level A)
#[derive(Debug, Clone, Default)]
pub struct GroupHeader {
    pub message_id: String,
}

/// Level A: one message per import
#[derive(Debug, Clone, Default)]
pub struct Message {
    pub group_header: GroupHeader,
    pub statements: Vec<Statement>,
}

/// Level B: a statement for one account
#[derive(Debug, Clone, Default)]
pub struct Statement {
    pub id: String,
    pub created_on: Option<NaiveDateTime>,
    pub account: Option<AccountIdentification>,
    pub entries: Vec<Entry>,
}

/// Level C: a booked or pending entry
#[derive(Debug, Clone, Default)]
pub struct Entry {
    pub amount: Option<Money>,
    pub value_date: Option<NaiveDateTime>,
    pub booking_date: Option<NaiveDateTime>,
    pub account_servicer_reference: Option<String>,
    pub reference: Option<String>,
    pub additional_info: Option<String>,
    pub bank_transaction_code: BankTransactionCode,
    pub details: Vec<EntryDetail>,
}

/// Level D: one transaction detail (split) of an entry
#[derive(Debug, Clone, Default)]
pub struct EntryDetail {
    pub amount: Option<Money>,
    /// Secondary amount sub-record some banks fill instead of `amount`
    pub amount_details: Option<Money>,
    pub credit_debit_indicator: Option<String>,
    pub account_servicer_reference: Option<String>,
    pub remittance_information: Option<RemittanceInformation>,
    pub bank_transaction_code: BankTransactionCode,
    pub related_parties: Vec<RelatedParty>,
}

/// ISO bank transaction code: domain / family / sub-family
#[derive(Debug, Clone, Default)]
pub struct BankTransactionCode {
    pub domain: Option<Domain>,
}

#[derive(Debug, Clone, Default)]
pub struct Domain {
    pub code: String,
    pub family: Family,
}

#[derive(Debug, Clone, Default)]
pub struct Family {
    pub code: String,
    pub sub_family_code: String,
}

/// Payment reference information attached to a detail
#[derive(Debug, Clone, Default)]
pub struct RemittanceInformation {
    pub unstructured_blocks: Vec<String>,
    pub structured_blocks: Vec<StructuredBlock>,
    pub creditor_reference: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StructuredBlock {
    pub additional_remittance_information: String,
}

/// Which role a related party plays in the transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyKind {
    Debtor,
    Creditor,
    UltimateDebtor,
    UltimateCreditor,
}

/// A party on one side of a transaction detail
#[derive(Debug, Clone)]
pub struct RelatedParty {
    pub kind: PartyKind,
    pub name: String,
    pub address_lines: Vec<String>,
    pub account: Option<AccountIdentification>,
}
