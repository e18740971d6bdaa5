//! Field extraction from the statement graph
//!
//! Flattens one entry (plus its detail list) into named string fields, the
//! way the rest of the pipeline wants them: decimal strings for amounts,
//! `%Y-%m-%d %H:%M:%S` for dates, empty string for anything a statement
//! simply does not carry. Only an unrecognized field name is an error.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tracing::debug;

use super::{
    AccountIdentification, Entry, EntryDetail, Message, Money, PartyKind, RelatedParty, Statement,
    TIME_FORMAT,
};
use crate::error::{Error, Result};

/// One importable transaction drawn from the statement graph
///
/// Wraps borrowed slices of the four levels; nothing is copied and nothing
/// is mutated, so extracting the same field twice always yields the same
/// string. Level A/B/C fields ignore the detail index. Level D fields
/// resolve to an empty string when the detail list is empty or the index is
/// out of range.
pub struct StatementTransaction<'a> {
    level_a: &'a Message,
    level_b: &'a Statement,
    level_c: &'a Entry,
    level_d: &'a [EntryDetail],
}

impl<'a> StatementTransaction<'a> {
    pub fn new(message: &'a Message, statement: &'a Statement, entry: &'a Entry) -> Self {
        debug!("Constructed a statement transaction");
        Self {
            level_a: message,
            level_b: statement,
            level_c: entry,
            level_d: &entry.details,
        }
    }

    /// Number of detail records (splits) under this entry
    pub fn count_splits(&self) -> usize {
        self.level_d.len()
    }

    /// Currency of the entry amount
    pub fn currency_code(&self, _index: usize) -> String {
        match &self.level_c.amount {
            Some(money) => money.currency.clone(),
            None => String::new(),
        }
    }

    /// Entry amount as a decimal string
    pub fn amount(&self, _index: usize) -> String {
        decimal_amount(self.level_c.amount.as_ref())
    }

    /// Entry value date, formatted
    pub fn date(&self, _index: usize) -> String {
        format_timestamp(self.level_c.value_date.as_ref())
    }

    /// Extract a named field, using `index` for level D lookups
    pub fn field_by_index(&self, field: &str, index: usize) -> Result<String> {
        debug!("field_by_index(\"{}\", {})", field, index);

        match field {
            // LEVEL A
            "messageId" => Ok(self.level_a.group_header.message_id.clone()),

            // LEVEL B
            "statementId" => Ok(self.level_b.id.clone()),
            "statementCreationDate" => Ok(format_timestamp(self.level_b.created_on.as_ref())),
            "statementAccountIban" => Ok(match &self.level_b.account {
                Some(account) if account.is_iban() => account.identification().to_string(),
                _ => String::new(),
            }),
            "statementAccountNumber" => Ok(match &self.level_b.account {
                Some(account) if !account.is_iban() => account.identification().to_string(),
                _ => String::new(),
            }),

            // LEVEL C
            "entryAccountServicerReference" => Ok(self
                .level_c
                .account_servicer_reference
                .clone()
                .unwrap_or_default()),
            "entryReference" => Ok(self.level_c.reference.clone().unwrap_or_default()),
            "entryAdditionalInfo" => Ok(self.level_c.additional_info.clone().unwrap_or_default()),
            "entryAmount" => Ok(decimal_amount(self.level_c.amount.as_ref())),
            "entryAmountCurrency" => Ok(self.currency_code(index)),
            "entryValueDate" => Ok(format_timestamp(self.level_c.value_date.as_ref())),
            "entryBookingDate" => Ok(format_timestamp(self.level_c.booking_date.as_ref())),
            "entryBtcDomainCode" => Ok(self
                .level_c
                .bank_transaction_code
                .domain
                .as_ref()
                .map(|domain| domain.code.clone())
                .unwrap_or_default()),
            "entryBtcFamilyCode" => {
                // The computed family code is discarded and this field always
                // resolves empty. TODO: confirm with upstream whether entry-level
                // family codes should surface; the detail-level variant does.
                let _family = self
                    .level_c
                    .bank_transaction_code
                    .domain
                    .as_ref()
                    .map(|domain| domain.family.code.clone());
                Ok(String::new())
            }
            "entryBtcSubFamilyCode" => Ok(self
                .level_c
                .bank_transaction_code
                .domain
                .as_ref()
                .map(|domain| domain.family.sub_family_code.clone())
                .unwrap_or_default()),

            // LEVEL D
            "CdtDbtInd" => Ok(self
                .detail(index)
                .and_then(|detail| detail.credit_debit_indicator.clone())
                .unwrap_or_default()),
            "entryDetailAccountServicerReference" => Ok(self
                .detail(index)
                .and_then(|detail| detail.account_servicer_reference.clone())
                .unwrap_or_default()),
            "entryDetailRemittanceInformationUnstructuredBlockMessage" => {
                let Some(detail) = self.detail(index) else {
                    debug!("There is no detail record at index {}.", index);
                    return Ok(String::new());
                };
                let mut result = String::new();
                if let Some(remittance) = &detail.remittance_information {
                    for block in &remittance.unstructured_blocks {
                        result.push_str(&format!("{} ", block));
                    }
                }
                Ok(result)
            }
            "entryDetailRemittanceInformationStructuredBlockAdditionalRemittanceInformation" => {
                let Some(detail) = self.detail(index) else {
                    return Ok(String::new());
                };
                let Some(remittance) = &detail.remittance_information else {
                    return Ok(String::new());
                };
                if remittance.structured_blocks.is_empty() {
                    return Ok(String::new());
                }
                let mut result = String::new();
                for block in &remittance.structured_blocks {
                    result.push_str(&format!("{} ", block.additional_remittance_information));
                }
                let reference = remittance.creditor_reference.clone().unwrap_or_default();
                if !reference.is_empty() {
                    return Ok(format!("{} {}", result, reference));
                }
                Ok(result)
            }
            "entryDetailAmount" => Ok(self
                .detail(index)
                .map(|detail| decimal_amount(detail.amount.as_ref()))
                .unwrap_or_default()),
            "entryDetailAmountCurrency" => Ok(self
                .detail(index)
                .and_then(|detail| detail.amount.as_ref())
                .map(|money| money.currency.clone())
                .unwrap_or_default()),
            "entryDetailBtcDomainCode" => Ok(self
                .detail(index)
                .and_then(|detail| detail.bank_transaction_code.domain.as_ref())
                .map(|domain| domain.code.clone())
                .unwrap_or_default()),
            "entryDetailBtcFamilyCode" => Ok(self
                .detail(index)
                .and_then(|detail| detail.bank_transaction_code.domain.as_ref())
                .map(|domain| domain.family.code.clone())
                .unwrap_or_default()),
            "entryDetailBtcSubFamilyCode" => Ok(self
                .detail(index)
                .and_then(|detail| detail.bank_transaction_code.domain.as_ref())
                .map(|domain| domain.family.sub_family_code.clone())
                .unwrap_or_default()),
            "entryDetailOpposingAccountIban" => Ok(self
                .detail(index)
                .and_then(|detail| self.opposing_party(detail))
                .and_then(|party| party.account.as_ref())
                .filter(|account| account.is_iban())
                .map(|account| account.identification().to_string())
                .unwrap_or_default()),
            "entryDetailOpposingAccountNumber" => Ok(self
                .detail(index)
                .and_then(|detail| self.opposing_party(detail))
                .and_then(|party| party.account.as_ref())
                .filter(|account| !account.is_iban())
                .map(|account| account.identification().to_string())
                .unwrap_or_default()),
            "entryDetailOpposingName" => {
                let party = self
                    .detail(index)
                    .and_then(|detail| self.opposing_party(detail));
                match party {
                    Some(party) => Ok(opposing_name(party)),
                    None => {
                        debug!("No opposing party for index {}, return \"\".", index);
                        Ok(String::new())
                    }
                }
            }

            _ => Err(Error::UnknownField(field.to_string(), index)),
        }
    }

    fn detail(&self, index: usize) -> Option<&'a EntryDetail> {
        self.level_d.get(index)
    }

    /// The counter-party of a detail record
    ///
    /// Prefers the detail's own amount, falling back to the secondary
    /// amount sub-record. A positive signed amount means money came in, so
    /// the interesting party is the debtor; otherwise the creditor. The
    /// first related party of the matching kind wins; none is not an error.
    fn opposing_party(&self, detail: &'a EntryDetail) -> Option<&'a RelatedParty> {
        debug!("opposing_party(), interested in creditor");
        let mut target = PartyKind::Creditor;

        let amount = detail
            .amount
            .as_ref()
            .map(|money| money.amount)
            .or_else(|| detail.amount_details.as_ref().map(|money| money.amount));
        if let Some(amount) = amount {
            debug!("Detail amount is \"{}\"", amount);
            if amount > Decimal::ZERO {
                debug!("opposing_party(), interested in debtor!");
                target = PartyKind::Debtor;
            }
        }

        detail
            .related_parties
            .iter()
            .find(|party| party.kind == target)
    }
}

/// Display name for a resolved party: its name, or its address lines joined
/// with commas when the name is empty
fn opposing_name(party: &RelatedParty) -> String {
    if party.name.is_empty() {
        return party.address_lines.join(", ");
    }
    party.name.clone()
}

fn decimal_amount(money: Option<&Money>) -> String {
    match money {
        Some(money) => money.amount.to_string(),
        None => String::new(),
    }
}

fn format_timestamp(timestamp: Option<&NaiveDateTime>) -> String {
    match timestamp {
        Some(timestamp) => timestamp.format(TIME_FORMAT).to_string(),
        None => String::new(),
    }
}
