//! Expense models for CSV parsing and internal representation.

use crate::decimal::Money;
use crate::error::IntegrityWarning;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category assigned when a row leaves it blank.
pub const DEFAULT_CATEGORY: &str = "Other";

/// Category of expenses that record a settlement payment.
pub const SETTLEMENT_CATEGORY: &str = "Settlement";

/// Format of the `date` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Separator between identifiers in the `participants` column.
pub const PARTICIPANT_SEPARATOR: char = ';';

/// Identifier of a person taking part in the group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
    pub fn new(id: impl Into<String>) -> Self {
        PersonId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PersonId {
    fn from(id: &str) -> Self {
        PersonId::new(id)
    }
}

impl From<String> for PersonId {
    fn from(id: String) -> Self {
        PersonId(id)
    }
}

/// A single shared expense.
///
/// Every field is populated at construction; optional columns take their
/// defaults here rather than being looked up later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseRecord {
    /// Ledger-unique expense ID
    pub id: u32,

    pub description: String,

    /// Amount fronted by the payer
    pub amount: Money,

    /// Person who paid
    pub payer: PersonId,

    /// People sharing the cost; the payer may or may not be among them
    pub participants: Vec<PersonId>,

    pub category: String,

    pub notes: String,

    /// Day the expense was incurred, if known
    pub date: Option<NaiveDate>,
}

impl ExpenseRecord {
    /// Creates an undated expense with an empty description, no notes and the default category.
    pub fn new(
        id: u32,
        amount: Money,
        payer: impl Into<PersonId>,
        participants: impl IntoIterator<Item = impl Into<PersonId>>,
    ) -> Self {
        ExpenseRecord {
            id,
            description: String::new(),
            amount,
            payer: payer.into(),
            participants: participants.into_iter().map(Into::into).collect(),
            category: DEFAULT_CATEGORY.to_string(),
            notes: String::new(),
            date: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Returns `true` if this expense records a settlement payment.
    pub fn is_settlement(&self) -> bool {
        self.category == SETTLEMENT_CATEGORY
    }

    /// Checks the record against the rules the balance calculator relies on.
    pub fn check(&self) -> Result<(), IntegrityWarning> {
        if !self.amount.is_positive() {
            return Err(IntegrityWarning::NonPositiveAmount(self.amount));
        }
        if self.payer.as_str().is_empty() {
            return Err(IntegrityWarning::MissingPayer);
        }
        if self.participants.is_empty() {
            return Err(IntegrityWarning::NoParticipants);
        }
        Ok(())
    }
}

/// Raw expense row as read from a ledger CSV.
///
/// Every column except `id` is optional at this stage so that one bad cell
/// produces an [`IntegrityWarning`] instead of a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct ExpenseRow {
    pub id: u32,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub amount: Option<String>,

    #[serde(default)]
    pub payer: Option<String>,

    /// `;`-separated person identifiers
    #[serde(default)]
    pub participants: Option<String>,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,

    /// `YYYY-MM-DD`
    #[serde(default)]
    pub date: Option<String>,
}

impl ExpenseRow {
    /// Validates the raw row into an [`ExpenseRecord`].
    pub fn parse(&self) -> Result<ExpenseRecord, IntegrityWarning> {
        let amount = self.parse_amount()?;

        let payer = non_empty(&self.payer).ok_or(IntegrityWarning::MissingPayer)?;
        let participants = self.parse_participants();
        if participants.is_empty() {
            return Err(IntegrityWarning::NoParticipants);
        }

        let date = self.parse_date()?;

        let record = ExpenseRecord {
            id: self.id,
            description: non_empty(&self.description).unwrap_or_default(),
            amount,
            payer: PersonId::new(payer),
            participants,
            category: non_empty(&self.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            notes: non_empty(&self.notes).unwrap_or_default(),
            date,
        };
        record.check()?;
        Ok(record)
    }

    fn parse_amount(&self) -> Result<Money, IntegrityWarning> {
        let raw = non_empty(&self.amount).ok_or(IntegrityWarning::MissingAmount)?;
        let amount =
            Money::from_str(&raw).map_err(|_| IntegrityWarning::InvalidAmount(raw.clone()))?;
        if !amount.is_positive() {
            return Err(IntegrityWarning::NonPositiveAmount(amount));
        }
        Ok(amount)
    }

    fn parse_date(&self) -> Result<Option<NaiveDate>, IntegrityWarning> {
        match non_empty(&self.date) {
            None => Ok(None),
            Some(raw) => NaiveDate::parse_from_str(&raw, DATE_FORMAT)
                .map(Some)
                .map_err(|_| IntegrityWarning::InvalidDate(raw)),
        }
    }

    /// Splits the participants column, dropping blanks and repeated names.
    fn parse_participants(&self) -> Vec<PersonId> {
        let mut participants: Vec<PersonId> = Vec::new();
        let Some(raw) = self.participants.as_deref() else {
            return participants;
        };
        for id in raw.split(PARTICIPANT_SEPARATOR).map(str::trim) {
            if id.is_empty() || participants.iter().any(|p| p.as_str() == id) {
                continue;
            }
            participants.push(PersonId::new(id));
        }
        participants
    }
}

fn non_empty(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
