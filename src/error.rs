//! Error types for the expense splitter.

use crate::decimal::Money;
use thiserror::Error;

/// Result type alias for splitter operations
pub type Result<T> = std::result::Result<T, SplitError>;

/// Errors that fail a whole call.
#[derive(Error, Debug)]
pub enum SplitError {
    /// Failed to open, read or write a ledger file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Structurally invalid argument or document
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing ledger file argument
    #[error("Missing ledger file argument. Usage: expense-splitter <ledger.csv> [settlements|grouped|balances|summary|monthly|settle|pay <from> <to> <amount>]")]
    MissingArgument,

    #[error("Unknown command '{0}'. Expected one of: settlements, grouped, balances, summary, monthly, settle, pay")]
    UnknownCommand(String),
}

/// A malformed expense record.
///
/// These never abort a batch: the record is skipped and the warning logged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityWarning {
    #[error("missing amount")]
    MissingAmount,

    #[error("invalid amount '{0}'")]
    InvalidAmount(String),

    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Money),

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("missing payer")]
    MissingPayer,

    #[error("expense has no participants")]
    NoParticipants,

    #[error("duplicate expense ID {0}")]
    DuplicateId(u32),
}
