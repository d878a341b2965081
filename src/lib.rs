//! # Expense Splitter
//!
//! Tracks shared expenses within a group, computes who owes whom, and
//! reduces the debts to a short list of payments.
//!
//! ## Design Principles
//!
//! - **Fixed-point arithmetic**: 2 decimal places, round-half-up, via `rust_decimal`
//! - **Pure core**: balances and settlements are recomputed from a snapshot on every call
//! - **Deterministic output**: people are kept in first-seen order, never re-sorted
//! - **Lenient input**: malformed expenses are logged and skipped, not fatal
//!
//! ## Example
//!
//! ```
//! use expense_splitter::{compute_balances, minimize_settlements, ExpenseRecord, Money};
//! use std::str::FromStr;
//!
//! let dinner = ExpenseRecord::new(1, Money::from_str("300").unwrap(), "A", ["A", "B", "C"]);
//! let balances = compute_balances(&[dinner]);
//! let settlements = minimize_settlements(&balances);
//!
//! assert_eq!(settlements.len(), 2);
//! assert_eq!(settlements[0].amount.to_string(), "100.00");
//! ```

pub mod balance;
pub mod decimal;
pub mod engine;
pub mod error;
pub mod expense;
pub mod settlement;
pub mod store;
pub mod summary;

pub use balance::{compute_balances, Balances};
pub use decimal::Money;
pub use engine::{write_balances, write_group_totals, write_settlements, SplitEngine};
pub use error::{IntegrityWarning, Result, SplitError};
pub use expense::{
    ExpenseRecord, ExpenseRow, PersonId, DATE_FORMAT, DEFAULT_CATEGORY, SETTLEMENT_CATEGORY,
};
pub use settlement::{
    apply_settlements, group_by_pair, minimize_settlements, validate_settlements,
    SettlementInstruction, SettlementKind,
};
pub use store::{read_expenses, write_expenses, CsvFileStore, ExpenseStore, MemoryStore};
pub use summary::{
    expenses_between, paid_by, share_of, totals_by_category, totals_by_month, ExpenseSummary,
    GroupTotal, MONTH_FORMAT,
};
