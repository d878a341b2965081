//! Spending statistics over an expense history.
//!
//! Settlement records move money between people rather than spend it, so
//! they are left out of every figure here.

use crate::decimal::Money;
use crate::expense::{ExpenseRecord, PersonId};
use chrono::NaiveDate;
use indexmap::IndexMap;
use rust_decimal::Decimal;

/// Aggregate figures over spending expenses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExpenseSummary {
    pub count: usize,
    pub total: Money,
    /// Total divided by count, rounded half-up
    pub average: Money,
    pub highest: Money,
    pub lowest: Money,
}

impl ExpenseSummary {
    /// Summarizes the expenses; every figure is zero when there is nothing to summarize.
    pub fn from_expenses(expenses: &[ExpenseRecord]) -> Self {
        let amounts: Vec<Money> = spending(expenses).map(|e| e.amount).collect();
        if amounts.is_empty() {
            return ExpenseSummary::default();
        }

        let total: Money = amounts.iter().sum();
        ExpenseSummary {
            count: amounts.len(),
            total,
            average: total.split(amounts.len()).unwrap_or(Money::ZERO),
            highest: amounts.iter().copied().max().unwrap_or(Money::ZERO),
            lowest: amounts.iter().copied().min().unwrap_or(Money::ZERO),
        }
    }

    /// Share of `part` in the summary total as a percentage, 2 places.
    pub fn percentage_of_total(&self, part: Money) -> Decimal {
        if self.total.is_zero() {
            return Decimal::ZERO;
        }
        (part.as_decimal() / self.total.as_decimal() * Decimal::ONE_HUNDRED).round_dp(2)
    }
}

/// Key format of [`totals_by_month`].
pub const MONTH_FORMAT: &str = "%Y-%m";

/// Count and total of a group of expenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupTotal {
    pub count: usize,
    pub total: Money,
}

/// Groups spending by category, in first-seen order.
pub fn totals_by_category(expenses: &[ExpenseRecord]) -> IndexMap<String, GroupTotal> {
    let mut categories: IndexMap<String, GroupTotal> = IndexMap::new();
    for expense in spending(expenses) {
        let entry = categories.entry(expense.category.clone()).or_default();
        entry.count += 1;
        entry.total += expense.amount;
    }
    categories
}

/// Groups dated spending by calendar month, oldest first.
///
/// Keys are `YYYY-MM`. Undated expenses are left out.
pub fn totals_by_month(expenses: &[ExpenseRecord]) -> IndexMap<String, GroupTotal> {
    let mut dated: Vec<(NaiveDate, Money)> = spending(expenses)
        .filter_map(|e| e.date.map(|date| (date, e.amount)))
        .collect();
    dated.sort_by_key(|(date, _)| *date);

    let mut months: IndexMap<String, GroupTotal> = IndexMap::new();
    for (date, amount) in dated {
        let entry = months
            .entry(date.format(MONTH_FORMAT).to_string())
            .or_default();
        entry.count += 1;
        entry.total += amount;
    }
    months
}

/// Expenses dated within `start..=end`, in ledger order.
///
/// Undated expenses never match. An inverted range matches nothing.
pub fn expenses_between(
    expenses: &[ExpenseRecord],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<ExpenseRecord> {
    expenses
        .iter()
        .filter(|e| e.date.is_some_and(|date| start <= date && date <= end))
        .cloned()
        .collect()
}

/// Total a person fronted for the group.
pub fn paid_by(expenses: &[ExpenseRecord], person: &PersonId) -> Money {
    spending(expenses)
        .filter(|e| &e.payer == person)
        .map(|e| e.amount)
        .sum()
}

/// Total of a person's rounded shares across the expenses they took part in.
pub fn share_of(expenses: &[ExpenseRecord], person: &PersonId) -> Money {
    spending(expenses)
        .filter(|e| e.participants.contains(person))
        .filter_map(|e| e.amount.split(e.participants.len()))
        .sum()
}

fn spending(expenses: &[ExpenseRecord]) -> impl Iterator<Item = &ExpenseRecord> {
    expenses
        .iter()
        .filter(|e| !e.is_settlement() && e.check().is_ok())
}
