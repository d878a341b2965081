//! Net balances per person and the balance calculator.
//!
//! A positive balance means the person is owed money, a negative one that
//! they owe. Balances are kept in first-seen order so that the settlement
//! sweep is reproducible.

use crate::decimal::Money;
use crate::expense::{ExpenseRecord, PersonId};
use indexmap::IndexMap;
use log::{debug, warn};

/// Signed net balance per person, in first-seen order.
///
/// Within one expense, participants are seen in listed order before the payer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Balances {
    entries: IndexMap<PersonId, Money>,
}

impl Balances {
    pub fn new() -> Self {
        Balances {
            entries: IndexMap::new(),
        }
    }

    /// Adds `amount` to a person's balance, registering them if unseen.
    pub fn credit(&mut self, person: &PersonId, amount: Money) {
        *self.entry(person) += amount;
    }

    /// Subtracts `amount` from a person's balance, registering them if unseen.
    pub fn debit(&mut self, person: &PersonId, amount: Money) {
        *self.entry(person) -= amount;
    }

    fn entry(&mut self, person: &PersonId) -> &mut Money {
        self.entries.entry(person.clone()).or_insert(Money::ZERO)
    }

    /// Balance of a person; unknown persons have a zero balance.
    pub fn get(&self, person: &PersonId) -> Money {
        self.entries.get(person).copied().unwrap_or(Money::ZERO)
    }

    /// Iterates `(person, balance)` pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&PersonId, Money)> {
        self.entries.iter().map(|(id, balance)| (id, *balance))
    }

    /// Returns `true` if the person appears in any valid expense.
    pub fn contains(&self, person: &PersonId) -> bool {
        self.entries.contains_key(person)
    }

    /// Number of people with a balance, including settled ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no valid expense has been applied.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of every balance.
    ///
    /// Zero unless a payer also shared an expense whose division rounded;
    /// such residuals stay visible here rather than being corrected.
    pub fn total(&self) -> Money {
        self.entries.values().sum()
    }

    /// Returns `true` if every balance is exactly zero.
    pub fn is_settled(&self) -> bool {
        self.entries.values().all(Money::is_zero)
    }
}

impl FromIterator<(PersonId, Money)> for Balances {
    /// Builds balances in iteration order; repeated persons accumulate.
    fn from_iter<I: IntoIterator<Item = (PersonId, Money)>>(iter: I) -> Self {
        let mut balances = Balances::new();
        for (person, amount) in iter {
            balances.credit(&person, amount);
        }
        balances
    }
}

/// Computes each person's net balance over an expense history.
///
/// Each participant is debited the rounded share (`amount / participants`,
/// half-up to 2 places) and the payer is credited the full amount. Records
/// with a non-positive amount or no participants are skipped with a warning.
pub fn compute_balances(expenses: &[ExpenseRecord]) -> Balances {
    let mut balances = Balances::new();

    for expense in expenses {
        if let Err(issue) = expense.check() {
            warn!("Expense {}: {}, skipping", expense.id, issue);
            continue;
        }

        let Some(share) = expense.amount.split(expense.participants.len()) else {
            warn!("Expense {}: cannot split amount, skipping", expense.id);
            continue;
        };

        for participant in &expense.participants {
            balances.debit(participant, share);
        }
        balances.credit(&expense.payer, expense.amount);

        debug!(
            "Expense {}: {} paid {} split {} ways at {}",
            expense.id,
            expense.payer,
            expense.amount,
            expense.participants.len(),
            share
        );
    }

    balances
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    fn id(s: &str) -> PersonId {
        PersonId::from(s)
    }

    #[test]
    fn test_payer_among_participants() {
        let expenses = vec![ExpenseRecord::new(1, money("300"), "A", ["A", "B", "C"])];

        let balances = compute_balances(&expenses);

        assert_eq!(balances.get(&id("A")).to_string(), "200.00");
        assert_eq!(balances.get(&id("B")).to_string(), "-100.00");
        assert_eq!(balances.get(&id("C")).to_string(), "-100.00");
        assert!(balances.total().is_zero());
    }

    #[test]
    fn test_first_seen_order_lists_participants_before_payer() {
        let expenses = vec![
            ExpenseRecord::new(1, money("30"), "P", ["X", "Y"]),
            ExpenseRecord::new(2, money("10"), "Z", ["P"]),
        ];

        let balances = compute_balances(&expenses);
        let order: Vec<&str> = balances.iter().map(|(p, _)| p.as_str()).collect();

        assert_eq!(order, vec!["X", "Y", "P", "Z"]);
    }

    #[test]
    fn test_contains_only_people_from_valid_expenses() {
        let empty: [&str; 0] = [];
        let expenses = vec![
            ExpenseRecord::new(1, money("30"), "A", ["B"]),
            ExpenseRecord::new(2, money("10"), "Q", empty),
        ];

        let balances = compute_balances(&expenses);

        assert!(balances.contains(&id("A")));
        assert!(balances.contains(&id("B")));
        assert!(!balances.contains(&id("Q")));
        assert_eq!(balances.len(), 2);
        assert!(!balances.is_empty());
        assert!(Balances::new().is_empty());
    }

    #[test]
    fn test_uneven_split_with_outside_payer_keeps_residual() {
        let expenses = vec![ExpenseRecord::new(1, money("10"), "P", ["X", "Y", "Z"])];

        let balances = compute_balances(&expenses);

        assert_eq!(balances.get(&id("P")).to_string(), "10.00");
        for person in ["X", "Y", "Z"] {
            assert_eq!(balances.get(&id(person)).to_string(), "-3.33");
        }
        assert_eq!(balances.total().to_string(), "0.01");
    }

    #[test]
    fn test_uneven_split_with_payer_inside() {
        let expenses = vec![ExpenseRecord::new(1, money("10"), "X", ["X", "Y", "Z"])];

        let balances = compute_balances(&expenses);

        assert_eq!(balances.get(&id("X")).to_string(), "6.67");
        assert_eq!(balances.get(&id("Y")).to_string(), "-3.33");
        assert_eq!(balances.total().to_string(), "0.01");
    }

    #[test]
    fn test_share_rounds_half_up() {
        // 0.05 / 2 = 0.025 rounds to 0.03, not to the even 0.02.
        let expenses = vec![ExpenseRecord::new(1, money("0.05"), "P", ["X", "Y"])];

        let balances = compute_balances(&expenses);

        assert_eq!(balances.get(&id("X")).to_string(), "-0.03");
        assert_eq!(balances.get(&id("Y")).to_string(), "-0.03");
    }

    #[test]
    fn test_skips_malformed_expenses() {
        let none: [&str; 0] = [];
        let expenses = vec![
            ExpenseRecord::new(1, money("10"), "A", none),
            ExpenseRecord::new(2, Money::ZERO, "A", ["B"]),
            ExpenseRecord::new(3, money("-4"), "A", ["B"]),
            ExpenseRecord::new(4, money("8"), "A", ["B"]),
        ];

        let balances = compute_balances(&expenses);

        assert_eq!(balances.len(), 2);
        assert_eq!(balances.get(&id("A")).to_string(), "8.00");
        assert_eq!(balances.get(&id("B")).to_string(), "-8.00");
    }

    #[test]
    fn test_empty_history() {
        let balances = compute_balances(&[]);
        assert!(balances.is_empty());
        assert!(balances.is_settled());
        assert_eq!(balances.get(&id("nobody")), Money::ZERO);
    }

    #[test]
    fn test_from_iter_accumulates_repeats() {
        let balances: Balances = vec![
            (id("A"), money("-5")),
            (id("B"), money("5")),
            (id("A"), money("2")),
        ]
        .into_iter()
        .collect();

        assert_eq!(balances.len(), 2);
        assert_eq!(balances.get(&id("A")).to_string(), "-3.00");
        let order: Vec<&str> = balances.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(order, vec!["A", "B"]);
    }
}
