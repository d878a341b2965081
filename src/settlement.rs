//! Settlement minimization.
//!
//! Turns net balances into point-to-point payments with a greedy two-cursor
//! sweep over debtors and creditors, both kept in balance order.

use crate::balance::Balances;
use crate::decimal::Money;
use crate::expense::{ExpenseRecord, PersonId, SETTLEMENT_CATEGORY};
use indexmap::IndexMap;
use log::{debug, warn};
use serde::Serialize;

/// A directive for `from` to pay `to` the given amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementInstruction {
    /// Net debtor
    pub from: PersonId,

    /// Net creditor
    pub to: PersonId,

    /// Always positive
    pub amount: Money,
}

/// Whether a recorded payment clears the whole instruction or only part of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementKind {
    Full,
    Partial,
}

impl SettlementInstruction {
    pub fn new(from: impl Into<PersonId>, to: impl Into<PersonId>, amount: Money) -> Self {
        SettlementInstruction {
            from: from.into(),
            to: to.into(),
            amount,
        }
    }

    /// Converts the payment into an expense record.
    ///
    /// The debtor becomes the payer and the creditor the sole participant,
    /// so replaying the record moves both balances toward zero.
    pub fn into_expense(self, id: u32, kind: SettlementKind) -> ExpenseRecord {
        let (description, notes) = match kind {
            SettlementKind::Full => (format!("Settlement to {}", self.to), "Full settlement"),
            SettlementKind::Partial => (
                format!("Partial Settlement to {}", self.to),
                "Partial settlement",
            ),
        };

        ExpenseRecord::new(id, self.amount, self.from, [self.to])
            .with_description(description)
            .with_category(SETTLEMENT_CATEGORY)
            .with_notes(notes)
    }
}

/// Outstanding amount on one side of the sweep.
struct Position {
    person: PersonId,
    remaining: Money,
}

/// Computes the payments that bring every balance to zero.
///
/// Debtors and creditors keep the order of `balances`; nothing is sorted by
/// magnitude. Each step pays `min(debt, credit)` and advances whichever
/// cursor reached exactly zero (possibly both), so the result holds at most
/// `debtors + creditors - 1` instructions. Sub-cent residuals from uneven
/// splits may leave a tail on one side, which is logged and left alone.
pub fn minimize_settlements(balances: &Balances) -> Vec<SettlementInstruction> {
    let mut debtors = Vec::new();
    let mut creditors = Vec::new();

    for (person, balance) in balances.iter() {
        if balance.is_negative() {
            debtors.push(Position {
                person: person.clone(),
                remaining: balance.abs(),
            });
        } else if balance.is_positive() {
            creditors.push(Position {
                person: person.clone(),
                remaining: balance,
            });
        }
    }

    let mut settlements = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < debtors.len() && j < creditors.len() {
        let debtor = &mut debtors[i];
        let creditor = &mut creditors[j];

        let pay = debtor.remaining.min(creditor.remaining);
        settlements.push(SettlementInstruction::new(
            debtor.person.clone(),
            creditor.person.clone(),
            pay,
        ));

        debtor.remaining -= pay;
        creditor.remaining -= pay;

        if debtor.remaining.is_zero() {
            i += 1;
        }
        if creditor.remaining.is_zero() {
            j += 1;
        }
    }

    for tail in debtors[i..].iter().chain(&creditors[j..]) {
        debug!(
            "Unmatched residual of {} left for {}",
            tail.remaining, tail.person
        );
    }
    debug!("Generated {} settlements", settlements.len());

    settlements
}

/// Applies payments to a copy of `balances` and returns what is left.
///
/// Paying credits the payer and debits the receiver, as a recorded
/// settlement expense would.
pub fn apply_settlements(balances: &Balances, settlements: &[SettlementInstruction]) -> Balances {
    let mut remaining = balances.clone();
    for settlement in settlements {
        remaining.credit(&settlement.from, settlement.amount);
        remaining.debit(&settlement.to, settlement.amount);
    }
    remaining
}

/// Merges instructions between the same pair of people, in first-seen order.
pub fn group_by_pair(settlements: &[SettlementInstruction]) -> Vec<SettlementInstruction> {
    let mut grouped: IndexMap<(PersonId, PersonId), Money> = IndexMap::new();
    for settlement in settlements {
        *grouped
            .entry((settlement.from.clone(), settlement.to.clone()))
            .or_insert(Money::ZERO) += settlement.amount;
    }

    grouped
        .into_iter()
        .map(|((from, to), amount)| SettlementInstruction { from, to, amount })
        .collect()
}

/// Checks every instruction pays a positive amount to someone else.
pub fn validate_settlements(settlements: &[SettlementInstruction]) -> bool {
    for settlement in settlements {
        if !settlement.amount.is_positive() {
            warn!("Invalid settlement amount: {:?}", settlement);
            return false;
        }
        if settlement.from == settlement.to {
            warn!("Settlement pays its own debtor: {:?}", settlement);
            return false;
        }
    }
    true
}
