//! Expense splitting engine.
//!
//! Loads a fresh snapshot from its store on every call and derives balances
//! and settlements from it. The engine itself keeps no derived state.

use crate::balance::{compute_balances, Balances};
use crate::decimal::Money;
use crate::error::{Result, SplitError};
use crate::expense::PersonId;
use crate::settlement::{
    apply_settlements, group_by_pair, minimize_settlements, validate_settlements,
    SettlementInstruction, SettlementKind,
};
use crate::store::ExpenseStore;
use crate::summary::{totals_by_category, totals_by_month, ExpenseSummary, GroupTotal};
use chrono::Local;
use indexmap::IndexMap;
use log::{debug, info, warn};
use std::io::Write;

/// The expense splitting engine.
///
/// # Output Ordering
///
/// Balances are listed in first-seen order and settlements in the order the
/// sweep produces them, so the same ledger always yields the same output.
pub struct SplitEngine<S: ExpenseStore> {
    store: S,
}

impl<S: ExpenseStore> SplitEngine<S> {
    pub fn new(store: S) -> Self {
        SplitEngine { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Net balance of every person in the ledger.
    pub fn balances(&self) -> Result<Balances> {
        let snapshot = self.store.load()?;
        Ok(compute_balances(&snapshot))
    }

    /// Minimal payments that settle the current balances.
    pub fn settlements(&self) -> Result<Vec<SettlementInstruction>> {
        let balances = self.balances()?;
        let settlements = minimize_settlements(&balances);

        let residual = apply_settlements(&balances, &settlements);
        if !residual.is_settled() {
            debug!(
                "Settlements leave a rounding residual of {} across {} people",
                residual.total(),
                residual.iter().filter(|(_, b)| !b.is_zero()).count()
            );
        }

        Ok(settlements)
    }

    /// Settlements with repeated debtor/creditor pairs merged.
    pub fn grouped_settlements(&self) -> Result<Vec<SettlementInstruction>> {
        Ok(group_by_pair(&self.settlements()?))
    }

    /// Spending summary and per-category totals.
    pub fn summary(&self) -> Result<(ExpenseSummary, IndexMap<String, GroupTotal>)> {
        let snapshot = self.store.load()?;
        Ok((
            ExpenseSummary::from_expenses(&snapshot),
            totals_by_category(&snapshot),
        ))
    }

    /// Spending per calendar month, oldest first.
    pub fn monthly_totals(&self) -> Result<IndexMap<String, GroupTotal>> {
        let snapshot = self.store.load()?;
        Ok(totals_by_month(&snapshot))
    }

    /// Records a payment from `from` to `to` as a settlement expense.
    ///
    /// Both people must already appear in the ledger. The payment counts as
    /// a full settlement when it matches a computed instruction for the same
    /// pair exactly, and as partial otherwise.
    pub fn record_settlement(
        &mut self,
        from: &PersonId,
        to: &PersonId,
        amount: Money,
    ) -> Result<SettlementInstruction> {
        if !amount.is_positive() {
            return Err(SplitError::InvalidInput(format!(
                "settlement amount must be positive, got {}",
                amount
            )));
        }
        if from == to {
            return Err(SplitError::InvalidInput(format!(
                "{} cannot settle with themselves",
                from
            )));
        }

        let snapshot = self.store.load()?;
        let balances = compute_balances(&snapshot);
        for person in [from, to] {
            if !balances.contains(person) {
                return Err(SplitError::InvalidInput(format!(
                    "unknown person '{}'",
                    person
                )));
            }
        }

        let kind = if minimize_settlements(&balances)
            .iter()
            .any(|s| &s.from == from && &s.to == to && s.amount == amount)
        {
            SettlementKind::Full
        } else {
            SettlementKind::Partial
        };

        let instruction = SettlementInstruction::new(from.clone(), to.clone(), amount);
        self.persist(instruction.clone(), kind)?;
        info!("{:?} settlement recorded: {} paid {} {}", kind, from, to, amount);
        Ok(instruction)
    }

    /// Records every computed settlement and returns them.
    pub fn settle_all(&mut self) -> Result<Vec<SettlementInstruction>> {
        let settlements = self.settlements()?;
        if !validate_settlements(&settlements) {
            return Err(SplitError::InvalidInput(
                "computed settlements failed validation".to_string(),
            ));
        }

        for settlement in &settlements {
            self.persist(settlement.clone(), SettlementKind::Full)?;
        }
        info!("Recorded {} settlements", settlements.len());

        if !self.balances()?.is_settled() {
            warn!("Ledger still carries a rounding residual after settling");
        }
        Ok(settlements)
    }

    fn persist(&mut self, instruction: SettlementInstruction, kind: SettlementKind) -> Result<()> {
        let id = self.store.next_id()?;
        let expense = instruction
            .into_expense(id, kind)
            .with_date(Local::now().date_naive());
        self.store.append(expense)
    }
}

/// Writes balances as CSV, one row per person in first-seen order.
pub fn write_balances<W: Write>(balances: &Balances, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(["person", "balance"])?;
    for (person, balance) in balances.iter() {
        csv_writer.write_record([person.to_string(), balance.to_string()])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Writes settlements as CSV in the given order.
pub fn write_settlements<W: Write>(settlements: &[SettlementInstruction], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(["from", "to", "amount"])?;
    for settlement in settlements {
        csv_writer.write_record([
            settlement.from.to_string(),
            settlement.to.to_string(),
            settlement.amount.to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Writes grouped totals as CSV under a `<label>,count,total` header.
pub fn write_group_totals<W: Write>(
    label: &str,
    groups: &IndexMap<String, GroupTotal>,
    writer: W,
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record([label, "count", "total"])?;
    for (group, totals) in groups {
        csv_writer.write_record([
            group.clone(),
            totals.count.to_string(),
            totals.total.to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}
