//! Expense Splitter CLI
//!
//! Reads a CSV expense ledger and prints balances, settlements or a
//! spending summary as CSV.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- expenses.csv              # minimal settlements
//! cargo run -- expenses.csv grouped      # settlements merged per pair
//! cargo run -- expenses.csv balances     # net balance per person
//! cargo run -- expenses.csv summary      # totals per category
//! cargo run -- expenses.csv monthly      # totals per calendar month
//! cargo run -- expenses.csv settle       # record all settlements in the ledger
//! cargo run -- expenses.csv pay B A 20   # record a payment from B to A
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity

use expense_splitter::{
    write_balances, write_group_totals, write_settlements, CsvFileStore, Money, PersonId, Result,
    SplitEngine, SplitError,
};
use std::env;
use std::io;
use std::process;
use std::str::FromStr;

const PAY_USAGE: &str = "usage: expense-splitter <ledger.csv> pay <from> <to> <amount>";

/// What to do with the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Settlements,
    Grouped,
    Balances,
    Summary,
    Monthly,
    Settle,
    Pay {
        from: PersonId,
        to: PersonId,
        amount: Money,
    },
}

impl Command {
    /// Parses a command name and the arguments that follow it.
    fn parse(name: &str, args: &[String]) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "settlements" => Ok(Command::Settlements),
            "grouped" => Ok(Command::Grouped),
            "balances" => Ok(Command::Balances),
            "summary" => Ok(Command::Summary),
            "monthly" => Ok(Command::Monthly),
            "settle" => Ok(Command::Settle),
            "pay" => Self::parse_pay(args),
            _ => Err(SplitError::UnknownCommand(name.to_string())),
        }
    }

    fn parse_pay(args: &[String]) -> Result<Self> {
        let [from, to, amount] = args else {
            return Err(SplitError::InvalidInput(PAY_USAGE.to_string()));
        };
        let (from, to) = (from.trim(), to.trim());
        if from.is_empty() || to.is_empty() {
            return Err(SplitError::InvalidInput(PAY_USAGE.to_string()));
        }
        let amount = Money::from_str(amount)
            .map_err(|_| SplitError::InvalidInput(format!("invalid amount '{}'", amount)))?;

        Ok(Command::Pay {
            from: PersonId::from(from),
            to: PersonId::from(to),
            amount,
        })
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(SplitError::MissingArgument);
    }

    let ledger_path = &args[1];
    let command = match args.get(2) {
        Some(name) => Command::parse(name, &args[3..])?,
        None => Command::Settlements,
    };

    let mut engine = SplitEngine::new(CsvFileStore::new(ledger_path));

    let stdout = io::stdout();
    let handle = stdout.lock();

    match command {
        Command::Settlements => write_settlements(&engine.settlements()?, handle)?,
        Command::Grouped => write_settlements(&engine.grouped_settlements()?, handle)?,
        Command::Balances => write_balances(&engine.balances()?, handle)?,
        Command::Summary => {
            let (_, categories) = engine.summary()?;
            write_group_totals("category", &categories, handle)?;
        }
        Command::Monthly => write_group_totals("month", &engine.monthly_totals()?, handle)?,
        Command::Settle => write_settlements(&engine.settle_all()?, handle)?,
        Command::Pay { from, to, amount } => {
            let recorded = engine.record_settlement(&from, &to, amount)?;
            write_settlements(&[recorded], handle)?;
        }
    }

    Ok(())
}
