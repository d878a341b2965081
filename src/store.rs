//! Expense storage.
//!
//! The balance and settlement functions only ever see a snapshot handed to
//! them; stores own the durable history and hand out those snapshots.

use crate::error::{IntegrityWarning, Result, SplitError};
use crate::expense::{ExpenseRecord, ExpenseRow, DATE_FORMAT, PARTICIPANT_SEPARATOR};
use csv::{ReaderBuilder, Trim};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

/// Columns a ledger header must contain.
pub const REQUIRED_COLUMNS: [&str; 4] = ["id", "amount", "payer", "participants"];

/// Column order used when writing a ledger.
pub const LEDGER_HEADER: [&str; 8] = [
    "id",
    "description",
    "amount",
    "payer",
    "participants",
    "category",
    "notes",
    "date",
];

/// Repository of recorded expenses.
///
/// `append` takes `&mut self`, so a store value has a single writer at a time.
pub trait ExpenseStore {
    /// Returns a snapshot of every valid expense, in recorded order.
    fn load(&self) -> Result<Vec<ExpenseRecord>>;

    /// Persists one more expense.
    fn append(&mut self, expense: ExpenseRecord) -> Result<()>;

    /// ID to use for the next appended expense.
    ///
    /// Fails once the ledger already holds `u32::MAX`.
    fn next_id(&self) -> Result<u32> {
        let expenses = self.load()?;
        match expenses.iter().map(|e| e.id).max() {
            None => Ok(1),
            Some(id) => id.checked_add(1).ok_or_else(|| {
                SplitError::InvalidInput("expense id space exhausted".to_string())
            }),
        }
    }
}

/// Store that keeps expenses in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    expenses: Vec<ExpenseRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(expenses: Vec<ExpenseRecord>) -> Self {
        MemoryStore { expenses }
    }
}

impl ExpenseStore for MemoryStore {
    fn load(&self) -> Result<Vec<ExpenseRecord>> {
        Ok(self.expenses.clone())
    }

    fn append(&mut self, expense: ExpenseRecord) -> Result<()> {
        self.expenses.push(expense);
        Ok(())
    }
}

/// Store backed by a CSV ledger file.
///
/// A missing file reads as an empty ledger. Every save first copies the
/// current file to `<path>.backup`.
#[derive(Debug, Clone)]
pub struct CsvFileStore {
    path: PathBuf,
}

impl CsvFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the copy taken before each save.
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".backup");
        PathBuf::from(name)
    }

    /// Rewrites the whole ledger.
    pub fn save(&self, expenses: &[ExpenseRecord]) -> Result<()> {
        if self.path.exists() {
            match fs::copy(&self.path, self.backup_path()) {
                Ok(_) => debug!("Backup created: {}", self.backup_path().display()),
                Err(e) => warn!("Could not create backup of {}: {}", self.path.display(), e),
            }
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(&self.path)?;
        write_expenses(expenses, BufWriter::new(file))?;
        info!(
            "Saved {} expenses to {}",
            expenses.len(),
            self.path.display()
        );
        Ok(())
    }
}

impl ExpenseStore for CsvFileStore {
    fn load(&self) -> Result<Vec<ExpenseRecord>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    "Ledger {} not found, starting empty",
                    self.path.display()
                );
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let expenses = read_expenses(BufReader::new(file))?;
        info!(
            "Loaded {} expenses from {}",
            expenses.len(),
            self.path.display()
        );
        Ok(expenses)
    }

    fn append(&mut self, expense: ExpenseRecord) -> Result<()> {
        let mut expenses = self.load()?;
        expenses.push(expense);
        self.save(&expenses)
    }
}

/// Reads ledger rows from CSV in streaming fashion.
///
/// Rows that fail to deserialize or validate are logged at warn level and
/// skipped, as are rows reusing an earlier ID. A header missing one of
/// [`REQUIRED_COLUMNS`] fails the whole read.
pub fn read_expenses<R: Read>(reader: R) -> Result<Vec<ExpenseRecord>> {
    let mut csv_reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    if headers.iter().all(str::is_empty) {
        return Ok(Vec::new());
    }
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();
    if !missing.is_empty() {
        return Err(SplitError::InvalidInput(format!(
            "ledger header is missing column(s): {}",
            missing.join(", ")
        )));
    }

    let mut expenses = Vec::new();
    let mut seen_ids = HashSet::new();

    for (row_idx, result) in csv_reader.deserialize::<ExpenseRow>().enumerate() {
        let row_num = row_idx + 2; // 1-indexed, accounting for header row

        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!("Row {}: CSV parse error: {}", row_num, e);
                continue;
            }
        };

        match row.parse() {
            Ok(expense) => {
                if !seen_ids.insert(expense.id) {
                    warn!(
                        "Row {}: {}, skipping",
                        row_num,
                        IntegrityWarning::DuplicateId(expense.id)
                    );
                    continue;
                }
                debug!(
                    "Row {}: Loaded expense {} of {}",
                    row_num, expense.id, expense.amount
                );
                expenses.push(expense);
            }
            Err(issue) => {
                warn!("Row {}: Expense {}: {}, skipping", row_num, row.id, issue);
            }
        }
    }

    Ok(expenses)
}

/// Writes expenses as a ledger CSV that [`read_expenses`] accepts.
pub fn write_expenses<W: Write>(expenses: &[ExpenseRecord], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(LEDGER_HEADER)?;

    let separator = PARTICIPANT_SEPARATOR.to_string();
    for expense in expenses {
        let participants: Vec<&str> = expense.participants.iter().map(|p| p.as_str()).collect();
        csv_writer.write_record([
            expense.id.to_string(),
            expense.description.clone(),
            expense.amount.to_string(),
            expense.payer.to_string(),
            participants.join(&separator),
            expense.category.clone(),
            expense.notes.clone(),
            expense
                .date
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;
    use crate::expense::PersonId;
    use chrono::NaiveDate;
    use std::io::Cursor;

    fn read_str(csv: &str) -> Result<Vec<ExpenseRecord>> {
        read_expenses(Cursor::new(csv))
    }

    #[test]
    fn test_read_valid_rows() {
        let csv = r#"id,description,amount,payer,participants,category,notes
1,Hotel,300,A,A;B;C,Travel,
2,Taxi,45.50,B,A;B,,late night"#;

        let expenses = read_str(csv).unwrap();

        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[0].category, "Travel");
        assert_eq!(expenses[0].participants.len(), 3);
        assert_eq!(expenses[1].amount.to_string(), "45.50");
        assert_eq!(expenses[1].category, "Other");
        assert_eq!(expenses[1].notes, "late night");
    }

    #[test]
    fn test_read_only_required_columns() {
        let csv = "id,amount,payer,participants\n1,10,A,B\n";
        let expenses = read_str(csv).unwrap();

        assert_eq!(expenses.len(), 1);
        assert!(expenses[0].description.is_empty());
    }

    #[test]
    fn test_read_skips_invalid_rows() {
        let csv = r#"id,description,amount,payer,participants
1,ok,10,A,B
2,zero,0,A,B
3,negative,-1,A,B
4,nobody,10,A,
5,no payer,10,,B
x,bad id,10,A,B
1,duplicate,99,A,B
6,ok too,5,B,A"#;

        let expenses = read_str(csv).unwrap();
        let ids: Vec<u32> = expenses.iter().map(|e| e.id).collect();

        assert_eq!(ids, vec![1, 6]);
        assert_eq!(expenses[0].amount.to_string(), "10.00");
    }

    #[test]
    fn test_read_rejects_header_without_required_columns() {
        let csv = "type,client,tx,amount\ndeposit,1,1,10.0\n";
        let err = read_str(csv).unwrap_err();

        assert!(matches!(err, SplitError::InvalidInput(_)));
        assert!(err.to_string().contains("payer"));
        assert!(err.to_string().contains("participants"));
    }

    #[test]
    fn test_read_empty_document() {
        assert!(read_str("").unwrap().is_empty());
    }

    #[test]
    fn test_write_then_read_keeps_every_field() {
        let expenses = vec![
            ExpenseRecord::new(3, Money::from_cents(1999), "A", ["B", "C"])
                .with_description("Lunch, with dessert")
                .with_notes("split evenly")
                .with_date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()),
            ExpenseRecord::new(4, Money::from_cents(500), "B", ["A"]),
        ];

        let mut out = Vec::new();
        write_expenses(&expenses, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("id,description,amount,payer,participants,category,notes,date"));
        assert!(text.contains("19.99,A,B;C,Other,split evenly,2024-02-29"));
        assert!(text.contains("4,,5.00,B,A,Other,,\n"));

        let restored = read_str(&text).unwrap();
        assert_eq!(restored, expenses);
    }

    #[test]
    fn test_memory_store_next_id() {
        let mut store = MemoryStore::new();
        assert_eq!(store.next_id().unwrap(), 1);

        store
            .append(ExpenseRecord::new(41, Money::from_cents(100), "A", ["B"]))
            .unwrap();
        assert_eq!(store.next_id().unwrap(), 42);
        assert_eq!(store.load().unwrap()[0].payer, PersonId::from("A"));
    }

    #[test]
    fn test_next_id_after_max_id_fails() {
        let store = MemoryStore::from_records(vec![ExpenseRecord::new(
            u32::MAX,
            Money::from_cents(3000),
            "A",
            ["A", "B", "C"],
        )]);

        let err = store.next_id().unwrap_err();
        assert!(matches!(err, SplitError::InvalidInput(_)));
        assert!(err.to_string().contains("id space exhausted"));
    }

    #[test]
    fn test_csv_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvFileStore::new(dir.path().join("missing.csv"));

        assert!(store.load().unwrap().is_empty());
        assert_eq!(store.next_id().unwrap(), 1);
    }

    #[test]
    fn test_csv_file_store_append_creates_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger").join("expenses.csv");
        let mut store = CsvFileStore::new(&path);

        store
            .append(ExpenseRecord::new(1, Money::from_cents(1000), "A", ["B"]))
            .unwrap();
        assert!(path.exists());
        assert!(!store.backup_path().exists());

        store
            .append(ExpenseRecord::new(2, Money::from_cents(500), "B", ["A"]))
            .unwrap();
        assert!(store.backup_path().exists());

        let backup = read_expenses(File::open(store.backup_path()).unwrap()).unwrap();
        assert_eq!(backup.len(), 1);
        assert_eq!(store.load().unwrap().len(), 2);
    }
}
