//! Append-only record of paid claims.
//!
//! One CSV row per paid claim: `codes,score,paid_amount,status,timestamp`.
//! The header is written only when the file is new (or empty), so repeated
//! runs keep appending to the same ledger.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{SettlementOutcome, SettlementStatus};

use super::LedgerError;

/// One ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub codes: String,
    pub score: f64,
    pub paid_amount: f64,
    pub status: SettlementStatus,
    pub timestamp: DateTime<Utc>,
}

impl LedgerRecord {
    /// Row for a paid outcome. Rejected outcomes have no ledger row.
    pub fn from_outcome(
        outcome: &SettlementOutcome,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        if !outcome.paid {
            return Err(LedgerError::NotPaid);
        }
        Ok(Self {
            codes: outcome.codes.render(),
            score: outcome.score.value(),
            paid_amount: outcome.paid_amount,
            status: outcome.status(),
            timestamp,
        })
    }
}

/// Sink for paid claims.
pub trait Ledger {
    fn append(&self, record: &LedgerRecord) -> Result<(), LedgerError>;

    /// Record a paid outcome stamped with the current time.
    fn record_paid(&self, outcome: &SettlementOutcome) -> Result<(), LedgerError> {
        let record = LedgerRecord::from_outcome(outcome, Utc::now())?;
        self.append(&record)
    }
}

/// CSV file ledger. Each append opens the file, writes one row and flushes.
pub struct CsvLedger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every row currently in the ledger, oldest first.
    pub fn read_all(&self) -> Result<Vec<LedgerRecord>, LedgerError> {
        read_ledger(&self.path)
    }
}

impl Ledger for CsvLedger {
    fn append(&self, record: &LedgerRecord) -> Result<(), LedgerError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| LedgerError::LockPoisoned)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let is_new = std::fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;

        tracing::debug!(
            ledger = %self.path.display(),
            paid_amount = record.paid_amount,
            score = record.score,
            "Paid claim recorded"
        );
        Ok(())
    }
}

/// Read a ledger file. A missing file is an empty ledger.
pub fn read_ledger(path: &Path) -> Result<Vec<LedgerRecord>, LedgerError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize::<LedgerRecord>() {
        records.push(row?);
    }
    Ok(records)
}

/// Process-local ledger for tests and dry runs.
#[derive(Default)]
pub struct InMemoryLedger {
    records: Mutex<Vec<LedgerRecord>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LedgerRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl Ledger for InMemoryLedger {
    fn append(&self, record: &LedgerRecord) -> Result<(), LedgerError> {
        self.records
            .lock()
            .map_err(|_| LedgerError::LockPoisoned)?
            .push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CodeSet, RiskScore};

    fn paid_outcome(amount: f64) -> SettlementOutcome {
        SettlementOutcome {
            paid: true,
            paid_amount: amount,
            score: RiskScore::new(0.85),
            codes: CodeSet {
                diagnosis_codes: vec!["E11.9".into()],
                procedure_codes: vec!["99213".into(), "82947".into()],
            },
        }
    }

    #[test]
    fn header_written_once_across_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paid_claims.csv");
        let ledger = CsvLedger::new(&path);

        ledger.record_paid(&paid_outcome(147.0)).unwrap();
        ledger.record_paid(&paid_outcome(196.0)).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "codes,score,paid_amount,status,timestamp");
        assert_eq!(raw.matches("codes,score").count(), 1);
        assert!(lines[1].starts_with("\"ICD: [E11.9] CPT: [99213, 82947]\",0.85,147.0,Paid,"));
    }

    #[test]
    fn existing_ledger_is_appended_not_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paid_claims.csv");

        CsvLedger::new(&path).record_paid(&paid_outcome(147.0)).unwrap();
        let reopened = CsvLedger::new(&path);
        reopened.record_paid(&paid_outcome(49.0)).unwrap();

        let records = reopened.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].paid_amount, 147.0);
        assert_eq!(records[1].paid_amount, 49.0);
        assert_eq!(records[1].status, SettlementStatus::Paid);
    }

    #[test]
    fn rejected_outcome_is_refused() {
        let ledger = InMemoryLedger::new();
        let mut outcome = paid_outcome(0.0);
        outcome.paid = false;
        assert!(matches!(
            ledger.record_paid(&outcome),
            Err(LedgerError::NotPaid)
        ));
        assert!(ledger.records().is_empty());
    }

    #[test]
    fn missing_ledger_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_ledger(&dir.path().join("none.csv")).unwrap().is_empty());
    }

    #[test]
    fn in_memory_ledger_keeps_order() {
        let ledger = InMemoryLedger::new();
        ledger.record_paid(&paid_outcome(1.0)).unwrap();
        ledger.record_paid(&paid_outcome(2.0)).unwrap();
        let amounts: Vec<f64> = ledger.records().iter().map(|r| r.paid_amount).collect();
        assert_eq!(amounts, vec![1.0, 2.0]);
    }
}
