//! Per-run report

use std::fmt;
use tracing::{info, warn};

/// Why a table was not processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No `<table>.csv` in the data directory
    MissingCsv,
    /// Table has no model mapping
    Unmapped,
    /// Catalog reports no columns
    NoColumns,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingCsv => write!(f, "no CSV file"),
            SkipReason::Unmapped => write!(f, "no model mapping"),
            SkipReason::NoColumns => write!(f, "no columns"),
        }
    }
}

/// Result of reconciling one table's identity sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceOutcome {
    Reset { sequence: String, next_value: i64 },
    NoIdentity,
    NotSequenceBacked,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCount {
    pub table: String,
    pub rows: u64,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub processed: Vec<TableCount>,
    pub skipped: Vec<(String, SkipReason)>,
    pub sequences: Vec<(String, SequenceOutcome)>,
}

impl RunSummary {
    pub fn record_rows(&mut self, table: impl Into<String>, rows: u64) {
        self.processed.push(TableCount {
            table: table.into(),
            rows,
        });
    }

    pub fn record_skip(&mut self, table: impl Into<String>, reason: SkipReason) {
        self.skipped.push((table.into(), reason));
    }

    pub fn record_sequence(&mut self, table: impl Into<String>, outcome: SequenceOutcome) {
        self.sequences.push((table.into(), outcome));
    }

    pub fn total_rows(&self) -> u64 {
        self.processed.iter().map(|c| c.rows).sum()
    }

    pub fn rows_for(&self, table: &str) -> Option<u64> {
        self.processed
            .iter()
            .find(|c| c.table == table)
            .map(|c| c.rows)
    }

    pub fn failed_sequences(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sequences.iter().filter_map(|(table, outcome)| match outcome {
            SequenceOutcome::Failed(message) => Some((table.as_str(), message.as_str())),
            _ => None,
        })
    }

    /// Emit the end-of-run report
    pub fn log(&self, action: &str) {
        for (table, reason) in &self.skipped {
            info!(table = %table, reason = %reason, "Skipped table");
        }
        for (table, message) in self.failed_sequences() {
            warn!(table = %table, error = %message, "Sequence not reconciled");
        }
        info!(
            action,
            tables = self.processed.len(),
            skipped = self.skipped.len(),
            rows = self.total_rows(),
            "Run complete"
        );
    }
}
