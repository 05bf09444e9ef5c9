//! CSV import
//!
//! Tables are loaded strictly in plan order, one transaction per table. The
//! first failure aborts the run, so dependents of a failed table are never
//! attempted.

use super::bootstrap::SyncPlan;
use super::introspect::verify_columns;
use super::summary::{RunSummary, SkipReason};
use crate::db::Database;
use crate::error::{SyncError, SyncResult};
use crate::models::{CoercedRow, ModelRegistry, TableCodec};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Path of the CSV file holding `table`
pub fn csv_path(dir: &Path, table: &str) -> PathBuf {
    dir.join(format!("{table}.csv"))
}

/// Parse CSV text into coerced rows using `codec`'s column kinds
pub fn parse_csv(codec: &dyn TableCodec, bytes: &[u8]) -> SyncResult<Vec<CoercedRow>> {
    let table = codec.table();
    let mut reader = csv::Reader::from_reader(bytes);
    let layout = codec.layout(reader.headers().map_err(|e| SyncError::csv(table, e))?)?;

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| SyncError::csv(table, e))?;
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(index as u64 + 2);
        rows.push(layout.coerce(&record, line)?);
    }
    Ok(rows)
}

/// Mapping and header check for every table in `tables` with a CSV file in
/// `dir`. Reads only the header line of each file.
pub fn check_headers<'t>(
    registry: &ModelRegistry,
    tables: impl IntoIterator<Item = &'t str>,
    dir: &Path,
) -> SyncResult<()> {
    for table in tables {
        let path = csv_path(dir, table);
        if !path.is_file() {
            continue;
        }

        let codec = registry.get(table)?;
        let mut reader = csv::Reader::from_path(&path).map_err(|e| SyncError::csv(table, e))?;
        codec.layout(reader.headers().map_err(|e| SyncError::csv(table, e))?)?;
    }
    Ok(())
}

/// Everything [`CsvImporter::import_all`] would reject before inserting,
/// checked while the database is still untouched
pub fn preflight(registry: &ModelRegistry, plan: &SyncPlan, dir: &Path) -> SyncResult<()> {
    if !dir.is_dir() {
        return Err(SyncError::MissingDataDir(dir.to_path_buf()));
    }

    check_headers(registry, plan.order.iter(), dir)?;

    for table in plan.order.iter() {
        if !csv_path(dir, table).is_file() {
            continue;
        }
        if let Some(live) = plan.table(table).filter(|t| !t.columns.is_empty()) {
            verify_columns(live, registry.get(table)?)?;
        }
    }
    Ok(())
}

pub struct CsvImporter<'a> {
    db: &'a Database,
    registry: &'a ModelRegistry,
    batch_size: usize,
}

impl<'a> CsvImporter<'a> {
    pub fn new(db: &'a Database, registry: &'a ModelRegistry, batch_size: usize) -> Self {
        Self {
            db,
            registry,
            batch_size,
        }
    }

    /// Load every table of `plan` that has a CSV file in `dir`
    pub async fn import_all(
        &self,
        plan: &SyncPlan,
        dir: &Path,
        summary: &mut RunSummary,
    ) -> SyncResult<()> {
        if !dir.is_dir() {
            return Err(SyncError::MissingDataDir(dir.to_path_buf()));
        }

        for table in plan.order.iter() {
            let path = csv_path(dir, table);
            if !path.is_file() {
                warn!(table, path = %path.display(), "No CSV file; skipping table");
                summary.record_skip(table, SkipReason::MissingCsv);
                continue;
            }

            let codec = self.registry.get(table)?;
            if let Some(live) = plan.table(table).filter(|t| !t.columns.is_empty()) {
                verify_columns(live, codec)?;
            }

            let rows = self.import_file(codec, &path).await?;
            summary.record_rows(table, rows);
        }

        Ok(())
    }

    /// Read, coerce and insert one file; returns rows inserted
    pub async fn import_file(&self, codec: &dyn TableCodec, path: &Path) -> SyncResult<u64> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| SyncError::io(path, e))?;
        let rows = parse_csv(codec, &bytes)?;
        self.insert_rows(codec, rows).await
    }

    /// Insert `rows` in a transaction of their own
    pub async fn insert_rows(&self, codec: &dyn TableCodec, rows: Vec<CoercedRow>) -> SyncResult<u64> {
        let table = codec.table();
        if rows.is_empty() {
            info!(table, rows = 0, "Imported table");
            return Ok(0);
        }

        let mut tx = self.db.pool().begin().await?;
        let inserted = codec
            .insert(&mut *tx, self.db.schema(), rows, self.batch_size)
            .await?;
        tx.commit().await.map_err(|source| SyncError::Insert {
            table: table.to_string(),
            source,
        })?;

        info!(table, rows = inserted, "Imported table");
        Ok(inserted)
    }
}
