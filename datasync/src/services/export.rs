//! CSV export
//!
//! One `<table>.csv` per mapped table, written in load order. Output is
//! byte-stable for unchanged data: rows are ordered and JSON cells are
//! written as canonical JSON text.

use super::bootstrap::SyncPlan;
use super::import::csv_path;
use super::introspect::verify_columns;
use super::summary::{RunSummary, SkipReason};
use crate::db::Database;
use crate::error::{SyncError, SyncResult};
use crate::models::ModelRegistry;
use std::path::Path;
use tracing::{info, warn};

pub struct CsvExporter<'a> {
    db: &'a Database,
    registry: &'a ModelRegistry,
}

impl<'a> CsvExporter<'a> {
    pub fn new(db: &'a Database, registry: &'a ModelRegistry) -> Self {
        Self { db, registry }
    }

    pub async fn export_all(
        &self,
        plan: &SyncPlan,
        dir: &Path,
        summary: &mut RunSummary,
    ) -> SyncResult<()> {
        for table in plan.snapshot.zero_column_tables() {
            warn!(table = %table, "Table has no columns; skipping");
            summary.record_skip(table, SkipReason::NoColumns);
        }

        let mut exportable = Vec::with_capacity(plan.order.len());
        for table in plan.order.iter() {
            if self.registry.contains(table) {
                exportable.push(table);
            } else {
                warn!(table, "No model mapping; skipping table");
                summary.record_skip(table, SkipReason::Unmapped);
            }
        }
        if exportable.is_empty() {
            return Err(SyncError::NothingToExport);
        }

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| SyncError::io(dir, e))?;

        for table in exportable {
            let codec = self.registry.get(table)?;
            if let Some(live) = plan.table(table).filter(|t| !t.columns.is_empty()) {
                verify_columns(live, codec)?;
            }

            let dump = codec.dump(self.db.pool(), self.db.schema()).await?;
            let path = csv_path(dir, table);
            tokio::fs::write(&path, &dump.csv)
                .await
                .map_err(|e| SyncError::io(&path, e))?;

            info!(table, rows = dump.rows, path = %path.display(), "Exported table");
            summary.record_rows(table, dump.rows);
        }

        Ok(())
    }
}
