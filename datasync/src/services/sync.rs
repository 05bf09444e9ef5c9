//! Run orchestration for export, import and rebuild

use super::bootstrap::{Bootstrapper, PlanSource, SyncPlan};
use super::export::CsvExporter;
use super::import::{self, CsvImporter};
use super::introspect::SchemaIntrospector;
use super::migrations::Migrator;
use super::reset::ResetService;
use super::sequences::SequenceReconciler;
use super::summary::RunSummary;
use crate::config::AppConfig;
use crate::db::Database;
use crate::error::{SyncError, SyncResult};
use crate::models::ModelRegistry;
use nutrition_sync_shared::LoadOrder;
use std::path::Path;
use tracing::{info, warn};

/// Knobs of a run, usually taken from [`AppConfig`]
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub batch_size: usize,
    pub excluded_tables: Vec<String>,
    pub fallback_order: Vec<String>,
    pub migrate_before_import: bool,
}

impl SyncOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            batch_size: config.sync.batch_size,
            excluded_tables: config.sync.excluded_tables.clone(),
            fallback_order: config.sync.fallback_order.clone(),
            migrate_before_import: config.migrations.apply_before_import,
        }
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            excluded_tables: vec!["alembic_version".to_string()],
            fallback_order: Vec::new(),
            migrate_before_import: true,
        }
    }
}

pub struct SyncService<'a> {
    db: &'a Database,
    registry: &'a ModelRegistry,
    migrator: &'a dyn Migrator,
    options: SyncOptions,
}

impl<'a> SyncService<'a> {
    pub fn new(
        db: &'a Database,
        registry: &'a ModelRegistry,
        migrator: &'a dyn Migrator,
        options: SyncOptions,
    ) -> Self {
        Self {
            db,
            registry,
            migrator,
            options,
        }
    }

    fn introspector(&self) -> SchemaIntrospector<'_> {
        SchemaIntrospector::new(self.db, self.registry, &self.options.excluded_tables)
    }

    /// Dump every mapped table of the live schema into `dir`
    pub async fn export(&self, dir: &Path) -> SyncResult<RunSummary> {
        let snapshot = self.introspector().snapshot().await?;
        if snapshot.is_empty() {
            return Err(SyncError::NothingToExport);
        }
        let order = snapshot.load_order()?;
        info!(order = %order, dir = %dir.display(), "Exporting");

        let plan = SyncPlan {
            snapshot,
            order,
            source: PlanSource::Introspected,
        };

        let mut summary = RunSummary::default();
        CsvExporter::new(self.db, self.registry)
            .export_all(&plan, dir, &mut summary)
            .await?;
        summary.log("export");
        Ok(summary)
    }

    /// Replace all data with the CSV files in `dir`
    pub async fn import(&self, dir: &Path) -> SyncResult<RunSummary> {
        if !dir.is_dir() {
            return Err(SyncError::MissingDataDir(dir.to_path_buf()));
        }

        if self.options.migrate_before_import {
            self.migrator.migrate(self.db.url()).await?;
        }

        let introspector = self.introspector();
        let plan = Bootstrapper::new(&introspector, self.migrator, &self.options.fallback_order)
            .plan()
            .await?;
        info!(source = ?plan.source, dir = %dir.display(), "Importing");

        import::preflight(self.registry, &plan, dir)?;
        ResetService::truncate_all(self.db, &plan.order).await?;

        let mut summary = RunSummary::default();
        CsvImporter::new(self.db, self.registry, self.options.batch_size)
            .import_all(&plan, dir, &mut summary)
            .await?;

        let tables = plan.order.iter().filter_map(|name| plan.table(name));
        for (table, outcome) in SequenceReconciler::new(self.db).reconcile_all(tables).await {
            summary.record_sequence(table, outcome);
        }

        summary.log("import");
        Ok(summary)
    }

    /// Drop the schema, re-run migrations, then import from `dir`
    pub async fn rebuild(&self, dir: &Path) -> SyncResult<RunSummary> {
        if !dir.is_dir() {
            return Err(SyncError::MissingDataDir(dir.to_path_buf()));
        }

        let snapshot = self.introspector().snapshot().await?;
        let order = match snapshot.load_order() {
            Ok(order) => order,
            Err(e) => {
                warn!(error = %e, "Could not order tables; dropping them unordered");
                LoadOrder::trusted(snapshot.table_names().into_iter().map(String::from).collect())
            }
        };

        // live columns may change with the migration, so only mapping and headers
        import::check_headers(self.registry, order.iter(), dir)?;

        let columnless = snapshot.zero_column_tables();
        let mut doomed = order.reversed();
        doomed.extend(
            columnless
                .iter()
                .chain(self.options.excluded_tables.iter())
                .map(String::as_str),
        );
        ResetService::drop_all(self.db, &doomed).await?;

        self.migrator.migrate(self.db.url()).await?;

        let rebuilt = SyncService::new(
            self.db,
            self.registry,
            self.migrator,
            SyncOptions {
                migrate_before_import: false,
                ..self.options.clone()
            },
        );
        rebuilt.import(dir).await
    }
}
