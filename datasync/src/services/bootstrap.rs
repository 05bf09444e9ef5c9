//! Working-set discovery with migration and fallback
//!
//! Introspection is tried first. An empty schema triggers one migration run
//! and a second introspection; if that still finds nothing, a hand-maintained
//! table list is checked table by table.

use super::introspect::{SchemaIntrospector, SchemaSnapshot};
use super::migrations::Migrator;
use crate::error::{SyncError, SyncResult};
use nutrition_sync_shared::{LoadOrder, Table};
use tracing::{info, warn};

/// Where the load order came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanSource {
    Introspected,
    /// Introspected after migrating an empty schema
    Migrated,
    /// Static list, filtered to tables that exist
    Fallback,
}

/// Tables to process and the order to process them in
#[derive(Debug, Clone)]
pub struct SyncPlan {
    pub snapshot: SchemaSnapshot,
    pub order: LoadOrder,
    pub source: PlanSource,
}

impl SyncPlan {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.snapshot.table(name)
    }
}

pub struct Bootstrapper<'a> {
    introspector: &'a SchemaIntrospector<'a>,
    migrator: &'a dyn Migrator,
    fallback: &'a [String],
}

impl<'a> Bootstrapper<'a> {
    pub fn new(
        introspector: &'a SchemaIntrospector<'a>,
        migrator: &'a dyn Migrator,
        fallback: &'a [String],
    ) -> Self {
        Self {
            introspector,
            migrator,
            fallback,
        }
    }

    pub async fn plan(&self) -> SyncResult<SyncPlan> {
        let snapshot = self.introspector.snapshot().await?;
        if !snapshot.is_empty() {
            return Self::ordered(snapshot, PlanSource::Introspected);
        }

        warn!("No tables found; running migrations and retrying introspection");
        self.migrator
            .migrate(self.introspector.database().url())
            .await?;

        let snapshot = self.introspector.snapshot().await?;
        if !snapshot.is_empty() {
            return Self::ordered(snapshot, PlanSource::Migrated);
        }

        self.fallback_plan().await
    }

    fn ordered(snapshot: SchemaSnapshot, source: PlanSource) -> SyncResult<SyncPlan> {
        let order = snapshot.load_order()?;
        info!(tables = order.len(), order = %order, "Computed load order");
        Ok(SyncPlan {
            snapshot,
            order,
            source,
        })
    }

    async fn fallback_plan(&self) -> SyncResult<SyncPlan> {
        warn!(
            candidates = self.fallback.len(),
            "Introspection still empty; using the static table list"
        );

        let registry = self.introspector.registry();
        let mut existing = Vec::new();
        let mut tables = Vec::new();
        for name in self.fallback {
            if !self.introspector.table_exists(name).await? {
                warn!(table = %name, "Listed table does not exist; skipping");
                continue;
            }
            let columns = registry
                .lookup(name)
                .map(|codec| codec.columns().iter().map(|c| c.name.to_string()).collect())
                .unwrap_or_default();
            let json = registry
                .lookup(name)
                .map(|codec| codec.json_columns())
                .unwrap_or_default();
            tables.push(Table::new(name.clone(), columns).with_json_columns(json));
            existing.push(name.clone());
        }

        if existing.is_empty() {
            return Err(SyncError::NoTables);
        }

        let order = LoadOrder::trusted(existing);
        info!(order = %order, "Using fallback load order");
        Ok(SyncPlan {
            snapshot: SchemaSnapshot {
                tables,
                edges: vec![],
            },
            order,
            source: PlanSource::Fallback,
        })
    }
}
