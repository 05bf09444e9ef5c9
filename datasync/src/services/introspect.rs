//! Schema introspection
//!
//! Builds the plain [`Table`] / [`ForeignKeyEdge`] view of the working schema
//! from catalog metadata. JSON columns come from the model registry since the
//! catalog cannot tell JSON text apart from ordinary text.

use crate::db::Database;
use crate::error::{SyncError, SyncResult};
use crate::models::{ModelRegistry, TableCodec};
use crate::repositories::CatalogRepository;
use nutrition_sync_shared::{DependencyGraph, ForeignKeyEdge, IgnoredEdge, LoadOrder, Table};
use tracing::{debug, warn};

/// Tables and edges of the working schema at one point in time
#[derive(Debug, Clone, Default)]
pub struct SchemaSnapshot {
    pub tables: Vec<Table>,
    pub edges: Vec<ForeignKeyEdge>,
}

impl SchemaSnapshot {
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// Tables the catalog lists without any column
    pub fn zero_column_tables(&self) -> Vec<String> {
        self.tables
            .iter()
            .filter(|t| t.columns.is_empty())
            .map(|t| t.name.clone())
            .collect()
    }

    pub fn graph(&self) -> DependencyGraph {
        let graph = DependencyGraph::build(&self.tables, &self.edges);
        for ignored in graph.ignored_edges() {
            match ignored {
                IgnoredEdge::SelfReference(edge) => {
                    debug!(table = %edge.child, "Ignoring self-referencing foreign key")
                }
                IgnoredEdge::UnknownTable(edge) => debug!(
                    child = %edge.child,
                    parent = %edge.parent,
                    "Ignoring foreign key outside the working table set"
                ),
            }
        }
        graph
    }

    /// Parents-first order; fails on a dependency cycle
    pub fn load_order(&self) -> SyncResult<LoadOrder> {
        Ok(self.graph().load_order()?)
    }
}

pub struct SchemaIntrospector<'a> {
    db: &'a Database,
    registry: &'a ModelRegistry,
    excluded: &'a [String],
}

impl<'a> SchemaIntrospector<'a> {
    pub fn new(db: &'a Database, registry: &'a ModelRegistry, excluded: &'a [String]) -> Self {
        Self {
            db,
            registry,
            excluded,
        }
    }

    pub fn database(&self) -> &'a Database {
        self.db
    }

    pub fn registry(&self) -> &'a ModelRegistry {
        self.registry
    }

    fn is_excluded(&self, table: &str) -> bool {
        self.excluded.iter().any(|t| t == table)
    }

    /// Read the working schema. Catalog failures propagate.
    pub async fn snapshot(&self) -> SyncResult<SchemaSnapshot> {
        let pool = self.db.pool();
        let schema = self.db.schema();

        let names = CatalogRepository::list_tables(pool, schema).await?;
        let mut columns = CatalogRepository::list_columns(pool, schema).await?;

        let tables: Vec<Table> = names
            .into_iter()
            .filter(|name| !self.is_excluded(name))
            .map(|name| {
                let cols = columns.remove(&name).unwrap_or_default();
                let json = self
                    .registry
                    .lookup(&name)
                    .map(|codec| codec.json_columns())
                    .unwrap_or_default();
                Table::new(name, cols).with_json_columns(json)
            })
            .collect();

        let edges: Vec<ForeignKeyEdge> = CatalogRepository::list_foreign_keys(pool, schema)
            .await?
            .into_iter()
            .filter(|e| !self.is_excluded(&e.child) && !self.is_excluded(&e.parent))
            .collect();

        debug!(tables = tables.len(), edges = edges.len(), "Introspected schema");
        Ok(SchemaSnapshot { tables, edges })
    }

    pub async fn table_exists(&self, table: &str) -> SyncResult<bool> {
        CatalogRepository::table_exists(self.db.pool(), self.db.schema(), table).await
    }
}

/// Compare a live table against its mapping.
///
/// A mapped column the database lacks is fatal; database columns the mapping
/// does not know are only warned about.
pub fn verify_columns(table: &Table, codec: &dyn TableCodec) -> SyncResult<()> {
    if let Some(missing) = codec.columns().iter().find(|c| !table.has_column(c.name)) {
        return Err(SyncError::MissingColumn {
            table: table.name.clone(),
            column: missing.name.to_string(),
        });
    }

    let unmapped: Vec<&str> = table
        .columns
        .iter()
        .map(String::as_str)
        .filter(|c| !codec.columns().iter().any(|spec| spec.name == *c))
        .collect();
    if !unmapped.is_empty() {
        warn!(
            table = %table.name,
            columns = ?unmapped,
            "Database columns not covered by the model mapping"
        );
    }

    Ok(())
}
