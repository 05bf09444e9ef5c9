//! Catalog repository: tables, columns and foreign keys of one schema

use crate::db::qualified_name;
use crate::error::{SyncError, SyncResult};
use nutrition_sync_shared::ForeignKeyEdge;
use sqlx::PgPool;
use std::collections::BTreeMap;

/// Column row from information_schema
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ColumnRecord {
    pub table_name: String,
    pub column_name: String,
}

/// Foreign-key row from pg_constraint
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ForeignKeyRecord {
    pub child: String,
    pub parent: String,
}

impl From<ForeignKeyRecord> for ForeignKeyEdge {
    fn from(record: ForeignKeyRecord) -> Self {
        ForeignKeyEdge::new(record.child, record.parent)
    }
}

/// Read-only catalog queries
pub struct CatalogRepository;

impl CatalogRepository {
    /// Base tables of `schema`, sorted by name
    pub async fn list_tables(pool: &PgPool, schema: &str) -> SyncResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT tablename::text
            FROM pg_tables
            WHERE schemaname = $1
            ORDER BY tablename
            "#,
        )
        .bind(schema)
        .fetch_all(pool)
        .await
        .map_err(SyncError::Catalog)
    }

    /// Column names per table, each list in ordinal order
    pub async fn list_columns(
        pool: &PgPool,
        schema: &str,
    ) -> SyncResult<BTreeMap<String, Vec<String>>> {
        let records = sqlx::query_as::<_, ColumnRecord>(
            r#"
            SELECT table_name::text AS table_name, column_name::text AS column_name
            FROM information_schema.columns
            WHERE table_schema = $1
            ORDER BY table_name, ordinal_position
            "#,
        )
        .bind(schema)
        .fetch_all(pool)
        .await
        .map_err(SyncError::Catalog)?;

        let mut columns: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for record in records {
            columns
                .entry(record.table_name)
                .or_default()
                .push(record.column_name);
        }
        Ok(columns)
    }

    /// Foreign keys between tables of `schema`, one row per table pair
    pub async fn list_foreign_keys(pool: &PgPool, schema: &str) -> SyncResult<Vec<ForeignKeyEdge>> {
        let records = sqlx::query_as::<_, ForeignKeyRecord>(
            r#"
            SELECT DISTINCT
                child.relname::text AS child,
                parent.relname::text AS parent
            FROM pg_constraint con
            JOIN pg_class child ON child.oid = con.conrelid
            JOIN pg_namespace child_ns ON child_ns.oid = child.relnamespace
            JOIN pg_class parent ON parent.oid = con.confrelid
            JOIN pg_namespace parent_ns ON parent_ns.oid = parent.relnamespace
            WHERE con.contype = 'f'
              AND child_ns.nspname = $1
              AND parent_ns.nspname = $1
            ORDER BY child, parent
            "#,
        )
        .bind(schema)
        .fetch_all(pool)
        .await
        .map_err(SyncError::Catalog)?;

        Ok(records.into_iter().map(ForeignKeyEdge::from).collect())
    }

    /// Whether `schema.table` resolves to a relation
    pub async fn table_exists(pool: &PgPool, schema: &str, table: &str) -> SyncResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT to_regclass($1) IS NOT NULL")
            .bind(qualified_name(schema, table))
            .fetch_one(pool)
            .await
            .map_err(SyncError::Catalog)
    }
}
