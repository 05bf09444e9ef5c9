//! Destructive reset: truncate or drop every table of a run

use crate::db::{qualified_name, Database};
use crate::error::SyncResult;
use nutrition_sync_shared::LoadOrder;
use tracing::info;

/// Single `TRUNCATE` over all tables, children first; `None` when empty
pub fn truncate_statement(schema: &str, order: &LoadOrder) -> Option<String> {
    if order.is_empty() {
        return None;
    }
    let tables: Vec<String> = order
        .reversed()
        .into_iter()
        .map(|t| qualified_name(schema, t))
        .collect();
    Some(format!(
        "TRUNCATE TABLE {} RESTART IDENTITY CASCADE",
        tables.join(", ")
    ))
}

/// Single `DROP TABLE` over `tables`; `None` when empty
pub fn drop_statement(schema: &str, tables: &[&str]) -> Option<String> {
    if tables.is_empty() {
        return None;
    }
    let tables: Vec<String> = tables.iter().map(|t| qualified_name(schema, t)).collect();
    Some(format!("DROP TABLE IF EXISTS {} CASCADE", tables.join(", ")))
}

pub struct ResetService;

impl ResetService {
    /// Erase every row and restart identities, atomically.
    /// An empty order is a no-op.
    pub async fn truncate_all(db: &Database, order: &LoadOrder) -> SyncResult<()> {
        let Some(sql) = truncate_statement(db.schema(), order) else {
            info!("No tables to truncate");
            return Ok(());
        };

        let mut tx = db.pool().begin().await?;
        sqlx::query(&sql).execute(&mut *tx).await?;
        tx.commit().await?;

        info!(tables = order.len(), "Truncated tables");
        Ok(())
    }

    /// Drop `tables` (reverse load order when known) in one transaction
    pub async fn drop_all(db: &Database, tables: &[&str]) -> SyncResult<()> {
        let Some(sql) = drop_statement(db.schema(), tables) else {
            info!("No tables to drop");
            return Ok(());
        };

        let mut tx = db.pool().begin().await?;
        sqlx::query(&sql).execute(&mut *tx).await?;
        tx.commit().await?;

        info!(tables = tables.len(), "Dropped tables");
        Ok(())
    }
}
