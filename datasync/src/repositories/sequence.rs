//! Identity sequence lookups and resets

use crate::db::{qualified_name, quote_ident};
use crate::error::SyncResult;
use nutrition_sync_shared::IDENTITY_COLUMN;
use sqlx::PgPool;

pub struct SequenceRepository;

impl SequenceRepository {
    /// Sequence owning the identity column of `table`, if any
    pub async fn serial_sequence(
        pool: &PgPool,
        schema: &str,
        table: &str,
    ) -> SyncResult<Option<String>> {
        let sequence = sqlx::query_scalar::<_, Option<String>>(
            "SELECT pg_get_serial_sequence($1, $2)",
        )
        .bind(qualified_name(schema, table))
        .bind(IDENTITY_COLUMN)
        .fetch_one(pool)
        .await?;

        Ok(sequence)
    }

    /// Point `sequence` past the largest id in `table`, or back to its start
    /// value when the table is empty. Returns the next value handed out.
    pub async fn reset_to_max_id(
        pool: &PgPool,
        schema: &str,
        table: &str,
        sequence: &str,
    ) -> SyncResult<i64> {
        let sql = reset_statement(schema, table);
        let next = sqlx::query_scalar::<_, i64>(&sql)
            .bind(sequence)
            .fetch_one(pool)
            .await?;

        Ok(next)
    }
}

/// `setval(.., false)` makes the given value the next one returned
pub fn reset_statement(schema: &str, table: &str) -> String {
    format!(
        "SELECT setval($1::regclass, \
         COALESCE((SELECT MAX({id}) FROM {table})::bigint + 1, s.seqstart), false) \
         FROM pg_sequence s WHERE s.seqrelid = $1::regclass",
        id = quote_ident(IDENTITY_COLUMN),
        table = qualified_name(schema, table),
    )
}
