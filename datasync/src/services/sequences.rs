//! Sequence reconciliation after import
//!
//! Best effort: a failure on one table is logged and recorded, and the next
//! table is still attempted.

use super::summary::SequenceOutcome;
use crate::db::Database;
use crate::error::SyncResult;
use crate::repositories::SequenceRepository;
use nutrition_sync_shared::Table;
use tracing::{debug, info, warn};

pub struct SequenceReconciler<'a> {
    db: &'a Database,
}

impl<'a> SequenceReconciler<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Reconcile every table, in the order given
    pub async fn reconcile_all<'t, I>(&self, tables: I) -> Vec<(String, SequenceOutcome)>
    where
        I: IntoIterator<Item = &'t Table>,
    {
        let mut outcomes = Vec::new();
        for table in tables {
            let outcome = self.reconcile(table).await;
            outcomes.push((table.name.clone(), outcome));
        }
        outcomes
    }

    pub async fn reconcile(&self, table: &Table) -> SequenceOutcome {
        if table.identity.is_none() {
            return SequenceOutcome::NoIdentity;
        }

        match self.try_reconcile(&table.name).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(table = %table.name, error = %e, "Could not reset sequence");
                SequenceOutcome::Failed(e.to_string())
            }
        }
    }

    async fn try_reconcile(&self, table: &str) -> SyncResult<SequenceOutcome> {
        let pool = self.db.pool();
        let schema = self.db.schema();

        let Some(sequence) = SequenceRepository::serial_sequence(pool, schema, table).await? else {
            debug!(table, "Identity column is not sequence-backed");
            return Ok(SequenceOutcome::NotSequenceBacked);
        };

        let next_value = SequenceRepository::reset_to_max_id(pool, schema, table, &sequence).await?;
        info!(table, sequence = %sequence, next_value, "Reset sequence");

        Ok(SequenceOutcome::Reset {
            sequence,
            next_value,
        })
    }
}
