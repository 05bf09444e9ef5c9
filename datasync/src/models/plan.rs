//! Saved meal plans with a free-form JSON payload

use super::{json_text, ColumnSpec, TableModel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::query_builder::Separated;
use sqlx::Postgres;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Plan {
    pub id: i32,
    pub label: String,
    #[serde(serialize_with = "json_text::serialize")]
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TableModel for Plan {
    const TABLE: &'static str = "plans";
    const COLUMNS: &'static [ColumnSpec] = &[
        ColumnSpec::integer("id"),
        ColumnSpec::text("label"),
        ColumnSpec::json("payload"),
        ColumnSpec::timestamp("created_at"),
        ColumnSpec::timestamp("updated_at"),
    ];

    fn bind_values(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.id)
            .push_bind(self.label)
            .push_bind(self.payload)
            .push_bind(self.created_at)
            .push_bind(self.updated_at);
    }
}
