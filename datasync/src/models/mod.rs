//! Persisted row models of the nutrition schema
//!
//! Each table the engine can load or dump has one row struct implementing
//! [`TableModel`]. The struct field order is the CSV column order, so keep
//! `COLUMNS` and the fields in step when the schema changes.

pub mod codec;
pub mod food;
pub mod ingredient;
pub mod json_text;
pub mod log;
pub mod plan;
pub mod registry;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::query_builder::Separated;
use sqlx::{FromRow, Postgres};

pub use codec::{HeaderLayout, ModelCodec, TableCodec, TableDump};
pub use food::{Food, FoodIngredient, FoodTag, PossibleFoodTag};
pub use ingredient::{
    Ingredient, IngredientShoppingUnit, IngredientTag, IngredientUnit, Nutrition,
    PossibleIngredientTag,
};
pub use log::{DailyLogEntry, StoredFood};
pub use plan::Plan;
pub use registry::ModelRegistry;

/// How a CSV cell is interpreted for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    /// NUMERIC, carried as decimal text
    Numeric,
    Float,
    Boolean,
    Text,
    Date,
    Timestamp,
    /// Cell holds JSON-encoded text
    Json,
}

/// A mapped column: name, CSV interpretation and whether it accepts NULL.
///
/// Columns are required unless marked with [`ColumnSpec::nullable()`]. An empty
/// cell is NULL for a nullable column and the empty string for a required
/// text column; any other required column rejects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub nullable: bool,
}

impl ColumnSpec {
    pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            nullable: false,
        }
    }

    pub const fn nullable(self) -> Self {
        Self {
            nullable: true,
            ..self
        }
    }

    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Integer)
    }

    pub const fn numeric(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Numeric)
    }

    pub const fn float(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Float)
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Boolean)
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Text)
    }

    pub const fn date(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Date)
    }

    pub const fn timestamp(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Timestamp)
    }

    pub const fn json(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Json)
    }
}

/// A typed row of one table
///
/// `Deserialize` builds the row from coerced CSV cells, `Serialize` produces
/// its CSV record and `FromRow` reads it back from the database.
pub trait TableModel:
    Serialize + DeserializeOwned + for<'r> FromRow<'r, PgRow> + Send + Sync + Unpin + 'static
{
    const TABLE: &'static str;
    const COLUMNS: &'static [ColumnSpec];

    /// Push one bind per column, in `COLUMNS` order
    fn bind_values(self, row: &mut Separated<'_, '_, Postgres, &'static str>);
}

/// One CSV data row after cell coercion, keyed by column name
#[derive(Debug, Clone, PartialEq)]
pub struct CoercedRow {
    /// Line in the source file, for diagnostics
    pub line: u64,
    pub values: serde_json::Map<String, serde_json::Value>,
}
