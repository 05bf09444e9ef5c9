//! Catalog-derived schema types
//!
//! These are rebuilt from the live database on every run and never persisted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Name of the column treated as the auto-increment identity
pub const IDENTITY_COLUMN: &str = "id";

/// A relation discovered in the working schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    /// Column names in ordinal order
    pub columns: Vec<String>,
    pub identity: Option<String>,
    pub json_columns: BTreeSet<String>,
}

impl Table {
    /// Create a table, detecting the identity column from the column list
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        let identity = columns
            .iter()
            .find(|c| c.as_str() == IDENTITY_COLUMN)
            .cloned();

        Self {
            name: name.into(),
            columns,
            identity,
            json_columns: BTreeSet::new(),
        }
    }

    /// Mark columns whose cells carry JSON-encoded text
    pub fn with_json_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.json_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn is_json_column(&self, column: &str) -> bool {
        self.json_columns.contains(column)
    }
}

/// Directed foreign-key dependency: `child` references `parent`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ForeignKeyEdge {
    pub child: String,
    pub parent: String,
}

impl ForeignKeyEdge {
    pub fn new(child: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            child: child.into(),
            parent: parent.into(),
        }
    }

    pub fn is_self_reference(&self) -> bool {
        self.child == self.parent
    }
}
