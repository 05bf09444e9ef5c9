//! Sync engine error handling
//!
//! Every fatal condition of a run maps to one variant here. Messages name the
//! table (and column or row where known) so an operator can find the bad input.

use nutrition_sync_shared::GraphError;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for export, import and rebuild runs
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Catalog query failed: {0}")]
    Catalog(#[source] sqlx::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("No model mapping registered for table '{0}'")]
    UnmappedTable(String),

    #[error("Unknown column {table}.{column} in CSV header")]
    UnknownColumn { table: String, column: String },

    #[error("Column {table}.{column} is mapped but missing from the database")]
    MissingColumn { table: String, column: String },

    #[error("Failed decoding JSON for {table}.{column} (line {line}): {source}")]
    JsonDecode {
        table: String,
        column: String,
        line: u64,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for {table}.{column} (line {line}): {message}")]
    InvalidValue {
        table: String,
        column: String,
        line: u64,
        message: String,
    },

    #[error("Failed to construct {table} row (line {line}): {source}")]
    RowConstruction {
        table: String,
        line: u64,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed importing {table}: {source}")]
    Insert {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("CSV error for {table}: {source}")]
    Csv {
        table: String,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Data directory {} does not exist", .0.display())]
    MissingDataDir(PathBuf),

    #[error("Migration command `{command}` failed: {message}")]
    Migration { command: String, message: String },

    #[error("No tables detected even after migrations. Check DATABASE_URL and migration logs.")]
    NoTables,

    #[error("No tables found to export. Have migrations been applied?")]
    NothingToExport,
}

impl SyncError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(table: &str, source: csv::Error) -> Self {
        SyncError::Csv {
            table: table.to_string(),
            source,
        }
    }
}

/// Result type alias for engine operations
pub type SyncResult<T> = Result<T, SyncError>;
