//! Error types for schema graph operations

use thiserror::Error;

/// Errors raised while ordering tables
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Dependency cycle detected; could not order tables: {}", .unresolved.join(", "))]
    Cycle { unresolved: Vec<String> },
}
