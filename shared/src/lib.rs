//! Nutrition Sync Shared Library
//!
//! Database-free building blocks of the sync engine: the catalog model
//! (tables, foreign-key edges) and the dependency graph that orders them.

pub mod errors;
pub mod graph;
pub mod schema;

// Re-export commonly used items
pub use errors::*;
pub use graph::{DependencyGraph, IgnoredEdge, LoadOrder};
pub use schema::{ForeignKeyEdge, Table, IDENTITY_COLUMN};
