//! Database repositories
//!
//! Catalog and sequence queries. Row data itself moves through the table
//! codecs in `models`.

pub mod catalog;
pub mod sequence;

pub use catalog::{CatalogRepository, ColumnRecord, ForeignKeyRecord};
pub use sequence::SequenceRepository;
