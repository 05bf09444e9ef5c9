//! Sync services
//!
//! Each stage of a run lives in its own service; [`SyncService`] wires them
//! together for the export, import and rebuild modes.

pub mod bootstrap;
pub mod export;
pub mod import;
pub mod introspect;
pub mod migrations;
pub mod reset;
pub mod sequences;
pub mod summary;
pub mod sync;

pub use bootstrap::{Bootstrapper, PlanSource, SyncPlan};
pub use export::CsvExporter;
pub use import::CsvImporter;
pub use introspect::{SchemaIntrospector, SchemaSnapshot};
pub use migrations::{CommandMigrator, Migrator};
pub use reset::ResetService;
pub use sequences::SequenceReconciler;
pub use summary::{RunSummary, SequenceOutcome, SkipReason};
pub use sync::{SyncOptions, SyncService};
