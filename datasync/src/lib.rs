//! Nutrition Sync
//!
//! Schema-aware bulk export and import of the nutrition PostgreSQL database.
//!
//! ## Architecture
//!
//! - Repositories: catalog and sequence queries
//! - Models: typed row models and their CSV/database codecs
//! - Services: introspection, reset, import, export, sequence reconciliation
//!   and the run orchestration tying them together
//! - Database: a single-connection PostgreSQL pool via SQLx

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;
