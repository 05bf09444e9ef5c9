//! Database connection handle
//!
//! A run owns exactly one session: the pool is capped at a single connection
//! so every statement of a run executes sequentially on the same backend.
//! Never hold a transaction while issuing queries through the pool; the second
//! acquire would wait for the connection the transaction already holds.

use crate::config::DatabaseConfig;
use crate::error::SyncResult;
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Connection handle passed by reference into every component
pub struct Database {
    pool: PgPool,
    url: SecretString,
    schema: String,
}

impl Database {
    /// Open the single-connection pool described by `config`
    pub async fn connect(config: &DatabaseConfig) -> SyncResult<Self> {
        let connect_options = PgConnectOptions::from_str(config.url.expose_secret())?
            .application_name("nutrition-sync");

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .test_before_acquire(true)
            .connect_with(connect_options)
            .await?;

        info!(schema = %config.schema, "Database connection established");

        Ok(Self {
            pool,
            url: config.url.clone(),
            schema: config.schema.clone(),
        })
    }

    /// Wrap an existing pool (used by tests)
    pub fn from_pool(pool: PgPool, url: SecretString, schema: impl Into<String>) -> Self {
        Self {
            pool,
            url,
            schema: schema.into(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Connection string, handed to the migration tool
    pub fn url(&self) -> &SecretString {
        &self.url
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// `"schema"."table"`, safe to splice into SQL
    pub fn qualified(&self, table: &str) -> String {
        qualified_name(&self.schema, table)
    }

    /// Check database health
    pub async fn health_check(&self) -> SyncResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| {
                warn!("Database health check failed: {}", e);
                e.into()
            })
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

/// Quote an identifier for PostgreSQL, doubling embedded quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn qualified_name(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}
