//! External schema migration tool
//!
//! The engine never authors migrations; it shells out to the project's
//! migration command and waits for it to finish.

use crate::config::MigrationConfig;
use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, info};

/// Placeholder in migration arguments replaced by the connection string
pub const DBURL_PLACEHOLDER: &str = "{dburl}";

/// Brings the target schema up to date. Expected to be idempotent.
#[async_trait]
pub trait Migrator: Send + Sync {
    async fn migrate(&self, url: &SecretString) -> SyncResult<()>;
}

/// Runs a configured command, e.g. `alembic -x dburl={dburl} upgrade head`
#[derive(Debug, Clone)]
pub struct CommandMigrator {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl CommandMigrator {
    pub fn new(program: impl Into<String>, args: Vec<String>, working_dir: Option<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir,
        }
    }

    pub fn from_config(config: &MigrationConfig) -> Self {
        Self::new(
            config.program.clone(),
            config.args.clone(),
            config.working_dir.clone(),
        )
    }

    fn render_args(&self, url: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace(DBURL_PLACEHOLDER, url))
            .collect()
    }

    /// Command line with the connection string masked
    pub fn display(&self) -> String {
        std::iter::once(self.program.clone())
            .chain(self.render_args("***"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn failure(&self, message: String) -> SyncError {
        SyncError::Migration {
            command: self.display(),
            message,
        }
    }
}

#[async_trait]
impl Migrator for CommandMigrator {
    async fn migrate(&self, url: &SecretString) -> SyncResult<()> {
        let url = url.expose_secret();
        info!(command = %self.display(), "Applying migrations");

        let mut command = Command::new(&self.program);
        command.args(self.render_args(url)).kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let output = command
            .output()
            .await
            .map_err(|e| self.failure(e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!(output = %stdout.trim().replace(url, "***"), "Migration output");
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).replace(url, "***");
            return Err(self.failure(format!("{}: {}", output.status, stderr.trim())));
        }

        info!("Migrations applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alembic() -> CommandMigrator {
        CommandMigrator::new(
            "alembic",
            vec![
                "-x".to_string(),
                "dburl={dburl}".to_string(),
                "upgrade".to_string(),
                "head".to_string(),
            ],
            None,
        )
    }

    #[test]
    fn test_url_substituted_into_args() {
        let args = alembic().render_args("postgresql://u:p@h/db");
        assert_eq!(args[1], "dburl=postgresql://u:p@h/db");
    }

    #[test]
    fn test_display_masks_url() {
        assert_eq!(alembic().display(), "alembic -x dburl=*** upgrade head");
    }

    #[tokio::test]
    async fn test_missing_program_reports_command() {
        let migrator = CommandMigrator::new("nutrition-sync-no-such-tool", vec![], None);
        let err = migrator
            .migrate(&SecretString::new("postgresql://x".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Migration { .. }));
        assert!(err.to_string().contains("nutrition-sync-no-such-tool"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_hides_url() {
        let migrator = CommandMigrator::new(
            "sh",
            vec!["-c".to_string(), "echo bad {dburl} >&2; exit 3".to_string()],
            None,
        );
        let err = migrator
            .migrate(&SecretString::new("postgresql://secret@db".to_string()))
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("bad ***"));
        assert!(!message.contains("secret@db"));
    }
}
