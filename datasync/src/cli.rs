//! Command-line interface

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(
    name = "nutrition-sync",
    version,
    about = "Export, import and rebuild the nutrition database from CSV files"
)]
pub struct Cli {
    /// Do not apply migrations before importing
    #[arg(long, global = true)]
    pub skip_migrations: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Dump every table to `<table>.csv`
    Export {
        #[command(flatten)]
        dataset: ExportDataset,
        /// Write here instead of the dataset directory
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Truncate all tables and load them from CSV
    Import {
        #[command(flatten)]
        dataset: DatasetArgs,
        /// Read from here instead of the dataset directory
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Drop all tables, re-run migrations, then import
    Rebuild {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

/// Which bundled dataset a run targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Production,
    Test,
}

impl Dataset {
    pub fn dir_name(self) -> &'static str {
        match self {
            Dataset::Production => "production_data",
            Dataset::Test => "test_data",
        }
    }

    /// `<base>/production_data` or `<base>/test_data`
    pub fn dir(self, base: &Path) -> PathBuf {
        base.join(self.dir_name())
    }
}

/// Mandatory `--production` / `--test` choice
#[derive(Debug, Clone, Copy, Args)]
#[group(required = true, multiple = false)]
pub struct DatasetArgs {
    /// Use the production dataset
    #[arg(long)]
    pub production: bool,
    /// Use the test dataset
    #[arg(long)]
    pub test: bool,
}

impl DatasetArgs {
    pub fn dataset(self) -> Dataset {
        if self.test {
            Dataset::Test
        } else {
            Dataset::Production
        }
    }
}

/// Optional choice for export; production when omitted
#[derive(Debug, Clone, Copy, Args)]
#[group(required = false, multiple = false)]
pub struct ExportDataset {
    /// Export into the production dataset (default)
    #[arg(long)]
    pub production: bool,
    /// Export into the test dataset
    #[arg(long)]
    pub test: bool,
}

impl ExportDataset {
    pub fn dataset(self) -> Dataset {
        if self.test {
            Dataset::Test
        } else {
            Dataset::Production
        }
    }
}

impl Command {
    /// Directory the run reads from or writes to
    pub fn data_dir(&self, base: &Path) -> PathBuf {
        match self {
            Command::Export {
                dataset,
                output_dir,
            } => output_dir
                .clone()
                .unwrap_or_else(|| dataset.dataset().dir(base)),
            Command::Import { dataset, data_dir } | Command::Rebuild { dataset, data_dir } => {
                data_dir.clone().unwrap_or_else(|| dataset.dataset().dir(base))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Export { .. } => "export",
            Command::Import { .. } => "import",
            Command::Rebuild { .. } => "rebuild",
        }
    }
}
