//! Loader configuration.
//!
//! Settings come from an optional JSON file and are overridden by CLI flags:
//!
//! ```json
//! {
//!   "database": "data/database/chichewa_text2sql.db",
//!   "input_dir": "data/raw",
//!   "policy": "skip",
//!   "exclude": ["mse_daily"]
//! }
//! ```

use anyhow::{Context, Result};
use clap::ValueEnum;
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the benchmark database
pub const DEFAULT_DB_NAME: &str = "chichewa_text2sql.db";

/// What to do with a batch when one of its records fails validation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BatchPolicy {
    /// Roll back the whole table load on the first invalid record
    #[default]
    Abort,
    /// Insert the valid records and report every invalid one
    Skip,
}

impl std::fmt::Display for BatchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchPolicy::Abort => write!(f, "abort"),
            BatchPolicy::Skip => write!(f, "skip"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    pub database: Option<PathBuf>,
    pub input_dir: Option<PathBuf>,
    pub policy: Option<BatchPolicy>,
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
}

impl LoaderConfig {
    /// Load a config file, or the empty config when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {:?}", path))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Failed to parse config file: {:?}", path))
            }
            None => Ok(Self::default()),
        }
    }

    /// Database path: CLI argument, then config, then the platform data dir
    pub fn resolve_database(&self, cli: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(path) = cli.or_else(|| self.database.clone()) {
            return Ok(path);
        }

        let proj_dirs = ProjectDirs::from("", "", "chichewa-text2sql-db")
            .context("Could not determine data directory")?;
        let data_dir = proj_dirs.data_dir();
        fs::create_dir_all(data_dir).context("Failed to create data directory")?;

        Ok(data_dir.join(DEFAULT_DB_NAME))
    }

    pub fn resolve_input_dir(&self, cli: Option<PathBuf>) -> Result<PathBuf> {
        cli.or_else(|| self.input_dir.clone())
            .context("No input directory given on the command line or in the config file")
    }

    pub fn resolve_policy(&self, cli: Option<BatchPolicy>) -> BatchPolicy {
        cli.or(self.policy).unwrap_or_default()
    }

    /// CLI filters replace config filters as a pair
    pub fn resolve_filters(
        &self,
        include: Option<Vec<String>>,
        exclude: Option<Vec<String>>,
    ) -> (Option<Vec<String>>, Option<Vec<String>>) {
        if include.is_some() || exclude.is_some() {
            (include, exclude)
        } else {
            (self.include.clone(), self.exclude.clone())
        }
    }
}
