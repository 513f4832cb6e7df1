use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::BatchPolicy;

#[derive(Parser, Debug)]
#[command(name = "chichewa-text2sql-db")]
#[command(version, about = "Build the Chichewa text-to-SQL benchmark SQLite database")]
pub struct Cli {
    /// JSON config file with defaults for database, input dir, policy and filters
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drop and recreate all tables and indexes
    Reset {
        /// SQLite database path
        db: Option<PathBuf>,
    },

    /// Reset the schema, then load every table file found in a directory
    Load {
        /// Directory containing <table>.jsonl, <table>.json or <table>.csv files
        input_dir: Option<PathBuf>,

        /// SQLite database path
        db: Option<PathBuf>,

        /// Only include these tables (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        include: Option<Vec<String>>,

        /// Exclude these tables (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        exclude: Option<Vec<String>>,

        /// What to do with a table when one of its records is invalid
        #[arg(short, long, value_enum)]
        policy: Option<BatchPolicy>,

        /// Append to existing tables instead of resetting them first
        #[arg(short, long)]
        append: bool,

        /// Show the full-screen progress interface
        #[arg(long)]
        tui: bool,
    },

    /// Drop, recreate and load a single table from one file
    Reload {
        /// Table name
        table: String,

        /// Source file (.jsonl, .json or .csv)
        file: PathBuf,

        /// SQLite database path
        db: Option<PathBuf>,

        /// What to do when a record is invalid
        #[arg(short, long, value_enum)]
        policy: Option<BatchPolicy>,
    },

    /// Show columns, indexes, row counts and a sample row per table
    Inspect {
        /// SQLite database path
        db: Option<PathBuf>,
    },

    /// List all table names in load order
    ListTables,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
