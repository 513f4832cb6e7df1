pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod parser;
pub mod schema;
pub mod ui;
pub mod writer;

pub use cli::{Cli, Commands};
pub use config::{BatchPolicy, LoaderConfig};
pub use error::{FailureReason, LoadError, SchemaError, StorageError, ValidationError};
pub use ui::{LogUi, Phase, SilentUi, Ui, UiApp};
pub use writer::{LoadReport, LoadSummary, SqliteStore};
