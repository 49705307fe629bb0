mod filters;
mod grid;
mod rates;
mod watch;

use std::sync::Arc;

use fxtrend_core::{
    DashboardConfig, FileStorage, GridColumn, SortSpec, StorageBackend,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    /// Text shown for `--format table`.
    pub table: String,
    pub warnings: Vec<String>,
}

impl CommandResult {
    pub fn ok(data: Value, table: impl Into<String>) -> Self {
        Self {
            data,
            table: table.into(),
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// Run the selected command. Returns `None` when the command printed its
/// own output as it went.
pub async fn run(cli: &Cli, config: &DashboardConfig) -> Result<Option<CommandResult>, CliError> {
    let storage = Arc::new(FileStorage::new(&config.storage_dir));

    let result = match &cli.command {
        Command::Rates(args) => rates::run(args, config, storage).await?,
        Command::Filters(args) => filters::run(args, storage)?,
        Command::Grid(args) => grid::run(args, storage)?,
        Command::Watch => {
            watch::run(config, storage, cli.format).await?;
            return Ok(None);
        }
    };

    Ok(Some(result))
}

/// Confirm that `expected` is what storage now holds under `key`.
///
/// Stores keep working in memory when a write fails, so commands whose
/// only purpose is saving check the outcome explicitly.
fn ensure_persisted<T>(backend: &dyn StorageBackend, key: &str, expected: &T) -> Result<(), CliError>
where
    T: DeserializeOwned + PartialEq,
{
    let stored = backend
        .read(key)?
        .map(|raw| serde_json::from_str::<T>(&raw))
        .transpose()?;
    match stored {
        Some(value) if value == *expected => Ok(()),
        _ => Err(CliError::NotPersisted {
            key: key.to_owned(),
        }),
    }
}

/// Convert a 1-based page from the command line.
fn page_index(page: usize) -> Result<usize, CliError> {
    page.checked_sub(1)
        .ok_or_else(|| CliError::Command(String::from("pages start at 1")))
}

fn sort_spec(column: &str, desc: bool) -> Result<SortSpec, CliError> {
    let column: GridColumn = column.parse()?;
    Ok(if desc {
        SortSpec::desc(column)
    } else {
        SortSpec::asc(column)
    })
}
