//! CLI argument definitions for fxtrend.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rates` | Fetch rates for the saved (or given) filters and print the grid |
//! | `filters` | Show, change or reset the saved filter selection |
//! | `grid` | Show, change or reset the saved sort and page |
//! | `watch` | Follow the saved filters and print every query state |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--timeout-ms` | `10000` | Request timeout in ms |
//! | `--debounce-ms` | `500` | Quiet period before `watch` fetches |
//! | `--storage-dir` | data dir | Where filters and grid state are saved |
//! | `--backend-url` | unset | Batch proxy instead of Frankfurter |
//! | `--mock` | `false` | Synthetic rates, no network |
//!
//! # Examples
//!
//! ```bash
//! # Compare USD against EUR and JPY for the saved range
//! fxtrend filters set --currencies USD,EUR,JPY
//! fxtrend rates --format table
//!
//! # Swap JPY for CHF, keeping USD and EUR
//! fxtrend filters set --remove JPY --add CHF
//!
//! # One-off lookup without touching the saved filters
//! fxtrend rates --base GBP --target CHF --start 2024-01-01 --end 2024-03-31
//!
//! # Follow filter changes made from another terminal
//! fxtrend watch --format table
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use fxtrend_core::DashboardConfig;

/// fxtrend - historical exchange-rate dashboard in the terminal
///
/// Pick a base currency and up to two comparison currencies, choose a date
/// range of at most two years, and view the rates as a sortable table.
#[derive(Debug, Parser)]
#[command(
    name = "fxtrend",
    author,
    version,
    about = "Historical exchange-rate dashboard",
    long_about = "fxtrend compares a base currency against up to two other currencies \
over a date range of at most two years.\n\
\n\
  • Rates from the Frankfurter API, directly or through fxtrend-server\n\
  • Filters and grid state saved between runs\n\
  • Live mode that follows filter changes made elsewhere\n\
\n\
Use 'fxtrend <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    ///
    /// - json: JSON document (default)
    /// - table: aligned text for terminals
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Request timeout in milliseconds (overrides FXTREND_REQUEST_TIMEOUT_MS).
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Debounce delay in milliseconds (overrides FXTREND_DEBOUNCE_MS).
    #[arg(long, global = true)]
    pub debounce_ms: Option<u64>,

    /// Directory holding saved state (overrides FXTREND_STORAGE_DIR).
    #[arg(long, global = true)]
    pub storage_dir: Option<PathBuf>,

    /// Batch proxy base URL, e.g. http://localhost:5000 (overrides FXTREND_BACKEND_URL).
    #[arg(long, global = true)]
    pub backend_url: Option<String>,

    /// Serve deterministic synthetic rates without network access.
    #[arg(long, global = true, default_value_t = false)]
    pub mock: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Apply command-line overrides on top of environment settings.
    pub fn apply_to(&self, config: &mut DashboardConfig) {
        if let Some(timeout_ms) = self.timeout_ms {
            config.request_timeout = Duration::from_millis(timeout_ms);
        }
        if let Some(debounce_ms) = self.debounce_ms {
            config.debounce = Duration::from_millis(debounce_ms);
        }
        if let Some(storage_dir) = &self.storage_dir {
            config.storage_dir = storage_dir.clone();
        }
        if let Some(backend_url) = &self.backend_url {
            config.backend_url = Some(backend_url.clone());
        }
        if self.mock {
            config.mock = true;
        }
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned text for terminal display.
    Table,
    /// JSON output.
    Json,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch rates and print one grid page.
    ///
    /// Fields not given on the command line come from the saved filters and
    /// grid state; nothing given here is saved.
    ///
    /// # Examples
    ///
    ///   fxtrend rates
    ///   fxtrend rates --base USD --target EUR --target CAD
    ///   fxtrend rates --sort EUR --desc --page 2 --format table
    Rates(RatesArgs),

    /// Saved filter selection.
    Filters(FiltersArgs),

    /// Saved grid sort and pagination.
    Grid(GridArgs),

    /// Follow the saved filters and print every query state.
    ///
    /// Reads commands from stdin: `r` refetches, `q` quits.
    Watch,
}

/// Arguments for the `rates` command.
#[derive(Debug, Args)]
pub struct RatesArgs {
    /// Base currency (e.g., USD).
    #[arg(long)]
    pub base: Option<String>,

    /// Comparison currency; repeat for a second one.
    #[arg(long = "target", num_args = 1)]
    pub targets: Vec<String>,

    /// First day of the range (YYYY-MM-DD).
    #[arg(long)]
    pub start: Option<String>,

    /// Last day of the range (YYYY-MM-DD).
    #[arg(long)]
    pub end: Option<String>,

    /// Page to show, starting at 1.
    #[arg(long)]
    pub page: Option<usize>,

    /// Column to sort by: `date` or a currency code.
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort descending instead of ascending.
    #[arg(long, default_value_t = false, requires = "sort")]
    pub desc: bool,
}

/// Arguments for the `filters` command group.
#[derive(Debug, Args)]
pub struct FiltersArgs {
    #[command(subcommand)]
    pub command: FiltersCommand,
}

#[derive(Debug, Subcommand)]
pub enum FiltersCommand {
    /// Print the saved selection.
    Show,
    /// Change the saved selection.
    Set(FiltersSetArgs),
    /// Restore the default selection.
    Reset,
}

/// Arguments for `filters set`.
#[derive(Debug, Args)]
pub struct FiltersSetArgs {
    /// Comma-separated codes, base first (e.g., USD,EUR,JPY). Empty clears.
    #[arg(long)]
    pub currencies: Option<String>,

    /// Append a currency to the selection; repeatable.
    #[arg(long = "add", num_args = 1)]
    pub add: Vec<String>,

    /// Drop a currency from the selection; repeatable. Removing the base
    /// makes the next currency the base.
    #[arg(long = "remove", num_args = 1)]
    pub remove: Vec<String>,

    /// First day of the range (YYYY-MM-DD).
    #[arg(long)]
    pub start: Option<String>,

    /// Last day of the range (YYYY-MM-DD).
    #[arg(long)]
    pub end: Option<String>,
}

/// Arguments for the `grid` command group.
#[derive(Debug, Args)]
pub struct GridArgs {
    #[command(subcommand)]
    pub command: GridCommand,
}

#[derive(Debug, Subcommand)]
pub enum GridCommand {
    /// Print the saved grid state.
    Show,
    /// Change the saved grid state.
    Set(GridSetArgs),
    /// Restore the default grid state.
    Reset,
}

/// Arguments for `grid set`.
#[derive(Debug, Args)]
pub struct GridSetArgs {
    /// Column to sort by: `date`, a currency code, or `none`.
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort descending instead of ascending.
    #[arg(long, default_value_t = false, requires = "sort")]
    pub desc: bool,

    /// Rows per page: 10, 25, 50 or 100.
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Page to show, starting at 1.
    #[arg(long)]
    pub page: Option<usize>,
}
