use std::sync::Arc;

use fxtrend_core::{
    open_filters, open_grid_state, DashboardConfig, FileStorage, QueryOrchestrator,
    StorageBackend, DEFAULT_POLL_INTERVAL,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::output::render_snapshot;

/// Follow the saved filters until `q`, end of input, or Ctrl-C.
pub async fn run(
    config: &DashboardConfig,
    storage: Arc<FileStorage>,
    format: OutputFormat,
) -> Result<(), CliError> {
    let watcher = storage.spawn_watcher(DEFAULT_POLL_INTERVAL);
    let backend: Arc<dyn StorageBackend> = storage;

    let filters = open_filters(Arc::clone(&backend));
    let grid = open_grid_state(backend);
    let filters_sync = filters.spawn_sync();
    let grid_sync = grid.spawn_sync();

    let orchestrator = QueryOrchestrator::new(config.fetch_client(), config.debounce);
    let mut snapshots = orchestrator.subscribe();
    let mut filter_changes = filters.subscribe();
    let mut grid_changes = grid.subscribe();
    let mut commands = BufReader::new(tokio::io::stdin()).lines();

    info!(storage = %config.storage_dir.display(), "watching saved filters (r = refetch, q = quit)");
    render_snapshot(&orchestrator.snapshot(), &grid.get(), format)?;
    orchestrator.set_filters(filter_changes.borrow_and_update().clone());

    let outcome = loop {
        tokio::select! {
            changed = filter_changes.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let next = filter_changes.borrow_and_update().clone();
                debug!(currencies = next.currencies().len(), "filters changed");
                orchestrator.set_filters(next);
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if let Err(error) = render_snapshot(&snapshot, &grid.get(), format) {
                    break Err(error);
                }
            }
            changed = grid_changes.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let _ = grid_changes.borrow_and_update();
                if let Err(error) = render_snapshot(&orchestrator.snapshot(), &grid.get(), format) {
                    break Err(error);
                }
            }
            line = commands.next_line() => {
                match line {
                    Ok(Some(line)) => match line.trim() {
                        "r" | "refetch" => orchestrator.refetch(),
                        "q" | "quit" => break Ok(()),
                        "" => {}
                        other => eprintln!("unknown command '{other}' (r = refetch, q = quit)"),
                    },
                    Ok(None) => break Ok(()),
                    Err(error) => break Err(CliError::from(error)),
                }
            }
            _ = tokio::signal::ctrl_c() => break Ok(()),
        }
    };

    filters_sync.abort();
    grid_sync.abort();
    watcher.abort();
    outcome
}
