use std::sync::Arc;

use fxtrend_core::{
    open_filters, open_grid_state, CalendarDate, CancelToken, CurrencyCode, DashboardConfig,
    FileStorage, FilterSelection, GridView, StorageBackend,
};
use serde_json::json;
use tracing::debug;

use crate::cli::RatesArgs;
use crate::error::CliError;
use crate::output::grid_table;

use super::{page_index, sort_spec, CommandResult};

pub async fn run(
    args: &RatesArgs,
    config: &DashboardConfig,
    storage: Arc<FileStorage>,
) -> Result<CommandResult, CliError> {
    let backend: Arc<dyn StorageBackend> = storage;
    let filters = resolve_filters(open_filters(Arc::clone(&backend)).get(), args)?;

    let mut grid = open_grid_state(backend).get();
    if let Some(column) = &args.sort {
        grid.sort = Some(sort_spec(column, args.desc)?);
    }
    if let Some(page) = args.page {
        grid.page = page_index(page)?;
    }

    let Some(base) = filters.base().filter(|_| filters.is_comparable()) else {
        return Ok(CommandResult::ok(
            json!({ "filters": filters, "result": null }),
            "no data: select a base and at least one other currency\n",
        )
        .with_warning("use --base and --target, or `fxtrend filters set --currencies`"));
    };

    let client = config.fetch_client();
    debug!(provider = client.provider_name(), %base, "one-shot rate fetch");

    let cancel = CancelToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };
    let outcome = client
        .fetch_pairs(base, filters.targets(), &filters.date_range, &cancel)
        .await;
    interrupt.abort();

    let Some(result) = outcome?.into_result() else {
        return Err(CliError::Command(String::from("interrupted")));
    };

    let page = GridView::build(&result, &grid);
    let table = grid_table(&page);
    Ok(CommandResult::ok(
        json!({ "filters": filters, "result": result, "grid": page }),
        table,
    ))
}

/// Saved filters with the command-line overrides applied.
///
/// `--base` replaces the base and `--target` replaces the comparison list;
/// either one alone keeps the saved value of the other.
fn resolve_filters(
    mut filters: FilterSelection,
    args: &RatesArgs,
) -> Result<FilterSelection, CliError> {
    if args.base.is_some() || !args.targets.is_empty() {
        let base = match &args.base {
            Some(raw) => Some(raw.parse::<CurrencyCode>()?),
            None => filters.base(),
        };
        let targets = if args.targets.is_empty() {
            filters.targets().to_vec()
        } else {
            args.targets
                .iter()
                .map(|raw| raw.parse::<CurrencyCode>())
                .collect::<Result<Vec<_>, _>>()?
        };

        let currencies = base
            .into_iter()
            .chain(targets.into_iter().filter(|target| Some(*target) != base))
            .collect();
        filters.set_currencies(currencies)?;
    }

    if args.start.is_some() || args.end.is_some() {
        let start = args.start.as_deref().map(CalendarDate::parse).transpose()?;
        let end = args.end.as_deref().map(CalendarDate::parse).transpose()?;
        filters.date_range.set(
            start.unwrap_or(filters.date_range.start_date()),
            end.unwrap_or(filters.date_range.end_date()),
        )?;
    }

    Ok(filters)
}
