use std::sync::Arc;

use fxtrend_core::{
    open_filters, CalendarDate, CurrencyCode, FileStorage, FilterSelection, StorageBackend,
    FILTERS_KEY,
};
use serde_json::json;

use crate::cli::{FiltersArgs, FiltersCommand, FiltersSetArgs};
use crate::error::CliError;
use crate::output::filters_table;

use super::{ensure_persisted, CommandResult};

pub fn run(args: &FiltersArgs, storage: Arc<FileStorage>) -> Result<CommandResult, CliError> {
    let backend: Arc<dyn StorageBackend> = storage;
    let store = open_filters(Arc::clone(&backend));

    match &args.command {
        FiltersCommand::Show => {}
        FiltersCommand::Set(set_args) => {
            let next = apply(store.get(), set_args)?;
            store.set(next.clone());
            ensure_persisted(backend.as_ref(), FILTERS_KEY, &next)?;
        }
        FiltersCommand::Reset => {
            store.reset();
            if backend.read(FILTERS_KEY)?.is_some() {
                return Err(CliError::NotPersisted {
                    key: FILTERS_KEY.to_owned(),
                });
            }
        }
    }

    Ok(render(&store.get()))
}

/// Apply the given edits; untouched fields keep their saved value.
fn apply(mut filters: FilterSelection, args: &FiltersSetArgs) -> Result<FilterSelection, CliError> {
    if let Some(raw) = &args.currencies {
        filters.set_currencies(CurrencyCode::parse_list(raw)?)?;
    }
    for raw in &args.remove {
        let code: CurrencyCode = raw.parse()?;
        if !filters.remove_currency(code) {
            return Err(CliError::Command(format!("{code} is not selected")));
        }
    }
    for raw in &args.add {
        filters.add_currency(raw.parse::<CurrencyCode>()?)?;
    }

    let start = args.start.as_deref().map(CalendarDate::parse).transpose()?;
    let end = args.end.as_deref().map(CalendarDate::parse).transpose()?;
    filters.date_range.set(
        start.unwrap_or(filters.date_range.start_date()),
        end.unwrap_or(filters.date_range.end_date()),
    )?;

    Ok(filters)
}

fn render(filters: &FilterSelection) -> CommandResult {
    let data = json!({
        "filters": filters,
        "comparable": filters.is_comparable(),
    });
    let result = CommandResult::ok(data, filters_table(filters));
    if filters.is_comparable() {
        result
    } else {
        result.with_warning("select a base and at least one other currency to see rates")
    }
}
