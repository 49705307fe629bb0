use std::sync::Arc;

use fxtrend_core::{open_grid_state, FileStorage, GridState, StorageBackend, GRID_STATE_KEY};
use serde_json::json;

use crate::cli::{GridArgs, GridCommand, GridSetArgs};
use crate::error::CliError;
use crate::output::grid_state_table;

use super::{ensure_persisted, page_index, sort_spec, CommandResult};

pub fn run(args: &GridArgs, storage: Arc<FileStorage>) -> Result<CommandResult, CliError> {
    let backend: Arc<dyn StorageBackend> = storage;
    let store = open_grid_state(Arc::clone(&backend));

    match &args.command {
        GridCommand::Show => {}
        GridCommand::Set(set_args) => {
            let next = apply(store.get(), set_args)?;
            store.set(next);
            ensure_persisted(backend.as_ref(), GRID_STATE_KEY, &next)?;
        }
        GridCommand::Reset => store.reset(),
    }

    let state = store.get();
    Ok(CommandResult::ok(
        json!({ "grid": state }),
        grid_state_table(&state),
    ))
}

fn apply(mut state: GridState, args: &GridSetArgs) -> Result<GridState, CliError> {
    if let Some(column) = &args.sort {
        state.sort = if column.trim().eq_ignore_ascii_case("none") {
            None
        } else {
            Some(sort_spec(column, args.desc)?)
        };
    }
    if let Some(page_size) = args.page_size {
        state.set_page_size(page_size)?;
    }
    if let Some(page) = args.page {
        state.page = page_index(page)?;
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use fxtrend_core::{CurrencyCode, GridColumn, SortSpec};

    use super::*;

    fn set_args() -> GridSetArgs {
        GridSetArgs {
            sort: None,
            desc: false,
            page_size: None,
            page: None,
        }
    }

    #[test]
    fn sort_by_currency_descending() {
        let args = GridSetArgs {
            sort: Some(String::from("eur")),
            desc: true,
            ..set_args()
        };
        let state = apply(GridState::default(), &args).expect("valid edit");
        assert_eq!(
            state.sort,
            Some(SortSpec::desc(GridColumn::Currency(CurrencyCode::Eur)))
        );
    }

    #[test]
    fn page_size_change_then_page_lands_on_requested_page() {
        let args = GridSetArgs {
            page_size: Some(25),
            page: Some(3),
            ..set_args()
        };
        let state = apply(GridState::default(), &args).expect("valid edit");
        assert_eq!(state.page_size(), 25);
        assert_eq!(state.page, 2);
    }

    #[test]
    fn page_zero_and_odd_page_sizes_are_rejected() {
        let zero = GridSetArgs {
            page: Some(0),
            ..set_args()
        };
        assert!(apply(GridState::default(), &zero).is_err());

        let odd = GridSetArgs {
            page_size: Some(15),
            ..set_args()
        };
        assert_eq!(
            apply(GridState::default(), &odd)
                .expect_err("15 is not offered")
                .exit_code(),
            2
        );
    }

    #[test]
    fn sort_none_clears_sorting() {
        let args = GridSetArgs {
            sort: Some(String::from("none")),
            ..set_args()
        };
        let state = apply(GridState::default(), &args).expect("valid edit");
        assert_eq!(state.sort, None);
    }
}
