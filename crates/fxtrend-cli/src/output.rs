use std::fmt::Write as _;

use fxtrend_core::{
    FilterSelection, GridPage, GridState, GridView, QueryPhase, QuerySnapshot, SortDirection,
};
use serde_json::json;

use crate::cli::OutputFormat;
use crate::commands::CommandResult;
use crate::error::CliError;

pub fn render(result: &CommandResult, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(&result.data)?
            } else {
                serde_json::to_string(&result.data)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => {
            print!("{}", result.table);
            if !result.warnings.is_empty() {
                println!("warnings:");
                for warning in &result.warnings {
                    println!("  - {warning}");
                }
            }
        }
    }

    Ok(())
}

/// Print one published query state. JSON output is one line per state.
pub fn render_snapshot(
    snapshot: &QuerySnapshot,
    grid: &GridState,
    format: OutputFormat,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = json!({
                "phase": snapshot.phase,
                "loading": snapshot.loading(),
                "error": snapshot.error,
                "data": snapshot.data.as_deref(),
            });
            println!("{}", serde_json::to_string(&payload)?);
        }
        OutputFormat::Table => print!("{}", snapshot_table(snapshot, grid)),
    }
    Ok(())
}

pub fn snapshot_table(snapshot: &QuerySnapshot, grid: &GridState) -> String {
    if snapshot.loading() {
        return String::from("loading...\n");
    }
    if let Some(error) = &snapshot.error {
        return format!("error: {error}\n(press r to retry)\n");
    }
    match (&snapshot.data, snapshot.phase) {
        (Some(data), _) => grid_table(&GridView::build(data, grid)),
        (None, QueryPhase::Idle) => String::from("no data: select a base and at least one other currency\n"),
        (None, _) => String::from("no data yet: waiting for the selection to settle...\n"),
    }
}

pub fn grid_table(page: &GridPage) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "base {}  page {}/{}  ({} rows)",
        page.base_currency,
        page.page + 1,
        page.page_count,
        page.total_rows
    );

    if page.rows.is_empty() {
        out.push_str("no rates for this range\n");
        return out;
    }

    let _ = write!(out, "{:<12}", "date");
    for currency in &page.currencies {
        let _ = write!(out, "{:>12}", currency.as_str());
    }
    out.push('\n');

    for row in &page.rows {
        let _ = write!(out, "{:<12}", row.date.to_string());
        for cell in &row.cells {
            match cell {
                Some(rate) => {
                    let _ = write!(out, "{rate:>12.4}");
                }
                None => {
                    let _ = write!(out, "{:>12}", "-");
                }
            }
        }
        out.push('\n');
    }
    out
}

pub fn filters_table(filters: &FilterSelection) -> String {
    let codes = |codes: &[fxtrend_core::CurrencyCode]| {
        codes
            .iter()
            .map(|code| code.as_str())
            .collect::<Vec<_>>()
            .join(",")
    };
    let base = filters
        .base()
        .map(|code| code.as_str().to_string())
        .unwrap_or_else(|| String::from("-"));

    format!(
        "base      : {base}\ntargets   : {}\nrange     : {} .. {} ({} .. {})\n",
        codes(filters.targets()),
        filters.date_range.start_date(),
        filters.date_range.end_date(),
        filters.date_range.start_date().display(),
        filters.date_range.end_date().display(),
    )
}

pub fn grid_state_table(state: &GridState) -> String {
    let sort = match state.sort {
        Some(spec) => {
            let direction = match spec.direction {
                SortDirection::Asc => "asc",
                SortDirection::Desc => "desc",
            };
            format!("{} {direction}", spec.column)
        }
        None => String::from("none"),
    };
    format!(
        "sort      : {sort}\npage      : {}\npage_size : {}\n",
        state.page + 1,
        state.page_size()
    )
}
