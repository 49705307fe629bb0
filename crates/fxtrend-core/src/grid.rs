//! Sortable, paginated table view over a [`QueryResult`].

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CalendarDate, CurrencyCode, QueryResult, ValidationError};

/// Page sizes offered by the grid.
pub const PAGE_SIZES: [usize; 4] = [10, 25, 50, 100];

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// A sortable grid column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GridColumn {
    Date,
    Currency(CurrencyCode),
}

impl Display for GridColumn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Date => f.write_str("date"),
            Self::Currency(code) => f.write_str(code.as_str()),
        }
    }
}

impl FromStr for GridColumn {
    type Err = ValidationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("date") {
            return Ok(Self::Date);
        }
        trimmed
            .parse::<CurrencyCode>()
            .map(Self::Currency)
            .map_err(|_| ValidationError::InvalidColumn {
                value: input.to_owned(),
            })
    }
}

impl TryFrom<String> for GridColumn {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GridColumn> for String {
    fn from(value: GridColumn) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: GridColumn,
    pub direction: SortDirection,
}

impl SortSpec {
    pub const fn asc(column: GridColumn) -> Self {
        Self {
            column,
            direction: SortDirection::Asc,
        }
    }

    pub const fn desc(column: GridColumn) -> Self {
        Self {
            column,
            direction: SortDirection::Desc,
        }
    }
}

/// Persisted display state of the grid. `page` is zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGridState")]
pub struct GridState {
    pub sort: Option<SortSpec>,
    pub page: usize,
    page_size: usize,
}

#[derive(Deserialize)]
struct RawGridState {
    #[serde(default)]
    sort: Option<SortSpec>,
    #[serde(default)]
    page: usize,
    page_size: usize,
}

impl TryFrom<RawGridState> for GridState {
    type Error = ValidationError;

    fn try_from(value: RawGridState) -> Result<Self, Self::Error> {
        Self::new(value.sort, value.page, value.page_size)
    }
}

impl Default for GridState {
    /// Newest dates first, first page of ten.
    fn default() -> Self {
        Self {
            sort: Some(SortSpec::desc(GridColumn::Date)),
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl GridState {
    pub fn new(
        sort: Option<SortSpec>,
        page: usize,
        page_size: usize,
    ) -> Result<Self, ValidationError> {
        validate_page_size(page_size)?;
        Ok(Self {
            sort,
            page,
            page_size,
        })
    }

    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Changing the page size returns to the first page.
    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), ValidationError> {
        validate_page_size(page_size)?;
        self.page_size = page_size;
        self.page = 0;
        Ok(())
    }

    /// Header-click cycle: ascending, then descending, then unsorted.
    pub fn toggle_sort(&mut self, column: GridColumn) {
        self.sort = match self.sort {
            Some(spec) if spec.column == column => match spec.direction {
                SortDirection::Asc => Some(SortSpec::desc(column)),
                SortDirection::Desc => None,
            },
            _ => Some(SortSpec::asc(column)),
        };
    }
}

fn validate_page_size(page_size: usize) -> Result<(), ValidationError> {
    if PAGE_SIZES.contains(&page_size) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPageSize { value: page_size })
    }
}

/// One grid row; `cells` line up with [`GridPage::currencies`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridRow {
    pub date: CalendarDate,
    pub cells: Vec<Option<f64>>,
}

impl GridRow {
    fn value(&self, column: GridColumn, currencies: &[CurrencyCode]) -> Option<f64> {
        match column {
            GridColumn::Date => None,
            GridColumn::Currency(code) => currencies
                .iter()
                .position(|existing| *existing == code)
                .and_then(|index| self.cells[index]),
        }
    }
}

/// The visible slice of the grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridPage {
    pub base_currency: CurrencyCode,
    pub currencies: Vec<CurrencyCode>,
    pub rows: Vec<GridRow>,
    pub page: usize,
    pub page_count: usize,
    pub page_size: usize,
    pub total_rows: usize,
}

impl GridPage {
    pub fn columns(&self) -> Vec<GridColumn> {
        std::iter::once(GridColumn::Date)
            .chain(self.currencies.iter().copied().map(GridColumn::Currency))
            .collect()
    }
}

pub struct GridView;

impl GridView {
    /// Sort every row of `result`, then cut out the requested page.
    ///
    /// A page past the end shows the last page. Rows missing a value sort
    /// after rows that have one, in either direction.
    pub fn build(result: &QueryResult, state: &GridState) -> GridPage {
        let currencies: Vec<CurrencyCode> = result.target_currencies.iter().copied().collect();
        let mut rows: Vec<GridRow> = result
            .matrix
            .rows()
            .into_iter()
            .map(|row| GridRow {
                date: row.date,
                cells: currencies
                    .iter()
                    .map(|code| row.rates.get(code).copied())
                    .collect(),
            })
            .collect();

        if let Some(spec) = state.sort {
            rows.sort_by(|left, right| compare_rows(left, right, spec, &currencies));
        }

        let page_size = state.page_size();
        let total_rows = rows.len();
        let page_count = total_rows.div_ceil(page_size).max(1);
        let page = state.page.min(page_count - 1);
        let rows = rows
            .into_iter()
            .skip(page * page_size)
            .take(page_size)
            .collect();

        GridPage {
            base_currency: result.base_currency,
            currencies,
            rows,
            page,
            page_count,
            page_size,
            total_rows,
        }
    }
}

fn compare_rows(
    left: &GridRow,
    right: &GridRow,
    spec: SortSpec,
    currencies: &[CurrencyCode],
) -> Ordering {
    let directed = |ordering: Ordering| match spec.direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    };

    match spec.column {
        GridColumn::Date => directed(left.date.cmp(&right.date)),
        column => match (
            left.value(column, currencies),
            right.value(column, currencies),
        ) {
            (Some(a), Some(b)) => directed(a.total_cmp(&b)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => left.date.cmp(&right.date),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::{DateRange, RateMatrix};

    fn date(input: &str) -> CalendarDate {
        CalendarDate::parse(input).expect("test date")
    }

    fn result_with_days(days: u32) -> QueryResult {
        let mut matrix = RateMatrix::new();
        let start = date("2024-01-01");
        for offset in 0..days {
            let day = start.checked_add_days(i64::from(offset)).expect("in range");
            matrix.insert(day, CurrencyCode::Eur, 0.9 + f64::from(offset) / 1000.0);
        }
        QueryResult {
            base_currency: CurrencyCode::Usd,
            target_currencies: BTreeSet::from([CurrencyCode::Eur]),
            date_range: DateRange::parse("2024-01-01", "2024-12-31").expect("valid range"),
            point_count: matrix.len(),
            matrix,
        }
    }

    #[test]
    fn default_state_shows_newest_first() {
        let page = GridView::build(&result_with_days(3), &GridState::default());
        let dates: Vec<String> = page.rows.iter().map(|row| row.date.to_string()).collect();
        assert_eq!(dates, ["2024-01-03", "2024-01-02", "2024-01-01"]);
        assert_eq!(
            page.columns(),
            [GridColumn::Date, GridColumn::Currency(CurrencyCode::Eur)]
        );
    }

    #[test]
    fn page_past_the_end_is_clamped_to_last_page() {
        let state = GridState::new(None, 9, 10).expect("valid state");
        let page = GridView::build(&result_with_days(25), &state);

        assert_eq!(page.page_count, 3);
        assert_eq!(page.page, 2);
        assert_eq!(page.rows.len(), 5);
        assert_eq!(page.total_rows, 25);
    }

    #[test]
    fn missing_values_sort_last_in_both_directions() {
        let mut matrix = RateMatrix::new();
        matrix.insert(date("2024-01-01"), CurrencyCode::Eur, 0.92);
        matrix.insert(date("2024-01-01"), CurrencyCode::Gbp, 0.79);
        matrix.insert(date("2024-01-02"), CurrencyCode::Eur, 0.91);
        let result = QueryResult {
            base_currency: CurrencyCode::Usd,
            target_currencies: BTreeSet::from([CurrencyCode::Eur, CurrencyCode::Gbp]),
            date_range: DateRange::parse("2024-01-01", "2024-01-02").expect("valid range"),
            point_count: 2,
            matrix,
        };

        for direction in [SortDirection::Asc, SortDirection::Desc] {
            let state = GridState::new(
                Some(SortSpec {
                    column: GridColumn::Currency(CurrencyCode::Gbp),
                    direction,
                }),
                0,
                10,
            )
            .expect("valid state");
            let page = GridView::build(&result, &state);
            assert_eq!(page.rows[0].cells, [Some(0.92), Some(0.79)]);
            assert_eq!(page.rows[1].cells, [Some(0.91), None]);
        }
    }

    #[test]
    fn empty_result_has_one_empty_page() {
        let result = QueryResult::empty(CurrencyCode::Usd, DateRange::default());
        let page = GridView::build(&result, &GridState::default());
        assert_eq!(page.page_count, 1);
        assert!(page.rows.is_empty());
    }

    #[test]
    fn page_size_outside_the_offered_set_is_rejected() {
        let err = GridState::new(None, 0, 20).expect_err("20 is not offered");
        assert_eq!(err, ValidationError::InvalidPageSize { value: 20 });

        let raw = r#"{"sort":null,"page":0,"page_size":7}"#;
        assert!(serde_json::from_str::<GridState>(raw).is_err());
    }

    #[test]
    fn toggle_sort_cycles_through_directions() {
        let mut state = GridState::default();
        let eur = GridColumn::Currency(CurrencyCode::Eur);

        state.toggle_sort(eur);
        assert_eq!(state.sort, Some(SortSpec::asc(eur)));
        state.toggle_sort(eur);
        assert_eq!(state.sort, Some(SortSpec::desc(eur)));
        state.toggle_sort(eur);
        assert_eq!(state.sort, None);
    }

    #[test]
    fn persisted_column_names_are_readable() {
        let sort = SortSpec::desc(GridColumn::Currency(CurrencyCode::Jpy));
        let state = GridState::new(Some(sort), 1, 25).expect("valid state");
        let json = serde_json::to_string(&state).expect("encode");
        assert_eq!(
            json,
            r#"{"sort":{"column":"JPY","direction":"desc"},"page":1,"page_size":25}"#
        );
    }
}
