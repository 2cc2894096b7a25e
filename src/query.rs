//! Filtered, ordered views over a loaded dataset.
//!
//! Every query starts from the full row set, so filters compose without order
//! effects and loosening a filter brings rows back.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::filter::FilterState;
use crate::row::{Column, Row};

/// Which filters a dataset switch clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetScope {
    /// Clear the subfield filter and the APC range; keep text and category filters.
    #[default]
    FieldAndRangeOnly,
    /// Clear every filter.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub column: Column,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn new(column: Column, direction: SortDirection) -> Self {
        Self { column, direction }
    }

    pub fn ascending(column: Column) -> Self {
        Self::new(column, SortDirection::Ascending)
    }

    pub fn descending(column: Column) -> Self {
        Self::new(column, SortDirection::Descending)
    }

    /// Compare two rows on this order's column. Numeric columns compare by value
    /// and rows without a value sort last in either direction.
    pub fn compare(&self, a: &Row, b: &Row) -> Ordering {
        let ordering = if self.column.is_numeric() {
            match (a.numeric(self.column), b.numeric(self.column)) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                (Some(_), None) => return Ordering::Less,
                (None, Some(_)) => return Ordering::Greater,
                (None, None) => return Ordering::Equal,
            }
        } else {
            a.cell(self.column)
                .to_lowercase()
                .cmp(&b.cell(self.column).to_lowercase())
        };
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Rows of `rows` passing every predicate of `state`, in dataset order unless `sort` is given.
/// The sort is stable, so ties keep dataset order.
pub fn visible_rows<'a>(
    rows: &'a [Row],
    state: &FilterState,
    sort: Option<&SortOrder>,
) -> Vec<&'a Row> {
    let mut visible: Vec<&Row> = rows.iter().filter(|row| state.passes_all(row)).collect();
    if let Some(order) = sort {
        visible.sort_by(|a, b| order.compare(a, b));
    }
    visible
}

/// The filter state to carry over when a different dataset is loaded.
pub fn reset_for_dataset_switch(state: FilterState, scope: ResetScope) -> FilterState {
    match scope {
        ResetScope::FieldAndRangeOnly => state.cleared_field_and_range(),
        ResetScope::All => state.cleared(),
    }
}

/// Sorted distinct non-empty values of a column, used to offer value filter choices.
pub fn distinct_values(rows: &[Row], column: Column) -> Vec<String> {
    rows.iter()
        .map(|row| row.cell(column))
        .filter(|v| !v.is_empty())
        .map(|v| v.into_owned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
