//! Global Filter Engine
//! Equality filters over categorical columns with empty-result fallback.

use super::schema::{has_column, FAKULTAS, PRODI};
use super::table::SurveyTable;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// Sentinel meaning "no constraint" in selectors and option lists.
///
/// A category value spelled exactly like the sentinel cannot be selected, so
/// `category_options` leaves it out.
pub const ALL_SENTINEL: &str = "all";

/// A single equality constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    #[default]
    All,
    Value(String),
}

impl Selector {
    /// Parse a user-facing option; the sentinel maps to `All`.
    pub fn parse(raw: &str) -> Self {
        if raw == ALL_SENTINEL {
            Selector::All
        } else {
            Selector::Value(raw.to_string())
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selector::All)
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Selector::All => None,
            Selector::Value(v) => Some(v),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::All => f.write_str(ALL_SENTINEL),
            Selector::Value(v) => f.write_str(v),
        }
    }
}

/// Faculty and study-program constraints chosen by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub faculty: Selector,
    pub program: Selector,
}

impl FilterSelection {
    pub fn new(faculty: Selector, program: Selector) -> Self {
        Self { faculty, program }
    }

    /// Active (column, value) constraints.
    fn constraints(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [(FAKULTAS, &self.faculty), (PRODI, &self.program)]
            .into_iter()
            .filter_map(|(column, selector)| selector.value().map(|v| (column, v)))
    }
}

/// Rows of the survey table visible under the current selection.
#[derive(Debug, Clone)]
pub struct FilteredView {
    frame: DataFrame,
    fell_back_to_unfiltered: bool,
}

impl FilteredView {
    /// View over the whole table, no filter applied.
    pub fn unfiltered(table: &SurveyTable) -> Self {
        Self {
            frame: table.frame().clone(),
            fell_back_to_unfiltered: false,
        }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// True when the selection matched no rows and the view reverted to the
    /// full table. Callers should warn the user.
    pub fn fell_back_to_unfiltered(&self) -> bool {
        self.fell_back_to_unfiltered
    }

    pub fn row_count(&self) -> usize {
        self.frame.height()
    }
}

/// Applies a selection to a table.
pub struct FilterEngine;

impl FilterEngine {
    /// Keep rows where every active selector equals the row's value.
    ///
    /// Selectors on absent columns are ignored. Nulls never match a specific
    /// value. If nothing survives, the unfiltered table is returned with the
    /// fallback flag set.
    pub fn apply(
        table: &SurveyTable,
        selection: &FilterSelection,
    ) -> Result<FilteredView, PolarsError> {
        let df = table.frame();

        let predicate = selection
            .constraints()
            .filter(|(column, _)| {
                let present = has_column(df, column);
                if !present {
                    log::debug!("Ignoring filter on absent column '{}'", column);
                }
                present
            })
            .map(|(column, value)| equals_expr(df, column, value))
            .reduce(|acc, expr| acc.and(expr));

        let Some(predicate) = predicate else {
            return Ok(FilteredView::unfiltered(table));
        };

        let filtered = df.clone().lazy().filter(predicate).collect()?;

        if filtered.height() == 0 {
            log::warn!(
                "No rows match faculty={} program={}; showing all {} rows",
                selection.faculty,
                selection.program,
                df.height()
            );
            return Ok(FilteredView {
                frame: df.clone(),
                fell_back_to_unfiltered: true,
            });
        }

        Ok(FilteredView {
            frame: filtered,
            fell_back_to_unfiltered: false,
        })
    }

    /// Selector options for `column`: the sentinel followed by the distinct
    /// non-null values of the unfiltered table, sorted ascending.
    ///
    /// Numeric columns sort by value, everything else lexicographically.
    pub fn category_options(table: &SurveyTable, column: &str) -> Vec<String> {
        let mut options = vec![ALL_SENTINEL.to_string()];
        if let Ok(values) = distinct_values(table.frame(), column) {
            options.extend(values.into_iter().filter(|v| v != ALL_SENTINEL));
        }
        options
    }
}

/// Equality predicate matching the rendering used by `category_options`:
/// numeric columns compare by value, everything else as text.
fn equals_expr(df: &DataFrame, column: &str, value: &str) -> Expr {
    let numeric = df
        .column(column)
        .map(|c| is_numeric_dtype(c.dtype()))
        .unwrap_or(false);

    match value.parse::<f64>() {
        Ok(number) if numeric => col(column).cast(DataType::Float64).eq(lit(number)),
        _ => col(column).cast(DataType::String).eq(lit(value)),
    }
}

/// Distinct non-null values of a column rendered as strings, sorted.
pub(crate) fn distinct_values(df: &DataFrame, column: &str) -> Result<Vec<String>, PolarsError> {
    let Ok(series) = df.column(column) else {
        return Ok(Vec::new());
    };

    if is_numeric_dtype(series.dtype()) {
        let as_f64 = series.cast(&DataType::Float64)?;
        let mut values: Vec<f64> = as_f64
            .f64()?
            .into_iter()
            .flatten()
            .filter(|v| !v.is_nan())
            .collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        values.dedup();
        return Ok(values.into_iter().map(format_number).collect());
    }

    let as_str = series.cast(&DataType::String)?;
    let values: BTreeSet<String> = as_str
        .str()?
        .into_iter()
        .flatten()
        .map(|s| s.to_string())
        .collect();
    Ok(values.into_iter().collect())
}

/// Per-row category key of `column`, rendered exactly like the values
/// returned by `distinct_values`. Missing values stay `None`.
pub(crate) fn row_keys(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>, PolarsError> {
    let series = df.column(column)?;

    if is_numeric_dtype(series.dtype()) {
        let as_f64 = series.cast(&DataType::Float64)?;
        let keys = as_f64
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()).map(format_number))
            .collect();
        return Ok(keys);
    }

    let as_str = series.cast(&DataType::String)?;
    let keys = as_str
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect();
    Ok(keys)
}

/// Whether a dtype holds numbers.
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Render a number the way it reads in the CSV: `4.0` becomes `"4"`.
pub fn format_number(v: f64) -> String {
    format!("{}", v)
}
