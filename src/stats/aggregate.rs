//! Aggregation Engine
//! Derived views over a (filtered) survey table: overall summary, ranked
//! factor means, grouped means and value counts.

use super::calculator::StatsCalculator;
use crate::data::catalog::{Factor, FactorCatalog};
use crate::data::filter::{distinct_values, row_keys};
use crate::data::processor::ProcessorError;
use crate::data::schema::KEPUASAN;
use polars::prelude::*;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Number of factors shown in the best / worst displays.
pub const TOP_N: usize = 5;

#[derive(Error, Debug)]
pub enum AggregationError {
    #[error("Correlation needs at least 2 numeric columns, got {0}")]
    NotEnoughColumns(usize),
    #[error("Column not available: {0}")]
    MissingColumn(String),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error(transparent)]
    Processor(#[from] ProcessorError),
}

/// A metric that is either computed or explicitly unavailable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Value(f64),
    NotAvailable,
}

impl Metric {
    pub fn value(self) -> Option<f64> {
        match self {
            Metric::Value(v) => Some(v),
            Metric::NotAvailable => None,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Value(v) => write!(f, "{:.2}", v),
            Metric::NotAvailable => f.write_str("N/A"),
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Metric::Value(v) => serializer.serialize_f64(*v),
            Metric::NotAvailable => serializer.serialize_str("N/A"),
        }
    }
}

/// Headline numbers of the summary tab.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallSummary {
    pub respondents: usize,
    /// Mean overall satisfaction rounded to 2 decimals.
    pub mean_satisfaction: Metric,
    /// Mean internet quality rounded to 2 decimals, when the column exists.
    pub mean_internet: Metric,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorMean {
    pub factor: Factor,
    pub mean: Option<f64>,
}

/// Factor means sorted best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankedFactors {
    ranked: Vec<FactorMean>,
}

impl RankedFactors {
    pub fn ranked(&self) -> &[FactorMean] {
        &self.ranked
    }

    /// Head of the ranking; the whole ranking when shorter than `n`.
    pub fn best(&self, n: usize) -> &[FactorMean] {
        &self.ranked[..n.min(self.ranked.len())]
    }

    /// Tail of the ranking, still best first.
    pub fn worst(&self, n: usize) -> &[FactorMean] {
        &self.ranked[self.ranked.len().saturating_sub(n)..]
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

/// Means of one group in a grouped-mean view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRow {
    pub key: String,
    pub rows: usize,
    /// One entry per value column, `None` when the group has no values.
    pub means: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedMeans {
    pub by: String,
    pub value_columns: Vec<String>,
    pub groups: Vec<GroupRow>,
}

impl GroupedMeans {
    /// Keys in display order.
    pub fn keys(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.key.as_str()).collect()
    }

    /// Means of one value column across groups, in display order.
    pub fn series(&self, value_column: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.value_columns.iter().position(|c| c == value_column)?;
        Some(self.groups.iter().map(|g| g.means[idx]).collect())
    }

    /// Wide DataFrame: the key column followed by one column per value column.
    pub fn to_frame(&self) -> Result<DataFrame, PolarsError> {
        let mut columns = vec![Column::new(
            self.by.as_str().into(),
            self.groups.iter().map(|g| g.key.clone()).collect::<Vec<_>>(),
        )];
        for (idx, name) in self.value_columns.iter().enumerate() {
            let values: Vec<Option<f64>> = self.groups.iter().map(|g| g.means[idx]).collect();
            columns.push(Column::new(name.as_str().into(), values));
        }
        DataFrame::new(columns)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Descending order with missing means last.
fn descending_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stateless views over a survey DataFrame.
pub struct AggregationEngine;

impl AggregationEngine {
    pub fn overall_summary(df: &DataFrame) -> Result<OverallSummary, AggregationError> {
        let mean_satisfaction = match StatsCalculator::column_mean(df, KEPUASAN)? {
            Some(m) => Metric::Value(StatsCalculator::round2(m)),
            None => Metric::NotAvailable,
        };

        let internet = Factor::KualitasInternet.column();
        let mean_internet = match StatsCalculator::column_mean(df, internet) {
            Ok(Some(m)) => Metric::Value(StatsCalculator::round2(m)),
            Ok(None) | Err(AggregationError::MissingColumn(_)) => Metric::NotAvailable,
            Err(e) => return Err(e),
        };

        Ok(OverallSummary {
            respondents: df.height(),
            mean_satisfaction,
            mean_internet,
        })
    }

    /// Mean of every factor in `catalog`, in candidate order.
    pub fn factor_means(
        df: &DataFrame,
        catalog: &FactorCatalog,
    ) -> Result<Vec<FactorMean>, AggregationError> {
        catalog
            .factors()
            .iter()
            .map(|&factor| {
                Ok(FactorMean {
                    factor,
                    mean: StatsCalculator::column_mean(df, factor.column())?,
                })
            })
            .collect()
    }

    /// Factor means sorted descending. The sort is stable over candidate
    /// order, so equal means keep their catalog order.
    pub fn ranked_factor_means(
        df: &DataFrame,
        catalog: &FactorCatalog,
    ) -> Result<RankedFactors, AggregationError> {
        let mut ranked = Self::factor_means(df, catalog)?;
        ranked.sort_by(|a, b| descending_missing_last(a.mean, b.mean));
        Ok(RankedFactors { ranked })
    }

    /// Mean of each value column per distinct non-null `by` value, sorted
    /// descending by the first value column.
    ///
    /// Sums run in row order. Ties keep the ascending key order.
    pub fn grouped_means(
        df: &DataFrame,
        by: &str,
        value_columns: &[&str],
    ) -> Result<GroupedMeans, AggregationError> {
        let keys = row_keys(df, by).map_err(|_| AggregationError::MissingColumn(by.to_string()))?;
        let values = value_columns
            .iter()
            .map(|name| StatsCalculator::numeric_column(df, name))
            .collect::<Result<Vec<_>, _>>()?;

        let ordered_keys = distinct_values(df, by)?;
        let index: HashMap<&str, usize> = ordered_keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.as_str(), i))
            .collect();

        let width = value_columns.len();
        let mut rows = vec![0usize; ordered_keys.len()];
        let mut sums = vec![vec![0.0f64; width]; ordered_keys.len()];
        let mut counts = vec![vec![0usize; width]; ordered_keys.len()];

        for (row, key) in keys.iter().enumerate() {
            let Some(&g) = key.as_deref().and_then(|k| index.get(k)) else {
                continue;
            };
            rows[g] += 1;
            for (c, column) in values.iter().enumerate() {
                if let Some(v) = column[row] {
                    sums[g][c] += v;
                    counts[g][c] += 1;
                }
            }
        }

        let mut groups: Vec<GroupRow> = ordered_keys
            .into_iter()
            .enumerate()
            .filter(|(g, _)| rows[*g] > 0)
            .map(|(g, key)| GroupRow {
                key,
                rows: rows[g],
                means: (0..width)
                    .map(|c| (counts[g][c] > 0).then(|| sums[g][c] / counts[g][c] as f64))
                    .collect(),
            })
            .collect();

        if width > 0 {
            groups.sort_by(|a, b| descending_missing_last(a.means[0], b.means[0]));
        }

        Ok(GroupedMeans {
            by: by.to_string(),
            value_columns: value_columns.iter().map(|c| c.to_string()).collect(),
            groups,
        })
    }

    /// Occurrences of each distinct non-null value, ordered by the value
    /// itself (numeric order for numeric columns), not by frequency.
    pub fn value_counts(df: &DataFrame, column: &str) -> Result<Vec<ValueCount>, AggregationError> {
        let keys =
            row_keys(df, column).map_err(|_| AggregationError::MissingColumn(column.to_string()))?;

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for key in keys.iter().flatten() {
            *counts.entry(key.as_str()).or_default() += 1;
        }

        Ok(distinct_values(df, column)?
            .into_iter()
            .map(|value| {
                let count = counts.get(value.as_str()).copied().unwrap_or(0);
                ValueCount { value, count }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn scenario() -> DataFrame {
        df! {
            "Fakultas" => &["A", "A", "B"],
            "Kepuasan_Keseluruhan" => &[4.0, 2.0, 5.0],
            "Kualitas_Internet" => &[5.0, 3.0, 5.0],
        }
        .unwrap()
    }

    #[test]
    fn test_overall_summary() {
        let summary = AggregationEngine::overall_summary(&scenario()).unwrap();
        assert_eq!(summary.respondents, 3);
        assert_eq!(summary.mean_satisfaction, Metric::Value(3.67));
        assert_eq!(summary.mean_internet, Metric::Value(4.33));
    }

    #[test]
    fn test_overall_summary_without_internet() {
        let df = df! {
            "Fakultas" => &["A"],
            "Kepuasan_Keseluruhan" => &[4.0],
        }
        .unwrap();
        let summary = AggregationEngine::overall_summary(&df).unwrap();
        assert_eq!(summary.mean_internet, Metric::NotAvailable);
        assert_eq!(summary.mean_internet.to_string(), "N/A");
        assert_eq!(
            serde_json::to_value(summary.mean_internet).unwrap(),
            serde_json::json!("N/A")
        );
    }

    #[test]
    fn test_ranked_ties_keep_candidate_order() {
        let df = df! {
            "Jam_Operasional" => &[3.0, 3.0],
            "Kualitas_Internet" => &[2.0, 4.0],
            "Peningkatan_Citra" => &[5.0, 4.0],
        }
        .unwrap();
        let catalog = FactorCatalog::from_frame(&df);
        let ranked = AggregationEngine::ranked_factor_means(&df, &catalog).unwrap();

        let order: Vec<Factor> = ranked.ranked().iter().map(|f| f.factor).collect();
        assert_eq!(
            order,
            vec![
                Factor::PeningkatanCitra,
                Factor::KualitasInternet,
                Factor::JamOperasional
            ]
        );
        // Fewer than TOP_N factors: head and tail cover everything
        assert_eq!(ranked.best(TOP_N), ranked.ranked());
        assert_eq!(ranked.worst(TOP_N), ranked.ranked());
    }

    #[test]
    fn test_best_and_worst_slices() {
        let df = df! {
            "Kualitas_Internet" => &[1.0],
            "Ketersediaan_Fasilitas" => &[2.0],
            "Jam_Operasional" => &[3.0],
            "Peningkatan_Motivasi" => &[4.0],
            "Lingkungan_Lebih_Baik" => &[5.0],
            "Fasilitas_Difabel" => &[Some(1.5)],
            "Diskusi_Kelompok" => &[None::<f64>],
        }
        .unwrap();
        let catalog = FactorCatalog::from_frame(&df);
        let ranked = AggregationEngine::ranked_factor_means(&df, &catalog).unwrap();

        let best: Vec<Factor> = ranked.best(2).iter().map(|f| f.factor).collect();
        assert_eq!(best, vec![Factor::LingkunganLebihBaik, Factor::PeningkatanMotivasi]);

        // Missing means sort last
        let worst: Vec<Factor> = ranked.worst(2).iter().map(|f| f.factor).collect();
        assert_eq!(worst, vec![Factor::KualitasInternet, Factor::DiskusiKelompok]);
        assert_eq!(ranked.worst(TOP_N).len(), 5);
    }

    #[test]
    fn test_grouped_means() {
        let df = df! {
            "Fakultas" => &[Some("A"), Some("B"), Some("A"), None, Some("C")],
            "Kepuasan_Keseluruhan" => &[Some(2.0), Some(5.0), Some(3.0), Some(1.0), None],
            "Kualitas_Internet" => &[4.0, 1.0, 5.0, 3.0, 2.0],
        }
        .unwrap();

        let grouped = AggregationEngine::grouped_means(
            &df,
            "Fakultas",
            &["Kepuasan_Keseluruhan", "Kualitas_Internet"],
        )
        .unwrap();

        assert_eq!(grouped.keys(), vec!["B", "A", "C"]);
        assert_eq!(grouped.groups[1].rows, 2);
        assert_eq!(grouped.groups[1].means, vec![Some(2.5), Some(4.5)]);
        assert_eq!(grouped.groups[2].means, vec![None, Some(2.0)]);
        assert_eq!(
            grouped.series("Kualitas_Internet").unwrap(),
            vec![Some(1.0), Some(4.5), Some(2.0)]
        );

        let frame = grouped.to_frame().unwrap();
        assert_eq!(frame.shape(), (3, 3));
    }

    #[test]
    fn test_grouped_means_missing_column() {
        let err = AggregationEngine::grouped_means(&scenario(), "Prodi", &["Kepuasan_Keseluruhan"])
            .unwrap_err();
        assert!(matches!(err, AggregationError::MissingColumn(ref c) if c == "Prodi"));
    }

    #[test]
    fn test_value_counts_sorted_by_value() {
        let df = df! {
            "Peningkatan_Motivasi" => &[Some(5i64), Some(3), Some(5), None, Some(10), Some(5)],
        }
        .unwrap();
        let counts = AggregationEngine::value_counts(&df, "Peningkatan_Motivasi").unwrap();
        assert_eq!(
            counts,
            vec![
                ValueCount { value: "3".into(), count: 1 },
                ValueCount { value: "5".into(), count: 3 },
                ValueCount { value: "10".into(), count: 1 },
            ]
        );
    }
}
