//! Dashboard views built on top of the aggregation engine: gauge level,
//! motivation distribution, faculty share, stacked contribution, radar
//! profile, scatter pairs, histogram and per-group boxplots.

use super::aggregate::{AggregationEngine, AggregationError, FactorMean, ValueCount, TOP_N};
use super::calculator::{BoxStats, Histogram, StatsCalculator, TrendLine};
use crate::data::catalog::{Factor, FactorCatalog};
use crate::data::filter::row_keys;
use crate::data::processor::DataProcessor;
use crate::data::schema::{FAKULTAS, KEPUASAN};
use polars::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;

/// Default histogram resolution of the satisfaction distribution.
pub const DEFAULT_HISTOGRAM_BINS: usize = 10;

/// Gauge band of a mean on the 0-5 satisfaction scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SatisfactionLevel {
    Low,
    Moderate,
    High,
}

impl SatisfactionLevel {
    pub const SCALE_MAX: f64 = 5.0;
    pub const MODERATE_FROM: f64 = 2.5;
    pub const HIGH_FROM: f64 = 3.5;

    pub fn classify(mean: f64) -> Self {
        if mean >= Self::HIGH_FROM {
            SatisfactionLevel::High
        } else if mean >= Self::MODERATE_FROM {
            SatisfactionLevel::Moderate
        } else {
            SatisfactionLevel::Low
        }
    }
}

/// Bars next to the gauge: motivation scores when surveyed, otherwise the
/// best-ranked factors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum MotivationView {
    ScoreCounts(Vec<ValueCount>),
    TopFactors(Vec<FactorMean>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPairs {
    pub factor: Factor,
    pub points: Vec<(f64, f64)>,
    /// Faculty of each point, aligned with `points`.
    pub faculties: Vec<Option<String>>,
    pub trend: Option<TrendLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupBox {
    pub group: String,
    pub stats: BoxStats,
}

pub struct DashboardViews;

impl DashboardViews {
    /// `None` when neither motivation scores nor any factor is available.
    pub fn motivation_distribution(
        df: &DataFrame,
        catalog: &FactorCatalog,
    ) -> Result<Option<MotivationView>, AggregationError> {
        if catalog.contains(Factor::PeningkatanMotivasi) {
            let counts =
                AggregationEngine::value_counts(df, Factor::PeningkatanMotivasi.column())?;
            return Ok(Some(MotivationView::ScoreCounts(counts)));
        }
        if catalog.is_empty() {
            return Ok(None);
        }
        let ranked = AggregationEngine::ranked_factor_means(df, catalog)?;
        Ok(Some(MotivationView::TopFactors(ranked.best(TOP_N).to_vec())))
    }

    /// Respondents per faculty, largest share first; ties by faculty name.
    pub fn faculty_share(df: &DataFrame) -> Result<Vec<ValueCount>, AggregationError> {
        let mut counts = AggregationEngine::value_counts(df, FAKULTAS)?;
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(counts)
    }

    /// Per-faculty means of the stacked factors, melted to
    /// `(Fakultas, Faktor, Skor)`. `None` when none of them is available.
    pub fn stacked_contribution(
        df: &DataFrame,
        catalog: &FactorCatalog,
    ) -> Result<Option<DataFrame>, AggregationError> {
        let factors = catalog.subset(&Factor::STACKED);
        if factors.is_empty() {
            return Ok(None);
        }

        let columns: Vec<&str> = factors.iter().map(|f| f.column()).collect();
        let grouped = AggregationEngine::grouped_means(df, FAKULTAS, &columns)?;
        let long = DataProcessor::stack_to_long(&grouped.to_frame()?, FAKULTAS, &columns)?;
        Ok(Some(long))
    }

    /// Mean of every available factor in candidate order.
    pub fn radar_profile(
        df: &DataFrame,
        catalog: &FactorCatalog,
    ) -> Result<Vec<FactorMean>, AggregationError> {
        AggregationEngine::factor_means(df, catalog)
    }

    /// Rows where both the factor and overall satisfaction are present,
    /// with the OLS trend line through them.
    pub fn scatter_pairs(df: &DataFrame, factor: Factor) -> Result<ScatterPairs, AggregationError> {
        let xs = StatsCalculator::numeric_column(df, factor.column())?;
        let ys = StatsCalculator::numeric_column(df, KEPUASAN)?;
        let keys = row_keys(df, FAKULTAS)
            .map_err(|_| AggregationError::MissingColumn(FAKULTAS.to_string()))?;

        let (points, faculties): (Vec<(f64, f64)>, Vec<Option<String>>) = xs
            .into_iter()
            .zip(ys)
            .zip(keys)
            .filter_map(|((x, y), key)| Some(((x?, y?), key)))
            .unzip();

        let (px, py): (Vec<f64>, Vec<f64>) = points.iter().copied().unzip();
        let trend = StatsCalculator::trend_line(&px, &py);

        Ok(ScatterPairs {
            factor,
            points,
            faculties,
            trend,
        })
    }

    /// Distribution of a numeric column; `None` when it has no values.
    pub fn histogram(
        df: &DataFrame,
        column: &str,
        bins: usize,
    ) -> Result<Option<Histogram>, AggregationError> {
        let values = StatsCalculator::present_values(df, column)?;
        Ok(StatsCalculator::histogram(&values, bins))
    }

    /// Boxplot statistics of `value` per distinct `by` group, groups in
    /// ascending key order.
    pub fn box_stats_by_group(
        df: &DataFrame,
        by: &str,
        value: &str,
    ) -> Result<Vec<GroupBox>, AggregationError> {
        let keys = row_keys(df, by).map_err(|_| AggregationError::MissingColumn(by.to_string()))?;
        let values = StatsCalculator::numeric_column(df, value)?;

        let mut per_group: Vec<(String, Vec<f64>)> = Vec::new();
        for (key, v) in keys.into_iter().zip(values) {
            let (Some(key), Some(v)) = (key, v) else {
                continue;
            };
            match per_group.iter_mut().find(|(k, _)| *k == key) {
                Some((_, vals)) => vals.push(v),
                None => per_group.push((key, vec![v])),
            }
        }

        per_group.sort_by(|a, b| compare_keys(&a.0, &b.0));

        Ok(per_group
            .into_iter()
            .filter_map(|(group, vals)| {
                StatsCalculator::compute_box_stats(&vals).map(|stats| GroupBox { group, stats })
            })
            .collect())
    }
}

/// Numeric keys compare by value, others lexicographically.
fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn survey() -> DataFrame {
        df! {
            "Fakultas" => &["FT", "FEB", "FT", "FISIP", "FEB", "FT"],
            "Kepuasan_Keseluruhan" => &[Some(4.0), Some(3.0), Some(5.0), Some(2.0), None, Some(4.0)],
            "Kualitas_Internet" => &[Some(4.0), Some(2.0), Some(5.0), Some(1.0), Some(3.0), None],
            "Jam_Operasional" => &[3.0, 3.0, 4.0, 2.0, 5.0, 4.0],
            "Peningkatan_Motivasi" => &[5i64, 4, 5, 3, 4, 5],
        }
        .unwrap()
    }

    #[test]
    fn test_satisfaction_level_bands() {
        assert_eq!(SatisfactionLevel::classify(2.49), SatisfactionLevel::Low);
        assert_eq!(SatisfactionLevel::classify(2.5), SatisfactionLevel::Moderate);
        assert_eq!(SatisfactionLevel::classify(3.49), SatisfactionLevel::Moderate);
        assert_eq!(SatisfactionLevel::classify(3.5), SatisfactionLevel::High);
    }

    #[test]
    fn test_motivation_prefers_score_counts() {
        let df = survey();
        let catalog = FactorCatalog::from_frame(&df);
        match DashboardViews::motivation_distribution(&df, &catalog).unwrap() {
            Some(MotivationView::ScoreCounts(counts)) => {
                let values: Vec<&str> = counts.iter().map(|c| c.value.as_str()).collect();
                assert_eq!(values, vec!["3", "4", "5"]);
                assert_eq!(counts[2].count, 3);
            }
            other => panic!("unexpected view: {:?}", other),
        }
    }

    #[test]
    fn test_motivation_falls_back_to_top_factors() {
        let df = survey().drop("Peningkatan_Motivasi").unwrap();
        let catalog = FactorCatalog::from_frame(&df);
        match DashboardViews::motivation_distribution(&df, &catalog).unwrap() {
            Some(MotivationView::TopFactors(top)) => {
                assert_eq!(top[0].factor, Factor::JamOperasional);
                assert_eq!(top.len(), 2);
            }
            other => panic!("unexpected view: {:?}", other),
        }

        let bare = df! { "Fakultas" => &["FT"], "Kepuasan_Keseluruhan" => &[4.0] }.unwrap();
        let catalog = FactorCatalog::from_frame(&bare);
        assert!(DashboardViews::motivation_distribution(&bare, &catalog)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_faculty_share_by_count() {
        let share = DashboardViews::faculty_share(&survey()).unwrap();
        let order: Vec<(&str, usize)> = share.iter().map(|c| (c.value.as_str(), c.count)).collect();
        assert_eq!(order, vec![("FT", 3), ("FEB", 2), ("FISIP", 1)]);
    }

    #[test]
    fn test_stacked_contribution_long_format() {
        let df = survey();
        let catalog = FactorCatalog::from_frame(&df);
        let long = DashboardViews::stacked_contribution(&df, &catalog)
            .unwrap()
            .unwrap();
        // 3 faculties x 3 available stacked factors
        assert_eq!(long.shape(), (9, 3));
        let names: Vec<String> = long
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["Fakultas", "Faktor", "Skor"]);
    }

    #[test]
    fn test_scatter_pairs_drop_incomplete_rows() {
        let scatter =
            DashboardViews::scatter_pairs(&survey(), Factor::KualitasInternet).unwrap();
        assert_eq!(
            scatter.points,
            vec![(4.0, 4.0), (2.0, 3.0), (5.0, 5.0), (1.0, 2.0)]
        );
        let faculties: Vec<Option<&str>> =
            scatter.faculties.iter().map(|f| f.as_deref()).collect();
        assert_eq!(faculties, vec![Some("FT"), Some("FEB"), Some("FT"), Some("FISIP")]);
        let trend = scatter.trend.unwrap();
        assert!(trend.slope > 0.0);
    }

    #[test]
    fn test_box_stats_by_group() {
        let boxes =
            DashboardViews::box_stats_by_group(&survey(), FAKULTAS, KEPUASAN).unwrap();
        let groups: Vec<&str> = boxes.iter().map(|b| b.group.as_str()).collect();
        assert_eq!(groups, vec!["FEB", "FISIP", "FT"]);
        assert_eq!(boxes[2].stats.count, 3);
        assert_eq!(boxes[2].stats.median, 4.0);
    }

    #[test]
    fn test_histogram_of_satisfaction() {
        let hist = DashboardViews::histogram(&survey(), KEPUASAN, DEFAULT_HISTOGRAM_BINS)
            .unwrap()
            .unwrap();
        let total: usize = hist.bins.iter().map(|b| b.count).sum();
        assert_eq!(total, 5);
        assert_eq!(hist.mean, 3.6);
    }
}
