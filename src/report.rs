//! Dashboard Report
//! Snapshot of every view for the session's current selection, serializable
//! to JSON and printable as a text summary.

use crate::config::ChartConfig;
use crate::data::processor::{FACTOR_COL, SCORE_COL};
use crate::data::{FilterSelection, FAKULTAS, KEPUASAN};
use crate::session::Session;
use crate::stats::{
    AggregationError, CorrelationMatrix, DashboardViews, FactorMean, GroupBox, GroupedMeans,
    Histogram, Metric, MotivationView, OverallSummary, SatisfactionLevel, ScatterPairs,
    ValueCount,
};
use polars::prelude::*;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Filter failed: {0}")]
    Filter(#[from] PolarsError),
    #[error(transparent)]
    Aggregation(#[from] AggregationError),
}

/// Correlation heatmap data, or the reason it could not be computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CorrelationOutcome {
    Available { matrix: CorrelationMatrix },
    Unavailable { reason: String },
}

impl CorrelationOutcome {
    pub fn matrix(&self) -> Option<&CorrelationMatrix> {
        match self {
            CorrelationOutcome::Available { matrix } => Some(matrix),
            CorrelationOutcome::Unavailable { .. } => None,
        }
    }
}

/// One bar segment of the per-faculty stacked chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackedEntry {
    pub faculty: String,
    pub factor: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub selection: FilterSelection,
    pub fell_back_to_unfiltered: bool,
    pub summary: OverallSummary,
    pub level: Option<SatisfactionLevel>,
    pub best_factors: Vec<FactorMean>,
    pub worst_factors: Vec<FactorMean>,
    pub motivation: Option<MotivationView>,
    pub faculty_means: GroupedMeans,
    pub faculty_share: Vec<ValueCount>,
    pub stacked: Option<Vec<StackedEntry>>,
    pub radar: Vec<FactorMean>,
    pub scatter: Vec<ScatterPairs>,
    pub histogram: Option<Histogram>,
    pub boxplots: Vec<GroupBox>,
    pub correlation: CorrelationOutcome,
}

impl DashboardReport {
    /// Compute every view over the session's filtered rows.
    pub fn build(session: &Session, charts: &ChartConfig) -> Result<Self, ReportError> {
        let view = session.view()?;
        let df = view.frame();
        let catalog = session.table().catalog();

        let summary = session.overall_summary(&view)?;
        let level = summary.mean_satisfaction.value().map(SatisfactionLevel::classify);

        let ranked = session.ranked_factors(&view)?;

        let stacked = DashboardViews::stacked_contribution(df, catalog)?
            .map(|long| stacked_entries(&long))
            .transpose()?;

        let scatter = catalog
            .factors()
            .iter()
            .map(|&factor| DashboardViews::scatter_pairs(df, factor))
            .collect::<Result<Vec<_>, _>>()?;

        let correlation = match session.correlation(&view) {
            Ok(matrix) => CorrelationOutcome::Available { matrix },
            Err(e) => {
                log::info!("Correlation unavailable: {}", e);
                CorrelationOutcome::Unavailable {
                    reason: e.to_string(),
                }
            }
        };

        Ok(Self {
            selection: session.selection().clone(),
            fell_back_to_unfiltered: view.fell_back_to_unfiltered(),
            summary,
            level,
            best_factors: ranked.best(charts.top_n).to_vec(),
            worst_factors: ranked.worst(charts.top_n).to_vec(),
            motivation: DashboardViews::motivation_distribution(df, catalog)?,
            faculty_means: session.faculty_means(&view)?,
            faculty_share: DashboardViews::faculty_share(df)?,
            stacked,
            radar: DashboardViews::radar_profile(df, catalog)?,
            scatter,
            histogram: DashboardViews::histogram(df, KEPUASAN, charts.histogram_bins)?,
            boxplots: DashboardViews::box_stats_by_group(df, FAKULTAS, KEPUASAN)?,
            correlation,
        })
    }
}

fn stacked_entries(long: &DataFrame) -> Result<Vec<StackedEntry>, PolarsError> {
    let faculties = long.column(FAKULTAS)?.str()?;
    let factors = long.column(FACTOR_COL)?.str()?;
    let scores = long.column(SCORE_COL)?.f64()?;

    Ok(faculties
        .into_iter()
        .zip(factors)
        .zip(scores)
        .filter_map(|((faculty, factor), score)| {
            Some(StackedEntry {
                faculty: faculty?.to_string(),
                factor: factor?.to_string(),
                score: score?,
            })
        })
        .collect())
}

fn write_factor_list(f: &mut fmt::Formatter<'_>, title: &str, factors: &[FactorMean]) -> fmt::Result {
    writeln!(f, "{}:", title)?;
    if factors.is_empty() {
        return writeln!(f, "  (no factor columns)");
    }
    for item in factors {
        let mean = item.mean.map_or(Metric::NotAvailable, Metric::Value);
        writeln!(f, "  {:<26} {}", item.factor.label(), mean)?;
    }
    Ok(())
}

impl fmt::Display for DashboardReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Twin Tower survey (faculty: {}, program: {})",
            self.selection.faculty, self.selection.program
        )?;
        if self.fell_back_to_unfiltered {
            writeln!(f, "WARNING: no rows match the selection; showing all data")?;
        }
        writeln!(f)?;
        writeln!(f, "Respondents:           {}", self.summary.respondents)?;
        write!(f, "Mean satisfaction:     {}", self.summary.mean_satisfaction)?;
        match self.level {
            Some(level) => writeln!(f, " ({:?})", level)?,
            None => writeln!(f)?,
        }
        writeln!(f, "Mean internet quality: {}", self.summary.mean_internet)?;
        writeln!(f)?;

        write_factor_list(f, "Best factors", &self.best_factors)?;
        write_factor_list(f, "Worst factors", &self.worst_factors)?;
        writeln!(f)?;

        writeln!(f, "Satisfaction by faculty:")?;
        let means = self.faculty_means.series(KEPUASAN).unwrap_or_default();
        for (group, mean) in self.faculty_means.groups.iter().zip(means) {
            let mean = mean.map_or(Metric::NotAvailable, Metric::Value);
            writeln!(f, "  {:<26} {} (n={})", group.key, mean, group.rows)?;
        }
        writeln!(f)?;

        match &self.correlation {
            CorrelationOutcome::Available { matrix } => {
                writeln!(f, "Correlation with overall satisfaction:")?;
                for column in matrix.columns().iter().filter(|c| c.as_str() != KEPUASAN) {
                    if let Some(r) = matrix.get(column, KEPUASAN) {
                        writeln!(f, "  {:<26} {:+.2}", column, r)?;
                    }
                }
            }
            CorrelationOutcome::Unavailable { reason } => {
                writeln!(f, "Correlation unavailable: {}", reason)?;
            }
        }
        Ok(())
    }
}
