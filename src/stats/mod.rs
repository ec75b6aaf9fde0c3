//! Statistics module - aggregation engine and derived dashboard views

pub mod aggregate;
pub mod calculator;
pub mod correlation;
pub mod views;

pub use aggregate::{
    AggregationEngine, AggregationError, FactorMean, GroupRow, GroupedMeans, Metric,
    OverallSummary, RankedFactors, ValueCount, TOP_N,
};
pub use calculator::{BoxStats, Histogram, HistogramBin, StatsCalculator, TrendLine};
pub use correlation::{correlation_columns, correlation_matrix, CorrelationMatrix};
pub use views::{
    DashboardViews, GroupBox, MotivationView, SatisfactionLevel, ScatterPairs,
    DEFAULT_HISTOGRAM_BINS,
};
