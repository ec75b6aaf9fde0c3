//! Statistics Calculator Module
//! Column extraction and descriptive statistics shared by every view.

use super::AggregationError;
use polars::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::cmp::Ordering;

/// Five-number summary plus Tukey whiskers for a boxplot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

/// One equal-width histogram bin; `upper` is exclusive except for the last bin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
    pub mean: f64,
}

/// Ordinary least squares fit `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
}

impl TrendLine {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Handles descriptive statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Column cast to f64, one entry per row. NaN is treated as missing.
    pub fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, AggregationError> {
        let column = df
            .column(name)
            .map_err(|_| AggregationError::MissingColumn(name.to_string()))?;
        let as_f64 = column.cast(&DataType::Float64)?;
        let values = as_f64
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect();
        Ok(values)
    }

    /// Non-missing values of a column in row order.
    pub fn present_values(df: &DataFrame, name: &str) -> Result<Vec<f64>, AggregationError> {
        Ok(Self::numeric_column(df, name)?.into_iter().flatten().collect())
    }

    /// Arithmetic mean as a left-to-right sum over `values` divided by the count.
    pub fn mean(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Mean of a column ignoring missing values.
    pub fn column_mean(df: &DataFrame, name: &str) -> Result<Option<f64>, AggregationError> {
        Ok(Self::mean(&Self::present_values(df, name)?))
    }

    /// Round to 2 decimals, halves to even.
    pub fn round2(value: f64) -> f64 {
        (value * 100.0).round_ties_even() / 100.0
    }

    /// Compute boxplot statistics for an array of values.
    pub fn compute_box_stats(values: &[f64]) -> Option<BoxStats> {
        let n = values.len();
        if n == 0 {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let q1 = Self::percentile(&sorted, 25.0);
        let median = Self::percentile(&sorted, 50.0);
        let q3 = Self::percentile(&sorted, 75.0);
        let iqr = q3 - q1;
        let low_fence = q1 - 1.5 * iqr;
        let high_fence = q3 + 1.5 * iqr;

        let lower_whisker = sorted
            .iter()
            .copied()
            .find(|&v| v >= low_fence)
            .unwrap_or(q1);
        let upper_whisker = sorted
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= high_fence)
            .unwrap_or(q3);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|&v| v < low_fence || v > high_fence)
            .collect();

        Some(BoxStats {
            count: n,
            mean: Self::mean(values)?,
            min: sorted[0],
            q1,
            median,
            q3,
            max: sorted[n - 1],
            lower_whisker,
            upper_whisker,
            outliers,
        })
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Equal-width histogram over the observed range.
    ///
    /// A constant sample gets a single unit-wide bin centred on the value.
    pub fn histogram(values: &[f64], bins: usize) -> Option<Histogram> {
        let mean = Self::mean(values)?;
        let bin_count = bins.max(1);

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if min == max {
            return Some(Histogram {
                bins: vec![HistogramBin {
                    lower: min - 0.5,
                    upper: max + 0.5,
                    count: values.len(),
                }],
                mean,
            });
        }

        let width = (max - min) / bin_count as f64;
        let mut counts = vec![0usize; bin_count];
        for &v in values {
            let idx = (((v - min) / width).floor() as usize).min(bin_count - 1);
            counts[idx] += 1;
        }

        let bins = counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                lower: min + i as f64 * width,
                upper: if i + 1 == bin_count { max } else { min + (i + 1) as f64 * width },
                count,
            })
            .collect();

        Some(Histogram { bins, mean })
    }

    /// OLS trend line through paired samples.
    ///
    /// `None` with fewer than two points or when every x is identical.
    pub fn trend_line(xs: &[f64], ys: &[f64]) -> Option<TrendLine> {
        if xs.len() != ys.len() || xs.len() < 2 {
            return None;
        }

        let var_x = xs.variance();
        if !var_x.is_finite() || var_x == 0.0 {
            return None;
        }

        let slope = xs.covariance(ys) / var_x;
        let intercept = Self::mean(ys)? - slope * Self::mean(xs)?;
        Some(TrendLine { slope, intercept })
    }

    /// Sample Pearson correlation of paired samples; NaN when undefined.
    pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
        if xs.len() != ys.len() || xs.len() < 2 {
            return f64::NAN;
        }

        let denom = xs.std_dev() * ys.std_dev();
        if !denom.is_finite() || denom == 0.0 {
            return f64::NAN;
        }

        (xs.covariance(ys) / denom).clamp(-1.0, 1.0)
    }
}
