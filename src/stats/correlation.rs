//! Pairwise Pearson correlation between numeric survey columns.

use super::aggregate::AggregationError;
use super::calculator::StatsCalculator;
use crate::data::catalog::FactorCatalog;
use crate::data::schema::{has_column, KEPUASAN};
use polars::prelude::DataFrame;
use serde::Serialize;

/// Symmetric correlation matrix indexed by column name in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    columns: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Row-major coefficients; `values()[i][j]` pairs `columns()[i]` with `columns()[j]`.
    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    pub fn size(&self) -> usize {
        self.columns.len()
    }

    pub fn get(&self, row: &str, col: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == row)?;
        let j = self.columns.iter().position(|c| c == col)?;
        Some(self.values[i][j])
    }
}

/// Columns feeding the heatmap: available factors, then overall satisfaction.
pub fn correlation_columns(df: &DataFrame, catalog: &FactorCatalog) -> Vec<String> {
    let mut columns: Vec<String> = catalog
        .column_names()
        .into_iter()
        .map(|c| c.to_string())
        .collect();
    if has_column(df, KEPUASAN) {
        columns.push(KEPUASAN.to_string());
    }
    columns
}

/// Pearson coefficient for every column pair over rows where both values
/// are present. Only the upper triangle is computed; the lower triangle
/// mirrors it and the diagonal is exactly 1.0. Pairs with zero variance
/// yield NaN.
pub fn correlation_matrix(
    df: &DataFrame,
    columns: &[String],
) -> Result<CorrelationMatrix, AggregationError> {
    if columns.len() < 2 {
        return Err(AggregationError::NotEnoughColumns(columns.len()));
    }

    let data = columns
        .iter()
        .map(|name| StatsCalculator::numeric_column(df, name))
        .collect::<Result<Vec<_>, _>>()?;

    let n = columns.len();
    let mut values = vec![vec![1.0f64; n]; n];

    for i in 0..n {
        for j in (i + 1)..n {
            let (xs, ys): (Vec<f64>, Vec<f64>) = data[i]
                .iter()
                .zip(&data[j])
                .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
                .unzip();
            let r = StatsCalculator::pearson(&xs, &ys);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix {
        columns: columns.to_vec(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_matrix_symmetric_with_unit_diagonal() {
        let df = df! {
            "Kualitas_Internet" => &[1.0, 2.0, 3.0, 4.0, 5.0],
            "Jam_Operasional" => &[2.0, 1.0, 4.0, 3.0, 5.0],
            "Kepuasan_Keseluruhan" => &[5.0, 4.0, 3.0, 2.0, 1.0],
        }
        .unwrap();
        let catalog = FactorCatalog::from_frame(&df);
        let columns = correlation_columns(&df, &catalog);
        assert_eq!(
            columns,
            vec!["Kualitas_Internet", "Jam_Operasional", "Kepuasan_Keseluruhan"]
        );

        let matrix = correlation_matrix(&df, &columns).unwrap();
        assert_eq!(matrix.size(), 3);
        for i in 0..3 {
            assert_eq!(matrix.values()[i][i], 1.0);
            for j in 0..3 {
                assert_eq!(
                    matrix.values()[i][j].to_bits(),
                    matrix.values()[j][i].to_bits()
                );
            }
        }
        let r = matrix
            .get("Kualitas_Internet", "Kepuasan_Keseluruhan")
            .unwrap();
        assert!(approx(r, -1.0));
        assert!(approx(
            matrix.get("Kualitas_Internet", "Jam_Operasional").unwrap(),
            0.8
        ));
    }

    #[test]
    fn test_pairwise_complete_observations() {
        let df = df! {
            "a" => &[Some(1.0), Some(2.0), None, Some(3.0)],
            "b" => &[Some(2.0), Some(4.0), Some(100.0), Some(6.0)],
        }
        .unwrap();
        let matrix = correlation_matrix(&df, &["a".to_string(), "b".to_string()]).unwrap();
        assert!(approx(matrix.get("a", "b").unwrap(), 1.0));
    }

    #[test]
    fn test_not_enough_columns() {
        let df = df! {
            "Fakultas" => &["A", "B"],
            "Kepuasan_Keseluruhan" => &[4.0, 3.0],
            "Kualitas_Internet" => &[5.0, 2.0],
        }
        .unwrap();

        let one_factor = correlation_columns(&df, &FactorCatalog::from_frame(&df));
        assert_eq!(correlation_matrix(&df, &one_factor).unwrap().size(), 2);

        let alone = vec!["Kepuasan_Keseluruhan".to_string()];
        assert!(matches!(
            correlation_matrix(&df, &alone),
            Err(AggregationError::NotEnoughColumns(1))
        ));
    }
}
