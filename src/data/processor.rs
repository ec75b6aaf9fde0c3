//! Data Processor Module
//! Reshaping and export of survey frames (stack operation, CSV export, preview).

use polars::prelude::*;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Column holding the melted factor name.
pub const FACTOR_COL: &str = "Faktor";
/// Column holding the melted score.
pub const SCORE_COL: &str = "Skor";

/// Rows shown in the raw-data preview.
pub const PREVIEW_ROWS: usize = 20;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Column not found: {0}")]
    MissingColumn(String),
    #[error("Failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

/// Handles reshaping and export operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Transform wide per-group data to long format (stack operation).
    ///
    /// Output columns: `[group_col, "Faktor", "Skor"]`, one row per group and
    /// data column in column-major order. Rows with a null group or a missing
    /// value are skipped.
    pub fn stack_to_long(
        df: &DataFrame,
        group_col: &str,
        data_cols: &[&str],
    ) -> Result<DataFrame, ProcessorError> {
        let mut groups: Vec<String> = Vec::new();
        let mut factors: Vec<String> = Vec::new();
        let mut scores: Vec<f64> = Vec::new();

        let group_series = df
            .column(group_col)
            .map_err(|_| ProcessorError::MissingColumn(group_col.to_string()))?
            .cast(&DataType::String)?;
        let group_ca = group_series.str()?;

        for &data_col in data_cols {
            let value_series = df
                .column(data_col)
                .map_err(|_| ProcessorError::MissingColumn(data_col.to_string()))?;
            let value_f64 = value_series.cast(&DataType::Float64)?;
            let value_ca = value_f64.f64()?;

            for (g, v) in group_ca.into_iter().zip(value_ca) {
                if let (Some(g), Some(v)) = (g, v) {
                    if !v.is_nan() {
                        groups.push(g.to_string());
                        factors.push(data_col.to_string());
                        scores.push(v);
                    }
                }
            }
        }

        let df = DataFrame::new(vec![
            Column::new(group_col.into(), groups),
            Column::new(FACTOR_COL.into(), factors),
            Column::new(SCORE_COL.into(), scores),
        ])?;

        Ok(df)
    }

    /// Serialize a frame as comma-separated CSV with a header row.
    pub fn to_csv_bytes(df: &DataFrame) -> Result<Vec<u8>, ProcessorError> {
        let mut buf = Vec::new();
        CsvWriter::new(&mut buf)
            .include_header(true)
            .finish(&mut df.clone())?;
        Ok(buf)
    }

    /// Write a frame to `path` as CSV.
    pub fn export_csv(df: &DataFrame, path: &Path) -> Result<(), ProcessorError> {
        let bytes = Self::to_csv_bytes(df)?;
        let mut file = File::create(path)?;
        file.write_all(&bytes)?;
        log::info!("Exported {} rows to {}", df.height(), path.display());
        Ok(())
    }

    /// First `n` rows of a frame.
    pub fn preview(df: &DataFrame, n: usize) -> DataFrame {
        df.head(Some(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn wide() -> DataFrame {
        df! {
            "Fakultas" => &[Some("FT"), Some("FEB"), None],
            "Kualitas_Internet" => &[Some(4.0), Some(3.5), Some(1.0)],
            "Jam_Operasional" => &[Some(2.0), None, Some(5.0)],
        }
        .unwrap()
    }

    #[test]
    fn test_stack_to_long() {
        let long = DataProcessor::stack_to_long(
            &wide(),
            "Fakultas",
            &["Kualitas_Internet", "Jam_Operasional"],
        )
        .unwrap();

        assert_eq!(long.shape(), (3, 3));
        let groups: Vec<Option<&str>> = long.column("Fakultas").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(groups, vec![Some("FT"), Some("FEB"), Some("FT")]);
        let factors: Vec<Option<&str>> = long.column(FACTOR_COL).unwrap().str().unwrap().into_iter().collect();
        assert_eq!(
            factors,
            vec![
                Some("Kualitas_Internet"),
                Some("Kualitas_Internet"),
                Some("Jam_Operasional")
            ]
        );
        let scores: Vec<Option<f64>> = long.column(SCORE_COL).unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(scores, vec![Some(4.0), Some(3.5), Some(2.0)]);
    }

    #[test]
    fn test_stack_to_long_missing_column() {
        let err = DataProcessor::stack_to_long(&wide(), "Fakultas", &["Diskusi_Kelompok"])
            .unwrap_err();
        assert!(matches!(err, ProcessorError::MissingColumn(ref c) if c == "Diskusi_Kelompok"));
    }

    #[test]
    fn test_csv_export() {
        let df = df! {
            "Fakultas" => &["FT", "FEB"],
            "Kepuasan_Keseluruhan" => &[4.5, 3.5],
        }
        .unwrap();
        let bytes = DataProcessor::to_csv_bytes(&df).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Fakultas,Kepuasan_Keseluruhan"));
        assert_eq!(lines.next(), Some("FT,4.5"));
        assert_eq!(lines.next(), Some("FEB,3.5"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filtered.csv");
        DataProcessor::export_csv(&df, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), text);
    }

    #[test]
    fn test_preview_caps_rows() {
        let df = df! { "x" => (0..50).collect::<Vec<i32>>() }.unwrap();
        assert_eq!(DataProcessor::preview(&df, PREVIEW_ROWS).height(), 20);
        assert_eq!(DataProcessor::preview(&df.head(Some(3)), PREVIEW_ROWS).height(), 3);
    }
}
