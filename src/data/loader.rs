//! CSV Data Loader Module
//! Reads survey CSV files (or uploaded bytes) into validated survey tables.

use super::schema::SchemaError;
use super::table::SurveyTable;
use polars::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Well-known local file name checked before asking for an upload.
pub const DEFAULT_DATA_FILE: &str = "processed_survey_data.csv";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Data file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Invalid survey schema: {0}")]
    Schema(#[from] SchemaError),
}

/// Parsing options for survey CSV files.
#[derive(Debug, Clone, Copy)]
pub struct CsvOptions {
    pub separator: u8,
    pub infer_schema_length: usize,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            separator: b',',
            infer_schema_length: 10000,
        }
    }
}

/// Handles CSV loading with Polars.
///
/// Malformed input is fatal: no partial table is ever produced.
#[derive(Debug, Clone, Default)]
pub struct DataLoader {
    options: CsvOptions,
}

impl DataLoader {
    pub fn new(options: CsvOptions) -> Self {
        Self { options }
    }

    fn read_options(&self) -> CsvReadOptions {
        let separator = self.options.separator;
        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.options.infer_schema_length))
            .map_parse_options(move |opts| opts.with_separator(separator))
    }

    /// Read a CSV file into a raw DataFrame.
    pub fn read_path(&self, path: &Path) -> Result<DataFrame, LoaderError> {
        if !path.exists() {
            return Err(LoaderError::NotFound(path.to_path_buf()));
        }

        let df = self
            .read_options()
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;

        log::debug!(
            "Read {} rows x {} columns from {}",
            df.height(),
            df.width(),
            path.display()
        );
        Ok(df)
    }

    /// Read CSV content supplied in memory (e.g. an uploaded file).
    pub fn read_bytes(&self, bytes: &[u8]) -> Result<DataFrame, LoaderError> {
        let df = self
            .read_options()
            .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
            .finish()?;
        Ok(df)
    }

    /// Load, normalize and validate a survey file.
    pub fn load_path(&self, path: &Path) -> Result<SurveyTable, LoaderError> {
        let raw = self.read_path(path)?;
        log::info!("Loaded survey file {}", path.display());
        Ok(SurveyTable::load(raw)?)
    }

    /// Load, normalize and validate uploaded CSV bytes.
    pub fn load_bytes(&self, bytes: &[u8]) -> Result<SurveyTable, LoaderError> {
        let raw = self.read_bytes(bytes)?;
        log::info!("Loaded uploaded survey ({} bytes)", bytes.len());
        Ok(SurveyTable::load(raw)?)
    }
}
