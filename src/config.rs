//! Dashboard configuration loaded from an optional TOML file.

use crate::data::{CsvOptions, DEFAULT_DATA_FILE};
use crate::stats::{DEFAULT_HISTOGRAM_BINS, TOP_N};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub path: PathBuf,
    /// Single ASCII field separator.
    pub separator: String,
    pub infer_schema_length: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATA_FILE),
            separator: ",".to_string(),
            infer_schema_length: 10000,
        }
    }
}

impl DataConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.separator.len() != 1 || !self.separator.is_ascii() {
            return Err(ConfigError::Invalid(format!(
                "separator must be one ASCII character, got {:?}",
                self.separator
            )));
        }
        if self.infer_schema_length == 0 {
            return Err(ConfigError::Invalid(
                "infer_schema_length must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn csv_options(&self) -> CsvOptions {
        CsvOptions {
            separator: self.separator.bytes().next().unwrap_or(b','),
            infer_schema_length: self.infer_schema_length,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    pub histogram_bins: usize,
    /// Factors shown in the best / worst bars.
    pub top_n: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 900,
            height: 600,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            top_n: TOP_N,
        }
    }
}

impl ChartConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(200..=4000).contains(&self.width) || !(200..=4000).contains(&self.height) {
            return Err(ConfigError::Invalid(format!(
                "chart size {}x{} outside 200..=4000",
                self.width, self.height
            )));
        }
        if self.histogram_bins == 0 {
            return Err(ConfigError::Invalid(
                "histogram_bins must be positive".to_string(),
            ));
        }
        if self.top_n == 0 {
            return Err(ConfigError::Invalid("top_n must be positive".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data: DataConfig,
    pub charts: ChartConfig,
}

impl DashboardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.data.validate()?;
        self.charts.validate()?;
        Ok(())
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: DashboardConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&contents)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = DashboardConfig::default();
        config.validate().unwrap();
        assert_eq!(config.data.path, PathBuf::from("processed_survey_data.csv"));
        assert_eq!(config.data.csv_options().separator, b',');
        assert_eq!(config.charts.histogram_bins, 10);
        assert_eq!(config.charts.top_n, 5);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = DashboardConfig::from_toml(
            r#"
            [data]
            separator = ";"

            [charts]
            width = 1200
            "#,
        )
        .unwrap();
        assert_eq!(config.data.csv_options().separator, b';');
        assert_eq!(config.data.infer_schema_length, 10000);
        assert_eq!(config.charts.width, 1200);
        assert_eq!(config.charts.height, 600);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            DashboardConfig::from_toml("[data]\nseparator = \";;\""),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            DashboardConfig::from_toml("[charts]\nhistogram_bins = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            DashboardConfig::from_toml("[charts]\nwidth = \"wide\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[data]\npath = \"survey.csv\"").unwrap();
        let config = DashboardConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.data.path, PathBuf::from("survey.csv"));

        let missing = DashboardConfig::load_from_file("/nonexistent/dashboard.toml");
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
