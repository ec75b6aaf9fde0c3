//! Data module - survey loading, schema normalization and filtering

pub mod catalog;
pub mod filter;
pub mod loader;
pub mod processor;
pub mod schema;
pub mod table;

pub use catalog::{available_factors, Factor, FactorCatalog};
pub use filter::{FilterEngine, FilterSelection, FilteredView, Selector, ALL_SENTINEL};
pub use loader::{CsvOptions, DataLoader, LoaderError, DEFAULT_DATA_FILE};
pub use processor::{DataProcessor, ProcessorError, PREVIEW_ROWS};
pub use schema::{ColumnRename, SchemaError, FAKULTAS, KEPUASAN, PRODI, REQUIRED_COLUMNS};
pub use table::SurveyTable;
