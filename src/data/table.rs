//! Validated survey table.

use super::catalog::FactorCatalog;
use super::schema::{ColumnRename, SchemaError, SchemaNormalizer, SchemaValidator};
use polars::prelude::*;

/// A survey DataFrame that has been normalized and validated.
///
/// Holding a `SurveyTable` guarantees the required canonical columns exist,
/// so downstream views never re-check them.
#[derive(Debug, Clone)]
pub struct SurveyTable {
    df: DataFrame,
    catalog: FactorCatalog,
    renames: Vec<ColumnRename>,
}

impl SurveyTable {
    /// Normalize column synonyms, then validate required columns.
    pub fn load(raw: DataFrame) -> Result<Self, SchemaError> {
        let (df, renames) = SchemaNormalizer::normalize(raw)?;
        SchemaValidator::validate(&df)?;

        let catalog = FactorCatalog::from_frame(&df);
        log::info!(
            "Survey table ready: {} rows, {} columns, {} factors",
            df.height(),
            df.width(),
            catalog.len()
        );

        Ok(Self {
            df,
            catalog,
            renames,
        })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    /// Factor catalog computed once at load.
    pub fn catalog(&self) -> &FactorCatalog {
        &self.catalog
    }

    pub fn renames(&self) -> &[ColumnRename] {
        &self.renames
    }

    pub fn row_count(&self) -> usize {
        self.df.height()
    }

    pub fn columns(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::catalog::Factor;
    use polars::df;

    #[test]
    fn test_load_normalizes_and_catalogs() {
        let raw = df! {
            "Fakultas" => &["A", "B"],
            "Kepuasan" => &[4.0, 3.0],
            "Diskusi_Kelompok" => &[2.0, 5.0],
        }
        .unwrap();

        let table = SurveyTable::load(raw).unwrap();
        assert_eq!(table.row_count(), 2);
        assert!(table.columns().contains(&"Kepuasan_Keseluruhan".to_string()));
        assert_eq!(table.catalog().factors(), &[Factor::DiskusiKelompok]);
        assert_eq!(table.renames().len(), 1);
    }

    #[test]
    fn test_load_rejects_missing_required() {
        let raw = df! {
            "Prodi" => &["X"],
            "Kualitas_Internet" => &[4.0],
        }
        .unwrap();

        match SurveyTable::load(raw) {
            Err(SchemaError::MissingRequiredColumns(missing)) => {
                assert_eq!(missing, vec!["Fakultas", "Kepuasan_Keseluruhan"]);
            }
            other => panic!("expected missing columns, got {:?}", other.map(|t| t.row_count())),
        }
    }
}
