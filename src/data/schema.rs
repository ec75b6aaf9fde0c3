//! Canonical Survey Schema
//! Column synonym normalization and required-column validation.

use polars::prelude::*;
use thiserror::Error;

/// Faculty column (categorical, required).
pub const FAKULTAS: &str = "Fakultas";
/// Overall satisfaction column (numeric 1-5, required).
pub const KEPUASAN: &str = "Kepuasan_Keseluruhan";
/// Study program column (categorical, optional).
pub const PRODI: &str = "Prodi";

/// Columns every survey table must carry after normalization.
pub const REQUIRED_COLUMNS: [&str; 2] = [FAKULTAS, KEPUASAN];

/// Known alternate spellings, checked in this order.
/// The first synonym present wins; later ones stay untouched.
const SYNONYMS: [(&str, &str); 4] = [
    ("Program_Studi", PRODI),
    ("Program Studi", PRODI),
    ("ProgramStudy", PRODI),
    ("Kepuasan", KEPUASAN),
];

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Missing required columns: {0:?}")]
    MissingRequiredColumns(Vec<String>),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// A single synonym rename performed during normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRename {
    pub from: String,
    pub to: String,
}

/// Check whether a column exists in the DataFrame.
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_index(name).is_some()
}

/// Maps synonym columns onto canonical names.
pub struct SchemaNormalizer;

impl SchemaNormalizer {
    /// Rename known synonyms to their canonical names.
    ///
    /// A synonym is skipped when its canonical name is already present, so
    /// no two columns ever end up sharing a name. Unrelated columns keep
    /// their names and order.
    pub fn normalize(mut df: DataFrame) -> Result<(DataFrame, Vec<ColumnRename>), SchemaError> {
        let mut renames = Vec::new();

        for (synonym, canonical) in SYNONYMS {
            if has_column(&df, synonym) && !has_column(&df, canonical) {
                df.rename(synonym, canonical.into())?;
                log::debug!("Renamed column '{}' -> '{}'", synonym, canonical);
                renames.push(ColumnRename {
                    from: synonym.to_string(),
                    to: canonical.to_string(),
                });
            }
        }

        Ok((df, renames))
    }
}

/// Fails fast on tables missing required canonical columns.
pub struct SchemaValidator;

impl SchemaValidator {
    /// Names of required columns absent from `df`, in canonical order.
    pub fn missing_required(df: &DataFrame) -> Vec<String> {
        REQUIRED_COLUMNS
            .iter()
            .filter(|name| !has_column(df, name))
            .map(|name| name.to_string())
            .collect()
    }

    pub fn validate(df: &DataFrame) -> Result<(), SchemaError> {
        let missing = Self::missing_required(df);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::MissingRequiredColumns(missing))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn names(df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_normalize_canonical_is_noop() {
        let df = df! {
            "Fakultas" => &["A", "B"],
            "Prodi" => &["X", "Y"],
            "Kepuasan_Keseluruhan" => &[4.0, 5.0],
        }
        .unwrap();

        let (normalized, renames) = SchemaNormalizer::normalize(df.clone()).unwrap();
        assert!(renames.is_empty());
        assert_eq!(names(&normalized), names(&df));
        assert!(normalized.equals_missing(&df));
    }

    #[test]
    fn test_normalize_renames_synonyms() {
        let df = df! {
            "Fakultas" => &["A", "B"],
            "Program Studi" => &["X", "Y"],
            "Kepuasan" => &[4.0, 5.0],
            "Catatan" => &["ok", "baik"],
        }
        .unwrap();

        let (normalized, renames) = SchemaNormalizer::normalize(df).unwrap();
        assert_eq!(
            names(&normalized),
            vec!["Fakultas", "Prodi", "Kepuasan_Keseluruhan", "Catatan"]
        );
        assert_eq!(renames.len(), 2);
        assert_eq!(normalized.height(), 2);
    }

    #[test]
    fn test_normalize_skips_when_canonical_exists() {
        let df = df! {
            "Fakultas" => &["A"],
            "Prodi" => &["X"],
            "Program_Studi" => &["Z"],
            "Kepuasan_Keseluruhan" => &[3.0],
            "Kepuasan" => &[1.0],
        }
        .unwrap();

        let (normalized, renames) = SchemaNormalizer::normalize(df).unwrap();
        assert!(renames.is_empty());
        assert!(has_column(&normalized, "Program_Studi"));
        assert!(has_column(&normalized, "Kepuasan"));
    }

    #[test]
    fn test_normalize_first_synonym_wins() {
        let df = df! {
            "Program_Studi" => &["X"],
            "ProgramStudy" => &["Y"],
        }
        .unwrap();

        let (normalized, renames) = SchemaNormalizer::normalize(df).unwrap();
        assert_eq!(names(&normalized), vec!["Prodi", "ProgramStudy"]);
        assert_eq!(
            renames,
            vec![ColumnRename {
                from: "Program_Studi".into(),
                to: "Prodi".into()
            }]
        );
    }

    #[test]
    fn test_validate_missing_columns() {
        let df = df! {
            "Kepuasan_Keseluruhan" => &[4.0],
            "Kualitas_Internet" => &[3.0],
        }
        .unwrap();

        match SchemaValidator::validate(&df) {
            Err(SchemaError::MissingRequiredColumns(missing)) => {
                assert_eq!(missing, vec!["Fakultas"]);
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let empty = df! { "Prodi" => &["X"] }.unwrap();
        assert_eq!(
            SchemaValidator::missing_required(&empty),
            vec!["Fakultas", "Kepuasan_Keseluruhan"]
        );
    }
}
