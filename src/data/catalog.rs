//! Factor Catalog
//! Detects which optional facility/experience factor columns are present.

use super::schema::has_column;
use polars::prelude::DataFrame;
use serde::Serialize;
use std::fmt;

/// Facility / experience dimensions rated 1-5 by respondents.
///
/// Declaration order is the candidate order used for tie-breaking and for
/// every "in catalog order" view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Factor {
    KualitasInternet,
    KetersediaanFasilitas,
    JamOperasional,
    PeningkatanMotivasi,
    LingkunganLebihBaik,
    FasilitasDifabel,
    DiskusiKelompok,
    PeningkatanCitra,
}

impl Factor {
    pub const ALL: [Factor; 8] = [
        Factor::KualitasInternet,
        Factor::KetersediaanFasilitas,
        Factor::JamOperasional,
        Factor::PeningkatanMotivasi,
        Factor::LingkunganLebihBaik,
        Factor::FasilitasDifabel,
        Factor::DiskusiKelompok,
        Factor::PeningkatanCitra,
    ];

    /// Factors shown in the per-faculty stacked contribution chart.
    pub const STACKED: [Factor; 4] = [
        Factor::KualitasInternet,
        Factor::KetersediaanFasilitas,
        Factor::JamOperasional,
        Factor::PeningkatanMotivasi,
    ];

    /// Column name in the survey CSV.
    pub fn column(self) -> &'static str {
        match self {
            Factor::KualitasInternet => "Kualitas_Internet",
            Factor::KetersediaanFasilitas => "Ketersediaan_Fasilitas",
            Factor::JamOperasional => "Jam_Operasional",
            Factor::PeningkatanMotivasi => "Peningkatan_Motivasi",
            Factor::LingkunganLebihBaik => "Lingkungan_Lebih_Baik",
            Factor::FasilitasDifabel => "Fasilitas_Difabel",
            Factor::DiskusiKelompok => "Diskusi_Kelompok",
            Factor::PeningkatanCitra => "Peningkatan_Citra",
        }
    }

    /// Human readable label for chart axes.
    pub fn label(self) -> &'static str {
        match self {
            Factor::KualitasInternet => "Internet quality",
            Factor::KetersediaanFasilitas => "Facility availability",
            Factor::JamOperasional => "Operating hours",
            Factor::PeningkatanMotivasi => "Motivation increase",
            Factor::LingkunganLebihBaik => "Better environment",
            Factor::FasilitasDifabel => "Accessibility facilities",
            Factor::DiskusiKelompok => "Group discussion",
            Factor::PeningkatanCitra => "Image improvement",
        }
    }

    pub fn from_column(name: &str) -> Option<Factor> {
        Self::ALL.into_iter().find(|f| f.column() == name)
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Factors present in a loaded table, in candidate order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FactorCatalog {
    factors: Vec<Factor>,
}

impl FactorCatalog {
    /// Scan the table's columns once. Row filtering never removes columns,
    /// so the result stays valid for every filtered view of the same table.
    pub fn from_frame(df: &DataFrame) -> Self {
        let factors = Factor::ALL
            .into_iter()
            .filter(|f| has_column(df, f.column()))
            .collect();
        Self { factors }
    }

    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    pub fn contains(&self, factor: Factor) -> bool {
        self.factors.contains(&factor)
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.factors.iter().map(|f| f.column()).collect()
    }

    /// Available subset of `wanted`, keeping candidate order.
    pub fn subset(&self, wanted: &[Factor]) -> Vec<Factor> {
        self.factors
            .iter()
            .copied()
            .filter(|f| wanted.contains(f))
            .collect()
    }
}

/// Factors present as columns of `df`, in candidate order.
pub fn available_factors(df: &DataFrame) -> FactorCatalog {
    FactorCatalog::from_frame(df)
}
