//! Dashboard session: one loaded survey table and the user's current
//! filter selection.

use crate::data::{
    DataLoader, DataProcessor, FilterEngine, FilterSelection, FilteredView, LoaderError,
    ProcessorError, Selector, SurveyTable, FAKULTAS, KEPUASAN, PRODI,
};
use crate::stats::{
    correlation_columns, correlation_matrix, AggregationEngine, AggregationError,
    CorrelationMatrix, GroupedMeans, OverallSummary, RankedFactors,
};
use polars::prelude::*;
use std::path::Path;

pub struct Session {
    table: SurveyTable,
    selection: FilterSelection,
}

impl Session {
    pub fn new(table: SurveyTable) -> Self {
        Self {
            table,
            selection: FilterSelection::default(),
        }
    }

    /// Load the survey from a file on disk.
    pub fn open(loader: &DataLoader, path: &Path) -> Result<Self, LoaderError> {
        Ok(Self::new(loader.load_path(path)?))
    }

    /// Load the survey from an uploaded buffer.
    pub fn from_upload(loader: &DataLoader, bytes: &[u8]) -> Result<Self, LoaderError> {
        Ok(Self::new(loader.load_bytes(bytes)?))
    }

    pub fn table(&self) -> &SurveyTable {
        &self.table
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: FilterSelection) {
        self.selection = selection;
    }

    pub fn select_faculty(&mut self, faculty: Selector) {
        self.selection.faculty = faculty;
    }

    pub fn select_program(&mut self, program: Selector) {
        self.selection.program = program;
    }

    /// Options for the faculty selector.
    pub fn faculty_options(&self) -> Vec<String> {
        FilterEngine::category_options(&self.table, FAKULTAS)
    }

    /// Options for the study-program selector; just the sentinel when the
    /// table has no program column.
    pub fn program_options(&self) -> Vec<String> {
        FilterEngine::category_options(&self.table, PRODI)
    }

    /// Rows visible under the current selection.
    pub fn view(&self) -> Result<FilteredView, PolarsError> {
        FilterEngine::apply(&self.table, &self.selection)
    }

    pub fn overall_summary(&self, view: &FilteredView) -> Result<OverallSummary, AggregationError> {
        AggregationEngine::overall_summary(view.frame())
    }

    pub fn ranked_factors(&self, view: &FilteredView) -> Result<RankedFactors, AggregationError> {
        AggregationEngine::ranked_factor_means(view.frame(), self.table.catalog())
    }

    /// Mean satisfaction per faculty, best faculty first.
    pub fn faculty_means(&self, view: &FilteredView) -> Result<GroupedMeans, AggregationError> {
        AggregationEngine::grouped_means(view.frame(), FAKULTAS, &[KEPUASAN])
    }

    /// Correlation heatmap data over the available factors and satisfaction.
    pub fn correlation(&self, view: &FilteredView) -> Result<CorrelationMatrix, AggregationError> {
        let columns = correlation_columns(view.frame(), self.table.catalog());
        correlation_matrix(view.frame(), &columns)
    }

    /// The current view as CSV bytes.
    pub fn export_csv(&self, view: &FilteredView) -> Result<Vec<u8>, ProcessorError> {
        DataProcessor::to_csv_bytes(view.frame())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Fakultas,Program_Studi,Kepuasan_Keseluruhan,Kualitas_Internet,Jam_Operasional
FT,Sipil,4,5,3
FT,Informatika,2,3,4
FEB,Manajemen,5,5,2
";

    fn session() -> Session {
        Session::from_upload(&DataLoader::default(), CSV.as_bytes()).unwrap()
    }

    #[test]
    fn test_default_selection_sees_everything() {
        let s = session();
        let view = s.view().unwrap();
        assert_eq!(view.row_count(), 3);
        assert_eq!(s.faculty_options(), vec!["all", "FEB", "FT"]);
        assert_eq!(
            s.program_options(),
            vec!["all", "Informatika", "Manajemen", "Sipil"]
        );
    }

    #[test]
    fn test_selection_drives_aggregates() {
        let mut s = session();
        s.select_faculty(Selector::parse("FT"));
        let view = s.view().unwrap();
        let summary = s.overall_summary(&view).unwrap();
        assert_eq!(summary.respondents, 2);
        assert_eq!(summary.mean_satisfaction.value(), Some(3.0));

        let ranked = s.ranked_factors(&view).unwrap();
        assert_eq!(ranked.ranked()[0].mean, Some(4.0));

        s.select_program(Selector::parse("Manajemen"));
        let view = s.view().unwrap();
        assert!(view.fell_back_to_unfiltered());
        assert_eq!(view.row_count(), 3);
    }

    #[test]
    fn test_faculty_means_and_correlation() {
        let s = session();
        let view = s.view().unwrap();
        let means = s.faculty_means(&view).unwrap();
        assert_eq!(means.keys(), vec!["FEB", "FT"]);

        let matrix = s.correlation(&view).unwrap();
        assert_eq!(matrix.size(), 3);
    }

    #[test]
    fn test_export_respects_selection() {
        let mut s = session();
        s.set_selection(FilterSelection::new(
            Selector::parse("FEB"),
            Selector::All,
        ));
        let view = s.view().unwrap();
        let text = String::from_utf8(s.export_csv(&view).unwrap()).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("Fakultas,Prodi,"));
    }
}
