use crate::error::AppError;
use crate::services::cleaning::{
    CleaningEngine, CleaningOutcome, CleaningPolicy, CleaningReport, RemovedRowsResult,
};
use crate::services::csv::{utils::round2, write_table, AnalysisPolicy, CsvAnalyzer, CsvLoader};
use crate::services::csv::types::AnalysisResult;

/// Entry point for every upload-driven operation. Each call loads the bytes
/// afresh; nothing is kept between calls.
#[derive(Debug, Clone, Default)]
pub struct FileProcessor {
    analysis: AnalysisPolicy,
    cleaning: CleaningPolicy,
}

impl FileProcessor {
    pub fn new(analysis: AnalysisPolicy, cleaning: CleaningPolicy) -> Self {
        Self { analysis, cleaning }
    }

    pub fn analyze_csv(&self, file_data: &[u8]) -> Result<AnalysisResult, AppError> {
        tracing::info!("Starting CSV analysis, size: {}KB", file_data.len() / 1024);
        let table = CsvLoader::new().load(file_data)?;

        let mut analysis = CsvAnalyzer::new(self.analysis.clone()).analyze(&table);
        analysis.file_size = file_data.len();
        analysis.file_size_mb = round2(file_data.len() as f64 / (1024.0 * 1024.0));
        Ok(analysis)
    }

    pub fn clean_csv(
        &self,
        file_data: &[u8],
        remove_duplicates: bool,
    ) -> Result<CleaningReport, AppError> {
        Ok(self.run_cleaning(file_data, remove_duplicates)?.report)
    }

    /// Same pipeline as `clean_csv`, returning the whole cleaned table as CSV.
    pub fn clean_and_download(
        &self,
        file_data: &[u8],
        remove_duplicates: bool,
    ) -> Result<Vec<u8>, AppError> {
        let outcome = self.run_cleaning(file_data, remove_duplicates)?;
        let output = write_table(&outcome.table)?;
        tracing::info!(
            "Generated cleaned CSV: {} rows, {}KB",
            outcome.table.row_count(),
            output.len() / 1024
        );
        Ok(output)
    }

    /// Re-derives the complete removed-row set. Type conversion does not run.
    pub fn get_removed_rows(
        &self,
        file_data: &[u8],
        remove_duplicates: bool,
    ) -> Result<RemovedRowsResult, AppError> {
        let table = CsvLoader::new().load(file_data)?;
        let plan =
            CleaningEngine::new(self.cleaning.clone()).scan_removals(&table, remove_duplicates);
        let removed_rows = plan.removed_rows(&table);

        tracing::info!(
            "Identified {} removed rows ({} null, {} duplicate)",
            removed_rows.len(),
            plan.null_rows_removed,
            plan.duplicate_rows_removed
        );

        Ok(RemovedRowsResult {
            filename: None,
            remove_duplicates_requested: remove_duplicates,
            removed_rows_count: removed_rows.len(),
            columns: table.column_names(),
            columns_with_nulls: plan.null_counts.columns_with_nulls(),
            null_counts_by_column: plan.null_counts,
            removed_rows,
        })
    }

    fn run_cleaning(
        &self,
        file_data: &[u8],
        remove_duplicates: bool,
    ) -> Result<CleaningOutcome, AppError> {
        tracing::info!(
            "Starting CSV cleaning, size: {}KB, remove_duplicates: {}",
            file_data.len() / 1024,
            remove_duplicates
        );
        let table = CsvLoader::new().load(file_data)?;
        Ok(CleaningEngine::new(self.cleaning.clone()).run(table, remove_duplicates))
    }
}
