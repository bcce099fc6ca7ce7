use crate::models::{ColumnType, PreviewRow};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalReason {
    Null,
    Duplicate,
}

/// A dropped row with its index in the loaded file and its original values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemovedRow {
    pub row_index: usize,
    pub reason: RemovalReason,
    pub data: PreviewRow,
}

/// Null cell counts per column, serialised as an ordered JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NullCounts(pub Vec<(String, usize)>);

impl NullCounts {
    pub fn get(&self, column: &str) -> Option<usize> {
        self.0
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, count)| *count)
    }

    pub fn columns_with_nulls(&self) -> Vec<String> {
        self.0
            .iter()
            .filter(|(_, count)| *count > 0)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl Serialize for NullCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, count) in &self.0 {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeConversionOutcome {
    pub column: String,
    pub original_type: ColumnType,
    pub new_type: ColumnType,
    /// Fraction of non-null values that parsed as numbers.
    pub success_rate: f64,
    pub valid_count: usize,
    pub non_null_count: usize,
    pub converted: bool,
    pub nulls_introduced: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeConversions {
    pub numeric_columns: Vec<String>,
    pub conversion_details: Vec<TypeConversionOutcome>,
    pub summary: String,
}

impl TypeConversions {
    pub fn from_outcomes(outcomes: Vec<TypeConversionOutcome>) -> Self {
        let numeric_columns: Vec<String> = outcomes
            .iter()
            .filter(|o| o.converted)
            .map(|o| o.column.clone())
            .collect();

        let summary = if numeric_columns.is_empty() {
            "No columns converted.".to_string()
        } else {
            format!("Converted to numeric: {}.", numeric_columns.join(", "))
        };

        Self {
            numeric_columns,
            conversion_details: outcomes,
            summary,
        }
    }

    pub fn nulls_introduced(&self) -> usize {
        self.conversion_details.iter().map(|o| o.nulls_introduced).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleaningReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub remove_duplicates_requested: bool,
    pub original_rows: usize,
    pub cleaned_rows: usize,
    pub rows_removed: usize,
    pub null_rows_removed: usize,
    pub duplicate_rows_removed: usize,
    pub removal_percentage: f64,
    pub columns: Vec<String>,
    pub columns_with_nulls: Vec<String>,
    pub null_counts_by_column: NullCounts,
    pub type_conversions: TypeConversions,
    pub conversion_induced_nulls: usize,
    pub cleaned_data: Vec<PreviewRow>,
    pub sample_removed_rows: Vec<RemovedRow>,
    pub cleaning_summary: String,
}

/// The complete removed-row set of one file, unbounded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemovedRowsResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub remove_duplicates_requested: bool,
    pub removed_rows_count: usize,
    pub columns: Vec<String>,
    pub columns_with_nulls: Vec<String>,
    pub null_counts_by_column: NullCounts,
    pub removed_rows: Vec<RemovedRow>,
}
