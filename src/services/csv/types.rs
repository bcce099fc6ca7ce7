use crate::models::{ColumnType, PreviewRow};
use serde::Serialize;
use smallvec::SmallVec;

pub const SAMPLE_SIZE: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub data_type: ColumnType,
    pub null_count: usize,
    pub unique_count: usize,
    pub sample_values: SmallVec<[String; SAMPLE_SIZE]>,
    pub min_value: Option<String>,
    pub max_value: Option<String>,
    pub has_duplicates: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataQuality {
    pub total_missing_values: usize,
    pub missing_percentage: f64,
    pub has_missing_data: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TypeDistribution {
    pub numeric: usize,
    pub text: usize,
    pub other: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Insights {
    pub ready_for_analysis: bool,
    pub recommended_actions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub columns: Vec<String>,
    pub num_rows: usize,
    pub num_columns: usize,
    pub file_size: usize,
    pub file_size_mb: f64,
    pub columns_info: Vec<ColumnProfile>,
    pub data_quality: DataQuality,
    pub column_types: TypeDistribution,
    pub numeric_like_columns: Vec<String>,
    pub insights: Insights,
    pub preview_data: Vec<PreviewRow>,
}
