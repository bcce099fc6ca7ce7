use super::types::*;
use super::utils::*;
use crate::models::{CellValue, ColumnType, Table};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct AnalysisPolicy {
    pub preview_rows: usize,
    /// Parse rate at which a text column is reported as convertible.
    pub conversion_threshold: f64,
    pub missing_warning_percent: f64,
    pub ready_missing_percent: f64,
    pub large_dataset_rows: usize,
}

impl Default for AnalysisPolicy {
    fn default() -> Self {
        Self {
            preview_rows: 5,
            conversion_threshold: 0.8,
            missing_warning_percent: 5.0,
            ready_missing_percent: 10.0,
            large_dataset_rows: 10_000,
        }
    }
}

pub struct CsvAnalyzer {
    policy: AnalysisPolicy,
}

impl CsvAnalyzer {
    pub fn new(policy: AnalysisPolicy) -> Self {
        Self { policy }
    }

    pub fn analyze(&self, table: &Table) -> AnalysisResult {
        let start = std::time::Instant::now();

        let columns_info: Vec<ColumnProfile> = (0..table.column_count())
            .map(|idx| self.analyze_column(table, idx))
            .collect();

        let mut column_types = TypeDistribution::default();
        for profile in &columns_info {
            match profile.data_type {
                ColumnType::Numeric => column_types.numeric += 1,
                ColumnType::Text => column_types.text += 1,
                ColumnType::Other => column_types.other += 1,
            }
        }

        let total_missing_values: usize = columns_info.iter().map(|c| c.null_count).sum();
        let data_quality = DataQuality {
            total_missing_values,
            missing_percentage: percentage(
                total_missing_values,
                table.row_count() * table.column_count(),
            ),
            has_missing_data: total_missing_values > 0,
        };

        let numeric_like_columns = self.numeric_like_columns(table);
        let insights = self.insights(table, &data_quality, &numeric_like_columns);

        tracing::info!(
            "Analysis of {} rows x {} columns completed in {:?}",
            table.row_count(),
            table.column_count(),
            start.elapsed()
        );

        AnalysisResult {
            filename: None,
            columns: table.column_names(),
            num_rows: table.row_count(),
            num_columns: table.column_count(),
            file_size: 0,
            file_size_mb: 0.0,
            columns_info,
            data_quality,
            column_types,
            numeric_like_columns,
            insights,
            preview_data: table.preview(self.policy.preview_rows),
        }
    }

    fn analyze_column(&self, table: &Table, idx: usize) -> ColumnProfile {
        let column = &table.columns[idx];
        let mut sample_values = SmallVec::<[String; SAMPLE_SIZE]>::new();
        let mut seen_values = HashSet::new();
        let mut null_count = 0;
        let mut non_null_count = 0;
        let mut text_min_max = (None, None);
        let mut numeric_min_max: Option<(&CellValue, &CellValue)> = None;

        for value in table.column_values(idx) {
            let rendered = match value {
                CellValue::Null => {
                    null_count += 1;
                    continue;
                }
                CellValue::Integer(_) | CellValue::Number(_) => {
                    numeric_min_max = Some(match numeric_min_max {
                        Some((min, max)) => {
                            let min = match value.numeric_cmp(min) {
                                Some(Ordering::Less) => value,
                                _ => min,
                            };
                            let max = match value.numeric_cmp(max) {
                                Some(Ordering::Greater) => value,
                                _ => max,
                            };
                            (min, max)
                        }
                        None => (value, value),
                    });
                    value.to_field()
                }
                CellValue::Text(s) => {
                    update_min_max(&mut text_min_max, s);
                    s.clone()
                }
            };

            non_null_count += 1;
            if sample_values.len() < SAMPLE_SIZE {
                sample_values.push(rendered.clone());
            }
            seen_values.insert(rendered);
        }

        let (min_value, max_value) = match numeric_min_max {
            Some((min, max)) => (Some(min.to_field()), Some(max.to_field())),
            None => text_min_max,
        };

        ColumnProfile {
            name: column.name.clone(),
            data_type: column.data_type,
            null_count,
            unique_count: seen_values.len(),
            sample_values,
            min_value,
            max_value,
            has_duplicates: seen_values.len() < non_null_count,
        }
    }

    fn numeric_like_columns(&self, table: &Table) -> Vec<String> {
        table
            .columns
            .iter()
            .enumerate()
            .filter(|(_, column)| column.data_type == ColumnType::Text)
            .filter(|(idx, _)| {
                let texts = table.column_values(*idx).filter_map(|value| match value {
                    CellValue::Text(s) => Some(s.as_str()),
                    _ => None,
                });
                numeric_parse_counts(texts).map_or(false, |(valid, non_null)| {
                    valid as f64 / non_null as f64 >= self.policy.conversion_threshold
                })
            })
            .map(|(_, column)| column.name.clone())
            .collect()
    }

    fn insights(
        &self,
        table: &Table,
        quality: &DataQuality,
        numeric_like_columns: &[String],
    ) -> Insights {
        let mut recommended_actions = Vec::new();

        if quality.missing_percentage > self.policy.missing_warning_percent {
            recommended_actions.push(format!(
                "Consider handling missing values ({:.1}% of data is missing)",
                quality.missing_percentage
            ));
        }

        if quality.missing_percentage == 0.0 {
            recommended_actions
                .push("Data quality is excellent - no missing values detected".to_string());
        }

        if !numeric_like_columns.is_empty() {
            recommended_actions.push(format!(
                "Consider converting column(s) {} to numeric",
                numeric_like_columns.join(", ")
            ));
        }

        if table.row_count() > self.policy.large_dataset_rows {
            recommended_actions.push(
                "Large dataset detected - consider data sampling for initial exploration"
                    .to_string(),
            );
        }

        Insights {
            ready_for_analysis: quality.missing_percentage < self.policy.ready_missing_percent,
            recommended_actions,
        }
    }
}
