use super::report::*;
use crate::models::{CellKey, CellValue, ColumnType, Table};
use crate::services::csv::utils::{parse_number, percentage};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct CleaningPolicy {
    /// Minimum parse rate for a text column to be converted to numeric.
    pub conversion_threshold: f64,
    pub preview_rows: usize,
    pub removed_rows_sample: usize,
}

impl Default for CleaningPolicy {
    fn default() -> Self {
        Self {
            conversion_threshold: 0.8,
            preview_rows: 5,
            removed_rows_sample: 10,
        }
    }
}

/// Rows marked for removal, addressed by arena position. Nothing is
/// deleted from the table while the plan is built.
#[derive(Debug, Clone)]
pub struct RemovalPlan {
    marks: Vec<Option<RemovalReason>>,
    /// Null removals in row order, then duplicate removals in row order.
    removed: Vec<usize>,
    pub duplicates_requested: bool,
    pub null_rows_removed: usize,
    pub duplicate_rows_removed: usize,
    pub null_counts: NullCounts,
}

impl RemovalPlan {
    pub fn rows_removed(&self) -> usize {
        self.null_rows_removed + self.duplicate_rows_removed
    }

    pub fn is_removed(&self, position: usize) -> bool {
        self.marks.get(position).map_or(false, Option::is_some)
    }

    pub fn removed_rows(&self, table: &Table) -> Vec<RemovedRow> {
        self.removed
            .iter()
            .filter_map(|&position| {
                let row = table.rows.get(position)?;
                let reason = self.marks[position]?;
                Some(RemovedRow {
                    row_index: row.index,
                    reason,
                    data: table.row_data(row),
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct CleaningOutcome {
    pub table: Table,
    pub report: CleaningReport,
    /// Every removed row; the report only carries a bounded sample.
    pub removed_rows: Vec<RemovedRow>,
}

pub struct CleaningEngine {
    policy: CleaningPolicy,
}

impl CleaningEngine {
    pub fn new(policy: CleaningPolicy) -> Self {
        Self { policy }
    }

    /// Null scan, null removal and (when requested) duplicate removal.
    pub fn scan_removals(&self, table: &Table, remove_duplicates: bool) -> RemovalPlan {
        let mut marks = vec![None; table.row_count()];
        let mut removed = Vec::new();
        let mut null_counts = vec![0usize; table.column_count()];

        for (position, row) in table.rows.iter().enumerate() {
            let mut has_null = false;
            for (idx, cell) in row.cells.iter().enumerate() {
                if cell.is_null() {
                    null_counts[idx] += 1;
                    has_null = true;
                }
            }
            if has_null {
                marks[position] = Some(RemovalReason::Null);
                removed.push(position);
            }
        }
        let null_rows_removed = removed.len();

        if remove_duplicates {
            let mut seen: HashSet<Vec<CellKey<'_>>> = HashSet::new();
            for (position, row) in table.rows.iter().enumerate() {
                if marks[position].is_some() {
                    continue;
                }
                let key: Vec<CellKey<'_>> = row.cells.iter().map(CellValue::key).collect();
                if !seen.insert(key) {
                    marks[position] = Some(RemovalReason::Duplicate);
                    removed.push(position);
                }
            }
        }
        let duplicate_rows_removed = removed.len() - null_rows_removed;

        tracing::debug!(
            "Marked {} null rows and {} duplicate rows out of {}",
            null_rows_removed,
            duplicate_rows_removed,
            table.row_count()
        );

        RemovalPlan {
            marks,
            removed,
            duplicates_requested: remove_duplicates,
            null_rows_removed,
            duplicate_rows_removed,
            null_counts: NullCounts(
                table
                    .columns
                    .iter()
                    .map(|c| c.name.clone())
                    .zip(null_counts)
                    .collect(),
            ),
        }
    }

    pub fn run(&self, table: Table, remove_duplicates: bool) -> CleaningOutcome {
        let start = std::time::Instant::now();

        let plan = self.scan_removals(&table, remove_duplicates);
        let removed_rows = plan.removed_rows(&table);
        let original_rows = table.row_count();

        let mut cleaned = table.filter_rows(|position| !plan.is_removed(position));
        let outcomes = convert_column_types(&mut cleaned, self.policy.conversion_threshold);
        let type_conversions = TypeConversions::from_outcomes(outcomes);

        let report =
            self.assemble_report(&plan, &cleaned, original_rows, type_conversions, &removed_rows);

        tracing::info!(
            "Cleaning finished in {:?}: {} -> {} rows ({} null, {} duplicate)",
            start.elapsed(),
            report.original_rows,
            report.cleaned_rows,
            report.null_rows_removed,
            report.duplicate_rows_removed
        );

        CleaningOutcome {
            table: cleaned,
            report,
            removed_rows,
        }
    }

    fn assemble_report(
        &self,
        plan: &RemovalPlan,
        cleaned: &Table,
        original_rows: usize,
        type_conversions: TypeConversions,
        removed_rows: &[RemovedRow],
    ) -> CleaningReport {
        let rows_removed = plan.rows_removed();
        let removal_percentage = percentage(rows_removed, original_rows);
        let conversion_induced_nulls = type_conversions.nulls_introduced();

        let cleaning_summary = summarize(
            plan,
            type_conversions.numeric_columns.len(),
            conversion_induced_nulls,
        );

        CleaningReport {
            filename: None,
            remove_duplicates_requested: plan.duplicates_requested,
            original_rows,
            cleaned_rows: cleaned.row_count(),
            rows_removed,
            null_rows_removed: plan.null_rows_removed,
            duplicate_rows_removed: plan.duplicate_rows_removed,
            removal_percentage,
            columns: cleaned.column_names(),
            columns_with_nulls: plan.null_counts.columns_with_nulls(),
            null_counts_by_column: plan.null_counts.clone(),
            type_conversions,
            conversion_induced_nulls,
            cleaned_data: cleaned.preview(self.policy.preview_rows),
            sample_removed_rows: removed_rows
                .iter()
                .take(self.policy.removed_rows_sample)
                .cloned()
                .collect(),
            cleaning_summary,
        }
    }
}

/// Converts text columns whose non-null values mostly parse as numbers.
/// Unparseable values in a converted column become null and stay in place.
pub fn convert_column_types(table: &mut Table, threshold: f64) -> Vec<TypeConversionOutcome> {
    let mut outcomes = Vec::new();

    for idx in 0..table.column_count() {
        if table.columns[idx].data_type != ColumnType::Text {
            continue;
        }

        let (valid_count, non_null_count) = table
            .column_values(idx)
            .filter(|cell| !cell.is_null())
            .fold((0, 0), |(valid, total), cell| {
                (valid + numeric_value(cell).is_some() as usize, total + 1)
            });

        if non_null_count == 0 {
            tracing::debug!("Skipping conversion of {}: no values", table.columns[idx].name);
            continue;
        }

        let success_rate = valid_count as f64 / non_null_count as f64;
        let converted = success_rate >= threshold;
        let mut nulls_introduced = 0;

        if converted {
            for row in table.rows.iter_mut() {
                let cell = &mut row.cells[idx];
                *cell = match numeric_value(cell) {
                    Some(number) => number,
                    None => {
                        if !cell.is_null() {
                            nulls_introduced += 1;
                        }
                        CellValue::Null
                    }
                };
            }
            table.columns[idx].data_type = ColumnType::Numeric;
            tracing::info!(
                "Converted column {} to numeric ({}/{} values parsed)",
                table.columns[idx].name,
                valid_count,
                non_null_count
            );
        }

        outcomes.push(TypeConversionOutcome {
            column: table.columns[idx].name.clone(),
            original_type: ColumnType::Text,
            new_type: ColumnType::Numeric,
            success_rate,
            valid_count,
            non_null_count,
            converted,
            nulls_introduced,
        });
    }

    outcomes
}

fn numeric_value(cell: &CellValue) -> Option<CellValue> {
    match cell {
        CellValue::Integer(_) | CellValue::Number(_) => Some(cell.clone()),
        CellValue::Text(s) => parse_number(s),
        CellValue::Null => None,
    }
}

fn summarize(
    plan: &RemovalPlan,
    columns_converted: usize,
    conversion_induced_nulls: usize,
) -> String {
    if plan.rows_removed() == 0 && columns_converted == 0 {
        return "Data is already clean.".to_string();
    }

    let mut actions = Vec::new();

    if plan.null_rows_removed == 0 {
        actions.push("No rows with null values found.".to_string());
    } else {
        let null_percentage = percentage(plan.null_rows_removed, plan.marks.len());
        actions.push(format!(
            "Removed {} rows containing null values ({}%).",
            plan.null_rows_removed, null_percentage
        ));
    }

    if plan.duplicate_rows_removed > 0 {
        actions.push(format!("Removed {} duplicate rows.", plan.duplicate_rows_removed));
    }

    if columns_converted > 0 {
        actions.push(format!("Converted {} column(s) to numeric format.", columns_converted));
    }

    if conversion_induced_nulls > 0 {
        actions.push(format!(
            "Conversion introduced {} null value(s).",
            conversion_induced_nulls
        ));
    }

    actions.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, Row};
    use crate::services::csv::CsvLoader;

    fn load(input: &str) -> Table {
        CsvLoader::new().load(input.as_bytes()).unwrap()
    }

    fn engine() -> CleaningEngine {
        CleaningEngine::new(CleaningPolicy::default())
    }

    const PEOPLE: &str = "id,name,age\n1,Alice,30\n2,,25\n1,Alice,30\n3,Bob,\n";

    #[test]
    fn removes_nulls_then_duplicates() {
        let outcome = engine().run(load(PEOPLE), true);
        let report = &outcome.report;

        assert_eq!(report.original_rows, 4);
        assert_eq!(report.cleaned_rows, 1);
        assert_eq!(report.null_rows_removed, 2);
        assert_eq!(report.duplicate_rows_removed, 1);
        assert_eq!(report.rows_removed, 3);
        assert_eq!(report.removal_percentage, 75.0);
        assert!(report.remove_duplicates_requested);

        assert_eq!(outcome.table.rows.len(), 1);
        assert_eq!(outcome.table.rows[0].index, 0);
        assert_eq!(
            outcome.table.rows[0].cells,
            vec![
                CellValue::Integer(1),
                CellValue::Text("Alice".into()),
                CellValue::Integer(30)
            ]
        );

        let removed: Vec<(usize, RemovalReason)> = outcome
            .removed_rows
            .iter()
            .map(|r| (r.row_index, r.reason))
            .collect();
        assert_eq!(
            removed,
            vec![
                (1, RemovalReason::Null),
                (3, RemovalReason::Null),
                (2, RemovalReason::Duplicate)
            ]
        );
        assert_eq!(outcome.removed_rows[0].data["name"], serde_json::Value::Null);
        assert_eq!(outcome.removed_rows[0].data["age"], serde_json::json!(25));
    }

    #[test]
    fn duplicates_are_kept_unless_requested() {
        let outcome = engine().run(load(PEOPLE), false);
        let report = &outcome.report;

        assert!(!report.remove_duplicates_requested);
        assert_eq!(report.duplicate_rows_removed, 0);
        assert_eq!(report.null_rows_removed, 2);
        assert_eq!(report.cleaned_rows, 2);
        assert_eq!(report.removal_percentage, 50.0);
    }

    #[test]
    fn counts_always_balance() {
        for input in [
            PEOPLE,
            "a,b\n1,1\n1,1\n1,1\n,\n",
            "a\nx\nx\ny\n",
            "a,b\n1,2\n3,4\n",
        ] {
            for flag in [true, false] {
                let report = engine().run(load(input), flag).report;
                assert_eq!(report.cleaned_rows + report.rows_removed, report.original_rows);
                assert_eq!(
                    report.rows_removed,
                    report.null_rows_removed + report.duplicate_rows_removed
                );
            }
        }
    }

    #[test]
    fn null_rows_never_count_as_duplicates() {
        let outcome = engine().run(load("a,b\n1,\n1,\n2,3\n"), true);
        assert_eq!(outcome.report.null_rows_removed, 2);
        assert_eq!(outcome.report.duplicate_rows_removed, 0);
    }

    #[test]
    fn first_occurrence_wins() {
        let outcome = engine().run(load("k,v\nb,1\na,1\nb,1\na,1\nA,1\n"), true);
        let kept: Vec<usize> = outcome.table.rows.iter().map(|r| r.index).collect();
        assert_eq!(kept, vec![0, 1, 4]);
        assert_eq!(outcome.report.duplicate_rows_removed, 2);
    }

    #[test]
    fn numbers_compare_by_value() {
        let outcome = engine().run(load("n\n1\n1.0\n01\n"), true);
        assert_eq!(outcome.report.duplicate_rows_removed, 2);
    }

    #[test]
    fn distinct_large_integers_are_not_duplicates() {
        let input = "id,name\n9007199254740992,x\n9007199254740993,x\n9007199254740993,x\n";
        let outcome = engine().run(load(input), true);
        assert_eq!(outcome.report.duplicate_rows_removed, 1);
        assert_eq!(outcome.removed_rows[0].row_index, 2);
        assert_eq!(
            outcome.table.rows[1].cells[0],
            CellValue::Integer(9_007_199_254_740_993)
        );
    }

    #[test]
    fn text_duplicates_compare_before_conversion() {
        // "1.0" and "1" differ as text, so both survive and convert to the same value
        let outcome = engine().run(load("a,b\n1.0,x\n1,x\nzz,\n"), true);
        assert_eq!(outcome.report.duplicate_rows_removed, 0);
        assert_eq!(outcome.report.type_conversions.numeric_columns, vec!["a".to_string()]);
        assert_eq!(outcome.table.rows[0].cells[0].key(), outcome.table.rows[1].cells[0].key());
    }

    #[test]
    fn converted_integers_stay_exact() {
        let mut table = load("v\n9007199254740993\n2\nx\n4\n5\n");
        let outcomes = convert_column_types(&mut table, 0.8);
        assert!(outcomes[0].converted);
        assert_eq!(table.rows[0].cells[0], CellValue::Integer(9_007_199_254_740_993));
    }

    #[test]
    fn converts_at_threshold() {
        let mut table = load("v\n1\n2\n3\n4\nx\n");
        let outcomes = convert_column_types(&mut table, 0.8);

        assert_eq!(outcomes.len(), 1);
        let outcome = &outcomes[0];
        assert!(outcome.converted);
        assert_eq!(outcome.success_rate, 0.8);
        assert_eq!(outcome.valid_count, 4);
        assert_eq!(outcome.non_null_count, 5);
        assert_eq!(outcome.nulls_introduced, 1);
        assert_eq!(table.columns[0].data_type, ColumnType::Numeric);
        assert_eq!(table.rows[0].cells[0], CellValue::Integer(1));
        assert_eq!(table.rows[4].cells[0], CellValue::Null);
    }

    #[test]
    fn keeps_text_below_threshold() {
        let mut table = load("v\n12\n7\nn/a\n9\n");
        let outcomes = convert_column_types(&mut table, 0.8);

        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].converted);
        assert_eq!(outcomes[0].success_rate, 0.75);
        assert_eq!(outcomes[0].valid_count, 3);
        assert_eq!(outcomes[0].non_null_count, 4);
        assert_eq!(table.columns[0].data_type, ColumnType::Text);
        assert_eq!(table.rows[0].cells[0], CellValue::Text("12".into()));
    }

    #[test]
    fn conversion_nulls_are_reported_not_removed() {
        let outcome = engine().run(load("id,v\n1,1\n2,2\n3,3\n4,4\n5,oops\n"), true);
        let report = &outcome.report;

        assert_eq!(report.rows_removed, 0);
        assert_eq!(report.cleaned_rows, 5);
        assert_eq!(report.conversion_induced_nulls, 1);
        assert_eq!(report.type_conversions.numeric_columns, vec!["v".to_string()]);
        assert_eq!(outcome.table.rows[4].cells[1], CellValue::Null);
        assert_eq!(
            report.cleaning_summary,
            "No rows with null values found. Converted 1 column(s) to numeric format. Conversion introduced 1 null value(s)."
        );
    }

    #[test]
    fn conversion_runs_without_duplicate_removal() {
        let outcome = engine().run(load("v\n1\n2\n1\n"), false);
        assert!(outcome.report.type_conversions.conversion_details.is_empty());

        let outcome = engine().run(load("v\n1\n2\nx\n1\n 3\n"), false);
        assert_eq!(outcome.report.type_conversions.numeric_columns, vec!["v".to_string()]);
        assert_eq!(outcome.report.cleaned_rows, 5);
    }

    #[test]
    fn empty_table_is_a_trivial_run() {
        let table = Table::new(
            vec![Column { name: "a".into(), data_type: ColumnType::Other }],
            Vec::new(),
        );
        let report = engine().run(table, true).report;
        assert_eq!(report.original_rows, 0);
        assert_eq!(report.removal_percentage, 0.0);
        assert_eq!(report.cleaning_summary, "Data is already clean.");
    }

    #[test]
    fn removed_sample_is_bounded() {
        let rows = (0..25)
            .map(|index| Row { index, cells: vec![CellValue::Null] })
            .collect();
        let table = Table::new(
            vec![Column { name: "a".into(), data_type: ColumnType::Other }],
            rows,
        );
        let outcome = engine().run(table, false);
        assert_eq!(outcome.report.sample_removed_rows.len(), 10);
        assert_eq!(outcome.removed_rows.len(), 25);
        assert_eq!(outcome.report.removal_percentage, 100.0);
    }

    #[test]
    fn summary_mentions_every_stage() {
        let report = engine().run(load(PEOPLE), true).report;
        assert_eq!(
            report.cleaning_summary,
            "Removed 2 rows containing null values (50%). Removed 1 duplicate rows."
        );
        assert_eq!(report.columns_with_nulls, vec!["name".to_string(), "age".to_string()]);
        assert_eq!(report.null_counts_by_column.get("id"), Some(0));
        assert_eq!(report.null_counts_by_column.get("age"), Some(1));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let first = engine().run(load(PEOPLE), true).report;
        let second = engine().run(load(PEOPLE), true).report;
        assert_eq!(first, second);
    }
}
