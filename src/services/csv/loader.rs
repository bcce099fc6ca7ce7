use super::utils::{is_null_field, parse_number, unique_column_name};
use crate::error::AppError;
use crate::models::{CellValue, Column, ColumnType, Row, Table};
use csv::{ReaderBuilder, Trim};
use std::collections::HashSet;

/// Strict CSV reader: comma delimiter, header row, equal-length records.
pub struct CsvLoader {
    delimiter: u8,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, file_data: &[u8]) -> Result<Table, AppError> {
        let start = std::time::Instant::now();

        let content = std::str::from_utf8(file_data).map_err(|e| {
            tracing::error!("Failed to decode CSV file: {}", e);
            AppError::Parse(
                "File encoding not supported. Please use UTF-8 encoded CSV files.".to_string(),
            )
        })?;
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        if content.trim().is_empty() {
            return Err(AppError::EmptyInput("The CSV file appears to be empty.".to_string()));
        }

        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(false)
            .trim(Trim::None)
            .from_reader(content.as_bytes());

        let headers = reader.headers()?.clone();
        let mut existing_names = HashSet::new();
        let names: Vec<String> = headers
            .iter()
            .enumerate()
            .map(|(position, name)| unique_column_name(name, position, &mut existing_names))
            .collect();

        // None marks a null field
        let mut raw_rows: Vec<Vec<Option<String>>> = Vec::new();
        for record in reader.records() {
            let record = record?;
            raw_rows.push(
                record
                    .iter()
                    .map(|field| (!is_null_field(field)).then(|| field.to_string()))
                    .collect(),
            );
        }

        if raw_rows.is_empty() {
            return Err(AppError::EmptyInput(
                "The CSV file contains a header but no data rows.".to_string(),
            ));
        }

        let column_types: Vec<ColumnType> = (0..names.len())
            .map(|idx| infer_column_type(raw_rows.iter().map(|row| row[idx].as_deref())))
            .collect();

        let rows = raw_rows
            .into_iter()
            .enumerate()
            .map(|(index, fields)| Row {
                index,
                cells: fields
                    .into_iter()
                    .zip(&column_types)
                    .map(|(field, data_type)| to_cell(field, *data_type))
                    .collect(),
            })
            .collect();

        let columns = names
            .into_iter()
            .zip(column_types)
            .map(|(name, data_type)| Column { name, data_type })
            .collect();

        let table = Table::new(columns, rows);
        tracing::info!(
            "Loaded CSV with {} rows x {} columns in {:?}",
            table.row_count(),
            table.column_count(),
            start.elapsed()
        );
        Ok(table)
    }
}

/// Numeric when every non-null value parses, other when there are none.
fn infer_column_type<'a, I>(values: I) -> ColumnType
where
    I: Iterator<Item = Option<&'a str>>,
{
    let mut seen_any = false;
    for value in values.flatten() {
        seen_any = true;
        if parse_number(value).is_none() {
            return ColumnType::Text;
        }
    }

    if seen_any {
        ColumnType::Numeric
    } else {
        ColumnType::Other
    }
}

fn to_cell(field: Option<String>, data_type: ColumnType) -> CellValue {
    match (field, data_type) {
        (None, _) | (_, ColumnType::Other) => CellValue::Null,
        (Some(raw), ColumnType::Numeric) => parse_number(&raw).unwrap_or(CellValue::Null),
        (Some(raw), ColumnType::Text) => CellValue::Text(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(input: &str) -> Result<Table, AppError> {
        CsvLoader::new().load(input.as_bytes())
    }

    #[test]
    fn infers_column_types() {
        let table = load("id,name,score,empty\n1,Alice,3.5,\n2,Bob,NaN,\n").unwrap();
        let types: Vec<ColumnType> = table.columns.iter().map(|c| c.data_type).collect();
        assert_eq!(
            types,
            vec![ColumnType::Numeric, ColumnType::Text, ColumnType::Numeric, ColumnType::Other]
        );
        assert_eq!(table.rows[0].cells[2], CellValue::Number(3.5));
        assert_eq!(table.rows[1].cells[2], CellValue::Null);
        assert_eq!(table.rows[1].cells[3], CellValue::Null);
        assert_eq!(table.rows[1].cells[0], CellValue::Integer(2));
    }

    #[test]
    fn long_integer_ids_load_exactly() {
        let table = load("id
9007199254740992
9007199254740993
").unwrap();
        assert_eq!(table.rows[0].cells[0], CellValue::Integer(9_007_199_254_740_992));
        assert_eq!(table.rows[1].cells[0], CellValue::Integer(9_007_199_254_740_993));
    }

    #[test]
    fn text_columns_keep_numeric_looking_values_as_text() {
        let table = load("code\n12\n7\nn/a\n9\n").unwrap();
        assert_eq!(table.columns[0].data_type, ColumnType::Text);
        assert_eq!(table.rows[0].cells[0], CellValue::Text("12".into()));
        assert_eq!(table.rows[2].cells[0], CellValue::Text("n/a".into()));
    }

    #[test]
    fn whitespace_only_fields_are_null() {
        let table = load("a,b\nx,   \n").unwrap();
        assert_eq!(table.rows[0].cells[1], CellValue::Null);
    }

    #[test]
    fn assigns_original_row_indices() {
        let table = load("a\n1\n2\n3\n").unwrap();
        let indices: Vec<usize> = table.rows.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn quoted_fields_and_bom() {
        let table = load("\u{feff}name,note\n\"Smith, J\",\"said \"\"hi\"\"\"\n").unwrap();
        assert_eq!(table.columns[0].name, "name");
        assert_eq!(table.rows[0].cells[0], CellValue::Text("Smith, J".into()));
        assert_eq!(table.rows[0].cells[1], CellValue::Text("said \"hi\"".into()));
    }

    #[test]
    fn duplicate_headers_are_renamed() {
        let table = load("a,a,\n1,2,3\n").unwrap();
        assert_eq!(table.column_names(), vec!["a", "a_1", "column_3"]);
    }

    #[test]
    fn header_only_is_empty_input() {
        assert!(matches!(load("id,name,age\n"), Err(AppError::EmptyInput(_))));
        assert!(matches!(load(""), Err(AppError::EmptyInput(_))));
        assert!(matches!(load("  \n\n"), Err(AppError::EmptyInput(_))));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = load("a,b,c\n1,2,3\n4,5\n").unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }

    #[test]
    fn non_utf8_is_rejected() {
        let err = CsvLoader::new().load(&[b'a', b'\n', 0xff, 0xfe, b'\n']).unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }
}
