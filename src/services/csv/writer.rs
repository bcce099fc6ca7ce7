use crate::error::AppError;
use crate::models::Table;
use csv::{QuoteStyle, WriterBuilder};

/// Serialises a table with the same conventions the loader reads: comma
/// delimiter, header row, quoting only where needed, nulls as empty fields.
pub fn write_table(table: &Table) -> Result<Vec<u8>, AppError> {
    let mut writer = WriterBuilder::new()
        .delimiter(b',')
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer
        .write_record(table.columns.iter().map(|c| c.name.as_str()))
        .map_err(write_error)?;

    for row in &table.rows {
        writer
            .write_record(row.cells.iter().map(|cell| cell.to_field()))
            .map_err(write_error)?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Failed to flush CSV output: {}", e)))
}

fn write_error(err: csv::Error) -> AppError {
    AppError::Internal(format!("Failed to write CSV output: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::csv::CsvLoader;

    #[test]
    fn writes_back_what_it_loaded() {
        let input = "id,name,score\n1,\"Smith, J\",2.5\n2,Bob,3\n";
        let table = CsvLoader::new().load(input.as_bytes()).unwrap();
        let output = String::from_utf8(write_table(&table).unwrap()).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn nulls_become_empty_fields() {
        let table = CsvLoader::new().load(b"a,b\n1,\n").unwrap();
        let output = String::from_utf8(write_table(&table).unwrap()).unwrap();
        assert_eq!(output, "a,b\n1,\n");
    }

    #[test]
    fn large_integers_are_written_exactly() {
        let input = "id,name\n9007199254740992,x\n9007199254740993,x\n";
        let table = CsvLoader::new().load(input.as_bytes()).unwrap();
        let output = String::from_utf8(write_table(&table).unwrap()).unwrap();
        assert_eq!(output, input);
    }
}
