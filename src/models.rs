use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;

/// Rows rendered for display, keyed by column name in column order.
pub type PreviewRow = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Text,
    /// No non-null values at all.
    Other,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Text => "text",
            ColumnType::Other => "other",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Integral fields that fit an `i64` are kept exact in `Integer`; every
/// other finite number is a `Number`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Integer(i64),
    Number(f64),
    Text(String),
    Null,
}

/// Hashable form of a cell used for duplicate detection. Numbers compare by
/// value, text verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKey<'a> {
    Integer(i64),
    Number(u64),
    Text(&'a str),
    Null,
}

// 2^63 as f64; every integral float in [-2^63, 2^63) has an exact i64.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn key(&self) -> CellKey<'_> {
        match self {
            CellValue::Integer(i) => CellKey::Integer(*i),
            // integral floats share the integer key, which also folds -0.0 into 0
            CellValue::Number(n) if n.fract() == 0.0 && *n >= -I64_BOUND && *n < I64_BOUND => {
                CellKey::Integer(*n as i64)
            }
            CellValue::Number(n) => CellKey::Number(n.to_bits()),
            CellValue::Text(s) => CellKey::Text(s),
            CellValue::Null => CellKey::Null,
        }
    }

    /// Orders two numeric cells by value. Integers compare exactly with each
    /// other. `None` when either side is not a number.
    pub fn numeric_cmp(&self, other: &CellValue) -> Option<Ordering> {
        match (self, other) {
            (CellValue::Integer(a), CellValue::Integer(b)) => Some(a.cmp(b)),
            (CellValue::Integer(a), CellValue::Number(b)) => (*a as f64).partial_cmp(b),
            (CellValue::Number(a), CellValue::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (CellValue::Number(a), CellValue::Number(b)) => a.partial_cmp(b),
            _ => None,
        }
    }

    /// Renders the cell the way it is written back to CSV. Null is empty.
    pub fn to_field(&self) -> String {
        match self {
            CellValue::Integer(i) => i.to_string(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Null => String::new(),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;
        match self {
            CellValue::Integer(i) => serializer.serialize_i64(*i),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER => {
                serializer.serialize_i64(*n as i64)
            }
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Null => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data_type: ColumnType,
}

/// One record of the table. `index` is the 0-based position in the file as
/// loaded and never changes when other rows are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub index: usize,
    pub cells: Vec<CellValue>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<Column>, rows: Vec<Row>) -> Self {
        debug_assert!(rows.iter().all(|row| row.cells.len() == columns.len()));
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_values(&self, column: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.rows.iter().map(move |row| &row.cells[column])
    }

    /// Keeps the rows whose arena position satisfies `keep`. Original row
    /// indices travel with the rows.
    pub fn filter_rows<F>(self, keep: F) -> Table
    where
        F: Fn(usize) -> bool,
    {
        let rows = self
            .rows
            .into_iter()
            .enumerate()
            .filter(|(position, _)| keep(*position))
            .map(|(_, row)| row)
            .collect();
        Table {
            columns: self.columns,
            rows,
        }
    }

    /// Full original values of a row; null cells become JSON null.
    pub fn row_data(&self, row: &Row) -> PreviewRow {
        self.columns
            .iter()
            .zip(&row.cells)
            .map(|(column, cell)| {
                let value = serde_json::to_value(cell).unwrap_or(Value::Null);
                (column.name.clone(), value)
            })
            .collect()
    }

    /// First `rows` rows with every value rendered as text, null as "".
    pub fn preview(&self, rows: usize) -> Vec<PreviewRow> {
        self.rows
            .iter()
            .take(rows)
            .map(|row| {
                self.columns
                    .iter()
                    .zip(&row.cells)
                    .map(|(column, cell)| (column.name.clone(), Value::String(cell.to_field())))
                    .collect()
            })
            .collect()
    }
}
