//! In-memory tabular dataset.

use crate::error::{CoreError, CoreResult};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inferred column type for warehouse schema snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Boolean,
    Integer,
    Double,
    Varchar,
}

impl ColumnType {
    /// SQL type name used when creating warehouse tables.
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Integer => "BIGINT",
            ColumnType::Double => "DOUBLE",
            ColumnType::Varchar => "VARCHAR",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.sql_type())
    }
}

/// An in-memory table: ordered column names plus rows of [`Value`] cells.
///
/// Every row has exactly as many cells as there are columns; the invariant is
/// enforced at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from typed rows, validating row widths.
    pub fn with_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> CoreResult<Self> {
        let width = columns.len();
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(CoreError::RowWidthMismatch {
                    row: i,
                    expected: width,
                    found: row.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Build a table from raw connector rows (strings), applying numeric
    /// inference per cell. Short rows are padded with nulls, long rows
    /// truncated — spreadsheet ranges are ragged at the edges.
    pub fn from_raw_rows(columns: Vec<String>, raw_rows: &[Vec<String>]) -> Self {
        let width = columns.len();
        let rows = raw_rows
            .iter()
            .map(|raw| {
                let mut row: Vec<Value> = raw
                    .iter()
                    .take(width)
                    .map(|cell| Value::from_raw(cell))
                    .collect();
                row.resize(width, Value::Null);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Append a row, validating its width.
    pub fn push_row(&mut self, row: Vec<Value>) -> CoreResult<()> {
        if row.len() != self.columns.len() {
            return Err(CoreError::RowWidthMismatch {
                row: self.rows.len(),
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// All values of one column, in row order.
    pub fn column_values(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Infer a column -> type schema snapshot.
    ///
    /// A column is typed by the narrowest type that fits every non-null cell;
    /// mixed or all-null columns fall back to `VARCHAR`. Integer cells widen
    /// to `DOUBLE` when the column also contains floats.
    pub fn infer_schema(&self) -> BTreeMap<String, ColumnType> {
        let mut schema = BTreeMap::new();
        for (idx, name) in self.columns.iter().enumerate() {
            let mut inferred: Option<ColumnType> = None;
            for row in &self.rows {
                let cell_type = match &row[idx] {
                    Value::Null => continue,
                    Value::Bool(_) => ColumnType::Boolean,
                    Value::Int(_) => ColumnType::Integer,
                    Value::Float(_) => ColumnType::Double,
                    Value::Text(_) => ColumnType::Varchar,
                };
                inferred = Some(match inferred {
                    None => cell_type,
                    Some(prev) if prev == cell_type => prev,
                    Some(ColumnType::Integer) if cell_type == ColumnType::Double => {
                        ColumnType::Double
                    }
                    Some(ColumnType::Double) if cell_type == ColumnType::Integer => {
                        ColumnType::Double
                    }
                    Some(_) => ColumnType::Varchar,
                });
                if inferred == Some(ColumnType::Varchar) {
                    break;
                }
            }
            schema.insert(name.clone(), inferred.unwrap_or(ColumnType::Varchar));
        }
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::with_rows(
            vec!["id".to_string(), "amt".to_string()],
            vec![
                vec![Value::Int(1), Value::Int(10)],
                vec![Value::Int(2), Value::Int(20)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_row_width_enforced() {
        let mut t = Table::new(vec!["a".to_string(), "b".to_string()]);
        assert!(t.push_row(vec![Value::Int(1)]).is_err());
        assert!(t.push_row(vec![Value::Int(1), Value::Int(2)]).is_ok());
    }

    #[test]
    fn test_from_raw_rows_pads_and_truncates() {
        let t = Table::from_raw_rows(
            vec!["a".to_string(), "b".to_string()],
            &[
                vec!["1".to_string()],
                vec!["2".to_string(), "x".to_string(), "extra".to_string()],
            ],
        );
        assert_eq!(t.row_count(), 2);
        assert_eq!(t.rows()[0], vec![Value::Int(1), Value::Null]);
        assert_eq!(t.rows()[1], vec![Value::Int(2), Value::Text("x".to_string())]);
    }

    #[test]
    fn test_column_lookup() {
        let t = sample();
        assert_eq!(t.column_index("amt"), Some(1));
        assert_eq!(t.column_index("missing"), None);
        let values = t.column_values("id").unwrap();
        assert_eq!(values, vec![&Value::Int(1), &Value::Int(2)]);
    }

    #[test]
    fn test_infer_schema() {
        let t = Table::with_rows(
            vec![
                "i".to_string(),
                "f".to_string(),
                "mixed".to_string(),
                "empty".to_string(),
            ],
            vec![
                vec![
                    Value::Int(1),
                    Value::Float(1.5),
                    Value::Int(1),
                    Value::Null,
                ],
                vec![
                    Value::Int(2),
                    Value::Int(2),
                    Value::Text("x".to_string()),
                    Value::Null,
                ],
            ],
        )
        .unwrap();
        let schema = t.infer_schema();
        assert_eq!(schema["i"], ColumnType::Integer);
        assert_eq!(schema["f"], ColumnType::Double);
        assert_eq!(schema["mixed"], ColumnType::Varchar);
        assert_eq!(schema["empty"], ColumnType::Varchar);
    }
}
