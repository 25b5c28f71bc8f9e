//! Spreadsheet connector seam.

use crate::error::EngineResult;
use async_trait::async_trait;
use wf_core::{SourceTable, Table};

/// Raw sheet contents as fetched from the provider: a header row and
/// string-typed cells. Typing happens when the data is turned into a
/// [`Table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetData {
    /// The first `n` rows, for source previews.
    pub fn sample(&self, n: usize) -> Vec<Vec<String>> {
        self.rows.iter().take(n).cloned().collect()
    }

    /// Parse cells into typed values. Ragged rows are padded or truncated
    /// to the header width.
    pub fn to_table(&self) -> Table {
        Table::from_raw_rows(self.columns.clone(), &self.rows)
    }
}

/// A provider of spreadsheet data. Implementations wrap a real sheets API;
/// tests and offline use read from local files or memory.
#[async_trait]
pub trait SheetConnector: Send + Sync {
    async fn fetch(&self, source: &SourceTable) -> EngineResult<SheetData>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use wf_core::Value;

    #[test]
    fn test_to_table_types_cells() {
        let sheet = SheetData {
            columns: vec!["id".to_string(), "amt".to_string()],
            rows: vec![
                vec!["1".to_string(), "9.5".to_string()],
                vec!["2".to_string()],
            ],
        };
        let table = sheet.to_table();
        assert_eq!(table.rows()[0], vec![Value::Int(1), Value::Float(9.5)]);
        assert_eq!(table.rows()[1], vec![Value::Int(2), Value::Null]);
    }

    #[test]
    fn test_sample_truncates() {
        let sheet = SheetData {
            columns: vec!["a".to_string()],
            rows: vec![vec!["1".to_string()], vec!["2".to_string()]],
        };
        assert_eq!(sheet.sample(1), vec![vec!["1".to_string()]]);
    }
}
