//! File-backed sheet connector.
//!
//! Reads spreadsheet snapshots from `sheets/<spreadsheet_id>.json`, each a
//! JSON object with `columns` and string-typed `rows`. Stands in for a live
//! sheets API in offline and test use; the sheet name is recorded on the
//! source but a snapshot file holds exactly one sheet.

use async_trait::async_trait;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use wf_core::SourceTable;
use wf_engine::{EngineError, EngineResult, SheetConnector, SheetData};

pub struct FileConnector {
    root: PathBuf,
}

impl FileConnector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[derive(Debug, Deserialize)]
struct SheetFile {
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<String>>,
}

#[async_trait]
impl SheetConnector for FileConnector {
    async fn fetch(&self, source: &SourceTable) -> EngineResult<SheetData> {
        let path = self.root.join(format!("{}.json", source.spreadsheet_id));
        let content = fs::read_to_string(&path).map_err(|e| EngineError::Connector {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        let file: SheetFile =
            serde_json::from_str(&content).map_err(|e| EngineError::Connector {
                message: format!("{} is not a valid sheet snapshot: {}", path.display(), e),
            })?;
        Ok(SheetData {
            columns: file.columns,
            rows: file.rows,
        })
    }
}
