//! Catalog metadata for materialized tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One materialized table's metadata: kept alongside the data and replaced
/// together with it on every successful run of the owning node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseEntry {
    /// Physical table name, unique within the warehouse.
    pub table_name: String,
    pub row_count: usize,
    /// Column name -> SQL type snapshot taken at materialization time.
    pub schema: BTreeMap<String, String>,
    /// Content hash for change detection.
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
