//! Node output materialization.

use crate::error::EngineResult;
use wf_core::Table;
use wf_db::{Warehouse, WarehouseEntry};

/// Write a node's output into the warehouse, replacing any previous run's
/// table of the same name.
pub async fn materialize(
    warehouse: &dyn Warehouse,
    name: &str,
    table: &Table,
) -> EngineResult<WarehouseEntry> {
    let entry = warehouse.store_table(name, table).await?;
    log::info!(
        "materialized '{}': {} rows, hash {}",
        name,
        entry.row_count,
        &entry.content_hash[..12.min(entry.content_hash.len())]
    );
    Ok(entry)
}
