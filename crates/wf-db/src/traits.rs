//! Warehouse trait definition

use crate::entry::WarehouseEntry;
use crate::error::DbResult;
use async_trait::async_trait;
use wf_core::Table;

/// Warehouse abstraction for Weft.
///
/// The warehouse holds every source table and node output under a stable
/// name. Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Materialize a table under `name`, destructively replacing any prior
    /// contents. Data and catalog metadata are written together: callers
    /// either see the new table with its new entry, or the old one.
    async fn store_table(&self, name: &str, table: &Table) -> DbResult<WarehouseEntry>;

    /// Read back a full table by name.
    async fn fetch_table(&self, name: &str) -> DbResult<Table>;

    /// Column names of a stored table, in physical order, without fetching
    /// rows.
    async fn fetch_columns(&self, name: &str) -> DbResult<Vec<String>>;

    /// Check whether a table exists.
    async fn table_exists(&self, name: &str) -> DbResult<bool>;

    /// Catalog metadata for a table, if it was materialized through this
    /// warehouse.
    async fn entry(&self, name: &str) -> DbResult<Option<WarehouseEntry>>;

    /// Drop a table and its catalog entry if present.
    async fn drop_table(&self, name: &str) -> DbResult<()>;

    /// Backend identifier for logging.
    fn backend_type(&self) -> &'static str;
}
