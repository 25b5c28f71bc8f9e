//! wf-db - Warehouse abstraction for Weft
//!
//! Defines the [`Warehouse`] trait used by the engine to materialize and
//! read back tables, plus the DuckDB-backed implementation and the catalog
//! metadata kept per materialized table.

pub mod duckdb;
pub mod entry;
pub mod error;
pub mod sql;
pub mod traits;

pub use crate::duckdb::DuckDbWarehouse;
pub use entry::WarehouseEntry;
pub use error::{DbError, DbResult};
pub use traits::Warehouse;
