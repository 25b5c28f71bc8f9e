//! Weft's orchestration engine.
//!
//! Ties the pieces together: spreadsheet sources sync into the warehouse,
//! nodes (transformations, joins, text analytics) execute in dependency
//! order, and every node output materializes under a stable table name.

pub mod connector;
pub mod engine;
pub mod error;
pub mod join;
pub mod materialize;
pub mod resolver;

pub use connector::{SheetConnector, SheetData};
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use join::execute_join;
