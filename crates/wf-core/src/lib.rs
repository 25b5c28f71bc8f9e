//! wf-core - Core library for Weft
//!
//! This crate provides the shared types used across all Weft components:
//! the in-memory table model, the node model (transformations, joins,
//! text-analytics operations), dependency-graph ordering, table-name
//! derivation, run history, and JSON state persistence.

pub mod checksum;
pub mod config;
pub mod dag;
pub mod error;
pub mod history;
pub mod node;
pub mod project;
pub mod store;
pub mod table;
pub mod table_name;
pub mod value;

pub use checksum::{compute_checksum, table_checksum};
pub use config::{AnalyticsConfig, Config};
pub use dag::NodeDag;
pub use error::{CoreError, CoreResult};
pub use history::{RunRecord, RunStatus};
pub use node::{
    AnalysisKind, JoinKey, JoinKind, JoinOperation, Node, NodeId, NodeOp, NodeStatus, RefKind,
    TableRef, TextAnalyticsOperation, TransformationStep,
};
pub use project::{Project, ProjectId, SourceTable};
pub use store::ProjectStore;
pub use table::{ColumnType, Table};
pub use table_name::{derive_table_name, slugify, TableName};
pub use value::Value;
