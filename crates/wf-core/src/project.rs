//! Project model: the named container of source tables and nodes.

use crate::error::{CoreError, CoreResult};
use crate::node::{Node, NodeId, RefKind, TableRef};
use crate::table_name::TableName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a project.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ProjectId(pub u64);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An imported spreadsheet registered to a project.
///
/// The column set is immutable between syncs and replaced wholesale on
/// re-sync. `sample_rows` holds the first rows captured at sync time; the
/// full data lives in the warehouse under [`SourceTable::warehouse_name`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceTable {
    pub id: u64,
    /// Opaque external spreadsheet identifier (connector-specific).
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub title: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub sample_rows: Vec<Vec<String>>,
    #[serde(default)]
    pub total_rows: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced: Option<DateTime<Utc>>,
}

impl SourceTable {
    /// Stable warehouse name the source's full data is materialized under.
    pub fn warehouse_name(&self) -> TableName {
        TableName::new(format!("source_{}", self.id))
    }

    /// Record a completed sync: replace columns, sample, and row count.
    pub fn apply_sync(&mut self, columns: Vec<String>, sample_rows: Vec<Vec<String>>, total_rows: usize) {
        self.columns = columns;
        self.sample_rows = sample_rows;
        self.total_rows = total_rows;
        self.last_synced = Some(Utc::now());
    }
}

/// A named set of source tables and nodes executed as one pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub sources: Vec<SourceTable>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Next node id to assign; monotonically increasing so table names
    /// derived from ids are never reused.
    #[serde(default)]
    pub next_node_id: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(id: ProjectId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            description: None,
            sources: Vec::new(),
            nodes: Vec::new(),
            next_node_id: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Allocate the next node id.
    pub fn allocate_node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Look up the node a non-source reference points at. The kind must
    /// match: a `join` reference never resolves to a transformation node.
    pub fn node_for_ref(&self, r: TableRef) -> Option<&Node> {
        if r.kind == RefKind::Source {
            return None;
        }
        self.nodes
            .iter()
            .find(|n| n.id.0 == r.id && n.kind() == r.kind)
    }

    pub fn source(&self, id: u64) -> Option<&SourceTable> {
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn source_mut(&mut self, id: u64) -> Option<&mut SourceTable> {
        self.sources.iter_mut().find(|s| s.id == id)
    }

    /// Find a node by id or fail with a descriptive error.
    pub fn require_node(&self, id: NodeId) -> CoreResult<&Node> {
        self.node(id).ok_or(CoreError::NodeNotFound { id: id.0 })
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeOp, TransformationStep};

    fn project_with_node() -> (Project, NodeId) {
        let mut p = Project::new(ProjectId(1), "demo");
        let id = p.allocate_node_id();
        p.nodes.push(Node::new(
            id,
            p.id,
            "step",
            NodeOp::Transformation(TransformationStep {
                code: String::new(),
                prompt: None,
                inputs: vec![],
            }),
        ));
        (p, id)
    }

    #[test]
    fn test_allocate_node_id_monotonic() {
        let mut p = Project::new(ProjectId(1), "demo");
        assert_eq!(p.allocate_node_id(), NodeId(1));
        assert_eq!(p.allocate_node_id(), NodeId(2));
    }

    #[test]
    fn test_node_for_ref_checks_kind() {
        let (p, id) = project_with_node();
        assert!(p
            .node_for_ref(TableRef::node(RefKind::Transformation, id))
            .is_some());
        assert!(p.node_for_ref(TableRef::node(RefKind::Join, id)).is_none());
        assert!(p.node_for_ref(TableRef::source(id.0)).is_none());
    }

    #[test]
    fn test_require_node_missing() {
        let (p, _) = project_with_node();
        let err = p.require_node(NodeId(99)).unwrap_err();
        assert!(err.to_string().contains("99"));
    }

    #[test]
    fn test_source_warehouse_name() {
        let s = SourceTable {
            id: 5,
            spreadsheet_id: "abc".to_string(),
            sheet_name: "Sheet1".to_string(),
            title: "Orders".to_string(),
            columns: vec![],
            sample_rows: vec![],
            total_rows: 0,
            last_synced: None,
        };
        assert_eq!(s.warehouse_name(), "source_5");
    }

    #[test]
    fn test_apply_sync_replaces_wholesale() {
        let mut s = SourceTable {
            id: 5,
            spreadsheet_id: "abc".to_string(),
            sheet_name: "Sheet1".to_string(),
            title: "Orders".to_string(),
            columns: vec!["old".to_string()],
            sample_rows: vec![vec!["1".to_string()]],
            total_rows: 1,
            last_synced: None,
        };
        s.apply_sync(
            vec!["id".to_string(), "amt".to_string()],
            vec![vec!["1".to_string(), "10".to_string()]],
            20,
        );
        assert_eq!(s.columns, vec!["id", "amt"]);
        assert_eq!(s.total_rows, 20);
        assert!(s.last_synced.is_some());
    }
}
