//! Node model: the executable units of a project.
//!
//! A node is one step in a project's dependency graph. The three operation
//! kinds form a closed tagged union ([`NodeOp`]) rather than kind-string
//! branching: orchestration code dispatches once, on the enum.

use crate::project::ProjectId;
use crate::table_name::{derive_table_name, slugify, TableName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a node within a project.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind half of an upstream reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefKind {
    Source,
    Transformation,
    Join,
    TextAnalytics,
}

impl RefKind {
    /// Identifier-safe prefix for script binding names (`{kind}_{id}`).
    pub fn binding_prefix(&self) -> &'static str {
        match self {
            RefKind::Source => "source",
            RefKind::Transformation => "transformation",
            RefKind::Join => "join",
            RefKind::TextAnalytics => "text_analytics",
        }
    }
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefKind::Source => write!(f, "source"),
            RefKind::Transformation => write!(f, "transformation"),
            RefKind::Join => write!(f, "join"),
            RefKind::TextAnalytics => write!(f, "text-analytics"),
        }
    }
}

/// An upstream reference: a pointer from a node to the table it consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub kind: RefKind,
    pub id: u64,
}

impl TableRef {
    pub fn source(id: u64) -> Self {
        Self {
            kind: RefKind::Source,
            id,
        }
    }

    pub fn node(kind: RefKind, id: NodeId) -> Self {
        Self { kind, id: id.0 }
    }

    /// Binding name under which this input is exposed to transformation code.
    pub fn binding_name(&self) -> String {
        format!("{}_{}", self.kind.binding_prefix(), self.id)
    }

    /// True when the reference points at another node rather than a source.
    pub fn is_node(&self) -> bool {
        !matches!(self.kind, RefKind::Source)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// Lifecycle status of a node.
///
/// `Completed` means the node's output table currently exists in the
/// warehouse and matches the last successful run. A failed re-run keeps the
/// old table queryable but flips status to `Failed` — callers must check
/// status, not table existence, before trusting output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Draft,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeStatus::Draft => write!(f, "draft"),
            NodeStatus::Running => write!(f, "running"),
            NodeStatus::Completed => write!(f, "completed"),
            NodeStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Relational join kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinKind::Inner => write!(f, "inner"),
            JoinKind::Left => write!(f, "left"),
            JoinKind::Right => write!(f, "right"),
            JoinKind::Full => write!(f, "full"),
        }
    }
}

/// One equality pair in a join's key list. All pairs match conjunctively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinKey {
    pub left_key: String,
    pub right_key: String,
}

impl JoinKey {
    pub fn new(left_key: impl Into<String>, right_key: impl Into<String>) -> Self {
        Self {
            left_key: left_key.into(),
            right_key: right_key.into(),
        }
    }
}

/// Text-analytics analysis kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Sentiment,
    Summarization,
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisKind::Sentiment => write!(f, "sentiment"),
            AnalysisKind::Summarization => write!(f, "summarization"),
        }
    }
}

/// A script transformation step.
///
/// `prompt` is provenance only — the free-form request that produced the
/// code. It is stored but never executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationStep {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub inputs: Vec<TableRef>,
}

/// A relational join between two upstream tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinOperation {
    pub left: TableRef,
    pub right: TableRef,
    pub join_kind: JoinKind,
    pub keys: Vec<JoinKey>,
}

/// A batched text-analytics aggregation over one upstream table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAnalyticsOperation {
    pub input: TableRef,
    pub text_column: String,
    pub analysis_kind: AnalysisKind,
    /// Group-by column (summarization only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    /// Fold sentiment counts/percentages into summarization output rows.
    #[serde(default)]
    pub fold_sentiment: bool,
    /// Sentiment-label column used when `fold_sentiment` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_column: Option<String>,
}

/// Operation payload: the closed union over the three node kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum NodeOp {
    Transformation(TransformationStep),
    Join(JoinOperation),
    TextAnalytics(TextAnalyticsOperation),
}

impl NodeOp {
    pub fn kind(&self) -> RefKind {
        match self {
            NodeOp::Transformation(_) => RefKind::Transformation,
            NodeOp::Join(_) => RefKind::Join,
            NodeOp::TextAnalytics(_) => RefKind::TextAnalytics,
        }
    }

    /// All upstream references consumed by this operation, in binding order.
    pub fn upstream_refs(&self) -> Vec<TableRef> {
        match self {
            NodeOp::Transformation(t) => t.inputs.clone(),
            NodeOp::Join(j) => vec![j.left, j.right],
            NodeOp::TextAnalytics(a) => vec![a.input],
        }
    }
}

/// One executable unit in a project's dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub project_id: ProjectId,
    pub name: String,
    /// User-supplied output table name; when absent the name is derived
    /// deterministically from kind and id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_table: Option<String>,
    pub status: NodeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_ms: Option<u64>,
    /// Populated only after a successful run.
    #[serde(default)]
    pub output_columns: Vec<String>,
    #[serde(flatten)]
    pub op: NodeOp,
}

impl Node {
    /// Create a new draft node. Nodes are never auto-executed on creation.
    pub fn new(id: NodeId, project_id: ProjectId, name: impl Into<String>, op: NodeOp) -> Self {
        Self {
            id,
            project_id,
            name: name.into(),
            output_table: None,
            status: NodeStatus::Draft,
            error_message: None,
            last_run_at: None,
            last_run_ms: None,
            output_columns: Vec::new(),
            op,
        }
    }

    pub fn kind(&self) -> RefKind {
        self.op.kind()
    }

    pub fn upstream_refs(&self) -> Vec<TableRef> {
        self.op.upstream_refs()
    }

    /// The physical warehouse table name this node materializes into.
    ///
    /// Stable across runs: a custom name is slugged the same way every time,
    /// and the fallback derives from kind and id only, so re-execution always
    /// overwrites the same table.
    pub fn warehouse_table_name(&self) -> TableName {
        match &self.output_table {
            Some(custom) if !slugify(custom).is_empty() => TableName::new(slugify(custom)),
            _ => derive_table_name(self.kind(), self.id.0),
        }
    }

    /// Reference to this node's output, usable as another node's upstream.
    pub fn output_ref(&self) -> TableRef {
        TableRef::node(self.kind(), self.id)
    }
}
