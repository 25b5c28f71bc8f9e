//! The orchestration engine: project lifecycle, source sync, and
//! dependency-ordered node execution.

use crate::connector::SheetConnector;
use crate::error::{EngineError, EngineResult};
use crate::join::execute_join;
use crate::materialize::materialize;
use crate::resolver::{self, resolve_ref};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Instant;
use tokio::sync::Mutex as TokioMutex;
use wf_analytics::{
    analyze_sentiment, summarize, CompletionClient, RetryPolicy, SentimentRequest, SummaryRequest,
};
use wf_core::{
    AnalysisKind, Config, Node, NodeDag, NodeId, NodeOp, NodeStatus, Project, ProjectId,
    ProjectStore, RunRecord, RunStatus, SourceTable, Table, TableRef,
};
use wf_db::Warehouse;

/// Rows captured into a source's preview at sync time.
const SAMPLE_ROWS: usize = 10;

/// The pipeline engine. One instance serves every project in a workspace;
/// runs within a project are serialized through a per-project lock, so a
/// second run request waits instead of erroring.
pub struct Engine {
    config: Config,
    store: ProjectStore,
    warehouse: Arc<dyn Warehouse>,
    connector: Arc<dyn SheetConnector>,
    completion: Arc<dyn CompletionClient>,
    locks: StdMutex<HashMap<u64, Arc<TokioMutex<()>>>>,
}

impl Engine {
    pub fn new(
        config: Config,
        store: ProjectStore,
        warehouse: Arc<dyn Warehouse>,
        connector: Arc<dyn SheetConnector>,
        completion: Arc<dyn CompletionClient>,
    ) -> Self {
        Self {
            config,
            store,
            warehouse,
            connector,
            completion,
            locks: StdMutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &ProjectStore {
        &self.store
    }

    // ---- project lifecycle ----

    pub fn create_project(
        &self,
        name: impl Into<String>,
        description: Option<String>,
    ) -> EngineResult<Project> {
        let id = self.store.list()?.iter().map(|p| p.0).max().unwrap_or(0) + 1;
        let mut project = Project::new(ProjectId(id), name);
        project.description = description;
        self.store.save(&project)?;
        log::info!("created project {} '{}'", project.id, project.name);
        Ok(project)
    }

    pub fn get_project(&self, id: ProjectId) -> EngineResult<Project> {
        Ok(self.store.load(id)?)
    }

    pub fn list_projects(&self) -> EngineResult<Vec<Project>> {
        self.store
            .list()?
            .into_iter()
            .map(|id| self.get_project(id))
            .collect()
    }

    pub fn history(&self, id: ProjectId, limit: usize) -> EngineResult<Vec<RunRecord>> {
        Ok(self.store.history(id, limit)?)
    }

    // ---- sources ----

    /// Register a spreadsheet source and attempt its initial sync.
    /// Registration survives a failed sync; the sync error propagates so the
    /// caller sees it.
    pub async fn add_source(
        &self,
        project_id: ProjectId,
        spreadsheet_id: impl Into<String>,
        sheet_name: impl Into<String>,
        title: impl Into<String>,
    ) -> EngineResult<SourceTable> {
        let lock = self.project_lock(project_id)?;
        let _guard = lock.lock().await;

        let mut project = self.store.load(project_id)?;
        let id = project.sources.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        project.sources.push(SourceTable {
            id,
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: sheet_name.into(),
            title: title.into(),
            columns: Vec::new(),
            sample_rows: Vec::new(),
            total_rows: 0,
            last_synced: None,
        });

        let sync_result = self.sync_source_inner(&mut project, id).await;
        project.touch();
        self.store.save(&project)?;
        sync_result?;

        project
            .source(id)
            .cloned()
            .ok_or_else(|| EngineError::Internal(format!("source {} vanished after add", id)))
    }

    /// Re-fetch a source from its spreadsheet and replace its warehouse
    /// table.
    pub async fn sync_source(&self, project_id: ProjectId, source_id: u64) -> EngineResult<()> {
        let lock = self.project_lock(project_id)?;
        let _guard = lock.lock().await;

        let mut project = self.store.load(project_id)?;
        let result = self.sync_source_inner(&mut project, source_id).await;
        project.touch();
        self.store.save(&project)?;
        result
    }

    async fn sync_source_inner(
        &self,
        project: &mut Project,
        source_id: u64,
    ) -> EngineResult<()> {
        let source = project
            .source(source_id)
            .cloned()
            .ok_or(EngineError::NotFound {
                kind: "source".to_string(),
                id: source_id,
            })?;
        let sheet = self.connector.fetch(&source).await?;
        let table = sheet.to_table();
        self.warehouse
            .store_table(source.warehouse_name().as_ref(), &table)
            .await?;

        let sample = sheet.sample(SAMPLE_ROWS);
        let total = sheet.rows.len();
        if let Some(s) = project.source_mut(source_id) {
            s.apply_sync(sheet.columns, sample, total);
        }
        log::info!("synced source {}: {} rows", source_id, total);
        Ok(())
    }

    // ---- nodes ----

    /// Create a node in draft state. Upstream references are validated here;
    /// nothing executes until the node is run explicitly.
    pub async fn create_node(
        &self,
        project_id: ProjectId,
        name: impl Into<String>,
        op: NodeOp,
        output_table: Option<String>,
    ) -> EngineResult<Node> {
        let lock = self.project_lock(project_id)?;
        let _guard = lock.lock().await;

        let mut project = self.store.load(project_id)?;
        for r in op.upstream_refs() {
            self.require_ref(&project, r)?;
        }

        let id = project.allocate_node_id();
        let mut node = Node::new(id, project.id, name, op);
        node.output_table = output_table;
        project.nodes.push(node.clone());
        project.touch();
        self.store.save(&project)?;
        log::info!("created {} node {} in project {}", node.kind(), id, project_id);
        Ok(node)
    }

    /// Execute a single node. Its upstream nodes must already be completed;
    /// a failed or never-run upstream surfaces as an error without touching
    /// the upstream itself.
    pub async fn run_node(&self, project_id: ProjectId, node_id: NodeId) -> EngineResult<Node> {
        let lock = self.project_lock(project_id)?;
        let _guard = lock.lock().await;

        let mut project = self.store.load(project_id)?;
        let result = self.execute_node(&mut project, node_id).await;
        match result {
            Ok(_) => Ok(project.require_node(node_id)?.clone()),
            Err(err) => Err(err),
        }
    }

    /// Run the whole pipeline: re-sync sources, then execute every node in
    /// dependency order, skipping nodes downstream of a failure. Exactly one
    /// history record is appended, after the run settles.
    pub async fn run_project(&self, project_id: ProjectId) -> EngineResult<RunRecord> {
        let lock = self.project_lock(project_id)?;
        let _guard = lock.lock().await;

        let mut project = self.store.load(project_id)?;
        let mut record = RunRecord::begin(project.id, project.sources.len());
        log::info!("run {} started for project {}", record.run_id, project_id);

        let source_ids: Vec<u64> = project.sources.iter().map(|s| s.id).collect();
        for sid in source_ids {
            match self.sync_source_inner(&mut project, sid).await {
                Ok(()) => record.sources_synced += 1,
                Err(err) => log::warn!("sync of source {} failed: {}", sid, err),
            }
        }
        project.touch();
        self.store.save(&project)?;

        // Stale data poisons every downstream table, so a run where most
        // sources failed to sync stops before any node executes.
        if record.sources_total > 0 && record.sources_synced * 2 < record.sources_total {
            let err = EngineError::SyncBelowThreshold {
                synced: record.sources_synced,
                total: record.sources_total,
            };
            record.finish(RunStatus::Failed, Some(err.to_string()));
            self.store.append_history(&record)?;
            return Ok(record);
        }

        let order = match NodeDag::build(&project.nodes).and_then(|dag| dag.topological_order()) {
            Ok(order) => order,
            Err(err) => {
                record.finish(RunStatus::Failed, Some(err.to_string()));
                self.store.append_history(&record)?;
                return Ok(record);
            }
        };

        let mut failed: HashSet<NodeId> = HashSet::new();
        let mut last_rows = None;
        for node_id in order {
            let failed_upstream = project
                .require_node(node_id)?
                .upstream_refs()
                .iter()
                .filter(|r| r.is_node())
                .filter_map(|r| project.node_for_ref(*r).map(|n| n.id))
                .find(|id| failed.contains(id));

            if let Some(upstream) = failed_upstream {
                let message = EngineError::DependencyFailed {
                    upstream_node_id: upstream.0,
                }
                .to_string();
                log::warn!("skipping node {}: {}", node_id, message);
                if let Some(n) = project.node_mut(node_id) {
                    n.status = NodeStatus::Failed;
                    n.error_message = Some(message);
                }
                failed.insert(node_id);
                record.nodes_failed += 1;
                continue;
            }

            match self.execute_node(&mut project, node_id).await {
                Ok(rows) => {
                    record.nodes_succeeded += 1;
                    last_rows = Some(rows);
                }
                Err(err) => {
                    log::warn!("node {} failed: {}", node_id, err);
                    failed.insert(node_id);
                    record.nodes_failed += 1;
                }
            }
        }
        project.touch();
        self.store.save(&project)?;

        record.rows_processed = last_rows;
        if record.nodes_failed == 0 {
            record.finish(RunStatus::Completed, None);
        } else {
            record.finish(
                RunStatus::Failed,
                Some(format!(
                    "{} of {} nodes failed",
                    record.nodes_failed,
                    record.nodes_failed + record.nodes_succeeded
                )),
            );
        }
        self.store.append_history(&record)?;
        log::info!(
            "run {} finished: {} ({} ok, {} failed)",
            record.run_id,
            record.status,
            record.nodes_succeeded,
            record.nodes_failed
        );
        Ok(record)
    }

    /// Fetch a node's materialized output. Only completed nodes have one.
    pub async fn get_output(&self, project_id: ProjectId, node_id: NodeId) -> EngineResult<Table> {
        let project = self.store.load(project_id)?;
        let node = project.require_node(node_id)?;
        if node.status != NodeStatus::Completed {
            return Err(EngineError::NotReady { node_id: node_id.0 });
        }
        Ok(self
            .warehouse
            .fetch_table(node.warehouse_table_name().as_ref())
            .await?)
    }

    /// Column names an upstream reference would provide, for validating a
    /// node configuration before it runs.
    pub async fn resolve_columns(
        &self,
        project_id: ProjectId,
        r: TableRef,
    ) -> EngineResult<Vec<String>> {
        let project = self.store.load(project_id)?;
        resolver::resolve_columns(&project, self.warehouse.as_ref(), r).await
    }

    /// All nodes of a project, in creation order.
    pub fn list_nodes(&self, project_id: ProjectId) -> EngineResult<Vec<Node>> {
        Ok(self.store.load(project_id)?.nodes)
    }

    // ---- internals ----

    /// Run one node inside an already-locked, already-loaded project.
    /// Transitions draft/completed/failed -> running -> completed|failed and
    /// persists after each transition. Returns the output row count.
    async fn execute_node(
        &self,
        project: &mut Project,
        node_id: NodeId,
    ) -> EngineResult<usize> {
        let node = project.require_node(node_id)?.clone();

        for r in node.upstream_refs() {
            let found = self.require_ref(project, r)?;
            if let Some(upstream) = found {
                if upstream.status != NodeStatus::Completed {
                    return Err(EngineError::DependencyFailed {
                        upstream_node_id: upstream.id.0,
                    });
                }
            }
        }

        if let Some(n) = project.node_mut(node_id) {
            n.status = NodeStatus::Running;
            n.error_message = None;
        }
        project.touch();
        self.store.save(project)?;

        let started = Instant::now();
        let mut result = self.execute_with_timeout(project, &node).await;
        if let Ok(table) = &result {
            if let Err(err) = materialize(
                self.warehouse.as_ref(),
                node.warehouse_table_name().as_ref(),
                table,
            )
            .await
            {
                result = Err(err);
            }
        }
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if let Some(n) = project.node_mut(node_id) {
            match &result {
                Ok(table) => {
                    n.status = NodeStatus::Completed;
                    n.output_columns = table.columns().to_vec();
                    n.error_message = None;
                }
                Err(err) => {
                    n.status = NodeStatus::Failed;
                    n.error_message = Some(err.to_string());
                }
            }
            n.last_run_at = Some(Utc::now());
            n.last_run_ms = Some(elapsed_ms);
        }
        project.touch();
        self.store.save(project)?;

        result.map(|table| table.row_count())
    }

    async fn execute_with_timeout(
        &self,
        project: &Project,
        node: &Node,
    ) -> EngineResult<Table> {
        match self.config.node_timeout() {
            Some(limit) => match tokio::time::timeout(limit, self.execute_op(project, node)).await
            {
                Ok(result) => result,
                Err(_) => Err(EngineError::Timeout {
                    node_id: node.id.0,
                    secs: limit.as_secs(),
                }),
            },
            None => self.execute_op(project, node).await,
        }
    }

    async fn execute_op(&self, project: &Project, node: &Node) -> EngineResult<Table> {
        match &node.op {
            NodeOp::Transformation(step) => {
                let mut inputs = Vec::with_capacity(step.inputs.len());
                for r in &step.inputs {
                    let table = self.resolve(project, *r).await?;
                    inputs.push((r.binding_name(), table));
                }
                let code = step.code.clone();
                // Scripts run on a blocking thread: they are CPU-bound and
                // must not stall the runtime, and it keeps them subject to
                // the orchestrator timeout.
                let table = tokio::task::spawn_blocking(move || {
                    wf_transform::execute(&code, &inputs)
                })
                .await
                .map_err(|e| EngineError::Internal(e.to_string()))??;
                Ok(table)
            }
            NodeOp::Join(join) => {
                let left = self.resolve(project, join.left).await?;
                let right = self.resolve(project, join.right).await?;
                execute_join(&left, &right, join.join_kind, &join.keys)
            }
            NodeOp::TextAnalytics(op) => {
                let input = self.resolve(project, op.input).await?;
                let policy = RetryPolicy::from_config(&self.config.analytics);
                let table = match op.analysis_kind {
                    AnalysisKind::Sentiment => {
                        let outcome = analyze_sentiment(
                            self.completion.as_ref(),
                            &policy,
                            SentimentRequest {
                                table: &input,
                                text_column: &op.text_column,
                                batch_size: self.config.analytics.batch_size,
                            },
                        )
                        .await?;
                        log::info!(
                            "sentiment node {}: {} rows labeled, {} blank skipped, {} failed batches",
                            node.id,
                            outcome.analyzed_rows,
                            outcome.skipped_blank,
                            outcome.failed_batches
                        );
                        outcome.table
                    }
                    AnalysisKind::Summarization => {
                        let outcome = summarize(
                            self.completion.as_ref(),
                            &policy,
                            SummaryRequest {
                                table: &input,
                                text_column: &op.text_column,
                                group_by: op.group_by.as_deref(),
                                fold_sentiment: op.fold_sentiment,
                                sentiment_column: op.sentiment_column.as_deref(),
                            },
                        )
                        .await?;
                        log::info!(
                            "summarization node {}: {} texts summarized, {} failed groups",
                            node.id,
                            outcome.summarized_texts,
                            outcome.failed_groups
                        );
                        outcome.table
                    }
                };
                Ok(table)
            }
        }
    }

    async fn resolve(&self, project: &Project, r: TableRef) -> EngineResult<Table> {
        resolve_ref(
            project,
            self.warehouse.as_ref(),
            self.connector.as_ref(),
            r,
        )
        .await
    }

    /// Check a reference points at something that exists. Returns the node
    /// for node references, None for sources.
    fn require_ref<'p>(
        &self,
        project: &'p Project,
        r: TableRef,
    ) -> EngineResult<Option<&'p Node>> {
        if r.is_node() {
            let node = project
                .node_for_ref(r)
                .ok_or_else(|| EngineError::NotFound {
                    kind: r.kind.to_string(),
                    id: r.id,
                })?;
            Ok(Some(node))
        } else {
            project.source(r.id).ok_or(EngineError::NotFound {
                kind: "source".to_string(),
                id: r.id,
            })?;
            Ok(None)
        }
    }

    fn project_lock(&self, id: ProjectId) -> EngineResult<Arc<TokioMutex<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|e| EngineError::Internal(e.to_string()))?;
        Ok(locks.entry(id.0).or_default().clone())
    }
}
