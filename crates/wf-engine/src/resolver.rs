//! Upstream reference resolution.
//!
//! Turns a [`TableRef`] into the table it denotes. Sources read from the
//! warehouse, falling back to a connector fetch when the source was never
//! materialized; node references only resolve once the node has completed.

use crate::connector::SheetConnector;
use crate::error::{EngineError, EngineResult};
use wf_core::{NodeStatus, Project, RefKind, Table, TableRef};
use wf_db::{DbError, Warehouse};

pub async fn resolve_ref(
    project: &Project,
    warehouse: &dyn Warehouse,
    connector: &dyn SheetConnector,
    r: TableRef,
) -> EngineResult<Table> {
    if r.kind == RefKind::Source {
        return resolve_source(project, warehouse, connector, r.id).await;
    }

    let missing = || EngineError::NotFound {
        kind: r.kind.to_string(),
        id: r.id,
    };
    let node = project.node_for_ref(r).ok_or_else(missing)?;
    // A node that never ran, or whose table is gone, reads the same as one
    // that does not exist.
    if node.status != NodeStatus::Completed {
        return Err(missing());
    }
    match warehouse
        .fetch_table(node.warehouse_table_name().as_ref())
        .await
    {
        Ok(table) => Ok(table),
        Err(DbError::TableNotFound(_)) => Err(missing()),
        Err(err) => Err(err.into()),
    }
}

/// Column names an upstream would provide, without fetching rows. Used for
/// join-key validation previews.
pub async fn resolve_columns(
    project: &Project,
    warehouse: &dyn Warehouse,
    r: TableRef,
) -> EngineResult<Vec<String>> {
    match r.kind {
        RefKind::Source => {
            let source = project.source(r.id).ok_or(EngineError::NotFound {
                kind: "source".to_string(),
                id: r.id,
            })?;
            if !source.columns.is_empty() {
                return Ok(source.columns.clone());
            }
            Ok(warehouse
                .fetch_columns(source.warehouse_name().as_ref())
                .await?)
        }
        _ => {
            let missing = || EngineError::NotFound {
                kind: r.kind.to_string(),
                id: r.id,
            };
            let node = project.node_for_ref(r).ok_or_else(missing)?;
            if node.status != NodeStatus::Completed {
                return Err(missing());
            }
            if !node.output_columns.is_empty() {
                return Ok(node.output_columns.clone());
            }
            match warehouse
                .fetch_columns(node.warehouse_table_name().as_ref())
                .await
            {
                Ok(columns) => Ok(columns),
                Err(DbError::TableNotFound(_)) => Err(missing()),
                Err(err) => Err(err.into()),
            }
        }
    }
}

async fn resolve_source(
    project: &Project,
    warehouse: &dyn Warehouse,
    connector: &dyn SheetConnector,
    id: u64,
) -> EngineResult<Table> {
    let source = project.source(id).ok_or(EngineError::NotFound {
        kind: "source".to_string(),
        id,
    })?;
    let name = source.warehouse_name();

    match warehouse.fetch_table(name.as_ref()).await {
        Ok(table) => Ok(table),
        Err(DbError::TableNotFound(_)) => {
            // Never materialized: fetch live and write through so the next
            // read hits the warehouse.
            log::info!("source {} not in warehouse, fetching from connector", id);
            let table = connector.fetch(source).await?.to_table();
            if let Err(err) = warehouse.store_table(name.as_ref(), &table).await {
                log::warn!("write-through of source {} failed: {}", id, err);
            }
            Ok(table)
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::SheetData;
    use async_trait::async_trait;
    use wf_core::{Node, NodeId, NodeOp, Project, ProjectId, SourceTable, TransformationStep};
    use wf_db::DuckDbWarehouse;

    struct NoConnector;

    #[async_trait]
    impl SheetConnector for NoConnector {
        async fn fetch(&self, source: &SourceTable) -> EngineResult<SheetData> {
            Err(EngineError::Connector {
                message: format!("no connector for source {}", source.id),
            })
        }
    }

    fn project_with_node(status: NodeStatus) -> (Project, TableRef) {
        let mut project = Project::new(ProjectId(1), "demo");
        let id = project.allocate_node_id();
        let mut node = Node::new(
            id,
            project.id,
            "step",
            NodeOp::Transformation(TransformationStep {
                code: String::new(),
                prompt: None,
                inputs: vec![],
            }),
        );
        node.status = status;
        let r = node.output_ref();
        project.nodes.push(node);
        (project, r)
    }

    fn assert_not_found(err: EngineError, id: u64) {
        match err {
            EngineError::NotFound { kind, id: got } => {
                assert_eq!(kind, "transformation");
                assert_eq!(got, id);
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_draft_node_ref_reads_as_missing() {
        let (project, r) = project_with_node(NodeStatus::Draft);
        let warehouse = DuckDbWarehouse::in_memory().unwrap();
        let err = resolve_ref(&project, &warehouse, &NoConnector, r)
            .await
            .unwrap_err();
        assert_not_found(err, NodeId(1).0);
    }

    #[tokio::test]
    async fn test_completed_node_without_table_reads_as_missing() {
        let (project, r) = project_with_node(NodeStatus::Completed);
        let warehouse = DuckDbWarehouse::in_memory().unwrap();
        let err = resolve_ref(&project, &warehouse, &NoConnector, r)
            .await
            .unwrap_err();
        assert_not_found(err, NodeId(1).0);
    }

    #[tokio::test]
    async fn test_columns_of_failed_node_read_as_missing() {
        let (project, r) = project_with_node(NodeStatus::Failed);
        let warehouse = DuckDbWarehouse::in_memory().unwrap();
        let err = resolve_columns(&project, &warehouse, r).await.unwrap_err();
        assert_not_found(err, NodeId(1).0);
    }
}
