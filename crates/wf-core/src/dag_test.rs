use super::*;
use crate::node::{
    JoinKey, JoinKind, JoinOperation, NodeOp, RefKind, TableRef, TransformationStep,
};
use crate::project::ProjectId;

fn transform(id: u64, inputs: Vec<TableRef>) -> Node {
    Node::new(
        NodeId(id),
        ProjectId(1),
        format!("t{}", id),
        NodeOp::Transformation(TransformationStep {
            code: String::new(),
            prompt: None,
            inputs,
        }),
    )
}

fn join(id: u64, left: TableRef, right: TableRef) -> Node {
    Node::new(
        NodeId(id),
        ProjectId(1),
        format!("j{}", id),
        NodeOp::Join(JoinOperation {
            left,
            right,
            join_kind: JoinKind::Inner,
            keys: vec![JoinKey::new("id", "id")],
        }),
    )
}

#[test]
fn test_topological_order_dependencies_first() {
    // 3 depends on 1 and 2; 1 depends on 2. Valid order: 2, 1, 3.
    let nodes = vec![
        transform(1, vec![TableRef::node(RefKind::Transformation, NodeId(2))]),
        transform(2, vec![TableRef::source(9)]),
        join(
            3,
            TableRef::node(RefKind::Transformation, NodeId(1)),
            TableRef::node(RefKind::Transformation, NodeId(2)),
        ),
    ];
    let dag = NodeDag::build(&nodes).unwrap();
    let order = dag.topological_order().unwrap();

    let pos = |id: u64| order.iter().position(|n| *n == NodeId(id)).unwrap();
    assert!(pos(2) < pos(1));
    assert!(pos(1) < pos(3));
    assert!(pos(2) < pos(3));
}

#[test]
fn test_order_ignores_creation_order() {
    // The downstream node has the smaller id; ordering must still follow
    // dependency edges, not id/creation order.
    let nodes = vec![
        transform(1, vec![TableRef::node(RefKind::Transformation, NodeId(5))]),
        transform(5, vec![TableRef::source(9)]),
    ];
    let dag = NodeDag::build(&nodes).unwrap();
    let order = dag.topological_order().unwrap();
    assert_eq!(order, vec![NodeId(5), NodeId(1)]);
}

#[test]
fn test_cycle_detected_at_build() {
    let nodes = vec![
        transform(1, vec![TableRef::node(RefKind::Transformation, NodeId(2))]),
        transform(2, vec![TableRef::node(RefKind::Transformation, NodeId(1))]),
    ];
    let err = NodeDag::build(&nodes).unwrap_err();
    match err {
        CoreError::CyclicDependency { cycle } => {
            assert!(cycle.contains("1"));
            assert!(cycle.contains("2"));
            assert!(cycle.contains("->"));
        }
        other => panic!("expected CyclicDependency, got {other}"),
    }
}

#[test]
fn test_self_cycle_detected() {
    let nodes = vec![transform(
        1,
        vec![TableRef::node(RefKind::Transformation, NodeId(1))],
    )];
    assert!(NodeDag::build(&nodes).is_err());
}

#[test]
fn test_source_refs_add_no_edges() {
    let nodes = vec![transform(1, vec![TableRef::source(7), TableRef::source(8)])];
    let dag = NodeDag::build(&nodes).unwrap();
    assert!(dag.dependencies(NodeId(1)).is_empty());
}

#[test]
fn test_unknown_upstream_node_adds_no_edge() {
    // Reference to a node that is not part of this project's node set.
    let nodes = vec![transform(
        1,
        vec![TableRef::node(RefKind::Transformation, NodeId(42))],
    )];
    let dag = NodeDag::build(&nodes).unwrap();
    assert!(dag.dependencies(NodeId(1)).is_empty());
    assert!(!dag.contains(NodeId(42)));
}

#[test]
fn test_dependents_and_dependencies() {
    let nodes = vec![
        transform(1, vec![TableRef::source(9)]),
        transform(2, vec![TableRef::node(RefKind::Transformation, NodeId(1))]),
        transform(3, vec![TableRef::node(RefKind::Transformation, NodeId(1))]),
    ];
    let dag = NodeDag::build(&nodes).unwrap();
    let mut dependents = dag.dependents(NodeId(1));
    dependents.sort();
    assert_eq!(dependents, vec![NodeId(2), NodeId(3)]);
    assert_eq!(dag.dependencies(NodeId(2)), vec![NodeId(1)]);
}
