//! Dependency graph over a project's nodes: building and topological sorting.

use crate::error::{CoreError, CoreResult};
use crate::node::{Node, NodeId};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet};

/// A directed acyclic graph of node dependencies.
///
/// Edges run from upstream to downstream, so a topological sort yields
/// dependencies first. Source references are external inputs and do not
/// appear in the graph.
#[derive(Debug)]
pub struct NodeDag {
    graph: DiGraph<NodeId, ()>,
    node_map: HashMap<NodeId, NodeIndex>,
}

impl NodeDag {
    /// Create a new empty DAG.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Add a node to the DAG.
    pub fn add_node(&mut self, id: NodeId) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&id) {
            idx
        } else {
            let idx = self.graph.add_node(id);
            self.node_map.insert(id, idx);
            idx
        }
    }

    /// Add a dependency edge (`dependent` depends on `upstream`).
    pub fn add_dependency(&mut self, dependent: NodeId, upstream: NodeId) {
        let dependent_idx = self.add_node(dependent);
        let upstream_idx = self.add_node(upstream);
        // Edge goes from upstream to dependent so toposort yields
        // dependencies first.
        self.graph.add_edge(upstream_idx, dependent_idx, ());
    }

    /// Build the DAG from a project's nodes, wiring edges from each node's
    /// upstream references. References to nodes outside `nodes` (or to
    /// sources) add no edge.
    pub fn build(nodes: &[Node]) -> CoreResult<Self> {
        let mut dag = Self::new();
        let known: HashSet<NodeId> = nodes.iter().map(|n| n.id).collect();

        for node in nodes {
            dag.add_node(node.id);
        }

        for node in nodes {
            for upstream in node.upstream_refs() {
                if upstream.is_node() && known.contains(&NodeId(upstream.id)) {
                    dag.add_dependency(node.id, NodeId(upstream.id));
                }
            }
        }

        dag.validate()?;

        Ok(dag)
    }

    /// Validate the DAG has no cycles.
    pub fn validate(&self) -> CoreResult<()> {
        match toposort(&self.graph, None) {
            Ok(_) => Ok(()),
            Err(cycle) => Err(CoreError::CyclicDependency {
                cycle: self.find_cycle_path(cycle.node_id()),
            }),
        }
    }

    /// Find a cycle path starting from a node for error reporting.
    fn find_cycle_path(&self, start: NodeIndex) -> String {
        let mut path: Vec<String> = vec![self.graph[start].to_string()];
        let mut current = start;
        let mut visited = HashSet::new();
        visited.insert(current);

        while let Some(edge) = self.graph.edges(current).next() {
            let target = edge.target();
            path.push(self.graph[target].to_string());

            if target == start || visited.contains(&target) {
                break;
            }

            visited.insert(target);
            current = target;
        }

        path.join(" -> ")
    }

    /// Get node ids in topological order (dependencies first).
    pub fn topological_order(&self) -> CoreResult<Vec<NodeId>> {
        match toposort(&self.graph, None) {
            Ok(indices) => Ok(indices.into_iter().map(|idx| self.graph[idx]).collect()),
            Err(cycle) => Err(CoreError::CyclicDependency {
                cycle: self.find_cycle_path(cycle.node_id()),
            }),
        }
    }

    /// Direct upstream dependencies of a node.
    pub fn dependencies(&self, id: NodeId) -> Vec<NodeId> {
        if let Some(&idx) = self.node_map.get(&id) {
            self.graph
                .edges_directed(idx, petgraph::Direction::Incoming)
                .map(|e| self.graph[e.source()])
                .collect()
        } else {
            Vec::new()
        }
    }

    /// Direct downstream dependents of a node.
    pub fn dependents(&self, id: NodeId) -> Vec<NodeId> {
        if let Some(&idx) = self.node_map.get(&id) {
            self.graph
                .edges_directed(idx, petgraph::Direction::Outgoing)
                .map(|e| self.graph[e.target()])
                .collect()
        } else {
            Vec::new()
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node_map.contains_key(&id)
    }
}

impl Default for NodeDag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "dag_test.rs"]
mod tests;
