//! Workflow graph implementation using petgraph.
//!
//! Workflows are directed graphs where:
//! - Nodes are automation steps placed on the canvas
//! - Edges are dependency arrows drawn between steps
//!
//! The graph owns the referential invariant: every edge's endpoints are
//! nodes currently present in the graph. Removing a node drops its incident
//! edges with it (petgraph does this structurally), and edges referencing
//! unknown nodes are rejected at insertion. Dangling edges can only appear
//! in externally-authored snapshots, where they are silently skipped.

use crate::edge::{Edge, EdgeId, EdgeRef};
use crate::error::GraphError;
use crate::node::{Node, NodeId};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef as _;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A workflow graph using petgraph's directed graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowGraph {
    /// The underlying directed graph.
    #[serde(with = "graph_serde")]
    graph: DiGraph<Node, Edge>,
    /// Map from NodeId to petgraph's NodeIndex for O(1) lookup.
    #[serde(skip)]
    node_index_map: HashMap<NodeId, NodeIndex>,
}

impl WorkflowGraph {
    /// Creates a new empty workflow graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_index_map: HashMap::new(),
        }
    }

    /// Builds a graph from the flat node/edge lists exchanged with the
    /// canvas UI.
    ///
    /// Edges whose endpoints are not among the given nodes are silently
    /// skipped; this is the documented leniency for externally-authored
    /// snapshots.
    #[must_use]
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<EdgeRef>) -> Self {
        let mut graph = Self::new();
        for node in nodes {
            graph.add_node(node);
        }
        for edge in edges {
            let (Some(&source), Some(&target)) = (
                graph.node_index_map.get(&edge.source),
                graph.node_index_map.get(&edge.target),
            ) else {
                continue;
            };
            graph.graph.add_edge(source, target, Edge { id: edge.id });
        }
        graph
    }

    /// Adds a node to the graph.
    ///
    /// Returns the node ID.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let node_id = node.id;
        let index = self.graph.add_node(node);
        self.node_index_map.insert(node_id, index);
        node_id
    }

    /// Removes a node from the graph.
    ///
    /// Also removes all edges connected to this node.
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        let index = self.node_index_map.remove(&node_id)?;
        let removed = self.graph.remove_node(index);
        // petgraph swap-removes: the last node takes the freed index.
        if let Some(moved) = self.graph.node_weight(index) {
            self.node_index_map.insert(moved.id, index);
        }
        removed
    }

    /// Returns a reference to a node by its ID.
    #[must_use]
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        let index = self.node_index_map.get(&node_id)?;
        self.graph.node_weight(*index)
    }

    /// Returns a mutable reference to a node by its ID.
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        let index = self.node_index_map.get(&node_id)?;
        self.graph.node_weight_mut(*index)
    }

    /// Adds a dependency edge between two nodes.
    ///
    /// Returns the new edge's ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the source or target node doesn't exist.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId) -> Result<EdgeId, GraphError> {
        let source_index = self
            .node_index_map
            .get(&source)
            .ok_or(GraphError::NodeNotFound { node_id: source })?;
        let target_index = self
            .node_index_map
            .get(&target)
            .ok_or(GraphError::NodeNotFound { node_id: target })?;

        let edge = Edge::new();
        let edge_id = edge.id;
        self.graph.add_edge(*source_index, *target_index, edge);
        Ok(edge_id)
    }

    /// Removes the graph's contents, modelling a canvas reset.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.node_index_map.clear();
    }

    /// Returns all nodes in the graph.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    /// Returns all edges as flat references.
    pub fn edges(&self) -> impl Iterator<Item = EdgeRef> + '_ {
        self.graph.edge_references().filter_map(|edge| {
            let source = self.graph.node_weight(edge.source())?.id;
            let target = self.graph.node_weight(edge.target())?.id;
            Some(EdgeRef {
                id: edge.weight().id,
                source,
                target,
            })
        })
    }

    /// Returns the number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns the successors (downstream nodes) of a given node.
    pub fn successors(&self, node_id: NodeId) -> Vec<&Node> {
        let Some(&index) = self.node_index_map.get(&node_id) else {
            return Vec::new();
        };

        self.graph
            .edges_directed(index, Direction::Outgoing)
            .filter_map(|edge| self.graph.node_weight(edge.target()))
            .collect()
    }

    /// Returns the predecessors (upstream nodes) of a given node.
    pub fn predecessors(&self, node_id: NodeId) -> Vec<&Node> {
        let Some(&index) = self.node_index_map.get(&node_id) else {
            return Vec::new();
        };

        self.graph
            .edges_directed(index, Direction::Incoming)
            .filter_map(|edge| self.graph.node_weight(edge.source()))
            .collect()
    }

    /// Returns true if the graph contains a directed cycle.
    #[must_use]
    pub fn is_cyclic(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.graph)
    }

    /// Rebuilds the node index map after deserialization.
    pub fn rebuild_index_map(&mut self) {
        self.node_index_map.clear();
        for index in self.graph.node_indices() {
            if let Some(node) = self.graph.node_weight(index) {
                self.node_index_map.insert(node.id, index);
            }
        }
    }
}

impl Default for WorkflowGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Custom serde for petgraph DiGraph: flat node/edge lists, matching the
/// shape the canvas UI exchanges.
mod graph_serde {
    use super::*;
    use petgraph::visit::EdgeRef as _;
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeStruct;

    pub fn serialize<S>(graph: &DiGraph<Node, Edge>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let nodes: Vec<_> = graph.node_weights().cloned().collect();
        let edges: Vec<_> = graph
            .edge_references()
            .filter_map(|e| {
                let source = graph.node_weight(e.source())?.id;
                let target = graph.node_weight(e.target())?.id;
                Some(EdgeRef {
                    id: e.weight().id,
                    source,
                    target,
                })
            })
            .collect();

        let mut state = serializer.serialize_struct("Graph", 2)?;
        state.serialize_field("nodes", &nodes)?;
        state.serialize_field("edges", &edges)?;
        state.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DiGraph<Node, Edge>, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct GraphVisitor;

        impl<'de> Visitor<'de> for GraphVisitor {
            type Value = DiGraph<Node, Edge>;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a workflow graph with nodes and edges")
            }

            fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut nodes: Option<Vec<Node>> = None;
                let mut edges: Option<Vec<EdgeRef>> = None;

                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "nodes" => nodes = Some(map.next_value()?),
                        "edges" => edges = Some(map.next_value()?),
                        _ => {
                            let _ = map.next_value::<serde::de::IgnoredAny>()?;
                        }
                    }
                }

                let nodes = nodes.unwrap_or_default();
                let edges = edges.unwrap_or_default();

                let mut graph = DiGraph::new();
                let mut id_to_index = HashMap::new();

                for node in nodes {
                    let id = node.id;
                    let index = graph.add_node(node);
                    id_to_index.insert(id, index);
                }

                for edge in edges {
                    let (Some(&source), Some(&target)) =
                        (id_to_index.get(&edge.source), id_to_index.get(&edge.target))
                    else {
                        // Dangling edges in external snapshots are dropped.
                        continue;
                    };
                    graph.add_edge(source, target, Edge { id: edge.id });
                }

                Ok(graph)
            }
        }

        deserializer.deserialize_struct("Graph", &["nodes", "edges"], GraphVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Position, StepKind};

    fn place(kind: StepKind, x: f64) -> Node {
        Node::new(kind, Position::new(x, 0.0))
    }

    #[test]
    fn add_and_get_node() {
        let mut graph = WorkflowGraph::new();
        let node = place(StepKind::Discovery, 10.0);
        let node_id = node.id;
        graph.add_node(node);

        let retrieved = graph.node(node_id);
        assert!(retrieved.is_some());
        assert_eq!(retrieved.unwrap().kind, StepKind::Discovery);
    }

    #[test]
    fn add_edge_rejects_missing_endpoint() {
        let mut graph = WorkflowGraph::new();
        let discovery = place(StepKind::Discovery, 0.0);
        let discovery_id = discovery.id;
        graph.add_node(discovery);

        let result = graph.add_edge(discovery_id, NodeId::new());
        assert!(matches!(result, Err(GraphError::NodeNotFound { .. })));
    }

    #[test]
    fn remove_node_drops_incident_edges() {
        let mut graph = WorkflowGraph::new();
        let a = place(StepKind::Discovery, 0.0);
        let b = place(StepKind::Template, 100.0);
        let c = place(StepKind::AclEnforce, 200.0);
        let (id_a, id_b, id_c) = (a.id, b.id, c.id);

        graph.add_node(a);
        graph.add_node(b);
        graph.add_node(c);
        graph.add_edge(id_a, id_b).unwrap();
        graph.add_edge(id_b, id_c).unwrap();

        let removed = graph.remove_node(id_b);
        assert!(removed.is_some());
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn remove_node_keeps_lookup_consistent() {
        // petgraph swap-removes, so the last node's index changes; every
        // surviving node must stay reachable by ID.
        let mut graph = WorkflowGraph::new();
        let ids: Vec<NodeId> = (0..4)
            .map(|i| graph.add_node(place(StepKind::Discovery, f64::from(i) * 10.0)))
            .collect();

        graph.remove_node(ids[0]);

        assert!(graph.node(ids[0]).is_none());
        for &id in &ids[1..] {
            assert_eq!(graph.node(id).map(|n| n.id), Some(id));
        }
    }

    #[test]
    fn from_parts_skips_dangling_edges() {
        let a = place(StepKind::Discovery, 0.0);
        let b = place(StepKind::Template, 100.0);
        let (id_a, id_b) = (a.id, b.id);

        let edges = vec![
            EdgeRef::new(id_a, id_b),
            EdgeRef::new(id_a, NodeId::new()), // target was removed
            EdgeRef::new(NodeId::new(), id_b), // source was removed
        ];
        let graph = WorkflowGraph::from_parts(vec![a, b], edges);

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn clear_resets_canvas() {
        let mut graph = WorkflowGraph::new();
        let a = place(StepKind::Discovery, 0.0);
        let b = place(StepKind::Template, 100.0);
        let (id_a, id_b) = (a.id, b.id);
        graph.add_node(a);
        graph.add_node(b);
        graph.add_edge(id_a, id_b).unwrap();

        graph.clear();

        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.node(id_a).is_none());
    }

    #[test]
    fn successors_and_predecessors() {
        let mut graph = WorkflowGraph::new();
        let a = place(StepKind::Discovery, 0.0);
        let b = place(StepKind::Template, 100.0);
        let (id_a, id_b) = (a.id, b.id);
        graph.add_node(a);
        graph.add_node(b);
        graph.add_edge(id_a, id_b).unwrap();

        let successors = graph.successors(id_a);
        assert_eq!(successors.len(), 1);
        assert_eq!(successors[0].id, id_b);

        let predecessors = graph.predecessors(id_b);
        assert_eq!(predecessors.len(), 1);
        assert_eq!(predecessors[0].id, id_a);
    }

    #[test]
    fn cycle_detection() {
        let mut graph = WorkflowGraph::new();
        let a = place(StepKind::Discovery, 0.0);
        let b = place(StepKind::Template, 100.0);
        let (id_a, id_b) = (a.id, b.id);
        graph.add_node(a);
        graph.add_node(b);
        graph.add_edge(id_a, id_b).unwrap();
        assert!(!graph.is_cyclic());

        graph.add_edge(id_b, id_a).unwrap();
        assert!(graph.is_cyclic());
    }

    #[test]
    fn graph_serde_roundtrip() {
        let mut graph = WorkflowGraph::new();
        let a = place(StepKind::Discovery, 0.0);
        let b = place(StepKind::Template, 100.0);
        let (id_a, id_b) = (a.id, b.id);
        graph.add_node(a);
        graph.add_node(b);
        graph.add_edge(id_a, id_b).unwrap();

        let json = serde_json::to_string(&graph).expect("serialize");
        let mut parsed: WorkflowGraph = serde_json::from_str(&json).expect("deserialize");
        parsed.rebuild_index_map();

        assert_eq!(parsed.node_count(), 2);
        assert_eq!(parsed.edge_count(), 1);
        assert!(parsed.node(id_a).is_some());
        assert!(parsed.node(id_b).is_some());
    }
}
