//! Topological order resolution for workflow graphs.
//!
//! Pure functions from graph shape to a linear execution order. Resolution
//! never fails: graphs that cannot be linearized (the operator has drawn a
//! cycle) fall back to pure positional ordering so execution stays
//! best-effort instead of blocking the operator entirely. Preserve that
//! fallback; it is a deliberate design choice, not missing validation.

use crate::edge::EdgeRef;
use crate::graph::WorkflowGraph;
use crate::node::{Node, NodeId};
use std::collections::HashMap;

/// Sort key for simultaneously-ready nodes: ascending horizontal canvas
/// position, with the node ID breaking exact ties so resolution is a total
/// function of the graph, independent of insertion order.
fn canvas_key(node: &Node) -> (f64, NodeId) {
    (node.position.x, node.id)
}

/// Computes the execution order for a workflow graph.
///
/// Kahn's algorithm, with the ready set ordered by ascending `position.x`
/// so the order stays human-predictable when several nodes are ready at
/// once. If the graph contains a cycle the output of the algorithm would be
/// under-length; in that case all nodes are ordered by `position.x` alone.
///
/// Every node appears exactly once; for an acyclic graph, every edge's
/// source precedes its target. An empty graph yields an empty order.
#[must_use]
pub fn execution_order(graph: &WorkflowGraph) -> Vec<NodeId> {
    let nodes: Vec<&Node> = graph.nodes().collect();
    if nodes.is_empty() {
        return Vec::new();
    }

    let slot: HashMap<NodeId, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| (node.id, i))
        .collect();

    let mut in_degree = vec![0usize; nodes.len()];
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for edge in graph.edges() {
        // Only edges with both endpoints present contribute to ordering.
        let (Some(&source), Some(&target)) = (slot.get(&edge.source), slot.get(&edge.target))
        else {
            continue;
        };
        successors[source].push(target);
        in_degree[target] += 1;
    }

    let mut ready: Vec<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(nodes.len());

    while !ready.is_empty() {
        ready.sort_unstable_by(|&a, &b| {
            canvas_key(nodes[a])
                .partial_cmp(&canvas_key(nodes[b]))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let next = ready.remove(0);
        order.push(nodes[next].id);

        for &successor in &successors[next] {
            in_degree[successor] -= 1;
            if in_degree[successor] == 0 {
                ready.push(successor);
            }
        }
    }

    if order.len() < nodes.len() {
        // Cycle: degrade to pure positional ordering rather than failing.
        let mut all: Vec<&Node> = nodes;
        all.sort_unstable_by(|a, b| {
            canvas_key(a)
                .partial_cmp(&canvas_key(b))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        return all.into_iter().map(|node| node.id).collect();
    }

    order
}

/// Resolves the execution order from the flat node/edge lists the canvas UI
/// holds.
///
/// Edges referencing nodes not in `nodes` are ignored, mirroring the graph
/// model's snapshot leniency.
#[must_use]
pub fn resolve_order(nodes: &[Node], edges: &[EdgeRef]) -> Vec<NodeId> {
    let graph = WorkflowGraph::from_parts(nodes.to_vec(), edges.to_vec());
    execution_order(&graph)
}
