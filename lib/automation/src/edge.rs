//! Edge types for workflow graphs.
//!
//! An edge is a directed dependency drawn by the operator: the source node
//! must execute before the target node. Edges have no identity beyond their
//! endpoints and a creation-time ID used for rendering.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// A unique identifier for an edge within a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(Ulid);

impl EdgeId {
    /// Creates a new random edge ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Creates an edge ID from a ULID.
    #[must_use]
    pub const fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "edge_{}", self.0)
    }
}

/// The weight stored on a graph edge.
///
/// Endpoints live in the graph structure itself; the weight only carries the
/// rendering identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Creation-time identity, used by the canvas for rendering.
    pub id: EdgeId,
}

impl Edge {
    /// Creates a new edge weight with a fresh ID.
    #[must_use]
    pub fn new() -> Self {
        Self { id: EdgeId::new() }
    }
}

impl Default for Edge {
    fn default() -> Self {
        Self::new()
    }
}

/// A complete edge reference including source and target node IDs.
///
/// This is the flat external representation exchanged with the canvas UI and
/// used in serialized workflow snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRef {
    /// Creation-time identity, used by the canvas for rendering.
    #[serde(default)]
    pub id: EdgeId,
    /// The node that must execute first.
    pub source: NodeId,
    /// The node that depends on the source.
    pub target: NodeId,
}

impl EdgeRef {
    /// Creates a new edge reference with a fresh ID.
    #[must_use]
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self {
            id: EdgeId::new(),
            source,
            target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_id_display() {
        let id = EdgeId::new();
        assert!(id.to_string().starts_with("edge_"));
    }

    #[test]
    fn edge_ref_creation() {
        let source = NodeId::new();
        let target = NodeId::new();
        let edge_ref = EdgeRef::new(source, target);

        assert_eq!(edge_ref.source, source);
        assert_eq!(edge_ref.target, target);
    }

    #[test]
    fn edge_ref_serde_roundtrip() {
        let edge_ref = EdgeRef::new(NodeId::new(), NodeId::new());
        let json = serde_json::to_string(&edge_ref).expect("serialize");
        let parsed: EdgeRef = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(edge_ref, parsed);
    }
}
