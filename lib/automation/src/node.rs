//! Workflow node types and per-step configuration.
//!
//! Nodes are the building blocks of automation workflows. Each node has:
//! - A unique ID assigned when the operator drops it onto the canvas
//! - A step kind (which remote automation action it performs)
//! - A canvas position, used for display and for ordering tie-breaks
//! - A JSON parameter object that becomes the step's request payload

use crate::error::ParamsError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use ulid::Ulid;

/// A unique identifier for a node within a workflow.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(Ulid);

impl NodeId {
    /// Creates a new random node ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Creates a node ID from a ULID.
    #[must_use]
    pub const fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

/// The kind of automation step a node performs.
///
/// The five supported kinds map one-to-one onto remote Automation API
/// endpoints. Other kinds can appear in externally-authored workflow
/// snapshots; they are retained as [`StepKind::Unsupported`] so the canvas
/// can keep rendering them, but they cannot execute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepKind {
    /// Device discovery sweep.
    Discovery,
    /// Configuration template push.
    Template,
    /// Fault-tolerance remediation action.
    FaultTolerance,
    /// QoS autoscale adjustment.
    QosAutoscale,
    /// ACL enforcement push.
    AclEnforce,
    /// A step kind this engine does not know how to execute.
    Unsupported(String),
}

impl StepKind {
    /// Returns the wire name of this kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Discovery => "discovery",
            Self::Template => "template",
            Self::FaultTolerance => "fault-tolerance",
            Self::QosAutoscale => "qos-autoscale",
            Self::AclEnforce => "acl-enforce",
            Self::Unsupported(raw) => raw,
        }
    }

    /// Returns the Automation API endpoint suffix for this kind, or `None`
    /// for kinds that cannot execute.
    #[must_use]
    pub fn endpoint(&self) -> Option<&'static str> {
        match self {
            Self::Discovery => Some("/automation-hub/discovery"),
            Self::Template => Some("/automation-hub/template"),
            Self::FaultTolerance => Some("/automation-hub/fault-tolerance"),
            Self::QosAutoscale => Some("/automation-hub/qos-autoscale"),
            Self::AclEnforce => Some("/automation-hub/acl-enforce"),
            Self::Unsupported(_) => None,
        }
    }

    /// Returns true if this kind can be executed against the Automation API.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}

impl From<String> for StepKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "discovery" => Self::Discovery,
            "template" => Self::Template,
            "fault-tolerance" => Self::FaultTolerance,
            "qos-autoscale" => Self::QosAutoscale,
            "acl-enforce" => Self::AclEnforce,
            _ => Self::Unsupported(raw),
        }
    }
}

impl From<&str> for StepKind {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<StepKind> for String {
    fn from(kind: StepKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node's 2D canvas coordinate.
///
/// Only the horizontal component participates in execution ordering (as the
/// tie-break between simultaneously-ready nodes); the vertical component is
/// display-only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal canvas coordinate.
    pub x: f64,
    /// Vertical canvas coordinate.
    pub y: f64,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// The JSON parameter object attached to a step.
///
/// Parameters are stored as a JSON object and become the request payload for
/// the step's remote call. Operator-edited text goes through [`StepParams::parse`]
/// at edit time so malformed input is surfaced immediately; snapshots authored
/// outside the editor go through [`StepParams::parse_lenient`], where malformed
/// or non-object documents degrade to "no parameters" rather than failing the
/// run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepParams(Map<String, JsonValue>);

impl StepParams {
    /// Creates an empty parameter object.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Parses parameters from JSON text, rejecting malformed input.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid JSON or the document is not
    /// an object.
    pub fn parse(text: &str) -> Result<Self, ParamsError> {
        let value: JsonValue =
            serde_json::from_str(text).map_err(|e| ParamsError::Malformed {
                reason: e.to_string(),
            })?;
        match value {
            JsonValue::Object(map) => Ok(Self(map)),
            _ => Err(ParamsError::NotAnObject),
        }
    }

    /// Parses parameters from JSON text, degrading malformed or non-object
    /// input to the empty object.
    #[must_use]
    pub fn parse_lenient(text: &str) -> Self {
        Self::parse(text).unwrap_or_default()
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Returns true if no parameters are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the parameters as a JSON object map.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, JsonValue> {
        &self.0
    }

    /// Returns the parameters as a JSON value.
    #[must_use]
    pub fn to_value(&self) -> JsonValue {
        JsonValue::Object(self.0.clone())
    }
}

/// A workflow node: one automation step placed on the canvas.
///
/// Nodes are owned exclusively by the graph; the resolver and driver never
/// mutate them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for this node within the workflow.
    pub id: NodeId,
    /// Which automation step this node performs.
    pub kind: StepKind,
    /// Canvas position.
    #[serde(default)]
    pub position: Position,
    /// Request parameters for the step's remote call.
    #[serde(default)]
    pub params: StepParams,
}

impl Node {
    /// Creates a new node of the given kind at the given position.
    #[must_use]
    pub fn new(kind: StepKind, position: Position) -> Self {
        Self {
            id: NodeId::new(),
            kind,
            position,
            params: StepParams::new(),
        }
    }

    /// Creates a new node with a specific ID.
    #[must_use]
    pub fn with_id(id: NodeId, kind: StepKind, position: Position) -> Self {
        Self {
            id,
            kind,
            position,
            params: StepParams::new(),
        }
    }

    /// Sets the step parameters.
    #[must_use]
    pub fn with_params(mut self, params: StepParams) -> Self {
        self.params = params;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_display() {
        let id = NodeId::new();
        let display = id.to_string();
        assert!(display.starts_with("node_"));
    }

    #[test]
    fn step_kind_wire_names() {
        assert_eq!(StepKind::from("discovery"), StepKind::Discovery);
        assert_eq!(StepKind::from("template"), StepKind::Template);
        assert_eq!(StepKind::from("fault-tolerance"), StepKind::FaultTolerance);
        assert_eq!(StepKind::from("qos-autoscale"), StepKind::QosAutoscale);
        assert_eq!(StepKind::from("acl-enforce"), StepKind::AclEnforce);
    }

    #[test]
    fn unrecognized_kind_is_retained() {
        let kind = StepKind::from("firmware-rollout");
        assert_eq!(kind, StepKind::Unsupported("firmware-rollout".to_string()));
        assert_eq!(kind.as_str(), "firmware-rollout");
        assert!(!kind.is_supported());
        assert!(kind.endpoint().is_none());
    }

    #[test]
    fn supported_kinds_have_endpoints() {
        assert_eq!(
            StepKind::Discovery.endpoint(),
            Some("/automation-hub/discovery")
        );
        assert_eq!(
            StepKind::QosAutoscale.endpoint(),
            Some("/automation-hub/qos-autoscale")
        );
    }

    #[test]
    fn step_kind_serde_roundtrip() {
        let json = serde_json::to_string(&StepKind::FaultTolerance).expect("serialize");
        assert_eq!(json, "\"fault-tolerance\"");
        let parsed: StepKind = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, StepKind::FaultTolerance);

        let parsed: StepKind = serde_json::from_str("\"mystery\"").expect("deserialize");
        assert_eq!(parsed, StepKind::Unsupported("mystery".to_string()));
    }

    #[test]
    fn params_parse_rejects_malformed_json() {
        let result = StepParams::parse("{not json");
        assert!(matches!(result, Err(ParamsError::Malformed { .. })));
    }

    #[test]
    fn params_parse_rejects_non_object() {
        let result = StepParams::parse("[1, 2, 3]");
        assert_eq!(result, Err(ParamsError::NotAnObject));
    }

    #[test]
    fn params_parse_lenient_degrades_to_empty() {
        assert!(StepParams::parse_lenient("{not json").is_empty());
        assert!(StepParams::parse_lenient("42").is_empty());

        let params = StepParams::parse_lenient(r#"{"subnet": "10.0.0.0/24"}"#);
        assert_eq!(
            params.as_map().get("subnet"),
            Some(&serde_json::json!("10.0.0.0/24"))
        );
    }

    #[test]
    fn node_serde_roundtrip() {
        let node = Node::new(StepKind::Template, Position::new(120.0, 40.0)).with_params(
            StepParams::new().with_param("template", serde_json::json!("edge-router-base")),
        );
        let json = serde_json::to_string(&node).expect("serialize");
        let parsed: Node = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(node, parsed);
    }
}
