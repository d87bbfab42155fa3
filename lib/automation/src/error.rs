//! Error types for the automation crate.
//!
//! Each layer keeps its own error type:
//! - `GraphError`: graph mutations that would break referential integrity
//! - `ParamsError`: edit-time validation of step parameter text
//! - `StepCallError`: failures reaching the remote Automation API
//!
//! Note that resolving an execution order and driving a run never return
//! errors: unresolvable graphs degrade to the positional fallback, and call
//! failures are captured in the run log rather than propagated.

use crate::node::NodeId;
use std::fmt;
use std::time::Duration;

/// Errors from graph operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Node with the given ID was not found in the graph.
    NodeNotFound { node_id: NodeId },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeNotFound { node_id } => {
                write!(f, "node not found: {node_id}")
            }
        }
    }
}

impl std::error::Error for GraphError {}

/// Errors from edit-time validation of step parameter text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamsError {
    /// The text is not valid JSON.
    Malformed { reason: String },
    /// The document parsed, but is not a JSON object.
    NotAnObject,
}

impl fmt::Display for ParamsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { reason } => write!(f, "malformed parameter JSON: {reason}"),
            Self::NotAnObject => write!(f, "step parameters must be a JSON object"),
        }
    }
}

impl std::error::Error for ParamsError {}

/// Errors from a single remote step call.
///
/// These cover the transport layer only; a non-2xx response is not an error
/// at this level, it is a response the driver inspects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepCallError {
    /// The request could not be sent or the response could not be read.
    Transport { details: String },
    /// The call exceeded the driver's per-step deadline.
    Timeout { limit: Duration },
}

impl fmt::Display for StepCallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { details } => write!(f, "step call transport failure: {details}"),
            Self::Timeout { limit } => {
                write!(f, "step call timed out after {}s", limit.as_secs_f64())
            }
        }
    }
}

impl std::error::Error for StepCallError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_error_display() {
        let node_id = NodeId::new();
        let err = GraphError::NodeNotFound { node_id };
        assert!(err.to_string().contains("node not found"));
    }

    #[test]
    fn params_error_display() {
        let err = ParamsError::Malformed {
            reason: "expected value at line 1".to_string(),
        };
        assert!(err.to_string().contains("malformed parameter JSON"));
        assert!(
            ParamsError::NotAnObject
                .to_string()
                .contains("JSON object")
        );
    }

    #[test]
    fn step_call_error_display() {
        let err = StepCallError::Timeout {
            limit: Duration::from_secs(30),
        };
        assert!(err.to_string().contains("timed out"));
    }
}
