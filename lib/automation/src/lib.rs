//! Automation workflow engine for the fabric-ops console.
//!
//! Operators compose automation workflows on a canvas: nodes are steps
//! (discovery, template push, fault-tolerance action, QoS autoscale, ACL
//! enforcement), edges are dependency arrows. This crate provides:
//!
//! - **Graph Model**: Directed graphs using petgraph; node removal cascades
//!   to incident edges, so edges can never dangle
//! - **Resolver**: Kahn's algorithm with a canvas-position tie-break, and a
//!   positional fallback for graphs the operator has drawn a cycle into
//! - **Driver**: Sequential execution against the remote Automation API,
//!   short-circuiting on the first failing step
//! - **Client**: The HTTP transport for the Automation API

pub mod client;
pub mod driver;
pub mod edge;
pub mod error;
pub mod graph;
pub mod node;
pub mod resolve;
pub mod run;

pub use client::AutomationClient;
pub use driver::{CancelToken, Driver, RunContext, StepClient, StepResponse};
pub use edge::{Edge, EdgeId, EdgeRef};
pub use error::{GraphError, ParamsError, StepCallError};
pub use graph::WorkflowGraph;
pub use node::{Node, NodeId, Position, StepKind, StepParams};
pub use resolve::{execution_order, resolve_order};
pub use run::{Run, RunRecord, RunState, StepStatus};
