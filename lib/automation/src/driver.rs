//! Sequential execution driver.
//!
//! The driver walks a resolved execution order and issues one remote call
//! per node, strictly sequentially: later steps may depend on device state
//! produced by earlier ones, so there is no parallel fan-out even for
//! independent sub-graphs.
//!
//! Failure protocol:
//! - A node with an unsupported kind is logged as a failure and skipped;
//!   execution continues. This is the single non-short-circuiting failure:
//!   an unconfigured node must not abort an otherwise-valid plan.
//! - Any non-2xx response, transport error, or timeout is logged and halts
//!   the remainder of the plan.
//!
//! Steps already executed may have mutated device state; the driver cannot
//! roll them back. A partial log is an expected outcome, not an error.

use crate::error::StepCallError;
use crate::graph::WorkflowGraph;
use crate::node::Node;
use crate::resolve;
use crate::run::{Run, RunRecord};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

/// A response from the Automation API.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResponse {
    /// The HTTP status code.
    pub status: u16,
    /// The response body, verbatim.
    pub body: JsonValue,
}

impl StepResponse {
    /// Returns true for 2xx responses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport seam for remote step calls.
///
/// This abstraction allows the driver to be tested without a live
/// Automation API while still supporting the real HTTP client in
/// production.
#[async_trait]
pub trait StepClient: Send + Sync {
    /// Issues one step call to the given endpoint with the given payload.
    ///
    /// A non-2xx response is returned as a normal [`StepResponse`];
    /// `Err` is reserved for transport-level failures.
    async fn invoke(&self, endpoint: &str, payload: &JsonValue)
    -> Result<StepResponse, StepCallError>;
}

/// A clonable cancellation token honored at each per-step suspension point.
///
/// Cancelling takes effect at the next step boundary or mid-call; the step
/// in flight is abandoned, and the log keeps everything recorded so far.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    /// Creates a new, uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Returns true if cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once cancellation has been requested.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Run-scoped context attached to every outbound call.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Traceability tag (e.g. an experiment/variant identifier) merged into
    /// each payload under `meta.variant`.
    pub variant: String,
    /// Cancellation token for this run.
    pub cancel: CancelToken,
}

impl RunContext {
    /// Creates a context with the given variant tag and a fresh token.
    #[must_use]
    pub fn new(variant: impl Into<String>) -> Self {
        Self {
            variant: variant.into(),
            cancel: CancelToken::new(),
        }
    }

    /// Uses an externally-held cancellation token.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// The sequential execution driver.
pub struct Driver<C: StepClient> {
    client: C,
    step_timeout: Option<Duration>,
}

impl<C: StepClient> Driver<C> {
    /// Creates a driver over the given step client, with no per-step
    /// deadline.
    pub fn new(client: C) -> Self {
        Self {
            client,
            step_timeout: None,
        }
    }

    /// Sets a per-step deadline. An elapsed deadline is recorded in the log
    /// and halts the run like any other call failure.
    #[must_use]
    pub fn with_step_timeout(mut self, limit: Duration) -> Self {
        self.step_timeout = Some(limit);
        self
    }

    /// Executes a workflow snapshot and returns the run record.
    ///
    /// The driver owns the snapshot for the duration of the run, so canvas
    /// edits made while the run is in flight cannot corrupt the execution
    /// order. All failures land in the returned run's log; this method
    /// itself never fails.
    #[instrument(skip_all, fields(variant = %ctx.variant, nodes = snapshot.node_count()))]
    pub async fn run(&self, snapshot: WorkflowGraph, ctx: RunContext) -> Run {
        let mut run = Run::new(ctx.variant.clone());

        let order = resolve::execution_order(&snapshot);
        debug!(steps = order.len(), "resolved execution order");
        if order.is_empty() {
            run.complete();
            return run;
        }

        run.executing();
        let nodes_by_id: HashMap<_, _> = snapshot.nodes().map(|n| (n.id, n)).collect();
        for node_id in order {
            let Some(&node) = nodes_by_id.get(&node_id) else {
                continue;
            };

            let Some(endpoint) = node.kind.endpoint() else {
                warn!(step = %node.kind, "unknown step type, continuing");
                run.record(RunRecord::failure(node.kind.clone(), "unknown step type"));
                continue;
            };

            if ctx.cancel.is_cancelled() {
                run.cancel();
                return run;
            }

            let payload = payload_for(node, &ctx.variant);
            debug!(step = %node.kind, endpoint, "executing step");

            let outcome = tokio::select! {
                () = ctx.cancel.cancelled() => {
                    run.cancel();
                    return run;
                }
                outcome = self.call(endpoint, &payload) => outcome,
            };

            match outcome {
                Ok(response) => {
                    let record =
                        RunRecord::response(node.kind.clone(), response.status, response.body);
                    let failed = !record.is_success();
                    run.record(record);
                    if failed {
                        warn!(step = %node.kind, "step failed, halting run");
                        run.halt();
                        return run;
                    }
                }
                Err(e) => {
                    warn!(step = %node.kind, error = %e, "step call failed, halting run");
                    run.record(RunRecord::failure(node.kind.clone(), e.to_string()));
                    run.halt();
                    return run;
                }
            }
        }

        run.complete();
        run
    }

    /// Issues one call, applying the per-step deadline if configured.
    async fn call(
        &self,
        endpoint: &str,
        payload: &JsonValue,
    ) -> Result<StepResponse, StepCallError> {
        match self.step_timeout {
            Some(limit) => tokio::time::timeout(limit, self.client.invoke(endpoint, payload))
                .await
                .map_err(|_| StepCallError::Timeout { limit })?,
            None => self.client.invoke(endpoint, payload).await,
        }
    }
}

/// Builds the request payload: the node's parameters merged with the
/// run-scoped traceability envelope. A user-supplied `meta` parameter is
/// overwritten by the engine's envelope.
fn payload_for(node: &Node, variant: &str) -> JsonValue {
    let mut payload = node.params.as_map().clone();
    payload.insert(
        "meta".to_string(),
        serde_json::json!({ "variant": variant }),
    );
    JsonValue::Object(payload)
}
