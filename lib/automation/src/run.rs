//! Run lifecycle and the run log.
//!
//! A run is one end-to-end execution of a resolved step order. The run log
//! is the authoritative record of what ran and where execution stopped;
//! failures are captured here, never raised to the caller.

use crate::node::StepKind;
use chrono::{DateTime, Utc};
use fabric_ops_core::RunId;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// The overall state of a run.
///
/// `Halted` and `Completed` are both terminal; the externally visible
/// difference is whether the last log entry carries a failing status.
/// `Cancelled` is terminal as well, entered when the operator aborts a run
/// at a step boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Linearizing the graph into an execution order.
    Resolving,
    /// Walking the resolved order, one remote call at a time.
    Executing,
    /// Every step in the order was attempted and succeeded.
    Completed,
    /// A step failed; the remainder of the plan was not attempted.
    Halted,
    /// The operator cancelled the run between steps.
    Cancelled,
}

impl RunState {
    /// Returns true if this is a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Halted | Self::Cancelled)
    }
}

/// The outcome of a single attempted step.
///
/// Either the HTTP status the Automation API answered with, or `Error` for
/// steps that never produced a response (unknown kind, transport failure,
/// timeout).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// The remote endpoint answered with this HTTP status.
    Http(u16),
    /// No response: unknown step kind or transport-level failure.
    Error,
}

impl StepStatus {
    /// Returns true for 2xx responses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Http(status) if (200..300).contains(status))
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(status) => write!(f, "{status}"),
            Self::Error => f.write_str("error"),
        }
    }
}

// On the wire a status is the raw HTTP code or the string "error".
impl Serialize for StepStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Http(status) => serializer.serialize_u16(*status),
            Self::Error => serializer.serialize_str("error"),
        }
    }
}

impl<'de> Deserialize<'de> for StepStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct StatusVisitor;

        impl serde::de::Visitor<'_> for StatusVisitor {
            type Value = StepStatus;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an HTTP status code or the string \"error\"")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u16::try_from(value)
                    .map(StepStatus::Http)
                    .map_err(|_| E::custom(format!("status code out of range: {value}")))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if value == "error" {
                    Ok(StepStatus::Error)
                } else {
                    Err(E::custom(format!("unexpected status string: {value}")))
                }
            }
        }

        deserializer.deserialize_any(StatusVisitor)
    }
}

/// One entry in the run log: the outcome of one attempted step.
///
/// Entries are keyed by position in the log, not by node ID; two nodes of
/// the same kind produce two entries of the same `step`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// The kind of step that was attempted.
    pub step: StepKind,
    /// The outcome status.
    pub status: StepStatus,
    /// The response body, verbatim, or the failure description.
    pub body: JsonValue,
}

impl RunRecord {
    /// Creates a record from a remote response.
    #[must_use]
    pub fn response(step: StepKind, status: u16, body: JsonValue) -> Self {
        Self {
            step,
            status: StepStatus::Http(status),
            body,
        }
    }

    /// Creates a record for a step that produced no response.
    #[must_use]
    pub fn failure(step: StepKind, message: impl Into<String>) -> Self {
        Self {
            step,
            status: StepStatus::Error,
            body: JsonValue::String(message.into()),
        }
    }

    /// Returns true if this entry records a successful step.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// A record of a single run: lifecycle state plus the accumulated log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Unique identifier for this run.
    pub id: RunId,
    /// The run-scoped traceability tag attached to every outbound call.
    pub variant: String,
    /// Current lifecycle state.
    pub state: RunState,
    /// When the run started resolving.
    pub started_at: DateTime<Utc>,
    /// When the run reached a terminal state.
    pub finished_at: Option<DateTime<Utc>>,
    /// Per-step outcomes, in execution order.
    pub log: Vec<RunRecord>,
}

impl Run {
    /// Creates a new run in the resolving state.
    #[must_use]
    pub fn new(variant: impl Into<String>) -> Self {
        Self {
            id: RunId::new(),
            variant: variant.into(),
            state: RunState::Resolving,
            started_at: Utc::now(),
            finished_at: None,
            log: Vec::new(),
        }
    }

    /// Appends a step outcome to the log.
    pub fn record(&mut self, record: RunRecord) {
        self.log.push(record);
    }

    /// Marks the run as executing the resolved order.
    pub fn executing(&mut self) {
        self.state = RunState::Executing;
    }

    /// Marks the run as completed.
    pub fn complete(&mut self) {
        self.state = RunState::Completed;
        self.finished_at = Some(Utc::now());
    }

    /// Marks the run as halted on a failing step.
    pub fn halt(&mut self) {
        self.state = RunState::Halted;
        self.finished_at = Some(Utc::now());
    }

    /// Marks the run as cancelled.
    pub fn cancel(&mut self) {
        self.state = RunState::Cancelled;
        self.finished_at = Some(Utc::now());
    }

    /// Returns the duration of the run so far, or total if finished.
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        let end = self.finished_at.unwrap_or_else(Utc::now);
        end - self.started_at
    }

    /// Returns true if every attempted step succeeded and the plan finished.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.state == RunState::Completed && self.log.iter().all(RunRecord::is_success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_state_terminal() {
        assert!(!RunState::Resolving.is_terminal());
        assert!(!RunState::Executing.is_terminal());
        assert!(RunState::Completed.is_terminal());
        assert!(RunState::Halted.is_terminal());
        assert!(RunState::Cancelled.is_terminal());
    }

    #[test]
    fn step_status_success_range() {
        assert!(StepStatus::Http(200).is_success());
        assert!(StepStatus::Http(204).is_success());
        assert!(!StepStatus::Http(301).is_success());
        assert!(!StepStatus::Http(404).is_success());
        assert!(!StepStatus::Http(500).is_success());
        assert!(!StepStatus::Error.is_success());
    }

    #[test]
    fn step_status_serde_shape() {
        let http = serde_json::to_string(&StepStatus::Http(503)).expect("serialize");
        assert_eq!(http, "503");
        let error = serde_json::to_string(&StepStatus::Error).expect("serialize");
        assert_eq!(error, "\"error\"");

        let parsed: StepStatus = serde_json::from_str("207").expect("deserialize");
        assert_eq!(parsed, StepStatus::Http(207));
        let parsed: StepStatus = serde_json::from_str("\"error\"").expect("deserialize");
        assert_eq!(parsed, StepStatus::Error);
    }

    #[test]
    fn run_lifecycle() {
        let mut run = Run::new("baseline");
        assert_eq!(run.state, RunState::Resolving);
        assert!(run.finished_at.is_none());

        run.executing();
        assert_eq!(run.state, RunState::Executing);

        run.record(RunRecord::response(
            crate::node::StepKind::Discovery,
            200,
            serde_json::json!({"devices": 12}),
        ));
        run.complete();

        assert_eq!(run.state, RunState::Completed);
        assert!(run.finished_at.is_some());
        assert!(run.succeeded());
    }

    #[test]
    fn halted_run_did_not_succeed() {
        let mut run = Run::new("baseline");
        run.executing();
        run.record(RunRecord::failure(
            crate::node::StepKind::Template,
            "step call transport failure: connection refused",
        ));
        run.halt();

        assert!(!run.succeeded());
        assert_eq!(run.log.len(), 1);
        assert_eq!(run.log[0].status, StepStatus::Error);
    }

    #[test]
    fn run_record_serde_roundtrip() {
        let record = RunRecord::response(
            crate::node::StepKind::AclEnforce,
            201,
            serde_json::json!({"applied": true}),
        );
        let json = serde_json::to_string(&record).expect("serialize");
        let parsed: RunRecord = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(record, parsed);
    }
}
