//! Loading workflow snapshots exported from the canvas.
//!
//! A snapshot is the flat node/edge JSON the console UI holds, optionally
//! wrapped with the workflow's identity. The engine itself does not persist
//! workflows; files are produced by the UI's export and consumed here.

use fabric_ops_automation::WorkflowGraph;
use fabric_ops_core::{Result, WorkflowId};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// A workflow snapshot file.
#[derive(Debug, Deserialize)]
pub struct WorkflowSnapshot {
    /// The workflow's identity, if the export carried one.
    #[serde(default)]
    pub id: Option<WorkflowId>,
    /// Display name, if the export carried one.
    #[serde(default)]
    pub name: Option<String>,
    /// The graph to execute.
    pub graph: WorkflowGraph,
}

/// Errors from snapshot loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// The file could not be read.
    Io { path: String, details: String },
    /// The file is not a valid snapshot document.
    Parse { details: String },
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, details } => {
                write!(f, "failed to read snapshot {path}: {details}")
            }
            Self::Parse { details } => write!(f, "invalid snapshot document: {details}"),
        }
    }
}

impl std::error::Error for SnapshotError {}

/// Loads a workflow snapshot from disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid snapshot.
pub fn load(path: &Path) -> Result<WorkflowSnapshot, SnapshotError> {
    let text = std::fs::read_to_string(path).map_err(|e| SnapshotError::Io {
        path: path.display().to_string(),
        details: e.to_string(),
    })?;

    let mut snapshot: WorkflowSnapshot =
        serde_json::from_str(&text).map_err(|e| SnapshotError::Parse {
            details: e.to_string(),
        })?;
    snapshot.graph.rebuild_index_map();

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_snapshot(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write snapshot");
        file
    }

    #[test]
    fn loads_canvas_export() {
        let file = write_snapshot(
            r#"{
                "name": "nightly-remediation",
                "graph": {
                    "nodes": [
                        {
                            "id": "01J9ZW8BJT0000000000000001",
                            "kind": "discovery",
                            "position": { "x": 0.0, "y": 10.0 }
                        },
                        {
                            "id": "01J9ZW8BJT0000000000000002",
                            "kind": "template",
                            "position": { "x": 100.0, "y": 10.0 },
                            "params": { "template": "edge-router-base" }
                        }
                    ],
                    "edges": [
                        {
                            "source": "01J9ZW8BJT0000000000000001",
                            "target": "01J9ZW8BJT0000000000000002"
                        }
                    ]
                }
            }"#,
        );

        let snapshot = load(file.path()).expect("load snapshot");
        assert_eq!(snapshot.name.as_deref(), Some("nightly-remediation"));
        assert_eq!(snapshot.graph.node_count(), 2);
        assert_eq!(snapshot.graph.edge_count(), 1);
    }

    #[test]
    fn dangling_edges_in_exports_are_dropped() {
        let file = write_snapshot(
            r#"{
                "graph": {
                    "nodes": [
                        {
                            "id": "01J9ZW8BJT0000000000000001",
                            "kind": "discovery",
                            "position": { "x": 0.0, "y": 0.0 }
                        }
                    ],
                    "edges": [
                        {
                            "source": "01J9ZW8BJT0000000000000001",
                            "target": "01J9ZW8BJT00000000000000FF"
                        }
                    ]
                }
            }"#,
        );

        let snapshot = load(file.path()).expect("load snapshot");
        assert_eq!(snapshot.graph.node_count(), 1);
        assert_eq!(snapshot.graph.edge_count(), 0);
    }

    #[test]
    fn rejects_malformed_document() {
        let file = write_snapshot("{not json");
        let result = load(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = load(Path::new("/nonexistent/workflow.json"));
        assert!(result.is_err());
    }
}
