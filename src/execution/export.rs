//! Export Handling
//!
//! Export-kind nodes (`export-csv`, `export-json`) return a file payload in
//! their result. The engine turns that payload into an [`ExportArtifact`] and
//! hands it to an [`ExportHandler`], which owns the actual file emission.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde_json::Value;
use thiserror::Error;

use crate::workflow::{Node, NodeKind, StepOutcome};

/// Errors emitting an export artifact.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write export '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid export filename: '{0}'")]
    InvalidFilename(String),
}

/// A file produced by an export node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub content: String,
    pub mime_type: &'static str,
}

impl ExportArtifact {
    /// Extracts the artifact from an export node's outcome.
    ///
    /// Returns `None` for non-export kinds, failed outcomes, or results
    /// without a `file_data` field.
    pub fn from_outcome(node: &Node, outcome: &StepOutcome) -> Option<Self> {
        if !outcome.success {
            return None;
        }

        let (default_name, mime_type) = match node.kind {
            NodeKind::ExportJson => ("workflow_export.json", "application/json"),
            NodeKind::ExportCsv => ("workflow_export.csv", "text/csv"),
            _ => return None,
        };

        let content = match outcome.data.get("file_data")? {
            Value::Null => return None,
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };

        let filename = outcome
            .data
            .get("filename")
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(default_name)
            .to_string();

        Some(Self {
            filename,
            content,
            mime_type,
        })
    }
}

/// Receives artifacts produced during a run.
pub trait ExportHandler: Send + Sync {
    fn export(&self, artifact: &ExportArtifact) -> Result<(), ExportError>;
}

/// Writes artifacts into a directory.
///
/// Only the final path component of the artifact's filename is used, so a
/// backend cannot direct writes outside the directory.
#[derive(Debug, Clone)]
pub struct DirectoryExporter {
    dir: PathBuf,
}

impl DirectoryExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Where an artifact with the given filename is written.
    pub fn target_path(&self, filename: &str) -> Result<PathBuf, ExportError> {
        let name = Path::new(filename)
            .file_name()
            .ok_or_else(|| ExportError::InvalidFilename(filename.to_string()))?;
        Ok(self.dir.join(name))
    }
}

impl ExportHandler for DirectoryExporter {
    fn export(&self, artifact: &ExportArtifact) -> Result<(), ExportError> {
        let path = self.target_path(&artifact.filename)?;

        fs::create_dir_all(&self.dir)
            .and_then(|_| fs::write(&path, &artifact.content))
            .map_err(|source| ExportError::Write {
                path: path.clone(),
                source,
            })?;

        info!(
            "Exported {} ({}, {} bytes)",
            path.display(),
            artifact.mime_type,
            artifact.content.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn export_json_outcome(data: Value) -> (Node, StepOutcome) {
        (
            Node::new("out", "export-json"),
            StepOutcome::succeeded(data, json!({})),
        )
    }

    #[test]
    fn test_artifact_from_string_payload() {
        let node = Node::new("out", "export-csv");
        let outcome = StepOutcome::succeeded(
            json!({ "file_data": "id,score\n1,-8.5\n", "filename": "hits.csv" }),
            json!({}),
        );

        let artifact = ExportArtifact::from_outcome(&node, &outcome).unwrap();
        assert_eq!(artifact.filename, "hits.csv");
        assert_eq!(artifact.content, "id,score\n1,-8.5\n");
        assert_eq!(artifact.mime_type, "text/csv");
    }

    #[test]
    fn test_artifact_structured_payload_and_default_name() {
        let (node, outcome) = export_json_outcome(json!({ "file_data": { "hits": [1, 2] } }));

        let artifact = ExportArtifact::from_outcome(&node, &outcome).unwrap();
        assert_eq!(artifact.filename, "workflow_export.json");
        assert_eq!(artifact.mime_type, "application/json");
        assert_eq!(
            serde_json::from_str::<Value>(&artifact.content).unwrap(),
            json!({ "hits": [1, 2] })
        );
    }

    #[test]
    fn test_no_artifact_without_payload() {
        let (node, outcome) = export_json_outcome(json!({ "rows": 3 }));
        assert!(ExportArtifact::from_outcome(&node, &outcome).is_none());

        let (node, outcome) = export_json_outcome(json!({ "file_data": null }));
        assert!(ExportArtifact::from_outcome(&node, &outcome).is_none());
    }

    #[test]
    fn test_no_artifact_for_other_kinds_or_failures() {
        let outcome = StepOutcome::succeeded(json!({ "file_data": "x" }), json!({}));
        assert!(ExportArtifact::from_outcome(&Node::new("v", "visualize"), &outcome).is_none());

        let failed = StepOutcome::failed("boom");
        assert!(ExportArtifact::from_outcome(&Node::new("e", "export-csv"), &failed).is_none());
    }

    #[test]
    fn test_directory_exporter_writes_file() {
        let temp_dir = tempdir().unwrap();
        let exporter = DirectoryExporter::new(temp_dir.path().join("exports"));
        let artifact = ExportArtifact {
            filename: "hits.csv".to_string(),
            content: "a,b\n".to_string(),
            mime_type: "text/csv",
        };

        exporter.export(&artifact).unwrap();

        let written = fs::read_to_string(temp_dir.path().join("exports/hits.csv")).unwrap();
        assert_eq!(written, "a,b\n");
    }

    #[test]
    fn test_directory_exporter_strips_directories() {
        let temp_dir = tempdir().unwrap();
        let exporter = DirectoryExporter::new(temp_dir.path());

        let path = exporter.target_path("../../etc/passwd").unwrap();
        assert_eq!(path, temp_dir.path().join("passwd"));

        assert!(matches!(
            exporter.target_path(".."),
            Err(ExportError::InvalidFilename(_))
        ));
    }
}
