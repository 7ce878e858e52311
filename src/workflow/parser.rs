//! Workflow Persistence
//!
//! Loads and saves workflows in the canvas JSON format. Loading only parses;
//! structural problems are reported as warnings here and enforced by the
//! engine when the workflow runs.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use thiserror::Error;

use super::model::Workflow;
use super::validator::quick_validate;

/// Errors reading or writing workflow files.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to read workflow file '{}': {source}. Check that the file exists and is readable.", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write workflow file '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse workflow JSON: {0}. Check the file format.")]
    Json(#[from] serde_json::Error),
}

/// Parses a workflow from a JSON string.
pub fn from_json(json: &str) -> Result<Workflow, ParseError> {
    let workflow: Workflow = serde_json::from_str(json)?;

    info!(
        "Parsed workflow '{}': {} nodes, {} connections",
        workflow.name,
        workflow.nodes.len(),
        workflow.edges.len()
    );

    for problem in quick_validate(&workflow) {
        warn!("{}", problem);
    }

    Ok(workflow)
}

/// Serializes a workflow to pretty-printed JSON.
pub fn to_json(workflow: &Workflow) -> Result<String, ParseError> {
    Ok(serde_json::to_string_pretty(workflow)?)
}

/// Loads a workflow from a JSON file.
///
/// # Example
///
/// ```rust,no_run
/// use bioflow::workflow::load_workflow;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let workflow = load_workflow("screen.json")?;
///     println!("Loaded {} nodes", workflow.nodes.len());
///     Ok(())
/// }
/// ```
pub fn load_workflow(path: impl AsRef<Path>) -> Result<Workflow, ParseError> {
    let path = path.as_ref();
    info!("Loading workflow from: {}", path.display());

    let content = fs::read_to_string(path).map_err(|source| ParseError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    debug!("JSON content loaded ({} bytes)", content.len());
    from_json(&content)
}

/// Saves a workflow to a JSON file.
pub fn save_workflow(workflow: &Workflow, path: impl AsRef<Path>) -> Result<(), ParseError> {
    let path = path.as_ref();
    let json = to_json(workflow)?;

    fs::write(path, json).map_err(|source| ParseError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Workflow '{}' saved to: {}", workflow.name, path.display());
    Ok(())
}

/// File name a workflow is saved under by default: its name with
/// whitespace runs replaced by underscores.
pub fn default_file_name(workflow: &Workflow) -> String {
    let stem = workflow.name.split_whitespace().collect::<Vec<_>>().join("_");
    format!("{}.json", stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::model::{Edge, Node, NodeKind};
    use serde_json::json;
    use tempfile::tempdir;

    fn sample() -> Workflow {
        Workflow::from_parts(
            "Docking Screen",
            vec![
                Node::new("n1", "upload-pdb")
                    .with_param("protein_name", "EGFR")
                    .at(100.0, 50.0),
                Node::new("n2", "vina-docking")
                    .with_param("shots", 100)
                    .with_param("backend", "simulator")
                    .at(400.0, 50.0),
                Node::new("n3", "quantum-folding").at(700.0, 50.0),
            ],
            vec![Edge::new("n1", "n2"), Edge::new("n2", "n3")],
        )
    }

    #[test]
    fn test_round_trip_preserves_graph() {
        let original = sample();
        let json = to_json(&original).unwrap();
        let loaded = from_json(&json).unwrap();

        assert_eq!(loaded, original);
        assert_eq!(loaded.nodes[2].kind, NodeKind::Other("quantum-folding".to_string()));
    }

    #[test]
    fn test_round_trip_independent_of_coordinates() {
        let original = sample();
        let mut moved = original.clone();
        for node in &mut moved.nodes {
            node.position.x += 333.0;
        }

        let loaded = from_json(&to_json(&moved).unwrap()).unwrap();
        let kinds = |w: &Workflow| -> Vec<_> {
            w.nodes
                .iter()
                .map(|n| (n.id.clone(), n.kind.clone(), n.parameters.clone()))
                .collect()
        };

        assert_eq!(kinds(&loaded), kinds(&original));
        assert_eq!(loaded.edges, original.edges);
    }

    #[test]
    fn test_wire_format_field_names() {
        let value: serde_json::Value = serde_json::from_str(&to_json(&sample()).unwrap()).unwrap();

        assert_eq!(value["name"], json!("Docking Screen"));
        assert_eq!(value["version"], json!("1.0.0"));
        assert_eq!(value["connections"][0], json!({ "from": "n1", "to": "n2" }));
        assert_eq!(value["nodes"][1]["type"], json!("vina-docking"));
        assert_eq!(value["nodes"][1]["inputs"]["shots"], json!(100));
    }

    #[test]
    fn test_from_json_defaults() {
        let workflow = from_json(r#"{ "nodes": [{ "id": "a", "type": "text-input", "x": 5, "y": 7 }] }"#)
            .unwrap();

        assert_eq!(workflow.name, "Untitled Workflow");
        assert_eq!(workflow.version, "1.0.0");
        assert!(workflow.edges.is_empty());
        assert_eq!(workflow.nodes[0].position.x, 5.0);
    }

    #[test]
    fn test_from_json_invalid() {
        let result = from_json("this is not json: [[[");
        assert!(matches!(result, Err(ParseError::Json(_))));
    }

    #[test]
    fn test_save_and_load_workflow() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("screen.json");

        save_workflow(&sample(), &path).unwrap();
        assert!(path.exists());

        let loaded = load_workflow(&path).unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_load_workflow_file_not_found() {
        let result = load_workflow("/nonexistent/path/workflow.json");
        match result {
            Err(ParseError::Read { path, .. }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/path/workflow.json"))
            }
            other => panic!("Expected Read error, got {:?}", other),
        }
    }

    #[test]
    fn test_default_file_name() {
        assert_eq!(default_file_name(&sample()), "Docking_Screen.json");
        assert_eq!(
            default_file_name(&Workflow::new("  lead   opt run ")),
            "lead_opt_run.json"
        );
    }
}
