//! Workflow Validation
//!
//! Structural checks performed before a run:
//! - [`validate`] is the gate the engine uses; it fails fast.
//! - [`quick_validate`] collects every problem it can find as readable
//!   messages, for editor feedback. It never blocks execution.
//!
//! Parameter values are not checked here; the backend rejects bad
//! parameters when the node runs.

use std::collections::HashSet;

use log::{debug, info};
use thiserror::Error;

use super::model::Workflow;

/// Validation failures that stop a run before scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Workflow has no nodes")]
    EmptyWorkflow,
}

/// Validates the workflow structure.
///
/// A workflow without nodes is rejected. A workflow saved without a
/// `connections` field arrives here with an empty edge list and is accepted.
pub fn validate(workflow: &Workflow) -> Result<(), ValidationError> {
    info!(
        "Validating workflow '{}' with {} nodes",
        workflow.name,
        workflow.nodes.len()
    );

    if workflow.is_empty() {
        return Err(ValidationError::EmptyWorkflow);
    }

    if workflow.edges.is_empty() {
        debug!("Workflow '{}' has no connections", workflow.name);
    }

    Ok(())
}

/// Quick validation that returns a list of error messages.
///
/// Useful for GUI validation feedback.
pub fn quick_validate(workflow: &Workflow) -> Vec<String> {
    let mut errors = Vec::new();

    if workflow.is_empty() {
        errors.push(ValidationError::EmptyWorkflow.to_string());
        return errors;
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for node in &workflow.nodes {
        if node.id.trim().is_empty() {
            errors.push(format!("A '{}' node has an empty ID", node.kind));
        } else if !seen.insert(node.id.as_str()) {
            errors.push(format!("Duplicate node ID: '{}'", node.id));
        }
    }

    for edge in &workflow.edges {
        let source = workflow.get_node(&edge.from);
        let target = workflow.get_node(&edge.to);

        if source.is_none() {
            errors.push(format!(
                "Connection {} -> {}: unknown source node '{}'",
                edge.from, edge.to, edge.from
            ));
        }
        if target.is_none() {
            errors.push(format!(
                "Connection {} -> {}: unknown target node '{}'",
                edge.from, edge.to, edge.to
            ));
        }

        if edge.from == edge.to {
            errors.push(format!("Node '{}' is connected to itself", edge.from));
        }

        if let Some(node) = source.filter(|n| !n.kind.has_output()) {
            errors.push(format!(
                "Node '{}' ({}) has no output but feeds '{}'",
                node.id, node.kind, edge.to
            ));
        }
        if let Some(node) = target.filter(|n| !n.kind.has_input()) {
            errors.push(format!(
                "Node '{}' ({}) has no input but is fed by '{}'",
                node.id, node.kind, edge.from
            ));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::model::{Edge, Node};

    #[test]
    fn test_valid_workflow() {
        let workflow = Workflow::from_parts(
            "ok",
            vec![Node::new("n1", "upload-pdb"), Node::new("n2", "vina-docking")],
            vec![Edge::new("n1", "n2")],
        );
        assert!(validate(&workflow).is_ok());
    }

    #[test]
    fn test_empty_workflow() {
        let workflow = Workflow::new("empty");
        assert_eq!(validate(&workflow), Err(ValidationError::EmptyWorkflow));
    }

    #[test]
    fn test_missing_connections_is_not_an_error() {
        let workflow: Workflow = serde_json::from_str(
            r#"{ "name": "solo", "nodes": [{ "id": "n1", "type": "text-input" }] }"#,
        )
        .unwrap();
        assert!(validate(&workflow).is_ok());
    }

    #[test]
    fn test_validate_ignores_parameters() {
        let workflow = Workflow::from_parts(
            "odd",
            vec![Node::new("n1", "vina-docking").with_param("shots", -5)],
            vec![],
        );
        assert!(validate(&workflow).is_ok());
    }

    #[test]
    fn test_validation_error_display() {
        assert_eq!(ValidationError::EmptyWorkflow.to_string(), "Workflow has no nodes");
    }

    #[test]
    fn test_quick_validate_empty() {
        let errors = quick_validate(&Workflow::new("empty"));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("no nodes"));
    }

    #[test]
    fn test_quick_validate_valid() {
        let workflow = Workflow::from_parts(
            "ok",
            vec![
                Node::new("n1", "upload-pdb"),
                Node::new("n2", "filter"),
                Node::new("n3", "export-csv"),
            ],
            vec![Edge::new("n1", "n2"), Edge::new("n2", "n3")],
        );
        assert!(quick_validate(&workflow).is_empty());
    }

    #[test]
    fn test_quick_validate_duplicate_and_empty_ids() {
        let workflow = Workflow::from_parts(
            "ids",
            vec![
                Node::new("a", "filter"),
                Node::new("a", "sort"),
                Node::new(" ", "sort"),
            ],
            vec![],
        );

        let errors = quick_validate(&workflow);
        assert!(errors.iter().any(|e| e.contains("Duplicate node ID: 'a'")));
        assert!(errors.iter().any(|e| e.contains("empty ID")));
    }

    #[test]
    fn test_quick_validate_unknown_endpoints() {
        let workflow = Workflow::from_parts(
            "refs",
            vec![Node::new("a", "filter")],
            vec![Edge::new("a", "ghost"), Edge::new("phantom", "a")],
        );

        let errors = quick_validate(&workflow);
        assert!(errors.iter().any(|e| e.contains("unknown target node 'ghost'")));
        assert!(errors.iter().any(|e| e.contains("unknown source node 'phantom'")));
    }

    #[test]
    fn test_quick_validate_self_loop() {
        let workflow = Workflow::from_parts(
            "loop",
            vec![Node::new("a", "filter")],
            vec![Edge::new("a", "a")],
        );

        let errors = quick_validate(&workflow);
        assert!(errors.iter().any(|e| e.contains("connected to itself")));
    }

    #[test]
    fn test_quick_validate_port_mismatch() {
        let workflow = Workflow::from_parts(
            "ports",
            vec![
                Node::new("out", "export-json"),
                Node::new("up", "upload-molecule"),
            ],
            vec![Edge::new("out", "up")],
        );

        let errors = quick_validate(&workflow);
        assert!(errors.iter().any(|e| e.contains("'out' (export-json) has no output")));
        assert!(errors.iter().any(|e| e.contains("'up' (upload-molecule) has no input")));
    }
}
