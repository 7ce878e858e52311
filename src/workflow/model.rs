//! Workflow Data Model
//!
//! Core data structures representing workflow nodes and the connections
//! between them.
//!
//! # Example JSON Format
//!
//! ```json
//! {
//!   "name": "Docking Screen",
//!   "nodes": [
//!     { "id": "node-1", "type": "upload-pdb", "x": 120, "y": 80,
//!       "inputs": { "protein_name": "EGFR" } },
//!     { "id": "node-2", "type": "vina-docking", "x": 420, "y": 80,
//!       "inputs": { "backend": "simulator", "shots": 100 } }
//!   ],
//!   "connections": [ { "from": "node-1", "to": "node-2" } ],
//!   "version": "1.0.0"
//! }
//! ```

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::graph::GraphError;

/// Name given to workflows saved without one.
pub const DEFAULT_WORKFLOW_NAME: &str = "Untitled Workflow";

/// Format version written into every saved workflow.
pub const FORMAT_VERSION: &str = "1.0.0";

/// Named parameter values attached to a node (`inputs` on the wire).
pub type Parameters = Map<String, Value>;

/// Palette category of a node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    /// Data ingestion (file uploads, free text)
    Input,
    /// Predictive-model invocations run on the backend
    Model,
    /// Filtering and transform steps
    Tool,
    /// Export and visualization sinks
    Output,
}

/// The operation a node performs.
///
/// Known kinds mirror the node palette. Anything else is carried verbatim in
/// [`NodeKind::Other`] so that workflows built against a newer palette still
/// load, round-trip, and execute; the backend decides whether it is valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    UploadPdb,
    UploadMolecule,
    TextInput,
    VinaDocking,
    AdmePrediction,
    ToxicityPrediction,
    CrisprDesign,
    DenovoDesigner,
    VirtualScreening,
    BindingAffinity,
    Filter,
    Sort,
    IfThen,
    ExportCsv,
    ExportJson,
    Visualize,
    Other(String),
}

impl NodeKind {
    /// Wire name of this kind (e.g. `"vina-docking"`).
    pub fn as_str(&self) -> &str {
        match self {
            Self::UploadPdb => "upload-pdb",
            Self::UploadMolecule => "upload-molecule",
            Self::TextInput => "text-input",
            Self::VinaDocking => "vina-docking",
            Self::AdmePrediction => "adme-prediction",
            Self::ToxicityPrediction => "toxicity-prediction",
            Self::CrisprDesign => "crispr-design",
            Self::DenovoDesigner => "denovo-designer",
            Self::VirtualScreening => "virtual-screening",
            Self::BindingAffinity => "binding-affinity",
            Self::Filter => "filter",
            Self::Sort => "sort",
            Self::IfThen => "if-then",
            Self::ExportCsv => "export-csv",
            Self::ExportJson => "export-json",
            Self::Visualize => "visualize",
            Self::Other(name) => name,
        }
    }

    /// Palette category. Unknown kinds are treated as backend tools.
    pub fn category(&self) -> NodeCategory {
        match self {
            Self::UploadPdb | Self::UploadMolecule | Self::TextInput => NodeCategory::Input,
            Self::VinaDocking
            | Self::AdmePrediction
            | Self::ToxicityPrediction
            | Self::CrisprDesign
            | Self::DenovoDesigner
            | Self::VirtualScreening
            | Self::BindingAffinity => NodeCategory::Model,
            Self::Filter | Self::Sort | Self::IfThen | Self::Other(_) => NodeCategory::Tool,
            Self::ExportCsv | Self::ExportJson | Self::Visualize => NodeCategory::Output,
        }
    }

    /// Whether nodes of this kind accept incoming connections.
    pub fn has_input(&self) -> bool {
        self.category() != NodeCategory::Input
    }

    /// Whether nodes of this kind may feed other nodes.
    pub fn has_output(&self) -> bool {
        self.category() != NodeCategory::Output
    }

    /// Returns true for kinds whose result is a downloadable file.
    pub fn is_export(&self) -> bool {
        matches!(self, Self::ExportCsv | Self::ExportJson)
    }

    /// Returns true if this kind is not part of the known palette.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Other(_))
    }
}

impl From<&str> for NodeKind {
    fn from(name: &str) -> Self {
        match name {
            "upload-pdb" => Self::UploadPdb,
            "upload-molecule" => Self::UploadMolecule,
            "text-input" => Self::TextInput,
            "vina-docking" => Self::VinaDocking,
            "adme-prediction" => Self::AdmePrediction,
            "toxicity-prediction" => Self::ToxicityPrediction,
            "crispr-design" => Self::CrisprDesign,
            "denovo-designer" => Self::DenovoDesigner,
            "virtual-screening" => Self::VirtualScreening,
            "binding-affinity" => Self::BindingAffinity,
            "filter" => Self::Filter,
            "sort" => Self::Sort,
            "if-then" => Self::IfThen,
            "export-csv" => Self::ExportCsv,
            "export-json" => Self::ExportJson,
            "visualize" => Self::Visualize,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for NodeKind {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canvas coordinates of a node. Carried for round-trip fidelity only.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
#[serde(default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A single step in a workflow graph.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Node {
    /// Opaque identifier assigned by the canvas, unique within a workflow
    pub id: String,

    /// Operation to invoke on the backend
    #[serde(rename = "type")]
    pub kind: NodeKind,

    /// Canvas placement
    #[serde(flatten)]
    pub position: Position,

    /// Parameters declared on the node itself
    #[serde(rename = "inputs", default)]
    pub parameters: Parameters,
}

impl Node {
    /// Creates a node with no parameters at the canvas origin.
    ///
    /// # Example
    ///
    /// ```
    /// use bioflow::workflow::{Node, NodeKind};
    ///
    /// let node = Node::new("dock", "vina-docking")
    ///     .with_param("shots", 200)
    ///     .at(420.0, 80.0);
    /// assert_eq!(node.kind, NodeKind::VinaDocking);
    /// ```
    pub fn new(id: impl Into<String>, kind: impl Into<NodeKind>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            position: Position::default(),
            parameters: Parameters::new(),
        }
    }

    /// Sets one declared parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Places the node on the canvas.
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Position { x, y };
        self
    }
}

/// A directed dependency: `from`'s output feeds `to`'s input.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// A complete workflow: the unit of saving, loading and execution.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Workflow {
    /// Display name, also used as the workflow id in status events
    #[serde(default = "default_name")]
    pub name: String,

    /// Nodes in canvas insertion order
    #[serde(default)]
    pub nodes: Vec<Node>,

    /// Connections in creation order
    #[serde(rename = "connections", default)]
    pub edges: Vec<Edge>,

    /// Format version
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_name() -> String {
    DEFAULT_WORKFLOW_NAME.to_string()
}

fn default_version() -> String {
    FORMAT_VERSION.to_string()
}

impl Workflow {
    /// Creates a new empty workflow.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            version: default_version(),
        }
    }

    /// Creates a workflow from prepared nodes and edges without checking them.
    pub fn from_parts(name: impl Into<String>, nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self {
            name: name.into(),
            nodes,
            edges,
            version: default_version(),
        }
    }

    /// Adds a node, rejecting duplicate ids.
    pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.get_node(&node.id).is_some() {
            return Err(GraphError::DuplicateNode(node.id));
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Removes a node together with every connection touching it.
    pub fn remove_node(&mut self, id: &str) -> Result<Node, GraphError> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;

        self.edges.retain(|e| e.from != id && e.to != id);
        Ok(self.nodes.remove(index))
    }

    /// Connects two existing nodes.
    ///
    /// Mirrors the canvas rules: both endpoints must exist and the same
    /// ordered pair may only be connected once.
    pub fn connect(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        for endpoint in [from, to] {
            if self.get_node(endpoint).is_none() {
                return Err(GraphError::UnknownNode {
                    from: from.to_string(),
                    to: to.to_string(),
                    missing: endpoint.to_string(),
                });
            }
        }

        if self.edges.iter().any(|e| e.from == from && e.to == to) {
            return Err(GraphError::DuplicateEdge {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        self.edges.push(Edge::new(from, to));
        Ok(())
    }

    /// Gets a node by id.
    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Gets a mutable reference to a node by id.
    pub fn get_node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Returns nodes with no incoming connections (entry points).
    pub fn root_nodes(&self) -> Vec<&Node> {
        let targets: HashSet<&str> = self.edges.iter().map(|e| e.to.as_str()).collect();
        self.nodes
            .iter()
            .filter(|n| !targets.contains(n.id.as_str()))
            .collect()
    }

    /// Returns nodes with no outgoing connections (exit points).
    pub fn leaf_nodes(&self) -> Vec<&Node> {
        let sources: HashSet<&str> = self.edges.iter().map(|e| e.from.as_str()).collect();
        self.nodes
            .iter()
            .filter(|n| !sources.contains(n.id.as_str()))
            .collect()
    }

    /// Returns the number of nodes in the workflow.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the workflow has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new(DEFAULT_WORKFLOW_NAME)
    }
}

/// Recorded result of executing one node.
///
/// `data` is meaningful when `success` is true, `error` otherwise.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub success: bool,

    #[serde(default)]
    pub data: Value,

    #[serde(default)]
    pub metadata: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepOutcome {
    /// A successful outcome carrying the backend payload.
    pub fn succeeded(data: Value, metadata: Value) -> Self {
        Self {
            success: true,
            data,
            metadata,
            error: None,
        }
    }

    /// A failed outcome with a human-readable reason.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Value::Null,
            metadata: Value::Null,
            error: Some(error.into()),
        }
    }

    /// Failure reason, or an empty string for successful outcomes.
    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or_default()
    }
}
