//! Graph Model
//!
//! Read-only adjacency view over a [`Workflow`]. Nodes keep their declared
//! order in an array; an id→index map gives constant-time lookup while the
//! array order stays available as the scheduling tie-break.

use std::collections::HashMap;

use log::debug;
use thiserror::Error;

use super::model::{Edge, Node, Workflow};

/// Structural problems with a workflow's nodes or connections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Connection {from} -> {to} references unknown node '{missing}'")]
    UnknownNode {
        from: String,
        to: String,
        missing: String,
    },

    #[error("Duplicate node ID: '{0}'")]
    DuplicateNode(String),

    #[error("Connection {from} -> {to} already exists")]
    DuplicateEdge { from: String, to: String },

    #[error("Node '{0}' not found")]
    NodeNotFound(String),
}

/// Adjacency derived from a workflow.
///
/// Parallel connections between the same pair of nodes are kept as-is: each
/// one contributes a successor entry and one unit of in-degree.
#[derive(Debug)]
pub struct Graph<'a> {
    workflow: &'a Workflow,
    index: HashMap<&'a str, usize>,
    successors: Vec<Vec<usize>>,
    predecessors: Vec<Vec<usize>>,
}

impl<'a> Graph<'a> {
    /// Builds the adjacency for a workflow.
    ///
    /// Fails if two nodes share an id or a connection points at a node that
    /// does not exist.
    pub fn from_workflow(workflow: &'a Workflow) -> Result<Self, GraphError> {
        let mut index = HashMap::with_capacity(workflow.nodes.len());
        for (i, node) in workflow.nodes.iter().enumerate() {
            if index.insert(node.id.as_str(), i).is_some() {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }

        let mut successors = vec![Vec::new(); workflow.nodes.len()];
        let mut predecessors = vec![Vec::new(); workflow.nodes.len()];

        for edge in &workflow.edges {
            let from = lookup(&index, edge, &edge.from)?;
            let to = lookup(&index, edge, &edge.to)?;
            successors[from].push(to);
            predecessors[to].push(from);
        }

        debug!(
            "Built graph: {} nodes, {} connections",
            workflow.nodes.len(),
            workflow.edges.len()
        );

        Ok(Self {
            workflow,
            index,
            successors,
            predecessors,
        })
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.workflow.nodes.len()
    }

    /// Returns true if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.workflow.nodes.is_empty()
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> &'a [Node] {
        &self.workflow.nodes
    }

    /// Node at a given index.
    pub fn node(&self, index: usize) -> &'a Node {
        &self.workflow.nodes[index]
    }

    /// Looks up a node by id.
    pub fn node_by_id(&self, id: &str) -> Option<&'a Node> {
        self.index_of(id).map(|i| self.node(i))
    }

    /// Position of a node in declaration order.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Successor indices of a node, in connection order.
    pub fn successors(&self, index: usize) -> &[usize] {
        &self.successors[index]
    }

    /// Predecessor indices of a node, in connection order.
    pub fn predecessors(&self, index: usize) -> &[usize] {
        &self.predecessors[index]
    }

    /// Number of incoming connections.
    pub fn in_degree(&self, index: usize) -> usize {
        self.predecessors[index].len()
    }

    /// Connections whose target is `id`, in connection order.
    pub fn incoming<'s>(&'s self, id: &'s str) -> impl Iterator<Item = &'a Edge> + 's {
        self.workflow.edges.iter().filter(move |e| e.to == id)
    }
}

fn lookup(index: &HashMap<&str, usize>, edge: &Edge, id: &str) -> Result<usize, GraphError> {
    index.get(id).copied().ok_or_else(|| GraphError::UnknownNode {
        from: edge.from.clone(),
        to: edge.to.clone(),
        missing: id.to_string(),
    })
}
