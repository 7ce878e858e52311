//! Workflow Definition Module
//!
//! Provides data structures and utilities for defining, loading,
//! validating and ordering node-graph workflows.
//!
//! # Structure
//!
//! - [`model`]: Core data structures (Node, Edge, Workflow)
//! - [`graph`]: Adjacency view and structural errors
//! - [`parser`]: JSON loading and saving
//! - [`validator`]: Pre-run checks and editor feedback
//! - [`scheduler`]: Topological execution order
//! - [`state`]: Per-run execution state

pub mod graph;
pub mod model;
pub mod parser;
pub mod scheduler;
pub mod state;
pub mod validator;

pub use graph::{Graph, GraphError};
pub use model::{Edge, Node, NodeCategory, NodeKind, Parameters, Position, StepOutcome, Workflow};
pub use parser::{load_workflow, save_workflow, ParseError};
pub use scheduler::{order, SchedulingError};
pub use state::RunState;
pub use validator::{quick_validate, validate, ValidationError};
