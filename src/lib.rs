//! BioFlow - Visual Workflow Execution Engine
//!
//! Runs node-graph workflows built on the BioFlow canvas. Each node is one
//! remote operation (docking, property prediction, filtering, export) and
//! connections carry one node's results into the next. The engine orders the
//! graph, runs nodes one at a time against the execution backend, and
//! reports status as it goes.
//!
//! # Architecture
//!
//! The library is organized into three main modules:
//!
//! - [`workflow`]: Workflow model, JSON persistence, validation and ordering
//! - [`execution`]: Run coordinator, backend client and export handling
//! - [`monitoring`]: Status events, sinks and execution timeline
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bioflow::execution::{BackendClient, Credential, Engine};
//! use bioflow::monitoring::LogSink;
//! use bioflow::load_workflow;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load a workflow saved by the canvas
//!     let workflow = load_workflow("screen.json")?;
//!
//!     // Point the engine at the execution backend
//!     let client = BackendClient::new("http://127.0.0.1:5002/workflow")?;
//!     let mut engine = Engine::new(Arc::new(client), Arc::new(LogSink));
//!
//!     // Execute the workflow
//!     engine.run(&workflow, &Credential::new("demo_key")).await?;
//!     Ok(())
//! }
//! ```

pub mod execution;
pub mod monitoring;
pub mod workflow;

// Re-export commonly used types
pub use execution::engine::Engine;
pub use workflow::model::{Edge, Node, NodeKind, Workflow};
pub use workflow::parser::{load_workflow, save_workflow};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "BioFlow";
