//! Workflow Execution Module
//!
//! Runs workflows node by node against a remote backend.
//!
//! # Architecture
//!
//! - [`engine`]: Run coordinator sequencing the plan
//! - [`step`]: Single-node execution and input merging
//! - [`client`]: HTTP client for the execution backend
//! - [`export`]: File emission for export nodes

pub mod client;
pub mod engine;
pub mod export;
pub mod step;

pub use client::{BackendClient, ClientError, Credential, ExecuteNodeRequest, NodeResponse};
pub use engine::{Engine, EngineError, RunStatus, RunSummary};
pub use export::{DirectoryExporter, ExportArtifact, ExportError, ExportHandler};
pub use step::{merge_inputs, run_step, NodeExecutor};
