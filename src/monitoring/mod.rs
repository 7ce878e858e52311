//! Run Monitoring Module
//!
//! Status reporting and timing for workflow runs.
//!
//! # Components
//!
//! - [`events`]: Status events, the [`StatusSink`] interface and its
//!   implementations
//! - [`timeline`]: Per-node timing for Gantt charts

pub mod events;
pub mod timeline;

pub use events::{EventBus, EventRelay, LogSink, NodeStatus, StatusBoard, StatusSink, WorkflowEvent};
pub use timeline::{ExecutionTimeline, NodeSpan};
