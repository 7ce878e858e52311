//! Status Events
//!
//! The vocabulary a run reports in, and the sinks that consume it. The same
//! events are produced by the engine directly and relayed from the backend's
//! push channel, so a UI can be driven by either.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

/// A status change reported during a run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    NodeStarted {
        node_id: String,
        node_type: String,
    },
    NodeProgress {
        node_id: String,
        node_type: String,
        #[serde(default)]
        progress: f64,
        #[serde(default)]
        message: String,
    },
    NodeCompleted {
        node_id: String,
        node_type: String,
    },
    NodeError {
        node_id: String,
        node_type: String,
        error: String,
    },
    WorkflowCompleted {
        workflow_id: String,
        /// Wall-clock duration in seconds
        duration: f64,
    },
    WorkflowError {
        workflow_id: String,
        error: String,
    },
}

impl WorkflowEvent {
    /// Wire names of every event type.
    pub const TYPES: [&'static str; 6] = [
        "node_started",
        "node_progress",
        "node_completed",
        "node_error",
        "workflow_completed",
        "workflow_error",
    ];

    /// Node the event concerns, if it is a node event.
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::NodeStarted { node_id, .. }
            | Self::NodeProgress { node_id, .. }
            | Self::NodeCompleted { node_id, .. }
            | Self::NodeError { node_id, .. } => Some(node_id),
            Self::WorkflowCompleted { .. } | Self::WorkflowError { .. } => None,
        }
    }
}

/// Display status of a single node.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Idle,
    Executing,
    Completed,
    Error,
}

/// Receives status updates from a run.
///
/// Calls are synchronous and made on the run's own task; a slow sink slows
/// the run.
pub trait StatusSink: Send + Sync {
    fn on_event(&self, event: &WorkflowEvent);

    /// Overall run progress in percent.
    fn on_progress(&self, _percent: f64) {}
}

/// Renders events as log lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl StatusSink for LogSink {
    fn on_event(&self, event: &WorkflowEvent) {
        match event {
            WorkflowEvent::NodeStarted { node_id, node_type } => {
                info!("Running node '{}' ({})", node_id, node_type)
            }
            WorkflowEvent::NodeProgress {
                node_id,
                progress,
                message,
                ..
            } => info!("Node '{}' {:.0}% {}", node_id, progress, message),
            WorkflowEvent::NodeCompleted { node_id, .. } => {
                info!("Node '{}' completed", node_id)
            }
            WorkflowEvent::NodeError { node_id, error, .. } => {
                error!("Node '{}' failed: {}", node_id, error)
            }
            WorkflowEvent::WorkflowCompleted {
                workflow_id,
                duration,
            } => info!("Workflow '{}' completed in {:.2}s", workflow_id, duration),
            WorkflowEvent::WorkflowError { workflow_id, error } => {
                error!("Workflow '{}' failed: {}", workflow_id, error)
            }
        }
    }

    fn on_progress(&self, percent: f64) {
        debug!("Progress: {:.0}%", percent);
    }
}

#[derive(Debug, Default)]
struct Board {
    nodes: HashMap<String, NodeStatus>,
    errors: HashMap<String, String>,
    progress: f64,
    events: usize,
    finished: Option<Result<f64, String>>,
}

/// Keeps the latest status of every node, for UIs that poll.
#[derive(Debug, Default)]
pub struct StatusBoard {
    inner: Mutex<Board>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn board(&self) -> MutexGuard<'_, Board> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Latest status of a node; nodes never reported are `Idle`.
    pub fn status(&self, node_id: &str) -> NodeStatus {
        self.board()
            .nodes
            .get(node_id)
            .copied()
            .unwrap_or(NodeStatus::Idle)
    }

    /// Error reported for a node, if any.
    pub fn error(&self, node_id: &str) -> Option<String> {
        self.board().errors.get(node_id).cloned()
    }

    /// Last reported run progress in percent.
    pub fn progress(&self) -> f64 {
        self.board().progress
    }

    /// Number of events received.
    pub fn event_count(&self) -> usize {
        self.board().events
    }

    /// How the run ended: duration in seconds, or the terminal error.
    /// `None` while the run is still going.
    pub fn finished(&self) -> Option<Result<f64, String>> {
        self.board().finished.clone()
    }

    /// Resets every node to `Idle` and clears progress.
    pub fn reset(&self) {
        *self.board() = Board::default();
    }
}

impl StatusSink for StatusBoard {
    fn on_event(&self, event: &WorkflowEvent) {
        let mut board = self.board();
        board.events += 1;

        match event {
            WorkflowEvent::NodeStarted { node_id, .. }
            | WorkflowEvent::NodeProgress { node_id, .. } => {
                board.nodes.insert(node_id.clone(), NodeStatus::Executing);
            }
            WorkflowEvent::NodeCompleted { node_id, .. } => {
                board.nodes.insert(node_id.clone(), NodeStatus::Completed);
            }
            WorkflowEvent::NodeError { node_id, error, .. } => {
                board.nodes.insert(node_id.clone(), NodeStatus::Error);
                board.errors.insert(node_id.clone(), error.clone());
            }
            WorkflowEvent::WorkflowCompleted { duration, .. } => {
                board.finished = Some(Ok(*duration));
            }
            WorkflowEvent::WorkflowError { error, .. } => {
                board.finished = Some(Err(error.clone()));
            }
        }
    }

    fn on_progress(&self, percent: f64) {
        self.board().progress = percent;
    }
}

/// Fans events out to any number of async subscribers.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<WorkflowEvent>,
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` events per subscriber.
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: WorkflowEvent) {
        // No receivers is fine.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl StatusSink for EventBus {
    fn on_event(&self, event: &WorkflowEvent) {
        self.publish(event.clone());
    }
}

/// Decodes events relayed as JSON text and forwards them to a sink.
pub struct EventRelay<S> {
    sink: S,
}

impl<S: StatusSink> EventRelay<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Handles one relayed message.
    ///
    /// Unparsable messages and unknown event types are logged and dropped.
    pub fn dispatch(&self, message: &str) -> Option<WorkflowEvent> {
        let value: Value = match serde_json::from_str(message) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to parse relayed message: {}", e);
                return None;
            }
        };

        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if !WorkflowEvent::TYPES.contains(&kind.as_str()) {
            warn!("Unknown message type: '{}'", kind);
            return None;
        }

        match serde_json::from_value::<WorkflowEvent>(value) {
            Ok(event) => {
                self.sink.on_event(&event);
                Some(event)
            }
            Err(e) => {
                warn!("Malformed '{}' message: {}", kind, e);
                None
            }
        }
    }
}
