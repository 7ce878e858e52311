//! Workflow Execution Engine
//!
//! The run coordinator. For one workflow it:
//! - Validates, builds the graph and computes the execution order
//! - Runs nodes one at a time, feeding each its predecessors' results
//! - Reports status and progress to an injected [`StatusSink`]
//! - Hands export payloads to an optional [`ExportHandler`]
//! - Stops at the first failing node
//!
//! Nothing runs until the whole plan is known: a cycle or a dangling
//! connection fails the run before the backend is contacted.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use thiserror::Error;

use crate::monitoring::{ExecutionTimeline, StatusSink, WorkflowEvent};
use crate::workflow::{
    order, validate, Graph, GraphError, Node, RunState, SchedulingError, StepOutcome,
    ValidationError, Workflow,
};

use super::client::Credential;
use super::export::{ExportArtifact, ExportHandler};
use super::step::{run_step, upstream_inputs, NodeExecutor};

/// Why a run ended in failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Scheduling(#[from] SchedulingError),

    #[error("Node '{node_id}' failed: {message}")]
    StepFailed {
        node_id: String,
        node_type: String,
        message: String,
    },
}

/// Lifecycle of the engine's current run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    Idle,
    Running,
    Completed,
    Failed(EngineError),
}

impl RunStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub workflow_id: String,
    pub plan: Vec<String>,
    pub outcomes: HashMap<String, StepOutcome>,
    pub duration: Duration,
}

/// Workflow execution engine.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use bioflow::execution::{BackendClient, Credential, Engine};
/// use bioflow::monitoring::LogSink;
/// use bioflow::load_workflow;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let workflow = load_workflow("screen.json")?;
///     let client = BackendClient::new("http://127.0.0.1:5002/workflow")?;
///
///     let mut engine = Engine::new(Arc::new(client), Arc::new(LogSink));
///     let summary = engine.run(&workflow, &Credential::new("demo_key")).await?;
///     println!("{} nodes in {:.2?}", summary.plan.len(), summary.duration);
///     Ok(())
/// }
/// ```
pub struct Engine {
    executor: Arc<dyn NodeExecutor>,
    sink: Arc<dyn StatusSink>,
    exporter: Option<Arc<dyn ExportHandler>>,
    status: RunStatus,
    state: Option<RunState>,
    timeline: ExecutionTimeline,
}

impl Engine {
    /// Creates an idle engine.
    pub fn new(executor: Arc<dyn NodeExecutor>, sink: Arc<dyn StatusSink>) -> Self {
        Self {
            executor,
            sink,
            exporter: None,
            status: RunStatus::Idle,
            state: None,
            timeline: ExecutionTimeline::new(),
        }
    }

    /// Sets the handler that receives export-node payloads.
    pub fn set_exporter(&mut self, exporter: Arc<dyn ExportHandler>) {
        self.exporter = Some(exporter);
    }

    /// Status of the most recent run.
    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    /// State of the most recent run, if it got as far as scheduling.
    pub fn state(&self) -> Option<&RunState> {
        self.state.as_ref()
    }

    /// Timing of the most recent run.
    pub fn timeline(&self) -> &ExecutionTimeline {
        &self.timeline
    }

    /// Computes the execution order without running anything.
    pub fn plan(workflow: &Workflow) -> Result<Vec<String>, EngineError> {
        let (_, plan) = prepare(workflow)?;
        Ok(plan)
    }

    /// Executes the workflow.
    ///
    /// Taking `&mut self` means one engine runs one workflow at a time.
    /// Starting a new run discards the previous run's state.
    ///
    /// # Returns
    ///
    /// * `Ok(RunSummary)` - Every node succeeded
    /// * `Err(EngineError)` - The workflow was rejected before running, or a
    ///   node failed; outcomes recorded so far stay available via
    ///   [`Engine::state`]
    pub async fn run(
        &mut self,
        workflow: &Workflow,
        credential: &Credential,
    ) -> Result<RunSummary, EngineError> {
        let workflow_id = workflow.name.clone();

        self.status = RunStatus::Running;
        self.state = None;
        self.timeline = ExecutionTimeline::new();

        info!("Starting workflow '{}'", workflow_id);

        let (graph, plan) = match prepare(workflow) {
            Ok(prepared) => prepared,
            Err(e) => return Err(self.fail(&workflow_id, e)),
        };

        self.sink.on_progress(0.0);

        let mut state = RunState::new(plan);
        let result = self.execute_plan(&graph, &mut state, credential).await;
        let duration = state.elapsed();
        let plan = state.plan().to_vec();
        let outcomes = state.outcomes().clone();
        self.state = Some(state);

        if let Err(e) = result {
            return Err(self.fail(&workflow_id, e));
        }

        self.sink.on_progress(100.0);
        self.sink.on_event(&WorkflowEvent::WorkflowCompleted {
            workflow_id: workflow_id.clone(),
            duration: duration.as_secs_f64(),
        });
        self.status = RunStatus::Completed;

        info!(
            "Workflow '{}' completed in {:.2}s",
            workflow_id,
            duration.as_secs_f64()
        );

        Ok(RunSummary {
            workflow_id,
            plan,
            outcomes,
            duration,
        })
    }

    async fn execute_plan(
        &mut self,
        graph: &Graph<'_>,
        state: &mut RunState,
        credential: &Credential,
    ) -> Result<(), EngineError> {
        while let Some(node_id) = state.current() {
            let node = graph
                .node_by_id(node_id)
                .ok_or_else(|| GraphError::NodeNotFound(node_id.to_string()))?;
            let node_type = node.kind.to_string();

            let upstream =
                upstream_inputs(graph.incoming(&node.id).filter_map(|e| state.outcome(&e.from)));

            self.sink.on_event(&WorkflowEvent::NodeStarted {
                node_id: node.id.clone(),
                node_type: node_type.clone(),
            });
            self.timeline.start(&node.id);

            let outcome = run_step(self.executor.as_ref(), node, &upstream, credential).await;
            self.timeline.finish(&node.id, outcome.success);

            if !outcome.success {
                let message = outcome.error_message().to_string();
                self.sink.on_event(&WorkflowEvent::NodeError {
                    node_id: node.id.clone(),
                    node_type: node_type.clone(),
                    error: message.clone(),
                });
                state.record(outcome);

                return Err(EngineError::StepFailed {
                    node_id: node.id.clone(),
                    node_type,
                    message,
                });
            }

            self.sink.on_event(&WorkflowEvent::NodeCompleted {
                node_id: node.id.clone(),
                node_type,
            });
            self.export(node, &outcome);
            state.record(outcome);

            debug!(
                "Progress: {}/{} nodes",
                state.cursor(),
                state.plan().len()
            );
            self.sink.on_progress(state.progress());
        }

        Ok(())
    }

    fn export(&self, node: &Node, outcome: &StepOutcome) {
        if !node.kind.is_export() {
            return;
        }

        let Some(artifact) = ExportArtifact::from_outcome(node, outcome) else {
            warn!("Export node '{}' returned no file data", node.id);
            return;
        };

        match &self.exporter {
            Some(exporter) => {
                if let Err(e) = exporter.export(&artifact) {
                    warn!("Export from node '{}' failed: {}", node.id, e);
                }
            }
            None => debug!(
                "No export handler configured; dropping '{}'",
                artifact.filename
            ),
        }
    }

    fn fail(&mut self, workflow_id: &str, err: EngineError) -> EngineError {
        error!("Workflow '{}' failed: {}", workflow_id, err);

        self.sink.on_event(&WorkflowEvent::WorkflowError {
            workflow_id: workflow_id.to_string(),
            error: err.to_string(),
        });
        self.status = RunStatus::Failed(err.clone());
        err
    }
}

fn prepare(workflow: &Workflow) -> Result<(Graph<'_>, Vec<String>), EngineError> {
    validate(workflow)?;
    let graph = Graph::from_workflow(workflow)?;
    let plan = order(&graph)?;
    Ok((graph, plan))
}
