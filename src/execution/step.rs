//! Individual Step Execution
//!
//! Runs a single node:
//! - Merges declared parameters with upstream data
//! - Invokes the backend through a [`NodeExecutor`]
//! - Folds every failure into a [`StepOutcome`]
//!
//! Nothing here touches run state; the coordinator records the outcome.

use async_trait::async_trait;
use log::{debug, error};
use serde_json::Value;

use crate::workflow::{Node, Parameters, StepOutcome};

use super::client::{ClientError, Credential, ExecuteNodeRequest, NodeResponse};

/// Key under which a predecessor's result is passed to the next node.
pub const UPSTREAM_KEY: &str = "upstream_data";

/// Anything that can run a node remotely.
///
/// [`BackendClient`](super::client::BackendClient) is the production
/// implementation; tests substitute in-memory doubles.
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    async fn execute_node(
        &self,
        request: &ExecuteNodeRequest,
        credential: &Credential,
    ) -> Result<NodeResponse, ClientError>;
}

/// Effective inputs for a node: declared parameters overlaid with upstream
/// values. Upstream wins on key collision.
pub fn merge_inputs(parameters: &Parameters, upstream: &Parameters) -> Parameters {
    let mut inputs = parameters.clone();
    for (key, value) in upstream {
        inputs.insert(key.clone(), value.clone());
    }
    inputs
}

/// Builds the upstream inputs from predecessor results, in connection order.
///
/// Every successful predecessor writes its data under [`UPSTREAM_KEY`], so
/// with several predecessors the last one wins.
pub fn upstream_inputs<'a>(predecessors: impl IntoIterator<Item = &'a StepOutcome>) -> Parameters {
    let mut upstream = Parameters::new();
    for outcome in predecessors.into_iter().filter(|o| o.success) {
        upstream.insert(UPSTREAM_KEY.to_string(), outcome.data.clone());
    }
    upstream
}

/// Executes a single node and returns its outcome.
///
/// Backend rejections carry the backend's message; transport failures carry a
/// description of what went wrong. Either way the result is a failed outcome
/// rather than an error, so the caller handles both identically.
pub async fn run_step(
    executor: &dyn NodeExecutor,
    node: &Node,
    upstream: &Parameters,
    credential: &Credential,
) -> StepOutcome {
    let request = ExecuteNodeRequest {
        node_type: node.kind.to_string(),
        node_id: node.id.clone(),
        inputs: merge_inputs(&node.parameters, upstream),
    };

    debug!(
        "Node '{}' inputs: {}",
        node.id,
        Value::Object(request.inputs.clone())
    );

    match executor.execute_node(&request, credential).await {
        Ok(response) => StepOutcome::succeeded(response.data, response.metadata),
        Err(ClientError::Api { status, message }) => {
            error!("Node '{}' rejected by backend ({}): {}", node.id, status, message);
            StepOutcome::failed(message)
        }
        Err(e) => {
            error!("Node '{}' could not reach backend: {}", node.id, e);
            StepOutcome::failed(e.to_string())
        }
    }
}
