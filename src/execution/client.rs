//! Backend Client
//!
//! HTTP client for the node execution backend. Each node runs as a single
//! `POST <base>/execute-node` call authorised with a bearer credential.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client as HttpClient, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::workflow::Parameters;

use super::step::NodeExecutor;

/// Default backend location used by the CLI.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5002/workflow";

/// Message used when the backend rejects a node without saying why.
pub const GENERIC_FAILURE: &str = "Node execution failed";

/// Errors talking to the backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection, timeout or body decoding failure.
    #[error("Backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),
}

/// Bearer credential supplied by the caller for a run.
///
/// The value never appears in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token, for building the authorization header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(****)")
    }
}

impl From<&str> for Credential {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for Credential {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// Body of an `execute-node` call.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExecuteNodeRequest {
    pub node_type: String,
    pub node_id: String,
    pub inputs: Parameters,
}

/// Successful `execute-node` response.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct NodeResponse {
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub metadata: Value,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Client for the node execution backend.
///
/// # Example
///
/// ```no_run
/// use bioflow::execution::BackendClient;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = BackendClient::new("http://127.0.0.1:5002/workflow")?
///     .with_timeout(Duration::from_secs(120))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    http: HttpClient,
    timeout: Option<Duration>,
}

impl BackendClient {
    /// Creates a client for the given base URL.
    ///
    /// The URL must start with `http://` or `https://`. Requests wait for
    /// the backend indefinitely unless [`with_timeout`](Self::with_timeout)
    /// is used.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let base_url = base_url.into();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ClientError::InvalidUrl(format!(
                "URL must start with http:// or https://, got: {}",
                base_url
            )));
        }

        let http = HttpClient::builder().build()?;

        Ok(Self {
            base_url,
            http,
            timeout: None,
        })
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ClientError> {
        self.http = HttpClient::builder().timeout(timeout).build()?;
        self.timeout = Some(timeout);
        Ok(self)
    }

    /// Per-request timeout, if one was set.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Runs one node on the backend.
    pub async fn execute_node(
        &self,
        request: &ExecuteNodeRequest,
        credential: &Credential,
    ) -> Result<NodeResponse, ClientError> {
        let url = self.url("execute-node");
        debug!("POST {} ({} '{}')", url, request.node_type, request.node_id);

        let response = self
            .http
            .post(&url)
            .bearer_auth(credential.expose())
            .json(request)
            .send()
            .await?;

        handle_response(response).await
    }
}

#[async_trait]
impl NodeExecutor for BackendClient {
    async fn execute_node(
        &self,
        request: &ExecuteNodeRequest,
        credential: &Credential,
    ) -> Result<NodeResponse, ClientError> {
        BackendClient::execute_node(self, request, credential).await
    }
}

async fn handle_response(response: Response) -> Result<NodeResponse, ClientError> {
    let status = response.status();

    if status.is_success() {
        let body = response.text().await?;
        return serde_json::from_str(&body)
            .map_err(|e| ClientError::InvalidResponse(e.to_string()));
    }

    // Any text is accepted here; a body that is not `{"error": ...}` falls
    // back to the generic message.
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| GENERIC_FAILURE.to_string());

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_rejects_bad_url() {
        let result = BackendClient::new("localhost:5002");
        assert!(matches!(result, Err(ClientError::InvalidUrl(_))));
    }

    #[test]
    fn test_client_accepts_http_and_https() {
        assert!(BackendClient::new("http://127.0.0.1:5002/workflow").is_ok());
        assert!(BackendClient::new("https://bio.example.org/workflow").is_ok());
    }

    #[test]
    fn test_client_has_no_timeout_by_default() {
        let client = BackendClient::new("http://127.0.0.1:5002/workflow").unwrap();
        assert_eq!(client.timeout(), None);

        let client = client.with_timeout(Duration::from_secs(600)).unwrap();
        assert_eq!(client.timeout(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_url_joins_path() {
        let client = BackendClient::new("http://127.0.0.1:5002/workflow/").unwrap();
        assert_eq!(
            client.url("execute-node"),
            "http://127.0.0.1:5002/workflow/execute-node"
        );
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = Credential::new("sk-very-secret");
        let shown = format!("{:?}", credential);

        assert!(!shown.contains("very-secret"));
        assert_eq!(credential.expose(), "sk-very-secret");
    }

    #[test]
    fn test_request_wire_format() {
        let mut inputs = Parameters::new();
        inputs.insert("shots".to_string(), json!(100));
        let request = ExecuteNodeRequest {
            node_type: "vina-docking".to_string(),
            node_id: "n2".to_string(),
            inputs,
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "node_type": "vina-docking", "node_id": "n2", "inputs": { "shots": 100 } })
        );
    }

    #[test]
    fn test_response_missing_fields_default() {
        let response: NodeResponse = serde_json::from_value(json!({ "data": { "x": 1 } })).unwrap();
        assert_eq!(response.data, json!({ "x": 1 }));
        assert_eq!(response.metadata, Value::Null);
    }

    #[test]
    fn test_api_error_displays_backend_message() {
        let err = ClientError::Api {
            status: 500,
            message: "Receptor file missing".to_string(),
        };
        assert_eq!(err.to_string(), "Receptor file missing");
    }
}
