//! worker_fetch tool implementation.
//!
//! Delivers a fetch event to the agent. While the agent is not active the
//! request goes straight to the network, as an uncontrolled page would.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellward_core::{Credentials, Request, RequestMode, ResponseType};
use shellward_worker::{ClientId, FetchEvent, WorkerRuntime};
use url::Url;

use crate::error::HostError;
use crate::platform::HostPlatform;
use crate::tools::json_result;

/// Input parameters for worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchParams {
    /// Absolute URL to request.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request mode: "navigate" for document loads (default: cors).
    #[serde(default)]
    pub mode: RequestMode,

    /// Credentials mode (default: same-origin).
    #[serde(default)]
    pub credentials: Credentials,

    /// Request headers as name/value pairs.
    #[serde(default)]
    pub headers: Vec<(String, String)>,

    /// Window issuing a navigation; registers the window with the host.
    #[serde(default)]
    pub client_id: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchOutput {
    pub url: String,
    /// Whether the agent answered the request.
    pub controlled: bool,
    /// Request class chosen by the agent, when controlled.
    pub class: Option<String>,
    /// HTTP status; 0 for opaque responses.
    pub status: u16,
    pub response_type: ResponseType,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
    pub body_bytes: usize,
}

fn build_request(params: &WorkerFetchParams) -> Result<Request, HostError> {
    let url = Url::parse(&params.url).map_err(|e| HostError::InvalidInput(format!("invalid url {}: {e}", params.url)))?;
    if params.method.trim().is_empty() {
        return Err(HostError::InvalidInput("method cannot be empty".into()));
    }

    let mut request = Request::get(url)
        .with_method(params.method.trim())
        .with_mode(params.mode)
        .with_credentials(params.credentials);
    for (name, value) in &params.headers {
        if name.trim().is_empty() {
            return Err(HostError::InvalidInput("header name cannot be empty".into()));
        }
        request = request.with_header(name.trim(), value.as_str());
    }
    Ok(request)
}

/// Implementation of the worker_fetch tool.
pub async fn fetch_impl(
    runtime: &WorkerRuntime, platform: &HostPlatform, params: WorkerFetchParams,
) -> Result<CallToolResult, McpError> {
    let request = build_request(&params)?;
    let url = request.url.clone();
    let event = FetchEvent::new(request.clone());

    let (response, class) = match runtime.fetch(&event).await {
        Some(response) => {
            event.wait_until().settled().await;
            (response, Some(runtime.agent().classify(&request).as_str().to_string()))
        }
        None => {
            tracing::debug!(url = %url, "agent not active, fetching directly");
            (runtime.agent().network().fetch(&request).await?, None)
        }
    };
    let controlled = class.is_some();

    if request.is_navigation()
        && let Some(id) = params.client_id.as_deref()
    {
        platform.visit(&ClientId::new(id), url.clone(), controlled);
    }

    let output = WorkerFetchOutput {
        url: url.to_string(),
        controlled,
        class,
        status: response.status,
        response_type: response.kind,
        body: response.text().into_owned(),
        body_bytes: response.body.len(),
        headers: response.headers,
    };

    json_result(&output)
}
