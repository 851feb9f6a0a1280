//! worker_status tool implementation.
//!
//! Reports the lifecycle state, the configured version and the open windows.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::Serialize;
use shellward_core::ActivationPolicy;
use shellward_worker::WorkerRuntime;

use crate::platform::{HostPlatform, WindowInfo};
use crate::tools::json_result;

/// Output structure for worker_status tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct WorkerStatusOutput {
    pub state: String,
    pub scope: String,
    pub activation: ActivationPolicy,
    pub shell_namespace: String,
    pub runtime_namespace: String,
    /// App-shell manifest, scope-resolved.
    pub shell_manifest: Vec<String>,
    pub windows: Vec<WindowInfo>,
}

/// Implementation of the worker_status tool.
pub async fn status_impl(runtime: &WorkerRuntime, platform: &HostPlatform) -> Result<CallToolResult, McpError> {
    let agent = runtime.agent();
    let output = WorkerStatusOutput {
        state: runtime.state().await.to_string(),
        scope: agent.scope().base().to_string(),
        activation: agent.activation_policy(),
        shell_namespace: agent.namespaces().shell().to_string(),
        runtime_namespace: agent.namespaces().runtime().to_string(),
        shell_manifest: agent.shell_manifest().iter().map(ToString::to_string).collect(),
        windows: platform.window_info(),
    };

    json_result(&output)
}
