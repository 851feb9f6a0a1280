//! worker_message tool implementation.
//!
//! Posts a control message to the agent. Recognized `type` values are
//! `SKIP_WAITING` and `SILENT_TERMINATE`; anything else is ignored.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shellward_core::Error;
use shellward_worker::WorkerRuntime;

use crate::tools::json_result;

/// Input parameters for worker_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageParams {
    /// Message payload, e.g. `{"type": "SKIP_WAITING"}`.
    pub payload: Value,
}

/// Output structure for worker_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageOutput {
    /// What the agent did with the message.
    pub outcome: Value,
    /// Lifecycle state after the message was handled.
    pub state: String,
}

/// Implementation of the worker_message tool.
pub async fn message_impl(runtime: &WorkerRuntime, params: WorkerMessageParams) -> Result<CallToolResult, McpError> {
    let outcome = runtime.message(&params.payload).await;
    let outcome = serde_json::to_value(&outcome).map_err(|e| Error::InvalidInput(e.to_string()))?;

    let output = WorkerMessageOutput { outcome, state: runtime.state().await.to_string() };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::offline_host;
    use serde_json::json;
    use shellward_worker::{ClientId, LifecycleState};

    #[tokio::test]
    async fn test_skip_waiting_activates() {
        let (runtime, _platform, _db) = offline_host().await;
        runtime.install().await.unwrap();

        let result = message_impl(&runtime, WorkerMessageParams { payload: json!({"type": "SKIP_WAITING"}) }).await;
        assert!(result.is_ok());
        assert_eq!(runtime.state().await, LifecycleState::Active);
    }

    #[tokio::test]
    async fn test_silent_terminate_moves_windows_to_closed_page() {
        let (runtime, platform, db) = offline_host().await;
        runtime.install().await.unwrap();
        let home = runtime.agent().scope().resolve("").unwrap();
        platform.visit(&ClientId::new("a"), home.clone(), false);
        platform.visit(&ClientId::new("b"), home, false);
        let before = db.namespace_names().await.unwrap();

        message_impl(&runtime, WorkerMessageParams { payload: json!({"type": "SILENT_TERMINATE"}) })
            .await
            .unwrap();

        let closed = runtime.agent().scope().resolve("__closed.html").unwrap();
        assert!(platform.window_info().iter().all(|w| w.location == closed.as_str()));
        assert_eq!(db.namespace_names().await.unwrap(), before);
        assert_eq!(runtime.state().await, LifecycleState::Waiting);
    }

    #[tokio::test]
    async fn test_unknown_message_is_ignored() {
        let (runtime, _platform, _db) = offline_host().await;
        let result = message_impl(&runtime, WorkerMessageParams { payload: json!({"type": "PING"}) }).await;
        assert!(result.is_ok());
        assert_eq!(runtime.state().await, LifecycleState::Parsed);
    }
}
