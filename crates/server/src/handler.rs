//! MCP server handler implementation.
//!
//! This module defines the host handler that routes tool calls into the
//! worker runtime.
use std::sync::Arc;

use crate::platform::HostPlatform;
use crate::tools::{
    CacheListParams, WorkerFetchParams, WorkerMessageParams, cache_list::list_impl, worker_fetch::fetch_impl,
    worker_message::message_impl, worker_status::status_impl,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use shellward_worker::WorkerRuntime;

/// The MCP handler hosting one offline agent.
#[derive(Clone)]
pub struct ShellwardHost {
    runtime: Arc<WorkerRuntime>,
    platform: Arc<HostPlatform>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl ShellwardHost {
    /// Create a new host handler.
    pub fn new(runtime: Arc<WorkerRuntime>, platform: Arc<HostPlatform>) -> Self {
        Self { runtime, platform, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Deliver a fetch event to the offline agent. Returns the response the agent chose, or the direct network response while the agent is not active."
    )]
    async fn worker_fetch(&self, params: Parameters<WorkerFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.runtime, &self.platform, params.0).await
    }

    #[tool(
        description = "Post a control message to the agent. {\"type\": \"SKIP_WAITING\"} activates a waiting version; {\"type\": \"SILENT_TERMINATE\"} sends every window to the closed page."
    )]
    async fn worker_message(&self, params: Parameters<WorkerMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.runtime, params.0).await
    }

    #[tool(description = "Report the agent's lifecycle state, version namespaces and open windows.")]
    async fn worker_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.runtime, &self.platform).await
    }

    #[tool(description = "List cache namespaces and the request URLs stored in each.")]
    async fn cache_list(&self, params: Parameters<CacheListParams>) -> Result<CallToolResult, McpError> {
        list_impl(&self.runtime, params.0).await
    }
}

impl ServerHandler for ShellwardHost {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "shellward-host".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
