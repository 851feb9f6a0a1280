//! MCP tool implementations.
//!
//! This module contains all tools exposed by the shellward host.

pub mod cache_list;
pub mod worker_fetch;
pub mod worker_message;
pub mod worker_status;

pub use cache_list::CacheListParams;
pub use worker_fetch::WorkerFetchParams;
pub use worker_message::WorkerMessageParams;

use rmcp::{ErrorData as McpError, model::{CallToolResult, Content}};
use serde::Serialize;
use shellward_core::Error;

/// Serialize a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
