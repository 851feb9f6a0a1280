//! Structured errors for the host's tool surface.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Errors raised by tool argument handling, before the agent is involved.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Invalid input parameters (e.g., a malformed URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The requested cache namespace does not exist.
    #[error("UNKNOWN_NAMESPACE: {0}")]
    UnknownNamespace(String),
}

impl From<HostError> for McpError {
    fn from(err: HostError) -> Self {
        let (code, message) = match &err {
            HostError::InvalidInput(msg) => (-32602, msg.clone()),
            HostError::UnknownNamespace(name) => (-32004, format!("unknown namespace: {name}")),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
