//! cache_list tool implementation.
//!
//! Lists cache namespaces and the request URLs stored in each.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellward_worker::WorkerRuntime;

use crate::error::HostError;
use crate::tools::json_result;

/// Parameters for the cache_list tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheListParams {
    /// Only list this namespace.
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NamespaceListing {
    pub name: String,
    /// Belongs to the running version.
    pub current: bool,
    /// Belongs to an earlier version and will be deleted at the next activation.
    pub stale: bool,
    pub entries: Vec<String>,
}

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheListOutput {
    pub namespaces: Vec<NamespaceListing>,
}

/// Implementation of the cache_list tool.
pub async fn list_impl(runtime: &WorkerRuntime, params: CacheListParams) -> Result<CallToolResult, McpError> {
    let agent = runtime.agent();
    let storage = agent.storage();

    let names = match params.namespace {
        Some(name) => {
            if !storage.has(&name).await? {
                return Err(HostError::UnknownNamespace(name).into());
            }
            vec![name]
        }
        None => storage.keys().await?,
    };

    let mut namespaces = Vec::with_capacity(names.len());
    for name in names {
        let entries = storage.requests(&name).await?.iter().map(ToString::to_string).collect();
        namespaces.push(NamespaceListing {
            current: agent.namespaces().is_current(&name),
            stale: agent.namespaces().is_stale(&name),
            name,
            entries,
        });
    }

    json_result(&CacheListOutput { namespaces })
}
