//! Versioned cache namespace names and stale-namespace collection.
//!
//! Every namespace the agent creates is named `<prefix>-<role>-<version>`.
//! Because names carry the version, a namespace from an earlier version is
//! unreachable once a newer version activates and can be deleted outright.

use futures_util::future::join_all;
use shellward_core::{CacheStorage, Error};

pub const SHELL_ROLE: &str = "shell";
pub const RUNTIME_ROLE: &str = "runtime";

/// The two namespace identifiers of one agent version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespaces {
    prefix: String,
    shell: String,
    runtime: String,
}

/// Outcome of a garbage collection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GcReport {
    pub deleted: Vec<String>,
    /// Namespaces whose deletion failed; they are retried on the next activation.
    pub failed: Vec<String>,
}

impl Namespaces {
    pub fn new(prefix: &str, version: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            shell: format!("{prefix}-{SHELL_ROLE}-{version}"),
            runtime: format!("{prefix}-{RUNTIME_ROLE}-{version}"),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }

    pub fn runtime(&self) -> &str {
        &self.runtime
    }

    pub fn is_current(&self, name: &str) -> bool {
        name == self.shell || name == self.runtime
    }

    /// Whether `name` belongs to this prefix but not to the current version.
    ///
    /// Ownership requires the `<prefix>-` separator, so prefix `max` never
    /// claims a namespace of an unrelated `maxi` deployment.
    pub fn is_stale(&self, name: &str) -> bool {
        name.strip_prefix(self.prefix.as_str())
            .is_some_and(|rest| rest.starts_with('-'))
            && !self.is_current(name)
    }

    /// Delete every stale namespace.
    ///
    /// Deletions run concurrently and independently: one failure is logged and
    /// recorded, never propagated. Only a failure to enumerate is an error.
    pub async fn collect_garbage(&self, storage: &dyn CacheStorage) -> Result<GcReport, Error> {
        let stale: Vec<String> = storage.keys().await?.into_iter().filter(|name| self.is_stale(name)).collect();

        let results = join_all(stale.into_iter().map(|name| async move {
            let result = storage.delete(&name).await;
            (name, result)
        }))
        .await;

        let mut report = GcReport::default();
        for (name, result) in results {
            match result {
                Ok(_) => {
                    tracing::info!(namespace = %name, "deleted stale cache namespace");
                    report.deleted.push(name);
                }
                Err(e) => {
                    tracing::warn!(namespace = %name, error = %e, "failed to delete stale cache namespace");
                    report.failed.push(name);
                }
            }
        }

        Ok(report)
    }
}
