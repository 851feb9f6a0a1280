//! shellward-host entry point.
//!
//! Loads the agent configuration, opens cache storage, installs the agent
//! and serves it over MCP on stdio. Logging goes to stderr to avoid
//! interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use shellward_client::{FetchConfig, HttpNetwork};
use shellward_core::{AgentConfig, CacheDb};
use shellward_worker::{ServiceAgent, WorkerRuntime};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod platform;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AgentConfig::load().context("loading configuration")?;
    let scope = config.scope()?;
    tracing::info!(scope = %scope.base(), prefix = %config.prefix, version = %config.version, "starting shellward-host");

    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("opening cache storage at {}", config.db_path.display()))?;
    let network = HttpNetwork::new(FetchConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
        origin: Some(scope.origin()),
        ..Default::default()
    })?;
    let platform = Arc::new(platform::HostPlatform::new());

    let agent = ServiceAgent::new(&config, Arc::new(db), Arc::new(network), platform.clone())?;
    let runtime = Arc::new(WorkerRuntime::new(agent));

    match runtime.install().await {
        Ok(report) => tracing::info!(
            cached = report.cached.len(),
            skipped = report.skipped.len(),
            state = %runtime.state().await,
            "agent installed"
        ),
        Err(e) => tracing::error!(error = %e, "agent install failed; serving uncontrolled"),
    }

    let handler = handler::ShellwardHost::new(runtime, platform);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
