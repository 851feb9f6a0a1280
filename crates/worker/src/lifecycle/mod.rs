//! Lifecycle Controller.
//!
//! [`ServiceAgent`] holds everything one agent version needs and never
//! changes after construction. It performs the work of each lifecycle event;
//! which events are allowed when is decided by [`runtime::WorkerRuntime`].
//!
//! - `install` pre-caches the app shell and the offline document
//! - `activate` enables navigation preload, collects stale namespaces and
//!   claims open views
//! - control messages request activation or redirect every view to the
//!   closed page

pub mod runtime;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use shellward_client::Network;
use shellward_core::{ActivationPolicy, AgentConfig, CacheStorage, Credentials, Error, Request, Response, Scope};
use url::Url;

use crate::classify::{Classifier, RequestClass};
use crate::event::{ControlMessage, FetchEvent};
use crate::namespace::{GcReport, Namespaces};
use crate::offline::OfflinePage;
use crate::platform::Platform;
use crate::strategy::StrategyEngine;

/// Reserved navigation target of a silent terminate.
pub const CLOSED_KEY: &str = "__closed.html";

/// Outcome of an install.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    /// Manifest URLs stored in the shell namespace.
    pub cached: Vec<Url>,
    /// Manifest URLs that failed to fetch or store.
    pub skipped: Vec<Url>,
    /// Whether the configured policy activates straight away.
    pub skip_waiting: bool,
}

/// Outcome of an activation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivationReport {
    pub navigation_preload: bool,
    pub deleted: Vec<String>,
    pub failed: Vec<String>,
    pub claimed: bool,
}

impl ActivationReport {
    fn with_gc(mut self, gc: GcReport) -> Self {
        self.deleted = gc.deleted;
        self.failed = gc.failed;
        self
    }
}

/// Result of handling a control message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MessageOutcome {
    /// Activation was requested.
    SkipWaiting,
    /// Views were sent to the closed page.
    Terminated { navigated: usize, failed: usize },
    Ignored,
}

/// The offline-caching agent for one version of one site.
pub struct ServiceAgent {
    scope: Scope,
    activation: ActivationPolicy,
    namespaces: Namespaces,
    shell_manifest: Vec<Url>,
    closed_page: Url,
    classifier: Classifier,
    offline: Arc<OfflinePage>,
    strategies: StrategyEngine,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    platform: Arc<dyn Platform>,
}

impl ServiceAgent {
    pub fn new(
        config: &AgentConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>, platform: Arc<dyn Platform>,
    ) -> Result<Self, Error> {
        config.validate().map_err(|e| Error::InvalidInput(e.to_string()))?;
        let scope = config.scope()?;
        let namespaces = Namespaces::new(&config.prefix, &config.version);
        let shell_manifest = config
            .shell_assets
            .iter()
            .map(|asset| scope.resolve(asset))
            .collect::<Result<Vec<_>, _>>()?;
        let offline = Arc::new(OfflinePage::new(&scope, &config.theme_color, &config.background_color)?);
        let strategies = StrategyEngine::new(
            Arc::clone(&storage),
            Arc::clone(&network),
            namespaces.clone(),
            Arc::clone(&offline),
            &scope,
        )?;

        Ok(Self {
            closed_page: scope.resolve(CLOSED_KEY)?,
            classifier: Classifier::from_config(config, &scope),
            activation: config.activation,
            scope,
            namespaces,
            shell_manifest,
            offline,
            strategies,
            storage,
            network,
            platform,
        })
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    pub fn activation_policy(&self) -> ActivationPolicy {
        self.activation
    }

    pub fn shell_manifest(&self) -> &[Url] {
        &self.shell_manifest
    }

    pub fn offline(&self) -> &OfflinePage {
        &self.offline
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    pub fn network(&self) -> &Arc<dyn Network> {
        &self.network
    }

    pub fn classify(&self, request: &Request) -> RequestClass {
        self.classifier.classify(request)
    }

    /// Pre-cache the app shell and the offline document.
    ///
    /// Manifest entries are fetched one by one and only 2xx responses are
    /// stored; a failing entry is skipped. Failing to open the shell namespace
    /// or to store the offline document fails the install.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let shell = self.namespaces.shell();
        self.storage
            .open(shell)
            .await
            .map_err(|e| Error::InstallFailed(format!("cannot open {shell}: {e}")))?;

        let mut report =
            InstallReport { skip_waiting: self.activation == ActivationPolicy::Immediate, ..Default::default() };

        for url in &self.shell_manifest {
            match self.add_to_shell(url).await {
                Ok(()) => report.cached.push(url.clone()),
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "skipping shell asset");
                    report.skipped.push(url.clone());
                }
            }
        }

        self.storage
            .put(shell, &self.offline.request(), &self.offline.synthesize())
            .await
            .map_err(|e| Error::InstallFailed(format!("cannot store offline document: {e}")))?;

        tracing::info!(
            namespace = shell,
            cached = report.cached.len(),
            skipped = report.skipped.len(),
            "install complete"
        );
        Ok(report)
    }

    async fn add_to_shell(&self, url: &Url) -> Result<(), Error> {
        let request = Request::get(url.clone()).with_credentials(Credentials::SameOrigin);
        let response: Response = self.network.fetch(&request).await?;
        if !response.is_ok() {
            return Err(Error::Network(format!("status {}", response.status)));
        }
        self.storage.put(self.namespaces.shell(), &request, &response).await
    }

    /// Enable navigation preload, collect stale namespaces, claim open views.
    ///
    /// Every step is best-effort; failures are logged and recorded in the
    /// report.
    pub async fn activate(&self) -> ActivationReport {
        let mut report = ActivationReport::default();

        if self.platform.supports_navigation_preload() {
            match self.platform.enable_navigation_preload().await {
                Ok(()) => report.navigation_preload = true,
                Err(e) => tracing::debug!(error = %e, "navigation preload not enabled"),
            }
        }

        match self.namespaces.collect_garbage(self.storage.as_ref()).await {
            Ok(gc) => report = report.with_gc(gc),
            Err(e) => tracing::warn!(error = %e, "failed to enumerate cache namespaces"),
        }

        match self.platform.claim().await {
            Ok(()) => report.claimed = true,
            Err(e) => tracing::warn!(error = %e, "failed to claim clients"),
        }

        tracing::info!(
            namespace = self.namespaces.shell(),
            deleted = report.deleted.len(),
            preload = report.navigation_preload,
            "activation complete"
        );
        report
    }

    /// Handle a control message payload. Unknown types are ignored.
    pub async fn handle_message(&self, payload: &Value) -> MessageOutcome {
        match ControlMessage::from_payload(payload) {
            ControlMessage::SkipWaiting => MessageOutcome::SkipWaiting,
            ControlMessage::SilentTerminate => self.terminate_views().await,
            ControlMessage::Unrecognized(kind) => {
                tracing::debug!(kind = ?kind, "ignoring control message");
                MessageOutcome::Ignored
            }
        }
    }

    /// Navigate every window, controlled or not, to the closed page.
    ///
    /// Neither storage nor registration is touched.
    async fn terminate_views(&self) -> MessageOutcome {
        let clients = match self.platform.window_clients(true).await {
            Ok(clients) => clients,
            Err(e) => {
                tracing::warn!(error = %e, "failed to list clients");
                return MessageOutcome::Terminated { navigated: 0, failed: 0 };
            }
        };

        let (mut navigated, mut failed) = (0, 0);
        for client in &clients {
            match self.platform.navigate(client, &self.closed_page).await {
                Ok(()) => navigated += 1,
                Err(e) => {
                    tracing::debug!(client = %client, error = %e, "client did not navigate");
                    failed += 1;
                }
            }
        }

        tracing::info!(navigated, failed, "silent terminate");
        MessageOutcome::Terminated { navigated, failed }
    }

    /// Answer an intercepted request.
    pub async fn handle_fetch(&self, event: &FetchEvent) -> Response {
        let class = self.classify(&event.request);
        self.strategies.respond(class, event).await
    }
}
