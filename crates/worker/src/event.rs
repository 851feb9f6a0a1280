//! Events delivered to the agent.
//!
//! A [`FetchEvent`] carries a [`WaitUntil`] handle. Work registered on it
//! (revalidation writes, mostly) keeps running after the response has been
//! returned, and the host awaits [`WaitUntil::settled`] before it suspends
//! the agent. Dropping every handle aborts whatever is still in flight, which
//! is how a requester disconnect abandons a handler.

use std::future::Future;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use shellward_core::{Request, Response};
use tokio::task::JoinSet;

pub const SKIP_WAITING: &str = "SKIP_WAITING";
pub const SILENT_TERMINATE: &str = "SILENT_TERMINATE";

/// Lifetime extension for an event.
#[derive(Clone, Default)]
pub struct WaitUntil {
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl std::fmt::Debug for WaitUntil {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitUntil").field("pending", &self.pending()).finish()
    }
}

impl WaitUntil {
    pub fn new() -> Self {
        Self::default()
    }

    fn tasks(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Keep the event alive until `fut` completes.
    ///
    /// Must be called from within a tokio runtime.
    pub fn extend<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks().spawn(fut);
    }

    /// Number of registered tasks not yet reaped.
    pub fn pending(&self) -> usize {
        self.tasks().len()
    }

    fn take_batch(&self) -> JoinSet<()> {
        mem::take(&mut *self.tasks())
    }

    /// Wait for every registered task, including ones registered while waiting.
    pub async fn settled(&self) {
        loop {
            let mut batch = self.take_batch();
            if batch.is_empty() {
                return;
            }
            while let Some(result) = batch.join_next().await {
                if let Err(e) = result
                    && e.is_panic()
                {
                    tracing::warn!(error = %e, "wait-until task panicked");
                }
            }
        }
    }
}

/// An intercepted request with an optional navigation preload response.
#[derive(Debug, Clone)]
pub struct FetchEvent {
    pub request: Request,
    pub preload: Option<Response>,
    lifetime: WaitUntil,
}

impl FetchEvent {
    pub fn new(request: Request) -> Self {
        Self { request, preload: None, lifetime: WaitUntil::new() }
    }

    pub fn with_preload(mut self, preload: Response) -> Self {
        self.preload = Some(preload);
        self
    }

    pub fn wait_until(&self) -> &WaitUntil {
        &self.lifetime
    }
}

/// A control message from a client view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    SkipWaiting,
    SilentTerminate,
    /// Any other payload; carries the `type` tag when there was one.
    Unrecognized(Option<String>),
}

impl ControlMessage {
    pub fn from_payload(payload: &Value) -> Self {
        match payload.get("type").and_then(Value::as_str) {
            Some(SKIP_WAITING) => ControlMessage::SkipWaiting,
            Some(SILENT_TERMINATE) => ControlMessage::SilentTerminate,
            Some(other) => ControlMessage::Unrecognized(Some(other.to_string())),
            None => ControlMessage::Unrecognized(None),
        }
    }
}
