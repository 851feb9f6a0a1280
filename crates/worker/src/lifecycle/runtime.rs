//! Host-side lifecycle state machine.
//!
//! ```text
//! Parsed ── install ──▶ Installing ──▶ Waiting ── activate / SKIP_WAITING ──▶ Activating ──▶ Active
//!                           │
//!                           └── failure ──▶ Redundant
//! ```
//!
//! Fetches are only intercepted while `Active`; before that the host serves
//! them itself. A `SKIP_WAITING` received before install completes is held
//! and honoured once the agent is `Waiting`. A failed install is final: there
//! is no retry.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use serde_json::Value;
use shellward_core::{Error, Response};
use tokio::sync::Mutex;

use super::{ActivationReport, InstallReport, MessageOutcome, ServiceAgent};
use crate::event::FetchEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Parsed,
    Installing,
    Waiting,
    Activating,
    Active,
    Redundant,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Parsed => "parsed",
            LifecycleState::Installing => "installing",
            LifecycleState::Waiting => "waiting",
            LifecycleState::Activating => "activating",
            LifecycleState::Active => "active",
            LifecycleState::Redundant => "redundant",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event delivered by the host.
#[derive(Debug, Clone)]
pub enum Event {
    Install,
    Activate,
    Fetch(FetchEvent),
    Message(Value),
}

/// What a dispatched event produced.
#[derive(Debug, Clone)]
pub enum Outcome {
    Installed(InstallReport),
    Activated(ActivationReport),
    /// `None` when the agent does not control fetches yet.
    Responded(Option<Response>),
    Message(MessageOutcome),
}

/// Drives a [`ServiceAgent`] through its lifecycle.
pub struct WorkerRuntime {
    agent: ServiceAgent,
    state: Mutex<LifecycleState>,
    /// Skip-waiting requested before install completed. Read and written
    /// under the `state` lock.
    skip_waiting: AtomicBool,
}

impl WorkerRuntime {
    pub fn new(agent: ServiceAgent) -> Self {
        Self { agent, state: Mutex::new(LifecycleState::Parsed), skip_waiting: AtomicBool::new(false) }
    }

    pub fn agent(&self) -> &ServiceAgent {
        &self.agent
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.lock().await
    }

    /// Move from `from` to `to`, or fail if the current state is not `from`.
    async fn transition(&self, from: LifecycleState, to: LifecycleState) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        if *state != from {
            return Err(Error::InvalidState(format!("cannot move to {to} from {}", *state)));
        }
        tracing::debug!(from = %from, to = %to, "lifecycle transition");
        *state = to;
        Ok(())
    }

    async fn set(&self, to: LifecycleState) {
        let mut state = self.state.lock().await;
        let from = *state;
        tracing::debug!(from = %from, to = %to, "lifecycle transition");
        *state = to;
    }

    /// Install, then activate straight away if the policy says so or a
    /// `SKIP_WAITING` arrived while installing.
    ///
    /// A failed install leaves the runtime `Redundant`.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.transition(LifecycleState::Parsed, LifecycleState::Installing).await?;

        let mut report = match self.agent.install().await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "install failed");
                self.set(LifecycleState::Redundant).await;
                return Err(e);
            }
        };
        report.skip_waiting |= self.enter_waiting().await;

        if report.skip_waiting {
            self.activate().await?;
        }
        Ok(report)
    }

    /// Move to `Waiting`, returning whether a skip-waiting request is pending.
    async fn enter_waiting(&self) -> bool {
        let mut state = self.state.lock().await;
        let from = *state;
        tracing::debug!(from = %from, to = %LifecycleState::Waiting, "lifecycle transition");
        *state = LifecycleState::Waiting;
        self.skip_waiting.swap(false, Ordering::SeqCst)
    }

    /// Hold a skip-waiting request if install has not completed yet.
    async fn defer_skip_waiting(&self) -> bool {
        let state = self.state.lock().await;
        let defer = matches!(*state, LifecycleState::Parsed | LifecycleState::Installing);
        if defer {
            self.skip_waiting.store(true, Ordering::SeqCst);
        }
        defer
    }

    /// Activate a waiting agent.
    pub async fn activate(&self) -> Result<ActivationReport, Error> {
        self.transition(LifecycleState::Waiting, LifecycleState::Activating).await?;
        let report = self.agent.activate().await;
        self.set(LifecycleState::Active).await;
        Ok(report)
    }

    /// Answer a fetch if this agent controls fetches.
    ///
    /// Work registered on the event's wait-until handle may still be running
    /// when this returns.
    pub async fn fetch(&self, event: &FetchEvent) -> Option<Response> {
        if self.state().await != LifecycleState::Active {
            return None;
        }
        Some(self.agent.handle_fetch(event).await)
    }

    /// Handle a control message. `SKIP_WAITING` activates a waiting agent,
    /// is deferred while installing, and is a no-op once activation started.
    pub async fn message(&self, payload: &Value) -> MessageOutcome {
        let outcome = self.agent.handle_message(payload).await;
        if outcome == MessageOutcome::SkipWaiting {
            if self.defer_skip_waiting().await {
                tracing::info!("skip waiting deferred until install completes");
                return outcome;
            }
            match self.activate().await {
                Ok(_) => tracing::info!("activated on request"),
                Err(e) => tracing::debug!(error = %e, "skip waiting ignored"),
            }
        }
        outcome
    }

    /// Handle one event to completion, including any wait-until work a fetch
    /// registered.
    pub async fn dispatch(&self, event: Event) -> Result<Outcome, Error> {
        match event {
            Event::Install => self.install().await.map(Outcome::Installed),
            Event::Activate => self.activate().await.map(Outcome::Activated),
            Event::Fetch(event) => {
                let response = self.fetch(&event).await;
                event.wait_until().settled().await;
                Ok(Outcome::Responded(response))
            }
            Event::Message(payload) => Ok(Outcome::Message(self.message(&payload).await)),
        }
    }
}
