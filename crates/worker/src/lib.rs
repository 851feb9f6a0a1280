//! The offline-caching agent for a single-origin static site.
//!
//! This crate provides:
//! - Versioned cache namespaces and their garbage collection
//! - The embedded offline document
//! - Request classification and the per-class fetch strategies
//! - The lifecycle controller (install, activate, control messages) and the
//!   runtime that drives it on behalf of a host

pub mod classify;
pub mod event;
pub mod lifecycle;
pub mod namespace;
pub mod offline;
pub mod platform;
pub mod strategy;

#[cfg(test)]
pub(crate) mod testing;

pub use classify::{Classifier, RequestClass};
pub use event::{ControlMessage, FetchEvent, WaitUntil};
pub use lifecycle::runtime::{Event, LifecycleState, Outcome, WorkerRuntime};
pub use lifecycle::{ActivationReport, InstallReport, MessageOutcome, ServiceAgent};
pub use namespace::{GcReport, Namespaces};
pub use offline::OfflinePage;
pub use platform::{ClientId, Platform};
pub use strategy::StrategyEngine;
