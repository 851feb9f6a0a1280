//! Network access for shellward.
//!
//! This crate provides the [`Network`] seam the agent fetches through and a
//! reqwest-backed implementation for real hosts.

pub mod fetch;

pub use fetch::{FetchConfig, HttpNetwork, Network};
