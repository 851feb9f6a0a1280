//! Core types and shared functionality for shellward.
//!
//! This crate provides:
//! - Cache storage abstraction with a SQLite backend
//! - Request/response value types and scope resolution
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod scope;

pub use cache::{CacheDb, CacheStorage};
pub use config::{ActivationPolicy, AgentConfig, ConfigError};
pub use error::Error;
pub use http::{Credentials, Request, RequestMode, Response, ResponseType};
pub use scope::Scope;
