//! Cache storage: named namespaces of request → response entries.
//!
//! The agent consumes storage through the [`CacheStorage`] trait, which
//! mirrors the hosting platform's cache API: `open`, `keys` and `delete` on
//! namespaces, `match`/`put` within one. [`CacheDb`] is the SQLite-backed
//! implementation:
//!
//! - Request identity is a SHA-256 key over method and normalized URL
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Writes are last-writer-wins per key; there are no cross-call transactions

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod namespaces;

pub use crate::Error;

pub use connection::CacheDb;

use async_trait::async_trait;
use url::Url;

use crate::http::{Request, Response};

/// Cache storage as seen by the agent.
///
/// Implementations are shared between concurrently running event handlers,
/// so every method takes `&self` and must tolerate interleaving.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the namespace if it does not exist yet.
    async fn open(&self, namespace: &str) -> Result<(), Error>;

    /// Whether a namespace exists.
    async fn has(&self, namespace: &str) -> Result<bool, Error>;

    /// All namespace names, in creation order.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Delete a namespace and every entry in it. Returns whether it existed.
    async fn delete(&self, namespace: &str) -> Result<bool, Error>;

    /// Look up a request within one namespace.
    async fn match_in(&self, namespace: &str, request: &Request) -> Result<Option<Response>, Error>;

    /// Look up a request across all namespaces, oldest namespace first.
    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error>;

    /// Store a response, replacing any prior entry for the same request.
    /// Creates the namespace on first use.
    async fn put(&self, namespace: &str, request: &Request, response: &Response) -> Result<(), Error>;

    /// URLs of the requests stored in a namespace, in insertion order.
    async fn requests(&self, namespace: &str) -> Result<Vec<Url>, Error>;
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, namespace: &str) -> Result<(), Error> {
        self.open_namespace(namespace).await
    }

    async fn has(&self, namespace: &str) -> Result<bool, Error> {
        self.has_namespace(namespace).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.namespace_names().await
    }

    async fn delete(&self, namespace: &str) -> Result<bool, Error> {
        self.delete_namespace(namespace).await
    }

    async fn match_in(&self, namespace: &str, request: &Request) -> Result<Option<Response>, Error> {
        self.get_entry(namespace, request).await
    }

    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        self.get_entry_any(request).await
    }

    async fn put(&self, namespace: &str, request: &Request, response: &Response) -> Result<(), Error> {
        self.upsert_entry(namespace, request, response).await
    }

    async fn requests(&self, namespace: &str) -> Result<Vec<Url>, Error> {
        self.entry_urls(namespace).await
    }
}
