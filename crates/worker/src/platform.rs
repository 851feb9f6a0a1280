//! Hosting platform primitives the agent drives but does not own.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shellward_core::Error;
use url::Url;

/// Opaque identifier of an open client view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client views and navigation preload, as exposed by the host.
#[async_trait]
pub trait Platform: Send + Sync {
    fn supports_navigation_preload(&self) -> bool {
        false
    }

    async fn enable_navigation_preload(&self) -> Result<(), Error> {
        Err(Error::Unsupported("navigation preload".into()))
    }

    /// Take control of every open view in scope without a reload.
    async fn claim(&self) -> Result<(), Error>;

    /// Open window views; `include_uncontrolled` also lists views this agent
    /// does not control yet.
    async fn window_clients(&self, include_uncontrolled: bool) -> Result<Vec<ClientId>, Error>;

    async fn navigate(&self, client: &ClientId, url: &Url) -> Result<(), Error>;
}
