//! Headless client registry standing in for browser windows.
//!
//! A window is registered the first time a navigation names its client id.
//! `navigate` only records the new location; nothing is rendered.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Serialize;
use shellward_core::Error;
use shellward_worker::{ClientId, Platform};
use url::Url;

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct WindowInfo {
    pub id: String,
    pub location: String,
    pub controlled: bool,
}

#[derive(Debug, Clone)]
struct Window {
    location: Url,
    controlled: bool,
}

#[derive(Debug, Default)]
pub struct HostPlatform {
    windows: Mutex<BTreeMap<String, Window>>,
}

impl HostPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn windows(&self) -> MutexGuard<'_, BTreeMap<String, Window>> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record that `client` has loaded `location`.
    ///
    /// A window loaded while the agent is active is controlled by it.
    pub fn visit(&self, client: &ClientId, location: Url, controlled: bool) {
        let mut windows = self.windows();
        let window = windows
            .entry(client.as_str().to_string())
            .or_insert(Window { location: location.clone(), controlled });
        window.location = location;
        window.controlled |= controlled;
    }

    pub fn window_info(&self) -> Vec<WindowInfo> {
        self.windows()
            .iter()
            .map(|(id, w)| WindowInfo { id: id.clone(), location: w.location.to_string(), controlled: w.controlled })
            .collect()
    }
}

#[async_trait]
impl Platform for HostPlatform {
    async fn claim(&self) -> Result<(), Error> {
        for window in self.windows().values_mut() {
            window.controlled = true;
        }
        Ok(())
    }

    async fn window_clients(&self, include_uncontrolled: bool) -> Result<Vec<ClientId>, Error> {
        Ok(self
            .windows()
            .iter()
            .filter(|(_, w)| include_uncontrolled || w.controlled)
            .map(|(id, _)| ClientId::new(id.clone()))
            .collect())
    }

    async fn navigate(&self, client: &ClientId, url: &Url) -> Result<(), Error> {
        match self.windows().get_mut(client.as_str()) {
            Some(window) => {
                window.location = url.clone();
                Ok(())
            }
            None => Err(Error::Platform(format!("unknown client: {client}"))),
        }
    }
}
