//! Test doubles for the storage, network and platform seams.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use shellward_client::Network;
use shellward_core::{AgentConfig, CacheDb, CacheStorage, Error, Request, Response};
use tokio::sync::watch;
use url::Url;

use crate::platform::{ClientId, Platform};

/// Agent configuration scoped to `https://example.com/`, version `2`.
pub fn test_config() -> AgentConfig {
    AgentConfig {
        prefix: "app".into(),
        version: "2".into(),
        scope: "https://example.com/".into(),
        shell_assets: vec!["./".into(), "index.html".into(), "manifest.json".into()],
        ..Default::default()
    }
}

pub fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

/// [`CacheDb`] with injectable failures.
pub struct FlakyStorage {
    inner: CacheDb,
    failing_deletes: HashSet<String>,
    fail_reads: bool,
    fail_puts: bool,
}

impl FlakyStorage {
    pub fn new(inner: CacheDb) -> Self {
        Self { inner, failing_deletes: HashSet::new(), fail_reads: false, fail_puts: false }
    }

    pub fn fail_delete(mut self, namespace: &str) -> Self {
        self.failing_deletes.insert(namespace.to_string());
        self
    }

    pub fn fail_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn fail_puts(mut self) -> Self {
        self.fail_puts = true;
        self
    }

    fn injected(what: &str) -> Error {
        Error::CorruptEntry(format!("injected {what} failure"))
    }
}

#[async_trait]
impl CacheStorage for FlakyStorage {
    async fn open(&self, namespace: &str) -> Result<(), Error> {
        self.inner.open_namespace(namespace).await
    }

    async fn has(&self, namespace: &str) -> Result<bool, Error> {
        self.inner.has_namespace(namespace).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.inner.namespace_names().await
    }

    async fn delete(&self, namespace: &str) -> Result<bool, Error> {
        if self.failing_deletes.contains(namespace) {
            return Err(Self::injected("delete"));
        }
        self.inner.delete_namespace(namespace).await
    }

    async fn match_in(&self, namespace: &str, request: &Request) -> Result<Option<Response>, Error> {
        if self.fail_reads {
            return Err(Self::injected("read"));
        }
        self.inner.get_entry(namespace, request).await
    }

    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        if self.fail_reads {
            return Err(Self::injected("read"));
        }
        self.inner.get_entry_any(request).await
    }

    async fn put(&self, namespace: &str, request: &Request, response: &Response) -> Result<(), Error> {
        if self.fail_puts {
            return Err(Self::injected("write"));
        }
        self.inner.upsert_entry(namespace, request, response).await
    }

    async fn requests(&self, namespace: &str) -> Result<Vec<Url>, Error> {
        self.inner.entry_urls(namespace).await
    }
}

enum Scripted {
    Respond(Response),
    Fail,
}

/// Network answering from a URL → response script. Unscripted URLs fail.
#[derive(Default)]
pub struct ScriptedNetwork {
    script: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<Vec<Request>>,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url: &str, response: Response) -> Self {
        self.set(url, response);
        self
    }

    pub fn fail(self, url: &str) -> Self {
        self.script.lock().unwrap().insert(url.to_string(), Scripted::Fail);
        self
    }

    /// Replace the scripted response for `url`.
    pub fn set(&self, url: &str, response: Response) {
        self.script.lock().unwrap().insert(url.to_string(), Scripted::Respond(response));
    }

    pub fn calls(&self) -> Vec<Request> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|r| r.url.as_str() == url).count()
    }

    fn record(&self, request: &Request) {
        self.calls.lock().unwrap().push(request.clone());
    }

    fn answer(&self, request: &Request) -> Result<Response, Error> {
        match self.script.lock().unwrap().get(request.url.as_str()) {
            Some(Scripted::Respond(response)) => Ok(response.clone()),
            Some(Scripted::Fail) | None => Err(Error::Network(format!("unreachable: {}", request.url))),
        }
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.record(request);
        self.answer(request)
    }
}

/// [`ScriptedNetwork`] whose fetches hang until [`GatedNetwork::open`].
pub struct GatedNetwork {
    inner: ScriptedNetwork,
    gate: watch::Sender<bool>,
}

impl GatedNetwork {
    pub fn new(inner: ScriptedNetwork) -> Self {
        Self { inner, gate: watch::Sender::new(false) }
    }

    pub fn open(&self) {
        self.gate.send_replace(true);
    }

    /// Fetches that have started, including ones still held at the gate.
    pub fn call_count(&self, url: &str) -> usize {
        self.inner.call_count(url)
    }
}

#[async_trait]
impl Network for GatedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.inner.record(request);
        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;
        self.inner.answer(request)
    }
}

/// Platform recording every call made to it.
#[derive(Default)]
pub struct RecordingPlatform {
    controlled: Vec<ClientId>,
    uncontrolled: Vec<ClientId>,
    preload_supported: bool,
    failing_navigations: HashSet<ClientId>,
    preload_enabled: AtomicBool,
    claimed: AtomicBool,
    navigations: Mutex<Vec<(ClientId, Url)>>,
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(mut self, id: &str) -> Self {
        self.controlled.push(ClientId::new(id));
        self
    }

    pub fn with_uncontrolled_window(mut self, id: &str) -> Self {
        self.uncontrolled.push(ClientId::new(id));
        self
    }

    pub fn with_preload(mut self) -> Self {
        self.preload_supported = true;
        self
    }

    pub fn fail_navigation(mut self, id: &str) -> Self {
        self.failing_navigations.insert(ClientId::new(id));
        self
    }

    pub fn navigations(&self) -> Vec<(ClientId, Url)> {
        self.navigations.lock().unwrap().clone()
    }

    pub fn was_claimed(&self) -> bool {
        self.claimed.load(Ordering::SeqCst)
    }

    pub fn preload_enabled(&self) -> bool {
        self.preload_enabled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Platform for RecordingPlatform {
    fn supports_navigation_preload(&self) -> bool {
        self.preload_supported
    }

    async fn enable_navigation_preload(&self) -> Result<(), Error> {
        if !self.preload_supported {
            return Err(Error::Unsupported("navigation preload".into()));
        }
        self.preload_enabled.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn claim(&self) -> Result<(), Error> {
        self.claimed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn window_clients(&self, include_uncontrolled: bool) -> Result<Vec<ClientId>, Error> {
        let mut clients = self.controlled.clone();
        if include_uncontrolled {
            clients.extend(self.uncontrolled.iter().cloned());
        }
        Ok(clients)
    }

    async fn navigate(&self, client: &ClientId, url: &Url) -> Result<(), Error> {
        if self.failing_navigations.contains(client) {
            return Err(Error::Platform(format!("client {client} is gone")));
        }
        self.navigations.lock().unwrap().push((client.clone(), url.clone()));
        Ok(())
    }
}
