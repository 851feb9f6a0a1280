//! Fetch Strategy Engine.
//!
//! One strategy per [`RequestClass`]. Every strategy is total: it returns a
//! response whatever the network and storage do, with the offline document as
//! the last resort.
//!
//! | Class              | Strategy                                   |
//! |--------------------|--------------------------------------------|
//! | Navigation         | preload, network-first, shell fallback     |
//! | CrossOriginFont    | stale-while-revalidate, any response kept  |
//! | SameOriginAsset    | stale-while-revalidate, 2xx/opaque kept    |
//! | Other              | network-only, cache/offline on failure     |
//!
//! Revalidation writes are registered on the event's [`WaitUntil`] and never
//! delay the response; their failures are logged and dropped.

use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use shellward_client::Network;
use shellward_core::{CacheStorage, Credentials, Error, Request, RequestMode, Response, Scope};
use url::Url;

use crate::classify::RequestClass;
use crate::event::{FetchEvent, WaitUntil};
use crate::namespace::Namespaces;
use crate::offline::OfflinePage;

const ENTRY_POINT: &str = "index.html";
const NOT_FOUND: &str = "404.html";

/// Decides which network responses are written back to the runtime namespace.
type Cacheable = fn(&Response) -> bool;

fn any_response(_: &Response) -> bool {
    true
}

fn ok_or_opaque(response: &Response) -> bool {
    response.is_ok() || response.is_opaque()
}

pub struct StrategyEngine {
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    namespaces: Namespaces,
    offline: Arc<OfflinePage>,
    entry_point: Url,
    not_found: Url,
}

impl StrategyEngine {
    pub fn new(
        storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>, namespaces: Namespaces, offline: Arc<OfflinePage>,
        scope: &Scope,
    ) -> Result<Self, Error> {
        Ok(Self {
            storage,
            network,
            namespaces,
            offline,
            entry_point: scope.resolve(ENTRY_POINT)?,
            not_found: scope.resolve(NOT_FOUND)?,
        })
    }

    /// Serve `event` with the strategy for `class`.
    pub async fn respond(&self, class: RequestClass, event: &FetchEvent) -> Response {
        tracing::debug!(url = %event.request.url, class = class.as_str(), "routing fetch");
        match class {
            RequestClass::Navigation => self.navigation(event).await,
            RequestClass::CrossOriginFont => self.cross_origin_font(event).await,
            RequestClass::SameOriginAsset => self.same_origin_asset(event).await,
            RequestClass::Other => self.network_only(&event.request).await,
        }
    }

    /// Preload, then network-first with the shell as fallback.
    ///
    /// A 2xx network response is returned verbatim. Any other status, or a
    /// failed fetch, falls back to: the cached not-found document (explicit
    /// 404 only), the cached entry point, the cached request, the offline
    /// document.
    pub async fn navigation(&self, event: &FetchEvent) -> Response {
        if let Some(preload) = &event.preload {
            tracing::debug!(url = %event.request.url, "using navigation preload response");
            return preload.clone();
        }

        let request = event.request.clone().with_credentials(Credentials::SameOrigin);
        match self.network.fetch(&request).await {
            Ok(response) if response.is_ok() => return response,
            Ok(response) => {
                tracing::debug!(url = %request.url, status = response.status, "navigation returned error status");
                if response.status == 404
                    && let Some(page) = self.lookup(&Request::get(self.not_found.clone())).await
                {
                    return page;
                }
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "navigation fetch failed");
            }
        }

        if let Some(shell) = self.lookup(&Request::get(self.entry_point.clone())).await {
            return shell;
        }
        if let Some(cached) = self.lookup(&event.request).await {
            return cached;
        }
        self.offline.response(self.storage.as_ref()).await
    }

    /// Stale-while-revalidate over a `no-cors` fetch; opaque responses are kept.
    pub async fn cross_origin_font(&self, event: &FetchEvent) -> Response {
        let request = event.request.clone().with_mode(RequestMode::NoCors);
        match self.stale_while_revalidate(request, event.wait_until(), any_response).await {
            Some(response) => response,
            None => Response::gateway_timeout(),
        }
    }

    /// Stale-while-revalidate that only keeps 2xx or opaque responses.
    pub async fn same_origin_asset(&self, event: &FetchEvent) -> Response {
        let request = event.request.clone();
        if let Some(response) = self.stale_while_revalidate(request, event.wait_until(), ok_or_opaque).await {
            return response;
        }
        match self.lookup(&event.request).await {
            Some(cached) => cached,
            None => Response::gateway_timeout(),
        }
    }

    /// Network response of any status; cache then offline document on failure.
    pub async fn network_only(&self, request: &Request) -> Response {
        match self.network.fetch(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "network failed, rescuing from cache");
                match self.lookup(request).await {
                    Some(cached) => cached,
                    None => self.offline.response(self.storage.as_ref()).await,
                }
            }
        }
    }

    /// Cached runtime entry now with a background refresh, or the network
    /// response when nothing is cached. `None` when both miss.
    async fn stale_while_revalidate(
        &self, request: Request, lifetime: &WaitUntil, cacheable: Cacheable,
    ) -> Option<Response> {
        let cached = match self.storage.match_in(self.namespaces.runtime(), &request).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "runtime cache lookup failed");
                None
            }
        };

        let revalidation = self.revalidate(request, lifetime.clone(), cacheable);
        match cached {
            Some(hit) => {
                lifetime.extend(revalidation.map(drop));
                Some(hit)
            }
            None => revalidation.await,
        }
    }

    /// One network attempt whose cacheable result is written to the runtime
    /// namespace under `lifetime`.
    fn revalidate(
        &self, request: Request, lifetime: WaitUntil, cacheable: Cacheable,
    ) -> BoxFuture<'static, Option<Response>> {
        let network = Arc::clone(&self.network);
        let storage = Arc::clone(&self.storage);
        let namespace = self.namespaces.runtime().to_string();

        async move {
            let response = match network.fetch(&request).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::debug!(url = %request.url, error = %e, "revalidation fetch failed");
                    return None;
                }
            };

            if cacheable(&response) {
                let stored = response.clone();
                lifetime.extend(async move {
                    match storage.put(&namespace, &request, &stored).await {
                        Ok(()) => tracing::debug!(url = %request.url, namespace = %namespace, "runtime cache updated"),
                        Err(e) => tracing::warn!(url = %request.url, error = %e, "runtime cache write failed"),
                    }
                });
            }

            Some(response)
        }
        .boxed()
    }

    /// Match across every namespace; storage errors count as a miss.
    async fn lookup(&self, request: &Request) -> Option<Response> {
        match self.storage.match_any(request).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "cache lookup failed");
                None
            }
        }
    }
}
