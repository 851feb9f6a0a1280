//! Network fetch for the offline agent.
//!
//! ### The `Network` seam
//! Strategies never talk to reqwest directly; they call [`Network::fetch`],
//! which either yields a response (any status) or fails with
//! `Error::Network` when no response arrived at all. The distinction matters:
//! a thrown failure triggers offline fallbacks, a bad status does not.
//!
//! ### Response typing
//! - Same-origin responses are `basic`.
//! - Cross-origin responses are `cors`, except for `no-cors` requests, which
//!   come back `opaque`: status `0`, no headers, body kept for replay.
//!
//! ### Credentials
//! `cookie` and `authorization` headers are only forwarded when the request's
//! credentials mode allows it: never for `omit`, same-origin targets only for
//! `same-origin`, always for `include`.
//!
//! ### Limits
//! - Max redirects: 5
//! - Max body bytes: configurable
//! - No timeout unless one is configured

pub mod url;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Method, header};
use shellward_core::{Credentials, Error, Request, RequestMode, Response, ResponseType};

pub use self::url::{UrlError, canonicalize};

/// Request headers that carry credentials.
const CREDENTIAL_HEADERS: &[&str] = &["cookie", "authorization", "proxy-authorization"];

/// Source of network responses for the agent.
#[async_trait]
pub trait Network: Send + Sync {
    /// Perform one network attempt.
    ///
    /// Returns `Ok` for every response that arrived, whatever its status.
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

/// Configuration for the HTTP network.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "shellward/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 10MB)
    pub max_bytes: usize,

    /// Request timeout (default: none)
    pub timeout: Option<Duration>,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// Origin of the controlled site; decides basic vs. cors vs. opaque typing.
    pub origin: Option<::url::Origin>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "shellward/0.1".to_string(),
            max_bytes: 10 * 1024 * 1024,
            timeout: None,
            max_redirects: 5,
            origin: None,
        }
    }
}

/// reqwest-backed [`Network`].
pub struct HttpNetwork {
    http: Client,
    config: FetchConfig,
}

impl HttpNetwork {
    /// Create a new network client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn is_same_origin(&self, url: &::url::Url) -> bool {
        self.config.origin.as_ref().is_some_and(|origin| *origin == url.origin())
    }

    fn sends_credentials(&self, request: &Request) -> bool {
        match request.credentials {
            Credentials::Omit => false,
            Credentials::SameOrigin => self.is_same_origin(&request.url),
            Credentials::Include => true,
        }
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();
        let url = canonicalize(&request.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method {}: {}", request.method, e)))?;

        let credentials = self.sends_credentials(request);
        let mut builder = self.http.request(method, url.as_str());
        for (name, value) in &request.headers {
            if !credentials && CREDENTIAL_HEADERS.iter().any(|h| name.eq_ignore_ascii_case(h)) {
                tracing::debug!(header = %name, url = %url, "credential header withheld");
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Network(format!("network error: {}", e)))?;

        let status = response.status();
        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let final_url = response.url().clone();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {}", e)))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        tracing::debug!(
            "fetched {} -> {} status={} in {}ms ({} bytes, {:?})",
            url,
            final_url,
            status.as_u16(),
            start.elapsed().as_millis(),
            bytes.len(),
            content_type
        );

        if self.is_same_origin(&request.url) {
            return Ok(Response {
                status: status.as_u16(),
                headers,
                body: bytes,
                kind: ResponseType::Basic,
                url: Some(final_url),
            });
        }

        if request.mode == RequestMode::NoCors {
            return Ok(Response::opaque(bytes));
        }

        Ok(Response { status: status.as_u16(), headers, body: bytes, kind: ResponseType::Cors, url: Some(final_url) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP/1.1 response on a loopback port.
    async fn serve_once(status_line: &'static str, body: &'static str) -> ::url::Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let reply = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: text/plain\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(reply.as_bytes()).await;
        });
        ::url::Url::parse(&format!("http://{addr}/asset.txt")).unwrap()
    }

    /// Serve one response whose body reports whether a `cookie` header arrived.
    async fn serve_cookie_echo() -> ::url::Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap_or(0);
            let head = String::from_utf8_lossy(&buf[..n]).to_ascii_lowercase();
            let body = if head.contains("\r\ncookie:") { "cookie" } else { "none" };
            let reply = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(reply.as_bytes()).await;
        });
        ::url::Url::parse(&format!("http://{addr}/data.json")).unwrap()
    }

    fn site_origin() -> ::url::Origin {
        ::url::Url::parse("https://site.example/").unwrap().origin()
    }

    async fn cookie_seen(network: &HttpNetwork, url: ::url::Url, credentials: Credentials) -> String {
        let request = Request::get(url).with_credentials(credentials).with_header("Cookie", "session=secret");
        network.fetch(&request).await.unwrap().text().into_owned()
    }

    #[tokio::test]
    async fn test_fetch_omit_withholds_cookie() {
        let url = serve_cookie_echo().await;
        let network = HttpNetwork::new(FetchConfig { origin: Some(url.origin()), ..Default::default() }).unwrap();
        assert_eq!(cookie_seen(&network, url, Credentials::Omit).await, "none");
    }

    #[tokio::test]
    async fn test_fetch_same_origin_credentials() {
        let url = serve_cookie_echo().await;
        let network = HttpNetwork::new(FetchConfig { origin: Some(url.origin()), ..Default::default() }).unwrap();
        assert_eq!(cookie_seen(&network, url, Credentials::SameOrigin).await, "cookie");

        let url = serve_cookie_echo().await;
        let network = HttpNetwork::new(FetchConfig { origin: Some(site_origin()), ..Default::default() }).unwrap();
        assert_eq!(cookie_seen(&network, url, Credentials::SameOrigin).await, "none");
    }

    #[tokio::test]
    async fn test_fetch_include_sends_cookie_cross_origin() {
        let url = serve_cookie_echo().await;
        let network = HttpNetwork::new(FetchConfig { origin: Some(site_origin()), ..Default::default() }).unwrap();
        assert_eq!(cookie_seen(&network, url, Credentials::Include).await, "cookie");
    }

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "shellward/0.1");
        assert_eq!(config.max_bytes, 10 * 1024 * 1024);
        assert!(config.timeout.is_none());
        assert_eq!(config.max_redirects, 5);
    }

    #[tokio::test]
    async fn test_http_network_new() {
        let network = HttpNetwork::new(FetchConfig::default());
        assert!(network.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_same_origin_is_basic() {
        let url = serve_once("200 OK", "hello").await;
        let network = HttpNetwork::new(FetchConfig { origin: Some(url.origin()), ..Default::default() }).unwrap();

        let resp = network.fetch(&Request::get(url)).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.kind, ResponseType::Basic);
        assert_eq!(resp.text(), "hello");
        assert_eq!(resp.header("content-type"), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_fetch_error_status_is_a_response() {
        let url = serve_once("404 Not Found", "missing").await;
        let network = HttpNetwork::new(FetchConfig { origin: Some(url.origin()), ..Default::default() }).unwrap();

        let resp = network.fetch(&Request::get(url)).await.unwrap();
        assert_eq!(resp.status, 404);
        assert!(!resp.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_no_cors_cross_origin_is_opaque() {
        let url = serve_once("200 OK", "font").await;
        let network = HttpNetwork::new(FetchConfig::default()).unwrap();

        let resp = network.fetch(&Request::get(url).with_mode(RequestMode::NoCors)).await.unwrap();
        assert!(resp.is_opaque());
        assert_eq!(resp.status, 0);
        assert!(resp.headers.is_empty());
        assert_eq!(resp.text(), "font");
    }

    #[tokio::test]
    async fn test_fetch_too_large() {
        let url = serve_once("200 OK", "0123456789").await;
        let network = HttpNetwork::new(FetchConfig { max_bytes: 4, ..Default::default() }).unwrap();

        let result = network.fetch(&Request::get(url)).await;
        assert!(matches!(result, Err(Error::FetchTooLarge(_))));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let network = HttpNetwork::new(FetchConfig::default()).unwrap();
        let url = ::url::Url::parse(&format!("http://{addr}/")).unwrap();
        let result = network.fetch(&Request::get(url)).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_http() {
        let network = HttpNetwork::new(FetchConfig::default()).unwrap();
        let url = ::url::Url::parse("file:///etc/hosts").unwrap();
        let result = network.fetch(&Request::get(url)).await;
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }
}
