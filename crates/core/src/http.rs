//! Request and response value types shared by the agent, the cache store
//! and the network layer.
//!
//! These mirror the hosting platform's fetch primitives closely enough to
//! express the routing policy: request mode and credentials on the way in,
//! status, headers, body and response type on the way out.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// How the requester intends to use the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level or frame document load.
    Navigate,
    SameOrigin,
    /// Cross-origin request whose response may come back opaque.
    NoCors,
    #[default]
    Cors,
}

/// Which credentials accompany the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Credentials {
    Omit,
    #[default]
    SameOrigin,
    Include,
}

/// Origin classification of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    #[default]
    Basic,
    Cors,
    /// Cross-origin `no-cors` response: status and headers are not readable,
    /// but the body can still be stored and replayed.
    Opaque,
    /// Synthesized by the agent rather than received from the network.
    Synthetic,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Basic => "basic",
            ResponseType::Cors => "cors",
            ResponseType::Opaque => "opaque",
            ResponseType::Synthetic => "synthetic",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(ResponseType::Basic),
            "cors" => Ok(ResponseType::Cors),
            "opaque" => Ok(ResponseType::Opaque),
            "synthetic" => Ok(ResponseType::Synthetic),
            other => Err(Error::CorruptEntry(format!("unknown response type: {other}"))),
        }
    }
}

/// An intercepted request descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: Url,
    /// Upper-case HTTP method.
    pub method: String,
    pub mode: RequestMode,
    pub credentials: Credentials,
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// A plain `GET` in `cors` mode with same-origin credentials.
    pub fn get(url: Url) -> Self {
        Self {
            url,
            method: "GET".to_string(),
            mode: RequestMode::default(),
            credentials: Credentials::default(),
            headers: Vec::new(),
        }
    }

    /// A top-level document load.
    pub fn navigate(url: Url) -> Self {
        Self::get(url).with_mode(RequestMode::Navigate)
    }

    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.to_ascii_uppercase();
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }
}

/// A response descriptor, either received from the network, replayed from a
/// cache namespace, or synthesized by the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status; `0` for opaque responses.
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub kind: ResponseType,
    /// Final URL the body was served from, when known.
    pub url: Option<Url>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self { status, headers: Vec::new(), body: body.into(), kind: ResponseType::Basic, url: None }
    }

    /// A synthesized `text/html` document.
    pub fn html(body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            headers: vec![("content-type".to_string(), "text/html; charset=utf-8".to_string())],
            body: body.into(),
            kind: ResponseType::Synthetic,
            url: None,
        }
    }

    /// An opaque response carrying a body but no readable status.
    pub fn opaque(body: impl Into<Bytes>) -> Self {
        Self { status: 0, headers: Vec::new(), body: body.into(), kind: ResponseType::Opaque, url: None }
    }

    /// Empty `504 Gateway Timeout`, the last resort of the revalidating strategies.
    pub fn gateway_timeout() -> Self {
        Self { status: 504, headers: Vec::new(), body: Bytes::new(), kind: ResponseType::Synthetic, url: None }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_kind(mut self, kind: ResponseType) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    /// Status in the 200-299 range.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_opaque(&self) -> bool {
        self.kind == ResponseType::Opaque
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body decoded as UTF-8, lossily.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
