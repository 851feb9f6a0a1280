//! Request classification.
//!
//! Rules apply in priority order:
//! 1. `navigate` mode is always a navigation, whatever the URL looks like.
//! 2. A `GET` to a configured font host is a cross-origin font.
//! 3. A same-origin `GET` whose path ends in a static extension is an asset.
//! 4. Everything else, including every non-`GET`, is `Other`.

use shellward_core::{AgentConfig, Request, Scope};
use url::Origin;

/// Which fetch strategy serves a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    Navigation,
    CrossOriginFont,
    SameOriginAsset,
    Other,
}

impl RequestClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestClass::Navigation => "navigation",
            RequestClass::CrossOriginFont => "cross-origin-font",
            RequestClass::SameOriginAsset => "same-origin-asset",
            RequestClass::Other => "other",
        }
    }
}

/// Request Classifier.
#[derive(Debug, Clone)]
pub struct Classifier {
    origin: Origin,
    font_hosts: Vec<String>,
    static_extensions: Vec<String>,
}

impl Classifier {
    pub fn new(scope: &Scope, font_hosts: &[String], static_extensions: &[String]) -> Self {
        Self {
            origin: scope.origin(),
            font_hosts: font_hosts.iter().map(|h| h.trim().to_ascii_lowercase()).collect(),
            static_extensions: static_extensions.iter().map(|e| e.to_ascii_lowercase()).collect(),
        }
    }

    pub fn from_config(config: &AgentConfig, scope: &Scope) -> Self {
        Self::new(scope, &config.font_hosts, &config.static_extensions)
    }

    pub fn classify(&self, request: &Request) -> RequestClass {
        if request.is_navigation() {
            return RequestClass::Navigation;
        }

        if !request.is_get() {
            return RequestClass::Other;
        }

        if let Some(host) = request.url.host_str()
            && self.font_hosts.iter().any(|h| h == host)
        {
            return RequestClass::CrossOriginFont;
        }

        if request.url.origin() == self.origin && self.is_static_path(request.url.path()) {
            return RequestClass::SameOriginAsset;
        }

        RequestClass::Other
    }

    fn is_static_path(&self, path: &str) -> bool {
        let file = path.rsplit('/').next().unwrap_or_default();
        match file.rsplit_once('.') {
            Some((_, ext)) => self.static_extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }
}
