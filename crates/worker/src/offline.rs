//! The offline fallback document.
//!
//! The document is embedded in the agent rather than fetched, so it is
//! available even when install never reached the network. It is stored under
//! the reserved key `__offline.html` at install and synthesized on demand when
//! that entry is missing.

use shellward_core::{CacheStorage, Error, Request, Response, Scope};
use url::Url;

pub const OFFLINE_KEY: &str = "__offline.html";

const TEMPLATE: &str = r#"<!doctype html><html lang="en"><head>
<meta charset="utf-8"><meta name="viewport" content="width=device-width,initial-scale=1">
<title>You are offline</title><meta name="theme-color" content="%THEME%">
<style>
:root{--bg:%BACKGROUND%;--accent:%THEME%;--fg:#1a1534;--muted:#4b4a63}
*{box-sizing:border-box}html,body{height:100%;margin:0;background:var(--bg);color:var(--fg);
font-family:system-ui,-apple-system,Segoe UI,Roboto,Ubuntu,Cantarell,Arial,sans-serif}
.wrap{min-height:100%;display:grid;place-items:center;padding:24px}
.card{width:min(560px,92vw);background:#fff;border-radius:16px;padding:20px;box-shadow:0 12px 30px rgba(0,0,0,.12);border:2px solid var(--accent)}
h1{margin:0 0 6px 0;font-size:18px}p{margin:0 0 12px 0;color:var(--muted)}
.row{display:flex;gap:8px;flex-wrap:wrap}
button{cursor:pointer;border:0;border-radius:12px;padding:10px 14px;font-weight:600}
.primary{background:var(--accent);color:#fff}.ghost{background:#f4f2ff;color:#2b2463;border:1px solid #ded9ff}
</style></head><body>
<div class="wrap"><div class="card" role="status" aria-live="polite">
<h1>You are offline</h1><p>Check your connection and try again.</p>
<div class="row"><button class="primary" onclick="location.reload()">Reload</button>
<button class="ghost" onclick="history.back()">Go back</button></div>
</div></div></body></html>"#;

/// Render the offline document with the given colours.
pub fn render_document(theme_color: &str, background_color: &str) -> String {
    TEMPLATE.replace("%THEME%", theme_color).replace("%BACKGROUND%", background_color)
}

/// Offline Resource Provider.
#[derive(Debug, Clone)]
pub struct OfflinePage {
    key: Url,
    document: String,
}

impl OfflinePage {
    pub fn new(scope: &Scope, theme_color: &str, background_color: &str) -> Result<Self, Error> {
        Ok(Self { key: scope.resolve(OFFLINE_KEY)?, document: render_document(theme_color, background_color) })
    }

    /// Scope-resolved reserved cache key.
    pub fn key(&self) -> &Url {
        &self.key
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn request(&self) -> Request {
        Request::get(self.key.clone())
    }

    /// The embedded document as a fresh response.
    pub fn synthesize(&self) -> Response {
        Response::html(self.document.clone())
    }

    /// The stored offline document, or the embedded one if none is stored.
    ///
    /// Never fails: storage errors fall through to the embedded copy.
    pub async fn response(&self, storage: &dyn CacheStorage) -> Response {
        match storage.match_any(&self.request()).await {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                tracing::debug!("offline document not cached, synthesizing");
                self.synthesize()
            }
            Err(e) => {
                tracing::warn!(error = %e, "offline document lookup failed, synthesizing");
                self.synthesize()
            }
        }
    }
}
