//! URL checks applied before a request leaves the process.

/// Error type for URL validation failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("missing host: {0}")]
    MissingHost(String),
}

/// Check that a request URL can be fetched over HTTP and strip its fragment.
///
/// Fragments are client-side only and never sent on the wire.
pub fn canonicalize(url: &url::Url) -> Result<url::Url, UrlError> {
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlError::MissingHost(url.to_string()));
    }

    let mut canonical = url.clone();
    canonical.set_fragment(None);
    Ok(canonical)
}
