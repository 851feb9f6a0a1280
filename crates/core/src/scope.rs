//! Registration scope and URL normalization.
//!
//! Every cache key is resolved against the controlling scope rather than the
//! document origin, so an agent deployed under `/repo/` keys its shell as
//! `/repo/index.html`, not `/index.html`.

use url::{Origin, Url};

use crate::Error;

/// The URL prefix an agent controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    base: Url,
}

impl Scope {
    /// Parse a scope URL.
    ///
    /// The scope must be an absolute `http`/`https` URL. A path not ending in
    /// `/` is treated as a directory so that relative resolution stays inside it.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidUrl("empty scope".into()));
        }

        let mut base = Url::parse(trimmed)?;
        match base.scheme() {
            "http" | "https" => {}
            scheme => return Err(Error::InvalidUrl(format!("unsupported scope scheme: {scheme}"))),
        }

        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.set_query(None);
        base.set_fragment(None);

        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn origin(&self) -> Origin {
        self.base.origin()
    }

    /// Resolve a path against the scope, the way `new URL(path, scope)` does.
    pub fn resolve(&self, path: &str) -> Result<Url, Error> {
        let mut url = self.base.join(path)?;
        url.set_fragment(None);
        Ok(url)
    }

    /// Whether `url` shares the scope's origin.
    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.base.origin()
    }
}

/// Normalize a request URL for use as a cache identity.
///
/// Fragments never reach the network, so two URLs that differ only by
/// fragment address the same entry. Host case is already folded by the parser.
pub fn normalize(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_resolve_subdirectory() {
        let scope = Scope::parse("https://user.github.io/repo/").unwrap();
        let url = scope.resolve("index.html").unwrap();
        assert_eq!(url.as_str(), "https://user.github.io/repo/index.html");
    }

    #[test]
    fn test_scope_resolve_dot_slash() {
        let scope = Scope::parse("https://user.github.io/repo/").unwrap();
        assert_eq!(scope.resolve("./").unwrap().as_str(), "https://user.github.io/repo/");
    }

    #[test]
    fn test_scope_resolve_absolute_path() {
        let scope = Scope::parse("https://example.com/").unwrap();
        assert_eq!(scope.resolve("/manifest.json").unwrap().as_str(), "https://example.com/manifest.json");
    }

    #[test]
    fn test_scope_adds_trailing_slash() {
        let scope = Scope::parse("https://example.com/app").unwrap();
        assert_eq!(scope.base().path(), "/app/");
        assert_eq!(scope.resolve("icons/a.png").unwrap().path(), "/app/icons/a.png");
    }

    #[test]
    fn test_scope_rejects_other_schemes() {
        assert!(matches!(Scope::parse("file:///srv/site/"), Err(Error::InvalidUrl(_))));
        assert!(matches!(Scope::parse("   "), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_scope_same_origin() {
        let scope = Scope::parse("https://example.com/repo/").unwrap();
        assert!(scope.is_same_origin(&Url::parse("https://example.com/other.js").unwrap()));
        assert!(!scope.is_same_origin(&Url::parse("https://fonts.gstatic.com/a.woff2").unwrap()));
        assert!(!scope.is_same_origin(&Url::parse("http://example.com/a.js").unwrap()));
    }

    #[test]
    fn test_normalize_strips_fragment() {
        let url = Url::parse("https://EXAMPLE.com/a.css?v=1#top").unwrap();
        assert_eq!(normalize(&url).as_str(), "https://example.com/a.css?v=1");
    }
}
