//! Request identity keys.

use sha2::{Digest, Sha256};
use url::Url;

use crate::scope::normalize;

/// Compute the cache key for a request identity (method + normalized URL).
pub fn request_key(method: &str, url: &Url) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(normalize(url).as_str().as_bytes());
    hex::encode(hasher.finalize())
}
