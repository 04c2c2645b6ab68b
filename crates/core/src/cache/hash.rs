//! Content-addressed request identity.

use sha2::{Digest, Sha256};

/// Compute the on-disk key for a request identity (method + URL).
pub fn compute_request_hash(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
