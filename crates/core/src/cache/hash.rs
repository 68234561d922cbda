//! Content-addressed cache key generation.

use sha2::{Digest, Sha256};

/// Compute the content-addressed key column for a request identity.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_cache_key("GET", "https://example.com/style.css");
        let hash2 = compute_cache_key("GET", "https://example.com/style.css");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_query_is_significant() {
        let plain = compute_cache_key("GET", "https://example.com/style.css");
        let busted = compute_cache_key("GET", "https://example.com/style.css?v=2");
        assert_ne!(plain, busted);
    }

    #[test]
    fn test_hash_method_is_significant() {
        let get = compute_cache_key("GET", "https://example.com/");
        let head = compute_cache_key("HEAD", "https://example.com/");
        assert_ne!(get, head);
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_cache_key("GET", "https://example.com");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
