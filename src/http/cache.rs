//! In-memory response cache
//!
//! Successful GET bodies are cached under a key derived from the full request
//! shape. Cache keys are computed from canonically ordered query pairs, so
//! parameter insertion order never leaks into the key. Paginated continuation
//! requests bypass the cache entirely (a stale page must never be replayed
//! mid-iteration).

use std::collections::HashMap;
use std::sync::Mutex;

/// Thread-safe cache of response bodies keyed by request shape
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, String>>,
}

impl ResponseCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the cache key for a request. `query` must already be in
    /// canonical (sorted) order.
    pub fn key(method: &str, url: &str, query: &[(String, String)]) -> String {
        let mut key = format!("{method} {url}");
        for (name, value) in query {
            key.push('&');
            key.push_str(name);
            key.push('=');
            key.push_str(value);
        }
        key
    }

    /// Look up a cached body
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    /// Store a response body
    pub fn put(&self, key: String, body: String) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key, body);
        }
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all cached entries
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}
