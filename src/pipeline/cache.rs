//! Incremental result cache.
//!
//! Keyed by a blake3 hash of each method's whitespace-normalized text:
//! an unchanged method returns its prior result without reanalysis, and
//! invalidation is per method (a changed body simply misses). The map is
//! concurrent with insertion-only semantics during one pass. Partial
//! results (cancelled, timed out) are never cached.
//!
//! Optional persistence writes `(hash, result, timestamp)` tuples as
//! JSON; the schema is exactly the emitted method result.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::result::{MethodResult, ResultTag};

/// One cached entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Content hash of the method text.
    pub hash: String,
    /// The prior result.
    pub result: MethodResult,
    /// Seconds since the epoch at insertion.
    pub timestamp: u64,
}

/// Hash a method's text, ignoring whitespace differences.
pub fn content_hash(method_text: &str) -> String {
    let mut normalized = String::with_capacity(method_text.len());
    let mut last_was_space = true;
    for c in method_text.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                normalized.push(' ');
                last_was_space = true;
            }
        } else {
            normalized.push(c);
            last_was_space = false;
        }
    }
    blake3::hash(normalized.trim_end().as_bytes())
        .to_hex()
        .to_string()
}

/// Concurrent method-result cache.
#[derive(Default)]
pub struct AnalysisCache {
    entries: DashMap<String, CacheEntry>,
}

impl AnalysisCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a prior result by content hash.
    pub fn get(&self, hash: &str) -> Option<MethodResult> {
        self.entries.get(hash).map(|e| e.result.clone())
    }

    /// Insert a completed result. Partial results are refused.
    pub fn insert(&self, hash: String, result: MethodResult) {
        if !matches!(result.tag, ResultTag::Complete | ResultTag::Incomplete) {
            return;
        }
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.entries.insert(
            hash.clone(),
            CacheEntry {
                hash,
                result,
                timestamp,
            },
        );
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Persist all entries as JSON.
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        let entries: Vec<CacheEntry> = self.entries.iter().map(|e| e.value().clone()).collect();
        let payload = serde_json::to_string(&entries)?;
        std::fs::write(path, payload)
    }

    /// Load entries from a JSON file written by [`AnalysisCache::save_to`].
    /// A missing or malformed file yields an empty cache.
    pub fn load_from(path: &Path) -> Self {
        let cache = AnalysisCache::new();
        let Ok(payload) = std::fs::read_to_string(path) else {
            return cache;
        };
        let Ok(entries) = serde_json::from_str::<Vec<CacheEntry>>(&payload) else {
            debug!("cache file malformed; starting empty");
            return cache;
        };
        for entry in entries {
            cache.entries.insert(entry.hash.clone(), entry);
        }
        cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result(tag: ResultTag) -> MethodResult {
        MethodResult {
            method_name: "f".to_owned(),
            file_location: (0, 10),
            time_complexity: "O(n)".to_owned(),
            space_complexity: None,
            confidence: 0.95,
            is_amortized: false,
            is_probabilistic: false,
            dominant_term: Some("n".to_owned()),
            tooltip: None,
            requires_review: false,
            review_reason: None,
            tag,
        }
    }

    #[test]
    fn hash_ignores_whitespace_differences() {
        let a = content_hash("int f ( int n ) { return n; }");
        let b = content_hash("int f (\n  int n\n) {\n  return n;\n}");
        assert_eq!(a, b);
        let c = content_hash("int g ( int n ) { return n; }");
        assert_ne!(a, c);
    }

    #[test]
    fn hit_returns_prior_result() {
        let cache = AnalysisCache::new();
        let hash = content_hash("int f() { return 1; }");
        cache.insert(hash.clone(), sample_result(ResultTag::Complete));
        let hit = cache.get(&hash).unwrap();
        assert_eq!(hit.time_complexity, "O(n)");
    }

    #[test]
    fn partial_results_are_never_cached() {
        let cache = AnalysisCache::new();
        cache.insert("h1".to_owned(), sample_result(ResultTag::Cancelled));
        cache.insert("h2".to_owned(), sample_result(ResultTag::Timeout));
        assert!(cache.is_empty());
    }

    #[test]
    fn round_trips_through_disk() {
        let cache = AnalysisCache::new();
        cache.insert("abc".to_owned(), sample_result(ResultTag::Complete));
        let dir = std::env::temp_dir().join("asymptotica-cache-test.json");
        cache.save_to(&dir).unwrap();
        let loaded = AnalysisCache::load_from(&dir);
        assert_eq!(loaded.len(), 1);
        assert!(loaded.get("abc").is_some());
        drop(std::fs::remove_file(&dir));
    }
}
