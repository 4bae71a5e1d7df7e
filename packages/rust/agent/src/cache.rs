//! In-process cache of prior response envelopes.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::debug;

use webscout_shared::ResponseEnvelope;

/// Separator between query and depth in a cache key. U+001F cannot occur in
/// a meaningful query, so `"ab" + "c1"` and `"abc" + "1"` stay distinct.
const KEY_SEPARATOR: char = '\u{1f}';

struct CacheEntry {
    envelope: ResponseEnvelope,
    inserted_at: Instant,
}

/// Keyed response cache with optional expiry.
///
/// Hits return the stored envelope unchanged; concurrent writes to the same
/// key are last-write-wins. A zero TTL disables caching entirely.
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl ResponseCache {
    /// Create a cache whose entries expire after `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Deterministic composite key for a validated `(query, depth)` pair.
    pub fn key(query: &str, depth: u8) -> String {
        format!("{query}{KEY_SEPARATOR}{depth}")
    }

    /// Look up an envelope, evicting it first if expired.
    pub fn get(&self, key: &str) -> Option<ResponseEnvelope> {
        if self.ttl.is_zero() {
            return None;
        }

        let mut entries = self.lock();
        if let Some(entry) = entries.get(key) {
            if entry.inserted_at.elapsed() > self.ttl {
                debug!(key, "evicting expired cache entry");
                entries.remove(key);
                return None;
            }
            return Some(entry.envelope.clone());
        }
        None
    }

    /// Store an envelope under `key`, replacing any previous entry.
    pub fn insert(&self, key: String, envelope: ResponseEnvelope) {
        if self.ttl.is_zero() {
            return;
        }
        self.lock().insert(
            key,
            CacheEntry {
                envelope,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Number of entries currently stored (expired ones included until read).
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
