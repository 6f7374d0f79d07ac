//! In-process hot layer
//!
//! A bounded LRU of decoded payloads. Each entry expires at the earlier of
//! its hot max age and the backend expiry it was read or written with;
//! expired entries are dropped when touched.

use lru::LruCache;
use parking_lot::Mutex;
use regex::Regex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct HotEntry {
    payload: Arc<Vec<u8>>,
    expires_at: Instant,
}

#[derive(Debug)]
pub(super) struct HotLayer {
    /// `None` when the configured capacity is zero
    entries: Option<Mutex<LruCache<String, HotEntry>>>,
    max_age: Duration,
}

impl HotLayer {
    pub fn new(capacity: usize, max_age: Duration) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
            max_age,
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<Vec<u8>>> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&self, key: &str, now: Instant) -> Option<Arc<Vec<u8>>> {
        let mut entries = self.entries.as_ref()?.lock();
        let expired = match entries.get(key) {
            Some(entry) if now < entry.expires_at => return Some(entry.payload.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        None
    }

    /// Remember `payload`, which the backend keeps for `backend_ttl`
    pub fn insert(&self, key: &str, payload: Arc<Vec<u8>>, backend_ttl: Duration) {
        self.insert_at(key, payload, backend_ttl, Instant::now());
    }

    pub fn insert_at(&self, key: &str, payload: Arc<Vec<u8>>, backend_ttl: Duration, now: Instant) {
        let Some(entries) = self.entries.as_ref() else {
            return;
        };
        let lifetime = self.max_age.min(backend_ttl);
        if lifetime.is_zero() {
            return;
        }
        let Some(expires_at) = now.checked_add(lifetime) else {
            return;
        };
        entries
            .lock()
            .put(key.to_string(), HotEntry { payload, expires_at });
    }

    pub fn remove(&self, key: &str) {
        if let Some(entries) = self.entries.as_ref() {
            entries.lock().pop(key);
        }
    }

    /// Drop every entry whose key matches
    pub fn remove_matching(&self, matcher: &Regex) -> usize {
        let Some(entries) = self.entries.as_ref() else {
            return 0;
        };
        let mut entries = entries.lock();
        let doomed: Vec<String> = entries
            .iter()
            .filter(|(k, _)| matcher.is_match(k))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &doomed {
            entries.pop(key);
        }
        doomed.len()
    }

    /// Drop expired entries
    pub fn purge_expired(&self) -> usize {
        let Some(entries) = self.entries.as_ref() else {
            return 0;
        };
        let now = Instant::now();
        let mut entries = entries.lock();
        let doomed: Vec<String> = entries
            .iter()
            .filter(|(_, e)| now >= e.expires_at)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &doomed {
            entries.pop(key);
        }
        doomed.len()
    }

    pub fn clear(&self) {
        if let Some(entries) = self.entries.as_ref() {
            entries.lock().clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map(|e| e.lock().len()).unwrap_or(0)
    }
}
