//! In-process response cache keyed by a prompt/model fingerprint.
//!
//! Advisory only: a miss never fails a request. Entries expire after the
//! configured timeout and the oldest entries are evicted once the size bound
//! is exceeded. Nothing survives a restart.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use tracing::{debug, info};

/// Deterministic fingerprint of a prompt sent to a specific model.
pub fn fingerprint(prompt: &str, model: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    hasher.update(b":");
    hasher.update(model.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    created_at: Instant,
    /// Stored as a JSON payload (as opposed to free text).
    structured: bool,
}

#[derive(Debug)]
pub struct ResponseCache {
    timeout: Duration,
    max_entries: usize,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new(timeout: Duration, max_entries: usize) -> Self {
        Self {
            timeout,
            max_entries,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.get_at(key, Instant::now())
    }

    /// Expired entries count as misses and are dropped on the way out.
    pub fn get_at(&self, key: &str, now: Instant) -> Option<String> {
        let mut entries = self.lock();
        let entry = entries.get(key)?;
        if self.is_expired(entry, now) {
            entries.remove(key);
            debug!("Cache entry expired: {key}");
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn put(&self, key: String, value: String, structured: bool) {
        self.put_at(key, value, structured, Instant::now());
    }

    pub fn put_at(&self, key: String, value: String, structured: bool, now: Instant) {
        let mut entries = self.lock();
        entries.insert(
            key,
            CacheEntry {
                value,
                created_at: now,
                structured,
            },
        );
        self.sweep_locked(&mut entries, now);
    }

    /// Drops a single entry. Returns whether anything was removed.
    pub fn invalidate(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Removes expired entries, then the oldest ones while over capacity.
    /// Returns the number of entries removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut entries = self.lock();
        let removed = self.sweep_locked(&mut entries, now);
        if removed > 0 {
            info!("Cache cleaned. Current size: {} entries", entries.len());
        }
        removed
    }

    /// Removes structured entries whose value no longer parses as JSON.
    pub fn sweep_invalid(&self) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| {
            !entry.structured || serde_json::from_str::<serde_json::Value>(&entry.value).is_ok()
        });
        let removed = before - entries.len();
        if removed > 0 {
            info!("Removed {removed} invalid cache entries");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.created_at) > self.timeout
    }

    fn sweep_locked(&self, entries: &mut HashMap<String, CacheEntry>, now: Instant) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));

        if entries.len() > self.max_entries {
            let mut by_age: Vec<(Instant, String)> = entries
                .iter()
                .map(|(key, entry)| (entry.created_at, key.clone()))
                .collect();
            by_age.sort();
            let excess = entries.len() - self.max_entries;
            for (_, key) in by_age.into_iter().take(excess) {
                entries.remove(&key);
            }
        }

        before - entries.len()
    }
}
