//!
//! src/cache.rs  Andrew Belles  Oct 16th, 2026
//!
//! Bounded in-memory cache of parsed tracks with a fixed (non-sliding)
//! ttl per entry and hit/miss accounting. Failures are never stored
//!

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::CacheConfig;
use crate::errors::ScraperError;
use crate::types::Track;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub max_size: usize,
    pub ttl_seconds: u64
}

impl CacheStats {
    /// hits / (hits + misses), 0 before any lookup
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 { 0.0 } else { self.hits as f64 / total as f64 }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Track,
    expires_at: Option<Instant>,  // None when now + ttl overflows the clock
    seq: u64
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now > at)
    }
}

/// Entries plus insertion order (seq -> key) so the oldest insert can be
/// evicted without scanning
#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    order: BTreeMap<u64, String>,
    next_seq: u64,
    hits: u64,
    misses: u64
}

impl CacheState {
    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.order.remove(&entry.seq);
        Some(entry)
    }

    /// Live value for key; an expired entry is dropped on the way
    fn live(&mut self, key: &str, now: Instant) -> Option<Track> {
        let expired = self.entries.get(key)?.is_expired(now);
        if expired {
            self.remove(key);
            return None;
        }
        self.entries.get(key).map(|e| e.value.clone())
    }

    fn purge_expired(&mut self, now: Instant) -> usize {
        let stale: Vec<String> = self.entries.iter()
            .filter(|(_, e)| e.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &stale {
            self.remove(key);
        }
        stale.len()
    }

    fn insert(&mut self, key: &str, value: Track, now: Instant, ttl: Duration, max_size: usize) {
        self.remove(key);
        if self.entries.len() >= max_size {
            self.purge_expired(now);
        }
        while self.entries.len() >= max_size {
            let Some((_, oldest)) = self.order.pop_first() else { break };
            self.entries.remove(&oldest);
            debug!(key = %oldest, "cache.evict");
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, key.to_string());
        self.entries.insert(key.to_string(), CacheEntry {
            value,
            expires_at: now.checked_add(ttl),
            seq
        });
    }
}

/// Shared by reference between lookups; every access to entries and
/// counters goes through one lock
#[derive(Debug)]
pub struct ResultCache {
    state: Mutex<CacheState>,
    max_size: usize,
    ttl: Duration
}

impl ResultCache {
    pub fn new(cfg: &CacheConfig) -> Self {
        let max_size = cfg.max_size.max(1);
        info!(max_size, ttl_s = cfg.ttl.as_secs(), "cache.init");
        Self { state: Mutex::new(CacheState::default()), max_size, ttl: cfg.ttl }
    }

    /// Counted lookup
    pub async fn get(&self, key: &str) -> Option<Track> {
        let mut state = self.state.lock().await;
        match state.live(key, Instant::now()) {
            Some(track) => {
                state.hits += 1;
                info!(key, "cache.hit");
                Some(track)
            },
            None => {
                state.misses += 1;
                info!(key, "cache.miss");
                None
            }
        }
    }

    pub async fn insert(&self, key: &str, track: Track) {
        let mut state = self.state.lock().await;
        state.insert(key, track, Instant::now(), self.ttl, self.max_size);
        info!(key, size = state.entries.len(), "cache.store");
    }

    /// Returns the live entry for `key`, or runs `compute` and stores its
    /// success. The lock is not held while `compute` runs, so concurrent
    /// misses on one key each compute and the last write wins
    pub async fn get_or_compute<F, Fut>(&self, key: &str, compute: F) ->
        Result<Track, ScraperError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Track, ScraperError>>
    {
        if let Some(track) = self.get(key).await {
            return Ok(track);
        }

        let track = compute().await?;
        self.insert(key, track.clone()).await;
        Ok(track)
    }

    pub async fn stats(&self) -> CacheStats {
        let mut state = self.state.lock().await;
        state.purge_expired(Instant::now());
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            size: state.entries.len(),
            max_size: self.max_size,
            ttl_seconds: self.ttl.as_secs()
        }
    }

    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.entries.clear();
        state.order.clear();
        info!("cache.clear");
    }

    pub async fn reset_stats(&self) {
        let mut state = self.state.lock().await;
        state.hits = 0;
        state.misses = 0;
        info!("cache.stats.reset");
    }
}
