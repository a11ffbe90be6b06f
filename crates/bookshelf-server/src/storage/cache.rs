//! Read-through response cache using DashMap (replaces Redis)

use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// In-memory cache of serialized records with a per-entry TTL
pub struct ResponseCache {
    data: Arc<DashMap<String, CacheEntry>>,
    ttl: Duration,
}

struct CacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl ResponseCache {
    /// Must be called inside a tokio runtime: starts the expiry sweeper
    pub fn new(ttl: Duration) -> Self {
        let cache = Self {
            data: Arc::new(DashMap::new()),
            ttl,
        };

        cache.start_cleanup_task();

        cache
    }

    /// Get raw bytes, dropping the entry if it has expired
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let entry = self.data.get(key)?;
        if Instant::now() > entry.expires_at {
            drop(entry);
            self.data.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn set(&self, key: String, value: Vec<u8>) {
        self.set_with_ttl(key, value, self.ttl);
    }

    pub fn set_with_ttl(&self, key: String, value: Vec<u8>, ttl: Duration) {
        self.data.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Cached value decoded as JSON. Undecodable entries count as misses.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key)
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
    }

    pub fn set_json<T: Serialize>(&self, key: String, value: &T) -> serde_json::Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.set(key, bytes);
        Ok(())
    }

    pub fn invalidate(&self, key: &str) {
        self.data.remove(key);
    }

    fn start_cleanup_task(&self) {
        spawn_sweeper(Arc::downgrade(&self.data), SWEEP_INTERVAL);
    }
}

/// Drop expired entries every `every` until the cache is gone
fn spawn_sweeper(data: Weak<DashMap<String, CacheEntry>>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;

            let Some(data) = data.upgrade() else {
                break;
            };
            let now = Instant::now();
            data.retain(|_, entry| entry.expires_at >= now);
        }
    })
}
