//! In-memory cache with optional time-to-live

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    data: V,
    timestamp: Instant,
}

/// String-keyed cache whose entries expire `ttl` after insertion.
///
/// A cache without TTL keeps entries for the lifetime of the process.
/// Expired entries are dropped lazily on read.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    ttl: Option<Duration>,
}

impl<V: Clone> TtlCache<V> {
    /// Cache whose entries expire after `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: Some(ttl),
        }
    }

    /// Cache whose entries never expire
    pub fn unbounded() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: None,
        }
    }

    fn is_fresh(&self, entry: &CacheEntry<V>, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.duration_since(entry.timestamp) < ttl,
            None => true,
        }
    }

    /// Fresh value for `key`, if any
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if self.is_fresh(entry, now) => return Some(entry.data.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // expired: drop it unless a writer refreshed it in the meantime
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key) {
            if !self.is_fresh(entry, now) {
                entries.remove(key);
            }
        }
        None
    }

    pub async fn insert(&self, key: impl Into<String>, data: V) {
        let entry = CacheEntry {
            data,
            timestamp: Instant::now(),
        };
        self.entries.write().await.insert(key.into(), entry);
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of fresh entries
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| self.is_fresh(e, now))
            .count()
    }
}
