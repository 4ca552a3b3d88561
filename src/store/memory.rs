//! In-process counter store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace};

use super::{CounterStore, TTL_MISSING, TTL_NO_EXPIRY};
use crate::error::{Result, TallyguardError};

/// A stored value with an optional expiry deadline.
#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn counter() -> Self {
        Self {
            value: "0".to_string(),
            expires_at: None,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// A counter store kept in process memory.
///
/// Stands in for a networked store when limits only need to hold within a
/// single process. Increments are atomic per key: the map shard stays
/// locked for the whole read-modify-write. Expired entries are dropped
/// lazily on access. Keys that are never touched again stay in memory until
/// [`InMemoryStore::purge_expired`] runs, so long-lived processes should
/// start [`InMemoryStore::spawn_purge_task`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: DashMap<String, Entry>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw value without expiry, replacing any existing entry.
    pub fn set(&self, key: &str, value: impl Into<String>) {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.into(),
                expires_at: None,
            },
        );
    }

    /// Drop every expired entry and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            trace!(removed, "Purged expired counters");
        }
        removed
    }

    /// Run [`InMemoryStore::purge_expired`] every `every` on the tokio
    /// runtime. The task ends once the store is dropped.
    ///
    /// Panics if `every` is zero.
    pub fn spawn_purge_task(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let store = Arc::downgrade(self);
        debug!(interval = ?every, "Starting expired counter sweep");
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else {
                    break;
                };
                store.purge_expired();
            }
            debug!("Expired counter sweep stopped");
        })
    }

    /// Number of live (unexpired) keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    /// Whether the store holds no live keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove `key` if its entry has expired.
    fn evict_if_expired(&self, key: &str, now: Instant) {
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
    }
}

#[async_trait]
impl CounterStore for InMemoryStore {
    async fn incr(&self, key: &str) -> Result<i64> {
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(Entry::counter);

        if entry.is_expired(now) {
            *entry = Entry::counter();
        }

        let current: i64 = entry.value.parse().map_err(|_| TallyguardError::Parse {
            key: key.to_string(),
            value: entry.value.clone(),
        })?;
        let next = current.checked_add(1).ok_or_else(|| {
            TallyguardError::Store(format!("increment of '{}' would overflow", key))
        })?;
        entry.value = next.to_string();
        Ok(next)
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<()> {
        let now = Instant::now();
        self.evict_if_expired(key, now);

        if seconds == 0 {
            self.entries.remove(key);
            return Ok(());
        }

        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.expires_at = Some(now + Duration::from_secs(seconds));
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        self.evict_if_expired(key, now);
        Ok(self.entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<i64> {
        let now = Instant::now();
        self.evict_if_expired(key, now);

        let Some(entry) = self.entries.get(key) else {
            return Ok(TTL_MISSING);
        };
        let Some(deadline) = entry.expires_at else {
            return Ok(TTL_NO_EXPIRY);
        };

        // Round up so a live key never reports 0.
        let remaining = deadline.saturating_duration_since(now);
        let mut secs = remaining.as_secs();
        if remaining.subsec_nanos() > 0 {
            secs += 1;
        }
        Ok(i64::try_from(secs).unwrap_or(i64::MAX))
    }
}
