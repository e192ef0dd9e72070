//! Query result cache
//!
//! Read results from [`Resource`](super::resource::Resource) calls are kept
//! here keyed by entity and query. Any write to an entity drops every entry
//! for that entity.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tracing::trace;

/// Default time a cached result stays fresh
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(300);

/// Cache key: the entity a query belongs to plus what distinguishes the query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub entity: String,
    pub discriminator: String,
}

impl QueryKey {
    pub fn new(entity: impl Into<String>, discriminator: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            discriminator: discriminator.into(),
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    value: JsonValue,
    fetched_at: DateTime<Utc>,
}

/// In-memory cache of query results
#[derive(Debug)]
pub struct QueryCache {
    entries: RwLock<HashMap<QueryKey, CacheEntry>>,
    stale_time: Duration,
}

impl QueryCache {
    /// Create a cache whose entries stay fresh for `stale_time`
    pub fn new(stale_time: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            stale_time,
        }
    }

    /// Whether results are cached at all
    pub fn is_enabled(&self) -> bool {
        !self.stale_time.is_zero()
    }

    /// Fresh cached value for `key`, if any
    ///
    /// A stale entry found here is dropped.
    pub fn get(&self, key: &QueryKey) -> Option<JsonValue> {
        if !self.is_enabled() {
            return None;
        }

        let now = Utc::now();
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            let entry = entries.get(key)?;
            if self.is_fresh(entry, now) {
                trace!(entity = %key.entity, query = %key.discriminator, "Cache hit");
                return Some(entry.value.clone());
            }
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries
            .get(key)
            .is_some_and(|entry| !self.is_fresh(entry, now))
        {
            entries.remove(key);
        }
        None
    }

    /// Store a freshly fetched value, pruning stale entries
    pub fn insert(&self, key: QueryKey, value: JsonValue) {
        if !self.is_enabled() {
            return;
        }

        let now = Utc::now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, entry| self.is_fresh(entry, now));
        entries.insert(
            key,
            CacheEntry {
                value,
                fetched_at: now,
            },
        );
    }

    /// Drop every entry belonging to `entity`
    pub fn invalidate_entity(&self, entity: &str) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|key, _| key.entity != entity);
        trace!(entity, "Cache invalidated");
    }

    /// Drop everything
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of stored entries, fresh or stale
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A negative age (clock stepped back) counts as fresh
    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        (now - entry.fetched_at)
            .to_std()
            .ok()
            .is_none_or(|age| age < self.stale_time)
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIME)
    }
}
