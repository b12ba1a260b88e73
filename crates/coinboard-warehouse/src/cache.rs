//! Time-based memoization of fetch results.
//!
//! Keys are the full query of the fetch (every input that changes the result), so an entry is only
//! ever reused for an identical request.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;
use tokio::time::Instant;

pub struct TtlCache<K, V> {
    entries: HashMap<K, (V, Instant)>,
    ttl: Option<Duration>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Entries expire once they are older than `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl: Some(ttl),
        }
    }

    /// Entries live for as long as the cache does.
    pub fn unbounded() -> Self {
        Self {
            entries: HashMap::new(),
            ttl: None,
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.entries
            .get(key)
            .filter(|(_, inserted)| !self.is_expired(*inserted))
            .map(|(value, _)| value.clone())
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.entries.insert(key, (value, Instant::now()));
    }

    pub fn invalidate(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|(value, _)| value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Remove expired entries.
    pub fn purge_expired(&mut self) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, (_, inserted)| ttl.map_or(true, |ttl| inserted.elapsed() <= ttl));
    }

    /// Keep only the entries whose key passes `keep`.
    pub fn retain_keys(&mut self, mut keep: impl FnMut(&K) -> bool) {
        self.entries.retain(|key, _| keep(key));
    }

    /// Number of entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_expired(&self, inserted: Instant) -> bool {
        self.ttl.is_some_and(|ttl| inserted.elapsed() > ttl)
    }
}
