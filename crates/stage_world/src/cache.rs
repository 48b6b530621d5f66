//! Query memoization.
//!
//! The [`QueryCache`] memoizes "which actors possess all of these tags"
//! lookups. Entries are correct at the moment they are stored and must be
//! discarded on any structural mutation — staleness is a correctness bug, so
//! invalidation is a full clear, not a heuristic.
//!
//! The entry table sits behind a `Mutex` so that read-only world handles
//! (e.g. parallel behaviors) can still populate the cache.

use std::collections::{BTreeSet, HashMap};

use parking_lot::Mutex;
use stage_actor::{Actor, AttributeTag};

/// A cache key: the set of required tags, deduplicated and order-free.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(BTreeSet<AttributeTag>);

impl QueryKey {
    /// Build a key from a tag list. Order and duplicates are irrelevant.
    #[must_use]
    pub fn from_tags(tags: &[AttributeTag]) -> Self {
        Self(tags.iter().copied().collect())
    }

    /// Iterate over the required tags.
    pub fn tags(&self) -> impl Iterator<Item = AttributeTag> + '_ {
        self.0.iter().copied()
    }
}

/// Memoization table from tag set to matching actor list.
///
/// Caching is an optional mode fixed at construction; when disabled, lookups
/// always miss and nothing is ever stored.
#[derive(Debug)]
pub struct QueryCache {
    enabled: bool,
    entries: Mutex<HashMap<QueryKey, Vec<Actor>>>,
}

impl QueryCache {
    /// Create a cache. `enabled = false` turns it into a pass-through.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `true` if caching is enabled.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the cached result for `key`, if caching is enabled and the
    /// key was stored since the last invalidation.
    #[must_use]
    pub fn lookup(&self, key: &QueryKey) -> Option<Vec<Actor>> {
        if !self.enabled {
            return None;
        }
        self.entries.lock().get(key).cloned()
    }

    /// Store a computed result. No-op when caching is disabled.
    pub fn store(&self, key: QueryKey, result: Vec<Actor>) {
        if self.enabled {
            self.entries.lock().insert(key, result);
        }
    }

    /// Discard every cached entry. Called by all structural mutations.
    pub fn invalidate(&self) {
        self.entries.lock().clear();
    }

    /// Returns the number of live cache entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(n: &str) -> AttributeTag {
        AttributeTag::from_name(n)
    }

    #[test]
    fn test_key_ignores_order_and_duplicates() {
        let a = QueryKey::from_tags(&[tag("A"), tag("B")]);
        let b = QueryKey::from_tags(&[tag("B"), tag("A"), tag("B")]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_store_and_lookup() {
        let cache = QueryCache::new(true);
        let key = QueryKey::from_tags(&[tag("A")]);
        assert_eq!(cache.lookup(&key), None);
        cache.store(key.clone(), vec![Actor(0), Actor(2)]);
        assert_eq!(cache.lookup(&key), Some(vec![Actor(0), Actor(2)]));
    }

    #[test]
    fn test_invalidate_clears_everything() {
        let cache = QueryCache::new(true);
        cache.store(QueryKey::from_tags(&[tag("A")]), vec![Actor(0)]);
        cache.store(QueryKey::from_tags(&[tag("B")]), vec![Actor(1)]);
        cache.invalidate();
        assert_eq!(cache.entry_count(), 0);
        assert_eq!(cache.lookup(&QueryKey::from_tags(&[tag("A")])), None);
    }

    #[test]
    fn test_disabled_cache_never_stores() {
        let cache = QueryCache::new(false);
        let key = QueryKey::from_tags(&[tag("A")]);
        cache.store(key.clone(), vec![Actor(0)]);
        assert_eq!(cache.lookup(&key), None);
        assert_eq!(cache.entry_count(), 0);
    }
}
