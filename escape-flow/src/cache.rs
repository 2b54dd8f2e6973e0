use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;

use crate::models::{RecommendationFilter, RecommendationItem};

/// Composite key for a recommendation request. Absent fields are stored as
/// empty strings and nothing is normalised, so `"Movies"` and `"movies"` are
/// different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecommendationKey {
    pub category: String,
    pub query: String,
    pub genre: String,
    pub year: String,
}

impl From<&RecommendationFilter> for RecommendationKey {
    fn from(filter: &RecommendationFilter) -> Self {
        Self {
            category: filter.category.clone(),
            query: filter.query.clone().unwrap_or_default(),
            genre: filter.genre.clone().unwrap_or_default(),
            year: filter.year.clone().unwrap_or_default(),
        }
    }
}

/// Session-scoped memo of successful provider results.
///
/// There is no eviction, TTL or size bound: entries live until the cache is
/// dropped. Host one per client session, not one per long-lived server, or
/// memory grows with every distinct request.
#[derive(Debug, Clone)]
pub struct ResponseCache<K, V>
where
    K: Eq + Hash,
{
    entries: Arc<DashMap<K, V>>,
}

impl<K, V> ResponseCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Last writer wins when two misses for the same key race.
    pub fn insert(&self, key: K, value: V) {
        self.entries.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl<K, V> Default for ResponseCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

pub type RecommendationCache = ResponseCache<RecommendationKey, Arc<Vec<RecommendationItem>>>;

/// Keyed by topic title.
pub type AdviceCache = ResponseCache<String, String>;
