use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Thread-safe LRU cache for query embeddings.
///
/// Retrieval embeds the same few queries repeatedly while a user iterates on a
/// question; caching them avoids redundant embedding-service calls. LRU
/// eviction keeps memory bounded.
pub struct EmbeddingCache {
    cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl EmbeddingCache {
    /// Create a cache holding at most `capacity` embeddings (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).expect("Cache capacity must be at least 1");
        Self {
            cache: Mutex::new(LruCache::new(cap)),
        }
    }

    /// Look up a cached embedding for a query text.
    pub fn get(&self, query: &str) -> Option<Vec<f32>> {
        self.cache.lock().unwrap().get(query).cloned()
    }

    /// Store an embedding keyed by its query text.
    pub fn put(&self, query: String, embedding: Vec<f32>) {
        self.cache.lock().unwrap().put(query, embedding);
    }

    pub fn len(&self) -> usize {
        self.cache.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_hit_and_miss() {
        let cache = EmbeddingCache::new(2);
        assert!(cache.get("q").is_none());
        cache.put("q".to_string(), vec![1.0, 2.0]);
        assert_eq!(cache.get("q"), Some(vec![1.0, 2.0]));
    }

    #[test]
    fn test_cache_evicts_least_recently_used() {
        let cache = EmbeddingCache::new(2);
        cache.put("a".to_string(), vec![1.0]);
        cache.put("b".to_string(), vec![2.0]);
        cache.get("a");
        cache.put("c".to_string(), vec![3.0]);
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_zero_capacity_clamped_to_one() {
        let cache = EmbeddingCache::new(0);
        cache.put("x".to_string(), vec![0.5]);
        assert_eq!(cache.len(), 1);
    }
}
