//! Необязательный кэш результатов, принадлежит вызывающей стороне.
//! Ключ - отпечаток операции, входных данных и настроек.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::AnalyticsConfig;

pub type Fingerprint = u64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<Fingerprint, serde_json::Value>,
    order: VecDeque<Fingerprint>,
    hits: u64,
    misses: u64,
}

pub struct ResultCache {
    state: Mutex<CacheState>,
    max_entries: usize,
}

impl ResultCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            max_entries: max_entries.max(1),
        }
    }

    /// None, если вход не сериализуется (тогда кэш не используется)
    pub fn fingerprint<I: Serialize + ?Sized>(
        operation: &str,
        input: &I,
        config: &AnalyticsConfig,
    ) -> Option<Fingerprint> {
        let input = serde_json::to_vec(input).ok()?;
        let config = serde_json::to_vec(config).ok()?;

        let mut hasher = DefaultHasher::new();
        operation.hash(&mut hasher);
        input.hash(&mut hasher);
        config.hash(&mut hasher);
        Some(hasher.finish())
    }

    pub fn get<T: DeserializeOwned>(&self, key: Fingerprint) -> Option<T> {
        let mut state = self.state.lock();
        let found = state
            .entries
            .get(&key)
            .and_then(|value| serde_json::from_value(value.clone()).ok());
        match found {
            Some(_) => state.hits += 1,
            None => state.misses += 1,
        }
        found
    }

    pub fn insert<T: Serialize>(&self, key: Fingerprint, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("Result is not cacheable: {}", e);
                return;
            }
        };

        let mut state = self.state.lock();
        if state.entries.insert(key, value).is_none() {
            state.order.push_back(key);
        }
        // Вытесняются самые старые записи
        while state.order.len() > self.max_entries {
            if let Some(oldest) = state.order.pop_front() {
                state.entries.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            entries: state.entries.len(),
        }
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_depends_on_operation_input_and_config() {
        let config = AnalyticsConfig::default();
        let a = ResultCache::fingerprint("workload", &[1, 2, 3], &config);
        assert_eq!(a, ResultCache::fingerprint("workload", &[1, 2, 3], &config));
        assert_ne!(a, ResultCache::fingerprint("anomalies", &[1, 2, 3], &config));
        assert_ne!(a, ResultCache::fingerprint("workload", &[1, 2, 4], &config));

        let seeded = AnalyticsConfig {
            seed: 7,
            ..AnalyticsConfig::default()
        };
        assert_ne!(a, ResultCache::fingerprint("workload", &[1, 2, 3], &seeded));
    }

    #[test]
    fn stores_and_counts_hits() {
        let cache = ResultCache::new(4);
        assert_eq!(cache.get::<Vec<f64>>(1), None);
        cache.insert(1, &vec![1.5, 2.5]);
        assert_eq!(cache.get::<Vec<f64>>(1), Some(vec![1.5, 2.5]));

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
    }

    #[test]
    fn evicts_oldest_entry() {
        let cache = ResultCache::new(2);
        cache.insert(1, &"a");
        cache.insert(2, &"b");
        cache.insert(3, &"c");

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get::<String>(1), None);
        assert_eq!(cache.get::<String>(3), Some("c".to_string()));
    }

    #[test]
    fn reinsert_does_not_duplicate_order() {
        let cache = ResultCache::new(2);
        cache.insert(1, &"a");
        cache.insert(1, &"a2");
        cache.insert(2, &"b");
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get::<String>(1), Some("a2".to_string()));
        cache.clear();
        assert!(cache.is_empty());
    }
}
