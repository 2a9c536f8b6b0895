//! Generic bounded LRU cache, plus the three caches the expansion engine
//! keeps bounded: argument-split results, executable-path resolution, and
//! tokenized arithmetic expressions.

use std::collections::HashMap;
use std::hash::Hash;
use std::path::PathBuf;

pub struct LruCache<K, V> {
    capacity: usize,
    map: HashMap<K, V>,
    order: Vec<K>,
}

impl<K: Eq + Hash + Clone, V> LruCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), map: HashMap::new(), order: Vec::new() }
    }

    pub fn get(&mut self, key: &K) -> Option<&V> {
        if self.map.contains_key(key) {
            self.touch(key);
            self.map.get(key)
        } else {
            None
        }
    }

    pub fn put(&mut self, key: K, value: V) {
        if self.map.contains_key(&key) {
            self.map.insert(key.clone(), value);
            self.touch(&key);
            return;
        }
        if self.map.len() >= self.capacity {
            if !self.order.is_empty() {
                let evicted = self.order.remove(0);
                self.map.remove(&evicted);
            }
        }
        self.order.push(key.clone());
        self.map.insert(key, value);
    }

    fn touch(&mut self, key: &K) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            let k = self.order.remove(pos);
            self.order.push(k);
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }
}

/// The expansion engine's three bounded caches, sized from
/// [`crate::config::CacheLimits`]. Keying each cache on the inputs that can
/// change its answer (the field-split text/mask/IFS triple, the `PATH`
/// string alongside the command name, the raw expression text) means a
/// changed `PATH` or `IFS` naturally misses rather than needing an explicit
/// invalidation pass.
pub struct ExpansionCaches {
    pub arg_split: LruCache<(String, Vec<bool>, String), Vec<String>>,
    pub exec_path: LruCache<(String, String), Option<PathBuf>>,
    pub arithmetic_tokens: LruCache<String, Vec<String>>,
}

impl ExpansionCaches {
    pub fn new(limits: &crate::config::CacheLimits) -> Self {
        Self {
            arg_split: LruCache::new(limits.arg),
            exec_path: LruCache::new(limits.exec),
            arithmetic_tokens: LruCache::new(limits.arithmetic),
        }
    }
}

impl Default for ExpansionCaches {
    fn default() -> Self {
        Self::new(&crate::config::CacheLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_least_recently_used() {
        let mut c = LruCache::new(2);
        c.put("a", 1);
        c.put("b", 2);
        c.get(&"a");
        c.put("c", 3); // should evict "b", the least recently touched
        assert!(c.get(&"b").is_none());
        assert_eq!(*c.get(&"a").unwrap(), 1);
        assert_eq!(*c.get(&"c").unwrap(), 3);
    }

    #[test]
    fn put_updates_existing_without_growing() {
        let mut c = LruCache::new(2);
        c.put("a", 1);
        c.put("a", 2);
        assert_eq!(c.len(), 1);
        assert_eq!(*c.get(&"a").unwrap(), 2);
    }

    #[test]
    fn expansion_caches_are_bounded_by_config_limits() {
        let limits = crate::config::CacheLimits { arg: 1, exec: 1, arithmetic: 1 };
        let mut caches = ExpansionCaches::new(&limits);
        caches.arithmetic_tokens.put("1+1".to_string(), vec!["1".into(), "+".into(), "1".into()]);
        caches.arithmetic_tokens.put("2+2".to_string(), vec!["2".into(), "+".into(), "2".into()]);
        assert_eq!(caches.arithmetic_tokens.len(), 1);
        assert!(caches.arithmetic_tokens.get(&"1+1".to_string()).is_none());
    }
}
