//! Shared module cache.
//!
//! One instance per server, injected into the resolver, the watcher and the
//! admin API. Keys are resolved file locations. Eviction is idempotent:
//! evicting an absent entry is a no-op, so concurrent evict+load races only
//! cost an extra load.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use dashmap::DashMap;
use serde::Serialize;

use crate::modules::module::HandlerModule;
use crate::observability::metrics;

/// A module held by the cache.
#[derive(Debug, Clone)]
pub struct CachedModule {
    pub module: Arc<HandlerModule>,
    pub loaded_at: SystemTime,
}

/// Snapshot of one cache entry for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntryInfo {
    pub location: PathBuf,
    pub shape: &'static str,
    pub loaded_at_unix: u64,
}

/// Cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub inserts: u64,
    pub evictions: u64,
}

/// Thread-safe cache of loaded handler modules.
#[derive(Debug, Default)]
pub struct ModuleCache {
    entries: DashMap<PathBuf, CachedModule>,
    hits: AtomicU64,
    inserts: AtomicU64,
    evictions: AtomicU64,
}

impl ModuleCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached module.
    pub fn get(&self, location: &Path) -> Option<Arc<HandlerModule>> {
        let module = self.entries.get(location).map(|entry| entry.module.clone());
        if module.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        module
    }

    /// Store a freshly loaded module, replacing any previous entry.
    pub fn insert(&self, location: PathBuf, module: Arc<HandlerModule>) {
        self.entries.insert(
            location,
            CachedModule {
                module,
                loaded_at: SystemTime::now(),
            },
        );
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    /// Remove the entry for `location`. Returns whether one was present.
    pub fn evict(&self, location: &Path) -> bool {
        let removed = self.entries.remove(location).is_some();
        if removed {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            metrics::record_evictions(1);
        }
        removed
    }

    /// Remove every entry under `dir` (inclusive). Returns the count removed.
    pub fn evict_under(&self, dir: &Path) -> usize {
        let doomed: Vec<PathBuf> = self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(dir))
            .map(|entry| entry.key().clone())
            .collect();
        doomed.iter().filter(|location| self.evict(location)).count()
    }

    /// Drop every entry. Returns the count removed.
    pub fn clear(&self) -> usize {
        let mut count = 0usize;
        self.entries.retain(|_, _| {
            count += 1;
            false
        });
        self.evictions.fetch_add(count as u64, Ordering::Relaxed);
        metrics::record_evictions(count as u64);
        tracing::info!(evicted = count, "Module cache cleared");
        count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Entries sorted by location.
    pub fn entries(&self) -> Vec<CacheEntryInfo> {
        let mut entries: Vec<CacheEntryInfo> = self
            .entries
            .iter()
            .map(|entry| CacheEntryInfo {
                location: entry.key().clone(),
                shape: entry.value().module.shape(),
                loaded_at_unix: entry
                    .value()
                    .loaded_at
                    .duration_since(SystemTime::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_secs(),
            })
            .collect();
        entries.sort_by(|a, b| a.location.cmp(&b.location));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn module() -> Arc<HandlerModule> {
        Arc::new(HandlerModule::Value(json!(null)))
    }

    #[test]
    fn test_cache_operations() {
        let cache = ModuleCache::new();
        let location = PathBuf::from("/srv/api/users/list.toml");

        assert!(cache.get(&location).is_none());
        cache.insert(location.clone(), module());
        assert!(cache.get(&location).is_some());
        assert_eq!(cache.len(), 1);

        assert!(cache.evict(&location));
        assert!(cache.is_empty());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.inserts, 1);
        assert_eq!(stats.evictions, 1);
    }

    #[test]
    fn test_evict_absent_is_noop() {
        let cache = ModuleCache::new();
        let location = PathBuf::from("/srv/api/nothing.toml");
        assert!(!cache.evict(&location));
        assert!(!cache.evict(&location));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_evict_under_and_clear() {
        let cache = ModuleCache::new();
        cache.insert(PathBuf::from("/srv/api/users/list.toml"), module());
        cache.insert(PathBuf::from("/srv/api/users/show.json"), module());
        cache.insert(PathBuf::from("/srv/api/templates/1.toml"), module());

        assert_eq!(cache.evict_under(Path::new("/srv/api/users")), 2);
        let remaining: Vec<_> = cache.entries().into_iter().map(|e| e.location).collect();
        assert_eq!(remaining, vec![PathBuf::from("/srv/api/templates/1.toml")]);

        assert_eq!(cache.clear(), 1);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().evictions, 3);
    }

    #[test]
    fn test_clear_counts_toward_eviction_metric() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        let cache = ModuleCache::new();
        cache.insert(PathBuf::from("/srv/api/users/list.toml"), module());
        cache.insert(PathBuf::from("/srv/api/users/show.json"), module());
        cache.insert(PathBuf::from("/srv/api/templates/1.toml"), module());

        ::metrics::with_local_recorder(&recorder, || {
            assert!(cache.evict(Path::new("/srv/api/users/list.toml")));
            assert_eq!(cache.clear(), 2);
        });

        assert!(handle.render().contains("api_module_evictions_total 3"));
        assert_eq!(cache.stats().evictions, 3);
    }
}
