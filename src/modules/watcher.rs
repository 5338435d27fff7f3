//! Handler directory watcher for hot reload.
//!
//! Evicts cached modules whose files change on disk. Only useful with the
//! `on-change` reload policy; under `always` the cache is bypassed anyway.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::modules::cache::ModuleCache;

/// A watcher that evicts cache entries for changed handler files.
pub struct HandlerWatcher {
    base_dir: PathBuf,
    cache: Arc<ModuleCache>,
}

impl HandlerWatcher {
    /// Create a new HandlerWatcher over `base_dir`.
    ///
    /// `base_dir` must be the resolver's absolute base directory so event
    /// paths line up with cache keys.
    pub fn new(base_dir: &Path, cache: Arc<ModuleCache>) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            cache,
        }
    }

    /// Start watching in a background thread.
    ///
    /// The returned watcher must be kept alive for as long as eviction
    /// should happen.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let cache = self.cache.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => evict_for_event(&cache, &event),
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.base_dir, RecursiveMode::Recursive)?;

        tracing::info!(path = ?self.base_dir, "Handler watcher started");
        Ok(watcher)
    }
}

fn evict_for_event(cache: &ModuleCache, event: &Event) {
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return;
    }
    for path in &event.paths {
        // A renamed or removed directory takes its modules with it.
        let evicted = usize::from(cache.evict(path)) + cache.evict_under(path);
        if evicted > 0 {
            tracing::info!(
                path = %path.display(),
                evicted,
                "Handler change detected, module evicted"
            );
        }
    }
}
