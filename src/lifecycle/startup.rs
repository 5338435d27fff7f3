//! Startup orchestration.
//!
//! Wires the dispatch core in dependency order:
//! registry → cache → loader → resolver → dispatcher → (optional) watcher.
//!
//! # Design Decisions
//! - Fail fast: a watcher that cannot start is fatal when `api.watch` is set
//! - A missing base directory is only a warning; every route is then 404
//!   until handler files appear

use std::sync::Arc;

use notify::RecommendedWatcher;
use thiserror::Error;

use crate::config::DispatcherConfig;
use crate::dispatch::Dispatcher;
use crate::handler::HandlerRegistry;
use crate::modules::{FileModuleLoader, HandlerResolver, HandlerWatcher, ModuleCache};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to watch handler directory: {0}")]
    Watch(#[from] notify::Error),
}

/// Everything the servers share.
pub struct Services {
    pub registry: HandlerRegistry,
    pub cache: Arc<ModuleCache>,
    pub dispatcher: Arc<Dispatcher>,
    /// Kept alive for as long as the services are.
    pub watcher: Option<RecommendedWatcher>,
}

/// Build the dispatcher over the handler files in `config.api.base_dir`.
pub fn build_services(
    config: &DispatcherConfig,
    registry: HandlerRegistry,
) -> Result<Services, StartupError> {
    let cache = Arc::new(ModuleCache::new());
    let loader = Arc::new(FileModuleLoader::new(
        config.api.base_dir.clone(),
        registry.clone(),
    ));
    let resolver = HandlerResolver::from_config(&config.api, loader, cache.clone());

    if !resolver.base_dir().is_dir() {
        tracing::warn!(
            base_dir = %resolver.base_dir().display(),
            "Handler directory does not exist"
        );
    }

    let watcher = if config.api.watch {
        Some(HandlerWatcher::new(resolver.base_dir(), cache.clone()).run()?)
    } else {
        None
    };

    tracing::info!(
        base_dir = %resolver.base_dir().display(),
        extensions = ?config.api.extensions,
        reload = ?resolver.policy(),
        watch = config.api.watch,
        handlers = registry.len(),
        "Dispatcher initialized"
    );

    let dispatcher = Arc::new(Dispatcher::from_config(config, resolver));
    Ok(Services {
        registry,
        cache,
        dispatcher,
        watcher,
    })
}
