//! Sanitized route → loaded handler module.
//!
//! # Responsibilities
//! - Try each configured extension in order (primary first)
//! - Evict the cached copy of a candidate before loading it
//! - Record every failed attempt with its distinct cause
//!
//! # Design Decisions
//! - A broken primary file falls through to the next extension; the outcome
//!   is `NotFound`, and the parse/definition error is logged at `warn`
//! - Each candidate is tried once, no retries
//! - No lock around evict+load; a concurrent duplicate load is harmless

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::config::{ApiConfig, ReloadPolicy};
use crate::modules::cache::ModuleCache;
use crate::modules::loader::{location_for, LoadError, ModuleLoader, ModuleLocation};
use crate::modules::module::HandlerModule;
use crate::observability::metrics;
use crate::routing::SanitizedPath;

/// A module found for a route.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub module: Arc<HandlerModule>,
    pub location: ModuleLocation,
}

/// One failed candidate.
#[derive(Debug)]
pub struct LoadAttempt {
    pub location: ModuleLocation,
    pub error: LoadError,
}

/// Every candidate failed.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("no handler for {path} ({})", summarize(.attempts))]
    NotFound {
        path: SanitizedPath,
        attempts: Vec<LoadAttempt>,
    },
}

fn summarize(attempts: &[LoadAttempt]) -> String {
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.location.extension, a.error.kind()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolves sanitized routes against the handler directory.
#[derive(Clone)]
pub struct HandlerResolver {
    base_dir: PathBuf,
    extensions: Vec<String>,
    policy: ReloadPolicy,
    loader: Arc<dyn ModuleLoader>,
    cache: Arc<ModuleCache>,
}

impl HandlerResolver {
    pub fn new(
        base_dir: impl Into<PathBuf>,
        extensions: Vec<String>,
        policy: ReloadPolicy,
        loader: Arc<dyn ModuleLoader>,
        cache: Arc<ModuleCache>,
    ) -> Self {
        let base_dir = base_dir.into();
        let base_dir = std::path::absolute(&base_dir).unwrap_or(base_dir);
        Self {
            base_dir,
            extensions,
            policy,
            loader,
            cache,
        }
    }

    pub fn from_config(
        config: &ApiConfig,
        loader: Arc<dyn ModuleLoader>,
        cache: Arc<ModuleCache>,
    ) -> Self {
        Self::new(
            config.base_dir.clone(),
            config.extensions.clone(),
            config.reload,
            loader,
            cache,
        )
    }

    /// Absolute handler directory; cache keys live under it.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn policy(&self) -> ReloadPolicy {
        self.policy
    }

    pub fn cache(&self) -> &Arc<ModuleCache> {
        &self.cache
    }

    /// Candidate locations for `route`, in resolution order.
    pub fn candidates(&self, route: &SanitizedPath) -> Vec<ModuleLocation> {
        self.extensions
            .iter()
            .map(|ext| location_for(&self.base_dir, route, ext))
            .collect()
    }

    /// Evict every candidate location of `route`. Returns how many were cached.
    pub fn evict(&self, route: &SanitizedPath) -> usize {
        self.candidates(route)
            .iter()
            .filter(|location| self.cache.evict(&location.path))
            .count()
    }

    /// Find and load the handler module for `route`.
    pub async fn resolve(&self, route: &SanitizedPath) -> Result<Resolved, ResolutionError> {
        let mut attempts = Vec::new();

        for location in self.candidates(route) {
            match self.policy {
                ReloadPolicy::Always => {
                    self.cache.evict(&location.path);
                }
                ReloadPolicy::OnChange => {
                    if let Some(module) = self.cache.get(&location.path) {
                        tracing::trace!(
                            route = %route,
                            location = %location.path.display(),
                            "Module cache hit"
                        );
                        return Ok(Resolved { module, location });
                    }
                }
            }

            match self.loader.load(&location).await {
                Ok(module) => {
                    let module = Arc::new(module);
                    self.cache.insert(location.path.clone(), module.clone());
                    metrics::record_module_load("ok");
                    tracing::debug!(
                        route = %route,
                        location = %location.path.display(),
                        shape = module.shape(),
                        "Handler module loaded"
                    );
                    return Ok(Resolved { module, location });
                }
                Err(error) => {
                    metrics::record_module_load(error.kind());
                    if error.is_missing() {
                        tracing::debug!(
                            route = %route,
                            extension = %location.extension,
                            "No module for extension"
                        );
                    } else {
                        tracing::warn!(
                            route = %route,
                            location = %location.path.display(),
                            error = %error,
                            "Handler module failed to load"
                        );
                    }
                    attempts.push(LoadAttempt { location, error });
                }
            }
        }

        Err(ResolutionError::NotFound {
            path: route.clone(),
            attempts,
        })
    }
}

impl fmt::Debug for HandlerResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerResolver")
            .field("base_dir", &self.base_dir)
            .field("extensions", &self.extensions)
            .field("policy", &self.policy)
            .finish()
    }
}
