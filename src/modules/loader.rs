//! Module loaders.
//!
//! # Responsibilities
//! - Turn a resolved file location into a [`HandlerModule`]
//! - Report distinct failures (missing, unreadable, unparsable, invalid)
//!
//! # Design Decisions
//! - Loaders never cache; freshness is the resolver's and cache's concern
//! - `FileModuleLoader` re-reads and re-parses the file on every call
//! - `FileModuleLoader` refuses files whose canonical path leaves the base
//!   directory (symlinks)
//! - `TableLoader` builds a fresh module from a factory on every call

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

use crate::handler::HandlerRegistry;
use crate::modules::definition::{compile, DefinitionError};
use crate::modules::module::HandlerModule;
use crate::routing::SanitizedPath;

/// Where a candidate module lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleLocation {
    /// Route-relative key, e.g. `templates/1.toml`.
    pub key: String,
    /// Absolute file location, e.g. `/srv/api/templates/1.toml`.
    pub path: PathBuf,
    /// Candidate extension without the dot.
    pub extension: String,
}

/// Why a candidate could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no module at {0}")]
    Missing(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid handler definition in {path}: {source}")]
    Definition {
        path: PathBuf,
        #[source]
        source: DefinitionError,
    },
    #[error("unsupported module format {0:?}")]
    UnsupportedFormat(String),
    #[error("{0} resolves outside the handler directory")]
    OutsideBase(PathBuf),
}

impl LoadError {
    /// True when there was simply nothing to load.
    pub fn is_missing(&self) -> bool {
        matches!(self, LoadError::Missing(_))
    }

    /// Metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::Missing(_) => "missing",
            LoadError::Io { .. } => "io",
            LoadError::Parse { .. } => "parse",
            LoadError::Definition { .. } => "definition",
            LoadError::UnsupportedFormat(_) => "unsupported_format",
            LoadError::OutsideBase(_) => "outside_base",
        }
    }
}

/// Loads a module from a location.
pub trait ModuleLoader: Send + Sync {
    fn load<'a>(&'a self, location: &'a ModuleLocation)
        -> BoxFuture<'a, Result<HandlerModule, LoadError>>;
}

/// Loads declarative handler files (`.toml`, `.json`) from disk.
#[derive(Debug, Clone)]
pub struct FileModuleLoader {
    base_dir: PathBuf,
    registry: HandlerRegistry,
}

impl FileModuleLoader {
    pub fn new(base_dir: impl Into<PathBuf>, registry: HandlerRegistry) -> Self {
        Self {
            base_dir: base_dir.into(),
            registry,
        }
    }

    async fn load_file(&self, location: &ModuleLocation) -> Result<HandlerModule, LoadError> {
        let path = &location.path;
        let format = Format::from_extension(&location.extension)?;

        let canonical = match tokio::fs::canonicalize(path).await {
            Ok(canonical) => canonical,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(LoadError::Missing(path.clone()));
            }
            Err(source) => {
                return Err(LoadError::Io {
                    path: path.clone(),
                    source,
                });
            }
        };
        let base = tokio::fs::canonicalize(&self.base_dir)
            .await
            .map_err(|source| LoadError::Io {
                path: self.base_dir.clone(),
                source,
            })?;
        if !canonical.starts_with(&base) {
            return Err(LoadError::OutsideBase(path.clone()));
        }

        let text = match tokio::fs::read_to_string(&canonical).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(LoadError::Missing(path.clone()));
            }
            Err(source) => {
                return Err(LoadError::Io {
                    path: path.clone(),
                    source,
                });
            }
        };

        let document = format.parse(&text).map_err(|message| LoadError::Parse {
            path: path.clone(),
            message,
        })?;

        compile(document, &self.registry).map_err(|source| LoadError::Definition {
            path: path.clone(),
            source,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Format {
    Toml,
    Json,
}

impl Format {
    fn from_extension(extension: &str) -> Result<Self, LoadError> {
        match extension {
            "toml" => Ok(Format::Toml),
            "json" => Ok(Format::Json),
            other => Err(LoadError::UnsupportedFormat(other.to_string())),
        }
    }

    fn parse(self, text: &str) -> Result<Value, String> {
        match self {
            Format::Toml => toml::from_str::<Value>(text).map_err(|e| e.to_string()),
            Format::Json => serde_json::from_str::<Value>(text).map_err(|e| e.to_string()),
        }
    }
}

impl ModuleLoader for FileModuleLoader {
    fn load<'a>(
        &'a self,
        location: &'a ModuleLocation,
    ) -> BoxFuture<'a, Result<HandlerModule, LoadError>> {
        Box::pin(self.load_file(location))
    }
}

type ModuleFactory = Arc<dyn Fn() -> HandlerModule + Send + Sync>;

/// In-memory route table: module key → factory.
///
/// Keys are route-relative with extension (`templates/1.toml`). Each load
/// calls the factory again, so every load yields a new module value.
#[derive(Clone, Default)]
pub struct TableLoader {
    factories: HashMap<String, ModuleFactory>,
}

impl TableLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<F>(&mut self, key: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> HandlerModule + Send + Sync + 'static,
    {
        self.factories.insert(key.into(), Arc::new(factory));
        self
    }
}

impl ModuleLoader for TableLoader {
    fn load<'a>(
        &'a self,
        location: &'a ModuleLocation,
    ) -> BoxFuture<'a, Result<HandlerModule, LoadError>> {
        let result = self
            .factories
            .get(&location.key)
            .map(|factory| factory())
            .ok_or_else(|| LoadError::Missing(location.path.clone()));
        Box::pin(async move { result })
    }
}

/// Location of `route` under `base_dir` for one candidate extension.
pub fn location_for(base_dir: &Path, route: &SanitizedPath, extension: &str) -> ModuleLocation {
    ModuleLocation {
        key: format!("{}.{}", route, extension),
        path: route.with_extension_under(base_dir, extension),
        extension: extension.to_string(),
    }
}
