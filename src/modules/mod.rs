//! Handler module subsystem.
//!
//! # Data Flow
//! ```text
//! SanitizedPath
//!     → resolver.rs (candidate locations, primary extension first)
//!         → cache.rs (evict candidate before every load)
//!         → loader.rs (read + parse handler file, or table lookup)
//!             → definition.rs (document → HandlerModule)
//!     → Return: Resolved module or NotFound with per-candidate causes
//!
//! Out of band:
//!     watcher.rs (file change) → cache.rs evict
//!     admin API / SIGHUP → cache.rs evict / clear
//! ```
//!
//! # Design Decisions
//! - The cache is an injected object, one per server, never a global
//! - Native code is only reachable through the handler registry
//! - Shape checks happen once, in `HandlerModule::entry_point`

pub mod cache;
pub mod definition;
pub mod loader;
pub mod module;
pub mod resolver;
pub mod watcher;

pub use cache::{CacheEntryInfo, CacheStats, ModuleCache};
pub use definition::DefinitionError;
pub use loader::{FileModuleLoader, LoadError, ModuleLoader, ModuleLocation, TableLoader};
pub use module::{Export, HandlerModule, ShapeError};
pub use resolver::{HandlerResolver, LoadAttempt, Resolved, ResolutionError};
pub use watcher::HandlerWatcher;
