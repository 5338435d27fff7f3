//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build registry, cache, resolver, dispatcher
//!     → Start watcher → Start listeners
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → servers stop accepting and drain
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     SIGHUP → Clear the module cache
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::{clear_cache_on_hangup, shutdown_signal};
pub use startup::{build_services, Services, StartupError};
