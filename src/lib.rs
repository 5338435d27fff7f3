//! Dynamic API request dispatcher library.
//!
//! Maps `ANY /api/{*path}` onto handler files under a base directory,
//! validating the path, loading the module fresh and invoking its entry
//! point. See [`dispatch::Dispatcher`] for the core flow.

// Core subsystems
pub mod config;
pub mod dispatch;
pub mod handler;
pub mod http;
pub mod modules;
pub mod routing;

// Cross-cutting concerns
pub mod admin;
pub mod lifecycle;
pub mod observability;

pub use config::DispatcherConfig;
pub use dispatch::{Dispatch, DispatchOutcome, Dispatcher, RouteRequest};
pub use handler::{handler_fn, Handler, HandlerError, HandlerRegistry};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
