//! Route validation subsystem.
//!
//! # Data Flow
//! ```text
//! Wildcard route fragment (raw, attacker-controlled)
//!     → path.rs (join raw segments into one route string)
//!     → validator.rs (decode once, reject traversal/injection, normalize)
//!     → Return: SanitizedPath or PathRejection
//! ```
//!
//! # Design Decisions
//! - The raw fragment never reaches the filesystem; only `SanitizedPath` does
//! - `SanitizedPath` has no public constructor outside this module
//! - Segments are restricted to `[A-Za-z0-9_-]`, so any joined location
//!   stays under the base directory
//! - Percent-decoding happens exactly once; a surviving `%` is rejected

pub mod path;
pub mod validator;

pub use path::{RawSegments, SanitizedPath};
pub use validator::{PathRejection, PathValidator, RoutePathValidator};
