//! API request dispatch.
//!
//! Every request under the API mount ends in exactly one
//! [`DispatchOutcome`] and exactly one response:
//!
//! - `Handled`: the handler's own response
//! - `Rejected`: 400, path failed validation
//! - `NotFound`: 404, no module loaded for the route
//! - `InternalError`: 500, malformed module or failing handler

pub mod dispatcher;
pub mod error;
pub mod outcome;

pub use dispatcher::{Dispatch, Dispatcher, RouteRequest};
pub use error::{DispatchError, InvocationError};
pub use outcome::{DispatchOutcome, ErrorBody};
