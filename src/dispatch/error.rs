//! Dispatch error taxonomy.
//!
//! | Error        | Status | Client body                                |
//! |--------------|--------|--------------------------------------------|
//! | `Validation` | 400    | `{ "error": "Invalid API path" }`          |
//! | `Resolution` | 404    | `{ "error": "API endpoint not found" }`    |
//! | `Shape`      | 500    | `{ "error": "Invalid API handler" }`       |
//! | `Invocation` | 500    | `{ "error": "Internal server error" }`     |
//!
//! Error detail (reasons, file locations, panic messages) only goes to logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::dispatch::outcome::DispatchOutcome;
use crate::handler::HandlerError;
use crate::http::response::json_error;
use crate::modules::{ResolutionError, ShapeError};
use crate::routing::PathRejection;

pub const INVALID_PATH: &str = "Invalid API path";
pub const NOT_FOUND: &str = "API endpoint not found";
pub const INVALID_HANDLER: &str = "Invalid API handler";
pub const INTERNAL_ERROR: &str = "Internal server error";

/// A handler ran and failed.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error(transparent)]
    Failed(#[from] HandlerError),
    #[error("handler panicked: {0}")]
    Panicked(String),
}

/// Every way a dispatch can end other than `Handled`.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid API path: {0}")]
    Validation(#[from] PathRejection),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error("invalid API handler: {0}")]
    Shape(#[from] ShapeError),
    #[error(transparent)]
    Invocation(#[from] InvocationError),
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::Validation(_) => StatusCode::BAD_REQUEST,
            DispatchError::Resolution(_) => StatusCode::NOT_FOUND,
            DispatchError::Shape(_) | DispatchError::Invocation(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The fixed message clients see.
    pub fn public_message(&self) -> &'static str {
        match self {
            DispatchError::Validation(_) => INVALID_PATH,
            DispatchError::Resolution(_) => NOT_FOUND,
            DispatchError::Shape(_) => INVALID_HANDLER,
            DispatchError::Invocation(_) => INTERNAL_ERROR,
        }
    }

    /// Terminal outcome this error produces.
    pub fn outcome(&self) -> DispatchOutcome {
        match self {
            DispatchError::Validation(reason) => DispatchOutcome::Rejected {
                reason: reason.to_string(),
            },
            DispatchError::Resolution(ResolutionError::NotFound { path, .. }) => {
                DispatchOutcome::NotFound { path: path.clone() }
            }
            DispatchError::Shape(e) => DispatchOutcome::InternalError {
                cause: e.to_string(),
            },
            DispatchError::Invocation(e) => DispatchOutcome::InternalError {
                cause: e.to_string(),
            },
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        json_error(self.status(), self.public_message())
    }
}
