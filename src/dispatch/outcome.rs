use axum::http::StatusCode;
use serde::Serialize;

use crate::routing::SanitizedPath;

/// How a dispatch ended. Exactly one per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The handler ran and produced a response.
    Handled { status: StatusCode },
    /// The raw path failed validation.
    Rejected { reason: String },
    /// No loadable module for the sanitized path.
    NotFound { path: SanitizedPath },
    /// Malformed module shape, or the handler failed or panicked.
    InternalError { cause: String },
}

impl DispatchOutcome {
    /// Metrics label.
    pub fn label(&self) -> &'static str {
        match self {
            DispatchOutcome::Handled { .. } => "handled",
            DispatchOutcome::Rejected { .. } => "rejected",
            DispatchOutcome::NotFound { .. } => "not_found",
            DispatchOutcome::InternalError { .. } => "internal_error",
        }
    }

    pub fn is_handled(&self) -> bool {
        matches!(self, DispatchOutcome::Handled { .. })
    }
}

/// Fixed client-facing error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
}
