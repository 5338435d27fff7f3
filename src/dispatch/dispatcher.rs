//! Request dispatcher.
//!
//! ```text
//! RouteRequest { segments, request }
//!     → join segments into the raw path
//!     → PathValidator          (400 on rejection, raw path + reason logged)
//!     → HandlerResolver        (404 when no candidate loads)
//!     → HandlerModule entry    (500 "Invalid API handler" on bad shape)
//!     → Handler::call          (500 "Internal server error" on error/panic)
//!     → Dispatch { outcome, response }
//! ```

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use futures_util::FutureExt;

use crate::config::DispatcherConfig;
use crate::dispatch::error::{DispatchError, InvocationError};
use crate::dispatch::outcome::DispatchOutcome;
use crate::handler::{ApiRequest, HandlerError, SharedHandler};
use crate::http::request::request_id;
use crate::modules::HandlerResolver;
use crate::observability::metrics;
use crate::routing::{PathValidator, RawSegments, RoutePathValidator, SanitizedPath};

/// A request as it leaves the routing layer.
#[derive(Debug)]
pub struct RouteRequest {
    /// Captured wildcard fragment, unvalidated.
    pub segments: RawSegments,
    pub request: Request<Body>,
}

impl RouteRequest {
    pub fn new(segments: impl Into<RawSegments>, request: Request<Body>) -> Self {
        Self {
            segments: segments.into(),
            request,
        }
    }
}

/// Result of one dispatch: the terminal outcome and the single response.
#[derive(Debug)]
pub struct Dispatch {
    pub outcome: DispatchOutcome,
    pub response: Response,
}

/// Validates, resolves and invokes handlers for API requests.
#[derive(Clone)]
pub struct Dispatcher {
    validator: Arc<dyn PathValidator>,
    resolver: HandlerResolver,
    body_limit: usize,
}

impl Dispatcher {
    pub fn new(
        validator: Arc<dyn PathValidator>,
        resolver: HandlerResolver,
        body_limit: usize,
    ) -> Self {
        Self {
            validator,
            resolver,
            body_limit,
        }
    }

    /// Dispatcher with the standard validator built from config.
    pub fn from_config(config: &DispatcherConfig, resolver: HandlerResolver) -> Self {
        Self::new(
            Arc::new(RoutePathValidator::new(&config.validation)),
            resolver,
            config.limits.max_body_size,
        )
    }

    pub fn resolver(&self) -> &HandlerResolver {
        &self.resolver
    }

    pub fn validator(&self) -> &Arc<dyn PathValidator> {
        &self.validator
    }

    /// Run one request to its terminal outcome.
    pub async fn dispatch(&self, route: RouteRequest) -> Dispatch {
        let start = Instant::now();
        let request_id = request_id(route.request.headers());
        let method = route.request.method().clone();
        let raw_path = route.segments.join();

        let dispatch = match self.run(&raw_path, route.request, &request_id).await {
            Ok(response) => Dispatch {
                outcome: DispatchOutcome::Handled {
                    status: response.status(),
                },
                response,
            },
            Err(err) => Dispatch {
                outcome: err.outcome(),
                response: err.into_response(),
            },
        };

        let status = dispatch.response.status();
        metrics::record_dispatch(dispatch.outcome.label(), status.as_u16(), start);
        tracing::debug!(
            request_id = %request_id,
            method = %method,
            path = %raw_path,
            outcome = dispatch.outcome.label(),
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Dispatch complete"
        );
        dispatch
    }

    async fn run(
        &self,
        raw_path: &str,
        request: Request<Body>,
        request_id: &str,
    ) -> Result<Response, DispatchError> {
        let route = self.validator.validate(raw_path).inspect_err(|reason| {
            tracing::warn!(
                request_id = %request_id,
                raw_path = ?raw_path,
                reason = %reason,
                "Rejected API path"
            );
        })?;

        let resolved = self.resolver.resolve(&route).await.inspect_err(|err| {
            tracing::info!(
                request_id = %request_id,
                route = %route,
                error = %err,
                "API endpoint not found"
            );
        })?;

        let handler = resolved.module.entry_point().inspect_err(|err| {
            tracing::error!(
                request_id = %request_id,
                route = %route,
                location = %resolved.location.path.display(),
                error = %err,
                "Invalid API handler"
            );
        })?;

        let req = ApiRequest::new(request, route.clone(), request_id.to_string(), self.body_limit);
        invoke(handler, req).await.map_err(|err| {
            log_invocation_failure(request_id, &route, &err);
            DispatchError::from(err)
        })
    }
}

/// Call the handler, turning errors and panics (at call time, while the
/// future runs, or while its body streams) into [`InvocationError`].
///
/// The response body is buffered here so a body that fails part way still
/// ends as a 500 instead of a truncated `Handled` response.
async fn invoke(handler: SharedHandler, req: ApiRequest) -> Result<Response, InvocationError> {
    let future = std::panic::catch_unwind(AssertUnwindSafe(|| handler.call(req)))
        .map_err(|payload| InvocationError::Panicked(panic_message(payload)))?;

    let buffered = async move {
        let (parts, body) = future.await?.into_parts();
        let bytes = axum::body::to_bytes(body, usize::MAX)
            .await
            .map_err(HandlerError::ResponseBody)?;
        Ok::<_, HandlerError>(Response::from_parts(parts, Body::from(bytes)))
    };

    match AssertUnwindSafe(buffered).catch_unwind().await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(e)) => Err(InvocationError::Failed(e)),
        Err(payload) => Err(InvocationError::Panicked(panic_message(payload))),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn log_invocation_failure(request_id: &str, route: &SanitizedPath, err: &InvocationError) {
    match err {
        InvocationError::Failed(e) => {
            tracing::error!(
                request_id = %request_id,
                route = %route,
                error = %e,
                "API handler failed"
            );
        }
        InvocationError::Panicked(message) => {
            tracing::error!(
                request_id = %request_id,
                route = %route,
                panic = %message,
                "API handler panicked"
            );
        }
    }
}
