//! Handler contract.
//!
//! Every API endpoint, whether compiled into the binary or described by a
//! handler file, is reached through the single [`Handler`] trait:
//! `call(ApiRequest) -> Future<Output = Result<Response, HandlerError>>`.
//!
//! - [`handler_fn`] adapts async closures
//! - [`StaticHandler`] serves a fixed status, headers and body
//! - [`HandlerRegistry`] is the name → handler dispatch table

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use axum::response::Response;
use futures_util::future::BoxFuture;
use thiserror::Error;

pub mod builtin;
pub mod registry;
pub mod request;
pub mod static_response;

pub use registry::HandlerRegistry;
pub use request::ApiRequest;
pub use static_response::StaticHandler;

/// Result type for handler invocations.
pub type HandlerResult = Result<Response, HandlerError>;

/// Shared, type-erased handler.
pub type SharedHandler = Arc<dyn Handler>;

/// Errors a handler reports back to the dispatcher.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Message(String),
    #[error("failed to read request body: {0}")]
    Body(#[from] axum::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("response body failed: {0}")]
    ResponseBody(#[source] axum::Error),
}

impl HandlerError {
    pub fn msg(message: impl Into<String>) -> Self {
        HandlerError::Message(message.into())
    }
}

/// Something that can answer an API request.
///
/// The dispatcher buffers the returned body before answering, so a body
/// stream that errors is reported as a handler failure (500) rather than a
/// truncated response. Handlers should not rely on streaming to the client.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: ApiRequest) -> BoxFuture<'static, HandlerResult>;
}

/// Adapter turning an async closure into a [`Handler`].
pub struct FnHandler<F, Fut>
where
    F: Fn(ApiRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    f: F,
    _phantom: PhantomData<fn() -> Fut>,
}

impl<F, Fut> Handler for FnHandler<F, Fut>
where
    F: Fn(ApiRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, req: ApiRequest) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self.f)(req))
    }
}

/// Wrap an async closure as a shared handler.
///
/// ```ignore
/// let hello = handler_fn(|_req| async { Ok("hello".into_response()) });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> SharedHandler
where
    F: Fn(ApiRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(FnHandler {
        f,
        _phantom: PhantomData,
    })
}
