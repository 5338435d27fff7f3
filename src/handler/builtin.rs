//! Handlers compiled into the binary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde_json::{json, Value};

use crate::handler::{handler_fn, ApiRequest, HandlerRegistry, HandlerResult};

/// Register the built-in handlers under their public names.
pub fn register_builtins(registry: &HandlerRegistry) {
    registry.register("echo", handler_fn(echo));
    registry.register("status", handler_fn(status));
}

/// Reflects the request back as JSON.
async fn echo(req: ApiRequest) -> HandlerResult {
    let method = req.method.to_string();
    let route = req.route.to_string();
    let query = req.query().map(str::to_string);
    let request_id = req.request_id.clone();

    let bytes = req.bytes().await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };

    Ok(Json(json!({
        "method": method,
        "route": route,
        "query": query,
        "request_id": request_id,
        "body": body,
    }))
    .into_response())
}

async fn status(_req: ApiRequest) -> HandlerResult {
    Ok((
        StatusCode::OK,
        Json(json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "status": "operational",
        })),
    )
        .into_response())
}
