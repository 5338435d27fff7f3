//! Fixed responses described by handler files.

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::handler::{ApiRequest, Handler, HandlerResult};

/// Body served by a [`StaticHandler`].
#[derive(Debug, Clone, PartialEq)]
pub enum StaticBody {
    Empty,
    Text(String),
    Json(Value),
}

/// Serves the same status, headers and body on every call.
#[derive(Debug, Clone)]
pub struct StaticHandler {
    status: StatusCode,
    headers: HeaderMap,
    body: StaticBody,
}

impl StaticHandler {
    pub fn new(status: StatusCode, headers: HeaderMap, body: StaticBody) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn json(status: StatusCode, body: Value) -> Self {
        Self::new(status, HeaderMap::new(), StaticBody::Json(body))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    fn render(&self) -> Response {
        let (content_type, body) = match &self.body {
            StaticBody::Empty => (None, Body::empty()),
            StaticBody::Text(text) => (
                Some(HeaderValue::from_static("text/plain; charset=utf-8")),
                Body::from(text.clone()),
            ),
            StaticBody::Json(value) => (
                Some(HeaderValue::from_static("application/json")),
                Body::from(value.to_string()),
            ),
        };

        let mut response = Response::new(body);
        *response.status_mut() = self.status;
        if let Some(content_type) = content_type {
            response.headers_mut().insert(header::CONTENT_TYPE, content_type);
        }
        for (name, value) in &self.headers {
            response.headers_mut().insert(name.clone(), value.clone());
        }
        response
    }
}

impl Handler for StaticHandler {
    fn call(&self, _req: ApiRequest) -> BoxFuture<'static, HandlerResult> {
        let response = self.render();
        Box::pin(async move { Ok(response) })
    }
}
