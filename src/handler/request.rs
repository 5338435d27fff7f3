//! Handler input.

use axum::body::{Body, Bytes};
use axum::http::{request::Parts, HeaderMap, Method, Request, Uri};
use serde::de::DeserializeOwned;

use crate::handler::HandlerError;
use crate::routing::SanitizedPath;

/// What a handler receives: the validated route plus the untouched request.
///
/// The body is passed through unread; handlers that need it call
/// [`ApiRequest::bytes`] or [`ApiRequest::json`].
#[derive(Debug)]
pub struct ApiRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub route: SanitizedPath,
    pub request_id: String,
    body: Body,
    body_limit: usize,
}

impl ApiRequest {
    pub fn new(
        request: Request<Body>,
        route: SanitizedPath,
        request_id: String,
        body_limit: usize,
    ) -> Self {
        let (Parts { method, uri, headers, .. }, body) = request.into_parts();
        Self {
            method,
            uri,
            headers,
            route,
            request_id,
            body,
            body_limit,
        }
    }

    /// Raw query string, if any.
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Buffer the body, bounded by the configured limit.
    pub async fn bytes(self) -> Result<Bytes, HandlerError> {
        Ok(axum::body::to_bytes(self.body, self.body_limit).await?)
    }

    /// Buffer and decode a JSON body.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, HandlerError> {
        let bytes = self.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{PathValidator, RoutePathValidator};
    use serde_json::Value;

    fn route(raw: &str) -> SanitizedPath {
        RoutePathValidator::default().validate(raw).unwrap()
    }

    #[tokio::test]
    async fn test_json_body() {
        let request = Request::post("/api/users/create?dry=1")
            .body(Body::from(r#"{"name":"Ada"}"#))
            .unwrap();
        let req = ApiRequest::new(request, route("users/create"), "req-1".into(), 1024);
        assert_eq!(req.query(), Some("dry=1"));
        assert_eq!(req.method, Method::POST);

        let body: Value = req.json().await.unwrap();
        assert_eq!(body["name"], "Ada");
    }

    #[tokio::test]
    async fn test_body_limit() {
        let request = Request::post("/api/upload")
            .body(Body::from(vec![b'x'; 64]))
            .unwrap();
        let req = ApiRequest::new(request, route("upload"), "req-2".into(), 16);
        assert!(matches!(req.bytes().await, Err(HandlerError::Body(_))));
    }
}
