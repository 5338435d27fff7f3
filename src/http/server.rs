//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the API mount routes
//! - Wire up middleware (tracing, request ID, timeout, body and in-flight limits)
//! - Hand the raw route fragment to the dispatcher
//! - Bind server to listener and shut down gracefully

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::limit::ConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::DispatcherConfig;
use crate::dispatch::{Dispatcher, RouteRequest};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub mount: Arc<str>,
}

/// HTTP server for the API dispatcher.
pub struct HttpServer {
    router: Router,
    config: DispatcherConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: DispatcherConfig, dispatcher: Arc<Dispatcher>) -> Self {
        let state = AppState {
            dispatcher,
            mount: Arc::from(config.api.mount.as_str()),
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// `Router::layer` wraps each route on its own, so the in-flight limit
    /// is applied around the whole routed service instead, giving every
    /// mount route one shared semaphore.
    #[allow(deprecated)]
    fn build_router(config: &DispatcherConfig, state: AppState) -> Router {
        let mount = config.api.mount.as_str();
        let routes = Router::new()
            .route(&format!("{mount}/{{*path}}"), any(api_handler))
            .route(&format!("{mount}/"), any(api_handler))
            .route(mount, any(api_handler))
            .with_state(state);
        let limited = ServiceBuilder::new()
            .layer(ConcurrencyLimitLayer::new(config.listener.max_connections))
            .service(routes);

        Router::new()
            .fallback_service(limited)
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The fully layered router, e.g. for in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until a shutdown signal is broadcast.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            mount = %self.config.api.mount,
            base_dir = %self.config.api.base_dir.display(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }
}

/// Route everything under the mount through the dispatcher.
async fn api_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let raw = raw_fragment(&state.mount, request.uri().path()).to_string();
    state
        .dispatcher
        .dispatch(RouteRequest::new(raw, request))
        .await
        .response
}

/// The still percent-encoded path after `mount`, without its leading `/`.
pub fn raw_fragment<'a>(mount: &str, path: &'a str) -> &'a str {
    let rest = path.strip_prefix(mount).unwrap_or(path);
    rest.strip_prefix('/').unwrap_or(rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReloadPolicy;
    use crate::handler::handler_fn;
    use crate::modules::{HandlerModule, HandlerResolver, ModuleCache, TableLoader};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use tokio::sync::Notify;
    use tower::ServiceExt;

    fn limited_server(max_connections: usize, release: Arc<Notify>) -> HttpServer {
        let mut table = TableLoader::new();
        table.insert("slow.toml", move || {
            let release = release.clone();
            HandlerModule::callable(handler_fn(move |_req| {
                let release = release.clone();
                async move {
                    release.notified().await;
                    Ok(().into_response())
                }
            }))
        });

        let mut config = DispatcherConfig::default();
        config.listener.max_connections = max_connections;
        let resolver = HandlerResolver::new(
            "/srv/api",
            config.api.extensions.clone(),
            ReloadPolicy::Always,
            Arc::new(table),
            Arc::new(ModuleCache::new()),
        );
        let dispatcher = Arc::new(Dispatcher::from_config(&config, resolver));
        HttpServer::new(config, dispatcher)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_in_flight_limit_is_shared_across_mount_routes() {
        let release = Arc::new(Notify::new());
        let router = limited_server(1, release.clone()).router();

        let slow = tokio::spawn(router.clone().oneshot(get("/api/slow")));
        tokio::time::sleep(Duration::from_millis(50)).await;

        // `/api` is a different route from `/api/{*path}` but must wait for
        // the same permit.
        let mut waiting = tokio::spawn(router.clone().oneshot(get("/api")));
        assert!(
            tokio::time::timeout(Duration::from_millis(200), &mut waiting)
                .await
                .is_err()
        );

        release.notify_one();
        assert_eq!(slow.await.unwrap().unwrap().status(), StatusCode::OK);
        let rejected = waiting.await.unwrap().unwrap();
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_raw_fragment() {
        assert_eq!(raw_fragment("/api", "/api/templates/1"), "templates/1");
        assert_eq!(raw_fragment("/api", "/api"), "");
        assert_eq!(raw_fragment("/api", "/api/"), "");
        assert_eq!(raw_fragment("/api", "/api/%2e%2e/etc"), "%2e%2e/etc");
        assert_eq!(raw_fragment("/api", "/api//etc/passwd"), "/etc/passwd");
    }
}
