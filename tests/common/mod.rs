//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use api_dispatcher::admin::{setup_admin_router, AdminState};
use api_dispatcher::config::DispatcherConfig;
use api_dispatcher::handler::builtin::register_builtins;
use api_dispatcher::handler::{handler_fn, HandlerError, HandlerRegistry};
use api_dispatcher::lifecycle::{build_services, Shutdown};
use api_dispatcher::modules::ModuleCache;
use api_dispatcher::HttpServer;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const ADMIN_KEY: &str = "test-admin-key";

/// A running dispatcher over a temporary handler directory.
pub struct TestServer {
    pub addr: SocketAddr,
    pub admin_addr: SocketAddr,
    pub dir: TempDir,
    pub cache: Arc<ModuleCache>,
    pub shutdown: Shutdown,
    _watcher: Option<notify::RecommendedWatcher>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn admin_url(&self, path: &str) -> String {
        format!("http://{}{}", self.admin_addr, path)
    }

    pub fn base(&self) -> &Path {
        self.dir.path()
    }

    /// Write a handler file relative to the base directory.
    pub fn write_handler(&self, relative: &str, contents: &str) {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Registry with the built-ins plus handlers that fail on purpose.
pub fn test_registry() -> HandlerRegistry {
    let registry = HandlerRegistry::new();
    register_builtins(&registry);
    registry.register(
        "fails",
        handler_fn(|_req| async { Err(HandlerError::msg("database unavailable at /var/db")) }),
    );
    registry.register(
        "panics",
        handler_fn(|_req| async {
            if true {
                panic!("secret panic detail");
            }
            Err(HandlerError::msg("unreachable"))
        }),
    );
    registry
}

/// Start the API and admin servers on ephemeral ports.
pub async fn start_server<F>(configure: F) -> TestServer
where
    F: FnOnce(&mut DispatcherConfig),
{
    let dir = tempfile::tempdir().unwrap();
    let mut config = DispatcherConfig::default();
    config.api.base_dir = dir.path().to_path_buf();
    config.admin.api_key = ADMIN_KEY.to_string();
    configure(&mut config);

    let services = build_services(&config, test_registry()).unwrap();
    let shutdown = Shutdown::new();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config.clone(), services.dispatcher.clone());
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    let admin_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let admin_addr = admin_listener.local_addr().unwrap();
    let admin = setup_admin_router(AdminState::new(
        &config.admin.api_key,
        services.dispatcher.clone(),
        services.registry.clone(),
    ));
    let mut admin_rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = axum::serve(admin_listener, admin)
            .with_graceful_shutdown(async move {
                let _ = admin_rx.recv().await;
            })
            .await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        addr,
        admin_addr,
        dir,
        cache: services.cache,
        shutdown,
        _watcher: services.watcher,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Send a request line verbatim. HTTP clients normalize `..` segments, so
/// traversal attempts have to go over a raw socket.
pub async fn raw_get(addr: SocketAddr, target: &str) -> (u16, String) {
    let mut socket = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {target} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    socket.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    socket.read_to_end(&mut response).await.unwrap();
    let response = String::from_utf8_lossy(&response).to_string();

    let status = response
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap_or(0);
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_default();
    (status, body)
}
