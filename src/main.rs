//! API dispatcher binary.
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ dispatcher ──▶ path validator
//!                        (layers)         │
//!                                         ├──▶ resolver ──▶ module cache
//!                                         │        └─────▶ file loader ──▶ base_dir/*.toml|json
//!                                         │
//!                                         └──▶ handler entry point ──▶ Response
//!
//!     Cross-cutting: config, logging, metrics, admin API, watcher, signals
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use api_dispatcher::admin::{setup_admin_router, AdminState};
use api_dispatcher::config::{load_config, validation::validate_config, DispatcherConfig};
use api_dispatcher::handler::builtin::register_builtins;
use api_dispatcher::handler::HandlerRegistry;
use api_dispatcher::lifecycle::{build_services, clear_cache_on_hangup, shutdown_signal, Shutdown};
use api_dispatcher::observability::{init_logging, init_metrics};
use api_dispatcher::HttpServer;

#[derive(Parser)]
#[command(name = "api-dispatcher")]
#[command(about = "Serves /api/{*path} from handler files", long_about = None)]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Handler directory (overrides api.base_dir).
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Listener address (overrides listener.bind_address).
    #[arg(long)]
    bind: Option<String>,

    /// Evict cached modules when handler files change.
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => DispatcherConfig::default(),
    };
    if let Some(base_dir) = args.base_dir {
        config.api.base_dir = base_dir;
    }
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    if args.watch {
        config.api.watch = true;
    }
    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            eprintln!("config error: {error}");
        }
        return Err(format!("{} configuration error(s)", errors.len()).into());
    }

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "api-dispatcher starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let registry = HandlerRegistry::new();
    register_builtins(&registry);
    let services = build_services(&config, registry)?;
    let _hangup = clear_cache_on_hangup(services.cache.clone())?;

    let shutdown = Shutdown::new();

    if config.admin.enabled {
        let state = AdminState::new(
            &config.admin.api_key,
            services.dispatcher.clone(),
            services.registry.clone(),
        );
        let admin = setup_admin_router(state);
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        tracing::info!(address = %listener.local_addr()?, "Admin API listening");
        let mut rx = shutdown.subscribe();
        tokio::spawn(async move {
            let served = axum::serve(listener, admin)
                .with_graceful_shutdown(async move {
                    let _ = rx.recv().await;
                })
                .await;
            if let Err(e) = served {
                tracing::error!(error = %e, "Admin server failed");
            }
        });
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config, services.dispatcher.clone());
    let rx = shutdown.subscribe();
    let _signals = shutdown.trigger_on(shutdown_signal());

    server.run(listener, rx).await?;

    drop(services.watcher);
    tracing::info!("Shutdown complete");
    Ok(())
}
