use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::config::ReloadPolicy;
use crate::dispatch::error::INVALID_PATH;
use crate::http::response::json_error;
use crate::modules::{CacheEntryInfo, CacheStats};
use crate::routing::PathValidator;

#[derive(Serialize)]
pub struct SystemStatus {
    pub name: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub reload: ReloadPolicy,
    pub base_dir: String,
}

#[derive(Serialize)]
pub struct ModulesReport {
    pub stats: CacheStats,
    pub entries: Vec<CacheEntryInfo>,
}

#[derive(Serialize)]
pub struct Evicted {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    pub evicted: usize,
}

#[derive(Debug, Deserialize)]
pub struct EvictRequest {
    pub path: String,
}

#[derive(Serialize)]
pub struct HandlerList {
    pub handlers: Vec<String>,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let resolver = state.dispatcher.resolver();
    Json(SystemStatus {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started.elapsed().as_secs(),
        reload: resolver.policy(),
        base_dir: resolver.base_dir().display().to_string(),
    })
}

pub async fn get_modules(State(state): State<AdminState>) -> Json<ModulesReport> {
    let cache = state.dispatcher.resolver().cache();
    Json(ModulesReport {
        stats: cache.stats(),
        entries: cache.entries(),
    })
}

pub async fn clear_modules(State(state): State<AdminState>) -> Json<Evicted> {
    let evicted = state.dispatcher.resolver().cache().clear();
    Json(Evicted {
        route: None,
        evicted,
    })
}

pub async fn evict_module(
    State(state): State<AdminState>,
    Json(body): Json<EvictRequest>,
) -> Response {
    let route = match state.dispatcher.validator().validate(&body.path) {
        Ok(route) => route,
        Err(reason) => {
            tracing::warn!(raw_path = ?body.path, reason = %reason, "Rejected admin eviction path");
            return json_error(StatusCode::BAD_REQUEST, INVALID_PATH);
        }
    };

    let evicted = state.dispatcher.resolver().evict(&route);
    tracing::info!(route = %route, evicted, "Module evicted via admin API");
    Json(Evicted {
        route: Some(route.to_string()),
        evicted,
    })
    .into_response()
}

pub async fn get_handlers(State(state): State<AdminState>) -> Json<HandlerList> {
    Json(HandlerList {
        handlers: state.registry.names(),
    })
}
