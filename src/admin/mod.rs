//! Authenticated admin API for the module cache and handler registry.

pub mod auth;
pub mod handlers;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::dispatch::Dispatcher;
use crate::handler::HandlerRegistry;

#[derive(Clone)]
pub struct AdminState {
    pub api_key: Arc<str>,
    pub dispatcher: Arc<Dispatcher>,
    pub registry: HandlerRegistry,
    pub started: Instant,
}

impl AdminState {
    pub fn new(api_key: &str, dispatcher: Arc<Dispatcher>, registry: HandlerRegistry) -> Self {
        Self {
            api_key: Arc::from(api_key),
            dispatcher,
            registry,
            started: Instant::now(),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/modules", get(get_modules).delete(clear_modules))
        .route("/admin/modules/evict", post(evict_module))
        .route("/admin/handlers", get(get_handlers))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ))
        .with_state(state)
}
