//! HTTP server module

mod api;
mod assets;
mod plugins;

use std::sync::Arc;

use axum::{
    Router,
    routing::{any, get},
};

use crate::AppState;

pub use api::{HealthResponse, HostConfigResponse};

/// Create the HTTP router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(api::health))
        .route("/api/config", get(api::host_config))
        .route("/api/plugins", get(plugins::loaded_plugins))
        .route("/api/plugin/:plugin_id/*rest", any(plugins::proxy_to_plugin))
        .route("/plugins/:id/:file", get(assets::plugin_asset))
        .fallback(assets::web_fallback)
        .with_state(state)
}
