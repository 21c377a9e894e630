//! REST API handlers

use std::sync::Arc;

use axum::{Json, extract::State};
use panorama_core::{HostLink, LinkMode};
use panorama_plugin_api::PluginDescriptor;
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Status of the server
    pub status: String,
    /// Server version
    pub version: String,
    /// Seconds since server started
    pub uptime_seconds: i64,
}

/// Health check endpoint
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// What the host shell needs to boot: routes, menu and plugin list
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostConfigResponse {
    pub base_path: String,
    pub link_mode: LinkMode,
    pub load_timeout_ms: u64,
    pub ready_timeout_ms: u64,
    pub host_links: Vec<HostLink>,
    pub plugins: Vec<PluginDescriptor>,
}

/// GET /api/config - host shell configuration
pub async fn host_config(State(state): State<Arc<AppState>>) -> Json<HostConfigResponse> {
    let config = &state.config;
    Json(HostConfigResponse {
        base_path: config.shell.base_path.clone(),
        link_mode: config.shell.link_mode,
        load_timeout_ms: config.shell.load_timeout_ms,
        ready_timeout_ms: config.shell.ready_timeout_ms,
        host_links: config.host_links.clone(),
        plugins: config.plugins.clone(),
    })
}
