//! Plugin backend endpoints

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Path, State},
    http::{HeaderMap, Method, Request, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use http_body_util::Full;

use crate::AppState;
use crate::backend::{Manifest, ipc};

/// GET /api/plugins - manifests of the backends that are up
pub async fn loaded_plugins(State(state): State<Arc<AppState>>) -> Json<BTreeMap<String, Manifest>> {
    Json(state.loaded.read().await.clone())
}

/// ANY /api/plugin/:plugin_id/*rest - forward to the plugin's backend socket
pub async fn proxy_to_plugin(
    State(state): State<Arc<AppState>>,
    Path((plugin_id, rest)): Path<(String, String)>,
    method: Method,
    headers: HeaderMap,
    uri: Uri,
    body: Bytes,
) -> Response {
    if !state.is_known_plugin(&plugin_id) {
        return (StatusCode::NOT_FOUND, format!("unknown plugin: {plugin_id}")).into_response();
    }
    let Some(backend) = state.config.backend(&plugin_id) else {
        return (StatusCode::NOT_FOUND, format!("no backend for {plugin_id}")).into_response();
    };

    let path = rest.trim_start_matches('/');
    let target = match uri.query() {
        Some(query) => format!("/{path}?{query}"),
        None => format!("/{path}"),
    };

    let mut request = Request::builder()
        .method(method)
        .uri(target.as_str())
        .header(header::HOST, "localhost");
    for name in [header::CONTENT_TYPE, header::ACCEPT] {
        if let Some(value) = headers.get(&name) {
            request = request.header(name, value);
        }
    }
    let request = match request.body(Full::new(body)) {
        Ok(request) => request,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    match ipc::send(&backend.socket_path, request).await {
        Ok(reply) => {
            let mut response = Response::new(Body::from(reply.body));
            *response.status_mut() = reply.status;
            if let Some(content_type) = reply.headers.get(header::CONTENT_TYPE) {
                response
                    .headers_mut()
                    .insert(header::CONTENT_TYPE, content_type.clone());
            }
            response
        }
        Err(e) => {
            tracing::warn!(plugin = %plugin_id, error = %e, "Backend request failed");
            (
                StatusCode::BAD_GATEWAY,
                format!("backend for {plugin_id} is unavailable"),
            )
                .into_response()
        }
    }
}
