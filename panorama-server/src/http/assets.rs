//! Plugin assets and the host's single-page shell
//!
//! Plugin bundles are served from `assets_dir/{id}/{file}`. Every other GET
//! tries `web_dir`, then falls back to `index.html` for paths the host
//! router owns so client-side routing can take over.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path as UrlPath, State},
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};

use crate::AppState;

/// Resolve `relative` under `root`, refusing anything but plain components
fn confine(root: &Path, relative: &str) -> Option<PathBuf> {
    let relative = Path::new(relative.trim_start_matches('/'));
    let plain = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    (plain && !relative.as_os_str().is_empty()).then(|| root.join(relative))
}

async fn serve_file(file: &Path) -> Option<Response<Body>> {
    let body = tokio::fs::read(file).await.ok()?;
    let mime = mime_guess::from_path(file).first_or_octet_stream();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime.as_ref())
        .body(Body::from(body))
        .ok()
}

fn not_found(message: &'static str) -> Response<Body> {
    (StatusCode::NOT_FOUND, message).into_response()
}

/// GET /plugins/:id/:file - a plugin's style or module
pub async fn plugin_asset(
    State(state): State<Arc<AppState>>,
    UrlPath((id, file)): UrlPath<(String, String)>,
) -> Response<Body> {
    if !state.is_known_plugin(&id) {
        tracing::debug!(plugin = %id, "Asset requested for unknown plugin");
        return not_found("Unknown plugin");
    }

    let Some(path) = confine(&state.config.shell.assets_dir, &format!("{id}/{file}")) else {
        tracing::warn!(plugin = %id, file = %file, "Rejected asset path");
        return (StatusCode::BAD_REQUEST, "Invalid asset path").into_response();
    };

    match serve_file(&path).await {
        Some(response) => response,
        None => {
            tracing::debug!(plugin = %id, path = %path.display(), "Plugin asset not found");
            not_found("Asset not found")
        }
    }
}

/// Fallback for everything else: web assets, then the SPA shell
pub async fn web_fallback(State(state): State<Arc<AppState>>, uri: Uri) -> Response<Body> {
    let web_dir = &state.config.shell.web_dir;
    let path = uri.path();

    if let Some(file) = confine(web_dir, path)
        && let Some(response) = serve_file(&file).await
    {
        return response;
    }

    if !owned_by_host(&state.config.shell.base_path, path) {
        return not_found("Not found");
    }

    match serve_file(&web_dir.join("index.html")).await {
        Some(response) => response,
        None => not_found("Web UI not found"),
    }
}

/// True for `/` and any path at or below the base path
fn owned_by_host(base_path: &str, path: &str) -> bool {
    let base = base_path.trim_end_matches('/');
    path == "/" || base.is_empty() || path == base || path.starts_with(&format!("{base}/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confine_rejects_traversal() {
        let root = Path::new("/srv/plugins");
        assert_eq!(
            confine(root, "discover/style.css"),
            Some(PathBuf::from("/srv/plugins/discover/style.css"))
        );
        assert!(confine(root, "../etc/passwd").is_none());
        assert!(confine(root, "discover/../../etc").is_none());
        assert!(confine(root, "").is_none());
        assert!(confine(root, "/").is_none());
    }

    #[test]
    fn test_owned_by_host() {
        assert!(owned_by_host("/app", "/"));
        assert!(owned_by_host("/app", "/app"));
        assert!(owned_by_host("/app", "/app/discover/browse"));
        assert!(!owned_by_host("/app", "/application"));
        assert!(!owned_by_host("/app", "/other"));
        assert!(owned_by_host("/", "/anything"));
    }
}
