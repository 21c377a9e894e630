//! Plugin backend endpoints against an in-process unix-socket backend
#![cfg(unix)]

use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use panorama_core::{BackendConfig, PanoramaConfig};
use panorama_plugin_api::PluginDescriptor;
use panorama_server::backend::Manifest;
use panorama_server::{AppState, create_router};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::UnixListener;

struct Fixture {
    server: TestServer,
    state: Arc<AppState>,
    _dir: TempDir,
}

/// Echoes what it received as JSON; `/missing` answers 404
async fn echo(req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);
    let content_type = req
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => Bytes::new(),
    };

    if path == "/missing" {
        let mut response = Response::new(Full::new(Bytes::from_static(b"no such thing")));
        *response.status_mut() = hyper::StatusCode::NOT_FOUND;
        return Ok(response);
    }

    let payload = json!({
        "method": method,
        "path": path,
        "query": query,
        "contentType": content_type,
        "body": String::from_utf8_lossy(&body),
    });
    let mut response = Response::new(Full::new(Bytes::from(payload.to_string())));
    response.headers_mut().insert(
        "content-type",
        hyper::header::HeaderValue::from_static("application/json"),
    );
    Ok(response)
}

fn spawn_backend(socket: &Path) {
    let listener = UnixListener::bind(socket).unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(
                http1::Builder::new().serve_connection(TokioIo::new(stream), service_fn(echo)),
            );
        }
    });
}

/// `discover` has a running backend, `stats` has one configured but down,
/// `plain` has none
fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let socket = dir.path().join("discover.sock");
    spawn_backend(&socket);

    let mut config = PanoramaConfig::default();
    config.plugins.push(PluginDescriptor::new("stats", "Stats"));
    config.plugins.push(PluginDescriptor::new("plain", "Plain"));
    config.backends.insert(
        "discover".to_string(),
        BackendConfig {
            binary_path: dir.path().join("discover"),
            socket_path: socket,
        },
    );
    config.backends.insert(
        "stats".to_string(),
        BackendConfig {
            binary_path: dir.path().join("stats"),
            socket_path: dir.path().join("stats.sock"),
        },
    );

    let state = Arc::new(AppState::new(config));
    Fixture {
        server: TestServer::new(create_router(state.clone())).unwrap(),
        state,
        _dir: dir,
    }
}

#[tokio::test]
async fn plugins_lists_loaded_manifests() {
    let fx = fixture();
    let empty: Value = fx.server.get("/api/plugins").await.json();
    assert_eq!(empty, json!({}));

    fx.state.loaded.write().await.insert(
        "discover".to_string(),
        Manifest {
            id: "discover".to_string(),
            version: Some("0.0.1".to_string()),
            exported_datasources: Vec::new(),
        },
    );

    let response = fx.server.get("/api/plugins").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["discover"]["id"], "discover");
    assert_eq!(body["discover"]["version"], "0.0.1");
}

#[tokio::test]
async fn proxy_forwards_path_and_query() {
    let fx = fixture();
    let response = fx
        .server
        .get("/api/plugin/discover/search/items")
        .add_query_param("q", "rust")
        .await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "application/json");

    let echoed: Value = response.json();
    assert_eq!(echoed["method"], "GET");
    assert_eq!(echoed["path"], "/search/items");
    assert_eq!(echoed["query"], "q=rust");
}

#[tokio::test]
async fn proxy_forwards_method_and_body() {
    let fx = fixture();
    let response = fx
        .server
        .post("/api/plugin/discover/items")
        .json(&json!({ "name": "panorama" }))
        .await;
    response.assert_status_ok();

    let echoed: Value = response.json();
    assert_eq!(echoed["method"], "POST");
    assert_eq!(echoed["contentType"], "application/json");
    assert_eq!(echoed["body"], r#"{"name":"panorama"}"#);
}

#[tokio::test]
async fn proxy_passes_backend_status_through() {
    let fx = fixture();
    let response = fx
        .server
        .get("/api/plugin/discover/missing")
        .expect_failure()
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    response.assert_text("no such thing");
}

#[tokio::test]
async fn proxy_rejects_unknown_plugin_and_plugin_without_backend() {
    let fx = fixture();
    for path in ["/api/plugin/nobody/info", "/api/plugin/plain/info"] {
        fx.server
            .get(path)
            .expect_failure()
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn proxy_reports_down_backend_as_bad_gateway() {
    let fx = fixture();
    fx.server
        .get("/api/plugin/stats/info")
        .expect_failure()
        .await
        .assert_status(StatusCode::BAD_GATEWAY);
}
