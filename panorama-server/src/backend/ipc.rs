//! HTTP/1 over a backend's unix socket

use std::path::Path;

use bytes::Bytes;
use http_body_util::Full;
use hyper::{HeaderMap, Request, StatusCode, header};

use super::{BackendError, Manifest};

/// A buffered backend response
#[derive(Debug)]
pub struct SocketResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Send one request on a fresh connection and buffer the response
#[cfg(unix)]
pub async fn send(
    socket: &Path,
    request: Request<Full<Bytes>>,
) -> Result<SocketResponse, BackendError> {
    use http_body_util::BodyExt;
    use hyper::client::conn::http1;
    use hyper_util::rt::TokioIo;
    use tokio::net::UnixStream;

    let stream = UnixStream::connect(socket)
        .await
        .map_err(|source| BackendError::Connect {
            socket: socket.display().to_string(),
            source,
        })?;
    let (mut sender, connection) = http1::handshake(TokioIo::new(stream)).await?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::debug!(error = %e, "Backend connection ended with error");
        }
    });

    tracing::trace!(method = %request.method(), uri = %request.uri(), "Forwarding to backend");
    let response = sender.send_request(request).await?;
    let (parts, body) = response.into_parts();
    let body = body.collect().await?.to_bytes();

    Ok(SocketResponse {
        status: parts.status,
        headers: parts.headers,
        body,
    })
}

#[cfg(not(unix))]
pub async fn send(
    _socket: &Path,
    _request: Request<Full<Bytes>>,
) -> Result<SocketResponse, BackendError> {
    Err(BackendError::Unsupported)
}

/// `GET /manifest` from the backend on `socket`
pub async fn fetch_manifest(socket: &Path) -> Result<Manifest, BackendError> {
    let request = Request::get("/manifest")
        .header(header::HOST, "localhost")
        .body(Full::new(Bytes::new()))?;

    let response = send(socket, request).await?;
    if !response.status.is_success() {
        return Err(BackendError::Status(response.status));
    }
    Ok(serde_json::from_slice(&response.body)?)
}
