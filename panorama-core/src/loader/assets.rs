//! Asset sources for plugin stylesheets

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use super::AssetPaths;
use crate::error::LoaderError;

/// A fetched asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub path: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Asset {
    pub fn new(path: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content_type: None,
            body: body.into(),
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Where plugin assets come from
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Fetch an asset by its conventional path, e.g. `/plugins/x/style.css`
    async fn fetch(&self, path: &str) -> Result<Asset, LoaderError>;
}

/// Serves `/plugins/...` paths from a directory on disk
#[derive(Debug, Clone)]
pub struct DirAssetSource {
    root: PathBuf,
}

impl DirAssetSource {
    /// `root` is the directory holding one sub-directory per plugin
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, LoaderError> {
        let relative = path
            .strip_prefix(AssetPaths::PREFIX)
            .unwrap_or(path)
            .trim_start_matches('/');
        let relative = Path::new(relative);

        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe || relative.as_os_str().is_empty() {
            return Err(LoaderError::asset(path, "path escapes the asset root"));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl AssetSource for DirAssetSource {
    async fn fetch(&self, path: &str) -> Result<Asset, LoaderError> {
        let file = self.resolve(path)?;
        let body = tokio::fs::read(&file)
            .await
            .map_err(|e| LoaderError::asset(path, e))?;
        tracing::debug!(path, file = %file.display(), bytes = body.len(), "Asset read from disk");
        Ok(Asset::new(path, body))
    }
}

/// Fetches assets over HTTP relative to a base URL
#[derive(Debug, Clone)]
pub struct HttpAssetSource {
    client: reqwest::Client,
    base: reqwest::Url,
}

impl HttpAssetSource {
    pub fn new(base: &str) -> Result<Self, LoaderError> {
        let base = reqwest::Url::parse(base).map_err(|e| LoaderError::asset(base, e))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base,
        })
    }
}

#[async_trait]
impl AssetSource for HttpAssetSource {
    async fn fetch(&self, path: &str) -> Result<Asset, LoaderError> {
        let url = self.base.join(path).map_err(|e| LoaderError::asset(path, e))?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| LoaderError::asset(path, e))?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| LoaderError::asset(path, e))?;

        Ok(Asset {
            path: path.to_string(),
            content_type,
            body: body.to_vec(),
        })
    }
}

/// In-process assets; records every fetch
#[derive(Debug, Default)]
pub struct MemoryAssetSource {
    assets: Mutex<HashMap<String, Asset>>,
    fetched: Mutex<Vec<String>>,
}

impl MemoryAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<String>, body: impl Into<Vec<u8>>) {
        let path = path.into();
        let asset = Asset::new(path.clone(), body);
        self.assets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path, asset);
    }

    pub fn with_asset(self, path: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.insert(path, body);
        self
    }

    /// Every path requested so far, in order
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl AssetSource for MemoryAssetSource {
    async fn fetch(&self, path: &str) -> Result<Asset, LoaderError> {
        self.fetched
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(path.to_string());
        self.assets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(path)
            .cloned()
            .ok_or_else(|| LoaderError::asset(path, "404 Not Found"))
    }
}
