//! What a running backend reports about itself

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Body of a backend's `GET /manifest`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub exported_datasources: Vec<Datasource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datasource {
    #[serde(alias = "id")]
    pub kind: String,
}

/// Manifests of the backends currently running, keyed by configured plugin id
pub type LoadedPlugins = Arc<RwLock<BTreeMap<String, Manifest>>>;
