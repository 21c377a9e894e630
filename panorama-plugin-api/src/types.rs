//! Data model shared by the host shell and plugins

use serde::{Deserialize, Serialize};

/// A plugin known to the host at build time
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PluginDescriptor {
    /// Plugin identifier, also the route segment and asset directory name
    pub id: String,
    /// Human-readable label shown in the host menu
    pub label: String,
}

impl PluginDescriptor {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }

    /// Route under which this plugin is mounted, e.g. `/app/discover`
    pub fn mount_route(&self, base_path: &str) -> String {
        join_path(base_path, &self.id)
    }
}

/// Configuration handed once to a plugin's entry operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginStartupConfig {
    pub plugin_id: String,
    /// Route prefix for every link the plugin renders
    pub basename: String,
    /// Whether the plugin runs embedded in a host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested: Option<bool>,
}

impl PluginStartupConfig {
    /// Build the startup config for a plugin mounted under `base_path`
    pub fn new(plugin_id: impl Into<String>, base_path: &str) -> Self {
        let plugin_id = plugin_id.into();
        let basename = join_path(base_path, &plugin_id);
        Self {
            plugin_id,
            basename,
            nested: Some(true),
        }
    }

    pub fn is_nested(&self) -> bool {
        self.nested.unwrap_or(false)
    }

    /// Resolve a basename-relative path into an absolute host path
    pub fn resolve(&self, to: &str) -> String {
        join_path(&self.basename, to)
    }
}

/// A node in a plugin's navigation tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginNavigationItem {
    pub label: String,
    /// Destination relative to the plugin's basename
    pub to: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PluginNavigationItem>,
}

impl PluginNavigationItem {
    pub fn leaf(label: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            to: to.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<PluginNavigationItem>) -> Self {
        self.children = children;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Depth-first iterator over every leaf below (and including) this node
    pub fn leaves(&self) -> Vec<&PluginNavigationItem> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a PluginNavigationItem>) {
        if self.is_leaf() {
            out.push(self);
        } else {
            for child in &self.children {
                child.collect_leaves(out);
            }
        }
    }
}

/// A plugin's complete navigation tree, published once per mount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginNavigationInit {
    pub plugin_id: String,
    pub items: Vec<PluginNavigationItem>,
}

/// A navigation request travelling over the bus
///
/// `plugin` addresses the request: `Some` means the host asks that plugin to
/// navigate to `to` (relative to its basename), `None` means a plugin asks the
/// host to navigate to the host-absolute path `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginNavigate {
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<PluginDescriptor>,
}

impl PluginNavigate {
    /// Host-originated request addressed to `plugin`
    pub fn to_plugin(plugin: PluginDescriptor, to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            plugin: Some(plugin),
        }
    }

    /// Plugin-originated request addressed to the host
    pub fn to_host(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            plugin: None,
        }
    }

    /// True when this request targets the plugin with the given id
    pub fn is_addressed_to(&self, plugin_id: &str) -> bool {
        self.plugin.as_ref().is_some_and(|p| p.id == plugin_id)
    }
}

/// Join two path fragments with exactly one `/` between them
pub fn join_path(base: &str, rest: &str) -> String {
    let base = base.trim_end_matches('/');
    let rest = rest.trim_start_matches('/');
    match (base.is_empty(), rest.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{rest}"),
        (false, true) => base.to_string(),
        (false, false) => format!("{base}/{rest}"),
    }
}
