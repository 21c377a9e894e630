//! Static host routing
//!
//! The host owns two routes under its base path: the landing page and
//! `:pluginId/*`, which activates a plugin slot.

use std::collections::HashMap;

/// Where a host path leads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    /// `rest` is the part after the plugin id, always starting with `/`
    Plugin { plugin_id: String, rest: String },
    NotFound,
}

/// Simple path matcher supporting `:param` segments and a trailing `*`
#[derive(Debug, Clone)]
struct PathMatcher {
    segments: Vec<PathSegment>,
}

#[derive(Debug, Clone)]
enum PathSegment {
    Literal(String),
    Param(String),
    Rest,
}

impl PathMatcher {
    fn new(path: &str) -> Self {
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s == "*" {
                    PathSegment::Rest
                } else if let Some(name) = s.strip_prefix(':') {
                    PathSegment::Param(name.to_string())
                } else {
                    PathSegment::Literal(s.to_string())
                }
            })
            .collect();

        Self { segments }
    }

    /// Match a path, returning captured params; the wildcard is stored as `*`
    fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let path_parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = HashMap::new();

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Rest => {
                    let rest = path_parts.get(i..).unwrap_or_default().join("/");
                    params.insert("*".to_string(), format!("/{rest}"));
                    return Some(params);
                }
                PathSegment::Literal(expected) => {
                    if path_parts.get(i) != Some(&expected.as_str()) {
                        return None;
                    }
                }
                PathSegment::Param(name) => {
                    let part = path_parts.get(i)?;
                    params.insert(name.clone(), (*part).to_string());
                }
            }
        }

        (path_parts.len() == self.segments.len()).then_some(params)
    }
}

/// Resolves host paths to routes
#[derive(Debug, Clone)]
pub struct Router {
    base_path: String,
    home: PathMatcher,
    plugin: PathMatcher,
}

impl Router {
    pub fn new(base_path: &str) -> Self {
        let base = base_path.trim_end_matches('/');
        Self {
            base_path: base_path.to_string(),
            home: PathMatcher::new(base),
            plugin: PathMatcher::new(&format!("{base}/:pluginId/*")),
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn resolve(&self, path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or_default();

        if self.home.match_path(path).is_some() {
            return Route::Home;
        }

        match self.plugin.match_path(path) {
            Some(mut params) => match params.remove("pluginId") {
                Some(plugin_id) => Route::Plugin {
                    plugin_id,
                    rest: params.remove("*").unwrap_or_else(|| "/".to_string()),
                },
                None => Route::NotFound,
            },
            None => Route::NotFound,
        }
    }
}
