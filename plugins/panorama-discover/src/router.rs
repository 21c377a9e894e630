//! Internal routes of the discover plugin
//!
//! Paths are relative to the plugin's basename; every rendered link is
//! resolved against it so deep links composed by the host stay valid.

use panorama_plugin_api::{PluginNavigationItem, PluginStartupConfig, ViewNode};

/// Id of the element holding the current page title
pub const TITLE_ID: &str = "page-title";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoverRoute {
    Home,
    Browse,
    Test,
    NotFound(String),
}

impl DiscoverRoute {
    pub fn resolve(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        match path.trim_matches('/') {
            "" => Self::Home,
            "browse" => Self::Browse,
            "test" => Self::Test,
            other => Self::NotFound(format!("/{other}")),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Home => "/",
            Self::Browse => "/browse",
            Self::Test => "/test",
            Self::NotFound(path) => path,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Home => "Discover",
            Self::Browse => "Browse",
            Self::Test => "Test",
            Self::NotFound(_) => "Not found",
        }
    }

    /// Render this route's page
    pub fn render(&self, config: &PluginStartupConfig) -> Vec<ViewNode> {
        let nav = navigation()
            .iter()
            .fold(ViewNode::element("nav"), |nav, item| {
                nav.child(
                    ViewNode::element("a")
                        .with_href(config.resolve(&item.to))
                        .with_text(item.label.clone()),
                )
            });

        let body = match self {
            Self::Home => "Find something new.".to_string(),
            Self::Browse => "Browse the catalogue.".to_string(),
            Self::Test => "Test page.".to_string(),
            Self::NotFound(path) => format!("No page at {}", config.resolve(path)),
        };

        vec![
            nav,
            ViewNode::element("main")
                .with_id("view")
                .child(ViewNode::element("h1").with_id(TITLE_ID).with_text(self.title()))
                .child(ViewNode::element("p").with_text(body)),
        ]
    }
}

/// Navigation tree registered with the host
pub fn navigation() -> Vec<PluginNavigationItem> {
    vec![
        PluginNavigationItem::leaf("Home", "/"),
        PluginNavigationItem::leaf("Browse", "/browse"),
    ]
}
