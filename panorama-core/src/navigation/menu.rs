//! Composed menu model and rendering sinks
//!
//! A [`Menu`] is presentation-neutral. A [`MenuSink`] renders label,
//! destination and nesting; when a link carries
//! [`LinkActivation::Intercept`], activating it invokes the callback instead
//! of navigating the document.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// How plain menu links are activated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    /// Follow the href with a full document navigation
    Document,
    /// Hand the href to the shell router
    #[default]
    Router,
}

/// Callback receiving the activated link's `to`
pub type ActivateFn = Arc<dyn Fn(&str) + Send + Sync>;

/// What activating a link does
#[derive(Clone)]
pub enum LinkActivation {
    Navigate,
    Intercept(ActivateFn),
}

impl std::fmt::Debug for LinkActivation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Navigate => f.write_str("Navigate"),
            Self::Intercept(_) => f.write_str("Intercept(..)"),
        }
    }
}

/// Outcome of activating a link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activated {
    /// The document should load this href
    Followed(String),
    /// The callback handled the activation
    Intercepted(String),
}

/// Trailing affordance rendered after a link's label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trailing {
    None,
    Chevron,
    Busy,
}

#[derive(Debug, Clone)]
pub struct NavLink {
    pub label: String,
    /// Destination as the owner of the link understands it
    pub to: String,
    /// Host-absolute destination
    pub href: String,
    pub depth: usize,
    pub trailing: Trailing,
    pub activation: LinkActivation,
}

impl NavLink {
    pub fn activate(&self) -> Activated {
        match &self.activation {
            LinkActivation::Navigate => Activated::Followed(self.href.clone()),
            LinkActivation::Intercept(callback) => {
                callback(&self.to);
                Activated::Intercepted(self.to.clone())
            }
        }
    }

    pub fn is_intercepted(&self) -> bool {
        matches!(self.activation, LinkActivation::Intercept(_))
    }
}

#[derive(Debug, Clone)]
pub enum MenuEntry {
    Link(NavLink),
    Section {
        label: String,
        href: String,
        depth: usize,
        expanded: bool,
        children: Vec<MenuEntry>,
    },
}

impl MenuEntry {
    pub fn label(&self) -> &str {
        match self {
            Self::Link(link) => &link.label,
            Self::Section { label, .. } => label,
        }
    }

    fn collect_links<'a>(&'a self, out: &mut Vec<&'a NavLink>) {
        match self {
            Self::Link(link) => out.push(link),
            Self::Section { children, .. } => {
                for child in children {
                    child.collect_links(out);
                }
            }
        }
    }
}

/// The combined host and plugin menu
#[derive(Debug, Clone, Default)]
pub struct Menu {
    pub entries: Vec<MenuEntry>,
}

impl Menu {
    /// Top-level entry by label
    pub fn entry(&self, label: &str) -> Option<&MenuEntry> {
        self.entries.iter().find(|e| e.label() == label)
    }

    /// Every link, depth-first
    pub fn links(&self) -> Vec<&NavLink> {
        let mut out = Vec::new();
        for entry in &self.entries {
            entry.collect_links(&mut out);
        }
        out
    }

    /// First link with the given label, depth-first
    pub fn link(&self, label: &str) -> Option<&NavLink> {
        self.links().into_iter().find(|l| l.label == label)
    }

    /// Link by label within the top-level section `section`
    pub fn link_in(&self, section: &str, label: &str) -> Option<&NavLink> {
        let mut out = Vec::new();
        self.entry(section)?.collect_links(&mut out);
        out.into_iter().find(|l| l.label == label)
    }
}

/// A rendering target for menus
pub trait MenuSink {
    fn render(&mut self, menu: &Menu);
}

/// Renders a menu as indented text lines
#[derive(Debug, Default)]
pub struct TextMenuSink {
    lines: Vec<String>,
}

impl TextMenuSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_text(self) -> String {
        self.lines.join("\n")
    }

    fn render_entry(&mut self, entry: &MenuEntry) {
        match entry {
            MenuEntry::Link(link) => {
                let marker = match link.trailing {
                    Trailing::None => "",
                    Trailing::Chevron => " >",
                    Trailing::Busy => " ...",
                };
                self.lines.push(format!(
                    "{}{} ({}){marker}",
                    "  ".repeat(link.depth),
                    link.label,
                    link.href
                ));
            }
            MenuEntry::Section {
                label,
                href,
                depth,
                expanded,
                children,
            } => {
                let marker = if *expanded { "v" } else { ">" };
                self.lines
                    .push(format!("{}{label} ({href}) {marker}", "  ".repeat(*depth)));
                if *expanded {
                    for child in children {
                        self.render_entry(child);
                    }
                }
            }
        }
    }
}

impl MenuSink for TextMenuSink {
    fn render(&mut self, menu: &Menu) {
        self.lines.clear();
        for entry in &menu.entries {
            self.render_entry(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn link(label: &str, href: &str, depth: usize, trailing: Trailing) -> NavLink {
        NavLink {
            label: label.to_string(),
            to: href.to_string(),
            href: href.to_string(),
            depth,
            trailing,
            activation: LinkActivation::Navigate,
        }
    }

    #[test]
    fn plain_link_is_followed() {
        let home = link("Home", "/app/", 0, Trailing::None);
        assert_eq!(home.activate(), Activated::Followed("/app/".to_string()));
        assert!(!home.is_intercepted());
    }

    #[test]
    fn intercepted_link_invokes_callback_with_to() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let browse = NavLink {
            label: "Browse".to_string(),
            to: "/browse".to_string(),
            href: "/app/discover/browse".to_string(),
            depth: 1,
            trailing: Trailing::None,
            activation: LinkActivation::Intercept(Arc::new(move |to: &str| {
                sink.lock().unwrap().push(to.to_string());
            })),
        };

        assert_eq!(browse.activate(), Activated::Intercepted("/browse".to_string()));
        assert_eq!(*seen.lock().unwrap(), vec!["/browse".to_string()]);
    }

    #[test]
    fn text_sink_renders_nesting_and_affordances() {
        let menu = Menu {
            entries: vec![
                MenuEntry::Link(link("Home", "/app/", 0, Trailing::None)),
                MenuEntry::Section {
                    label: "Discover".to_string(),
                    href: "/app/discover".to_string(),
                    depth: 0,
                    expanded: true,
                    children: vec![MenuEntry::Link(link("Browse", "/app/discover/browse", 1, Trailing::None))],
                },
                MenuEntry::Link(link("Stats", "/app/stats", 0, Trailing::Busy)),
            ],
        };

        let mut sink = TextMenuSink::new();
        sink.render(&menu);
        assert_eq!(
            sink.lines(),
            &[
                "Home (/app/)".to_string(),
                "Discover (/app/discover) v".to_string(),
                "  Browse (/app/discover/browse)".to_string(),
                "Stats (/app/stats) ...".to_string(),
            ]
        );
    }

    #[test]
    fn menu_lookup_by_section() {
        let menu = Menu {
            entries: vec![
                MenuEntry::Link(link("Home", "/app/", 0, Trailing::None)),
                MenuEntry::Section {
                    label: "Discover".to_string(),
                    href: "/app/discover".to_string(),
                    depth: 0,
                    expanded: true,
                    children: vec![MenuEntry::Link(link("Home", "/app/discover", 1, Trailing::None))],
                },
            ],
        };

        assert_eq!(menu.link("Home").unwrap().href, "/app/");
        assert_eq!(menu.link_in("Discover", "Home").unwrap().href, "/app/discover");
        assert_eq!(menu.links().len(), 2);
    }

    #[test]
    fn link_mode_parses_lowercase() {
        let mode: LinkMode = serde_json::from_str("\"document\"").unwrap();
        assert_eq!(mode, LinkMode::Document);
        assert_eq!(LinkMode::default(), LinkMode::Router);
    }
}
