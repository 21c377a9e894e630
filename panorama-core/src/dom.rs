//! Host document and isolated shadow boundaries
//!
//! The host document only knows its own elements and stylesheets. A
//! [`ShadowRoot`] attached to a host element is opaque: host selectors never
//! reach into it, host stylesheets never apply inside it and its own
//! stylesheets never leak out.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use panorama_plugin_api::{MountContainer, ViewNode};

use crate::error::DomError;

/// A stylesheet attached either to the host document or to a boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stylesheet {
    pub href: String,
    pub rules: String,
}

impl Stylesheet {
    pub fn new(href: impl Into<String>, rules: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            rules: rules.into(),
        }
    }
}

#[derive(Debug)]
struct HostElement {
    tag: String,
    shadow: Option<ShadowRoot>,
}

#[derive(Debug, Default)]
struct DocumentInner {
    elements: BTreeMap<String, HostElement>,
    stylesheets: Vec<Stylesheet>,
}

/// The host page
#[derive(Debug, Clone, Default)]
pub struct Document {
    inner: Arc<Mutex<DocumentInner>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, DocumentInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create a host element unless one with this id exists; true if created
    pub fn ensure_element(&self, id: &str, tag: &str) -> bool {
        let mut inner = self.lock();
        if inner.elements.contains_key(id) {
            return false;
        }
        inner.elements.insert(
            id.to_string(),
            HostElement {
                tag: tag.to_string(),
                shadow: None,
            },
        );
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().elements.contains_key(id)
    }

    /// Find a host element by `#id` or tag name; never looks inside boundaries
    pub fn query_selector(&self, selector: &str) -> Option<String> {
        let inner = self.lock();
        match selector.strip_prefix('#') {
            Some(id) => inner.elements.contains_key(id).then(|| id.to_string()),
            None => inner
                .elements
                .iter()
                .find(|(_, el)| el.tag == selector)
                .map(|(id, _)| id.clone()),
        }
    }

    pub fn add_stylesheet(&self, sheet: Stylesheet) {
        self.lock().stylesheets.push(sheet);
    }

    /// Stylesheets of the host document itself
    pub fn stylesheets(&self) -> Vec<Stylesheet> {
        self.lock().stylesheets.clone()
    }

    /// Attach an isolation boundary to a host element
    ///
    /// An element carries at most one boundary for its lifetime.
    pub fn attach_shadow(&self, id: &str) -> Result<ShadowRoot, DomError> {
        let mut inner = self.lock();
        let element = inner
            .elements
            .get_mut(id)
            .ok_or_else(|| DomError::ElementNotFound(id.to_string()))?;

        if element.shadow.is_some() {
            return Err(DomError::ShadowAlreadyAttached(id.to_string()));
        }

        let shadow = ShadowRoot::new(id);
        element.shadow = Some(shadow.clone());
        Ok(shadow)
    }

    pub fn shadow_root(&self, id: &str) -> Option<ShadowRoot> {
        self.lock().elements.get(id).and_then(|el| el.shadow.clone())
    }
}

#[derive(Debug, Default)]
struct ShadowInner {
    stylesheets: Vec<Stylesheet>,
    containers: Vec<MountContainer>,
}

/// An opaque rendering boundary attached to a host element
#[derive(Debug, Clone)]
pub struct ShadowRoot {
    host_id: String,
    inner: Arc<Mutex<ShadowInner>>,
}

impl ShadowRoot {
    fn new(host_id: &str) -> Self {
        Self {
            host_id: host_id.to_string(),
            inner: Arc::new(Mutex::new(ShadowInner::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ShadowInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    pub fn append_container(&self, container: MountContainer) {
        self.lock().containers.push(container);
    }

    pub fn container(&self, id: &str) -> Option<MountContainer> {
        self.lock().containers.iter().find(|c| c.id() == id).cloned()
    }

    pub fn adopt_stylesheet(&self, sheet: Stylesheet) {
        self.lock().stylesheets.push(sheet);
    }

    /// Stylesheets that apply to nodes inside this boundary
    pub fn effective_stylesheets(&self) -> Vec<Stylesheet> {
        self.lock().stylesheets.clone()
    }

    /// Search rendered nodes inside the boundary
    pub fn query_selector(&self, selector: &str) -> Option<ViewNode> {
        self.lock()
            .containers
            .iter()
            .find_map(|c| c.query_selector(selector))
    }
}
