//! Mount containers and the view nodes plugins render into them

use std::sync::{Arc, Mutex, MutexGuard};

/// A rendered element inside a mount container
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewNode {
    pub tag: String,
    pub id: Option<String>,
    pub text: String,
    pub href: Option<String>,
    pub children: Vec<ViewNode>,
}

impl ViewNode {
    pub fn element(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    pub fn child(mut self, child: ViewNode) -> Self {
        self.children.push(child);
        self
    }

    /// Match a simple selector: `#id` or a bare tag name
    pub fn matches(&self, selector: &str) -> bool {
        match selector.strip_prefix('#') {
            Some(id) => self.id.as_deref() == Some(id),
            None => self.tag == selector,
        }
    }

    /// First node in document order matching `selector`
    pub fn find(&self, selector: &str) -> Option<&ViewNode> {
        if self.matches(selector) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(selector))
    }

    /// Concatenated text of this node and its descendants
    pub fn text_content(&self) -> String {
        let mut out = self.text.clone();
        for child in &self.children {
            out.push_str(&child.text_content());
        }
        out
    }
}

#[derive(Debug, Default)]
struct ContainerInner {
    nodes: Vec<ViewNode>,
    owner: Option<String>,
}

/// The element a plugin mounts into
///
/// Clones share the same subtree. Until [`MountContainer::hand_over`] is
/// called the loader is the only writer; afterwards the named plugin owns it.
#[derive(Debug, Clone)]
pub struct MountContainer {
    id: String,
    inner: Arc<Mutex<ContainerInner>>,
}

impl MountContainer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            inner: Arc::new(Mutex::new(ContainerInner::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ContainerInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Replace the container's children
    pub fn render(&self, nodes: Vec<ViewNode>) {
        self.lock().nodes = nodes;
    }

    pub fn clear(&self) {
        self.lock().nodes.clear();
    }

    pub fn nodes(&self) -> Vec<ViewNode> {
        self.lock().nodes.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().nodes.is_empty()
    }

    pub fn query_selector(&self, selector: &str) -> Option<ViewNode> {
        self.lock()
            .nodes
            .iter()
            .find_map(|n| n.find(selector))
            .cloned()
    }

    pub fn text_content(&self) -> String {
        self.lock().nodes.iter().map(ViewNode::text_content).collect()
    }

    /// Transfer ownership of the subtree to a plugin
    pub fn hand_over(&self, plugin_id: &str) {
        self.lock().owner = Some(plugin_id.to_string());
    }

    pub fn owner(&self) -> Option<String> {
        self.lock().owner.clone()
    }

    /// True when both handles point at the same element
    pub fn same_element(&self, other: &MountContainer) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
