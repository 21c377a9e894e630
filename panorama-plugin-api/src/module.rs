//! Executable plugin modules and their named exports

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::PluginEntry;

/// Export names accepted as a module's entry operation, in lookup order
pub const ENTRY_EXPORTS: [&str; 2] = ["start", "createRouter"];

/// An imported plugin module
#[derive(Clone)]
pub struct PluginModule {
    specifier: String,
    exports: BTreeMap<String, Arc<dyn PluginEntry>>,
}

impl PluginModule {
    pub fn new(specifier: impl Into<String>) -> Self {
        Self {
            specifier: specifier.into(),
            exports: BTreeMap::new(),
        }
    }

    pub fn with_export(mut self, name: impl Into<String>, entry: Arc<dyn PluginEntry>) -> Self {
        self.exports.insert(name.into(), entry);
        self
    }

    pub fn specifier(&self) -> &str {
        &self.specifier
    }

    pub fn export(&self, name: &str) -> Option<Arc<dyn PluginEntry>> {
        self.exports.get(name).cloned()
    }

    pub fn export_names(&self) -> impl Iterator<Item = &str> {
        self.exports.keys().map(String::as_str)
    }

    /// The entry operation, looked up by [`ENTRY_EXPORTS`] order
    pub fn entry(&self) -> Option<(&'static str, Arc<dyn PluginEntry>)> {
        ENTRY_EXPORTS
            .into_iter()
            .find_map(|name| self.export(name).map(|entry| (name, entry)))
    }
}

impl fmt::Debug for PluginModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginModule")
            .field("specifier", &self.specifier)
            .field("exports", &self.exports.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MountContainer, PluginError, PluginHandle, PluginStartupConfig, SignalPort};

    fn failing_entry() -> Arc<dyn PluginEntry> {
        Arc::new(
            |_: MountContainer,
             _: PluginStartupConfig,
             _: Arc<dyn SignalPort>|
             -> Result<Box<dyn PluginHandle>, PluginError> {
                Err(PluginError::custom("not in this test"))
            },
        )
    }

    #[test]
    fn entry_prefers_start() {
        let module = PluginModule::new("/plugins/x/x.js")
            .with_export("createRouter", failing_entry())
            .with_export("start", failing_entry());
        let (name, _) = module.entry().unwrap();
        assert_eq!(name, "start");
    }

    #[test]
    fn entry_falls_back_to_create_router() {
        let module = PluginModule::new("/plugins/x/x.js").with_export("createRouter", failing_entry());
        let (name, _) = module.entry().unwrap();
        assert_eq!(name, "createRouter");
    }

    #[test]
    fn entry_missing_when_no_known_export() {
        let module = PluginModule::new("/plugins/x/x.js").with_export("default", failing_entry());
        assert!(module.entry().is_none());
        assert_eq!(module.export_names().collect::<Vec<_>>(), vec!["default"]);
    }
}
