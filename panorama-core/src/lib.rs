//! panorama-core: Core library for the panorama micro-frontend host
//!
//! This crate provides the plugin lifecycle and coordination layer:
//!
//! - **Event bus** - [`EventBus`] for synchronous, typed host/plugin signals
//! - **Isolated mounts** - [`dom::Document`] and [`dom::ShadowRoot`] boundaries
//! - **Plugin loader** - [`PluginLoader`] fetches, imports and starts a plugin
//! - **Navigation** - [`NavigationComposer`] merges host and plugin menus
//! - **Shell** - [`Shell`] routes host paths and activates plugin slots
//! - **Context** - [`HostContext`] wires everything together once per process
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use panorama_core::{HostContext, PanoramaConfig, TextMenuSink};
//! use panorama_core::loader::{DirAssetSource, StaticModuleRegistry};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PanoramaConfig::default();
//!     let assets = Arc::new(DirAssetSource::new(&config.shell.assets_dir));
//!     let modules = Arc::new(StaticModuleRegistry::new());
//!
//!     let host = HostContext::new(config, assets, modules);
//!     host.navigate("/app/discover").await?;
//!
//!     let mut sink = TextMenuSink::new();
//!     host.render(&mut sink);
//!     println!("{}", sink.into_text());
//!
//!     host.dispose();
//!     Ok(())
//! }
//! ```
//!
//! # Boot sequence
//!
//! ```text
//! Shell::navigate("/app/discover")
//!   └─ PluginLoader::load
//!        ├─ publish plugin:loading ──────► composer: Idle → Loading,
//!        │                                 arms once plugin:initNavigation
//!        ├─ await plugin:hostReady ◄────── composer acknowledges
//!        ├─ attach shadow root, fetch style + import module
//!        └─ entry.start(container, config, bus)
//!             └─ plugin publishes plugin:initNavigation ─► composer: Loaded(items)
//! ```

pub mod config;
pub mod context;
pub mod dom;
pub mod error;
pub mod events;
pub mod loader;
pub mod navigation;
pub mod shell;

pub use config::{BackendConfig, HostLink, PanoramaConfig, ServerConfig, ShellConfig};
pub use context::HostContext;
pub use error::{ConfigError, DomError, LoaderError, PanoramaError, ShellError};
pub use events::{EventBus, Subscription};
pub use loader::{LoaderConfig, MountedPlugin, PluginLoader};
pub use navigation::{
    LinkMode, Menu, MenuEntry, MenuSink, NavLink, NavigationComposer, SlotState, TextMenuSink,
};
pub use shell::{Route, Shell};

/// Result type alias using PanoramaError
pub type Result<T> = std::result::Result<T, PanoramaError>;
