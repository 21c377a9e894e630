//! panorama-plugin-api - the contract between the panorama host shell and its plugins
//!
//! A plugin is an independently packaged micro-application. The host locates
//! its module, creates an isolated [`MountContainer`] for it and invokes the
//! module's entry operation once per mount. From then on the only channel
//! between the two sides is the signal bus, seen by plugins as a
//! [`SignalPort`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use panorama_plugin_api::{
//!     MountContainer, PluginEntry, PluginError, PluginHandle, PluginModule,
//!     PluginStartupConfig, SignalPort,
//! };
//!
//! struct Hello;
//!
//! impl PluginEntry for Hello {
//!     fn start(
//!         &self,
//!         container: MountContainer,
//!         config: PluginStartupConfig,
//!         bus: Arc<dyn SignalPort>,
//!     ) -> Result<Box<dyn PluginHandle>, PluginError> {
//!         // render, register navigation, listen for plugin:navigate ...
//!         # unimplemented!()
//!     }
//! }
//!
//! let module = PluginModule::new("/plugins/hello/hello.js").with_export("start", Arc::new(Hello));
//! ```

pub mod error;
pub mod module;
pub mod signal;
pub mod types;
pub mod view;

use std::sync::Arc;

pub use error::PluginError;
pub use module::{ENTRY_EXPORTS, PluginModule};
pub use signal::{LoadFailure, PluginRef, RawSignal, Signal, SignalError, SignalKind, Topic};
pub use types::*;
pub use view::{MountContainer, ViewNode};

/// A bus listener
pub type Listener = Arc<dyn Fn(&Signal) + Send + Sync>;

/// Identifies a listener registered through a [`SignalPort`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// The plugin-side view of the host's signal bus
pub trait SignalPort: Send + Sync {
    /// Deliver a signal to the listeners registered right now
    fn publish(&self, signal: Signal) -> usize;

    /// Register a listener for one signal kind
    fn listen(&self, kind: SignalKind, listener: Listener) -> ListenerId;

    /// Remove a listener; returns false if it was already gone
    fn unlisten(&self, kind: SignalKind, id: ListenerId) -> bool;
}

/// Typed helpers over any [`SignalPort`]
pub trait SignalPortExt: SignalPort {
    /// Publish a payload on its topic
    fn emit<T: Topic>(&self, payload: T::Payload) -> usize {
        self.publish(T::wrap(payload))
    }

    /// Listen on a topic, receiving its payload directly
    fn on<T: Topic>(&self, handler: impl Fn(&T::Payload) + Send + Sync + 'static) -> ListenerId {
        self.listen(
            T::KIND,
            Arc::new(move |signal: &Signal| {
                if let Some(payload) = T::extract(signal) {
                    handler(payload);
                }
            }),
        )
    }
}

impl<P: SignalPort + ?Sized> SignalPortExt for P {}

/// A mounted plugin instance, returned by the entry operation
pub trait PluginHandle: Send + Sync {
    fn plugin_id(&self) -> &str;

    /// Release the plugin's resources. Calling it again is a no-op.
    fn unmount(&self);

    fn is_mounted(&self) -> bool;
}

/// A module's entry operation (`start`, or `createRouter` in older plugins)
///
/// Mounts exactly once per invocation. Implementations must not assume they
/// are the only plugin in the process.
pub trait PluginEntry: Send + Sync {
    fn start(
        &self,
        container: MountContainer,
        config: PluginStartupConfig,
        bus: Arc<dyn SignalPort>,
    ) -> Result<Box<dyn PluginHandle>, PluginError>;
}

impl<F> PluginEntry for F
where
    F: Fn(
            MountContainer,
            PluginStartupConfig,
            Arc<dyn SignalPort>,
        ) -> Result<Box<dyn PluginHandle>, PluginError>
        + Send
        + Sync,
{
    fn start(
        &self,
        container: MountContainer,
        config: PluginStartupConfig,
        bus: Arc<dyn SignalPort>,
    ) -> Result<Box<dyn PluginHandle>, PluginError> {
        self(container, config, bus)
    }
}
