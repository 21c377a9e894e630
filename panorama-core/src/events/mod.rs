//! Signal bus for host/plugin coordination

pub mod bus;

pub use bus::{BusStats, EventBus, Subscription, SubscriptionGuard};

// Topics and payloads live in the plugin API so both sides agree on them
pub use panorama_plugin_api::signal::{
    HostReady, InitNavigation, LoadFailed, Loading, Navigate, Unload,
};
pub use panorama_plugin_api::{LoadFailure, PluginRef, RawSignal, Signal, SignalKind, Topic};
