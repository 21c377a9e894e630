//! Bus signal definitions
//!
//! Signals are the only coupling between the host and its plugins. Each kind
//! has a stable wire name and a typed payload; [`RawSignal`] is the untyped
//! envelope used at the edges, validated by [`Signal::decode`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::{PluginNavigate, PluginNavigationInit};

/// Named signal kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignalKind {
    Loading,
    HostReady,
    InitNavigation,
    Navigate,
    Unload,
    LoadFailed,
}

impl SignalKind {
    pub const ALL: [SignalKind; 6] = [
        SignalKind::Loading,
        SignalKind::HostReady,
        SignalKind::InitNavigation,
        SignalKind::Navigate,
        SignalKind::Unload,
        SignalKind::LoadFailed,
    ];

    /// Wire name of the signal kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loading => "plugin:loading",
            Self::HostReady => "plugin:hostReady",
            Self::InitNavigation => "plugin:initNavigation",
            Self::Navigate => "plugin:navigate",
            Self::Unload => "plugin:unload",
            Self::LoadFailed => "plugin:loadFailed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload naming a single plugin slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginRef {
    pub plugin_id: String,
}

impl PluginRef {
    pub fn new(plugin_id: impl Into<String>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
        }
    }
}

/// Payload of a failed load attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadFailure {
    pub plugin_id: String,
    pub reason: String,
}

/// A typed bus signal
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// The loader started mounting a plugin
    Loading(PluginRef),
    /// The host is subscribed for the plugin's registration; imports may proceed
    HostReady(PluginRef),
    /// A plugin registered its navigation tree
    InitNavigation(PluginNavigationInit),
    /// A navigation request, host to plugin or plugin to host
    Navigate(PluginNavigate),
    /// The host tears a plugin down
    Unload(PluginRef),
    /// Mounting a plugin failed or timed out
    LoadFailed(LoadFailure),
}

/// Errors from decoding a raw signal envelope
#[derive(Error, Debug)]
pub enum SignalError {
    #[error("unknown signal kind: {0}")]
    UnknownKind(String),

    #[error("malformed payload for {kind}: {source}")]
    Malformed {
        kind: SignalKind,
        #[source]
        source: serde_json::Error,
    },
}

/// Untyped wire envelope: a kind name plus a JSON detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSignal {
    pub kind: String,
    #[serde(default)]
    pub detail: Value,
}

impl RawSignal {
    pub fn new(kind: impl Into<String>, detail: Value) -> Self {
        Self {
            kind: kind.into(),
            detail,
        }
    }
}

impl Signal {
    pub fn kind(&self) -> SignalKind {
        match self {
            Self::Loading(_) => SignalKind::Loading,
            Self::HostReady(_) => SignalKind::HostReady,
            Self::InitNavigation(_) => SignalKind::InitNavigation,
            Self::Navigate(_) => SignalKind::Navigate,
            Self::Unload(_) => SignalKind::Unload,
            Self::LoadFailed(_) => SignalKind::LoadFailed,
        }
    }

    /// Plugin the signal concerns, if the payload names one
    pub fn plugin_id(&self) -> Option<&str> {
        match self {
            Self::Loading(r) | Self::HostReady(r) | Self::Unload(r) => Some(&r.plugin_id),
            Self::InitNavigation(init) => Some(&init.plugin_id),
            Self::Navigate(nav) => nav.plugin.as_ref().map(|p| p.id.as_str()),
            Self::LoadFailed(f) => Some(&f.plugin_id),
        }
    }

    /// Validate an untyped envelope and turn it into a typed signal
    pub fn decode(raw: &RawSignal) -> Result<Self, SignalError> {
        let kind =
            SignalKind::parse(&raw.kind).ok_or_else(|| SignalError::UnknownKind(raw.kind.clone()))?;
        let detail = raw.detail.clone();
        let malformed = |source| SignalError::Malformed { kind, source };

        let signal = match kind {
            SignalKind::Loading => Self::Loading(serde_json::from_value(detail).map_err(malformed)?),
            SignalKind::HostReady => {
                Self::HostReady(serde_json::from_value(detail).map_err(malformed)?)
            }
            SignalKind::InitNavigation => {
                Self::InitNavigation(serde_json::from_value(detail).map_err(malformed)?)
            }
            SignalKind::Navigate => {
                Self::Navigate(serde_json::from_value(detail).map_err(malformed)?)
            }
            SignalKind::Unload => Self::Unload(serde_json::from_value(detail).map_err(malformed)?),
            SignalKind::LoadFailed => {
                Self::LoadFailed(serde_json::from_value(detail).map_err(malformed)?)
            }
        };
        Ok(signal)
    }

    /// Encode into the untyped wire envelope
    pub fn encode(&self) -> RawSignal {
        let detail = match self {
            Self::Loading(r) | Self::HostReady(r) | Self::Unload(r) => serde_json::to_value(r),
            Self::InitNavigation(init) => serde_json::to_value(init),
            Self::Navigate(nav) => serde_json::to_value(nav),
            Self::LoadFailed(f) => serde_json::to_value(f),
        }
        .unwrap_or(Value::Null);

        RawSignal::new(self.kind().as_str(), detail)
    }
}

/// A typed view onto one signal kind
///
/// Subscribers name a topic and receive its payload directly; a signal whose
/// payload is not the topic's type never reaches them.
pub trait Topic: 'static {
    const KIND: SignalKind;
    type Payload: Clone + Send + Sync + 'static;

    fn extract(signal: &Signal) -> Option<&Self::Payload>;
    fn wrap(payload: Self::Payload) -> Signal;
}

macro_rules! topic {
    ($(#[$meta:meta])* $name:ident, $variant:ident, $payload:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl Topic for $name {
            const KIND: SignalKind = SignalKind::$variant;
            type Payload = $payload;

            fn extract(signal: &Signal) -> Option<&Self::Payload> {
                match signal {
                    Signal::$variant(payload) => Some(payload),
                    _ => None,
                }
            }

            fn wrap(payload: Self::Payload) -> Signal {
                Signal::$variant(payload)
            }
        }
    };
}

topic!(
    /// `plugin:loading`
    Loading, Loading, PluginRef
);
topic!(
    /// `plugin:hostReady`
    HostReady, HostReady, PluginRef
);
topic!(
    /// `plugin:initNavigation`
    InitNavigation, InitNavigation, PluginNavigationInit
);
topic!(
    /// `plugin:navigate`
    Navigate, Navigate, PluginNavigate
);
topic!(
    /// `plugin:unload`
    Unload, Unload, PluginRef
);
topic!(
    /// `plugin:loadFailed`
    LoadFailed, LoadFailed, LoadFailure
);
