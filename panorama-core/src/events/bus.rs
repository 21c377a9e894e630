//! Synchronous, typed publish/subscribe bus
//!
//! Delivery is immediate: `publish` calls every listener registered for the
//! signal's kind at that moment, in subscription order, before it returns.
//! Nothing is queued. A signal published with no listeners is lost, and a
//! listener attached later never observes it, even one attached by another
//! listener during the same dispatch. A listener detached by an earlier
//! listener during a dispatch is skipped for the rest of it.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use panorama_plugin_api::{
    Listener, ListenerId, RawSignal, Signal, SignalKind, SignalPort, Topic,
};

type Filter = Arc<dyn Fn(&Signal) -> bool + Send + Sync>;

enum Delivery {
    /// Stays registered until unsubscribed
    Every,
    /// Removed by the first delivery whose signal passes the filter
    Once(Filter),
}

struct Registered {
    id: ListenerId,
    listener: Listener,
    delivery: Delivery,
}

/// Counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    /// Signals published while the bus was live
    pub published: u64,
    /// Individual listener invocations
    pub delivered: u64,
    /// Signals that reached no listener
    pub dropped: u64,
    /// Raw envelopes that failed validation
    pub rejected: u64,
}

#[derive(Default)]
struct BusInner {
    listeners: BTreeMap<SignalKind, Vec<Registered>>,
    next_id: u64,
    disposed: bool,
    stats: BusStats,
}

impl BusInner {
    fn register(&mut self, kind: SignalKind, listener: Listener, delivery: Delivery) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.entry(kind).or_default().push(Registered {
            id,
            listener,
            delivery,
        });
        id
    }

    fn remove(&mut self, kind: SignalKind, id: ListenerId) -> bool {
        let Some(list) = self.listeners.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|r| r.id != id);
        list.len() != before
    }
}

fn lock(inner: &Mutex<BusInner>) -> MutexGuard<'_, BusInner> {
    inner.lock().unwrap_or_else(|e| e.into_inner())
}

/// Process-wide signal bus, injected into everything that needs it
///
/// Cloning yields another handle onto the same bus.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<BusInner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a signal; returns how many listeners received it
    pub fn publish(&self, signal: Signal) -> usize {
        let kind = signal.kind();
        let targets: Vec<(ListenerId, Listener, bool)> = {
            let mut inner = lock(&self.inner);
            if inner.disposed {
                tracing::debug!(%kind, "Bus disposed, signal discarded");
                return 0;
            }
            inner.stats.published += 1;

            let mut targets = Vec::new();
            if let Some(list) = inner.listeners.get_mut(&kind) {
                list.retain(|registered| match &registered.delivery {
                    Delivery::Every => {
                        targets.push((registered.id, registered.listener.clone(), true));
                        true
                    }
                    Delivery::Once(filter) if filter(&signal) => {
                        targets.push((registered.id, registered.listener.clone(), false));
                        false
                    }
                    Delivery::Once(_) => true,
                });
            }

            if targets.is_empty() {
                inner.stats.dropped += 1;
            }
            targets
        };

        if targets.is_empty() {
            tracing::debug!(%kind, plugin = ?signal.plugin_id(), "No subscribers, signal lost");
            return 0;
        }

        tracing::trace!(%kind, listeners = targets.len(), "Dispatching signal");
        let mut delivered = 0;
        for (id, listener, persistent) in &targets {
            // once-listeners were already removed above
            if *persistent && !self.is_registered(kind, *id) {
                continue;
            }
            listener(&signal);
            delivered += 1;
        }
        lock(&self.inner).stats.delivered += delivered as u64;
        delivered
    }

    fn is_registered(&self, kind: SignalKind, id: ListenerId) -> bool {
        lock(&self.inner)
            .listeners
            .get(&kind)
            .is_some_and(|list| list.iter().any(|r| r.id == id))
    }

    /// Validate an untyped envelope and publish it
    ///
    /// Malformed or unknown envelopes are dropped without error.
    pub fn publish_raw(&self, raw: &RawSignal) -> usize {
        match Signal::decode(raw) {
            Ok(signal) => self.publish(signal),
            Err(e) => {
                tracing::debug!(kind = %raw.kind, error = %e, "Dropping invalid signal");
                lock(&self.inner).stats.rejected += 1;
                0
            }
        }
    }

    /// Publish a payload on its topic
    pub fn emit<T: Topic>(&self, payload: T::Payload) -> usize {
        self.publish(T::wrap(payload))
    }

    /// Subscribe to every future signal on a topic
    pub fn subscribe<T: Topic>(
        &self,
        handler: impl Fn(&T::Payload) + Send + Sync + 'static,
    ) -> Subscription {
        let listener: Listener = Arc::new(move |signal: &Signal| {
            if let Some(payload) = T::extract(signal) {
                handler(payload);
            }
        });
        self.attach(T::KIND, listener, Delivery::Every)
    }

    /// Subscribe for a single delivery
    ///
    /// The subscription is removed by the first signal on the topic whose
    /// payload passes `filter`; signals the filter rejects leave it armed.
    /// `filter` runs while the bus is locked and must not touch the bus.
    pub fn subscribe_once<T: Topic>(
        &self,
        filter: impl Fn(&T::Payload) -> bool + Send + Sync + 'static,
        handler: impl Fn(&T::Payload) + Send + Sync + 'static,
    ) -> Subscription {
        let filter: Filter = Arc::new(move |signal: &Signal| T::extract(signal).is_some_and(&filter));
        let listener: Listener = Arc::new(move |signal: &Signal| {
            if let Some(payload) = T::extract(signal) {
                handler(payload);
            }
        });
        self.attach(T::KIND, listener, Delivery::Once(filter))
    }

    fn attach(&self, kind: SignalKind, listener: Listener, delivery: Delivery) -> Subscription {
        let id = lock(&self.inner).register(kind, listener, delivery);
        Subscription {
            bus: Arc::downgrade(&self.inner),
            kind,
            id,
        }
    }

    /// Number of listeners currently registered for a kind
    pub fn listener_count(&self, kind: SignalKind) -> usize {
        lock(&self.inner).listeners.get(&kind).map_or(0, Vec::len)
    }

    pub fn stats(&self) -> BusStats {
        lock(&self.inner).stats
    }

    /// Detach every listener; later publishes are discarded
    pub fn dispose(&self) {
        let mut inner = lock(&self.inner);
        let detached: usize = inner.listeners.values().map(Vec::len).sum();
        inner.listeners.clear();
        inner.disposed = true;
        tracing::debug!(detached, "Event bus disposed");
    }

    pub fn is_disposed(&self) -> bool {
        lock(&self.inner).disposed
    }

    /// This bus as the plugin-facing port
    pub fn port(&self) -> Arc<dyn SignalPort> {
        Arc::new(self.clone())
    }
}

impl SignalPort for EventBus {
    fn publish(&self, signal: Signal) -> usize {
        EventBus::publish(self, signal)
    }

    fn listen(&self, kind: SignalKind, listener: Listener) -> ListenerId {
        lock(&self.inner).register(kind, listener, Delivery::Every)
    }

    fn unlisten(&self, kind: SignalKind, id: ListenerId) -> bool {
        lock(&self.inner).remove(kind, id)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("EventBus")
            .field("listeners", &inner.listeners.values().map(Vec::len).sum::<usize>())
            .field("disposed", &inner.disposed)
            .field("stats", &inner.stats)
            .finish()
    }
}

/// Handle to a registered listener
///
/// Dropping a `Subscription` leaves the listener attached; call
/// [`Subscription::unsubscribe`] or hold a [`SubscriptionGuard`] instead.
#[derive(Debug, Clone)]
pub struct Subscription {
    bus: Weak<Mutex<BusInner>>,
    kind: SignalKind,
    id: ListenerId,
}

impl Subscription {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn kind(&self) -> SignalKind {
        self.kind
    }

    /// Detach the listener; false if it was already gone
    pub fn unsubscribe(&self) -> bool {
        self.bus
            .upgrade()
            .is_some_and(|inner| lock(&inner).remove(self.kind, self.id))
    }

    /// Still registered (a fired once-subscription is not)
    pub fn is_active(&self) -> bool {
        self.bus.upgrade().is_some_and(|inner| {
            lock(&inner)
                .listeners
                .get(&self.kind)
                .is_some_and(|list| list.iter().any(|r| r.id == self.id))
        })
    }

    /// Tie the listener's lifetime to the returned guard
    pub fn guard(self) -> SubscriptionGuard {
        SubscriptionGuard(self)
    }
}

/// Unsubscribes when dropped
#[derive(Debug)]
pub struct SubscriptionGuard(Subscription);

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.0.unsubscribe();
    }
}
