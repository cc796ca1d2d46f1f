//! Channel registry: routes inbound frames to locally registered channels.
//!
//! A multimap from `(ChannelId, ChannelKind)` to dispatch callbacks. Multiple
//! registrations for the same key all fire (multiple local channel objects for
//! one logical channel are allowed). A frame whose key matches nothing is
//! silently dropped — channels need not exist on every node.
//!
//! Registration appends and dispatch reads; an explicit unregistration path
//! exists so a channel can be closed, but nothing forces it — unclosed
//! channels live for the process lifetime.

use crate::frame::{ChannelId, ChannelKind, Frame};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Handle identifying one registration, used to unregister it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(u64);

type DispatchFn = Arc<dyn Fn(Frame) + Send + Sync>;
type Key = (String, ChannelKind);

/// The id-to-callback routing table for one node.
pub struct ChannelRegistry {
    entries: RwLock<HashMap<Key, Vec<(RegistrationId, DispatchFn)>>>,
    next_id: AtomicU64,
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        ChannelRegistry {
            entries: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Associate a dispatch callback with `(id, kind)`.
    ///
    /// No dedup: every registration for the key is invoked on dispatch.
    pub fn register(
        &self,
        id: &ChannelId,
        kind: ChannelKind,
        callback: impl Fn(Frame) + Send + Sync + 'static,
    ) -> RegistrationId {
        let registration = RegistrationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries
            .write()
            .expect("channel registry lock poisoned")
            .entry((id.as_str().to_string(), kind))
            .or_default()
            .push((registration, Arc::new(callback)));
        registration
    }

    /// Remove one registration. Unknown ids are ignored.
    pub fn unregister(&self, registration: RegistrationId) {
        let mut entries = self
            .entries
            .write()
            .expect("channel registry lock poisoned");
        entries.retain(|_, callbacks| {
            callbacks.retain(|(id, _)| *id != registration);
            !callbacks.is_empty()
        });
    }

    /// Route an inbound frame to every callback registered for its key.
    ///
    /// Callbacks run outside the lock, in registration order, on the caller's
    /// execution context — so frames for the same channel id keep their
    /// arrival order.
    pub fn dispatch(&self, frame: Frame) {
        let callbacks: Vec<DispatchFn> = {
            let entries = self
                .entries
                .read()
                .expect("channel registry lock poisoned");
            match entries.get(&(frame.channel.as_str().to_string(), frame.kind)) {
                Some(list) => list.iter().map(|(_, cb)| Arc::clone(cb)).collect(),
                None => {
                    tracing::trace!(
                        channel = %frame.channel,
                        kind = ?frame.kind,
                        "frame for unregistered channel dropped"
                    );
                    return;
                }
            }
        };

        for callback in callbacks {
            callback(frame.clone());
        }
    }

    /// Number of live registrations across all keys.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .expect("channel registry lock poisoned")
            .values()
            .map(Vec::len)
            .sum()
    }

    /// Whether the registry has no registrations.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelRegistry")
            .field("registrations", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{ChannelId, Direction};
    use std::sync::atomic::AtomicUsize;

    fn event_frame(id: &str) -> Frame {
        Frame::event(ChannelId::from(id), Direction::ToCoordinator)
    }

    #[test]
    fn multiple_registrations_all_fire() {
        let registry = ChannelRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let hits = Arc::clone(&hits);
            registry.register(&"x".into(), ChannelKind::Event, move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        registry.dispatch(event_frame("x"));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unknown_channel_is_dropped() {
        let registry = ChannelRegistry::new();
        // Nothing registered; must not panic.
        registry.dispatch(event_frame("nobody-home"));
    }

    #[test]
    fn kind_is_part_of_the_key() {
        let registry = ChannelRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = Arc::clone(&hits);
        registry.register(&"x".into(), ChannelKind::Message, move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        // Event frame must not reach the message registration.
        registry.dispatch(event_frame("x"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unregister_removes_the_entry() {
        let registry = ChannelRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = Arc::clone(&hits);
        let registration = registry.register(&"x".into(), ChannelKind::Event, move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        registry.unregister(registration);
        registry.dispatch(event_frame("x"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(registry.is_empty());
    }
}
