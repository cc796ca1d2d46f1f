//! The hub ties the transport, the channel registry, and the sync scheduler
//! together for one node.
//!
//! The transport adapter calls [`Hub::dispatch`] for every inbound frame,
//! plain or synced, coordinator-bound or peer-bound; the frame itself carries
//! the category. Channels are constructed through the hub and register their
//! dispatch callbacks at construction.

use crate::error::Suppressed;
use crate::event::EventChannel;
use crate::fanout::{self, FanOut};
use crate::frame::{ChannelId, Frame};
use crate::message::MessageChannel;
use crate::peer::{PeerId, Role};
use crate::registry::ChannelRegistry;
use crate::sync::SyncScheduler;
use crate::transport::Transport;
use crate::wire::Wire;
use std::sync::{Arc, Weak};

/// Per-node routing and scheduling state.
pub struct Hub {
    transport: Arc<dyn Transport>,
    registry: ChannelRegistry,
    scheduler: SyncScheduler,
    // Channels hold a Weak<Hub>; this lets &self methods hand one out.
    self_weak: Weak<Hub>,
}

impl Hub {
    /// Create a hub over the given transport.
    pub fn new(transport: Arc<dyn Transport>) -> Arc<Self> {
        Arc::new_cyclic(|self_weak| Hub {
            transport,
            registry: ChannelRegistry::new(),
            scheduler: SyncScheduler::new(),
            self_weak: self_weak.clone(),
        })
    }

    fn strong(&self) -> Arc<Hub> {
        // A &Hub can only come from the Arc built in `new`.
        self.self_weak.upgrade().expect("hub constructed via Hub::new")
    }

    /// The transport this hub sends and receives through.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// The channel routing table.
    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    /// The synced-delivery scheduler.
    pub fn scheduler(&self) -> &SyncScheduler {
        &self.scheduler
    }

    /// Inbound hook: route a frame to every matching local channel.
    ///
    /// Must be called within a tokio runtime; synced frames schedule delayed
    /// delivery tasks from here.
    pub fn dispatch(&self, frame: Frame) {
        self.registry.dispatch(frame);
    }

    /// Create an event channel registered under `id`.
    pub fn event_channel(&self, id: impl Into<ChannelId>) -> EventChannel {
        EventChannel::new(&self.strong(), id.into())
    }

    /// Create a typed message channel registered under `id`.
    pub fn message_channel<T: Wire>(&self, id: impl Into<ChannelId>) -> MessageChannel<T> {
        MessageChannel::new(&self.strong(), id.into())
    }

    /// Gate a plain coordinator-bound send on a live session.
    pub(crate) fn guard_session(&self, channel: &ChannelId) -> bool {
        if self.transport.session_active() {
            true
        } else {
            tracing::debug!(
                channel = %channel,
                reason = %Suppressed::NoActiveSession,
                "send suppressed"
            );
            false
        }
    }

    /// Gate a fan-out send: live session, coordinator role, non-empty targets.
    ///
    /// Returns the resolved recipients, or `None` when the send must be
    /// suppressed. The roster is snapshotted here, immediately before the
    /// caller transmits.
    pub(crate) fn guard_fanout(
        &self,
        channel: &ChannelId,
        request: &FanOut,
    ) -> Option<Vec<PeerId>> {
        let suppress = |reason: Suppressed| {
            tracing::debug!(channel = %channel, reason = %reason, "fan-out suppressed");
        };

        if !self.transport.session_active() {
            suppress(Suppressed::NoActiveSession);
            return None;
        }
        if self.transport.role() != Role::Coordinator {
            suppress(Suppressed::UnauthorizedRole);
            return None;
        }

        let roster = self.transport.connected_peers();
        let targets = fanout::resolve(request, &roster, self.transport.local_id());
        if targets.is_empty() {
            suppress(Suppressed::EmptyTargetSet);
            return None;
        }
        Some(targets)
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("role", &self.transport.role())
            .field("local_id", &self.transport.local_id())
            .field("registry", &self.registry)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}
