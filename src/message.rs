//! Typed message channels.
//!
//! A [`MessageChannel<T>`] carries one or more values of a declared payload
//! type per send. The payload type must implement [`Wire`] — that bound is
//! the codec gateway's allowed-type predicate, so an unencodable type cannot
//! be declared at all. Encoding runs before any routing guard: a bad value
//! fails loudly to the caller even when the send would have been suppressed.

use crate::error::WireError;
use crate::fanout::FanOut;
use crate::frame::{ChannelId, ChannelKind, Direction, Frame};
use crate::hub::Hub;
use crate::peer::PeerId;
use crate::registry::RegistrationId;
use crate::subscribers::{SubscriberSet, SubscriptionId};
use crate::wire::{self, Wire};
use std::sync::Arc;

struct MessageSubscribers<T> {
    coordinator_received: SubscriberSet<T>,
    peer_received: SubscriberSet<T>,
}

impl<T> Default for MessageSubscribers<T> {
    fn default() -> Self {
        MessageSubscribers {
            coordinator_received: SubscriberSet::new(),
            peer_received: SubscriberSet::new(),
        }
    }
}

/// A named channel carrying values of `T` across the transport.
///
/// Same lifecycle and fan-in rules as [`EventChannel`]: registered at
/// construction, multiple local instances for one id all receive, lives until
/// [`close`] or process exit.
///
/// [`EventChannel`]: crate::event::EventChannel
/// [`close`]: MessageChannel::close
pub struct MessageChannel<T: Wire> {
    id: ChannelId,
    hub: Arc<Hub>,
    subs: Arc<MessageSubscribers<T>>,
    registration: RegistrationId,
}

impl<T: Wire> MessageChannel<T> {
    pub(crate) fn new(hub: &Arc<Hub>, id: ChannelId) -> Self {
        let subs = Arc::new(MessageSubscribers::default());

        let handler_subs = Arc::clone(&subs);
        let handler_id = id.clone();
        let registration = hub
            .registry()
            .register(&id, ChannelKind::Message, move |frame| {
                handle_frame(&handler_id, &handler_subs, frame);
            });

        tracing::debug!(channel = %id, payload = %T::tag(), "message channel registered");
        MessageChannel {
            id,
            hub: Arc::clone(hub),
            subs,
            registration,
        }
    }

    /// This channel's routing key.
    pub fn id(&self) -> &ChannelId {
        &self.id
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    /// Fire `callback` on the coordinator for every value of a
    /// coordinator-bound send.
    pub fn on_coordinator_received(
        &self,
        callback: impl Fn(&T) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.subs.coordinator_received.subscribe(callback)
    }

    /// Fire `callback` on a peer for every value of a peer-bound send.
    pub fn on_peer_received(
        &self,
        callback: impl Fn(&T) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.subs.peer_received.subscribe(callback)
    }

    /// Drop a coordinator-received subscription.
    pub fn unsubscribe_coordinator_received(&self, id: SubscriptionId) {
        self.subs.coordinator_received.unsubscribe(id);
    }

    /// Drop a peer-received subscription.
    pub fn unsubscribe_peer_received(&self, id: SubscriptionId) {
        self.subs.peer_received.unsubscribe(id);
    }

    // ------------------------------------------------------------------
    // Sends
    // ------------------------------------------------------------------

    /// Send one value to the coordinator. No-op without a live session.
    pub async fn send_coordinator(&self, value: &T) -> Result<(), WireError> {
        self.send_coordinator_batch(std::slice::from_ref(value)).await
    }

    /// Send a sequence of values to the coordinator in one frame.
    pub async fn send_coordinator_batch(&self, values: &[T]) -> Result<(), WireError> {
        let payload = wire::encode_values(values)?;
        if !self.hub.guard_session(&self.id) {
            return Ok(());
        }
        let frame = Frame::message(self.id.clone(), Direction::ToCoordinator, payload);
        self.hub.transport().send_to_coordinator(frame).await;
        Ok(())
    }

    /// Send one value to one peer. Coordinator-only.
    pub async fn send_one_peer(&self, peer: PeerId, value: &T) -> Result<(), WireError> {
        self.fan_out(FanOut::One(peer), std::slice::from_ref(value))
            .await
    }

    /// Send a sequence of values to one peer. Coordinator-only.
    pub async fn send_one_peer_batch(&self, peer: PeerId, values: &[T]) -> Result<(), WireError> {
        self.fan_out(FanOut::One(peer), values).await
    }

    /// Send one value to an explicit set of peers. Coordinator-only.
    pub async fn send_many_peers(&self, peers: &[PeerId], value: &T) -> Result<(), WireError> {
        self.fan_out(FanOut::Many(peers.to_vec()), std::slice::from_ref(value))
            .await
    }

    /// Send a sequence of values to an explicit set of peers.
    /// Coordinator-only.
    pub async fn send_many_peers_batch(
        &self,
        peers: &[PeerId],
        values: &[T],
    ) -> Result<(), WireError> {
        self.fan_out(FanOut::Many(peers.to_vec()), values).await
    }

    /// Send one value to every connected peer. Coordinator-only; with
    /// `include_self` the coordinator's own peer-received subscribers fire
    /// too.
    pub async fn send_all_peers(&self, include_self: bool, value: &T) -> Result<(), WireError> {
        self.fan_out(FanOut::AllPeers { include_self }, std::slice::from_ref(value))
            .await
    }

    /// Send a sequence of values to every connected peer. Coordinator-only.
    pub async fn send_all_peers_batch(
        &self,
        include_self: bool,
        values: &[T],
    ) -> Result<(), WireError> {
        self.fan_out(FanOut::AllPeers { include_self }, values).await
    }

    async fn fan_out(&self, request: FanOut, values: &[T]) -> Result<(), WireError> {
        // Encode first so a codec failure surfaces even when the send would
        // be suppressed.
        let payload = wire::encode_values(values)?;
        let Some(targets) = self.hub.guard_fanout(&self.id, &request) else {
            return Ok(());
        };
        let frame = Frame::message(self.id.clone(), Direction::ToPeers, payload);
        self.hub.transport().send_to_peers(frame, &targets).await;
        Ok(())
    }

    /// Unregister this channel from the hub.
    pub fn close(self) {
        self.hub.registry().unregister(self.registration);
        tracing::debug!(channel = %self.id, "message channel closed");
    }
}

impl<T: Wire> std::fmt::Debug for MessageChannel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageChannel")
            .field("id", &self.id)
            .field("payload", &T::tag())
            .finish()
    }
}

/// Decode an inbound message frame and fire the direction's subscriber list
/// once per value. A decode failure drops the frame for this channel only.
fn handle_frame<T: Wire>(id: &ChannelId, subs: &Arc<MessageSubscribers<T>>, frame: Frame) {
    debug_assert_eq!(frame.kind, ChannelKind::Message);

    let values: Vec<T> = match wire::decode_values(&frame.payload) {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!(channel = %id, error = %e, "inbound payload dropped");
            return;
        }
    };

    let list = match frame.direction {
        Direction::ToCoordinator => &subs.coordinator_received,
        Direction::ToPeers => &subs.peer_received,
    };
    for value in &values {
        list.notify(value);
    }
}
