//! Zero-payload event channels.
//!
//! An [`EventChannel`] is a pure signal: invoking it fires subscriber
//! callbacks on the targeted nodes, with nothing carried but the channel id.
//! Synced invokes additionally carry the timing metadata that makes every
//! recipient fire at approximately the same virtual instant.

use crate::fanout::FanOut;
use crate::frame::{ChannelId, ChannelKind, Direction, Frame};
use crate::hub::Hub;
use crate::peer::{Origin, PeerId, Role};
use crate::registry::RegistrationId;
use crate::subscribers::{SubscriberSet, SubscriptionId};
use crate::sync::delivery_wait;
use std::sync::{Arc, Weak};

#[derive(Default)]
struct EventSubscribers {
    coordinator_received: SubscriberSet<()>,
    coordinator_received_from: SubscriberSet<Origin>,
    peer_received: SubscriberSet<()>,
}

/// A named, payload-free notification channel.
///
/// Construction registers the channel with the hub's registry; every local
/// instance constructed with the same id receives every matching dispatch.
/// An event channel lives until [`EventChannel::close`] or process exit.
pub struct EventChannel {
    id: ChannelId,
    hub: Arc<Hub>,
    subs: Arc<EventSubscribers>,
    registration: RegistrationId,
}

impl EventChannel {
    pub(crate) fn new(hub: &Arc<Hub>, id: ChannelId) -> Self {
        let subs = Arc::new(EventSubscribers::default());

        let weak_hub: Weak<Hub> = Arc::downgrade(hub);
        let handler_subs = Arc::clone(&subs);
        let handler_id = id.clone();
        let registration = hub
            .registry()
            .register(&id, ChannelKind::Event, move |frame| {
                let Some(hub) = weak_hub.upgrade() else {
                    return;
                };
                handle_frame(&hub, &handler_id, &handler_subs, frame);
            });

        tracing::debug!(channel = %id, "event channel registered");
        EventChannel {
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

    /// Fire `callback` on the coordinator whenever a coordinator-bound
    /// invoke arrives.
    pub fn on_coordinator_received(
        &self,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.subs.coordinator_received.subscribe(move |_| callback())
    }

    /// Like [`on_coordinator_received`], but the callback also receives the
    /// originating endpoint when it is known.
    ///
    /// [`on_coordinator_received`]: EventChannel::on_coordinator_received
    pub fn on_coordinator_received_from(
        &self,
        callback: impl Fn(&Origin) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.subs.coordinator_received_from.subscribe(callback)
    }

    /// Fire `callback` on a peer whenever a peer-bound invoke arrives.
    pub fn on_peer_received(
        &self,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.subs.peer_received.subscribe(move |_| callback())
    }

    /// Drop a coordinator-received subscription.
    pub fn unsubscribe_coordinator_received(&self, id: SubscriptionId) {
        self.subs.coordinator_received.unsubscribe(id);
    }

    /// Drop a coordinator-received-with-origin subscription.
    pub fn unsubscribe_coordinator_received_from(&self, id: SubscriptionId) {
        self.subs.coordinator_received_from.unsubscribe(id);
    }

    /// Drop a peer-received subscription.
    pub fn unsubscribe_peer_received(&self, id: SubscriptionId) {
        self.subs.peer_received.unsubscribe(id);
    }

    // ------------------------------------------------------------------
    // Plain sends
    // ------------------------------------------------------------------

    /// Notify the coordinator. No-op without a live session.
    pub async fn invoke_coordinator(&self) {
        if !self.hub.guard_session(&self.id) {
            return;
        }
        let frame = Frame::event(self.id.clone(), Direction::ToCoordinator);
        self.hub.transport().send_to_coordinator(frame).await;
    }

    /// Notify one peer. Coordinator-only; no-op if the peer is unknown.
    pub async fn invoke_one_peer(&self, peer: PeerId) {
        self.fan_out(FanOut::One(peer)).await;
    }

    /// Notify an explicit set of peers. Coordinator-only; unknown targets are
    /// dropped and an all-unknown set suppresses the send.
    pub async fn invoke_many_peers(&self, peers: &[PeerId]) {
        self.fan_out(FanOut::Many(peers.to_vec())).await;
    }

    /// Notify every connected peer. Coordinator-only. With `include_self`,
    /// the coordinator's own peer-received subscribers fire too (loopback).
    pub async fn invoke_all_peers(&self, include_self: bool) {
        self.fan_out(FanOut::AllPeers { include_self }).await;
    }

    async fn fan_out(&self, request: FanOut) {
        let Some(targets) = self.hub.guard_fanout(&self.id, &request) else {
            return;
        };
        let frame = Frame::event(self.id.clone(), Direction::ToPeers);
        self.hub.transport().send_to_peers(frame, &targets).await;
    }

    // ------------------------------------------------------------------
    // Synced sends
    // ------------------------------------------------------------------

    /// Notify every *other* node at the same virtual instant.
    ///
    /// From a peer: ships the local virtual time to the coordinator for
    /// relaying, and fires the local peer-received subscribers at once; the
    /// originator does not wait for the round trip. From the coordinator:
    /// equivalent to a synced fan-out excluding itself.
    pub async fn invoke_other_peers_synced(&self) {
        if !self.hub.guard_session(&self.id) {
            return;
        }
        let transport = self.hub.transport();
        let now = transport.virtual_time();

        match transport.role() {
            Role::Peer => {
                let origin = Origin::Peer(transport.local_id());
                let frame =
                    Frame::synced_event(self.id.clone(), Direction::ToCoordinator, now, origin);
                transport.send_to_coordinator(frame).await;

                let subs = Arc::clone(&self.subs);
                self.hub
                    .scheduler()
                    .schedule(0.0, move || subs.peer_received.notify(&()));
            }
            Role::Coordinator => {
                self.synced_fan_out(FanOut::AllPeers { include_self: false }, now)
                    .await;
            }
        }
    }

    /// Coordinator-only: notify every connected peer at the same virtual
    /// instant, including the coordinator's own peer-received subscribers
    /// when `include_self` is set.
    pub async fn invoke_all_peers_synced(&self, include_self: bool) {
        let now = self.hub.transport().virtual_time();
        self.synced_fan_out(FanOut::AllPeers { include_self }, now)
            .await;
    }

    async fn synced_fan_out(&self, request: FanOut, time: f64) {
        let Some(targets) = self.hub.guard_fanout(&self.id, &request) else {
            return;
        };
        let frame = Frame::synced_event(
            self.id.clone(),
            Direction::ToPeers,
            time,
            Origin::Coordinator,
        );
        self.hub.transport().send_to_peers(frame, &targets).await;
    }

    /// Unregister this channel from the hub.
    ///
    /// Without an explicit close, a channel lives for the process lifetime.
    pub fn close(self) {
        self.hub.registry().unregister(self.registration);
        tracing::debug!(channel = %self.id, "event channel closed");
    }
}

impl std::fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannel").field("id", &self.id).finish()
    }
}

/// Route one inbound event frame into subscriber lists.
///
/// Synced coordinator-bound frames drive the relay leg of the protocol: the
/// coordinator forwards the stamped time to every peer except the originator,
/// then schedules its own delivery after `max(0, stamped - now)`.
fn handle_frame(hub: &Arc<Hub>, id: &ChannelId, subs: &Arc<EventSubscribers>, frame: Frame) {
    match (frame.direction, frame.time) {
        (Direction::ToCoordinator, None) => {
            subs.coordinator_received.notify(&());
            if let Some(origin) = frame.origin {
                subs.coordinator_received_from.notify(&origin);
            }
        }
        (Direction::ToPeers, None) => {
            subs.peer_received.notify(&());
        }
        (Direction::ToCoordinator, Some(stamped)) => {
            let transport = hub.transport();
            if transport.role() != Role::Coordinator {
                tracing::warn!(channel = %id, "synced coordinator-bound frame on a peer dropped");
                return;
            }

            let origin = frame.origin.unwrap_or(Origin::Coordinator);
            let local_id = transport.local_id();
            let originator = match origin {
                Origin::Peer(id) => id,
                Origin::Coordinator => local_id,
            };

            // Relay to every peer except the originator; the coordinator's
            // own delivery is scheduled below, not looped back.
            let roster = transport.connected_peers();
            let mut targets =
                crate::fanout::resolve(&FanOut::AllExcept(originator), &roster, local_id);
            targets.retain(|id| *id != local_id);
            if !targets.is_empty() {
                let relay =
                    Frame::synced_event(id.clone(), Direction::ToPeers, stamped, origin);
                let transport = Arc::clone(transport);
                tokio::spawn(async move {
                    transport.send_to_peers(relay, &targets).await;
                });
            }

            let wait = delivery_wait(stamped, transport.virtual_time());
            let subs = Arc::clone(subs);
            hub.scheduler().schedule(wait, move || {
                subs.coordinator_received.notify(&());
                subs.coordinator_received_from.notify(&origin);
            });
        }
        (Direction::ToPeers, Some(stamped)) => {
            let wait = delivery_wait(stamped, hub.transport().virtual_time());
            let subs = Arc::clone(subs);
            hub.scheduler()
                .schedule(wait, move || subs.peer_received.notify(&()));
        }
    }
}
