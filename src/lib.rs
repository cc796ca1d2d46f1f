//! # Hubcast - typed pub/sub channels over a hub-and-spoke transport
//!
//! Hubcast is a typed publish/subscribe layer for a topology with one
//! coordinating node and a set of peer nodes connected over an unreliable
//! remote-procedure transport. Independent producers register named channels,
//! send fire-and-forget notifications or typed payloads to selected
//! recipients, and receive them through per-channel subscriber callbacks.
//! A synced mode makes delivery fire at approximately the same virtual
//! instant on every recipient despite heterogeneous latency.
//!
//! # Overview
//!
//! - **Hub**: per-node entry point owning the channel registry and the
//!   synced-delivery scheduler; the transport adapter feeds every inbound
//!   frame to [`Hub::dispatch`].
//! - **EventChannel**: a pure signal with coordinator-received,
//!   coordinator-received-with-origin, and peer-received subscriber lists.
//! - **MessageChannel\<T\>**: carries values of a declared [`Wire`] payload
//!   type; the trait bound is the codec gateway's allowed-type predicate.
//! - **Transport**: the external collaborator carrying frames and owning the
//!   session, roster, role, and virtual clock.
//!
//! Only the coordinator may fan out to peers; a peer attempting it is a
//! silent no-op, as is any send with no session or no resolvable recipient.
//! A fan-out that resolves to zero recipients never transmits a frame.
//!
//! # Quick Start
//!
//! ```ignore
//! use hubcast::prelude::*;
//! use std::sync::Arc;
//!
//! let transport: Arc<dyn Transport> = my_adapter();
//! let hub = Hub::new(transport);
//!
//! // A zero-payload signal channel.
//! let launch = hub.event_channel("mission/launch");
//! launch.on_peer_received(|| println!("launch!"));
//! launch.invoke_all_peers_synced(true).await;
//!
//! // A typed channel; the payload type opts in with impl_wire!.
//! let scores: MessageChannel<u32> = hub.message_channel("mission/score");
//! scores.on_coordinator_received(|score| println!("score: {score}"));
//! scores.send_coordinator(&42).await?;
//! ```
//!
//! # Synced delivery
//!
//! A synced invoke stamps the sender's virtual time onto the frame. The
//! coordinator relays the stamp to every peer except the originator, and
//! every recipient (coordinator included) waits `max(0, stamp - now)` before
//! firing subscribers, so the notification appears simultaneous everywhere.
//! The originator fires immediately rather than waiting for the round trip.

#![deny(missing_docs)]

pub mod error;
pub mod event;
pub mod fanout;
pub mod frame;
pub mod hub;
pub mod message;
pub mod peer;
pub mod registry;
pub mod subscribers;
pub mod sync;
pub mod transport;
pub mod wire;

pub use error::{Suppressed, WireError};
pub use event::EventChannel;
pub use frame::{ChannelId, ChannelKind, Direction, Frame};
pub use hub::Hub;
pub use message::MessageChannel;
pub use peer::{Origin, PeerId, Role};
pub use transport::Transport;
pub use wire::Wire;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use hubcast::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Suppressed, WireError};
    pub use crate::event::EventChannel;
    pub use crate::fanout::FanOut;
    pub use crate::frame::{ChannelId, ChannelKind, Direction, Frame};
    pub use crate::hub::Hub;
    pub use crate::message::MessageChannel;
    pub use crate::peer::{Origin, PeerId, Role};
    pub use crate::registry::RegistrationId;
    pub use crate::subscribers::SubscriptionId;
    pub use crate::transport::Transport;
    pub use crate::wire::Wire;
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_imports() {
        // Verifies the prelude surface compiles and is reachable.
        let _role = Role::Coordinator;
        let _origin = Origin::Peer(PeerId(1));
        let _id = ChannelId::from("a/b");
        let _kind = ChannelKind::Event;
        let _dir = Direction::ToPeers;
    }
}
