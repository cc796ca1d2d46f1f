//! Wire types: channel identifiers and the frame carried by the transport.

use crate::peer::Origin;
use serde::{Deserialize, Serialize};

/// Globally unique routing key for a channel.
///
/// Opaque to this crate: the naming scheme that derives it (owning module plus
/// short name) lives with the caller. Two channel objects constructed with the
/// same id and kind are the same logical channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(String);

impl ChannelId {
    /// View the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ChannelId {
    fn from(s: String) -> Self {
        ChannelId(s)
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        ChannelId(s.to_string())
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a channel is a zero-payload event or a typed message channel.
///
/// The registry keys on `(id, kind)`, so an event channel and a message
/// channel may share an id without colliding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    /// Pure signal, no payload.
    Event,
    /// Carries one or more values of a declared payload type.
    Message,
}

/// Which way a frame is addressed.
///
/// Carried in the frame itself; the receiving side never infers direction
/// from context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Addressed to the coordinator.
    ToCoordinator,
    /// Addressed to one or more peers.
    ToPeers,
}

/// One unit of transmission.
///
/// `time` is present exactly on synced frames and holds the originator's (or
/// relaying coordinator's) virtual time. `origin` is filled by the transport
/// on receipt for coordinator-bound frames and carried explicitly on synced
/// relays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    /// Routing key.
    pub channel: ChannelId,
    /// Event or message.
    pub kind: ChannelKind,
    /// Coordinator-bound or peer-bound.
    pub direction: Direction,
    /// Encoded payload; empty for event frames.
    pub payload: Vec<u8>,
    /// Target virtual fire time for synced delivery.
    pub time: Option<f64>,
    /// Originating endpoint, when known.
    pub origin: Option<Origin>,
}

impl Frame {
    /// A plain (non-synced) event frame.
    pub fn event(channel: ChannelId, direction: Direction) -> Self {
        Frame {
            channel,
            kind: ChannelKind::Event,
            direction,
            payload: Vec::new(),
            time: None,
            origin: None,
        }
    }

    /// A plain (non-synced) message frame carrying encoded values.
    pub fn message(channel: ChannelId, direction: Direction, payload: Vec<u8>) -> Self {
        Frame {
            channel,
            kind: ChannelKind::Message,
            direction,
            payload,
            time: None,
            origin: None,
        }
    }

    /// A synced event frame stamped with a target virtual time and origin.
    pub fn synced_event(
        channel: ChannelId,
        direction: Direction,
        time: f64,
        origin: Origin,
    ) -> Self {
        Frame {
            channel,
            kind: ChannelKind::Event,
            direction,
            payload: Vec::new(),
            time: Some(time),
            origin: Some(origin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peer::{Origin, PeerId};

    #[test]
    fn frame_roundtrip() {
        let frame = Frame::synced_event(
            "mod/launch".into(),
            Direction::ToPeers,
            10.25,
            Origin::Peer(PeerId(3)),
        );

        let bytes = postcard::to_allocvec(&frame).unwrap();
        let decoded: Frame = postcard::from_bytes(&bytes).unwrap();

        assert_eq!(decoded.channel, ChannelId::from("mod/launch"));
        assert_eq!(decoded.kind, ChannelKind::Event);
        assert_eq!(decoded.direction, Direction::ToPeers);
        assert_eq!(decoded.time, Some(10.25));
        assert_eq!(decoded.origin, Some(Origin::Peer(PeerId(3))));
    }

    #[test]
    fn ids_compare_by_value() {
        assert_eq!(ChannelId::from("a/b"), ChannelId::from(String::from("a/b")));
        assert_ne!(ChannelId::from("a/b"), ChannelId::from("a/c"));
    }
}
