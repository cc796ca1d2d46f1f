//! Endpoint identity: peer ids, node roles, and send origins.

use serde::{Deserialize, Serialize};

/// Opaque identifier for a connected endpoint.
///
/// Assigned by the transport; the core never interprets it beyond equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId(
    /// Raw transport-assigned endpoint number.
    pub u64,
);

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "peer:{}", self.0)
    }
}

impl From<u64> for PeerId {
    fn from(raw: u64) -> Self {
        PeerId(raw)
    }
}

/// The local node's role in the hub-and-spoke topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The single node with authority to fan out to all peers.
    Coordinator,
    /// Any non-coordinator connected node.
    Peer,
}

/// Where a frame originated.
///
/// Carried explicitly through synced relays so the with-origin subscriber
/// list fires with the correct source, rather than inferring it from a
/// sentinel id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    /// The frame originated at the coordinator.
    Coordinator,
    /// The frame originated at the given peer.
    Peer(PeerId),
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::Coordinator => f.write_str("coordinator"),
            Origin::Peer(id) => write!(f, "{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_id_display() {
        assert_eq!(PeerId(7).to_string(), "peer:7");
        assert_eq!(Origin::Peer(PeerId(7)).to_string(), "peer:7");
        assert_eq!(Origin::Coordinator.to_string(), "coordinator");
    }
}
