//! Trait abstraction for the underlying remote-procedure transport.
//!
//! The transport owns the session, the peer roster, the local role, and the
//! virtual clock. The core only ever reads snapshots of that state — roster
//! membership can change between target resolution and send, so snapshots are
//! taken fresh per operation and never cached across an await point.

use crate::frame::Frame;
use crate::peer::{PeerId, Role};
use async_trait::async_trait;

/// The external collaborator that physically carries frames.
///
/// Implementations are expected to be fire-and-forget: the core does not
/// observe delivery success, and a send to a peer that disconnected between
/// resolution and transmission is the transport's to absorb.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// The local node's role.
    fn role(&self) -> Role;

    /// The local node's own endpoint id.
    fn local_id(&self) -> PeerId;

    /// Whether a transport session is currently live.
    fn session_active(&self) -> bool;

    /// Snapshot of every currently connected endpoint id, the coordinator's
    /// own id included.
    fn connected_peers(&self) -> Vec<PeerId>;

    /// Monotonically increasing virtual seconds.
    ///
    /// Not wall-clock-synchronized across nodes, but assumed drift-bounded.
    fn virtual_time(&self) -> f64;

    /// Carry a frame to the coordinator.
    async fn send_to_coordinator(&self, frame: Frame);

    /// Carry a frame to each of the given peers.
    ///
    /// A target equal to [`Transport::local_id`] is a loopback the transport
    /// delivers to its own inbound hook.
    async fn send_to_peers(&self, frame: Frame, targets: &[PeerId]);
}
