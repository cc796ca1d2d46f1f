//! Fan-out target resolution.
//!
//! Given a requested target set and a roster snapshot, compute the actual
//! recipients, dropping unknown or disconnected targets. The hard invariant:
//! if resolution is empty, the caller suppresses the send entirely — no frame
//! is ever transmitted for zero recipients.

use crate::peer::PeerId;

/// A requested target set for a fan-out send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FanOut {
    /// Exactly one peer; dropped if not in the roster.
    One(PeerId),
    /// An explicit set, intersected with the roster.
    Many(Vec<PeerId>),
    /// The whole roster, optionally including the sender's own endpoint.
    AllPeers {
        /// Keep the local endpoint in the recipient set (coordinator
        /// loopback).
        include_self: bool,
    },
    /// The whole roster minus one endpoint, used to relay to everyone but the
    /// originator.
    AllExcept(PeerId),
}

/// Resolve a requested target set against a roster snapshot.
///
/// `local_id` is the resolving node's own endpoint id; it is removed for
/// `AllPeers { include_self: false }` and kept otherwise.
pub fn resolve(request: &FanOut, roster: &[PeerId], local_id: PeerId) -> Vec<PeerId> {
    match request {
        FanOut::One(id) => {
            if roster.contains(id) {
                vec![*id]
            } else {
                Vec::new()
            }
        }
        FanOut::Many(ids) => {
            let mut seen = Vec::with_capacity(ids.len());
            for id in ids {
                if roster.contains(id) && !seen.contains(id) {
                    seen.push(*id);
                }
            }
            seen
        }
        FanOut::AllPeers { include_self } => roster
            .iter()
            .copied()
            .filter(|id| *include_self || *id != local_id)
            .collect(),
        FanOut::AllExcept(excluded) => roster
            .iter()
            .copied()
            .filter(|id| id != excluded)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<PeerId> {
        vec![PeerId(0), PeerId(1), PeerId(2)]
    }

    #[test]
    fn one_known_and_unknown() {
        assert_eq!(
            resolve(&FanOut::One(PeerId(1)), &roster(), PeerId(0)),
            vec![PeerId(1)]
        );
        assert!(resolve(&FanOut::One(PeerId(9)), &roster(), PeerId(0)).is_empty());
    }

    #[test]
    fn many_intersects_with_roster() {
        let resolved = resolve(
            &FanOut::Many(vec![PeerId(2), PeerId(9), PeerId(1), PeerId(2)]),
            &roster(),
            PeerId(0),
        );
        assert_eq!(resolved, vec![PeerId(2), PeerId(1)]);
    }

    #[test]
    fn many_with_no_overlap_is_empty() {
        let resolved = resolve(
            &FanOut::Many(vec![PeerId(7), PeerId(8)]),
            &roster(),
            PeerId(0),
        );
        assert!(resolved.is_empty());
    }

    #[test]
    fn all_peers_respects_include_self() {
        let without = resolve(
            &FanOut::AllPeers { include_self: false },
            &roster(),
            PeerId(0),
        );
        assert_eq!(without, vec![PeerId(1), PeerId(2)]);

        let with = resolve(
            &FanOut::AllPeers { include_self: true },
            &roster(),
            PeerId(0),
        );
        assert_eq!(with, roster());
    }

    #[test]
    fn all_except_drops_the_originator() {
        let resolved = resolve(&FanOut::AllExcept(PeerId(1)), &roster(), PeerId(0));
        assert_eq!(resolved, vec![PeerId(0), PeerId(2)]);
    }

    #[test]
    fn empty_roster_resolves_empty() {
        assert!(resolve(&FanOut::AllPeers { include_self: true }, &[], PeerId(0)).is_empty());
    }
}
