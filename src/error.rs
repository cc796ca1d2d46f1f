//! Error types for channel operations.

use thiserror::Error;

/// Errors crossing the payload codec boundary.
///
/// Encoding errors surface to the caller at the first send attempt — silently
/// dropping application data is unacceptable. Decoding errors are absorbed at
/// dispatch: the frame is dropped for that channel and the dispatch loop
/// continues.
#[derive(Debug, Error)]
pub enum WireError {
    /// The value could not be encoded for transit.
    #[error("payload encoding failed for `{tag}`: {reason}")]
    Encode {
        /// Wire tag of the payload type.
        tag: &'static str,
        /// Underlying serializer error.
        reason: String,
    },

    /// Inbound payload bytes do not match the channel's declared type.
    #[error("payload decoding failed for `{tag}`: {reason}")]
    Decode {
        /// Wire tag of the expected payload type.
        tag: &'static str,
        /// Underlying deserializer error.
        reason: String,
    },
}

/// Conditions under which a send is suppressed rather than transmitted.
///
/// These are not surfaced to callers — a suppressed send is indistinguishable
/// from a successful send with no effect. They exist so suppression is
/// observable in diagnostics and assertable in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppressed {
    /// No live transport session.
    NoActiveSession,
    /// Fan-out resolved to zero recipients.
    EmptyTargetSet,
    /// A peer attempted a coordinator-only fan-out.
    UnauthorizedRole,
}

impl std::fmt::Display for Suppressed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Suppressed::NoActiveSession => "no active session",
            Suppressed::EmptyTargetSet => "empty target set",
            Suppressed::UnauthorizedRole => "unauthorized role",
        };
        f.write_str(s)
    }
}
