use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a staging session.
///
/// Transitions form a single monotonic partial order, serialized by the
/// session lock:
///
/// ```text
/// Closed <-> Opened -> Abandoned
///                   -> Committed -> VerifiedValid
///                                -> VerifiedInvalid
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// Initial state; also re-entered when an opened session is closed.
    Closed,
    /// Writable: descriptors may be issued and access grants changed.
    Opened,
    /// Terminal: the owner cancelled the session.
    Abandoned,
    /// Frozen: awaiting digest verification.
    Committed,
    /// Terminal: staged bytes match the handle's expected digest.
    VerifiedValid,
    /// Terminal: digest mismatch or computation failure.
    VerifiedInvalid,
}

impl SessionState {
    /// A finalized session can never be opened or mutated again.
    ///
    /// `Closed` is not finalizing: a session closed from `Opened` may be
    /// re-opened.
    pub fn is_finalized(&self) -> bool {
        !matches!(self, Self::Closed | Self::Opened)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Closed => "<closed>",
            Self::Opened => "<opened>",
            Self::Abandoned => "<abandoned>",
            Self::Committed => "<committed>",
            Self::VerifiedValid => "<verified-valid>",
            Self::VerifiedInvalid => "<verified-invalid>",
        };
        write!(f, "{label}")
    }
}
