use blobstage_types::SessionId;

use crate::state::SessionState;

/// Errors from session operations.
///
/// Verification failure is deliberately absent: a digest mismatch is not an
/// error surfaced to any caller, it drives the transition to
/// [`SessionState::VerifiedInvalid`] and the error commit callback.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Caller identity does not match the recorded session owner.
    ///
    /// Checked first on every mutating or access-mode-querying call,
    /// before any state inspection.
    #[error("uid {uid} is not the owner of {session}")]
    PermissionDenied { uid: u32, session: SessionId },

    /// Operation not allowed in the session's current lifecycle state.
    #[error("not allowed to {operation} in state {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// Staging-file creation, seek, or preallocation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
