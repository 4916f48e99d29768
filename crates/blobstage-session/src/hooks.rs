use blobstage_types::{CommitResult, SessionId};

use crate::state::SessionState;

/// Observes session lifecycle transitions.
///
/// Invoked synchronously, under the session lock, whenever a session enters
/// `Closed` (from `Opened`), `Abandoned`, `Committed`, `VerifiedValid`, or
/// `VerifiedInvalid`. Implementations must be quick and must not call back
/// into the session.
pub trait StateChangeListener: Send + Sync {
    fn on_state_changed(&self, session: SessionId, state: SessionState);
}

/// Receives the outcome of a commit.
///
/// Consumed on delivery: the callback fires at most once, either
/// synchronously on verification failure (with [`CommitResult::Error`]) or
/// later from the external persistence layer (with
/// [`CommitResult::Success`]).
pub trait CommitCallback: Send {
    fn on_result(self: Box<Self>, result: CommitResult);
}

impl<F> CommitCallback for F
where
    F: FnOnce(CommitResult) + Send,
{
    fn on_result(self: Box<Self>, result: CommitResult) {
        (*self)(result)
    }
}
