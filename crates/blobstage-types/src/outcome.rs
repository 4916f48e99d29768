use serde::{Deserialize, Serialize};

/// Outcome delivered through a session's commit callback.
///
/// `Error` is sent synchronously when digest verification fails; `Success`
/// is sent later by the external persistence layer once the verified blob
/// is durable. Either way the callback fires at most once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitResult {
    Success,
    Error,
}

impl CommitResult {
    /// Returns `true` for [`CommitResult::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}
