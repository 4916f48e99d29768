//! Content-addressable blob write-session core.
//!
//! A [`Session`] governs the lifecycle of a single client-owned staging
//! session for one [`ContentHandle`](blobstage_types::ContentHandle): the
//! owner opens it, configures its [`AccessControlList`], obtains revocable
//! write descriptors for the exclusive staging file, and commits. After
//! commit an external pipeline drives digest verification, which decides the
//! terminal state and fires the commit callback on failure.
//!
//! # Components
//!
//! - [`SessionState`] -- closed lifecycle enumeration
//! - [`AccessControlList`] -- per-session grant set (public, same-signature,
//!   explicit package grants)
//! - [`DescriptorRegistry`] / [`RevocableDescriptor`] -- revocable-capability
//!   table over writable file handles
//! - [`Session`] -- the state machine orchestrating the above
//! - [`hooks`] -- collaborator traits: state-change listener, commit
//!   callback, session-file resolver
//!
//! # Design Rules
//!
//! 1. The ownership check precedes the state check on every owner-facing
//!    operation.
//! 2. One mutex per session serializes all transitions and access-list
//!    reads/writes; a second mutex guards only the descriptor table.
//! 3. Lock order: session lock first, descriptor lock second, never the
//!    reverse.
//! 4. Digest computation runs outside the session lock; only the final state
//!    assignment and callback dispatch re-acquire it.
//! 5. Every descriptor ever issued is revoked exactly once upon
//!    finalization; revocation and removal are idempotent.
//! 6. At most one commit callback is pending; it is cleared before firing.

pub mod access;
pub mod error;
pub mod hooks;
pub mod registry;
pub mod resolver;
pub mod session;
pub mod state;

pub use access::{AccessControlList, PackageGrant};
pub use error::{SessionError, SessionResult};
pub use hooks::{CommitCallback, StateChangeListener};
pub use registry::{DescriptorRegistry, RevocableDescriptor};
pub use resolver::{DiskFileResolver, SessionFileResolver, StagingConfig};
pub use session::Session;
pub use state::SessionState;
