//! Foundation types for blobstage.
//!
//! This crate provides the identity and content-description types used
//! throughout the blobstage system. Every other blobstage crate depends on
//! `blobstage-types`.
//!
//! # Key Types
//!
//! - [`SessionId`] — Numeric identifier for one staging session
//! - [`Principal`] — Authenticated caller identity (uid + package name)
//! - [`ContentHandle`] — Immutable identity of staged content
//! - [`HashAlgorithm`] — Closed enumeration of supported digest algorithms
//! - [`CommitResult`] — Outcome delivered through a session's commit callback

pub mod error;
pub mod handle;
pub mod identity;
pub mod outcome;

pub use error::TypeError;
pub use handle::{ContentHandle, HashAlgorithm};
pub use identity::{Principal, SessionId};
pub use outcome::CommitResult;
