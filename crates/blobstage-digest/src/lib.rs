//! Streaming digest computation for blobstage staging files.
//!
//! [`DigestVerifier`] recomputes a content hash over a staged file and
//! compares it to the expected digest recorded in a
//! [`ContentHandle`](blobstage_types::ContentHandle). Verification is always
//! a full pass over the final bytes; there is no incremental state.

pub mod error;
pub mod verifier;

pub use error::{DigestError, DigestResult};
pub use verifier::DigestVerifier;
