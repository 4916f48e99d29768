use thiserror::Error;

/// Errors from digest computation.
#[derive(Debug, Error)]
pub enum DigestError {
    /// The staged file could not be opened or read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for digest operations.
pub type DigestResult<T> = Result<T, DigestError>;
