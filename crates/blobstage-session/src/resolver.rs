use std::fs;
use std::io;
use std::path::PathBuf;

use blobstage_types::SessionId;

/// Derives the staging-file path for a session.
///
/// The staging file is exclusively owned by its session; no other session
/// or external reader may observe it pre-commit.
pub trait SessionFileResolver: Send + Sync {
    /// The filesystem path for the session's staging file, creating parent
    /// directories as needed.
    fn staging_path(&self, session: SessionId) -> io::Result<PathBuf>;
}

/// Configuration for disk-backed staging storage.
#[derive(Clone, Debug)]
pub struct StagingConfig {
    /// Directory that holds all staging files.
    pub root: PathBuf,
}

impl StagingConfig {
    /// Configuration rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Production resolver: `<root>/session_<id>.blob`.
pub struct DiskFileResolver {
    config: StagingConfig,
}

impl DiskFileResolver {
    /// Create a resolver with the given staging configuration.
    pub fn new(config: StagingConfig) -> Self {
        Self { config }
    }
}

impl SessionFileResolver for DiskFileResolver {
    fn staging_path(&self, session: SessionId) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.config.root)?;
        Ok(self
            .config
            .root
            .join(format!("session_{}.blob", session.raw())))
    }
}
