use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256, Sha512};
use tracing::{debug, warn};

use blobstage_types::{ContentHandle, HashAlgorithm};

use crate::error::DigestResult;

/// Read chunk size for streaming digest computation.
const CHUNK_SIZE: usize = 64 * 1024;

/// Computes and compares file digests for session verification.
pub struct DigestVerifier;

impl DigestVerifier {
    /// Compute the digest of the file at `path` with the given algorithm.
    ///
    /// The file is streamed through the hasher in fixed-size chunks; the
    /// whole file is always consumed.
    pub fn compute(path: &Path, algorithm: HashAlgorithm) -> DigestResult<Vec<u8>> {
        let file = File::open(path)?;
        let digest = match algorithm {
            HashAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                stream_file(file, |chunk| hasher.update(chunk))?;
                hasher.finalize().to_vec()
            }
            HashAlgorithm::Sha512 => {
                let mut hasher = Sha512::new();
                stream_file(file, |chunk| hasher.update(chunk))?;
                hasher.finalize().to_vec()
            }
            HashAlgorithm::Blake3 => {
                let mut hasher = blake3::Hasher::new();
                stream_file(file, |chunk| {
                    hasher.update(chunk);
                })?;
                hasher.finalize().as_bytes().to_vec()
            }
        };
        debug!(path = %path.display(), algorithm = %algorithm, "digest computed");
        Ok(digest)
    }

    /// Returns `true` only when the file's digest matches the handle's
    /// expected digest.
    ///
    /// A read failure counts as a mismatch: the state machine treats
    /// unreadable content and wrong content identically.
    pub fn matches(path: &Path, handle: &ContentHandle) -> bool {
        match Self::compute(path, handle.algorithm()) {
            Ok(actual) => {
                let matched = actual.as_slice() == handle.digest();
                if !matched {
                    warn!(
                        path = %path.display(),
                        expected = %handle.digest_hex(),
                        actual = %hex::encode(&actual),
                        "digest mismatch"
                    );
                }
                matched
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "digest computation failed");
                false
            }
        }
    }
}

/// Feed the file through `update` in `CHUNK_SIZE` pieces.
fn stream_file(mut file: File, mut update: impl FnMut(&[u8])) -> DigestResult<()> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            return Ok(());
        }
        update(&buf[..n]);
    }
}
