use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

/// One outstanding descriptor: its table id plus the shared revoked flag.
struct Entry {
    id: u64,
    revoked: Arc<AtomicBool>,
}

/// Descriptor table, guarded by the descriptor lock.
struct RegistryInner {
    next_id: u64,
    /// Insertion order; `revoke_all` walks it in reverse.
    entries: Vec<Entry>,
}

impl RegistryInner {
    /// Idempotent removal-by-id; already removed means no-op.
    fn remove(&mut self, id: u64) {
        if let Some(pos) = self.entries.iter().position(|e| e.id == id) {
            self.entries.remove(pos);
        }
    }
}

/// Tracks every writable descriptor issued for one session and can revoke
/// all of them atomically.
///
/// The table mutex is the "descriptor lock". It is independent of the
/// session lock so a holder closing its descriptor on an arbitrary thread
/// only ever takes this lock. When a finalizing transition needs both, the
/// session lock is acquired first and this lock second, never the reverse.
pub struct DescriptorRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl DescriptorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Wrap an opened staging-file handle in a new revocable descriptor and
    /// add it to the outstanding set.
    pub fn register(&self, file: File) -> RevocableDescriptor {
        let mut inner = self.inner.lock().expect("descriptor lock poisoned");
        let id = inner.next_id;
        inner.next_id += 1;
        let revoked = Arc::new(AtomicBool::new(false));
        inner.entries.push(Entry {
            id,
            revoked: Arc::clone(&revoked),
        });
        debug!(descriptor = id, "descriptor registered");
        RevocableDescriptor {
            id,
            file,
            revoked,
            registry: Arc::clone(&self.inner),
        }
    }

    /// Revoke and remove every outstanding descriptor, in reverse insertion
    /// order.
    ///
    /// Safe on an empty table and safe to call repeatedly: each descriptor
    /// is revoked at most once because revocation removes it from the table.
    pub fn revoke_all(&self) {
        let mut inner = self.inner.lock().expect("descriptor lock poisoned");
        let count = inner.entries.len();
        for entry in inner.entries.drain(..).rev() {
            entry.revoked.store(true, Ordering::Release);
        }
        if count > 0 {
            debug!(revoked = count, "all descriptors revoked");
        }
    }

    /// Number of descriptors currently outstanding.
    pub fn outstanding(&self) -> usize {
        self.inner.lock().expect("descriptor lock poisoned").entries.len()
    }
}

impl Default for DescriptorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A capability over one writable staging-file handle.
///
/// Every write and seek checks the revoked flag first; once the session
/// finalizes (or [`RevocableDescriptor::revoke`] is called) further use
/// fails with [`io::ErrorKind::PermissionDenied`]. Dropping the descriptor
/// removes it from the owning registry's outstanding set; that removal is
/// idempotent and cannot race destructively with a concurrent `revoke_all`.
pub struct RevocableDescriptor {
    id: u64,
    file: File,
    revoked: Arc<AtomicBool>,
    /// Back-reference for bookkeeping removal only, never ownership.
    registry: Arc<Mutex<RegistryInner>>,
}

impl RevocableDescriptor {
    /// The registry id of this descriptor.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the descriptor has been revoked.
    pub fn is_revoked(&self) -> bool {
        self.revoked.load(Ordering::Acquire)
    }

    /// Revoke this descriptor. Idempotent; the underlying file handle stays
    /// open until the descriptor is dropped, but every further use fails.
    pub fn revoke(&self) {
        self.revoked.store(true, Ordering::Release);
    }

    /// Close the descriptor, removing it from the outstanding set.
    pub fn close(self) {
        // Drop does the bookkeeping.
    }

    fn check_revoked(&self) -> io::Result<()> {
        if self.is_revoked() {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "descriptor has been revoked",
            ));
        }
        Ok(())
    }
}

impl Write for RevocableDescriptor {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.check_revoked()?;
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.check_revoked()?;
        self.file.flush()
    }
}

impl Seek for RevocableDescriptor {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.check_revoked()?;
        self.file.seek(pos)
    }
}

impl Drop for RevocableDescriptor {
    fn drop(&mut self) {
        let mut inner = self.registry.lock().expect("descriptor lock poisoned");
        inner.remove(self.id);
    }
}

impl std::fmt::Debug for RevocableDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevocableDescriptor")
            .field("id", &self.id)
            .field("revoked", &self.is_revoked())
            .finish()
    }
}
