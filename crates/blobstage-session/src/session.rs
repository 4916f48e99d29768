use std::fs::OpenOptions;
use std::io::{self, Seek, SeekFrom};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use blobstage_digest::DigestVerifier;
use blobstage_types::{CommitResult, ContentHandle, Principal, SessionId};

use crate::access::AccessControlList;
use crate::error::{SessionError, SessionResult};
use crate::hooks::{CommitCallback, StateChangeListener};
use crate::registry::{DescriptorRegistry, RevocableDescriptor};
use crate::resolver::SessionFileResolver;
use crate::state::SessionState;

/// Mutable session state, guarded by the session lock.
struct SessionInner {
    state: SessionState,
    access: AccessControlList,
    commit_callback: Option<Box<dyn CommitCallback>>,
    /// Lazily resolved staging-file path; resolved once, then cached.
    staging_path: Option<PathBuf>,
}

/// A single client-owned staging session for one content handle.
///
/// The session orchestrates the lifecycle state machine, the access-control
/// list, and the revocable descriptor registry. Every owner-facing operation
/// checks the caller against the recorded owner before inspecting state;
/// transitions are serialized by the session lock. The staging file is
/// exclusively owned by this session and only reachable through the
/// descriptors it issues.
pub struct Session {
    id: SessionId,
    owner: Principal,
    handle: ContentHandle,
    inner: Mutex<SessionInner>,
    descriptors: DescriptorRegistry,
    listener: Arc<dyn StateChangeListener>,
    resolver: Arc<dyn SessionFileResolver>,
}

impl Session {
    /// Create a session in the initial `Closed` state.
    ///
    /// Called by the external session table, which allocates the id and
    /// records the owner from the authenticated creation call.
    pub fn new(
        id: SessionId,
        handle: ContentHandle,
        owner: Principal,
        listener: Arc<dyn StateChangeListener>,
        resolver: Arc<dyn SessionFileResolver>,
    ) -> Self {
        Self {
            id,
            owner,
            handle,
            inner: Mutex::new(SessionInner {
                state: SessionState::Closed,
                access: AccessControlList::new(),
                commit_callback: None,
                staging_path: None,
            }),
            descriptors: DescriptorRegistry::new(),
            listener,
            resolver,
        }
    }

    /// The session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The owning principal recorded at creation.
    pub fn owner(&self) -> &Principal {
        &self.owner
    }

    /// The immutable content handle this session stages bytes for.
    pub fn handle(&self) -> &ContentHandle {
        &self.handle
    }

    /// Whether the caller is the session owner.
    pub fn is_owner(&self, caller: &Principal) -> bool {
        caller == &self.owner
    }

    /// Current lifecycle state. Read-only polling; not owner-gated.
    pub fn state(&self) -> SessionState {
        self.lock_inner().state
    }

    /// Whether the session has left the `Closed`/`Opened` states for good.
    pub fn is_finalized(&self) -> bool {
        self.state().is_finalized()
    }

    /// Snapshot of the current access-control list, for the service's own
    /// consumption when resolving reader access post-commit.
    pub fn access_list(&self) -> AccessControlList {
        self.lock_inner().access.clone()
    }

    /// Number of write descriptors currently outstanding.
    pub fn outstanding_descriptors(&self) -> usize {
        self.descriptors.outstanding()
    }

    // -----------------------------------------------------------------------
    // Lifecycle transitions
    // -----------------------------------------------------------------------

    /// Open the session for writing: `Closed -> Opened`.
    ///
    /// Fails once the session is finalized. Opening an already-opened
    /// session is permitted and leaves it opened.
    pub fn open(&self, caller: &Principal) -> SessionResult<()> {
        self.check_owner(caller)?;
        let mut inner = self.lock_inner();
        if inner.state.is_finalized() {
            return Err(SessionError::InvalidState {
                operation: "open",
                state: inner.state,
            });
        }
        inner.state = SessionState::Opened;
        debug!(session = %self.id, "session opened");
        Ok(())
    }

    /// Close the session: `Opened -> Closed`, revoking all descriptors.
    ///
    /// Closing an already-closed session is a no-op; a client may
    /// legitimately double-close during cleanup. Closing a finalized
    /// session is an error.
    pub fn close(&self, caller: &Principal) -> SessionResult<()> {
        self.finalize(caller, "close", SessionState::Closed)
    }

    /// Abandon the session: `Opened -> Abandoned`, revoking all descriptors.
    ///
    /// The cancellation primitive. Unlike [`Session::close`] there is no
    /// no-op case; abandoning outside `Opened` always fails.
    pub fn abandon(&self, caller: &Principal) -> SessionResult<()> {
        self.finalize(caller, "abandon", SessionState::Abandoned)
    }

    /// Commit the staged bytes: `Opened -> Committed`.
    ///
    /// Stores the commit callback, revokes all descriptors so no further
    /// writes are possible, and notifies the listener. The callback is not
    /// invoked here: verification or the external persistence layer
    /// delivers the result later.
    pub fn commit(&self, caller: &Principal, callback: Box<dyn CommitCallback>) -> SessionResult<()> {
        self.check_owner(caller)?;
        let mut inner = self.lock_inner();
        if inner.state != SessionState::Opened {
            return Err(SessionError::InvalidState {
                operation: "commit",
                state: inner.state,
            });
        }
        inner.commit_callback = Some(callback);
        self.finalize_locked(&mut inner, SessionState::Committed);
        Ok(())
    }

    /// Verify the staged bytes against the handle's expected digest.
    ///
    /// Driven by the service pipeline after commit, not by the client, so
    /// it takes no caller. The digest pass runs outside the session lock;
    /// a slow hash over a large blob must not block state polling. On match
    /// the session becomes `VerifiedValid` and the commit callback stays
    /// pending for the durable-persistence step; on mismatch (or any
    /// computation failure) it becomes `VerifiedInvalid` and the callback
    /// fires immediately with an error result.
    pub fn verify(&self) {
        let path = {
            let mut inner = self.lock_inner();
            if inner.state != SessionState::Committed {
                warn!(session = %self.id, state = %inner.state, "verify requested outside <committed>; ignoring");
                return;
            }
            self.staging_path_locked(&mut inner)
        };

        let matched = match path {
            Ok(path) => DigestVerifier::matches(&path, &self.handle),
            Err(e) => {
                warn!(session = %self.id, error = %e, "could not resolve staging file");
                false
            }
        };

        let mut inner = self.lock_inner();
        if inner.state != SessionState::Committed {
            warn!(session = %self.id, state = %inner.state, "state changed during verification; ignoring");
            return;
        }
        if matched {
            inner.state = SessionState::VerifiedValid;
            // The commit result is sent once the blob is durably persisted.
        } else {
            inner.state = SessionState::VerifiedInvalid;
            self.send_commit_result_locked(&mut inner, CommitResult::Error);
        }
        debug!(session = %self.id, state = %inner.state, "verification finished");
        self.listener.on_state_changed(self.id, inner.state);
    }

    /// Deliver the pending commit result, if any.
    ///
    /// At-most-once: the callback reference is cleared before invocation.
    /// Called internally on verification failure and by the external
    /// persistence layer on success.
    pub fn send_commit_result(&self, result: CommitResult) {
        let mut inner = self.lock_inner();
        self.send_commit_result_locked(&mut inner, result);
    }

    // -----------------------------------------------------------------------
    // Writing
    // -----------------------------------------------------------------------

    /// Open a writable descriptor over the session's staging file.
    ///
    /// Creates the file if absent (owner-only permissions), seeks to
    /// `offset_bytes`, and best-effort pre-allocates `length_bytes` past the
    /// offset. Multiple concurrent calls each yield an independent
    /// descriptor; no limit is enforced here (quota is an external
    /// collaborator's concern).
    pub fn open_write(
        &self,
        caller: &Principal,
        offset_bytes: u64,
        length_bytes: u64,
    ) -> SessionResult<RevocableDescriptor> {
        self.check_owner(caller)?;
        let mut inner = self.lock_inner();
        if inner.state != SessionState::Opened {
            return Err(SessionError::InvalidState {
                operation: "write",
                state: inner.state,
            });
        }

        let path = self.staging_path_locked(&mut inner)?;

        let mut options = OpenOptions::new();
        options.read(true).write(true).create(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&path)?;

        if offset_bytes > 0 {
            let reached = file.seek(SeekFrom::Start(offset_bytes))?;
            if reached != offset_bytes {
                return Err(SessionError::Io(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("failed to seek to {offset_bytes}; reached {reached}"),
                )));
            }
        }
        if length_bytes > 0 {
            let end = offset_bytes.checked_add(length_bytes).ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "write range overflows u64")
            })?;
            if file.metadata()?.len() < end {
                file.set_len(end)?;
            }
        }

        let descriptor = self.descriptors.register(file);
        debug!(
            session = %self.id,
            descriptor = descriptor.id(),
            offset = offset_bytes,
            length = length_bytes,
            "write descriptor issued"
        );
        Ok(descriptor)
    }

    // -----------------------------------------------------------------------
    // Access control
    // -----------------------------------------------------------------------

    /// Grant access to a package pinned to a signing certificate.
    pub fn allow_package_access(
        &self,
        caller: &Principal,
        package: &str,
        certificate: &[u8],
    ) -> SessionResult<()> {
        let mut inner = self.access_mut(caller)?;
        inner.access.allow_package_access(package, certificate);
        Ok(())
    }

    /// Grant access to packages signed with the owner's certificate.
    pub fn allow_same_signature_access(&self, caller: &Principal) -> SessionResult<()> {
        let mut inner = self.access_mut(caller)?;
        inner.access.allow_same_signature_access();
        Ok(())
    }

    /// Grant access to everyone.
    pub fn allow_public_access(&self, caller: &Principal) -> SessionResult<()> {
        let mut inner = self.access_mut(caller)?;
        inner.access.allow_public_access();
        Ok(())
    }

    /// Whether the (package, certificate) pair has an explicit grant.
    pub fn is_package_access_allowed(
        &self,
        caller: &Principal,
        package: &str,
        certificate: &[u8],
    ) -> SessionResult<bool> {
        let inner = self.access_query(caller)?;
        Ok(inner.access.is_package_access_allowed(package, certificate))
    }

    /// Whether same-signature access is granted.
    pub fn is_same_signature_access_allowed(&self, caller: &Principal) -> SessionResult<bool> {
        let inner = self.access_query(caller)?;
        Ok(inner.access.is_same_signature_access_allowed())
    }

    /// Whether public access is granted.
    pub fn is_public_access_allowed(&self, caller: &Principal) -> SessionResult<bool> {
        let inner = self.access_query(caller)?;
        Ok(inner.access.is_public_access_allowed())
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn check_owner(&self, caller: &Principal) -> SessionResult<()> {
        if !self.is_owner(caller) {
            return Err(SessionError::PermissionDenied {
                uid: caller.uid(),
                session: self.id,
            });
        }
        Ok(())
    }

    fn lock_inner(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().expect("session lock poisoned")
    }

    /// Owner check, then state gate to `Opened`, for access-list mutation.
    /// Access configuration freezes the instant the session leaves `Opened`.
    fn access_mut(&self, caller: &Principal) -> SessionResult<MutexGuard<'_, SessionInner>> {
        self.check_owner(caller)?;
        let inner = self.lock_inner();
        if inner.state != SessionState::Opened {
            return Err(SessionError::InvalidState {
                operation: "change access type",
                state: inner.state,
            });
        }
        Ok(inner)
    }

    /// Same gating as [`Session::access_mut`], for queries.
    fn access_query(&self, caller: &Principal) -> SessionResult<MutexGuard<'_, SessionInner>> {
        self.check_owner(caller)?;
        let inner = self.lock_inner();
        if inner.state != SessionState::Opened {
            return Err(SessionError::InvalidState {
                operation: "get access type",
                state: inner.state,
            });
        }
        Ok(inner)
    }

    fn finalize(
        &self,
        caller: &Principal,
        operation: &'static str,
        target: SessionState,
    ) -> SessionResult<()> {
        self.check_owner(caller)?;
        let mut inner = self.lock_inner();
        if inner.state != SessionState::Opened {
            // Double-close is tolerated; every other finalizer is strict.
            if target == SessionState::Closed && inner.state == SessionState::Closed {
                return Ok(());
            }
            return Err(SessionError::InvalidState {
                operation,
                state: inner.state,
            });
        }
        self.finalize_locked(&mut inner, target);
        Ok(())
    }

    /// Transition out of `Opened` while holding the session lock: set the
    /// target state, revoke every outstanding descriptor (descriptor lock
    /// nests inside the session lock, never the reverse), then notify the
    /// listener synchronously.
    fn finalize_locked(&self, inner: &mut SessionInner, target: SessionState) {
        inner.state = target;
        self.descriptors.revoke_all();
        debug!(session = %self.id, state = %target, "session finalized");
        self.listener.on_state_changed(self.id, target);
    }

    fn staging_path_locked(&self, inner: &mut SessionInner) -> SessionResult<PathBuf> {
        if let Some(path) = &inner.staging_path {
            return Ok(path.clone());
        }
        let path = self.resolver.staging_path(self.id)?;
        inner.staging_path = Some(path.clone());
        Ok(path)
    }

    fn send_commit_result_locked(&self, inner: &mut SessionInner, result: CommitResult) {
        match inner.commit_callback.take() {
            Some(callback) => callback.on_result(result),
            None => warn!(session = %self.id, "no pending commit callback to deliver to"),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("state", &self.state())
            .finish()
    }
}
