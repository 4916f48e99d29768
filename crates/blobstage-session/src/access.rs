use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A package explicitly granted access to the committed blob, pinned to a
/// signing certificate.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageGrant {
    /// Package name of the grantee.
    pub package: String,
    /// Signing certificate the grantee must present.
    pub certificate: Vec<u8>,
}

/// Per-session grant set: public flag, same-signature flag, and an explicit
/// (package, certificate) allow-list.
///
/// All mutators are idempotent. Ownership and state gating live in
/// [`Session`](crate::session::Session): grants may only be changed or
/// queried while the session is opened, so a consumer that resolved access
/// before finalization can never observe a later grant change.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlList {
    public_access: bool,
    same_signature_access: bool,
    allowed_packages: HashSet<PackageGrant>,
}

impl AccessControlList {
    /// Create an empty grant set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant access to a package pinned to a signing certificate.
    ///
    /// Duplicate grants with identical arguments are no-ops.
    pub fn allow_package_access(&mut self, package: impl Into<String>, certificate: &[u8]) {
        self.allowed_packages.insert(PackageGrant {
            package: package.into(),
            certificate: certificate.to_vec(),
        });
    }

    /// Grant access to packages signed with the owner's certificate.
    pub fn allow_same_signature_access(&mut self) {
        self.same_signature_access = true;
    }

    /// Grant access to everyone.
    pub fn allow_public_access(&mut self) {
        self.public_access = true;
    }

    /// Whether the (package, certificate) pair has an explicit grant.
    pub fn is_package_access_allowed(&self, package: &str, certificate: &[u8]) -> bool {
        self.allowed_packages
            .iter()
            .any(|g| g.package == package && g.certificate == certificate)
    }

    /// Whether same-signature access is granted.
    pub fn is_same_signature_access_allowed(&self) -> bool {
        self.same_signature_access
    }

    /// Whether public access is granted.
    pub fn is_public_access_allowed(&self) -> bool {
        self.public_access
    }

    /// Number of explicit package grants.
    pub fn grant_count(&self) -> usize {
        self.allowed_packages.len()
    }
}
