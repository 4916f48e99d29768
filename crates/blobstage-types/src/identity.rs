use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique numeric identifier for a staging session.
///
/// Allocated by the external session table; the core never mints these
/// itself.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(u64);

impl SessionId {
    /// Wrap a raw session number.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw session number.
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session:{}", self.0)
    }
}

/// Authenticated caller identity: uid plus package name.
///
/// A `Principal` is recorded once at session creation as the owner. Every
/// mutating or access-mode-querying call is checked against it; both fields
/// must match. The transport layer supplies the caller identity with each
/// call -- the core never derives identity itself.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    uid: u32,
    package: String,
}

impl Principal {
    /// Create a principal from a uid and package name.
    pub fn new(uid: u32, package: impl Into<String>) -> Self {
        Self {
            uid,
            package: package.into(),
        }
    }

    /// The caller's uid.
    pub fn uid(&self) -> u32 {
        self.uid
    }

    /// The caller's package name.
    pub fn package(&self) -> &str {
        &self.package
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.uid, self.package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_roundtrip() {
        let id = SessionId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(format!("{id}"), "session:42");
    }

    #[test]
    fn session_ids_are_ordered() {
        assert!(SessionId::new(1) < SessionId::new(2));
    }

    #[test]
    fn principal_equality_requires_both_fields() {
        let owner = Principal::new(1000, "com.example.app");
        assert_eq!(owner, Principal::new(1000, "com.example.app"));
        assert_ne!(owner, Principal::new(1001, "com.example.app"));
        assert_ne!(owner, Principal::new(1000, "com.example.other"));
    }

    #[test]
    fn principal_accessors() {
        let p = Principal::new(2000, "com.example.app");
        assert_eq!(p.uid(), 2000);
        assert_eq!(p.package(), "com.example.app");
        assert_eq!(format!("{p}"), "2000/com.example.app");
    }

    #[test]
    fn serde_roundtrip() {
        let p = Principal::new(1000, "com.example.app");
        let json = serde_json::to_string(&p).unwrap();
        let parsed: Principal = serde_json::from_str(&json).unwrap();
        assert_eq!(p, parsed);

        let id = SessionId::new(7);
        let json = serde_json::to_string(&id).unwrap();
        let parsed: SessionId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }
}
