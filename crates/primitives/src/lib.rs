//! Identity primitives for peers discovered over the proximity channel.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Stable identity token for one discovered peer.
///
/// Wraps whatever token the discovery channel hands out for a node. Equality
/// and hashing are defined by the token value, never by handle identity, so
/// the same peer compares equal across separate enumerations.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", self.0)
    }
}

impl From<&str> for PeerId {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for PeerId {
    fn from(token: String) -> Self {
        Self::new(token)
    }
}

/// Descriptor for one visible peer: identity plus the presentation data the
/// discovery channel reported alongside it.
///
/// Policy hooks receive this, not the raw id, so they can decide on the
/// human-readable name. Equality and hashing delegate to the id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Peer {
    id: PeerId,
    display_name: String,
}

impl Peer {
    pub fn new(id: impl Into<PeerId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    pub fn id(&self) -> &PeerId {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl PartialEq for Peer {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Peer {}

impl Hash for Peer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_peer_id_value_equality() {
        let a = PeerId::new("node-1");
        let b = PeerId::from("node-1");
        let c = PeerId::new("node-2");

        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&c));
    }

    #[test]
    fn test_peer_equality_ignores_display_name() {
        let a = Peer::new("node-1", "Alice's Laptop");
        let b = Peer::new("node-1", "Renamed Laptop");
        let c = Peer::new("node-2", "Alice's Laptop");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_peer_id_display() {
        let id = PeerId::new("node-1");
        assert_eq!(id.to_string(), "node-1");
        assert_eq!(format!("{id:?}"), "PeerId(node-1)");
    }
}
