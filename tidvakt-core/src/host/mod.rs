//! ## tidvakt-core::host
//! **Identity-keyed host handles**
//!
//! Hosts are owned by the engine; the scheduler only ever holds cheap
//! cloneable handles and keys its maps by handle identity. Two handles are
//! equal iff they refer to the same host allocation, regardless of name.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A simulated endpoint: the unit of event-processing locality.
///
/// The name exists for diagnostics only and takes no part in equality.
#[derive(Debug)]
pub struct Host {
    name: String,
}

impl Host {
    /// Create a host and return a handle to it.
    pub fn new(name: impl Into<String>) -> HostRef {
        HostRef(Arc::new(Host { name: name.into() }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Cheap cloneable handle to a [`Host`]. Equality and hash are by identity.
#[derive(Debug, Clone)]
pub struct HostRef(Arc<Host>);

impl HostRef {
    pub fn name(&self) -> &str {
        self.0.name()
    }
}

impl PartialEq for HostRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for HostRef {}

impl Hash for HostRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl std::fmt::Display for HostRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn equality_is_by_identity_not_name() {
        let a = Host::new("node");
        let b = Host::new("node");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn usable_as_map_key() {
        let a = Host::new("a");
        let b = Host::new("b");
        let mut map = HashMap::new();
        map.insert(a.clone(), 1u32);
        map.insert(b.clone(), 2u32);
        assert_eq!(map[&a], 1);
        assert_eq!(map[&b.clone()], 2);
    }
}
