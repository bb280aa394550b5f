//! Identity types for the affinity pipeline
//!
//! Identities and object ids are opaque tokens supplied by collaborators.
//! The pipeline only compares, hashes and orders them.

use std::fmt;
use std::sync::Arc;

/// Session identity - the actor on whose behalf tasks run
///
/// Cloning is cheap; the name is shared. An empty name is the absent
/// sentinel and is rejected by every mutation path.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(Arc<str>);

impl Identity {
    #[inline]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Identity(name.into())
    }

    /// The identity's name
    #[inline]
    pub fn name(&self) -> &str {
        &self.0
    }

    /// True for the empty-name sentinel
    #[inline]
    pub fn is_absent(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.0)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(name: &str) -> Self {
        Identity::new(name)
    }
}

/// Shared data object identity
///
/// `ObjectId::ZERO` is reserved as the absent sentinel.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ObjectId(pub u64);

impl ObjectId {
    pub const ZERO: ObjectId = ObjectId(0);

    #[inline]
    pub fn new(id: u64) -> Self {
        ObjectId(id)
    }

    #[inline]
    pub fn is_absent(self) -> bool {
        self == Self::ZERO
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({:016x})", self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Remote node identity - a peer in the server farm
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodeId(pub u64);

impl NodeId {
    #[inline]
    pub fn new(id: u64) -> Self {
        NodeId(id)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
