//! Affinity groups - the clustering output

use std::collections::BTreeSet;
use std::fmt;

use crate::Identity;

/// A set of identities that predominantly touch the same objects
///
/// The id is the converged label of the run that produced the group. Labels
/// are not stable across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffinityGroup {
    id: u64,
    members: BTreeSet<Identity>,
}

impl AffinityGroup {
    pub fn new(id: u64, members: BTreeSet<Identity>) -> Self {
        Self { id, members }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Members in identity order
    pub fn members(&self) -> &BTreeSet<Identity> {
        &self.members
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.members.contains(identity)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl fmt::Display for AffinityGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group {}: [", self.id)?;
        for (i, member) in self.members.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", member)?;
        }
        f.write_str("]")
    }
}
