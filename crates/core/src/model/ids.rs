//! Identifier newtypes for every entity kind in the network.
//!
//! All four identifier kinds are thin wrappers over a monotonically
//! increasing counter (§3: "Identifiers are monotonically increasing and
//! never reused, even after erasure"). They carry no name or other
//! payload — names live on [`crate::model::Actor`] / [`crate::model::Layer`]
//! themselves — mirroring `multiplenetwork`'s `object_id` / `actor_id` /
//! `layer_id` / `node_id` / `edge_id` typedefs over a generic integer id.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub(crate) u64);

        impl $name {
            /// Raw integer value of this identifier.
            pub fn index(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

entity_id!(ActorId, "Unique, never-reused identifier for an [`Actor`](crate::model::Actor).");
entity_id!(LayerId, "Unique, never-reused identifier for a [`Layer`](crate::model::Layer).");
entity_id!(NodeId, "Unique, never-reused identifier for a [`Node`](crate::model::Node).");
entity_id!(EdgeId, "Unique, never-reused identifier for an [`Edge`](crate::model::Edge).");

/// Monotonically increasing id generator for one entity kind.
///
/// Erasing an entity never recycles its id (§3 invariant), so this is a
/// bare counter rather than a free-list.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub(crate) struct IdCounter(u64);

impl IdCounter {
    pub(crate) fn next(&mut self) -> u64 {
        let id = self.0;
        self.0 += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_never_repeats() {
        let mut c = IdCounter::default();
        let ids: Vec<u64> = (0..5).map(|_| c.next()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn id_display_includes_kind() {
        let id = ActorId(3);
        assert_eq!(format!("{id}"), "ActorId(3)");
    }
}
