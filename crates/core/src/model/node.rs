//! A node is an (actor, layer) incidence — the unit edges connect.

use super::{ActorId, LayerId, NodeId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single (actor, layer) pair. Unique per pair within a network (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Stable, never-reused identifier.
    pub id: NodeId,
    /// The actor this node incarnates.
    pub actor: ActorId,
    /// The layer this node belongs to.
    pub layer: LayerId,
}

impl Node {
    pub(crate) fn new(id: NodeId, actor: ActorId, layer: LayerId) -> Self {
        Self { id, actor, layer }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({}, actor={}, layer={})", self.id, self.actor, self.layer)
    }
}
