//! Actors: the logical identities that recur across layers.

use super::ActorId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A logical identity appearing in zero or more layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Stable, never-reused identifier.
    pub id: ActorId,
    /// Display name, unique within the owning network.
    pub name: String,
}

impl Actor {
    pub(crate) fn new(id: ActorId, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Actor({}, {})", self.id, self.name)
    }
}
