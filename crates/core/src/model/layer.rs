//! Layers: independent relational contexts, each with its own edge set.

use super::LayerId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An independent relational context with its own edge set and
/// directionality.
///
/// `directed` governs intra-layer edges (both endpoints in this layer).
/// Directionality between two *different* layers is derived from both
/// layers' flags by [`crate::model::Network::directed_between`] — see its
/// doc comment for the exact rule, which is this crate's resolution of
/// spec §3's "per-pair directionality flag" for the inter-layer case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    /// Stable, never-reused identifier.
    pub id: LayerId,
    /// Display name, unique within the owning network.
    pub name: String,
    /// Whether intra-layer edges are directed.
    pub directed: bool,
}

impl Layer {
    pub(crate) fn new(id: LayerId, name: impl Into<String>, directed: bool) -> Self {
        Self { id, name: name.into(), directed }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = if self.directed { "directed" } else { "undirected" };
        write!(f, "Layer({}, {}, {})", self.id, self.name, d)
    }
}
