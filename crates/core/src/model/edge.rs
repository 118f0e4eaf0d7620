//! Edges connect two nodes; directionality is derived from their layers.

use super::{EdgeId, NodeId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An edge between two nodes, living in the cell `(layer(v1), layer(v2))`.
///
/// `directed` is fixed at construction time to match
/// `directed(layer(v1), layer(v2))` (§3 invariant) — it is never mutated
/// independently of the layers it spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Stable, never-reused identifier.
    pub id: EdgeId,
    /// First endpoint (the source, for directed edges).
    pub v1: NodeId,
    /// Second endpoint (the target, for directed edges).
    pub v2: NodeId,
    /// Whether this edge is directed.
    pub directed: bool,
}

impl Edge {
    pub(crate) fn new(id: EdgeId, v1: NodeId, v2: NodeId, directed: bool) -> Self {
        Self { id, v1, v2, directed }
    }

    /// Whether this edge is a self-loop.
    pub fn is_self_loop(&self) -> bool {
        self.v1 == self.v2
    }

    /// The endpoint opposite `from`, if `from` is one of this edge's ends.
    pub fn other(&self, from: NodeId) -> Option<NodeId> {
        if from == self.v1 {
            Some(self.v2)
        } else if from == self.v2 {
            Some(self.v1)
        } else {
            None
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrow = if self.directed { "->" } else { "--" };
        write!(f, "Edge({}, {} {} {})", self.id, self.v1, arrow, self.v2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::IdCounter;

    fn ids() -> (NodeId, NodeId) {
        let mut c = IdCounter::default();
        (NodeId(c.next()), NodeId(c.next()))
    }

    #[test]
    fn other_returns_opposite_endpoint() {
        let (a, b) = ids();
        let e = Edge::new(crate::model::EdgeId(0), a, b, false);
        assert_eq!(e.other(a), Some(b));
        assert_eq!(e.other(b), Some(a));
    }

    #[test]
    fn self_loop_detected() {
        let (a, _b) = ids();
        let e = Edge::new(crate::model::EdgeId(0), a, a, false);
        assert!(e.is_self_loop());
    }
}
