//! Communities: the output of every detection algorithm.

use super::{ActorId, Network, NodeId};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// A set of nodes reported by a detection algorithm.
///
/// Never empty once construction is finalized (§3 invariant) — algorithms
/// are responsible for not emitting empty communities; this type itself
/// does not enforce it so that callers can build one up incrementally.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Community {
    nodes: IndexSet<NodeId>,
}

impl Community {
    /// An empty community (use [`CommunityBuilder`]-style insertion to
    /// populate it before handing it to a [`CommunityStructure`]).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a community from an explicit node set.
    pub fn from_nodes(nodes: impl IntoIterator<Item = NodeId>) -> Self {
        Self { nodes: nodes.into_iter().collect() }
    }

    /// Every node (across every actor's instance across layers) belonging
    /// to `actors` in `net`. Used by algorithms that detect communities at
    /// actor granularity (PMM, Abacus) and need to project back to nodes.
    pub fn from_actors_across_layers(net: &Network, actors: impl IntoIterator<Item = ActorId>) -> Self {
        let mut nodes = IndexSet::new();
        for actor in actors {
            if let Some(ns) = net.nodes_of_actor(actor) {
                nodes.extend(ns.iter().copied());
            }
        }
        Self { nodes }
    }

    pub fn insert(&mut self, node: NodeId) -> bool {
        self.nodes.insert(node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    /// Distinct actors represented in this community.
    pub fn actors(&self, net: &Network) -> IndexSet<ActorId> {
        self.nodes
            .iter()
            .filter_map(|n| net.node(*n).map(|node| node.actor))
            .collect()
    }
}

/// An ordered sequence of communities returned by an algorithm.
///
/// Duplicates are tolerated (§3) but the algorithms specified in this
/// crate never produce them. Communities may overlap.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommunityStructure {
    communities: Vec<Community>,
}

impl CommunityStructure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_communities(communities: Vec<Community>) -> Self {
        Self { communities }
    }

    pub fn push(&mut self, community: Community) {
        if !community.is_empty() {
            self.communities.push(community);
        }
    }

    pub fn len(&self) -> usize {
        self.communities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.communities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Community> {
        self.communities.iter()
    }

    pub fn get(&self, i: usize) -> Option<&Community> {
        self.communities.get(i)
    }

    /// The community index (if any) each node belongs to, taking the
    /// first match for overlapping structures. Used by the non-overlapping
    /// form of modularity.
    pub fn community_of(&self, node: NodeId) -> Option<usize> {
        self.communities.iter().position(|c| c.contains(node))
    }

    /// How many communities each node belongs to (its "membership
    /// multiplicity"), the basis for extended modularity's belonging
    /// coefficients (§C, §4.8).
    pub fn multiplicity(&self, node: NodeId) -> usize {
        self.communities.iter().filter(|c| c.contains(node)).count()
    }

    /// Pairwise actor-overlap counts between communities: entry `(i, j)` is
    /// the number of actors shared by community `i` and community `j`
    /// (§C). The diagonal holds each community's actor count.
    pub fn overlap_matrix(&self, net: &Network) -> Vec<Vec<usize>> {
        let actor_sets: Vec<IndexSet<ActorId>> = self.communities.iter().map(|c| c.actors(net)).collect();
        let n = actor_sets.len();
        let mut m = vec![vec![0usize; n]; n];
        for i in 0..n {
            for j in 0..n {
                m[i][j] = actor_sets[i].intersection(&actor_sets[j]).count();
            }
        }
        m
    }
}

impl<'a> IntoIterator for &'a CommunityStructure {
    type Item = &'a Community;
    type IntoIter = std::slice::Iter<'a, Community>;

    fn into_iter(self) -> Self::IntoIter {
        self.communities.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplicity_counts_overlaps() {
        let mut cs = CommunityStructure::new();
        let n0 = NodeId(0);
        let n1 = NodeId(1);
        cs.push(Community::from_nodes([n0, n1]));
        cs.push(Community::from_nodes([n0]));
        assert_eq!(cs.multiplicity(n0), 2);
        assert_eq!(cs.multiplicity(n1), 1);
    }

    #[test]
    fn empty_community_not_pushed() {
        let mut cs = CommunityStructure::new();
        cs.push(Community::new());
        assert!(cs.is_empty());
    }
}
