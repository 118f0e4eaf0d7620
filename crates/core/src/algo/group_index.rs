//! The `group_index` fast-move structure (§9): O(1) node→group lookup and
//! O(1) node moves, used by GLouvain's local phase.

use indexmap::IndexSet;

/// Maps a fixed universe of `0..n` node indices to group ids, supporting
/// O(1) moves. Where `glouvain.h` backs `group_to_nodes` with a doubly
/// linked list, this uses an `IndexSet` per group — `swap_remove` gives
/// the same O(1) move at the cost of not preserving per-group iteration
/// order, which no caller here depends on.
#[derive(Debug, Clone)]
pub struct GroupIndex {
    node_to_group: Vec<usize>,
    group_members: Vec<IndexSet<usize>>,
}

impl GroupIndex {
    /// Every node starts in its own singleton group `0..n`.
    pub fn identity(n: usize) -> Self {
        let group_members = (0..n).map(|i| IndexSet::from_iter([i])).collect();
        Self { node_to_group: (0..n).collect(), group_members }
    }

    pub fn group_of(&self, node: usize) -> usize {
        self.node_to_group[node]
    }

    pub fn members(&self, group: usize) -> &IndexSet<usize> {
        &self.group_members[group]
    }

    /// Move `node` into `group`. No-op if already there.
    pub fn move_node(&mut self, node: usize, group: usize) {
        let old = self.node_to_group[node];
        if old == group {
            return;
        }
        self.group_members[old].swap_remove(&node);
        self.group_members[group].insert(node);
        self.node_to_group[node] = group;
    }

    /// Number of non-empty groups.
    pub fn num_groups(&self) -> usize {
        self.group_members.iter().filter(|m| !m.is_empty()).count()
    }

    /// Flat `node -> group` assignment vector.
    pub fn to_flat_vector(&self) -> Vec<usize> {
        self.node_to_group.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_starts_each_node_alone() {
        let gi = GroupIndex::identity(3);
        assert_eq!(gi.num_groups(), 3);
        assert_eq!(gi.group_of(0), 0);
    }

    #[test]
    fn move_is_reflected_both_ways() {
        let mut gi = GroupIndex::identity(3);
        gi.move_node(0, 1);
        assert_eq!(gi.group_of(0), 1);
        assert!(gi.members(1).contains(&0));
        assert!(!gi.members(0).contains(&0));
        assert_eq!(gi.num_groups(), 2);
    }
}
