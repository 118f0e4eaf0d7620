//! Standard and extended (overlapping) multilayer modularity (§4.8).

use crate::error::{Error, Result};
use crate::matrix::{total_sum, MatrixBuilder};
use crate::model::{CommunityStructure, Network, NodeId};
use std::collections::HashMap;

/// How to combine a node's membership shares across the communities it
/// belongs to, when computing an extended-modularity belonging
/// coefficient (§4.8, §9).
///
/// `Sum` is deliberately left unnormalized: an actor present (via its
/// per-layer node instances) in several communities can accumulate
/// `β` values that sum past `1` across those communities. This mirrors
/// an ambiguity already flagged in the source material and is kept
/// unnormalized on purpose rather than silently clamped (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BelongingCombinator {
    Multiply,
    Sum,
    Average,
    Max,
}

impl BelongingCombinator {
    fn combine(self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        match self {
            BelongingCombinator::Sum => values.iter().sum(),
            BelongingCombinator::Average => values.iter().sum::<f64>() / values.len() as f64,
            BelongingCombinator::Max => values.iter().cloned().fold(f64::MIN, f64::max),
            BelongingCombinator::Multiply => values.iter().product(),
        }
    }
}

/// Multilayer modularity and its overlapping ("extended") generalization.
pub struct Modularity;

impl Modularity {
    /// Standard Newman–Girvan multilayer modularity (§4.8), evaluated over
    /// a (possibly overlapping) `CommunityStructure` by assigning each node
    /// to the first community containing it (ties with overlapping
    /// structures are broken by community order; use
    /// [`Modularity::extended_modularity`] to weight every membership).
    pub fn modularity(net: &Network, cs: &CommunityStructure, gamma: f64, omega: f64) -> Result<f64> {
        if gamma < 0.0 {
            return Err(Error::InvalidArgument("gamma must be >= 0".into()));
        }
        let (layers, idx) = MatrixBuilder::per_layer_adjacency(net)?;
        let n = idx.actor_count();
        let l = idx.layer_count();
        if n == 0 || l == 0 {
            return Ok(0.0);
        }

        let node_community: HashMap<NodeId, usize> = {
            let mut map = HashMap::new();
            for (ci, community) in cs.iter().enumerate() {
                for node in community.nodes() {
                    map.entry(node).or_insert(ci);
                }
            }
            map
        };

        let mut two_mu = 0.0f64;
        let mut acc = 0.0f64;

        for (li, mat) in layers.iter().enumerate() {
            let two_m = total_sum(mat);
            two_mu += two_m;
            if two_m == 0.0 {
                continue;
            }
            let layer_id = idx.layer_at(li);
            let mut k = vec![0.0f64; n];
            for (r, _c, v) in mat.triplet_iter() {
                k[r] += v;
            }

            let mut edge_sum: HashMap<usize, f64> = HashMap::new();
            let mut k_sum: HashMap<usize, f64> = HashMap::new();
            for a in 0..n {
                if let Some(node) = net.node_of(idx.actor_at(a), layer_id) {
                    if let Some(&ci) = node_community.get(&node) {
                        *k_sum.entry(ci).or_insert(0.0) += k[a];
                    }
                }
            }
            for (r, c, v) in mat.triplet_iter() {
                let nr = net.node_of(idx.actor_at(r), layer_id);
                let nc = net.node_of(idx.actor_at(c), layer_id);
                if let (Some(nr), Some(nc)) = (nr, nc) {
                    if let (Some(&cr), Some(&cc)) = (node_community.get(&nr), node_community.get(&nc)) {
                        if cr == cc {
                            *edge_sum.entry(cr).or_insert(0.0) += v;
                        }
                    }
                }
            }
            // Every community with at least one member in this layer
            // contributes its null-model penalty, even communities with
            // zero intra-community edges here (the all-singletons
            // partition in particular): defaulting `edge_sum` to 0.0
            // keeps `-gamma*k^2/2m` from being silently dropped.
            for (ci, ksum) in &k_sum {
                let e = edge_sum.get(ci).copied().unwrap_or(0.0);
                acc += e - gamma * ksum * ksum / two_m;
            }
        }

        if omega != 0.0 && l > 1 {
            for actor in net.actors().map(|a| a.id) {
                for li1 in 0..l {
                    for li2 in 0..l {
                        if li1 == li2 {
                            continue;
                        }
                        let l1 = idx.layer_at(li1);
                        let l2 = idx.layer_at(li2);
                        if let (Some(n1), Some(n2)) = (net.node_of(actor, l1), net.node_of(actor, l2)) {
                            if let (Some(&c1), Some(&c2)) = (node_community.get(&n1), node_community.get(&n2)) {
                                if c1 == c2 {
                                    acc += omega;
                                }
                            }
                        }
                    }
                }
            }
            two_mu += (n * l * (l - 1)) as f64 * omega;
        }

        if two_mu == 0.0 {
            return Ok(0.0);
        }
        Ok(acc / two_mu)
    }

    /// Belonging coefficient `β(node, community)`: the node's actor has
    /// possibly several per-layer instances inside `community`, and this
    /// combines their equal-share weights (`1 / multiplicity`) with
    /// `combinator`.
    pub fn belonging(
        net: &Network,
        cs: &CommunityStructure,
        node: NodeId,
        community_idx: usize,
        combinator: BelongingCombinator,
    ) -> f64 {
        let Some(community) = cs.get(community_idx) else {
            return 0.0;
        };
        let Some(n) = net.node(node) else {
            return 0.0;
        };
        let Some(actor_nodes) = net.nodes_of_actor(n.actor) else {
            return 0.0;
        };
        let weights: Vec<f64> = actor_nodes
            .iter()
            .filter(|&&an| community.contains(an))
            .map(|&an| 1.0 / cs.multiplicity(an).max(1) as f64)
            .collect();
        combinator.combine(&weights)
    }

    /// Extended modularity for overlapping community structures (§4.8):
    /// ordered node pairs are weighted by `β(u,C)·β(v,C)`, summed over
    /// every community `C`.
    pub fn extended_modularity(
        net: &Network,
        cs: &CommunityStructure,
        gamma: f64,
        omega: f64,
        combinator: BelongingCombinator,
    ) -> Result<f64> {
        if gamma < 0.0 {
            return Err(Error::InvalidArgument("gamma must be >= 0".into()));
        }
        let (layers, idx) = MatrixBuilder::per_layer_adjacency(net)?;
        let n = idx.actor_count();
        let l = idx.layer_count();
        if n == 0 || l == 0 || cs.is_empty() {
            return Ok(0.0);
        }

        let mut two_mu = 0.0f64;
        let mut acc = 0.0f64;

        for (li, mat) in layers.iter().enumerate() {
            let two_m = total_sum(mat);
            two_mu += two_m;
            if two_m == 0.0 {
                continue;
            }
            let layer_id = idx.layer_at(li);
            let mut k = vec![0.0f64; n];
            for (r, _c, v) in mat.triplet_iter() {
                k[r] += v;
            }

            for ci in 0..cs.len() {
                let beta: Vec<f64> = (0..n)
                    .map(|a| match net.node_of(idx.actor_at(a), layer_id) {
                        Some(node) => Self::belonging(net, cs, node, ci, combinator),
                        None => 0.0,
                    })
                    .collect();
                if beta.iter().all(|&b| b == 0.0) {
                    continue;
                }
                let mut edge_term = 0.0f64;
                for (r, c, v) in mat.triplet_iter() {
                    edge_term += beta[r] * beta[c] * v;
                }
                let weighted_k: f64 = (0..n).map(|a| beta[a] * k[a]).sum();
                acc += edge_term - gamma * weighted_k * weighted_k / two_m;
            }
        }

        if omega != 0.0 && l > 1 {
            for actor in net.actors().map(|a| a.id) {
                for li1 in 0..l {
                    for li2 in 0..l {
                        if li1 == li2 {
                            continue;
                        }
                        let l1 = idx.layer_at(li1);
                        let l2 = idx.layer_at(li2);
                        if let (Some(n1), Some(n2)) = (net.node_of(actor, l1), net.node_of(actor, l2)) {
                            for ci in 0..cs.len() {
                                let b1 = Self::belonging(net, cs, n1, ci, combinator);
                                let b2 = Self::belonging(net, cs, n2, ci, combinator);
                                acc += omega * b1 * b2;
                            }
                        }
                    }
                }
            }
            two_mu += (n * l * (l - 1)) as f64 * omega;
        }

        if two_mu == 0.0 {
            return Ok(0.0);
        }
        Ok(acc / two_mu)
    }
}
