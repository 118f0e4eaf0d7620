//! `MatrixBuilder`: projects a [`Network`] into the sparse matrices every
//! algorithm consumes (§4.2).

use super::sparse::{coo_to_csr, normalize_columns, total_sum, Sparse};
use crate::error::{Error, Result};
use crate::model::{ActorId, LayerId, Network};
use indexmap::IndexMap;
use nalgebra_sparse::CooMatrix;

/// Stable `(actor, layer)` index assignment used by every matrix this
/// builder produces. Actor `a` occupies row/column `a` within a layer
/// block; layer `ℓ`'s block starts at offset `ℓ * actor_count()` in a
/// supra matrix (the `ℓ * N + a` convention confirmed in `cutils.cpp`'s
/// `ng_modularity` and `glouvain.h`'s `metanet::supraK`).
#[derive(Debug, Clone)]
pub struct Index {
    actors: Vec<ActorId>,
    actor_pos: IndexMap<ActorId, usize>,
    layers: Vec<LayerId>,
    layer_pos: IndexMap<LayerId, usize>,
}

impl Index {
    pub fn build(net: &Network) -> Self {
        let actors: Vec<ActorId> = net.actors().map(|a| a.id).collect();
        let actor_pos: IndexMap<ActorId, usize> = actors.iter().enumerate().map(|(i, &a)| (a, i)).collect();
        let layers: Vec<LayerId> = net.layers().map(|l| l.id).collect();
        let layer_pos: IndexMap<LayerId, usize> = layers.iter().enumerate().map(|(i, &l)| (l, i)).collect();
        Self { actors, actor_pos, layers, layer_pos }
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn actor_index(&self, a: ActorId) -> Option<usize> {
        self.actor_pos.get(&a).copied()
    }

    pub fn layer_index(&self, l: LayerId) -> Option<usize> {
        self.layer_pos.get(&l).copied()
    }

    pub fn actor_at(&self, i: usize) -> ActorId {
        self.actors[i]
    }

    pub fn layer_at(&self, i: usize) -> LayerId {
        self.layers[i]
    }

    /// Supra-adjacency row/column for `(actor, layer)`.
    pub fn supra_index(&self, actor: usize, layer: usize) -> usize {
        layer * self.actor_count() + actor
    }
}

/// Constructs layer adjacency matrices, block-diagonal supra-adjacency,
/// and modularity matrices from a [`Network`] (§4.2).
pub struct MatrixBuilder;

impl MatrixBuilder {
    /// `L` square `N×N` matrices (`N` = actor count), one per layer in
    /// layer-insertion order. Entry `(i,j)` is `1` iff an edge exists
    /// between `node(actor_i, ℓ)` and `node(actor_j, ℓ)`; undirected edges
    /// fill both entries. Missing nodes yield all-zero rows/columns.
    pub fn per_layer_adjacency(net: &Network) -> Result<(Vec<Sparse>, Index)> {
        let idx = Index::build(net);
        let n = idx.actor_count();
        let mut mats = Vec::with_capacity(idx.layer_count());
        for &layer in &idx.layers {
            let mut coo = CooMatrix::new(n, n);
            if let Some(edge_ids) = net.edges_in_cell(layer, layer) {
                for &eid in edge_ids {
                    let edge = net.edge(eid).expect("edge id from cell index must resolve");
                    let (Some(a1), Some(a2)) = (net.node(edge.v1), net.node(edge.v2)) else {
                        continue;
                    };
                    let (Some(i), Some(j)) = (idx.actor_index(a1.actor), idx.actor_index(a2.actor)) else {
                        continue;
                    };
                    coo.push(i, j, 1.0);
                    if !edge.directed {
                        coo.push(j, i, 1.0);
                    }
                }
            }
            mats.push(coo_to_csr(coo));
        }
        Ok((mats, idx))
    }

    /// Single `(NL × NL)` block-diagonal supra-adjacency: per-layer
    /// adjacencies on the diagonal blocks, constant inter-layer coupling
    /// `ω` (plus optional `ε` mass) on the off-diagonal `(actor, actor)`
    /// cells for every pair of distinct layers. If `normalize_columns` is
    /// set, the result is column-stochastic (a transition matrix).
    pub fn supra_adjacency(
        net: &Network,
        inter_layer_weight: f64,
        add_eps: f64,
        normalize_cols: bool,
    ) -> Result<(Sparse, Index)> {
        if inter_layer_weight < 0.0 {
            return Err(Error::InvalidArgument("inter_layer_weight must be >= 0".into()));
        }
        let (layers, idx) = Self::per_layer_adjacency(net)?;
        let n = idx.actor_count();
        let l = idx.layer_count();
        let size = n * l;
        let mut coo = CooMatrix::new(size, size);

        for (li, mat) in layers.iter().enumerate() {
            for (r, c, v) in mat.triplet_iter() {
                coo.push(idx.supra_index(r, li), idx.supra_index(c, li), v);
            }
        }

        let coupling = inter_layer_weight + add_eps;
        if coupling != 0.0 {
            for a in 0..n {
                for l1 in 0..l {
                    for l2 in 0..l {
                        if l1 != l2 {
                            coo.push(idx.supra_index(a, l2), idx.supra_index(a, l1), coupling);
                        }
                    }
                }
            }
        }

        let csr = coo_to_csr(coo);
        let result = if normalize_cols { normalize_columns(&csr) } else { csr };
        Ok((result, idx))
    }

    /// `(NL × NL)` modularity matrix `B`, with the Newman–Girvan form per
    /// intra-layer block, `(A_ℓ + A_ℓᵀ)/2 − γ(k_ℓ k_ℓᵀ)/(2m_ℓ)`, plus
    /// constant `ω` on each inter-layer `(actor, actor)` pair. Returns
    /// `(B, 2μ)` where `2μ = Σ_ℓ 2m_ℓ + N·L·(L−1)·ω`.
    ///
    /// This materializes the full matrix, including the dense
    /// `k_ℓ k_ℓᵀ` null-model term — intended for meta-networks collapsed
    /// by GLouvain, not for the original network at scale (§4.3's
    /// on-the-fly mode exists precisely to avoid this cost).
    pub fn modularity_matrix(net: &Network, gamma: f64, omega: f64) -> Result<(Sparse, f64, Index)> {
        if gamma < 0.0 {
            return Err(Error::InvalidArgument("gamma must be >= 0".into()));
        }
        let (layers, idx) = Self::per_layer_adjacency(net)?;
        let n = idx.actor_count();
        let l = idx.layer_count();
        let size = n * l;
        let mut coo = CooMatrix::new(size, size);
        let mut two_mu = 0.0f64;

        for (li, mat) in layers.iter().enumerate() {
            let two_m = total_sum(mat);
            two_mu += two_m;
            let mut k = vec![0.0f64; n];
            for (r, c, v) in mat.triplet_iter() {
                let _ = c;
                k[r] += v;
            }
            if two_m > 0.0 {
                let sym: Vec<(usize, usize, f64)> = mat.triplet_iter().map(|(r, c, v)| (r, c, *v)).collect();
                let mut dense_sym = vec![vec![0.0f64; n]; n];
                for (r, c, v) in sym {
                    dense_sym[r][c] += v / 2.0;
                    dense_sym[c][r] += v / 2.0;
                }
                for i in 0..n {
                    for j in 0..n {
                        let null_model = gamma * k[i] * k[j] / two_m;
                        let b = dense_sym[i][j] - null_model;
                        if b != 0.0 {
                            coo.push(idx.supra_index(i, li), idx.supra_index(j, li), b);
                        }
                    }
                }
            }
        }

        if omega != 0.0 {
            for a in 0..n {
                for l1 in 0..l {
                    for l2 in 0..l {
                        if l1 != l2 {
                            coo.push(idx.supra_index(a, l2), idx.supra_index(a, l1), omega);
                        }
                    }
                }
            }
            two_mu += (n * l * l.saturating_sub(1)) as f64 * omega;
        }

        Ok((coo_to_csr(coo), two_mu, idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::sparse::is_symmetric;

    fn two_undirected_layers() -> Network {
        let mut net = Network::new();
        let l1 = net.add_layer("l1", false);
        let l2 = net.add_layer("l2", false);
        let a = net.add_actor("A");
        let b = net.add_actor("B");
        let c = net.add_actor("C");
        for l in [l1, l2] {
            let na = net.add_node(a, l).unwrap();
            let nb = net.add_node(b, l).unwrap();
            let nc = net.add_node(c, l).unwrap();
            net.add_edge(na, nb).unwrap();
            net.add_edge(nb, nc).unwrap();
        }
        net
    }

    #[test]
    fn per_layer_adjacency_matches_supra_diagonal_blocks() {
        let net = two_undirected_layers();
        let (layers, idx) = MatrixBuilder::per_layer_adjacency(&net).unwrap();
        let (supra, _) = MatrixBuilder::supra_adjacency(&net, 0.0, 0.0, false).unwrap();
        let n = idx.actor_count();
        for (li, layer) in layers.iter().enumerate() {
            for (r, c, v) in layer.triplet_iter() {
                let sr = idx.supra_index(r, li);
                let sc = idx.supra_index(c, li);
                let found: f64 = supra.triplet_iter().filter(|(a, b, _)| *a == sr && *b == sc).map(|(_, _, v)| *v).sum();
                assert!((found - v).abs() < 1e-12, "mismatch at layer {li} ({r},{c})");
            }
        }
        let _ = n;
    }

    #[test]
    fn supra_adjacency_symmetric_when_layers_undirected() {
        let net = two_undirected_layers();
        let (supra, _) = MatrixBuilder::supra_adjacency(&net, 0.5, 0.0, false).unwrap();
        assert!(is_symmetric(&supra, 1e-12));
    }

    #[test]
    fn modularity_matrix_rejects_negative_gamma() {
        let net = two_undirected_layers();
        assert!(MatrixBuilder::modularity_matrix(&net, -1.0, 0.0).is_err());
    }

    #[test]
    fn modularity_two_mu_includes_inter_layer_term() {
        let net = two_undirected_layers();
        let (_, two_mu_zero, idx) = MatrixBuilder::modularity_matrix(&net, 1.0, 0.0).unwrap();
        let (_, two_mu_omega, _) = MatrixBuilder::modularity_matrix(&net, 1.0, 1.0).unwrap();
        let n = idx.actor_count();
        let l = idx.layer_count();
        let expected_extra = (n * l * (l - 1)) as f64;
        assert!((two_mu_omega - two_mu_zero - expected_extra).abs() < 1e-9);
    }
}
