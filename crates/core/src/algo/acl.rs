//! ACL: approximate personalized PageRank (push-style) + sweep-cut
//! conductance minimization, seeded from a single actor (§4.6).
//!
//! Grounded on the push algorithm of Andersen–Chung–Lang, generalized to
//! the supra-graph the same way GLouvain and LART are: the random walk
//! runs over `supra_adjacency`'s raw weights
//! (`crate::matrix::MatrixBuilder::supra_adjacency`), and the sweep cut
//! scans cumulative conductance incrementally off a precomputed adjacency
//! list (a CSR-triplet grouping), adding or removing each newly-visited
//! node's incident weight from the running cut in O(degree) per step.

use crate::error::{Error, Result};
use crate::matrix::{col_sums, MatrixBuilder};
use crate::model::{ActorId, Community, Network};
use crate::worker::Convergence;
use std::collections::VecDeque;

/// Hyperparameters for [`Acl::run`] (§4.6).
#[derive(Debug, Clone, Copy)]
pub struct AclParams {
    /// Teleport (restart) probability `α`.
    pub alpha: f64,
    /// Push tolerance `ε`: a node's residual below `ε * degree` is no
    /// longer pushed.
    pub epsilon: f64,
    pub omega: f64,
    pub max_pushes: u64,
}

impl Default for AclParams {
    fn default() -> Self {
        Self { alpha: 0.15, epsilon: 1e-6, omega: 1.0, max_pushes: 100_000 }
    }
}

impl AclParams {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(Error::InvalidArgument("alpha must be in [0, 1]".into()));
        }
        if self.epsilon <= 0.0 {
            return Err(Error::InvalidArgument("epsilon must be > 0".into()));
        }
        if self.omega < 0.0 {
            return Err(Error::InvalidArgument("omega must be >= 0".into()));
        }
        if self.max_pushes == 0 {
            return Err(Error::InvalidArgument("max_pushes must be >= 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AclResult {
    pub community: Community,
    /// Conductance of the returned cut (lower is better; 0 for a network
    /// with a single connected component partitioned trivially).
    pub conductance: f64,
    pub convergence: Convergence,
}

pub struct Acl;

impl Acl {
    /// Grows a local community around `seed_actor` (§4.6).
    pub fn run(net: &Network, seed_actor: ActorId, params: &AclParams) -> Result<AclResult> {
        params.validate()?;
        if net.actor(seed_actor).is_none() {
            return Err(Error::NotFound(format!("actor {seed_actor}")));
        }

        let (supra, idx) = MatrixBuilder::supra_adjacency(net, params.omega, 0.0, false)?;
        let n = idx.actor_count() * idx.layer_count();
        if n == 0 {
            return Ok(AclResult {
                community: Community::new(),
                conductance: 0.0,
                convergence: Convergence::converged(0),
            });
        }
        let degree = col_sums(&supra);
        let total_degree: f64 = degree.iter().sum();

        let Some(ai) = idx.actor_index(seed_actor) else {
            return Err(Error::NotFound(format!("actor {seed_actor}")));
        };
        // Seed mass on every layer-instance of the actor, split evenly —
        // an actor-level seed generalized across the actor's supra-nodes.
        let instances: Vec<usize> = (0..idx.layer_count())
            .filter_map(|li| net.node_of(seed_actor, idx.layer_at(li)).map(|_| li * idx.actor_count() + ai))
            .collect();
        if instances.is_empty() {
            return Ok(AclResult {
                community: Community::new(),
                conductance: 0.0,
                convergence: Convergence::converged(0),
            });
        }
        let seed_mass = 1.0 / instances.len() as f64;

        // Push-style approximate personalized PageRank (Andersen–Chung–Lang).
        let mut p = vec![0.0f64; n];
        let mut r = vec![0.0f64; n];
        for &s in &instances {
            r[s] = seed_mass;
        }

        let adjacency_rows: Vec<Vec<(usize, f64)>> = {
            let mut rows = vec![Vec::new(); n];
            for (row, col, v) in supra.triplet_iter() {
                rows[row].push((col, v));
            }
            rows
        };

        let mut queue: VecDeque<usize> = instances
            .iter()
            .copied()
            .filter(|&s| degree[s] > 0.0 && r[s] > params.epsilon * degree[s])
            .collect();
        let mut in_queue = vec![false; n];
        for &s in &queue {
            in_queue[s] = true;
        }

        let mut pushes = 0u64;
        let mut converged = true;
        while let Some(u) = queue.pop_front() {
            in_queue[u] = false;
            if degree[u] == 0.0 || r[u] <= params.epsilon * degree[u] {
                continue;
            }
            pushes += 1;
            if pushes > params.max_pushes {
                converged = false;
                break;
            }
            let push_amount = r[u];
            p[u] += params.alpha * push_amount;
            let residual_share = (1.0 - params.alpha) * push_amount;
            r[u] = 0.0;

            for &(v, weight) in &adjacency_rows[u] {
                if weight == 0.0 {
                    continue;
                }
                let out_weight = weight / degree[u];
                r[v] += residual_share * out_weight;
                if degree[v] > 0.0 && r[v] > params.epsilon * degree[v] && !in_queue[v] {
                    queue.push_back(v);
                    in_queue[v] = true;
                }
            }
        }

        // Sweep cut: sort supra-nodes by p[i]/degree[i] descending, scan
        // prefixes, keep the prefix minimizing conductance.
        let mut order: Vec<usize> = (0..n).filter(|&i| degree[i] > 0.0).collect();
        order.sort_by(|&a, &b| {
            let sa = p[a] / degree[a];
            let sb = p[b] / degree[b];
            sb.partial_cmp(&sa).unwrap()
        });

        let mut in_set = vec![false; n];
        let mut vol = 0.0f64;
        let mut cut = 0.0f64;
        let mut best_conductance = f64::INFINITY;
        let mut best_len = 0usize;

        for (i, &node) in order.iter().enumerate() {
            vol += degree[node];
            for &(v, weight) in &adjacency_rows[node] {
                if in_set[v] {
                    cut -= weight;
                } else {
                    cut += weight;
                }
            }
            in_set[node] = true;
            let other_vol = total_degree - vol;
            let denom = vol.min(other_vol);
            if denom > 0.0 {
                let conductance = cut / denom;
                if conductance < best_conductance {
                    best_conductance = conductance;
                    best_len = i + 1;
                }
            }
        }

        if best_len == 0 {
            best_len = order.len().min(1);
            best_conductance = 0.0;
        }

        let mut community = Community::new();
        for &s in &order[..best_len] {
            let actor = idx.actor_at(s % idx.actor_count());
            let layer = idx.layer_at(s / idx.actor_count());
            if let Some(nid) = net.node_of(actor, layer) {
                community.insert(nid);
            }
        }

        let convergence = if converged { Convergence::converged(pushes) } else { Convergence::capped(pushes) };
        Ok(AclResult { community, conductance: best_conductance, convergence })
    }
}
