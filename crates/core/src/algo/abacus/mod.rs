//! ABACUS: frequent closed-itemset ensemble over per-layer communities
//! (§4.7).
//!
//! Grounded on `abacus.h`'s `eclat_merge`/`abacus` driver: detect
//! communities independently in each layer, turn every actor into a
//! transaction of the `(layer, community)` labels it picked up, and mine
//! *closed* itemsets of at least `min_support` items **supported by** at
//! least `min_support` actors — `eclat_merge`'s `min_support` argument is
//! an Eclat frequency threshold, not just a size bound, so both sides of
//! the filter use it. Each closed itemset becomes one (possibly
//! overlapping) community: every actor whose transaction is a superset
//! of the itemset.
//!
//! The two mining backends ([`bitmap16::Bitmap16Miner`] for ≤16 distinct
//! items, [`eclat::EclatMiner`] above that) share one
//! [`ClosedItemsetMiner`] trait so a test can assert they agree on small
//! instances (§9: "Both paths must return identical results").

mod bitmap16;
mod eclat;

pub use bitmap16::Bitmap16Miner;
pub use eclat::EclatMiner;

use crate::algo::glouvain::{GLouvain, GlouvainParams};
use crate::error::{Error, Result};
use crate::model::{ActorId, Community, CommunityStructure, LayerId, Network};
use indexmap::IndexMap;

/// Hyperparameters for [`Abacus::run`] (§4.7).
#[derive(Debug, Clone, Copy)]
pub struct AbacusParams {
    /// `s`: both the minimum itemset size (number of per-layer labels an
    /// actor must share, §4.7 step 3 — "at least s items") and the
    /// minimum tidset frequency (number of actors an itemset must be
    /// shared by), mirroring `abacus.h`'s `eclat_merge(mnet, …,
    /// min_support)` Eclat threshold. A closed itemset must clear both
    /// bars to yield a community.
    pub min_support: usize,
    /// Optional cap on itemset size, above which a closed itemset is
    /// discarded even if it meets `min_support`.
    pub max_itemset_size: Option<usize>,
    /// Resolution passed to the default per-layer detector (plain
    /// single-layer GLouvain, ω = 0).
    pub gamma: f64,
    pub seed: u64,
}

impl Default for AbacusParams {
    fn default() -> Self {
        Self { min_support: 2, max_itemset_size: None, gamma: 1.0, seed: 0 }
    }
}

impl AbacusParams {
    pub fn validate(&self) -> Result<()> {
        if self.min_support == 0 {
            return Err(Error::InvalidArgument("min_support must be >= 1".into()));
        }
        if let Some(max) = self.max_itemset_size {
            if max < self.min_support {
                return Err(Error::InvalidArgument("max_itemset_size must be >= min_support".into()));
            }
        }
        Ok(())
    }
}

/// Result of an [`Abacus::run`] call. Communities may overlap (§4.7).
#[derive(Debug, Clone)]
pub struct AbacusResult {
    pub communities: CommunityStructure,
}

/// A closed-itemset mining backend shared by [`Bitmap16Miner`] and
/// [`EclatMiner`] (§9).
///
/// `transactions[t]` is the sorted list of item indices (`0..num_items`)
/// actor `t` carries. Returns every *closed* itemset whose size is at
/// least `min_support` (and at most `max_size`, if given) **and** whose
/// tidset (sorted transaction indices) has at least `min_support`
/// entries — the dual size/frequency threshold of §4.7 step 3.
pub trait ClosedItemsetMiner {
    fn mine(
        transactions: &[Vec<usize>],
        num_items: usize,
        min_support: usize,
        max_size: Option<usize>,
    ) -> Vec<(Vec<usize>, Vec<usize>)>;
}

/// Intersection of two sorted index lists.
pub(super) fn intersect(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// Whether sorted list `a` is a superset of sorted list `b`.
pub(super) fn is_superset(a: &[usize], b: &[usize]) -> bool {
    if b.is_empty() {
        return true;
    }
    let mut i = 0;
    for &x in b {
        while i < a.len() && a[i] < x {
            i += 1;
        }
        if i >= a.len() || a[i] != x {
            return false;
        }
        i += 1;
    }
    true
}

/// Frequent closed-itemset ensemble over per-layer communities (§4.7).
pub struct Abacus;

impl Abacus {
    /// Run ABACUS with the default per-layer detector: plain single-layer
    /// GLouvain (ω = 0) on each layer's induced subnetwork.
    pub fn run(net: &Network, params: &AbacusParams) -> Result<AbacusResult> {
        Self::run_with_detector(net, params, |net, layer| Self::default_detector(net, layer, params))
    }

    /// Run ABACUS with a caller-supplied per-layer single-layer community
    /// detector `D` (§4.7 step 1). `detector(net, layer)` must return a
    /// [`CommunityStructure`] whose nodes are `net`'s own nodes in
    /// `layer`.
    pub fn run_with_detector<D>(net: &Network, params: &AbacusParams, mut detector: D) -> Result<AbacusResult>
    where
        D: FnMut(&Network, LayerId) -> Result<CommunityStructure>,
    {
        params.validate()?;

        // item (layer, per-layer community index) -> dense item id, in
        // layer-then-community insertion order (determinism, §5/§9).
        let mut item_ids: IndexMap<(LayerId, usize), usize> = IndexMap::new();
        let mut actor_items: IndexMap<ActorId, Vec<usize>> = IndexMap::new();

        for layer in net.layers() {
            let cs = detector(net, layer.id)?;
            for (ci, community) in cs.iter().enumerate() {
                let item = *item_ids.entry((layer.id, ci)).or_insert_with(|| item_ids.len());
                for actor in community.actors(net) {
                    actor_items.entry(actor).or_default().push(item);
                }
            }
        }

        let num_items = item_ids.len();
        if num_items == 0 || actor_items.is_empty() {
            return Ok(AbacusResult { communities: CommunityStructure::new() });
        }

        let actors: Vec<ActorId> = actor_items.keys().copied().collect();
        let transactions: Vec<Vec<usize>> = actors
            .iter()
            .map(|a| {
                let mut items = actor_items[a].clone();
                items.sort_unstable();
                items.dedup();
                items
            })
            .collect();

        let closed = if num_items <= 16 {
            Bitmap16Miner::mine(&transactions, num_items, params.min_support, params.max_itemset_size)
        } else {
            EclatMiner::mine(&transactions, num_items, params.min_support, params.max_itemset_size)
        };

        let mut communities = CommunityStructure::new();
        for (_itemset, tids) in closed {
            let members: Vec<ActorId> = tids.iter().map(|&i| actors[i]).collect();
            communities.push(Community::from_actors_across_layers(net, members));
        }
        Ok(AbacusResult { communities })
    }

    /// Default `D`: induce the single-layer subnetwork for `layer` and run
    /// GLouvain on it with `ω = 0` (a single layer has no inter-layer
    /// coupling to speak of).
    fn default_detector(net: &Network, layer: LayerId, params: &AbacusParams) -> Result<CommunityStructure> {
        let sub = Self::single_layer_subnetwork(net, layer)?;
        let glouvain_params = GlouvainParams { gamma: params.gamma, omega: 0.0, seed: params.seed, ..Default::default() };
        let result = GLouvain::run(&sub, &glouvain_params)?;

        // Map the sub-network's communities back onto `net`'s own nodes
        // in `layer`, by actor name (unique within a network, and
        // preserved verbatim when building the sub-network below).
        let mut cs = CommunityStructure::new();
        for community in result.communities.iter() {
            let mut mapped = Community::new();
            for sub_node_id in community.nodes() {
                let Some(sub_node) = sub.node(sub_node_id) else { continue };
                let Some(sub_actor) = sub.actor(sub_node.actor) else { continue };
                let Some(orig_actor) = net.actor_by_name_lookup(&sub_actor.name) else { continue };
                if let Some(orig_node) = net.node_of(orig_actor, layer) {
                    mapped.insert(orig_node);
                }
            }
            cs.push(mapped);
        }
        Ok(cs)
    }

    /// Build a standalone single-layer [`Network`] containing exactly
    /// `layer`'s nodes and intra-layer edges, with actors carried over by
    /// name so results can be mapped back onto the original network.
    fn single_layer_subnetwork(net: &Network, layer: LayerId) -> Result<Network> {
        let layer_meta = net.layer(layer).ok_or_else(|| Error::NotFound(format!("layer {layer}")))?;
        let mut sub = Network::new();
        let sub_layer = sub.add_layer(layer_meta.name.clone(), layer_meta.directed);

        let mut actor_map: IndexMap<ActorId, ActorId> = IndexMap::new();
        if let Some(nodes) = net.nodes_in_layer(layer) {
            for &nid in nodes {
                let node = net.node(nid).expect("node id from layer index must resolve");
                let orig_actor = net.actor(node.actor).expect("node's actor must exist");
                let sub_actor = sub.add_actor(orig_actor.name.clone());
                actor_map.insert(node.actor, sub_actor);
                sub.add_node(sub_actor, sub_layer)?;
            }
        }

        if let Some(edge_ids) = net.edges_in_cell(layer, layer) {
            for &eid in edge_ids {
                let edge = net.edge(eid).expect("edge id from cell index must resolve");
                let n1 = net.node(edge.v1).expect("endpoint exists");
                let n2 = net.node(edge.v2).expect("endpoint exists");
                let sub_a1 = actor_map[&n1.actor];
                let sub_a2 = actor_map[&n2.actor];
                let sub_n1 = sub.node_of(sub_a1, sub_layer).expect("node added above");
                let sub_n2 = sub.node_of(sub_a2, sub_layer).expect("node added above");
                sub.add_edge(sub_n1, sub_n2)?;
            }
        }
        Ok(sub)
    }
}
