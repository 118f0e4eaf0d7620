//! `Network`: the central owner of every actor, layer, node, edge and
//! attribute store in a multilayer network (§4.1).
//!
//! Following `multiplenetwork`'s `MLNetwork` and this crate's
//! identifier-arena design (§9, DESIGN.md), entities never hold
//! back-pointers to one another — only ids. `Network` is the only thing
//! that resolves an id to data, so a stale id (held by a caller after
//! erasure) simply resolves to `None` / `NotFound` rather than dangling.

use super::attributes::{AttributeStore, AttributeType};
use super::ids::IdCounter;
use super::{Actor, ActorId, Edge, EdgeId, Layer, LayerId, Node, NodeId};
use crate::error::{Error, Result};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Which direction(s) of a node's incidence to enumerate (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborMode {
    In,
    Out,
    InOut,
}

const WEIGHT_ATTR: &str = "weight";

/// The owner of every actor, layer, node, edge and attribute store in a
/// multilayer network. See the module doc comment for the ownership model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Network {
    actors: IndexMap<ActorId, Actor>,
    actor_by_name: IndexMap<String, ActorId>,
    actor_counter: IdCounter,

    layers: IndexMap<LayerId, Layer>,
    layer_by_name: IndexMap<String, LayerId>,
    layer_counter: IdCounter,

    nodes: IndexMap<NodeId, Node>,
    node_by_pair: IndexMap<(ActorId, LayerId), NodeId>,
    nodes_by_layer: IndexMap<LayerId, IndexSet<NodeId>>,
    nodes_by_actor: IndexMap<ActorId, IndexSet<NodeId>>,
    node_counter: IdCounter,

    edges: IndexMap<EdgeId, Edge>,
    edge_by_pair: IndexMap<(NodeId, NodeId), EdgeId>,
    edges_by_cell: IndexMap<(LayerId, LayerId), IndexSet<EdgeId>>,
    edge_counter: IdCounter,

    out_neighbors: IndexMap<NodeId, IndexSet<NodeId>>,
    in_neighbors: IndexMap<NodeId, IndexSet<NodeId>>,

    actor_attrs: AttributeStore,
    layer_attrs: AttributeStore,
    node_attrs: IndexMap<LayerId, AttributeStore>,
    edge_attrs: IndexMap<(LayerId, LayerId), AttributeStore>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------
    // Actors
    // ---------------------------------------------------------------

    /// Create an actor, or return the existing one of the same name
    /// (actors are idempotent by name, §4.1).
    pub fn add_actor(&mut self, name: impl Into<String>) -> ActorId {
        let name = name.into();
        if let Some(&id) = self.actor_by_name.get(&name) {
            return id;
        }
        let id = ActorId(self.actor_counter.next());
        self.actors.insert(id, Actor::new(id, name.clone()));
        self.actor_by_name.insert(name, id);
        id
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    pub fn actor_by_name_lookup(&self, name: &str) -> Option<ActorId> {
        self.actor_by_name.get(name).copied()
    }

    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    pub fn actor_names(&self) -> impl Iterator<Item = &str> {
        self.actors.values().map(|a| a.name.as_str())
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Erase an actor, cascading to every node of that actor (and thus
    /// every edge incident to those nodes, §3).
    pub fn erase_actor(&mut self, id: ActorId) -> Result<()> {
        let actor = self
            .actors
            .shift_remove(&id)
            .ok_or_else(|| Error::NotFound(format!("actor {id}")))?;
        self.actor_by_name.shift_remove(&actor.name);
        if let Some(nodes) = self.nodes_by_actor.get(&id).cloned() {
            for node in nodes {
                self.erase_node(node)?;
            }
        }
        self.nodes_by_actor.shift_remove(&id);
        self.actor_attrs.reset(id.index());
        Ok(())
    }

    // ---------------------------------------------------------------
    // Layers
    // ---------------------------------------------------------------

    /// Create a layer, or return the existing one of the same name.
    pub fn add_layer(&mut self, name: impl Into<String>, directed: bool) -> LayerId {
        let name = name.into();
        if let Some(&id) = self.layer_by_name.get(&name) {
            return id;
        }
        let id = LayerId(self.layer_counter.next());
        self.layers.insert(id, Layer::new(id, name.clone(), directed));
        self.layer_by_name.insert(name, id);
        id
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(&id)
    }

    pub fn layer_by_name_lookup(&self, name: &str) -> Option<LayerId> {
        self.layer_by_name.get(name).copied()
    }

    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values()
    }

    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.values().map(|l| l.name.as_str())
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Whether an edge spanning `l1` and `l2` is directed.
    ///
    /// For `l1 == l2` this is simply that layer's own flag. For two
    /// distinct layers this crate resolves spec §3's "per-pair
    /// directionality flag" as the OR of both layers' own flags — the
    /// simplest rule satisfying the required symmetry
    /// `directed(A,B) = directed(B,A)` when no per-pair override exists
    /// in the source material (documented in DESIGN.md).
    pub fn directed_between(&self, l1: LayerId, l2: LayerId) -> bool {
        if l1 == l2 {
            self.layers.get(&l1).map(|l| l.directed).unwrap_or(false)
        } else {
            let d1 = self.layers.get(&l1).map(|l| l.directed).unwrap_or(false);
            let d2 = self.layers.get(&l2).map(|l| l.directed).unwrap_or(false);
            d1 || d2
        }
    }

    /// Erase a layer, cascading to every node in that layer.
    pub fn erase_layer(&mut self, id: LayerId) -> Result<()> {
        let layer = self
            .layers
            .shift_remove(&id)
            .ok_or_else(|| Error::NotFound(format!("layer {id}")))?;
        self.layer_by_name.shift_remove(&layer.name);
        if let Some(nodes) = self.nodes_by_layer.get(&id).cloned() {
            for node in nodes {
                self.erase_node(node)?;
            }
        }
        self.nodes_by_layer.shift_remove(&id);
        self.node_attrs.shift_remove(&id);
        self.edges_by_cell.retain(|(a, b), _| *a != id && *b != id);
        self.edge_attrs.retain(|(a, b), _| *a != id && *b != id);
        self.layer_attrs.reset(id.index());
        Ok(())
    }

    // ---------------------------------------------------------------
    // Nodes
    // ---------------------------------------------------------------

    /// Create the (actor, layer) node, or return the existing one.
    pub fn add_node(&mut self, actor: ActorId, layer: LayerId) -> Result<NodeId> {
        if !self.actors.contains_key(&actor) {
            return Err(Error::NotFound(format!("actor {actor}")));
        }
        if !self.layers.contains_key(&layer) {
            return Err(Error::NotFound(format!("layer {layer}")));
        }
        if let Some(&id) = self.node_by_pair.get(&(actor, layer)) {
            return Ok(id);
        }
        let id = NodeId(self.node_counter.next());
        self.nodes.insert(id, Node::new(id, actor, layer));
        self.node_by_pair.insert((actor, layer), id);
        self.nodes_by_layer.entry(layer).or_default().insert(id);
        self.nodes_by_actor.entry(actor).or_default().insert(id);
        Ok(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_of(&self, actor: ActorId, layer: LayerId) -> Option<NodeId> {
        self.node_by_pair.get(&(actor, layer)).copied()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes_in_layer(&self, layer: LayerId) -> Option<&IndexSet<NodeId>> {
        self.nodes_by_layer.get(&layer)
    }

    pub fn nodes_of_actor(&self, actor: ActorId) -> Option<&IndexSet<NodeId>> {
        self.nodes_by_actor.get(&actor)
    }

    /// Erase a node, cascading to every edge incident to it (§3).
    pub fn erase_node(&mut self, id: NodeId) -> Result<()> {
        let node = self
            .nodes
            .shift_remove(&id)
            .ok_or_else(|| Error::NotFound(format!("node {id}")))?;
        self.node_by_pair.shift_remove(&(node.actor, node.layer));
        if let Some(set) = self.nodes_by_layer.get_mut(&node.layer) {
            set.shift_remove(&id);
        }
        if let Some(set) = self.nodes_by_actor.get_mut(&node.actor) {
            set.shift_remove(&id);
        }

        let incident: IndexSet<EdgeId> = self.incident_edge_ids(id);
        for e in incident {
            self.erase_edge(e)?;
        }

        self.out_neighbors.shift_remove(&id);
        self.in_neighbors.shift_remove(&id);
        if let Some(store) = self.node_attrs.get_mut(&node.layer) {
            store.reset(id.index());
        }
        Ok(())
    }

    fn incident_edge_ids(&self, node: NodeId) -> IndexSet<EdgeId> {
        let mut ids = IndexSet::new();
        if let Some(outs) = self.out_neighbors.get(&node) {
            for &other in outs {
                if let Some(&e) = self.edge_by_pair.get(&(node, other)) {
                    ids.insert(e);
                } else if let Some(&e) = self.edge_by_pair.get(&(other, node)) {
                    ids.insert(e);
                }
            }
        }
        if let Some(ins) = self.in_neighbors.get(&node) {
            for &other in ins {
                if let Some(&e) = self.edge_by_pair.get(&(other, node)) {
                    ids.insert(e);
                } else if let Some(&e) = self.edge_by_pair.get(&(node, other)) {
                    ids.insert(e);
                }
            }
        }
        ids
    }

    // ---------------------------------------------------------------
    // Edges
    // ---------------------------------------------------------------

    /// Create the edge `(node1, node2)`, or return the existing one.
    pub fn add_edge(&mut self, node1: NodeId, node2: NodeId) -> Result<EdgeId> {
        let n1 = self.node(node1).copied().ok_or_else(|| Error::NotFound(format!("node {node1}")))?;
        let n2 = self.node(node2).copied().ok_or_else(|| Error::NotFound(format!("node {node2}")))?;

        if let Some(&id) = self.edge_by_pair.get(&(node1, node2)) {
            return Ok(id);
        }
        if let Some(&id) = self.edge_by_pair.get(&(node2, node1)) {
            return Ok(id);
        }

        let directed = self.directed_between(n1.layer, n2.layer);
        let id = EdgeId(self.edge_counter.next());
        self.edges.insert(id, Edge::new(id, node1, node2, directed));
        self.edge_by_pair.insert((node1, node2), id);
        if !directed {
            self.edge_by_pair.insert((node2, node1), id);
        }

        let cell = (n1.layer, n2.layer);
        self.edges_by_cell.entry(cell).or_default().insert(id);
        if cell.0 != cell.1 {
            self.edges_by_cell.entry((cell.1, cell.0)).or_default().insert(id);
        }

        self.out_neighbors.entry(node1).or_default().insert(node2);
        self.in_neighbors.entry(node2).or_default().insert(node1);
        if !directed {
            self.out_neighbors.entry(node2).or_default().insert(node1);
            self.in_neighbors.entry(node1).or_default().insert(node2);
        }

        let store = self.edge_attrs.entry(cell).or_default();
        store.declare_if_absent(WEIGHT_ATTR, AttributeType::Numeric);
        let _ = store.set_numeric(id.index(), WEIGHT_ATTR, 1.0);

        Ok(id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    pub fn edge_of(&self, node1: NodeId, node2: NodeId) -> Option<EdgeId> {
        self.edge_by_pair
            .get(&(node1, node2))
            .or_else(|| self.edge_by_pair.get(&(node2, node1)))
            .copied()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges_in_cell(&self, l1: LayerId, l2: LayerId) -> Option<&IndexSet<EdgeId>> {
        self.edges_by_cell.get(&(l1, l2))
    }

    /// Erase an edge. Does not touch its endpoints.
    pub fn erase_edge(&mut self, id: EdgeId) -> Result<()> {
        let edge = self
            .edges
            .shift_remove(&id)
            .ok_or_else(|| Error::NotFound(format!("edge {id}")))?;

        self.edge_by_pair.retain(|_, v| *v != id);

        let (l1, l2) = (
            self.node(edge.v1).map(|n| n.layer),
            self.node(edge.v2).map(|n| n.layer),
        );
        if let (Some(l1), Some(l2)) = (l1, l2) {
            if let Some(set) = self.edges_by_cell.get_mut(&(l1, l2)) {
                set.shift_remove(&id);
            }
            if let Some(set) = self.edges_by_cell.get_mut(&(l2, l1)) {
                set.shift_remove(&id);
            }
            if let Some(store) = self.edge_attrs.get_mut(&(l1, l2)) {
                store.reset(id.index());
            }
        }

        if let Some(set) = self.out_neighbors.get_mut(&edge.v1) {
            set.shift_remove(&edge.v2);
        }
        if let Some(set) = self.in_neighbors.get_mut(&edge.v2) {
            set.shift_remove(&edge.v1);
        }
        if !edge.directed {
            if let Some(set) = self.out_neighbors.get_mut(&edge.v2) {
                set.shift_remove(&edge.v1);
            }
            if let Some(set) = self.in_neighbors.get_mut(&edge.v1) {
                set.shift_remove(&edge.v2);
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Neighbors & weight
    // ---------------------------------------------------------------

    pub fn neighbors(&self, node: NodeId, mode: NeighborMode) -> IndexSet<NodeId> {
        match mode {
            NeighborMode::Out => self.out_neighbors.get(&node).cloned().unwrap_or_default(),
            NeighborMode::In => self.in_neighbors.get(&node).cloned().unwrap_or_default(),
            NeighborMode::InOut => {
                let mut s = self.out_neighbors.get(&node).cloned().unwrap_or_default();
                if let Some(ins) = self.in_neighbors.get(&node) {
                    s.extend(ins.iter().copied());
                }
                s
            }
        }
    }

    pub fn weight(&self, u: NodeId, v: NodeId) -> Result<f64> {
        let id = self.edge_of(u, v).ok_or_else(|| Error::NotFound(format!("edge ({u}, {v})")))?;
        let edge = self.edge(id).expect("edge id resolved above");
        let l1 = self.node(edge.v1).expect("endpoint exists").layer;
        let l2 = self.node(edge.v2).expect("endpoint exists").layer;
        let store = self
            .edge_attrs
            .get(&(l1, l2))
            .ok_or_else(|| Error::NotFound("edge attribute store".to_string()))?;
        store.get_numeric(id.index(), WEIGHT_ATTR)
    }

    pub fn set_weight(&mut self, u: NodeId, v: NodeId, w: f64) -> Result<()> {
        let id = self.edge_of(u, v).ok_or_else(|| Error::NotFound(format!("edge ({u}, {v})")))?;
        let edge = self.edge(id).copied().expect("edge id resolved above");
        let l1 = self.node(edge.v1).expect("endpoint exists").layer;
        let l2 = self.node(edge.v2).expect("endpoint exists").layer;
        let store = self.edge_attrs.entry((l1, l2)).or_default();
        store.declare_if_absent(WEIGHT_ATTR, AttributeType::Numeric);
        store.set_numeric(id.index(), WEIGHT_ATTR, w)
    }

    // ---------------------------------------------------------------
    // Attribute store access
    // ---------------------------------------------------------------

    pub fn actor_attributes(&self) -> &AttributeStore {
        &self.actor_attrs
    }

    pub fn actor_attributes_mut(&mut self) -> &mut AttributeStore {
        &mut self.actor_attrs
    }

    pub fn layer_attributes(&self) -> &AttributeStore {
        &self.layer_attrs
    }

    pub fn layer_attributes_mut(&mut self) -> &mut AttributeStore {
        &mut self.layer_attrs
    }

    pub fn node_attributes(&self, layer: LayerId) -> Option<&AttributeStore> {
        self.node_attrs.get(&layer)
    }

    pub fn node_attributes_mut(&mut self, layer: LayerId) -> &mut AttributeStore {
        self.node_attrs.entry(layer).or_default()
    }

    pub fn edge_attributes(&self, l1: LayerId, l2: LayerId) -> Option<&AttributeStore> {
        self.edge_attrs.get(&(l1, l2))
    }

    pub fn edge_attributes_mut(&mut self, l1: LayerId, l2: LayerId) -> &mut AttributeStore {
        self.edge_attrs.entry((l1, l2)).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> (Network, LayerId, [NodeId; 3]) {
        let mut net = Network::new();
        let l = net.add_layer("l1", false);
        let a = net.add_actor("A");
        let b = net.add_actor("B");
        let c = net.add_actor("C");
        let na = net.add_node(a, l).unwrap();
        let nb = net.add_node(b, l).unwrap();
        let nc = net.add_node(c, l).unwrap();
        net.add_edge(na, nb).unwrap();
        net.add_edge(nb, nc).unwrap();
        net.add_edge(na, nc).unwrap();
        (net, l, [na, nb, nc])
    }

    #[test]
    fn duplicate_actor_returns_existing() {
        let mut net = Network::new();
        let a1 = net.add_actor("A");
        let a2 = net.add_actor("A");
        assert_eq!(a1, a2);
        assert_eq!(net.actor_count(), 1);
    }

    #[test]
    fn undirected_edge_is_symmetric() {
        let (net, _l, [na, nb, _nc]) = triangle();
        let out_a = net.neighbors(na, NeighborMode::Out);
        let out_b = net.neighbors(nb, NeighborMode::Out);
        assert!(out_a.contains(&nb));
        assert!(out_b.contains(&na));
    }

    #[test]
    fn erase_node_cascades_to_edges() {
        let (mut net, _l, [na, nb, nc]) = triangle();
        assert_eq!(net.edge_count(), 3);
        net.erase_node(na).unwrap();
        assert_eq!(net.edge_count(), 1);
        assert!(net.edge_of(nb, nc).is_some());
        assert!(net.edge_of(na, nb).is_none());
    }

    #[test]
    fn erase_actor_cascades_to_nodes_and_edges() {
        let (mut net, l, [na, _nb, _nc]) = triangle();
        let actor_a = net.node(na).unwrap().actor;
        net.erase_actor(actor_a).unwrap();
        assert!(net.node(na).is_none());
        assert!(net.nodes_in_layer(l).unwrap().len() == 2);
        assert_eq!(net.edge_count(), 1);
    }

    #[test]
    fn weight_defaults_to_one() {
        let (net, _l, [na, nb, _nc]) = triangle();
        assert_eq!(net.weight(na, nb).unwrap(), 1.0);
    }

    #[test]
    fn set_weight_roundtrip() {
        let (mut net, _l, [na, nb, _nc]) = triangle();
        net.set_weight(na, nb, 2.5).unwrap();
        assert_eq!(net.weight(na, nb).unwrap(), 2.5);
        assert_eq!(net.weight(nb, na).unwrap(), 2.5);
    }

    #[test]
    fn rebuilding_edges_yields_same_set() {
        let (mut net, _l, [na, nb, nc]) = triangle();
        let before: IndexSet<(NodeId, NodeId)> = net.edges().map(|e| (e.v1, e.v2)).collect();
        let ids: Vec<EdgeId> = net.edges().map(|e| e.id).collect();
        for id in ids {
            net.erase_edge(id).unwrap();
        }
        assert_eq!(net.edge_count(), 0);
        net.add_edge(na, nb).unwrap();
        net.add_edge(nb, nc).unwrap();
        net.add_edge(na, nc).unwrap();
        let after: IndexSet<(NodeId, NodeId)> = net.edges().map(|e| (e.v1, e.v2)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn directed_layer_edges_are_one_way() {
        let mut net = Network::new();
        let l = net.add_layer("d", true);
        let a = net.add_actor("A");
        let b = net.add_actor("B");
        let na = net.add_node(a, l).unwrap();
        let nb = net.add_node(b, l).unwrap();
        net.add_edge(na, nb).unwrap();
        assert!(net.neighbors(na, NeighborMode::Out).contains(&nb));
        assert!(!net.neighbors(nb, NeighborMode::Out).contains(&na));
        assert!(net.neighbors(nb, NeighborMode::In).contains(&na));
    }

    #[test]
    fn lookup_of_nonexistent_returns_none() {
        let net = Network::new();
        assert!(net.node(NodeId(999)).is_none());
    }

    #[test]
    fn add_node_with_unknown_actor_fails() {
        let mut net = Network::new();
        let l = net.add_layer("l1", false);
        let err = net.add_node(ActorId(999), l);
        assert!(matches!(err, Err(Error::NotFound(_))));
    }
}
