// Scenario and invariant tests from the specification's testable-properties
// section: modularity sanity, GLouvain's two-triangle split, ACL's
// star-plus-chain sweep cut, Abacus's ensemble over two layers, and
// supra-adjacency symmetry.

use multinet_core::{
    AbacusParams, AclParams, Acl, Abacus, BelongingCombinator, Community, CommunityStructure,
    GLouvain, GlouvainParams, MatrixBuilder, Modularity, Network,
};

fn two_triangle_network() -> Network {
    let mut net = Network::new();
    let l = net.add_layer("l1", false);
    let mut nodes = vec![];
    for name in ["1", "2", "3", "4", "5", "6"] {
        let a = net.add_actor(name);
        nodes.push(net.add_node(a, l).unwrap());
    }
    for (i, j) in [(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5)] {
        net.add_edge(nodes[i], nodes[j]).unwrap();
    }
    net
}

/// Scenario A — modularity sanity on a 3-actor path.
#[test]
fn scenario_a_modularity_sanity() {
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
    // Re-adding the same pair must be rejected silently (same edge returned).
    let again = net.add_edge(na, nb).unwrap();
    assert_eq!(net.edge_of(na, nb).unwrap(), again);
    assert_eq!(net.edge_count(), 2);

    let whole = CommunityStructure::from_communities(vec![Community::from_nodes([na, nb, nc])]);
    let q_whole = Modularity::modularity(&net, &whole, 1.0, 0.0).unwrap();
    assert!(q_whole.abs() < 1e-9);

    let singletons = CommunityStructure::from_communities(vec![
        Community::from_nodes([na]),
        Community::from_nodes([nb]),
        Community::from_nodes([nc]),
    ]);
    let q_singletons = Modularity::modularity(&net, &singletons, 1.0, 0.0).unwrap();
    assert!(q_singletons < 0.0);
}

/// Scenario B — GLouvain must separate two disjoint triangles joined by
/// nothing, achieving at least the analytically known modularity of the
/// perfect split.
#[test]
fn scenario_b_glouvain_two_triangles() {
    let net = two_triangle_network();
    let params = GlouvainParams {
        gamma: 1.0,
        omega: 1.0,
        seed: 42,
        ..GlouvainParams::default()
    };
    let result = GLouvain::run(&net, &params).unwrap();
    assert_eq!(result.communities.len(), 2);

    let actor_label = |name: &str| {
        let actor = net.actor_by_name_lookup(name).unwrap();
        let layer = net.layers().next().unwrap().id;
        let node = net.node_of(actor, layer).unwrap();
        result.communities.community_of(node).unwrap()
    };
    let g1 = actor_label("1");
    let g2 = actor_label("2");
    let g3 = actor_label("3");
    let g4 = actor_label("4");
    let g5 = actor_label("5");
    let g6 = actor_label("6");
    assert_eq!(g1, g2);
    assert_eq!(g2, g3);
    assert_eq!(g4, g5);
    assert_eq!(g5, g6);
    assert_ne!(g1, g4);

    assert!(result.modularity >= 4.0 / 9.0 - 1e-9);
    // Modularity trace must be non-decreasing up to the spec's tolerance.
    for window in result.modularity_trace.windows(2) {
        assert!(window[1] >= window[0] - 1e-10);
    }
}

/// Scenario C — ACL on a star (center 0, leaves 1..4) fused to a chain
/// (5-6-7-8-9) through a single edge 4-5. Seeding from the star's center
/// must recover (a subset of) the star, with low conductance.
#[test]
fn scenario_c_acl_star_plus_chain() {
    let mut net = Network::new();
    let l = net.add_layer("l1", false);
    let actors: Vec<_> = (0..10).map(|i| net.add_actor(i.to_string())).collect();
    let nodes: Vec<_> = actors.iter().map(|&a| net.add_node(a, l).unwrap()).collect();
    for leaf in 1..=4 {
        net.add_edge(nodes[0], nodes[leaf]).unwrap();
    }
    for i in 5..9 {
        net.add_edge(nodes[i], nodes[i + 1]).unwrap();
    }
    net.add_edge(nodes[4], nodes[5]).unwrap();

    let params = AclParams { alpha: 0.15, epsilon: 1e-4, omega: 1.0, max_pushes: 100_000 };
    let result = Acl::run(&net, actors[0], &params).unwrap();

    let star_actor_ids: std::collections::HashSet<_> = [0usize, 1, 2, 3, 4].into_iter().collect();
    for node in result.community.nodes() {
        let actor = net.node(node).unwrap().actor;
        let idx = net.actors().position(|a| a.id == actor).unwrap();
        assert!(star_actor_ids.contains(&idx), "ACL leaked outside the seed star");
    }
    assert!(result.conductance <= 0.2 + 1e-9, "conductance {} exceeds 0.2", result.conductance);
}

/// Scenario D — Abacus over two layers with a pre-determined per-layer
/// community assignment (bypassing the default GLouvain detector via
/// `run_with_detector`), checking that the closed frequent itemsets at
/// support 2 recover `{A,B}` and `{D,E}`.
#[test]
fn scenario_d_abacus_two_layer_ensemble() {
    let mut net = Network::new();
    let l1 = net.add_layer("L1", false);
    let l2 = net.add_layer("L2", false);
    let actors: std::collections::HashMap<&str, _> =
        ["A", "B", "C", "D", "E"].iter().map(|&n| (n, net.add_actor(n))).collect();
    for (_, &a) in actors.iter() {
        net.add_node(a, l1).unwrap();
        net.add_node(a, l2).unwrap();
    }

    let params = AbacusParams { min_support: 2, max_itemset_size: None, gamma: 1.0, seed: 0 };
    let result = Abacus::run_with_detector(&net, &params, |net, layer| {
        let mut cs = CommunityStructure::new();
        let label = |name: &str| net.actor_by_name_lookup(name).unwrap();
        let node = |actor, layer| net.node_of(actor, layer).unwrap();
        if layer == l1 {
            cs.push(Community::from_nodes(
                ["A", "B", "C"].iter().map(|n| node(label(n), layer)),
            ));
            cs.push(Community::from_nodes(
                ["D", "E"].iter().map(|n| node(label(n), layer)),
            ));
        } else {
            cs.push(Community::from_nodes(
                ["A", "B"].iter().map(|n| node(label(n), layer)),
            ));
            cs.push(Community::from_nodes(
                ["C", "D", "E"].iter().map(|n| node(label(n), layer)),
            ));
        }
        Ok(cs)
    })
    .unwrap();

    let actor_set = |community: &Community| -> std::collections::BTreeSet<String> {
        community
            .actors(&net)
            .into_iter()
            .map(|a| net.actor(a).unwrap().name.clone())
            .collect()
    };
    let sets: Vec<_> = result.communities.iter().map(actor_set).collect();
    let ab: std::collections::BTreeSet<String> = ["A", "B"].iter().map(|s| s.to_string()).collect();
    let de: std::collections::BTreeSet<String> = ["D", "E"].iter().map(|s| s.to_string()).collect();
    assert!(sets.contains(&ab), "expected {{A,B}} community, got {:?}", sets);
    assert!(sets.contains(&de), "expected {{D,E}} community, got {:?}", sets);
}

/// Scenario E — extended modularity is finite and order-independent of
/// combinator choice for a non-overlapping sanity case (degenerates to
/// standard modularity when no node overlaps communities).
#[test]
fn scenario_e_extended_modularity_matches_standard_without_overlap() {
    let net = two_triangle_network();
    let mut nodes = vec![];
    for name in ["1", "2", "3", "4", "5", "6"] {
        let a = net.actor_by_name_lookup(name).unwrap();
        let l = net.layers().next().unwrap().id;
        nodes.push(net.node_of(a, l).unwrap());
    }
    let cs = CommunityStructure::from_communities(vec![
        Community::from_nodes(nodes[0..3].iter().copied()),
        Community::from_nodes(nodes[3..6].iter().copied()),
    ]);
    let q = Modularity::modularity(&net, &cs, 1.0, 0.0).unwrap();
    let q_ext =
        Modularity::extended_modularity(&net, &cs, 1.0, 0.0, BelongingCombinator::Multiply).unwrap();
    assert!((q - q_ext).abs() < 1e-9);
}

/// Scenario F — supra-adjacency with ω = 0.5 over two undirected layers
/// must be symmetric to within 1e-12.
#[test]
fn scenario_f_supra_adjacency_symmetry() {
    let mut net = Network::new();
    let l1 = net.add_layer("L1", false);
    let l2 = net.add_layer("L2", false);
    let a = net.add_actor("A");
    let b = net.add_actor("B");
    let c = net.add_actor("C");
    for actor in [a, b, c] {
        net.add_node(actor, l1).unwrap();
        net.add_node(actor, l2).unwrap();
    }
    let na1 = net.node_of(a, l1).unwrap();
    let nb1 = net.node_of(b, l1).unwrap();
    let nc1 = net.node_of(c, l1).unwrap();
    net.add_edge(na1, nb1).unwrap();
    net.add_edge(nb1, nc1).unwrap();

    let (supra, _idx) = MatrixBuilder::supra_adjacency(&net, 0.5, 0.0, false).unwrap();
    assert!(multinet_core::matrix::is_symmetric(&supra, 1e-12));
}

/// Invariant 8 — `supra_adjacency(net, 0, 0, false)` is symmetric iff
/// every layer is undirected; a mixed directed/undirected network must
/// break symmetry.
#[test]
fn invariant_supra_adjacency_symmetry_requires_undirected_layers() {
    let mut net = Network::new();
    let undirected = net.add_layer("U", false);
    let directed = net.add_layer("D", true);
    let a = net.add_actor("A");
    let b = net.add_actor("B");
    net.add_node(a, undirected).unwrap();
    net.add_node(b, undirected).unwrap();
    net.add_node(a, directed).unwrap();
    net.add_node(b, directed).unwrap();
    let nau = net.node_of(a, undirected).unwrap();
    let nbu = net.node_of(b, undirected).unwrap();
    net.add_edge(nau, nbu).unwrap();
    let nad = net.node_of(a, directed).unwrap();
    let nbd = net.node_of(b, directed).unwrap();
    net.add_edge(nad, nbd).unwrap();

    let (supra, _idx) = MatrixBuilder::supra_adjacency(&net, 0.0, 0.0, false).unwrap();
    assert!(!multinet_core::matrix::is_symmetric(&supra, 1e-12));
}

/// Round trip — summing `per_layer_adjacency`'s diagonal blocks must
/// equal `supra_adjacency(omega=0)`'s own diagonal blocks.
#[test]
fn round_trip_per_layer_matches_supra_diagonal() {
    let net = two_triangle_network();
    let (layers, idx) = MatrixBuilder::per_layer_adjacency(&net).unwrap();
    let (supra, supra_idx) = MatrixBuilder::supra_adjacency(&net, 0.0, 0.0, false).unwrap();
    assert_eq!(idx.actor_count(), supra_idx.actor_count());

    for (li, mat) in layers.iter().enumerate() {
        for (r, c, v) in mat.triplet_iter() {
            let sr = supra_idx.supra_index(r, li);
            let sc = supra_idx.supra_index(c, li);
            let found = supra
                .triplet_iter()
                .find(|&(rr, cc, _)| rr == sr && cc == sc)
                .map(|(_, _, vv)| vv)
                .unwrap_or(0.0);
            assert!((found - v).abs() < 1e-12);
        }
    }
}

/// Boundary behavior — an empty network produces an empty community
/// structure and zero modularity from every algorithm entry point.
#[test]
fn boundary_empty_network() {
    let net = Network::new();
    let cs = CommunityStructure::new();
    assert_eq!(Modularity::modularity(&net, &cs, 1.0, 0.0).unwrap(), 0.0);

    let glouvain = GLouvain::run(&net, &GlouvainParams::default()).unwrap();
    assert!(glouvain.communities.is_empty());
    assert_eq!(glouvain.modularity, 0.0);

    let abacus = Abacus::run(&net, &AbacusParams::default()).unwrap();
    assert!(abacus.communities.is_empty());
}

/// Boundary behavior — a single actor in a single layer yields one
/// community containing that node, with modularity 0 (no edges).
#[test]
fn boundary_single_actor_single_layer() {
    let mut net = Network::new();
    let l = net.add_layer("l1", false);
    let a = net.add_actor("A");
    let node = net.add_node(a, l).unwrap();

    let result = GLouvain::run(&net, &GlouvainParams::default()).unwrap();
    assert_eq!(result.communities.len(), 1);
    assert_eq!(result.communities.get(0).unwrap().nodes().collect::<Vec<_>>(), vec![node]);
    assert_eq!(result.modularity, 0.0);
}
