use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use strata::Error;
use strata::graph::{Edge, GraphModel, NodeId};
use strata::order::{cross_count, reduce_crossings};
use strata::rank::LayerAssignment;
use strata::solver::{SolverConfig, SolverSession};

fn session() -> SolverSession {
    SolverSession::open(SolverConfig::default()).unwrap()
}

fn layered(layers: &[&[NodeId]]) -> LayerAssignment {
    let mut ranks = BTreeMap::new();
    for (k, nodes) in layers.iter().enumerate() {
        for &v in nodes.iter() {
            ranks.insert(v, k as u32);
        }
    }
    LayerAssignment::new(ranks)
}

fn permutations(items: &[NodeId]) -> Vec<Vec<NodeId>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut out = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.to_vec();
        let head = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, head);
            out.push(tail);
        }
    }
    out
}

/// Fewest weighted crossings over every combination of layer orders.
fn brute_force_min(g: &GraphModel, layers: &[Vec<NodeId>]) -> f64 {
    fn go(g: &GraphModel, layers: &[Vec<NodeId>], chosen: &mut Vec<Vec<NodeId>>) -> f64 {
        if chosen.len() == layers.len() {
            return cross_count(g, chosen);
        }
        let mut best = f64::INFINITY;
        for p in permutations(&layers[chosen.len()]) {
            chosen.push(p);
            best = best.min(go(g, layers, chosen));
            chosen.pop();
        }
        best
    }
    go(g, layers, &mut Vec::new())
}

#[test]
fn cross_count_returns_0_for_an_empty_layering() {
    let g = GraphModel::new(Vec::<usize>::new(), Vec::<(usize, usize)>::new()).unwrap();
    assert_eq!(cross_count(&g, &[]), 0.0);
}

#[test]
fn cross_count_returns_0_for_a_layering_with_no_crossings() {
    let g = GraphModel::new(0..4, [(0, 2), (1, 3)]).unwrap();
    assert_eq!(cross_count(&g, &[vec![0, 1], vec![2, 3]]), 0.0);
}

#[test]
fn cross_count_returns_1_for_a_layering_with_1_crossing() {
    let g = GraphModel::new(0..4, [(0, 2), (1, 3)]).unwrap();
    assert_eq!(cross_count(&g, &[vec![0, 1], vec![3, 2]]), 1.0);
}

#[test]
fn cross_count_returns_a_weighted_crossing_count() {
    let g = GraphModel::builder()
        .nodes(0..4)
        .edges([(0, 2), (1, 3)])
        .weight((0, 2), 2.0)
        .weight((1, 3), 3.0)
        .build()
        .unwrap();
    assert_eq!(cross_count(&g, &[vec![0, 1], vec![3, 2]]), 6.0);
}

#[test]
fn cross_count_ignores_edge_direction() {
    let g = GraphModel::new(0..4, [(2, 0), (1, 3)]).unwrap();
    assert_eq!(cross_count(&g, &[vec![0, 1], vec![3, 2]]), 1.0);
}

#[test]
fn cross_count_sums_over_all_layer_pairs() {
    // Two crossings between layers 0/1 and one between 1/2.
    let g = GraphModel::new(0..7, [(0, 4), (1, 3), (2, 3), (3, 6), (4, 5)]).unwrap();
    assert_eq!(
        cross_count(&g, &[vec![0, 1, 2], vec![3, 4], vec![5, 6]]),
        3.0
    );
}

#[test]
fn order_untangles_a_single_crossing() {
    let session = session();
    let g = GraphModel::new(0..4, [(0, 3), (1, 2)]).unwrap();
    let order = reduce_crossings(&session, &g, &layered(&[&[0, 1], &[2, 3]])).unwrap();
    assert!(order.is_optimized());
    assert_eq!(order.crossings(), 0.0);
    assert!(order.crossing_pairs().is_empty());
}

#[test]
fn order_counts_exactly_one_crossing_for_k22() {
    let session = session();
    let g = GraphModel::new(0..4, [(0, 2), (0, 3), (1, 2), (1, 3)]).unwrap();
    let order = reduce_crossings(&session, &g, &layered(&[&[0, 1], &[2, 3]])).unwrap();
    assert_eq!(order.crossings(), 1.0);

    let pairs: Vec<(Edge, Edge)> = order.crossing_pairs().iter().copied().collect();
    let straight = (Edge::new(0, 2), Edge::new(1, 3));
    let twisted = (Edge::new(0, 3), Edge::new(1, 2));
    assert!(pairs == vec![straight] || pairs == vec![twisted], "{pairs:?}");
}

#[test]
fn order_lets_the_lightest_pair_cross() {
    let session = session();
    // A K₂,₂ must cross once; only the light pairing (0, 3) x (1, 2) should pay for it.
    let g = GraphModel::builder()
        .nodes(0..4)
        .edges([(0, 2), (1, 3), (0, 3), (1, 2)])
        .weight((0, 2), 5.0)
        .weight((1, 3), 5.0)
        .build()
        .unwrap();
    let order = reduce_crossings(&session, &g, &layered(&[&[0, 1], &[2, 3]])).unwrap();
    assert_eq!(order.crossings(), 1.0);
    assert_eq!(
        order.crossing_pairs().iter().copied().collect::<Vec<_>>(),
        vec![(Edge::new(0, 3), Edge::new(1, 2))]
    );
}

#[test]
fn order_is_skipped_without_inter_layer_edges() {
    let session = session();
    let g = GraphModel::new([4, 1, 7], Vec::<(usize, usize)>::new()).unwrap();
    let order = reduce_crossings(&session, &g, &layered(&[&[7, 1], &[4]])).unwrap();
    assert!(!order.is_optimized());
    assert_eq!(order.layer(0), &[1, 7]);
    assert_eq!(order.layer(1), &[4]);
    assert!(order.precedes(1, 7));
}

#[test]
fn order_rejects_long_edges() {
    let session = session();
    let g = GraphModel::new(0..3, [(0, 2)]).unwrap();
    let err = reduce_crossings(&session, &g, &layered(&[&[0], &[1], &[2]])).unwrap_err();
    assert!(matches!(err, Error::InvalidLayering { .. }));
}

#[test]
fn order_relation_is_a_total_order_and_optimal_on_random_layerings() {
    let session = session();
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..12 {
        let layer_count = rng.gen_range(2..4);
        let mut layers: Vec<Vec<NodeId>> = Vec::new();
        let mut next = 0;
        for _ in 0..layer_count {
            let size = rng.gen_range(1..4);
            layers.push((next..next + size).collect());
            next += size;
        }
        let mut edges = Vec::new();
        for k in 0..layer_count - 1 {
            for &a in &layers[k] {
                for &b in &layers[k + 1] {
                    if rng.gen_bool(0.5) {
                        edges.push(if rng.gen_bool(0.8) { (a, b) } else { (b, a) });
                    }
                }
            }
        }
        let g = GraphModel::new(0..next, edges).unwrap();
        let refs: Vec<&[NodeId]> = layers.iter().map(Vec::as_slice).collect();
        let order = reduce_crossings(&session, &g, &layered(&refs)).unwrap();

        for nodes in &layers {
            for &a in nodes {
                for &b in nodes {
                    if a == b {
                        continue;
                    }
                    assert_ne!(order.precedes(a, b), order.precedes(b, a), "{a} {b}");
                    for &c in nodes {
                        if c != a && c != b && order.precedes(a, b) && order.precedes(b, c) {
                            assert!(order.precedes(a, c), "{a} {b} {c}");
                        }
                    }
                }
            }
        }
        for (k, nodes) in order.layers() {
            for w in nodes.windows(2) {
                assert!(order.precedes(w[0], w[1]), "layer {k}: {nodes:?}");
            }
        }
        assert_eq!(order.crossings(), brute_force_min(&g, &layers));
    }
}
