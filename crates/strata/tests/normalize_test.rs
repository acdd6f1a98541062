use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, BTreeSet};
use strata::Error;
use strata::graph::{Edge, GraphModel, alg};
use strata::normalize::insert_dummy_nodes;
use strata::rank::LayerAssignment;

fn assignment(ranks: &[(usize, u32)]) -> LayerAssignment {
    LayerAssignment::new(ranks.iter().copied().collect())
}

fn random_dag(rng: &mut StdRng, n: usize, p: f64) -> GraphModel {
    let mut edges = Vec::new();
    for u in 0..n {
        for v in u + 1..n {
            if rng.gen_bool(p) {
                edges.push((u, v));
            }
        }
    }
    GraphModel::new(0..n, edges).unwrap()
}

/// Layer of each node = its Kahn round.
fn level_assignment(g: &GraphModel) -> LayerAssignment {
    let mut ranks = BTreeMap::new();
    for (r, level) in alg::topological_levels(g).unwrap().into_iter().enumerate() {
        for v in level {
            ranks.insert(v, r as u32);
        }
    }
    LayerAssignment::new(ranks)
}

#[test]
fn normalize_does_not_change_a_short_edge() {
    let g = GraphModel::builder()
        .nodes(0..2)
        .edge(0, 1)
        .weight((0, 1), 3.0)
        .build()
        .unwrap();
    let out = insert_dummy_nodes(&g, &assignment(&[(0, 0), (1, 1)])).unwrap();
    assert_eq!(out.graph.edges().collect::<Vec<_>>(), vec![Edge::new(0, 1)]);
    assert_eq!(out.graph.weight(Edge::new(0, 1)), 3.0);
    assert!(out.chains.is_empty());
}

#[test]
fn normalize_splits_a_two_layer_edge() {
    let g = GraphModel::new(0..2, [(0, 1)]).unwrap();
    let out = insert_dummy_nodes(&g, &assignment(&[(0, 0), (1, 2)])).unwrap();

    assert_eq!(out.graph.nodes(), &[0, 1, 2]);
    assert_eq!(
        out.graph.edges().collect::<Vec<_>>(),
        vec![Edge::new(0, 2), Edge::new(2, 1)]
    );
    assert_eq!(out.assignment.rank(2), Some(1));
    assert!(out.is_dummy(2));
    assert!(!out.is_dummy(1));
    assert_eq!(out.chains.len(), 1);
    assert_eq!(out.chains[0].edge, Edge::new(0, 1));
    assert_eq!(out.chains[0].nodes, vec![2]);
}

#[test]
fn normalize_gives_chain_edges_default_weight() {
    let g = GraphModel::builder()
        .nodes(0..2)
        .edge(0, 1)
        .weight((0, 1), 5.0)
        .min_span((0, 1), 3)
        .build()
        .unwrap();
    let out = insert_dummy_nodes(&g, &assignment(&[(0, 0), (1, 3)])).unwrap();
    for e in out.graph.edges() {
        assert_eq!(out.graph.weight(e), 1.0, "{e}");
        assert_eq!(out.graph.min_span(e), 1, "{e}");
    }
}

#[test]
fn normalize_allocates_ids_past_the_largest_node() {
    let g = GraphModel::new([3, 10], [(3, 10)]).unwrap();
    let out = insert_dummy_nodes(&g, &assignment(&[(3, 0), (10, 3)])).unwrap();
    assert_eq!(out.chains[0].nodes, vec![11, 12]);
    assert_eq!(out.assignment.rank(11), Some(1));
    assert_eq!(out.assignment.rank(12), Some(2));
}

#[test]
fn normalize_walks_wrap_edges_downward() {
    let g = GraphModel::new(0..3, [(0, 1), (1, 2), (2, 0)]).unwrap();
    let wraps: BTreeSet<Edge> = [Edge::new(2, 0)].into_iter().collect();
    let a = assignment(&[(0, 0), (1, 1), (2, 2)]).with_wrap_edges(wraps);
    let out = insert_dummy_nodes(&g, &a).unwrap();

    assert_eq!(out.chains[0].nodes, vec![3]);
    assert_eq!(out.assignment.rank(3), Some(1));
    assert!(out.assignment.is_wrap(Edge::new(2, 3)));
    assert!(out.assignment.is_wrap(Edge::new(3, 0)));
    assert!(!out.assignment.is_wrap(Edge::new(0, 1)));
}

#[test]
fn normalize_rejects_flat_edges_and_missing_layers() {
    let g = GraphModel::new(0..2, [(0, 1)]).unwrap();
    assert!(matches!(
        insert_dummy_nodes(&g, &assignment(&[(0, 1), (1, 1)])),
        Err(Error::InvalidLayering { .. })
    ));
    assert!(matches!(
        insert_dummy_nodes(&g, &assignment(&[(0, 0)])),
        Err(Error::InvalidLayering { .. })
    ));
}

#[test]
fn normalize_properties_hold_on_random_dags() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..40 {
        let n = rng.gen_range(2..20);
        let g = random_dag(&mut rng, n, 0.3);
        let a = level_assignment(&g);
        let out = insert_dummy_nodes(&g, &a).unwrap();

        let expected_dummies: i64 = g
            .edges()
            .map(|e| (a.span(e).unwrap().abs() - 1).max(0))
            .sum();
        assert_eq!(out.graph.node_count(), n + expected_dummies as usize);
        assert_eq!(out.dummy_count(), expected_dummies as usize);

        for e in out.graph.edges() {
            assert_eq!(out.assignment.span(e).map(i64::abs), Some(1), "{e}");
        }
        for &v in g.nodes() {
            assert!(out.graph.has_node(v));
            assert_eq!(out.assignment.rank(v), a.rank(v));
        }
    }
}
