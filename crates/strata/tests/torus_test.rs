use strata::graph::{Edge, GraphModel};
use strata::rank::{self, Formulation, TorusOptions};
use strata::solver::{SolverConfig, SolverSession};
use strata::Error;

fn session() -> SolverSession {
    SolverSession::open(SolverConfig::default()).unwrap()
}

fn torus() -> Formulation {
    Formulation::Torus(TorusOptions::default())
}

#[test]
fn torus_wraps_at_least_one_edge_of_a_cycle() {
    let session = session();
    let g = GraphModel::new(0..3, [(0, 1), (1, 2), (2, 0)]).unwrap();
    let a = rank::assign_layers(&session, &g, &torus()).unwrap();

    assert_eq!(a.wrap_edges().len(), 1);
    assert_eq!(a.max_layer(), 2);
    assert!(rank::span_violations(&g, &a).is_empty());
    for &e in a.wrap_edges() {
        assert!(a.rank(e.u).unwrap() > a.rank(e.v).unwrap(), "{e}");
    }
}

#[test]
fn torus_keeps_a_chain_forward() {
    let session = session();
    let g = GraphModel::new(0..4, [(0, 1), (1, 2), (2, 3)]).unwrap();
    let a = rank::assign_layers(&session, &g, &torus()).unwrap();
    assert!(a.wrap_edges().is_empty());
    for v in 0..4 {
        assert_eq!(a.rank(v), Some(v as u32));
    }
}

#[test]
fn torus_handles_two_cycles_sharing_a_node() {
    let session = session();
    let g = GraphModel::new(0..5, [(0, 1), (1, 0), (1, 2), (2, 3), (3, 4), (4, 2)]).unwrap();
    let a = rank::assign_layers(&session, &g, &torus()).unwrap();
    let wraps = a.wrap_edges();
    assert!(wraps.contains(&Edge::new(0, 1)) || wraps.contains(&Edge::new(1, 0)));
    assert!(
        [Edge::new(2, 3), Edge::new(3, 4), Edge::new(4, 2)]
            .iter()
            .any(|e| wraps.contains(e))
    );
    assert!(rank::span_violations(&g, &a).is_empty());
}

#[test]
fn torus_wrap_edges_respect_minimum_spans() {
    let session = session();
    let g = GraphModel::builder()
        .nodes(0..3)
        .edges([(0, 1), (1, 2), (2, 0)])
        .min_span((2, 0), 2)
        .build()
        .unwrap();
    let a = rank::assign_layers(&session, &g, &torus()).unwrap();
    for e in g.edges() {
        let span = a.span(e).unwrap();
        let lam = i64::from(g.min_span(e));
        if a.is_wrap(e) {
            assert!(-span >= lam, "{e}: {span}");
        } else {
            assert!(span >= lam, "{e}: {span}");
        }
    }
}

#[test]
fn torus_rejects_negative_weights() {
    let session = session();
    let g = GraphModel::new(0..2, [(0, 1)]).unwrap();
    let f = Formulation::Torus(TorusOptions {
        gamma: -1.0,
        ..TorusOptions::default()
    });
    assert!(matches!(
        rank::assign_layers(&session, &g, &f),
        Err(Error::Solver { .. })
    ));
}

#[test]
fn torus_options_deserialize_with_defaults() {
    let f: Formulation = serde_json::from_str(r#"{"kind": "torus", "gamma": 50}"#).unwrap();
    assert_eq!(
        f,
        Formulation::Torus(TorusOptions {
            gamma: 50.0,
            ..TorusOptions::default()
        })
    );
}
