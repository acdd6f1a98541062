//! The pairwise-ordering crossing model.
//!
//! `x[a,b] = 1` places `a` left of `b` in their layer. Totality and transitivity make `x` a
//! total order per layer. For two edges `(u1,v1)`, `(u2,v2)` between layers `k` and `k + 1`
//! with four distinct endpoints, `c = 1` is forced when the tails and heads are ordered
//! oppositely. A complete `K₂,₂` between two node pairs always crosses exactly once, stated as an
//! equality on its two pairings.

use crate::solver::{LinExpr, Model, Relation, SolverSession, Var};
use crate::{Error, Result};
use rustc_hash::FxHashMap as HashMap;
use std::collections::{BTreeMap, BTreeSet};
use strata_graph::{Edge, NodeId};

const ORDER_PRIORITY: i32 = 10;
const CROSSING_PRIORITY: i32 = 1;

/// An inter-layer edge, oriented from layer `k` to layer `k + 1`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LayerEdge {
    pub(crate) edge: Edge,
    pub(crate) north: NodeId,
    pub(crate) south: NodeId,
    pub(crate) weight: f64,
}

pub(crate) struct Solved {
    pub(crate) before: BTreeSet<(NodeId, NodeId)>,
    pub(crate) crossing: BTreeSet<(Edge, Edge)>,
    pub(crate) objective: f64,
}

fn pair_key(a: Edge, b: Edge) -> (Edge, Edge) {
    if a <= b { (a, b) } else { (b, a) }
}

pub(crate) fn solve(
    session: &SolverSession,
    layers: &BTreeMap<u32, Vec<NodeId>>,
    between: &BTreeMap<u32, Vec<LayerEdge>>,
) -> Result<Solved> {
    let mut model = session.create_model("crossing_reduction");

    let mut x: HashMap<(NodeId, NodeId), Var> = HashMap::default();
    for nodes in layers.values() {
        for &a in nodes {
            for &b in nodes {
                if a != b {
                    let var = model.add_binary(format!("x_{a}_{b}"));
                    model.set_branch_priority(var, ORDER_PRIORITY);
                    x.insert((a, b), var);
                }
            }
        }
    }
    let xv = |a: NodeId, b: NodeId| -> Result<Var> {
        x.get(&(a, b)).copied().ok_or_else(|| Error::InvalidLayering {
            message: format!("nodes {a} and {b} are not in the same layer"),
        })
    };

    for nodes in layers.values() {
        for (i, &a) in nodes.iter().enumerate() {
            for &b in &nodes[i + 1..] {
                model.add_constraint(
                    format!("order_{a}_{b}"),
                    xv(a, b)? + xv(b, a)?,
                    Relation::Eq,
                    1.0,
                );
            }
        }
        for &u1 in nodes {
            for &u2 in nodes {
                for &u3 in nodes {
                    if u1 == u2 || u2 == u3 || u1 == u3 {
                        continue;
                    }
                    // x[u3,u1] >= x[u3,u2] + x[u2,u1] - 1
                    model.add_constraint(
                        format!("trans_{u3}_{u2}_{u1}"),
                        xv(u3, u1)? - xv(u3, u2)? - xv(u2, u1)?,
                        Relation::Ge,
                        -1.0,
                    );
                }
            }
        }
    }

    let mut c: HashMap<(Edge, Edge), (Var, f64)> = HashMap::default();
    let mut objective = LinExpr::new();
    for edges in between.values() {
        for (i, e1) in edges.iter().enumerate() {
            for e2 in &edges[i + 1..] {
                let (u1, v1, u2, v2) = (e1.north, e1.south, e2.north, e2.south);
                if u1 == u2 || v1 == v2 {
                    continue;
                }
                let var = model.add_binary(format!("c_{u1}_{v1}_{u2}_{v2}"));
                model.set_branch_priority(var, CROSSING_PRIORITY);
                model.add_constraint(
                    format!("c4_{u1}_{v1}_{u2}_{v2}"),
                    var + xv(u2, u1)? + xv(v1, v2)?,
                    Relation::Ge,
                    1.0,
                );
                model.add_constraint(
                    format!("c5_{u1}_{v1}_{u2}_{v2}"),
                    var + xv(u1, u2)? + xv(v2, v1)?,
                    Relation::Ge,
                    1.0,
                );
                let w = e1.weight * e2.weight;
                objective += var * w;
                c.insert(pair_key(e1.edge, e2.edge), (var, w));
            }
        }
    }

    add_k22_equalities(&mut model, layers, between, &c);
    model.add_objective(objective);
    model.solve()?;

    let mut before = BTreeSet::new();
    for (&(a, b), &var) in &x {
        if model.bool_value(var)? {
            before.insert((a, b));
        }
    }
    let mut crossing = BTreeSet::new();
    let mut total = 0.0;
    for (&key, &(var, w)) in &c {
        if model.bool_value(var)? {
            crossing.insert(key);
            total += w;
        }
    }
    Ok(Solved {
        before,
        crossing,
        objective: total,
    })
}

fn add_k22_equalities(
    model: &mut Model<'_>,
    layers: &BTreeMap<u32, Vec<NodeId>>,
    between: &BTreeMap<u32, Vec<LayerEdge>>,
    c: &HashMap<(Edge, Edge), (Var, f64)>,
) {
    for (&k, edges) in between {
        let (Some(north), Some(south)) = (layers.get(&k), layers.get(&(k + 1))) else {
            continue;
        };
        let oriented: HashMap<(NodeId, NodeId), Edge> =
            edges.iter().map(|e| ((e.north, e.south), e.edge)).collect();
        let find = |a: NodeId, b: NodeId| oriented.get(&(a, b)).copied();

        for (i, &u1) in north.iter().enumerate() {
            for &u2 in &north[i + 1..] {
                for (j, &v1) in south.iter().enumerate() {
                    for &v2 in &south[j + 1..] {
                        let (Some(ea), Some(eb), Some(ec), Some(ed)) =
                            (find(u1, v1), find(u1, v2), find(u2, v1), find(u2, v2))
                        else {
                            continue;
                        };
                        let (Some(&(c1, _)), Some(&(c2, _))) =
                            (c.get(&pair_key(ea, ed)), c.get(&pair_key(eb, ec)))
                        else {
                            continue;
                        };
                        model.add_constraint(
                            format!("four_{u1}_{u2}_{v1}_{v2}"),
                            c1 + c2,
                            Relation::Eq,
                            1.0,
                        );
                    }
                }
            }
        }
    }
}

/// Left-to-right order of each layer: most "placed before" wins first, ties by ascending id.
pub(crate) fn order_by_wins(
    layers: &BTreeMap<u32, Vec<NodeId>>,
    before: &BTreeSet<(NodeId, NodeId)>,
) -> BTreeMap<u32, Vec<NodeId>> {
    layers
        .iter()
        .map(|(&k, nodes)| {
            let mut ranked: Vec<(usize, NodeId)> = nodes
                .iter()
                .map(|&a| {
                    let wins = nodes.iter().filter(|&&b| before.contains(&(a, b))).count();
                    (wins, a)
                })
                .collect();
            ranked.sort_by(|p, q| q.0.cmp(&p.0).then(p.1.cmp(&q.1)));
            (k, ranked.into_iter().map(|(_, v)| v).collect())
        })
        .collect()
}
