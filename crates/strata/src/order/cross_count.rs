//! Weighted crossing count of a fixed layer order.
//!
//! For each pair of adjacent layers the edges are sorted by their north position, then their
//! south positions are fed through an accumulator tree; each insertion adds its weight times the
//! weight already sitting to its right.

use rustc_hash::FxHashMap as HashMap;
use strata_graph::{GraphModel, NodeId};

/// `Σ w(e1)·w(e2)` over crossing pairs of unit-span edges.
///
/// `order[i]` lists layer `i` left to right. Edges between non-adjacent layers, or touching a
/// node missing from `order`, are ignored. Edges are counted regardless of direction.
pub fn cross_count(g: &GraphModel, order: &[Vec<NodeId>]) -> f64 {
    let mut place: HashMap<NodeId, (usize, usize)> = HashMap::default();
    for (layer, nodes) in order.iter().enumerate() {
        for (pos, &v) in nodes.iter().enumerate() {
            place.insert(v, (layer, pos));
        }
    }

    // north layer -> (north pos, south pos, weight)
    let mut between: Vec<Vec<(usize, usize, f64)>> = vec![Vec::new(); order.len()];
    for e in g.edges() {
        let (Some(&(lu, pu)), Some(&(lv, pv))) = (place.get(&e.u), place.get(&e.v)) else {
            continue;
        };
        let entry = if lv == lu + 1 {
            (lu, pu, pv)
        } else if lu == lv + 1 {
            (lv, pv, pu)
        } else {
            continue;
        };
        between[entry.0].push((entry.1, entry.2, g.weight(e)));
    }

    let mut cc = 0.0;
    for (north, entries) in between.iter_mut().enumerate() {
        let Some(south) = order.get(north + 1) else {
            continue;
        };
        entries.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
        cc += two_layer_cross_count(south.len(), entries);
    }
    cc
}

fn two_layer_cross_count(south_len: usize, entries: &[(usize, usize, f64)]) -> f64 {
    if south_len == 0 || entries.is_empty() {
        return 0.0;
    }

    let mut first_index: usize = 1;
    while first_index < south_len {
        first_index <<= 1;
    }
    let tree_size = 2 * first_index - 1;
    first_index -= 1;
    let mut tree: Vec<f64> = vec![0.0; tree_size];

    let mut cc = 0.0;
    for &(_, pos, weight) in entries {
        let mut index = pos + first_index;
        tree[index] += weight;
        let mut weight_sum = 0.0;
        while index > 0 {
            if index % 2 == 1 {
                weight_sum += tree[index + 1];
            }
            index = (index - 1) >> 1;
            tree[index] += weight;
        }
        cc += weight * weight_sum;
    }
    cc
}
