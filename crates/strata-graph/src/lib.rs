//! Directed graph model used by `strata`.
//!
//! A [`GraphModel`] is a validated, immutable set of nodes and unique directed edges, together
//! with sparse per-edge weight and minimum-span maps that fall back to defaults. The solver-free
//! algorithms every layering stage relies on (topological levelling, longest paths, source/sink
//! derivation) live in [`alg`].

pub mod alg;
mod edge;
mod error;
mod graph;
mod input;

pub use edge::{Edge, EdgeMap, NodeId};
pub use error::{GraphError, Result};
pub use graph::{GraphBuilder, GraphModel, GraphSummary};
pub use input::GraphInput;

/// Weight of an edge without an explicit entry.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Minimum layer difference of an edge without an explicit entry.
pub const DEFAULT_MIN_SPAN: u32 = 1;
