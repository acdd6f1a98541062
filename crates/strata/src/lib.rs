//! ILP-based hierarchical graph layering.
//!
//! The pipeline breaks cycles ([`acyclic`]), assigns layers with one of four MILP formulations
//! ([`rank`]), subdivides long edges ([`normalize`]) and orders each layer to minimize weighted
//! crossings ([`order`]). All optimization goes through an explicit [`solver::SolverSession`].

pub use strata_graph as graph;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod acyclic;
mod error;
pub mod normalize;
pub mod order;
pub mod pipeline;
pub mod rank;
pub mod solver;

pub use error::{Error, Result};
pub use normalize::NormalizedGraph;
pub use order::LayerOrder;
pub use pipeline::{Layout, LayoutOptions, Stage};
pub use rank::{Formulation, LayerAssignment, TorusOptions};
pub use solver::{SolverConfig, SolverSession};
