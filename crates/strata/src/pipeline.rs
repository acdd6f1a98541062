//! The layout pipeline as an explicit sequence of named stages.
//!
//! Stages communicate only through the value types they produce ([`GraphModel`],
//! [`LayerAssignment`], [`NormalizedGraph`], [`LayerOrder`]), so the sequence can be reordered
//! or repeated without changing any stage's contract.

use crate::normalize::{self, DummyChain, NormalizedGraph};
use crate::order::{self, LayerOrder};
use crate::rank::{self, Formulation, LayerAssignment};
use crate::solver::SolverSession;
use crate::{Error, Result, acyclic};
use serde::{Deserialize, Serialize};
use strata_graph::{Edge, GraphInput, GraphModel};
use tracing::{debug, info, info_span, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    BreakCycles,
    AssignLayers,
    InsertDummies,
    ReduceCrossings,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Self::BreakCycles => "break_cycles",
            Self::AssignLayers => "assign_layers",
            Self::InsertDummies => "insert_dummies",
            Self::ReduceCrossings => "reduce_crossings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutOptions {
    pub formulation: Formulation,
    /// Drop DFS back edges before layering. Ignored by the torus formulation, which keeps
    /// cycles and chooses wrap edges instead.
    pub break_cycles: bool,
    pub reduce_crossings: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            formulation: Formulation::default(),
            break_cycles: true,
            reduce_crossings: true,
        }
    }
}

impl LayoutOptions {
    pub fn stages(&self) -> Vec<Stage> {
        let mut stages = Vec::with_capacity(4);
        if self.break_cycles && self.formulation.requires_acyclic() {
            stages.push(Stage::BreakCycles);
        }
        stages.push(Stage::AssignLayers);
        stages.push(Stage::InsertDummies);
        if self.reduce_crossings {
            stages.push(Stage::ReduceCrossings);
        }
        stages
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub formulation: Formulation,
    pub stages: Vec<Stage>,
    /// Feedback edges left out of the layout.
    pub removed_edges: Vec<Edge>,
    /// Layers of the input nodes.
    pub layers: LayerAssignment,
    /// The graph after long edges were subdivided.
    pub graph: GraphInput,
    /// Layers of the subdivided graph, dummies included.
    pub normalized_layers: LayerAssignment,
    pub dummy_chains: Vec<DummyChain>,
    pub order: Option<LayerOrder>,
}

#[derive(Default)]
struct State {
    removed: Vec<Edge>,
    assignment: Option<LayerAssignment>,
    normalized: Option<NormalizedGraph>,
    order: Option<LayerOrder>,
}

fn missing(stage: Stage, needs: &str) -> Error {
    Error::InvalidLayering {
        message: format!("stage {} needs {needs}", stage.name()),
    }
}

pub fn layout(session: &SolverSession, g: &GraphModel, options: &LayoutOptions) -> Result<Layout> {
    let stages = options.stages();
    let mut graph = g.clone();
    let mut state = State::default();

    for &stage in &stages {
        let _span = info_span!("stage", name = stage.name()).entered();
        match stage {
            Stage::BreakCycles => {
                let (acyclic, removed) = acyclic::remove_cycles(&graph);
                info!(removed = removed.len(), "cycles broken");
                graph = acyclic;
                state.removed = removed;
            }
            Stage::AssignLayers => {
                let assignment = rank::assign_layers(session, &graph, &options.formulation)?;
                let violations = rank::span_violations(&graph, &assignment);
                if !violations.is_empty() {
                    warn!(?violations, "layering breaks minimum spans");
                }
                state.assignment = Some(assignment);
            }
            Stage::InsertDummies => {
                let assignment = state
                    .assignment
                    .as_ref()
                    .ok_or_else(|| missing(stage, "layers"))?;
                let normalized = normalize::insert_dummy_nodes(&graph, assignment)?;
                info!(
                    dummies = normalized.dummy_count(),
                    edges = normalized.graph.edge_count(),
                    "dummy nodes inserted"
                );
                state.normalized = Some(normalized);
            }
            Stage::ReduceCrossings => {
                let normalized = state
                    .normalized
                    .as_ref()
                    .ok_or_else(|| missing(stage, "unit-span edges"))?;
                let order =
                    order::reduce_crossings(session, &normalized.graph, &normalized.assignment)?;
                state.order = Some(order);
            }
        }
    }

    let layers = state
        .assignment
        .ok_or_else(|| missing(Stage::AssignLayers, "a graph"))?;
    let normalized = state
        .normalized
        .ok_or_else(|| missing(Stage::InsertDummies, "layers"))?;
    debug!(stages = stages.len(), "layout finished");

    Ok(Layout {
        formulation: options.formulation,
        stages,
        removed_edges: state.removed,
        layers,
        graph: GraphInput::from(&normalized.graph),
        normalized_layers: normalized.assignment,
        dummy_chains: normalized.chains,
        order: state.order,
    })
}
