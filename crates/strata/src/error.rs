use strata_graph::{GraphError, NodeId};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Graph(GraphError),
    #[error("graph is not acyclic; nodes left on a cycle: {residual:?}")]
    CyclicGraph { residual: Vec<NodeId> },
    #[error("model `{model}` is infeasible (conflicting constraints: {diagnostic:?})")]
    Infeasible {
        model: String,
        diagnostic: Vec<String>,
    },
    #[error("solver unavailable: {reason}")]
    SolverUnavailable { reason: String },
    #[error("solver error: {message}")]
    Solver { message: String },
    #[error("invalid layering: {message}")]
    InvalidLayering { message: String },
}

impl From<GraphError> for Error {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Cyclic { residual } => Self::CyclicGraph { residual },
            other => Self::Graph(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
