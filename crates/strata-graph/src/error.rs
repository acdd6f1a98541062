use crate::{Edge, NodeId};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("edge {edge} references unknown node {node}")]
    UnknownNode { edge: Edge, node: NodeId },

    #[error("self-loop on node {node} is not allowed")]
    SelfLoop { node: NodeId },

    #[error("attribute given for edge {edge}, which is not in the graph")]
    UnknownEdge { edge: Edge },

    #[error("minimum span of edge {edge} must be a positive integer, got {value}")]
    InvalidMinSpan { edge: Edge, value: i64 },

    #[error("weight of edge {edge} must be positive and finite, got {value}")]
    InvalidWeight { edge: Edge, value: f64 },

    #[error("graph is not acyclic; nodes left on a cycle: {residual:?}")]
    Cyclic { residual: Vec<NodeId> },
}

pub type Result<T> = std::result::Result<T, GraphError>;
