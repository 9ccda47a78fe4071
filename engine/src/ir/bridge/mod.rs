pub use eog::{Edge, EvaluationOrderGraph, GraphBuilder};
pub use node::{AssignOp, BinaryOp, Kind, NodeId, UnaryOp};
pub use shared::Identifier;

use crate::error::EngineResult;
use crate::ir::adapter;

mod eog;
mod node;
mod shared;

/// Transfer function
pub fn convert(adapted: &adapter::eog::Graph) -> EngineResult<EvaluationOrderGraph> {
    EvaluationOrderGraph::convert(adapted)
}

/// The node an external id turns into once the graph is converted
pub fn locate(adapted: &adapter::eog::Graph, id: usize) -> Option<NodeId> {
    adapted
        .nodes
        .iter()
        .position(|n| n.id == id)
        .map(|pos| NodeId::from(petgraph::graph::NodeIndex::new(pos)))
}
