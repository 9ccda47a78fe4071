pub use analysis::evaluator::{Evaluation, Evaluator};
pub use analysis::interval::LatticeInterval;
pub use error::{EngineError, EngineResult, Unsupported};
pub use ir::bridge::{EvaluationOrderGraph, NodeId};

pub mod analysis;
pub mod error;
pub mod ir;

/// Main entrypoint, the interval of the variable read by `target`
pub fn evaluate(graph: &EvaluationOrderGraph, target: NodeId) -> EngineResult<LatticeInterval> {
    Evaluator::new(graph).evaluate(target)
}
