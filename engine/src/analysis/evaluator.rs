use log::debug;
use serde::Serialize;

use absint_shared::config::FIXPOINT_LIMIT;
use absint_shared::logging::Tracer;

use crate::analysis::interval::LatticeInterval;
use crate::analysis::value::TargetKind;
use crate::analysis::worklist::Worklist;
use crate::error::{EngineError, EngineResult, Unsupported};
use crate::ir::bridge::{EvaluationOrderGraph, Identifier, Kind, NodeId};

/// Result of evaluating a variable at a node
#[derive(Eq, PartialEq, Clone, Debug, Serialize)]
pub struct Evaluation {
    /// values the variable may hold at the target
    pub value: LatticeInterval,
    /// values the variable may hold anywhere it is written
    pub lifetime: LatticeInterval,
    /// node visits taken by the fixpoint iteration
    pub steps: usize,
}

impl Evaluation {
    fn unreachable() -> Self {
        Self {
            value: LatticeInterval::Bottom,
            lifetime: LatticeInterval::Bottom,
            steps: 0,
        }
    }
}

/// Entrypoint of the interval analysis over one graph
pub struct Evaluator<'a> {
    graph: &'a EvaluationOrderGraph,
    limit: Option<usize>,
}

impl<'a> Evaluator<'a> {
    pub fn new(graph: &'a EvaluationOrderGraph) -> Self {
        Self {
            graph,
            limit: *FIXPOINT_LIMIT,
        }
    }

    /// Override the visit budget, `None` lifts it
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Interval of the variable a reference reads, at that reference
    pub fn evaluate(&self, target: NodeId) -> EngineResult<LatticeInterval> {
        self.inspect(target).map(|e| e.value)
    }

    /// Like [`Self::evaluate`], keeping the lifetime range and visit count
    pub fn inspect(&self, target: NodeId) -> EngineResult<Evaluation> {
        let kind = self.graph.kind(target).ok_or_else(|| {
            EngineError::InvalidAssumption(format!("target {} is not in the graph", target))
        })?;
        let Kind::Reference {
            name,
            ty,
            declaration,
        } = kind
        else {
            return Err(EngineError::NotSupportedYet(Unsupported::TargetNode(
                kind.label().to_string(),
            )));
        };
        let value = TargetKind::from_type_name(ty)?;

        match declaration {
            None => {
                debug!("`{}` at {} has no declaration", name, target);
                Ok(Evaluation::unreachable())
            }
            Some(start) => self.run(name, *start, target, value, LatticeInterval::Bottom),
        }
    }

    /// Interval of `name` at `end` when flowing from `start`, seeded with `seed`
    pub fn evaluate_with(
        &self,
        name: &Identifier,
        start: NodeId,
        end: NodeId,
        kind: TargetKind,
        seed: LatticeInterval,
    ) -> EngineResult<LatticeInterval> {
        self.run(name, start, end, kind, seed).map(|e| e.value)
    }

    pub fn run(
        &self,
        name: &Identifier,
        start: NodeId,
        end: NodeId,
        kind: TargetKind,
        seed: LatticeInterval,
    ) -> EngineResult<Evaluation> {
        for node in [start, end] {
            if !self.graph.contains(node) {
                return Err(EngineError::InvalidAssumption(format!(
                    "node {} is not in the graph",
                    node
                )));
            }
        }

        let tracer = Tracer::new(format!("evaluate `{}` from {} to {}", name, start, end));
        let fixpoint = Worklist::new(self.graph, &kind, name, start, end, seed)
            .with_limit(self.limit)
            .run()?;

        let evaluation = Evaluation {
            value: fixpoint.state.interval_of(end),
            lifetime: fixpoint.state.declared_interval_of(start),
            steps: fixpoint.steps,
        };
        tracer.log(&format!(
            "`{}` in {} after {} visits",
            name, evaluation.value, evaluation.steps
        ));
        Ok(evaluation)
    }
}
