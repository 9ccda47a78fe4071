use crate::analysis::interval::LatticeInterval;
use crate::analysis::state::{DeclarationState, IntervalState};
use crate::error::{EngineError, EngineResult, Unsupported};
use crate::ir::bridge::{
    AssignOp, BinaryOp, EvaluationOrderGraph, Identifier, Kind, NodeId, UnaryOp,
};

pub use array::ArrayValue;
pub use integer::IntegerValue;

mod array;
mod integer;

/// What an effect function may look at besides the node itself
pub struct EffectContext<'a> {
    pub graph: &'a EvaluationOrderGraph,
    /// name of the tracked variable
    pub name: &'a Identifier,
    /// intervals computed so far, per node
    pub state: &'a IntervalState,
    /// lifetime intervals of the other variables, per declaration
    pub declarations: &'a DeclarationState,
}

impl<'a> EffectContext<'a> {
    pub fn kind(&self, node: NodeId) -> Option<&'a Kind> {
        self.graph.kind(node)
    }

    /// Whether the node is a reference to the tracked variable
    pub fn is_target(&self, node: NodeId) -> bool {
        matches!(self.kind(node), Some(Kind::Reference { name, .. }) if name == self.name)
    }

    pub fn literal(&self, node: NodeId) -> Option<i64> {
        match self.kind(node)? {
            Kind::Literal { value } => *value,
            _ => None,
        }
    }
}

/// The variable a node assigns, if any
pub fn written_variable(graph: &EvaluationOrderGraph, node: NodeId) -> Option<&Identifier> {
    match graph.kind(node)? {
        Kind::VariableDeclaration { name, .. } => Some(name),
        Kind::Assignment { lhs, .. } => match graph.kind(*lhs)? {
            Kind::Reference { name, .. } => Some(name),
            _ => None,
        },
        Kind::UnaryOperator {
            operator: UnaryOp::Increment | UnaryOp::Decrement,
            input,
        } => match graph.kind(*input)? {
            Kind::Reference { name, .. } => Some(name),
            _ => None,
        },
        _ => None,
    }
}

/// Declaration of the variable a node assigns, if it resolves
pub fn written_declaration(graph: &EvaluationOrderGraph, node: NodeId) -> Option<NodeId> {
    let resolve = |target: NodeId| match graph.kind(target)? {
        Kind::Reference { declaration, .. } => *declaration,
        _ => None,
    };
    match graph.kind(node)? {
        Kind::VariableDeclaration { .. } => Some(node),
        Kind::Assignment { lhs, .. } => resolve(*lhs),
        Kind::UnaryOperator {
            operator: UnaryOp::Increment | UnaryOp::Decrement,
            input,
        } => resolve(*input),
        _ => None,
    }
}

/// Effect of one node on the interval of the tracked variable
pub trait Value {
    /// Interval after the node, given the interval before it
    fn apply_effect(
        &self,
        ctx: &EffectContext,
        current: &LatticeInterval,
        node: NodeId,
    ) -> EngineResult<LatticeInterval>;

    /// Interval flowing along the `taken` outcome of a branching node
    fn apply_branch(
        &self,
        _ctx: &EffectContext,
        current: &LatticeInterval,
        _branching: NodeId,
        _taken: bool,
    ) -> EngineResult<LatticeInterval> {
        Ok(*current)
    }

    /// Whether the node assigns the tracked variable
    fn writes(&self, ctx: &EffectContext, node: NodeId) -> bool {
        written_variable(ctx.graph, node).map_or(false, |name| name == ctx.name)
    }
}

/// Effect functions available for evaluation, chosen by declared type
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TargetKind {
    Integer(IntegerValue),
    Array(ArrayValue),
}

impl TargetKind {
    pub fn from_type_name(ty: &str) -> EngineResult<Self> {
        if ty == "int" {
            Ok(Self::Integer(IntegerValue))
        } else if ty.ends_with("[]") {
            Ok(Self::Array(ArrayValue))
        } else {
            Err(EngineError::NotSupportedYet(Unsupported::TargetType(
                ty.to_string(),
            )))
        }
    }
}

impl Value for TargetKind {
    fn apply_effect(
        &self,
        ctx: &EffectContext,
        current: &LatticeInterval,
        node: NodeId,
    ) -> EngineResult<LatticeInterval> {
        match self {
            Self::Integer(v) => v.apply_effect(ctx, current, node),
            Self::Array(v) => v.apply_effect(ctx, current, node),
        }
    }

    fn apply_branch(
        &self,
        ctx: &EffectContext,
        current: &LatticeInterval,
        branching: NodeId,
        taken: bool,
    ) -> EngineResult<LatticeInterval> {
        match self {
            Self::Integer(v) => v.apply_branch(ctx, current, branching, taken),
            Self::Array(v) => v.apply_branch(ctx, current, branching, taken),
        }
    }

    fn writes(&self, ctx: &EffectContext, node: NodeId) -> bool {
        match self {
            Self::Integer(v) => v.writes(ctx, node),
            Self::Array(v) => v.writes(ctx, node),
        }
    }
}

/// Constant change a node applies to the named variable, if it is one
pub(crate) fn constant_step(ctx: &EffectContext, node: NodeId, name: &Identifier) -> Option<i64> {
    let is_named =
        |n: NodeId| matches!(ctx.kind(n), Some(Kind::Reference { name: v, .. }) if v == name);
    match ctx.kind(node)? {
        Kind::UnaryOperator { operator, input } if is_named(*input) => match operator {
            UnaryOp::Increment => Some(1),
            UnaryOp::Decrement => Some(-1),
            _ => None,
        },
        Kind::Assignment { operator, lhs, rhs } if is_named(*lhs) => match operator {
            AssignOp::Add => ctx.literal(*rhs),
            AssignOp::Sub => ctx.literal(*rhs)?.checked_neg(),
            AssignOp::Assign => match ctx.kind(*rhs)? {
                Kind::BinaryOperator {
                    operator: BinaryOp::Add,
                    lhs: l,
                    rhs: r,
                } => {
                    if is_named(*l) {
                        ctx.literal(*r)
                    } else if is_named(*r) {
                        ctx.literal(*l)
                    } else {
                        None
                    }
                }
                Kind::BinaryOperator {
                    operator: BinaryOp::Sub,
                    lhs: l,
                    rhs: r,
                } if is_named(*l) => ctx.literal(*r)?.checked_neg(),
                _ => None,
            },
            _ => None,
        },
        _ => None,
    }
}
