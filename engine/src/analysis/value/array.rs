use crate::analysis::interval::LatticeInterval;
use crate::analysis::value::{EffectContext, IntegerValue, Value};
use crate::error::EngineResult;
use crate::ir::bridge::{AssignOp, Kind, NodeId};

/// Effects on the length of array variables
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ArrayValue;

impl ArrayValue {
    /// Length of the array an expression produces
    fn length_of(
        &self,
        ctx: &EffectContext,
        current: &LatticeInterval,
        expr: NodeId,
    ) -> EngineResult<LatticeInterval> {
        let length = match ctx.kind(expr) {
            Some(Kind::ArrayCreation {
                dimension: Some(dimension),
            }) => IntegerValue
                .evaluate(ctx, &LatticeInterval::top(), *dimension)?
                .restrict(&LatticeInterval::at_least(0)),
            Some(Kind::InitializerList { elements }) => {
                LatticeInterval::constant(elements.len() as i64)
            }
            Some(Kind::Reference { name, .. }) if name == ctx.name => *current,
            _ => LatticeInterval::at_least(0),
        };
        Ok(length)
    }
}

impl Value for ArrayValue {
    fn apply_effect(
        &self,
        ctx: &EffectContext,
        current: &LatticeInterval,
        node: NodeId,
    ) -> EngineResult<LatticeInterval> {
        match ctx.kind(node) {
            Some(Kind::VariableDeclaration {
                name, initializer, ..
            }) if name == ctx.name => match initializer {
                Some(init) => self.length_of(ctx, current, *init),
                None => Ok(LatticeInterval::at_least(0)),
            },
            Some(Kind::Assignment {
                operator: AssignOp::Assign,
                lhs,
                rhs,
            }) if ctx.is_target(*lhs) => self.length_of(ctx, current, *rhs),
            Some(Kind::ForEach { variable, .. }) => match ctx.kind(*variable) {
                Some(Kind::VariableDeclaration { name, .. }) if name == ctx.name => {
                    Ok(LatticeInterval::at_least(0))
                }
                _ => Ok(*current),
            },
            _ => Ok(*current),
        }
    }
}
