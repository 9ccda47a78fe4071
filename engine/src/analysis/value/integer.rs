use std::cmp::Ordering;

use log::debug;

use crate::analysis::bound::Bound;
use crate::analysis::interval::LatticeInterval;
use crate::analysis::state::{DeclarationState, IntervalState};
use crate::analysis::value::{
    constant_step, written_declaration, written_variable, EffectContext, Value,
};
use crate::error::{EngineError, EngineResult};
use crate::ir::bridge::{
    AssignOp, BinaryOp, EvaluationOrderGraph, Identifier, Kind, NodeId, UnaryOp,
};

/// Expressions nested deeper than this are rejected
const MAX_EXPRESSION_DEPTH: usize = 256;

/// Rounds over the writes of a variable before its lifetime is widened
const LIFETIME_WIDENING_DELAY: usize = 3;

/// Effects on variables of type `int`
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct IntegerValue;

impl IntegerValue {
    /// Interval of an expression where the tracked variable holds `current`
    pub fn evaluate(
        &self,
        ctx: &EffectContext,
        current: &LatticeInterval,
        expr: NodeId,
    ) -> EngineResult<LatticeInterval> {
        self.evaluate_at(ctx, current, expr, 0)
    }

    fn evaluate_at(
        &self,
        ctx: &EffectContext,
        current: &LatticeInterval,
        expr: NodeId,
        depth: usize,
    ) -> EngineResult<LatticeInterval> {
        if depth > MAX_EXPRESSION_DEPTH {
            return Err(EngineError::InvariantViolation(format!(
                "expression {} nests too deeply",
                expr
            )));
        }
        let kind = ctx.kind(expr).ok_or_else(|| {
            EngineError::InvariantViolation(format!("expression {} is not in the graph", expr))
        })?;
        let eval = |n: &NodeId| self.evaluate_at(ctx, current, *n, depth + 1);

        let value = match kind {
            Kind::Literal { value: Some(v) } => LatticeInterval::constant(*v),
            Kind::Reference { name, .. } if name == ctx.name => *current,
            Kind::Reference {
                declaration: Some(declaration),
                ..
            } => ctx
                .declarations
                .get(declaration)
                .copied()
                .unwrap_or_else(LatticeInterval::top),
            Kind::UnaryOperator { operator, input } => match operator {
                UnaryOp::Increment if ctx.is_target(*input) => {
                    current.add(&LatticeInterval::constant(1))?
                }
                UnaryOp::Decrement if ctx.is_target(*input) => {
                    current.sub(&LatticeInterval::constant(1))?
                }
                UnaryOp::Increment | UnaryOp::Decrement => LatticeInterval::top(),
                UnaryOp::Negate => eval(input)?.neg(),
                UnaryOp::Plus => eval(input)?,
                UnaryOp::Not => {
                    let operand = eval(input)?;
                    if operand.is_bottom() {
                        LatticeInterval::Bottom
                    } else if operand.as_constant() == Some(0) {
                        LatticeInterval::constant(1)
                    } else if !operand.contains(0) {
                        LatticeInterval::constant(0)
                    } else {
                        LatticeInterval::range(0, 1)
                    }
                }
            },
            Kind::BinaryOperator { operator, lhs, rhs } => {
                let l = eval(lhs)?;
                let r = eval(rhs)?;
                match operator {
                    BinaryOp::Add => l.add(&r)?,
                    BinaryOp::Sub => l.sub(&r)?,
                    BinaryOp::Mul => l.mul(&r),
                    BinaryOp::Div => l.div(&r)?,
                    BinaryOp::Rem => l.rem(&r),
                    BinaryOp::And | BinaryOp::Or => logical(*operator, &l, &r),
                    _ => compare(*operator, &l, &r),
                }
            }
            Kind::Assignment {
                operator: AssignOp::Assign,
                rhs,
                ..
            } => eval(rhs)?,
            _ => LatticeInterval::top(),
        };
        Ok(value)
    }

    /// Lifetime intervals of every `int` variable except `tracked`
    ///
    /// Each interval joins the values of all writes to the variable, wherever
    /// they happen in the graph. Rounds repeat until no interval grows, and
    /// growing intervals are widened after a few rounds. A write the effect
    /// functions reject makes the variable unknown.
    pub fn lifetimes(
        &self,
        graph: &EvaluationOrderGraph,
        tracked: &Identifier,
    ) -> DeclarationState {
        let writes: Vec<(NodeId, NodeId, &Identifier)> = graph
            .nodes()
            .filter_map(|node| {
                let declaration = written_declaration(graph, node)?;
                match graph.kind(declaration)? {
                    Kind::VariableDeclaration { name, ty, .. }
                        if ty == "int" && name != tracked =>
                    {
                        Some((declaration, node, name))
                    }
                    _ => None,
                }
            })
            .collect();

        let general = IntervalState::new();
        let mut lifetimes = DeclarationState::new();
        let mut round = 0;
        loop {
            let mut changed = false;
            for &(declaration, node, name) in &writes {
                let current = lifetimes.value_of(&declaration);
                let ctx = EffectContext {
                    graph,
                    name,
                    state: &general,
                    declarations: &lifetimes,
                };
                let written = match self.apply_effect(&ctx, &current, node) {
                    Ok(value) => value,
                    Err(err) => {
                        debug!("`{}` is unknown after {}: {}", name, node, err);
                        LatticeInterval::top()
                    }
                };
                let mut next = current.join(&written);
                if round >= LIFETIME_WIDENING_DELAY {
                    next = current.widen(&next);
                }
                if next != current {
                    lifetimes.set(declaration, next);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
            round += 1;
        }
        lifetimes
    }

    /// Restrict `current` to the values for which `condition` evaluates to `taken`
    fn refine(
        &self,
        ctx: &EffectContext,
        current: &LatticeInterval,
        condition: NodeId,
        taken: bool,
    ) -> LatticeInterval {
        let Some(Kind::BinaryOperator { operator, lhs, rhs }) = ctx.kind(condition) else {
            return *current;
        };

        // normalize to `target <op> literal`
        let normalized = if ctx.is_target(*lhs) {
            ctx.literal(*rhs).map(|k| (*operator, k))
        } else if ctx.is_target(*rhs) {
            operator.flip().zip(ctx.literal(*lhs))
        } else {
            None
        };
        let Some((op, k)) = normalized else {
            return *current;
        };
        let op = if taken { Some(op) } else { op.negate() };

        let range = match op {
            Some(BinaryOp::Lt) => k.checked_sub(1).map(LatticeInterval::at_most),
            Some(BinaryOp::Le) => Some(LatticeInterval::at_most(k)),
            Some(BinaryOp::Gt) => k.checked_add(1).map(LatticeInterval::at_least),
            Some(BinaryOp::Ge) => Some(LatticeInterval::at_least(k)),
            Some(BinaryOp::Eq) => Some(LatticeInterval::constant(k)),
            Some(BinaryOp::Ne) => return exclude(current, k),
            _ => return *current,
        };
        match range {
            Some(range) => current.restrict(&range),
            None => LatticeInterval::Bottom,
        }
    }

    /// Values the tracked variable can take at the head of a counted `for` loop
    ///
    /// Applies to loops of the form `for (c = a; c <op> b; c += s)` whose body
    /// runs without branching and changes the tracked variable by constant steps
    /// only. At the head the variable then lies within `entry + j * delta` for
    /// some `j` between zero and the trip count.
    fn counted_loop(
        &self,
        ctx: &EffectContext,
        head: NodeId,
    ) -> EngineResult<Option<LatticeInterval>> {
        let Some(Kind::For {
            initializer: Some(init),
            condition: Some(cond),
            iteration: Some(iter),
        }) = ctx.kind(head)
        else {
            return Ok(None);
        };

        // counter and its initial value
        let (counter, start) = match ctx.kind(*init) {
            Some(Kind::VariableDeclaration {
                name,
                initializer: Some(value),
                ..
            }) => match ctx.literal(*value) {
                Some(v) => (name, v),
                None => return Ok(None),
            },
            Some(Kind::Assignment {
                operator: AssignOp::Assign,
                lhs,
                rhs,
            }) => match (ctx.kind(*lhs), ctx.literal(*rhs)) {
                (Some(Kind::Reference { name, .. }), Some(v)) => (name, v),
                _ => return Ok(None),
            },
            _ => return Ok(None),
        };
        if counter == ctx.name {
            return Ok(None);
        }
        let step = match constant_step(ctx, *iter, counter) {
            Some(step) if step != 0 => step,
            _ => return Ok(None),
        };

        // bound the counter is compared against
        let is_counter = |n: NodeId| {
            matches!(ctx.kind(n), Some(Kind::Reference { name, .. }) if name == counter)
        };
        let (op, bound) = match ctx.kind(*cond) {
            Some(Kind::BinaryOperator { operator, lhs, rhs }) if is_counter(*lhs) => {
                match ctx.literal(*rhs) {
                    Some(b) => (*operator, b),
                    None => return Ok(None),
                }
            }
            Some(Kind::BinaryOperator { operator, lhs, rhs }) if is_counter(*rhs) => {
                match (operator.flip(), ctx.literal(*lhs)) {
                    (Some(op), Some(b)) => (op, b),
                    _ => return Ok(None),
                }
            }
            _ => return Ok(None),
        };
        let Some(trips) = trip_count(op, start, bound, step) else {
            return Ok(None);
        };

        // the loop must run as a single straight line
        let region = ctx.graph.cycle_of(head);
        if region.len() < 2 {
            return Ok(None);
        }
        let mut delta: i64 = 0;
        for node in &region {
            if *node != head && ctx.graph.next(*node).len() != 1 {
                return Ok(None);
            }
            match written_variable(ctx.graph, *node) {
                Some(name) if name == counter && node != iter => return Ok(None),
                Some(name) if name == ctx.name => {
                    match constant_step(ctx, *node, ctx.name).and_then(|s| delta.checked_add(s)) {
                        Some(d) => delta = d,
                        None => return Ok(None),
                    }
                }
                _ => (),
            }
        }

        // value the loop is entered with
        let mut entry = LatticeInterval::Bottom;
        for node in &region {
            for pred in ctx.graph.prev(*node) {
                if !region.contains(&pred) {
                    entry = entry.join(&ctx.state.value_of(&pred));
                }
            }
        }
        if entry.is_bottom() {
            return Ok(None);
        }

        let Some(total) = trips.checked_mul(delta) else {
            return Ok(None);
        };
        Ok(Some(entry.add(&LatticeInterval::range(0, total))?))
    }
}

impl Value for IntegerValue {
    fn apply_effect(
        &self,
        ctx: &EffectContext,
        current: &LatticeInterval,
        node: NodeId,
    ) -> EngineResult<LatticeInterval> {
        let Some(kind) = ctx.kind(node) else {
            return Ok(*current);
        };
        match kind {
            Kind::VariableDeclaration {
                name, initializer, ..
            } if name == ctx.name => match initializer {
                Some(init) => self.evaluate(ctx, current, *init),
                None => Ok(LatticeInterval::top()),
            },
            Kind::Assignment { operator, lhs, rhs } if ctx.is_target(*lhs) => {
                let rhs = self.evaluate(ctx, current, *rhs)?;
                match operator {
                    AssignOp::Assign => Ok(rhs),
                    AssignOp::Add => current.add(&rhs),
                    AssignOp::Sub => current.sub(&rhs),
                    AssignOp::Mul => Ok(current.mul(&rhs)),
                    AssignOp::Div => current.div(&rhs),
                    AssignOp::Rem => Ok(current.rem(&rhs)),
                }
            }
            Kind::UnaryOperator {
                operator: UnaryOp::Increment,
                input,
            } if ctx.is_target(*input) => current.add(&LatticeInterval::constant(1)),
            Kind::UnaryOperator {
                operator: UnaryOp::Decrement,
                input,
            } if ctx.is_target(*input) => current.sub(&LatticeInterval::constant(1)),
            Kind::For { .. } => match self.counted_loop(ctx, node)? {
                Some(summary) => Ok(current.restrict(&summary)),
                None => Ok(*current),
            },
            Kind::ForEach { variable, .. } => match ctx.kind(*variable) {
                Some(Kind::VariableDeclaration { name, .. }) if name == ctx.name => {
                    Ok(LatticeInterval::top())
                }
                _ => Ok(*current),
            },
            _ => Ok(*current),
        }
    }

    fn apply_branch(
        &self,
        ctx: &EffectContext,
        current: &LatticeInterval,
        branching: NodeId,
        taken: bool,
    ) -> EngineResult<LatticeInterval> {
        match ctx.kind(branching).and_then(|k| k.condition()) {
            None => Ok(*current),
            Some(condition) => Ok(self.refine(ctx, current, condition, taken)),
        }
    }
}

/// Result of a comparison, `[0, 1]` unless the operands decide it
fn compare(op: BinaryOp, lhs: &LatticeInterval, rhs: &LatticeInterval) -> LatticeInterval {
    let (Some((l1, u1)), Some((l2, u2))) = (lhs.bounds(), rhs.bounds()) else {
        return LatticeInterval::Bottom;
    };
    let same_constant = lhs.as_constant().is_some() && lhs == rhs;
    let disjoint = lhs.overlap_cmp(rhs) != Ordering::Equal;
    let decided = match op {
        BinaryOp::Lt if u1 < l2 => Some(true),
        BinaryOp::Lt if l1 >= u2 => Some(false),
        BinaryOp::Le if u1 <= l2 => Some(true),
        BinaryOp::Le if l1 > u2 => Some(false),
        BinaryOp::Gt if l1 > u2 => Some(true),
        BinaryOp::Gt if u1 <= l2 => Some(false),
        BinaryOp::Ge if l1 >= u2 => Some(true),
        BinaryOp::Ge if u1 < l2 => Some(false),
        BinaryOp::Eq if same_constant => Some(true),
        BinaryOp::Eq if disjoint => Some(false),
        BinaryOp::Ne if disjoint => Some(true),
        BinaryOp::Ne if same_constant => Some(false),
        _ => None,
    };
    match decided {
        Some(true) => LatticeInterval::constant(1),
        Some(false) => LatticeInterval::constant(0),
        None => LatticeInterval::range(0, 1),
    }
}

fn logical(op: BinaryOp, lhs: &LatticeInterval, rhs: &LatticeInterval) -> LatticeInterval {
    if lhs.is_bottom() || rhs.is_bottom() {
        return LatticeInterval::Bottom;
    }
    let truthy = |v: &LatticeInterval| !v.contains(0);
    let falsy = |v: &LatticeInterval| v.as_constant() == Some(0);
    let decided = match op {
        BinaryOp::And if truthy(lhs) && truthy(rhs) => Some(true),
        BinaryOp::And if falsy(lhs) || falsy(rhs) => Some(false),
        BinaryOp::Or if truthy(lhs) || truthy(rhs) => Some(true),
        BinaryOp::Or if falsy(lhs) && falsy(rhs) => Some(false),
        _ => None,
    };
    match decided {
        Some(true) => LatticeInterval::constant(1),
        Some(false) => LatticeInterval::constant(0),
        None => LatticeInterval::range(0, 1),
    }
}

/// Drop a single value from the ends of an interval
fn exclude(current: &LatticeInterval, k: i64) -> LatticeInterval {
    let Some((lower, upper)) = current.bounds() else {
        return LatticeInterval::Bottom;
    };
    let point = Bound::Value(k);
    match (lower == point, upper == point) {
        (true, true) => LatticeInterval::Bottom,
        (true, false) => match k.checked_add(1) {
            Some(next) => LatticeInterval::Bounded {
                lower: Bound::Value(next),
                upper,
            },
            None => *current,
        },
        (false, true) => match k.checked_sub(1) {
            Some(prev) => LatticeInterval::Bounded {
                lower,
                upper: Bound::Value(prev),
            },
            None => *current,
        },
        (false, false) => *current,
    }
}

fn holds(op: BinaryOp, a: i128, b: i128) -> bool {
    match op {
        BinaryOp::Lt => a < b,
        BinaryOp::Le => a <= b,
        BinaryOp::Gt => a > b,
        BinaryOp::Ge => a >= b,
        BinaryOp::Eq => a == b,
        BinaryOp::Ne => a != b,
        _ => true,
    }
}

/// Number of times the body of `for (c = start; c <op> bound; c += step)` runs
fn trip_count(op: BinaryOp, start: i64, bound: i64, step: i64) -> Option<i64> {
    let (a, b, s) = (start as i128, bound as i128, step as i128);
    let count = match op {
        BinaryOp::Lt if s > 0 && a < b => (b - a + s - 1) / s,
        BinaryOp::Le if s > 0 && a <= b => (b - a) / s + 1,
        BinaryOp::Gt if s < 0 && a > b => (a - b - s - 1) / -s,
        BinaryOp::Ge if s < 0 && a >= b => (a - b) / -s + 1,
        BinaryOp::Ne if s == 1 && a <= b => b - a,
        BinaryOp::Ne if s == -1 && a >= b => a - b,
        _ if !holds(op, a, b) => 0,
        _ => return None,
    };
    i64::try_from(count).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::state::{DeclarationState, IntervalState};
    use crate::ir::bridge::{EvaluationOrderGraph, GraphBuilder, Identifier};

    struct Fixture {
        builder: GraphBuilder,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                builder: GraphBuilder::new(),
            }
        }

        fn lit(&mut self, v: i64) -> NodeId {
            self.builder.add(Kind::Literal { value: Some(v) })
        }

        fn var(&mut self, name: &str) -> NodeId {
            self.builder.add(Kind::Reference {
                name: name.into(),
                ty: "int".into(),
                declaration: None,
            })
        }

        fn bin(&mut self, op: BinaryOp, lhs: NodeId, rhs: NodeId) -> NodeId {
            self.builder.add(Kind::BinaryOperator {
                operator: op,
                lhs,
                rhs,
            })
        }

        fn assign(&mut self, op: AssignOp, lhs: NodeId, rhs: NodeId) -> NodeId {
            self.builder.add(Kind::Assignment {
                operator: op,
                lhs,
                rhs,
            })
        }

        fn unary(&mut self, op: UnaryOp, input: NodeId) -> NodeId {
            self.builder.add(Kind::UnaryOperator {
                operator: op,
                input,
            })
        }

        fn build(self) -> EvaluationOrderGraph {
            self.builder.build().unwrap()
        }
    }

    fn effect(graph: &EvaluationOrderGraph, node: NodeId, current: LatticeInterval) -> LatticeInterval {
        let name = Identifier::from("x");
        let state = IntervalState::new();
        let declarations = DeclarationState::new();
        let ctx = EffectContext {
            graph,
            name: &name,
            state: &state,
            declarations: &declarations,
        };
        IntegerValue.apply_effect(&ctx, &current, node).unwrap()
    }

    fn branch(
        graph: &EvaluationOrderGraph,
        node: NodeId,
        current: LatticeInterval,
        taken: bool,
    ) -> LatticeInterval {
        let name = Identifier::from("x");
        let state = IntervalState::new();
        let declarations = DeclarationState::new();
        let ctx = EffectContext {
            graph,
            name: &name,
            state: &state,
            declarations: &declarations,
        };
        IntegerValue.apply_branch(&ctx, &current, node, taken).unwrap()
    }

    #[test]
    fn declarations() {
        let mut f = Fixture::new();
        let five = f.lit(5);
        let init = f.builder.add(Kind::VariableDeclaration {
            name: "x".into(),
            ty: "int".into(),
            initializer: Some(five),
        });
        let bare = f.builder.add(Kind::VariableDeclaration {
            name: "x".into(),
            ty: "int".into(),
            initializer: None,
        });
        let other = f.builder.add(Kind::VariableDeclaration {
            name: "y".into(),
            ty: "int".into(),
            initializer: Some(five),
        });
        let graph = f.build();

        let bottom = LatticeInterval::Bottom;
        assert_eq!(effect(&graph, init, bottom), LatticeInterval::constant(5));
        assert_eq!(effect(&graph, bare, bottom), LatticeInterval::top());
        assert_eq!(
            effect(&graph, other, LatticeInterval::constant(1)),
            LatticeInterval::constant(1)
        );
        assert_eq!(effect(&graph, five, bottom), bottom);
    }

    #[test]
    fn increments_and_decrements() {
        let mut f = Fixture::new();
        let x1 = f.var("x");
        let inc = f.unary(UnaryOp::Increment, x1);
        let x2 = f.var("x");
        let dec = f.unary(UnaryOp::Decrement, x2);
        let y = f.var("y");
        let other = f.unary(UnaryOp::Increment, y);
        let graph = f.build();

        let one = LatticeInterval::constant(1);
        assert_eq!(effect(&graph, inc, one), LatticeInterval::constant(2));
        assert_eq!(effect(&graph, dec, one), LatticeInterval::constant(0));
        assert_eq!(effect(&graph, other, one), one);
    }

    #[test]
    fn assignments() {
        let mut f = Fixture::new();
        let node = |f: &mut Fixture, op: AssignOp, rhs: i64| {
            let lhs = f.var("x");
            let rhs = f.lit(rhs);
            f.assign(op, lhs, rhs)
        };
        let set = node(&mut f, AssignOp::Assign, 7);
        let add = node(&mut f, AssignOp::Add, 3);
        let sub = node(&mut f, AssignOp::Sub, 1);
        let mul = node(&mut f, AssignOp::Mul, -2);
        let div = node(&mut f, AssignOp::Div, 2);
        let rem = node(&mut f, AssignOp::Rem, 3);

        let x = f.var("x");
        let one = f.lit(1);
        let sum = f.bin(BinaryOp::Add, x, one);
        let lhs = f.var("x");
        let incr = f.assign(AssignOp::Assign, lhs, sum);

        let y = f.var("y");
        let seven = f.lit(7);
        let unrelated = f.assign(AssignOp::Assign, y, seven);
        let graph = f.build();

        let current = LatticeInterval::range(1, 4);
        assert_eq!(effect(&graph, set, current), LatticeInterval::constant(7));
        assert_eq!(effect(&graph, add, current), LatticeInterval::range(4, 7));
        assert_eq!(effect(&graph, sub, current), LatticeInterval::range(0, 3));
        assert_eq!(effect(&graph, mul, current), LatticeInterval::range(-8, -2));
        assert_eq!(effect(&graph, div, current), LatticeInterval::range(0, 2));
        assert_eq!(effect(&graph, rem, current), LatticeInterval::range(0, 2));
        assert_eq!(effect(&graph, incr, current), LatticeInterval::range(2, 5));
        assert_eq!(effect(&graph, unrelated, current), current);
    }

    #[test]
    fn comparisons_in_expressions() {
        let mut f = Fixture::new();
        let x = f.var("x");
        let three = f.lit(3);
        let less = f.bin(BinaryOp::Lt, x, three);
        let lhs = f.var("x");
        let store = f.assign(AssignOp::Assign, lhs, less);
        let graph = f.build();

        assert_eq!(
            effect(&graph, store, LatticeInterval::range(0, 1)),
            LatticeInterval::constant(1)
        );
        assert_eq!(
            effect(&graph, store, LatticeInterval::range(0, 5)),
            LatticeInterval::range(0, 1)
        );
        assert_eq!(
            effect(&graph, store, LatticeInterval::range(3, 6)),
            LatticeInterval::constant(0)
        );
    }

    #[test]
    fn branch_refinement() {
        let mut f = Fixture::new();
        let x = f.var("x");
        let ten = f.lit(10);
        let cond = f.bin(BinaryOp::Lt, x, ten);
        let branch_lt = f.builder.add(Kind::If { condition: cond });

        let ten2 = f.lit(10);
        let x2 = f.var("x");
        let flipped = f.bin(BinaryOp::Gt, ten2, x2);
        let branch_flipped = f.builder.add(Kind::If { condition: flipped });

        let x3 = f.var("x");
        let zero = f.lit(0);
        let ne = f.bin(BinaryOp::Ne, x3, zero);
        let branch_ne = f.builder.add(Kind::If { condition: ne });

        let y = f.var("y");
        let one = f.lit(1);
        let unrelated = f.bin(BinaryOp::Lt, y, one);
        let branch_other = f.builder.add(Kind::If {
            condition: unrelated,
        });
        let graph = f.build();

        let current = LatticeInterval::range(0, 20);
        assert_eq!(branch(&graph, branch_lt, current, true), LatticeInterval::range(0, 9));
        assert_eq!(branch(&graph, branch_lt, current, false), LatticeInterval::range(10, 20));
        assert_eq!(
            branch(&graph, branch_flipped, current, true),
            LatticeInterval::range(0, 9)
        );
        assert_eq!(
            branch(&graph, branch_lt, LatticeInterval::range(12, 15), true),
            LatticeInterval::Bottom
        );
        assert_eq!(branch(&graph, branch_ne, current, true), LatticeInterval::range(1, 20));
        assert_eq!(branch(&graph, branch_ne, current, false), LatticeInterval::constant(0));
        assert_eq!(
            branch(&graph, branch_ne, LatticeInterval::constant(0), true),
            LatticeInterval::Bottom
        );
        assert_eq!(branch(&graph, branch_other, current, true), current);
        assert_eq!(
            branch(&graph, branch_lt, LatticeInterval::Bottom, false),
            LatticeInterval::Bottom
        );
    }

    #[test]
    fn other_variables_read_their_lifetime() {
        // int y = 3; y = 5; int c = 0; c++; x = y + 1; x = c; x = z
        let mut f = Fixture::new();
        let three = f.lit(3);
        let dy = f.builder.add(Kind::VariableDeclaration {
            name: "y".into(),
            ty: "int".into(),
            initializer: Some(three),
        });
        let resolved = |f: &mut Fixture, name: &str, declaration: NodeId| {
            f.builder.add(Kind::Reference {
                name: name.into(),
                ty: "int".into(),
                declaration: Some(declaration),
            })
        };
        let y_lhs = resolved(&mut f, "y", dy);
        let five = f.lit(5);
        f.assign(AssignOp::Assign, y_lhs, five);

        let zero = f.lit(0);
        let dc = f.builder.add(Kind::VariableDeclaration {
            name: "c".into(),
            ty: "int".into(),
            initializer: Some(zero),
        });
        let c_inc = resolved(&mut f, "c", dc);
        f.unary(UnaryOp::Increment, c_inc);

        let y = resolved(&mut f, "y", dy);
        let one = f.lit(1);
        let sum = f.bin(BinaryOp::Add, y, one);
        let x1 = f.var("x");
        let from_y = f.assign(AssignOp::Assign, x1, sum);
        let c = resolved(&mut f, "c", dc);
        let x2 = f.var("x");
        let from_c = f.assign(AssignOp::Assign, x2, c);
        let z = f.var("z");
        let x3 = f.var("x");
        let from_z = f.assign(AssignOp::Assign, x3, z);
        let graph = f.build();

        let name = Identifier::from("x");
        let declarations = IntegerValue.lifetimes(&graph, &name);
        assert_eq!(declarations.value_of(&dy), LatticeInterval::range(3, 5));
        assert_eq!(declarations.value_of(&dc), LatticeInterval::at_least(0));
        assert_eq!(declarations.len(), 2);

        let state = IntervalState::new();
        let ctx = EffectContext {
            graph: &graph,
            name: &name,
            state: &state,
            declarations: &declarations,
        };
        let effect = |node| {
            IntegerValue
                .apply_effect(&ctx, &LatticeInterval::Bottom, node)
                .unwrap()
        };
        assert_eq!(effect(from_y), LatticeInterval::range(4, 6));
        assert_eq!(effect(from_c), LatticeInterval::at_least(0));
        assert_eq!(effect(from_z), LatticeInterval::top());
    }

    #[test]
    fn lifetimes_skip_the_tracked_variable() {
        let mut f = Fixture::new();
        let one = f.lit(1);
        let dx = f.builder.add(Kind::VariableDeclaration {
            name: "x".into(),
            ty: "int".into(),
            initializer: Some(one),
        });
        let ds = f.builder.add(Kind::VariableDeclaration {
            name: "s".into(),
            ty: "string".into(),
            initializer: None,
        });
        let graph = f.build();

        let declarations = IntegerValue.lifetimes(&graph, &Identifier::from("x"));
        assert_eq!(declarations.get(&dx), None);
        assert_eq!(declarations.get(&ds), None);
        assert_eq!(
            IntegerValue
                .lifetimes(&graph, &Identifier::from("y"))
                .value_of(&dx),
            LatticeInterval::constant(1)
        );
    }

    #[test]
    fn trip_counts() {
        assert_eq!(trip_count(BinaryOp::Lt, 0, 10, 1), Some(10));
        assert_eq!(trip_count(BinaryOp::Lt, 0, 10, 3), Some(4));
        assert_eq!(trip_count(BinaryOp::Le, 0, 10, 1), Some(11));
        assert_eq!(trip_count(BinaryOp::Gt, 10, 0, -1), Some(10));
        assert_eq!(trip_count(BinaryOp::Ge, 10, 0, -2), Some(6));
        assert_eq!(trip_count(BinaryOp::Ne, 2, 5, 1), Some(3));
        assert_eq!(trip_count(BinaryOp::Lt, 10, 0, 1), Some(0));
        assert_eq!(trip_count(BinaryOp::Lt, 0, 10, -1), None);
        assert_eq!(trip_count(BinaryOp::Ne, 0, 10, 2), None);
    }

    #[test]
    fn deep_expressions_are_rejected() {
        let mut f = Fixture::new();
        let mut expr = f.lit(1);
        for _ in 0..(MAX_EXPRESSION_DEPTH + 8) {
            expr = f.unary(UnaryOp::Plus, expr);
        }
        let lhs = f.var("x");
        let store = f.assign(AssignOp::Assign, lhs, expr);
        let graph = f.build();

        let name = Identifier::from("x");
        let state = IntervalState::new();
        let declarations = DeclarationState::new();
        let ctx = EffectContext {
            graph: &graph,
            name: &name,
            state: &state,
            declarations: &declarations,
        };
        assert!(matches!(
            IntegerValue.apply_effect(&ctx, &LatticeInterval::Bottom, store),
            Err(EngineError::InvariantViolation(_))
        ));
    }
}
