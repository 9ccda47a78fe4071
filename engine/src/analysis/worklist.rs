use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use log::{debug, trace};

use crate::analysis::interval::LatticeInterval;
use crate::analysis::state::TupleState;
use crate::analysis::value::{EffectContext, IntegerValue, Value};
use crate::error::{EngineError, EngineResult};
use crate::ir::bridge::{EvaluationOrderGraph, Identifier, NodeId};

/// Progress of a node towards its fixpoint
///
/// Nodes only move forward through these states, except that a `Done` node is
/// reopened when its input changes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum EvaluationState {
    Unvisited,
    NeedsWidening,
    NeedsNarrowing,
    Done,
}

/// Outcome of a fixpoint iteration
pub struct Fixpoint {
    /// per-node values, the lifetime ranges of the other variables and the
    /// lifetime range of the tracked one keyed by the start node
    pub state: TupleState,
    /// number of node visits it took
    pub steps: usize,
    status: HashMap<NodeId, EvaluationState>,
}

impl Fixpoint {
    pub fn status_of(&self, node: NodeId) -> EvaluationState {
        self.status
            .get(&node)
            .copied()
            .unwrap_or(EvaluationState::Unvisited)
    }
}

/// A widening/narrowing worklist over the evaluation-order graph
///
/// The output of a node is the effect of the node applied to its input, and the
/// input is the join of the outputs of its predecessors (refined along branch
/// outcomes). Nodes whose output grows are widened until stable, then narrowed.
/// Descending steps are only taken once no ascending work is left.
pub struct Worklist<'a, V: Value> {
    graph: &'a EvaluationOrderGraph,
    value: &'a V,
    name: &'a Identifier,
    start: NodeId,
    target: NodeId,
    seed: LatticeInterval,
    limit: Option<usize>,

    /// nodes that may be evaluated more than once
    cyclic: BTreeSet<NodeId>,
    status: HashMap<NodeId, EvaluationState>,
    /// input seen at the last visit of each node
    incoming: HashMap<NodeId, LatticeInterval>,
    visited: HashSet<NodeId>,
    queued: HashSet<NodeId>,
    ascending: VecDeque<NodeId>,
    descending: VecDeque<NodeId>,

    state: TupleState,
    steps: usize,
}

impl<'a, V: Value> Worklist<'a, V> {
    pub fn new(
        graph: &'a EvaluationOrderGraph,
        value: &'a V,
        name: &'a Identifier,
        start: NodeId,
        target: NodeId,
        seed: LatticeInterval,
    ) -> Self {
        Self {
            graph,
            value,
            name,
            start,
            target,
            seed,
            limit: None,
            cyclic: graph.cyclic_nodes(),
            status: HashMap::new(),
            incoming: HashMap::new(),
            visited: HashSet::new(),
            queued: HashSet::new(),
            ascending: VecDeque::new(),
            descending: VecDeque::new(),
            state: TupleState::new(),
            steps: 0,
        }
    }

    /// Give up after this many node visits
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn run(mut self) -> EngineResult<Fixpoint> {
        let lifetimes = IntegerValue.lifetimes(self.graph, self.name);
        for (declaration, lifetime) in lifetimes.iter() {
            self.state.change_declaration_state(*declaration, *lifetime);
        }
        self.state.set_general_state(self.start, self.seed);
        self.enqueue(self.start);

        while let Some(node) = self.pop() {
            self.steps += 1;
            if let Some(limit) = self.limit {
                if self.steps > limit {
                    return Err(EngineError::FixpointLimit(limit));
                }
            }
            self.visit(node)?;
        }
        debug!(
            "fixpoint for `{}` reached after {} visits",
            self.name, self.steps
        );

        // lifetime of the variable across every write
        let writers: Vec<_> = {
            let ctx = self.context();
            self.graph
                .nodes()
                .filter(|n| self.value.writes(&ctx, *n))
                .filter_map(|n| self.state.general().get(&n).copied())
                .collect()
        };
        for value in writers {
            self.state.push_to_declaration_state(self.start, value);
        }

        let Self {
            state,
            steps,
            status,
            ..
        } = self;
        Ok(Fixpoint {
            state,
            steps,
            status,
        })
    }
}

/// Queue handling
impl<'a, V: Value> Worklist<'a, V> {
    fn enqueue(&mut self, node: NodeId) {
        if !self.queued.insert(node) {
            return;
        }
        match self.status_of(node) {
            EvaluationState::NeedsNarrowing => self.descending.push_back(node),
            _ => self.ascending.push_back(node),
        }
    }

    fn pop(&mut self) -> Option<NodeId> {
        let node = self
            .ascending
            .pop_front()
            .or_else(|| self.descending.pop_front())?;
        self.queued.remove(&node);
        Some(node)
    }

    fn status_of(&self, node: NodeId) -> EvaluationState {
        self.status
            .get(&node)
            .copied()
            .unwrap_or(EvaluationState::Unvisited)
    }

    fn set_status(&mut self, node: NodeId, status: EvaluationState) {
        self.status.insert(node, status);
    }

    /// Move a node forward to `status`, never touching `Done` nodes
    fn promote(&mut self, node: NodeId, status: EvaluationState) -> bool {
        let current = self.status_of(node);
        if current == EvaluationState::Done || current >= status {
            return false;
        }
        self.set_status(node, status);
        true
    }

    /// Whether the outputs of the node flow into its successors
    fn propagates(&self, node: NodeId) -> bool {
        node != self.target || self.cyclic.contains(&self.target)
    }
}

/// Per-node steps
impl<'a, V: Value> Worklist<'a, V> {
    fn context(&self) -> EffectContext<'_> {
        EffectContext {
            graph: self.graph,
            name: self.name,
            state: self.state.general(),
            declarations: self.state.declarations(),
        }
    }

    fn input_of(&self, node: NodeId) -> EngineResult<LatticeInterval> {
        let ctx = self.context();
        let mut input = if node == self.start {
            self.seed
        } else {
            LatticeInterval::Bottom
        };
        for pred in self.graph.prev(node) {
            if !self.propagates(pred) {
                continue;
            }
            let Some(output) = self.state.general().get(&pred) else {
                continue;
            };
            let flowing = match self.graph.branch_of(pred, node) {
                Some(taken) => self.value.apply_branch(&ctx, output, pred, taken)?,
                None => *output,
            };
            input = input.join(&flowing);
        }
        Ok(input)
    }

    fn visit(&mut self, node: NodeId) -> EngineResult<()> {
        let input = self.input_of(node)?;
        let mut status = self.status_of(node);

        if status == EvaluationState::Done {
            let last = self.incoming.get(&node).copied();
            if last == Some(input) {
                self.settle_successors(node);
                return Ok(());
            }
            // a predecessor has not converged yet
            status = if last.map_or(false, |old| input.is_within(&old)) {
                EvaluationState::NeedsNarrowing
            } else if self.cyclic.contains(&node) {
                EvaluationState::NeedsWidening
            } else {
                EvaluationState::Unvisited
            };
            trace!("{} reopened as {:?}", node, status);
            self.set_status(node, status);
        }
        self.incoming.insert(node, input);

        let output = if node != self.start && input.is_bottom() {
            LatticeInterval::Bottom
        } else {
            self.value.apply_effect(&self.context(), &input, node)?
        };
        let prev = self.state.general().get(&node).copied();
        trace!(
            "visit {} [{:?}] in: {}, out: {}",
            node,
            status,
            input,
            output
        );

        let mut promoted = BTreeSet::new();
        let changed = match prev {
            Some(prev) if !prev.is_bottom() && status != EvaluationState::Unvisited => {
                match status {
                    EvaluationState::NeedsWidening => {
                        self.widen_step(node, prev, output, &mut promoted)
                    }
                    _ => self.narrow_step(node, prev, output, &mut promoted),
                }
            }
            _ => self.plain_step(node, status, prev, output),
        };

        if self.propagates(node) {
            for succ in self.graph.next(node) {
                if changed || promoted.contains(&succ) || !self.visited.contains(&succ) {
                    self.enqueue(succ);
                }
            }
        }
        self.visited.insert(node);
        Ok(())
    }

    /// Mark successors done when every path into them has converged
    fn settle_successors(&mut self, node: NodeId) {
        for succ in self.graph.next(node) {
            if self.graph.is_loop_head(succ)
                || !self.visited.contains(&succ)
                || self.queued.contains(&succ)
            {
                continue;
            }
            let preds = self.graph.prev(succ);
            if preds.len() == 1
                || preds
                    .iter()
                    .all(|p| self.status_of(*p) == EvaluationState::Done)
            {
                self.set_status(succ, EvaluationState::Done);
            }
        }
    }

    fn plain_step(
        &mut self,
        node: NodeId,
        status: EvaluationState,
        prev: Option<LatticeInterval>,
        output: LatticeInterval,
    ) -> bool {
        self.state.set_general_state(node, output);
        let changed = prev != Some(output);
        let revisited = self.visited.contains(&node);

        if status == EvaluationState::Unvisited {
            let widening = self.graph.is_loop_head(node)
                || (!self.graph.is_loop_end(node)
                    && self
                        .graph
                        .prev(node)
                        .iter()
                        .any(|p| self.status_of(*p) == EvaluationState::NeedsWidening))
                || (revisited && changed && self.cyclic.contains(&node));
            if widening {
                self.set_status(node, EvaluationState::NeedsWidening);
            } else if revisited && !changed {
                self.set_status(node, EvaluationState::Done);
            }
        } else if revisited && !changed && !self.graph.is_loop_head(node) {
            self.set_status(node, EvaluationState::Done);
        }
        changed
    }

    fn widen_step(
        &mut self,
        node: NodeId,
        prev: LatticeInterval,
        output: LatticeInterval,
        promoted: &mut BTreeSet<NodeId>,
    ) -> bool {
        let widened = prev.widen(&prev.join(&output));
        if widened != prev {
            self.state.set_general_state(node, widened);
            for succ in self.graph.next(node) {
                if !self.graph.is_loop_end(succ)
                    && self.promote(succ, EvaluationState::NeedsWidening)
                {
                    promoted.insert(succ);
                }
            }
            self.set_status(node, EvaluationState::NeedsNarrowing);
            self.enqueue(node);
            true
        } else if output != prev {
            self.set_status(node, EvaluationState::NeedsNarrowing);
            self.enqueue(node);
            false
        } else {
            if !self.graph.is_loop_head(node) {
                self.set_status(node, EvaluationState::Done);
            }
            false
        }
    }

    fn narrow_step(
        &mut self,
        node: NodeId,
        prev: LatticeInterval,
        output: LatticeInterval,
        promoted: &mut BTreeSet<NodeId>,
    ) -> bool {
        if !output.is_within(&prev) {
            // the output escaped, keep it sound
            self.state
                .set_general_state(node, prev.widen(&prev.join(&output)));
            self.enqueue(node);
            return true;
        }
        let narrowed = prev.narrow(&output);
        if narrowed != prev {
            self.state.set_general_state(node, narrowed);
            for succ in self.graph.next(node) {
                if self.promote(succ, EvaluationState::NeedsNarrowing) {
                    promoted.insert(succ);
                }
            }
            true
        } else {
            if !self.graph.is_loop_head(node) {
                self.set_status(node, EvaluationState::Done);
            }
            false
        }
    }
}
