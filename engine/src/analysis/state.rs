use crate::analysis::generic::{MapDomain, PairDomain};
use crate::analysis::interval::LatticeInterval;
use crate::ir::bridge::NodeId;

/// Interval of the tracked variable at every node
pub type IntervalState = MapDomain<NodeId, LatticeInterval>;

/// Interval of a variable over its lifetime, keyed by its declaration
pub type DeclarationState = MapDomain<NodeId, LatticeInterval>;

/// Both states side by side, the first component holds the declarations
pub type TupleState = PairDomain<DeclarationState, IntervalState>;

impl TupleState {
    pub fn new() -> Self {
        Self {
            first: DeclarationState::new(),
            second: IntervalState::new(),
        }
    }

    pub fn declarations(&self) -> &DeclarationState {
        &self.first
    }

    pub fn general(&self) -> &IntervalState {
        &self.second
    }

    /// Join into the lifetime interval of a declaration
    pub fn push_to_declaration_state(&mut self, declaration: NodeId, value: LatticeInterval) -> bool {
        self.first.push(declaration, value)
    }

    /// Replace the lifetime interval of a declaration
    pub fn change_declaration_state(&mut self, declaration: NodeId, value: LatticeInterval) {
        self.first.set(declaration, value)
    }

    /// Join into the interval stored for a node
    pub fn push_to_general_state(&mut self, node: NodeId, value: LatticeInterval) -> bool {
        self.second.push(node, value)
    }

    /// Replace the interval stored for a node
    pub fn set_general_state(&mut self, node: NodeId, value: LatticeInterval) {
        self.second.set(node, value)
    }

    /// The interval stored for a node, bottom when never computed
    pub fn interval_of(&self, node: NodeId) -> LatticeInterval {
        self.second.value_of(&node)
    }

    pub fn declared_interval_of(&self, declaration: NodeId) -> LatticeInterval {
        self.first.value_of(&declaration)
    }
}

#[cfg(test)]
mod tests {
    use petgraph::graph::NodeIndex;

    use super::*;
    use crate::analysis::generic::AbstractDomain;

    fn node(i: usize) -> NodeId {
        NodeId::from(NodeIndex::new(i))
    }

    #[test]
    fn components_are_updated_separately() {
        let mut state = TupleState::new();
        assert!(state.push_to_general_state(node(1), LatticeInterval::constant(3)));
        assert_eq!(state.declared_interval_of(node(1)), LatticeInterval::Bottom);

        state.change_declaration_state(node(0), LatticeInterval::constant(7));
        assert_eq!(state.interval_of(node(0)), LatticeInterval::Bottom);
        assert_eq!(state.declared_interval_of(node(0)), LatticeInterval::constant(7));
    }

    #[test]
    fn push_joins_and_change_overwrites() {
        let mut state = TupleState::new();
        assert!(state.push_to_declaration_state(node(0), LatticeInterval::constant(1)));
        assert!(state.push_to_declaration_state(node(0), LatticeInterval::constant(5)));
        assert!(!state.push_to_declaration_state(node(0), LatticeInterval::constant(2)));
        assert_eq!(state.declared_interval_of(node(0)), LatticeInterval::range(1, 5));

        state.change_declaration_state(node(0), LatticeInterval::constant(9));
        assert_eq!(state.declared_interval_of(node(0)), LatticeInterval::constant(9));

        state.set_general_state(node(2), LatticeInterval::range(0, 4));
        state.set_general_state(node(2), LatticeInterval::constant(1));
        assert_eq!(state.interval_of(node(2)), LatticeInterval::constant(1));
    }

    #[test]
    fn duplicates_are_independent() {
        let mut state = TupleState::new();
        state.set_general_state(node(1), LatticeInterval::constant(1));
        let mut copy = state.clone();
        copy.push_to_general_state(node(1), LatticeInterval::constant(2));
        assert_eq!(state.interval_of(node(1)), LatticeInterval::constant(1));
        assert_eq!(copy.interval_of(node(1)), LatticeInterval::range(1, 2));

        let joined = state.join(&copy);
        assert_eq!(joined, copy);
    }
}
