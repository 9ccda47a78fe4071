use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::error::{EngineError, EngineResult};
use crate::ir::adapter;
use crate::ir::bridge::node::{AssignOp, BinaryOp, Kind, NodeId, UnaryOp};
use crate::ir::bridge::shared::Identifier;

/// A representation of evaluation-order edges
#[derive(Eq, PartialEq, Clone, Debug)]
pub struct Edge {
    /// outcome of the branching source this edge belongs to, if labelled
    pub branch: Option<bool>,
}

/// A read-only execution-order graph
///
/// The successors and predecessors of a node are reported in the order their
/// edges were added. For loop heads this order is meaningful: the successor at
/// index 0 enters the loop body and the one at index 1 leaves the loop.
pub struct EvaluationOrderGraph {
    graph: DiGraph<Kind, Edge>,
}

impl EvaluationOrderGraph {
    pub fn contains(&self, node: NodeId) -> bool {
        self.graph.node_weight(node.index()).is_some()
    }

    pub fn kind(&self, node: NodeId) -> Option<&Kind> {
        self.graph.node_weight(node.index())
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices().map(NodeId::from)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    fn neighbors(&self, node: NodeId, direction: Direction) -> Vec<NodeId> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(node.index(), direction)
            .map(|e| {
                let other = match direction {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                (e.id(), NodeId::from(other))
            })
            .collect();
        edges.sort_by_key(|(id, _)| *id);
        edges.into_iter().map(|(_, n)| n).collect()
    }

    /// Ordered successors
    pub fn next(&self, node: NodeId) -> Vec<NodeId> {
        self.neighbors(node, Direction::Outgoing)
    }

    /// Ordered predecessors
    pub fn prev(&self, node: NodeId) -> Vec<NodeId> {
        self.neighbors(node, Direction::Incoming)
    }

    /// Which outcome of `from` leads to `to`
    ///
    /// Explicit edge labels take precedence, otherwise the successors of a
    /// branching node are read positionally (true first, false second).
    pub fn branch_of(&self, from: NodeId, to: NodeId) -> Option<bool> {
        let edge = self.graph.find_edge(from.index(), to.index())?;
        if let Some(label) = self.graph[edge].branch {
            return Some(label);
        }
        let kind = self.kind(from)?;
        if kind.condition().is_none() && !kind.is_loop() {
            return None;
        }
        match self.next(from).iter().position(|n| *n == to) {
            Some(0) => Some(true),
            Some(1) => Some(false),
            _ => None,
        }
    }

    pub fn is_loop_head(&self, node: NodeId) -> bool {
        self.kind(node).map_or(false, |k| k.is_loop())
    }

    /// Whether the edge `from -> to` leaves the loop headed by `from`
    pub fn is_loop_exit_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.is_loop_head(from) && self.next(from).get(1) == Some(&to)
    }

    /// Whether the node is the first one evaluated after leaving a loop
    pub fn is_loop_end(&self, node: NodeId) -> bool {
        self.prev(node)
            .into_iter()
            .any(|p| self.is_loop_exit_edge(p, node))
    }

    /// Resolve the declaration a reference (or a declaration itself) belongs to
    pub fn declaration_of(&self, node: NodeId) -> Option<NodeId> {
        match self.kind(node)? {
            Kind::Reference { declaration, .. } => *declaration,
            Kind::VariableDeclaration { .. } => Some(node),
            _ => None,
        }
    }

    /// The declared type string of a reference or declaration
    pub fn declared_type(&self, node: NodeId) -> Option<&str> {
        match self.kind(node)? {
            Kind::Reference { ty, .. } | Kind::VariableDeclaration { ty, .. } => Some(ty.as_str()),
            _ => None,
        }
    }

    /// The variable name carried by a reference or declaration
    pub fn name_of(&self, node: NodeId) -> Option<&Identifier> {
        match self.kind(node)? {
            Kind::Reference { name, .. } | Kind::VariableDeclaration { name, .. } => Some(name),
            _ => None,
        }
    }

    /// The strongly connected component the node belongs to
    pub fn cycle_of(&self, node: NodeId) -> BTreeSet<NodeId> {
        tarjan_scc(&self.graph)
            .into_iter()
            .find(|scc| scc.contains(&node.index()))
            .map(|scc| scc.into_iter().map(NodeId::from).collect())
            .unwrap_or_default()
    }

    /// Whether the node can be reached again after being evaluated
    pub fn on_cycle(&self, node: NodeId) -> bool {
        self.graph.contains_edge(node.index(), node.index()) || self.cycle_of(node).len() > 1
    }

    /// Every node that can be reached again after being evaluated
    pub fn cyclic_nodes(&self) -> BTreeSet<NodeId> {
        let mut result = BTreeSet::new();
        for scc in tarjan_scc(&self.graph) {
            let looping = match scc.as_slice() {
                [single] => self.graph.contains_edge(*single, *single),
                _ => true,
            };
            if looping {
                result.extend(scc.into_iter().map(NodeId::from));
            }
        }
        result
    }

    /// Convert a deserialized graph description
    pub fn convert(adapted: &adapter::eog::Graph) -> EngineResult<Self> {
        use adapter::node::Repr;

        // external ids map onto positions in the node list
        let mut ids = BTreeMap::new();
        for (pos, node) in adapted.nodes.iter().enumerate() {
            if ids
                .insert(node.id, NodeId::from(NodeIndex::new(pos)))
                .is_some()
            {
                return Err(EngineError::InvariantViolation(format!(
                    "duplicated node id {}",
                    node.id
                )));
            }
        }
        let lookup = |id: &usize| -> EngineResult<NodeId> {
            ids.get(id).copied().ok_or_else(|| {
                EngineError::InvariantViolation(format!("unknown node id {}", id))
            })
        };
        let lookup_opt = |id: &Option<usize>| -> EngineResult<Option<NodeId>> {
            id.as_ref().map(lookup).transpose()
        };

        let mut builder = GraphBuilder::new();
        for node in &adapted.nodes {
            let kind = match &node.repr {
                Repr::VariableDeclaration {
                    name,
                    ty,
                    initializer,
                } => Kind::VariableDeclaration {
                    name: name.into(),
                    ty: ty.clone(),
                    initializer: lookup_opt(initializer)?,
                },
                Repr::Reference {
                    name,
                    ty,
                    declaration,
                } => Kind::Reference {
                    name: name.into(),
                    ty: ty.clone(),
                    declaration: lookup_opt(declaration)?,
                },
                Repr::Literal { value } => Kind::Literal { value: *value },
                Repr::UnaryOperator { operator, input } => Kind::UnaryOperator {
                    operator: UnaryOp::parse(operator)?,
                    input: lookup(input)?,
                },
                Repr::BinaryOperator { operator, lhs, rhs } => Kind::BinaryOperator {
                    operator: BinaryOp::parse(operator)?,
                    lhs: lookup(lhs)?,
                    rhs: lookup(rhs)?,
                },
                Repr::Assignment { operator, lhs, rhs } => Kind::Assignment {
                    operator: AssignOp::parse(operator)?,
                    lhs: lookup(lhs)?,
                    rhs: lookup(rhs)?,
                },
                Repr::ArrayCreation { dimension } => Kind::ArrayCreation {
                    dimension: lookup_opt(dimension)?,
                },
                Repr::InitializerList { elements } => Kind::InitializerList {
                    elements: elements.iter().map(lookup).collect::<EngineResult<_>>()?,
                },
                Repr::Subscript { base, index } => Kind::Subscript {
                    base: lookup(base)?,
                    index: lookup(index)?,
                },
                Repr::Call { name, arguments } => Kind::Call {
                    name: name.into(),
                    arguments: arguments.iter().map(lookup).collect::<EngineResult<_>>()?,
                },
                Repr::If { condition } => Kind::If {
                    condition: lookup(condition)?,
                },
                Repr::For {
                    initializer,
                    condition,
                    iteration,
                } => Kind::For {
                    initializer: lookup_opt(initializer)?,
                    condition: lookup_opt(condition)?,
                    iteration: lookup_opt(iteration)?,
                },
                Repr::While { condition } => Kind::While {
                    condition: lookup(condition)?,
                },
                Repr::DoWhile { condition } => Kind::DoWhile {
                    condition: lookup(condition)?,
                },
                Repr::ForEach { variable, iterable } => Kind::ForEach {
                    variable: lookup(variable)?,
                    iterable: lookup(iterable)?,
                },
                Repr::Other { label } => Kind::Other {
                    label: label.clone(),
                },
            };
            builder.add(kind);
        }

        for edge in &adapted.edges {
            let from = lookup(&edge.from)?;
            let to = lookup(&edge.to)?;
            match edge.branch {
                None => builder.connect(from, to),
                Some(taken) => builder.connect_branch(from, to, taken),
            };
        }
        builder.build()
    }
}

/// Incrementally assembles an [`EvaluationOrderGraph`]
#[derive(Default)]
pub struct GraphBuilder {
    nodes: Vec<Kind>,
    edges: Vec<(NodeId, NodeId, Edge)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node, children may refer to nodes added later
    pub fn add(&mut self, kind: Kind) -> NodeId {
        let id = NodeId::from(NodeIndex::new(self.nodes.len()));
        self.nodes.push(kind);
        id
    }

    pub fn connect(&mut self, from: NodeId, to: NodeId) -> &mut Self {
        self.edges.push((from, to, Edge { branch: None }));
        self
    }

    pub fn connect_branch(&mut self, from: NodeId, to: NodeId, taken: bool) -> &mut Self {
        self.edges.push((
            from,
            to,
            Edge {
                branch: Some(taken),
            },
        ));
        self
    }

    /// Chain the nodes in evaluation order
    pub fn sequence(&mut self, nodes: &[NodeId]) -> &mut Self {
        for pair in nodes.windows(2) {
            self.connect(pair[0], pair[1]);
        }
        self
    }

    pub fn build(self) -> EngineResult<EvaluationOrderGraph> {
        let Self { nodes, edges } = self;
        let count = nodes.len();
        let exists = |n: &NodeId| n.index().index() < count;

        // check the references between nodes
        for (pos, kind) in nodes.iter().enumerate() {
            for child in kind.children() {
                if !exists(&child) {
                    return Err(EngineError::InvariantViolation(format!(
                        "node #{} refers to a missing node {}",
                        pos, child
                    )));
                }
            }
            if let Kind::Reference {
                declaration: Some(decl),
                ..
            } = kind
            {
                let target = &nodes[decl.index().index()];
                if !matches!(target, Kind::VariableDeclaration { .. }) {
                    return Err(EngineError::InvariantViolation(format!(
                        "reference #{} resolves to a {} node",
                        pos,
                        target.label()
                    )));
                }
            }
        }

        let mut graph = DiGraph::with_capacity(count, edges.len());
        for kind in nodes {
            graph.add_node(kind);
        }

        let mut seen = BTreeSet::new();
        for (from, to, edge) in edges {
            if !exists(&from) || !exists(&to) {
                return Err(EngineError::InvariantViolation(format!(
                    "edge {} -> {} has a missing endpoint",
                    from, to
                )));
            }
            if !seen.insert((from, to)) {
                return Err(EngineError::InvariantViolation(
                    "duplicated edge in EOG".into(),
                ));
            }
            graph.add_edge(from.index(), to.index(), edge);
        }

        // a loop head leads into its body and out of the loop
        for index in graph.node_indices() {
            let exits = graph.neighbors_directed(index, Direction::Outgoing).count();
            if graph[index].is_loop() && exits < 2 {
                return Err(EngineError::InvariantViolation(format!(
                    "loop head {} has {} successor(s)",
                    NodeId::from(index),
                    exits
                )));
            }
        }

        Ok(EvaluationOrderGraph { graph })
    }
}
