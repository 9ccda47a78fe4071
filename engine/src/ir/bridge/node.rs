use std::fmt::{Display, Formatter};

use petgraph::graph::NodeIndex;
use serde::Serialize;

use crate::error::{EngineError, EngineResult, Unsupported};
use crate::ir::bridge::shared::Identifier;

/// Identity of a vertex in the execution-order graph
#[derive(Eq, PartialEq, Ord, PartialOrd, Hash, Copy, Clone, Debug)]
pub struct NodeId(NodeIndex);

impl NodeId {
    pub(crate) fn index(&self) -> NodeIndex {
        self.0
    }
}

impl From<NodeIndex> for NodeId {
    fn from(index: NodeIndex) -> Self {
        Self(index)
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0.index())
    }
}

impl Serialize for NodeId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0.index() as u64)
    }
}

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum UnaryOp {
    Increment,
    Decrement,
    Negate,
    Plus,
    Not,
}

impl UnaryOp {
    pub fn parse(op: &str) -> EngineResult<Self> {
        let parsed = match op {
            "++" => Self::Increment,
            "--" => Self::Decrement,
            "-" => Self::Negate,
            "+" => Self::Plus,
            "!" => Self::Not,
            _ => {
                return Err(EngineError::NotSupportedYet(Unsupported::Operator(
                    op.to_string(),
                )))
            }
        };
        Ok(parsed)
    }
}

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    pub fn parse(op: &str) -> EngineResult<Self> {
        let parsed = match op {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "%" => Self::Rem,
            "<" => Self::Lt,
            "<=" => Self::Le,
            ">" => Self::Gt,
            ">=" => Self::Ge,
            "==" => Self::Eq,
            "!=" => Self::Ne,
            "&&" => Self::And,
            "||" => Self::Or,
            _ => {
                return Err(EngineError::NotSupportedYet(Unsupported::Operator(
                    op.to_string(),
                )))
            }
        };
        Ok(parsed)
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Lt | Self::Le | Self::Gt | Self::Ge | Self::Eq | Self::Ne
        )
    }

    /// The comparison that holds exactly when this one does not
    pub fn negate(&self) -> Option<Self> {
        let negated = match self {
            Self::Lt => Self::Ge,
            Self::Le => Self::Gt,
            Self::Gt => Self::Le,
            Self::Ge => Self::Lt,
            Self::Eq => Self::Ne,
            Self::Ne => Self::Eq,
            _ => return None,
        };
        Some(negated)
    }

    /// The comparison with its operands swapped, `a < b` becomes `b > a`
    pub fn flip(&self) -> Option<Self> {
        let flipped = match self {
            Self::Lt => Self::Gt,
            Self::Le => Self::Ge,
            Self::Gt => Self::Lt,
            Self::Ge => Self::Le,
            Self::Eq => Self::Eq,
            Self::Ne => Self::Ne,
            _ => return None,
        };
        Some(flipped)
    }
}

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl AssignOp {
    pub fn parse(op: &str) -> EngineResult<Self> {
        let parsed = match op {
            "=" => Self::Assign,
            "+=" => Self::Add,
            "-=" => Self::Sub,
            "*=" => Self::Mul,
            "/=" => Self::Div,
            "%=" => Self::Rem,
            _ => {
                return Err(EngineError::NotSupportedYet(Unsupported::Operator(
                    op.to_string(),
                )))
            }
        };
        Ok(parsed)
    }
}

/// Shapes of the vertices the analysis distinguishes
#[derive(Eq, PartialEq, Clone, Debug)]
pub enum Kind {
    VariableDeclaration {
        name: Identifier,
        ty: String,
        initializer: Option<NodeId>,
    },
    Reference {
        name: Identifier,
        ty: String,
        /// the declaration this reference resolves to
        declaration: Option<NodeId>,
    },
    /// an integer literal, `None` for literals of any other type
    Literal { value: Option<i64> },
    UnaryOperator { operator: UnaryOp, input: NodeId },
    BinaryOperator {
        operator: BinaryOp,
        lhs: NodeId,
        rhs: NodeId,
    },
    Assignment {
        operator: AssignOp,
        lhs: NodeId,
        rhs: NodeId,
    },
    ArrayCreation { dimension: Option<NodeId> },
    InitializerList { elements: Vec<NodeId> },
    Subscript { base: NodeId, index: NodeId },
    Call {
        name: Identifier,
        arguments: Vec<NodeId>,
    },
    If { condition: NodeId },
    For {
        initializer: Option<NodeId>,
        condition: Option<NodeId>,
        iteration: Option<NodeId>,
    },
    While { condition: NodeId },
    DoWhile { condition: NodeId },
    ForEach { variable: NodeId, iterable: NodeId },
    Other { label: String },
}

impl Kind {
    /// Nodes whose second successor leaves the loop
    pub fn is_loop(&self) -> bool {
        matches!(
            self,
            Self::For { .. } | Self::While { .. } | Self::DoWhile { .. } | Self::ForEach { .. }
        )
    }

    /// Condition guarding the successors of a branching node
    pub fn condition(&self) -> Option<NodeId> {
        match self {
            Self::If { condition } | Self::While { condition } | Self::DoWhile { condition } => {
                Some(*condition)
            }
            Self::For { condition, .. } => *condition,
            _ => None,
        }
    }

    /// Every node this node refers to
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Self::VariableDeclaration { initializer, .. } => initializer.iter().copied().collect(),
            Self::Reference { declaration, .. } => declaration.iter().copied().collect(),
            Self::Literal { .. } | Self::Other { .. } => vec![],
            Self::UnaryOperator { input, .. } => vec![*input],
            Self::BinaryOperator { lhs, rhs, .. } | Self::Assignment { lhs, rhs, .. } => {
                vec![*lhs, *rhs]
            }
            Self::ArrayCreation { dimension } => dimension.iter().copied().collect(),
            Self::InitializerList { elements } => elements.clone(),
            Self::Subscript { base, index } => vec![*base, *index],
            Self::Call { arguments, .. } => arguments.clone(),
            Self::If { condition } | Self::While { condition } | Self::DoWhile { condition } => {
                vec![*condition]
            }
            Self::For {
                initializer,
                condition,
                iteration,
            } => initializer
                .iter()
                .chain(condition.iter())
                .chain(iteration.iter())
                .copied()
                .collect(),
            Self::ForEach { variable, iterable } => vec![*variable, *iterable],
        }
    }

    /// Short name used in diagnostics
    pub fn label(&self) -> &str {
        match self {
            Self::VariableDeclaration { .. } => "declaration",
            Self::Reference { .. } => "reference",
            Self::Literal { .. } => "literal",
            Self::UnaryOperator { .. } => "unary operator",
            Self::BinaryOperator { .. } => "binary operator",
            Self::Assignment { .. } => "assignment",
            Self::ArrayCreation { .. } => "array creation",
            Self::InitializerList { .. } => "initializer list",
            Self::Subscript { .. } => "subscript",
            Self::Call { .. } => "call",
            Self::If { .. } => "if",
            Self::For { .. } => "for",
            Self::While { .. } => "while",
            Self::DoWhile { .. } => "do-while",
            Self::ForEach { .. } => "for-each",
            Self::Other { label } => label.as_str(),
        }
    }
}
