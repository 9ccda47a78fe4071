use std::error::Error;
use std::fmt::{Display, Formatter};

/// A list of inputs the engine does not handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unsupported {
    /// A declared type that maps onto no effect function
    TargetType(String),
    /// An evaluation target that is not a variable reference
    TargetNode(String),
    /// An operator spelling outside the known vocabulary
    Operator(String),
}

impl Display for Unsupported {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TargetType(name) => {
                write!(f, "target type `{}`", name)
            }
            Self::TargetNode(kind) => {
                write!(f, "evaluation target of kind {}", kind)
            }
            Self::Operator(op) => {
                write!(f, "operator `{}`", op)
            }
        }
    }
}

/// A custom error message for the analysis engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Invalid assumption made about the input graph
    InvalidAssumption(String),
    /// Operation not supported yet
    NotSupportedYet(Unsupported),
    /// Invariant violation
    InvariantViolation(String),
    /// Arithmetic with no defined result, e.g., adding opposite infinities
    UndefinedArithmetic(String),
    /// The fixpoint iteration exceeded its visit budget
    FixpointLimit(usize),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAssumption(msg) => {
                write!(f, "[absint::assumption] {}", msg)
            }
            Self::NotSupportedYet(item) => {
                write!(f, "[absint::unsupported] {}", item)
            }
            Self::InvariantViolation(msg) => {
                write!(f, "[absint::invariant] {}", msg)
            }
            Self::UndefinedArithmetic(msg) => {
                write!(f, "[absint::arithmetic] {}", msg)
            }
            Self::FixpointLimit(limit) => {
                write!(f, "[absint::fixpoint] no convergence within {} visits", limit)
            }
        }
    }
}

impl Error for EngineError {}
