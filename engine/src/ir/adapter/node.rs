use serde::{Deserialize, Serialize};

/// Shapes of the graph vertices, children are referred to by node id
#[derive(Serialize, Deserialize)]
pub enum Repr {
    VariableDeclaration {
        name: String,
        ty: String,
        initializer: Option<usize>,
    },
    Reference {
        name: String,
        ty: String,
        declaration: Option<usize>,
    },
    Literal {
        value: Option<i64>,
    },
    UnaryOperator {
        operator: String,
        input: usize,
    },
    BinaryOperator {
        operator: String,
        lhs: usize,
        rhs: usize,
    },
    Assignment {
        operator: String,
        lhs: usize,
        rhs: usize,
    },
    ArrayCreation {
        dimension: Option<usize>,
    },
    InitializerList {
        elements: Vec<usize>,
    },
    Subscript {
        base: usize,
        index: usize,
    },
    Call {
        name: String,
        arguments: Vec<usize>,
    },
    If {
        condition: usize,
    },
    For {
        initializer: Option<usize>,
        condition: Option<usize>,
        iteration: Option<usize>,
    },
    While {
        condition: usize,
    },
    DoWhile {
        condition: usize,
    },
    ForEach {
        variable: usize,
        iterable: usize,
    },
    Other {
        label: String,
    },
}

#[derive(Serialize, Deserialize)]
pub struct Node {
    /// a unique id for the node
    pub id: usize,
    /// the actual representation of the node
    pub repr: Repr,
}
