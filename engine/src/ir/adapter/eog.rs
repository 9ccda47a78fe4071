use serde::{Deserialize, Serialize};

use crate::ir::adapter::node::Node;

#[derive(Serialize, Deserialize)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    /// which outcome of a branching node this edge represents
    #[serde(default)]
    pub branch: Option<bool>,
}

/// A serialized execution-order graph, edges of a node keep their listed order
#[derive(Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}
