//! Static computation graphs stored as an arena of nodes.
//!
//! Nodes are appended in topological order and refer to their inputs by
//! [`NodeId`]. A node may feed any number of consumers (fan-out) and an
//! operation may combine several producers (fan-in), so an LSTM cell is a
//! genuine DAG rather than a pipeline.

mod builder;
mod exec;
mod parameter;

pub use builder::GraphBuilder;
pub use exec::{Trace, Value};
pub use parameter::{ParamId, Parameter};

use crate::nn::layers::{Embedding, HierarchicalSoftmax, Linear};
use crate::ops::{Activation, BinaryOp};
use std::fmt;

/// Stable handle to a node inside one [`Graph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// What an input node expects to be fed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    /// `[batch, width]` activations (recurrent state)
    Dense { width: usize },
    /// One class index per batch row (tokens, targets)
    Indices,
}

#[derive(Debug)]
pub enum Op {
    Input(InputKind),
    /// Lookup table, `n_classes -> width`
    Embedding(Embedding),
    /// Linear map with optional bias
    Projection(Linear),
    Elementwise(BinaryOp),
    Activation(Activation),
    /// Fused projection + two-level softmax loss; inputs are (hidden, target)
    HierarchicalLoss(HierarchicalSoftmax),
}

impl Op {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Input(InputKind::Dense { .. }) => "input",
            Self::Input(InputKind::Indices) => "index_input",
            Self::Embedding(_) => "embedding",
            Self::Projection(_) => "projection",
            Self::Elementwise(op) => op.name(),
            Self::Activation(act) => act.name(),
            Self::HierarchicalLoss(_) => "hierarchical_loss",
        }
    }
}

#[derive(Debug)]
pub struct Node {
    pub op: Op,
    pub inputs: Vec<NodeId>,
    /// Feature width of the output (`[batch, width]`); 1 for losses and
    /// index inputs.
    pub width: usize,
    pub label: Option<String>,
}

impl Node {
    /// Label if present, else the op name
    #[must_use]
    pub fn display_name(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| self.op.name().to_string())
    }
}

/// Immutable computation graph plus the parameters its nodes own.
#[derive(Debug)]
pub struct Graph {
    nodes: Vec<Node>,
    parameters: Vec<Parameter>,
}

impl Graph {
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Nodes that read `id`, in arena order. A consumer that reads `id`
    /// twice is listed once.
    #[must_use]
    pub fn consumers(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes()
            .filter(|(_, n)| n.inputs.contains(&id))
            .map(|(i, _)| i)
            .collect()
    }

    /// First node carrying `label`
    #[must_use]
    pub fn find(&self, label: &str) -> Option<NodeId> {
        self.nodes()
            .find(|(_, n)| n.label.as_deref() == Some(label))
            .map(|(i, _)| i)
    }

    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    #[must_use]
    pub fn parameter(&self, id: ParamId) -> Option<&Parameter> {
        self.parameters.get(id.0)
    }

    #[must_use]
    pub fn parameter_by_name(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name() == name)
    }

    #[must_use]
    pub fn parameter_id(&self, name: &str) -> Option<ParamId> {
        self.parameters
            .iter()
            .position(|p| p.name() == name)
            .map(ParamId)
    }

    /// Parameter lookup for ids minted by this graph's builder.
    pub(crate) fn param(&self, id: ParamId) -> &Parameter {
        &self.parameters[id.0]
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, node) in self.nodes() {
            let args: Vec<String> = node.inputs.iter().map(ToString::to_string).collect();
            write!(f, "{id} = {}({}) [{}]", node.op.name(), args.join(", "), node.width)?;
            if let Some(label) = &node.label {
                write!(f, " {label}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
