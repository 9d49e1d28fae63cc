use crate::graph::NodeId;
use thiserror::Error;

/// Everything that can go wrong while turning hyperparameters and a
/// dictionary into a model. All of these are raised before any graph
/// node is allocated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Model name {0:?} names no cell family (expected \"srn\" or \"lstm\")")]
    UnknownCellFamily(String),

    #[error("Model name {0:?} names both \"srn\" and \"lstm\"")]
    AmbiguousCellFamily(String),

    #[error("Model name {0:?} names no output head (expected \"_sm\" or \"_hsm\")")]
    UnknownOutputHead(String),

    #[error("Model name {0:?} names both \"_sm\" and \"_hsm\"")]
    AmbiguousOutputHead(String),

    #[error("SRN cells need a non_linearity (relu or sigmoid)")]
    MissingNonLinearity,

    #[error("Unsupported non_linearity {0:?}, expected relu or sigmoid")]
    InvalidNonLinearity(String),

    #[error("Number of classes must be positive")]
    ZeroClasses,

    #[error("n_hidden must be positive")]
    ZeroHidden,

    #[error("Hierarchical output head needs a dictionary class mapping")]
    MissingClusterMapping,

    #[error("Malformed class mapping: {0}")]
    MalformedClusterMapping(String),
}

/// Failures while evaluating a built graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("Shape mismatch at node {node}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        node: NodeId,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Index {index} out of bounds for {bound} classes")]
    IndexOutOfBounds { index: usize, bound: usize },

    #[error("No value fed for input {0:?}")]
    MissingInput(String),

    #[error("Input {0:?} was fed the wrong kind of value")]
    WrongFeedKind(String),

    #[error("Node {node} does not hold a {expected} value")]
    UnexpectedValueKind {
        node: NodeId,
        expected: &'static str,
    },

    #[error("Node {0} does not belong to this graph")]
    UnknownNode(NodeId),

    #[error("Batch must contain at least one row")]
    EmptyBatch,

    #[error("Expected {expected} state, got {found} state")]
    StateMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
