use crate::config::{ClusterMapping, OutputHeadKind};
use crate::error::EvalError;
use crate::graph::{Graph, GraphBuilder, NodeId, Trace, Value};
use crate::ops::Activation;
use crate::tensor::Tensor;
use tracing::debug;

/// `hidden -> log-probabilities over every class`
///
/// A bias-free projection followed by log-softmax, applied independently
/// at each time step.
#[derive(Debug)]
pub struct DenseHead {
    graph: Graph,
    hidden: NodeId,
    output: NodeId,
    n_classes: usize,
}

impl DenseHead {
    #[must_use]
    pub fn build(n_hidden: usize, n_classes: usize) -> Self {
        let mut b = GraphBuilder::new();
        let hidden = b.dense_input("hidden", n_hidden);
        let logits = b.projection("decoder", hidden, n_classes, false);
        let output = b.activation(Activation::LogSoftmax, logits);
        let graph = b.build();
        debug!(n_hidden, n_classes, "built dense output head");
        Self {
            graph,
            hidden,
            output,
            n_classes,
        }
    }

    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    #[must_use]
    pub const fn hidden_input(&self) -> NodeId {
        self.hidden
    }

    #[must_use]
    pub const fn output(&self) -> NodeId {
        self.output
    }

    #[must_use]
    pub const fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn trace(&self, hidden: &Tensor) -> Result<Trace, EvalError> {
        self.graph
            .forward(vec![(self.hidden, Value::Dense(hidden.clone()))])
    }

    /// `[batch, n_classes]` log-probabilities
    pub fn forward(&self, hidden: &Tensor) -> Result<Tensor, EvalError> {
        let trace = self.trace(hidden)?;
        Ok(trace.dense(self.output)?.clone())
    }
}

/// `(hidden, target) -> scalar loss` through a class-clustered softmax.
#[derive(Debug)]
pub struct HierarchicalHead {
    graph: Graph,
    hidden: NodeId,
    target: NodeId,
    loss: NodeId,
    n_classes: usize,
    n_clusters: usize,
}

impl HierarchicalHead {
    #[must_use]
    pub fn build(n_hidden: usize, mapping: ClusterMapping) -> Self {
        let (n_classes, n_clusters) = (mapping.n_classes(), mapping.n_clusters());
        let mut b = GraphBuilder::new();
        let hidden = b.dense_input("hidden", n_hidden);
        let target = b.index_input("target");
        let loss = b.hierarchical_loss("decoder_with_loss", hidden, target, mapping);
        let graph = b.build();
        debug!(n_hidden, n_classes, n_clusters, "built hierarchical output head");
        Self {
            graph,
            hidden,
            target,
            loss,
            n_classes,
            n_clusters,
        }
    }

    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    #[must_use]
    pub const fn hidden_input(&self) -> NodeId {
        self.hidden
    }

    #[must_use]
    pub const fn target_input(&self) -> NodeId {
        self.target
    }

    #[must_use]
    pub const fn output(&self) -> NodeId {
        self.loss
    }

    #[must_use]
    pub const fn n_classes(&self) -> usize {
        self.n_classes
    }

    #[must_use]
    pub const fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    pub fn trace(&self, hidden: &Tensor, targets: &[usize]) -> Result<Trace, EvalError> {
        self.graph.forward(vec![
            (self.hidden, Value::Dense(hidden.clone())),
            (self.target, Value::Indices(targets.to_vec())),
        ])
    }

    /// Mean negative log-likelihood of `targets`, as a `[1]` tensor
    pub fn loss(&self, hidden: &Tensor, targets: &[usize]) -> Result<Tensor, EvalError> {
        let trace = self.trace(hidden, targets)?;
        Ok(trace.dense(self.loss)?.clone())
    }
}

/// The one output head a model carries.
#[derive(Debug)]
pub enum OutputHead {
    Dense(DenseHead),
    Hierarchical(HierarchicalHead),
}

impl OutputHead {
    #[must_use]
    pub const fn kind(&self) -> OutputHeadKind {
        match self {
            Self::Dense(_) => OutputHeadKind::Dense,
            Self::Hierarchical(_) => OutputHeadKind::Hierarchical,
        }
    }

    #[must_use]
    pub fn graph(&self) -> &Graph {
        match self {
            Self::Dense(head) => head.graph(),
            Self::Hierarchical(head) => head.graph(),
        }
    }
}
