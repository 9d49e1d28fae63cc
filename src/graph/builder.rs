use super::{Graph, InputKind, Node, NodeId, Op, ParamId, Parameter};
use crate::config::ClusterMapping;
use crate::nn::layers::{Embedding, HierarchicalSoftmax, Linear};
use crate::ops::{Activation, BinaryOp};

/// Builder for [`Graph`]s with shared inputs and multi-branch outputs
///
/// Every method appends one node and returns its id. Nodes can only name
/// ids handed out earlier by the same builder, which keeps the arena in
/// topological order. Every parameterized node gets freshly initialized
/// parameters of its own.
///
/// # Examples
///
/// ```
/// use rnnfactory::graph::GraphBuilder;
/// use rnnfactory::ops::Activation;
///
/// let mut b = GraphBuilder::new();
/// let token = b.index_input("token");
/// let h = b.dense_input("prev_hidden", 8);
/// let e = b.embedding("embed", token, 100, 8);
/// let p = b.projection("project", h, 8, false);
/// let s = b.add(e, p);
/// let out = b.activation(Activation::Tanh, s);
/// let graph = b.build();
/// assert_eq!(graph.consumers(e), vec![s]);
/// assert_eq!(graph.node(out).map(|n| n.width), Some(8));
/// ```
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
    parameters: Vec<Parameter>,
}

impl GraphBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            parameters: Vec::new(),
        }
    }

    /// Width of an existing node
    ///
    /// # Panics
    /// Panics if `id` was not produced by this builder
    #[must_use]
    pub fn width(&self, id: NodeId) -> usize {
        self.expect(id).width
    }

    /// Input fed with `[batch, width]` activations
    pub fn dense_input(&mut self, label: impl Into<String>, width: usize) -> NodeId {
        assert!(width > 0, "input width must be positive");
        self.push(
            Op::Input(InputKind::Dense { width }),
            vec![],
            width,
            Some(label.into()),
        )
    }

    /// Input fed with one class index per batch row
    pub fn index_input(&mut self, label: impl Into<String>) -> NodeId {
        self.push(Op::Input(InputKind::Indices), vec![], 1, Some(label.into()))
    }

    /// Lookup table `vocab_size -> dim` applied to an index input
    pub fn embedding(
        &mut self,
        label: impl Into<String>,
        input: NodeId,
        vocab_size: usize,
        dim: usize,
    ) -> NodeId {
        assert!(
            matches!(self.expect(input).op, Op::Input(InputKind::Indices)),
            "embedding input must be an index input"
        );
        let label = label.into();
        let weight = self.add_parameter(
            format!("{label}.weight"),
            Embedding::init_weight(vocab_size, dim),
        );
        let layer = Embedding {
            weight,
            vocab_size,
            dim,
        };
        self.push(Op::Embedding(layer), vec![input], dim, Some(label))
    }

    /// Linear map from the input's width to `out_features`
    pub fn projection(
        &mut self,
        label: impl Into<String>,
        input: NodeId,
        out_features: usize,
        bias: bool,
    ) -> NodeId {
        let in_features = self.dense_width(input);
        let label = label.into();
        let weight = self.add_parameter(
            format!("{label}.weight"),
            Linear::init_weight(in_features, out_features),
        );
        let bias = bias.then(|| {
            self.add_parameter(format!("{label}.bias"), Linear::init_bias(out_features))
        });
        let layer = Linear {
            weight,
            bias,
            in_features,
            out_features,
        };
        self.push(
            Op::Projection(layer),
            vec![input],
            out_features,
            Some(label),
        )
    }

    pub fn add(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.elementwise(BinaryOp::Add, a, b)
    }

    pub fn mul(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.elementwise(BinaryOp::Mul, a, b)
    }

    pub fn elementwise(&mut self, op: BinaryOp, a: NodeId, b: NodeId) -> NodeId {
        let (wa, wb) = (self.dense_width(a), self.dense_width(b));
        assert_eq!(wa, wb, "{} operands differ in width: {wa} vs {wb}", op.name());
        self.push(Op::Elementwise(op), vec![a, b], wa, None)
    }

    pub fn activation(&mut self, act: Activation, x: NodeId) -> NodeId {
        let width = self.dense_width(x);
        self.push(Op::Activation(act), vec![x], width, None)
    }

    /// Fused projection + class-clustered softmax loss
    ///
    /// Evaluates to a `[1]` tensor: the mean negative log-likelihood of the
    /// `target` indices given `hidden`.
    pub fn hierarchical_loss(
        &mut self,
        label: impl Into<String>,
        hidden: NodeId,
        target: NodeId,
        mapping: ClusterMapping,
    ) -> NodeId {
        assert!(
            matches!(self.expect(target).op, Op::Input(InputKind::Indices)),
            "hierarchical loss target must be an index input"
        );
        let n_hidden = self.dense_width(hidden);
        let label = label.into();
        let (n_clusters, n_classes) = (mapping.n_clusters(), mapping.n_classes());
        let cluster_weight = self.add_parameter(
            format!("{label}.cluster_weight"),
            Linear::init_weight(n_hidden, n_clusters),
        );
        let cluster_bias =
            self.add_parameter(format!("{label}.cluster_bias"), Linear::init_bias(n_clusters));
        let class_weight = self.add_parameter(
            format!("{label}.class_weight"),
            Linear::init_weight(n_hidden, n_classes),
        );
        let class_bias =
            self.add_parameter(format!("{label}.class_bias"), Linear::init_bias(n_classes));
        let layer = HierarchicalSoftmax {
            mapping,
            n_hidden,
            cluster_weight,
            cluster_bias,
            class_weight,
            class_bias,
        };
        self.push(
            Op::HierarchicalLoss(layer),
            vec![hidden, target],
            1,
            Some(label),
        )
    }

    /// Freeze the arena into an immutable graph
    #[must_use]
    pub fn build(self) -> Graph {
        Graph {
            nodes: self.nodes,
            parameters: self.parameters,
        }
    }

    fn expect(&self, id: NodeId) -> &Node {
        self.nodes
            .get(id.0)
            .unwrap_or_else(|| panic!("node {id} does not belong to this builder"))
    }

    fn dense_width(&self, id: NodeId) -> usize {
        let node = self.expect(id);
        assert!(
            !matches!(
                node.op,
                Op::Input(InputKind::Indices) | Op::HierarchicalLoss(_)
            ),
            "node {id} does not produce dense activations"
        );
        node.width
    }

    fn add_parameter(&mut self, name: String, value: crate::tensor::Tensor) -> ParamId {
        self.parameters.push(Parameter::new(name, value));
        ParamId(self.parameters.len() - 1)
    }

    fn push(
        &mut self,
        op: Op,
        inputs: Vec<NodeId>,
        width: usize,
        label: Option<String>,
    ) -> NodeId {
        debug_assert!(inputs.iter().all(|i| i.0 < self.nodes.len()));
        self.nodes.push(Node {
            op,
            inputs,
            width,
            label,
        });
        NodeId(self.nodes.len() - 1)
    }
}
