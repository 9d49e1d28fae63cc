use super::{Graph, InputKind, NodeId, Op};
use crate::error::EvalError;
use crate::nn::layers::HsmParams;
use crate::tensor::Tensor;

/// A value flowing along a graph edge.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Dense(Tensor),
    Indices(Vec<usize>),
}

impl Value {
    #[must_use]
    pub fn as_dense(&self) -> Option<&Tensor> {
        match self {
            Self::Dense(t) => Some(t),
            Self::Indices(_) => None,
        }
    }

    #[must_use]
    pub fn as_indices(&self) -> Option<&[usize]> {
        match self {
            Self::Dense(_) => None,
            Self::Indices(ix) => Some(ix),
        }
    }
}

/// Every node's value from one forward evaluation, indexed by [`NodeId`].
///
/// This is what introspection tooling reads: look a node up in the
/// internal layer registry, then read its activation here.
#[derive(Clone, Debug)]
pub struct Trace {
    values: Vec<Value>,
}

impl Trace {
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Value> {
        self.values.get(id.0)
    }

    /// Dense activation of `id`
    #[must_use]
    pub fn value(&self, id: NodeId) -> Option<&Tensor> {
        self.get(id).and_then(Value::as_dense)
    }

    #[must_use]
    pub fn indices(&self, id: NodeId) -> Option<&[usize]> {
        self.get(id).and_then(Value::as_indices)
    }

    pub(crate) fn dense(&self, id: NodeId) -> Result<&Tensor, EvalError> {
        match self.get(id) {
            Some(Value::Dense(t)) => Ok(t),
            Some(Value::Indices(_)) => Err(EvalError::UnexpectedValueKind {
                node: id,
                expected: "dense",
            }),
            None => Err(EvalError::UnknownNode(id)),
        }
    }

    pub(crate) fn index_values(&self, id: NodeId) -> Result<&[usize], EvalError> {
        match self.get(id) {
            Some(Value::Indices(ix)) => Ok(ix),
            Some(Value::Dense(_)) => Err(EvalError::UnexpectedValueKind {
                node: id,
                expected: "index",
            }),
            None => Err(EvalError::UnknownNode(id)),
        }
    }
}

impl Graph {
    /// Evaluate every node in arena order.
    ///
    /// `feeds` must supply exactly the graph's input nodes: dense inputs
    /// take a `[batch, width]` tensor, index inputs a non-empty index list.
    /// All values in one evaluation must agree on the batch size.
    pub fn forward(&self, feeds: Vec<(NodeId, Value)>) -> Result<Trace, EvalError> {
        let mut fed: Vec<Option<Value>> = (0..self.len()).map(|_| None).collect();
        for (id, value) in feeds {
            let node = self.node(id).ok_or(EvalError::UnknownNode(id))?;
            if !matches!(node.op, Op::Input(_)) {
                return Err(EvalError::WrongFeedKind(node.display_name()));
            }
            fed[id.0] = Some(value);
        }

        let mut trace = Trace {
            values: Vec::with_capacity(self.len()),
        };
        for (id, node) in self.nodes() {
            let value = match &node.op {
                Op::Input(kind) => {
                    let value = fed[id.0]
                        .take()
                        .ok_or_else(|| EvalError::MissingInput(node.display_name()))?;
                    check_feed(id, *kind, &value, || node.display_name())?;
                    value
                }
                Op::Embedding(layer) => {
                    let indices = trace.index_values(node.inputs[0])?;
                    let weight = self.param(layer.weight).read();
                    Value::Dense(layer.forward(&weight, indices)?)
                }
                Op::Projection(layer) => {
                    let x = trace.dense(node.inputs[0])?;
                    let weight = self.param(layer.weight).read();
                    let bias = layer.bias.map(|b| self.param(b).read());
                    Value::Dense(layer.forward(&weight, bias.as_deref(), x))
                }
                Op::Elementwise(op) => {
                    let a = trace.dense(node.inputs[0])?;
                    let b = trace.dense(node.inputs[1])?;
                    if a.shape != b.shape {
                        return Err(EvalError::ShapeMismatch {
                            node: id,
                            expected: a.shape.clone(),
                            actual: b.shape.clone(),
                        });
                    }
                    Value::Dense(op.forward(a, b))
                }
                Op::Activation(act) => Value::Dense(act.forward(trace.dense(node.inputs[0])?)),
                Op::HierarchicalLoss(layer) => {
                    let hidden = trace.dense(node.inputs[0])?;
                    let targets = trace.index_values(node.inputs[1])?;
                    if hidden.rows() != targets.len() {
                        return Err(EvalError::ShapeMismatch {
                            node: id,
                            expected: vec![targets.len(), layer.n_hidden],
                            actual: hidden.shape.clone(),
                        });
                    }
                    let (cw, cb) = (
                        self.param(layer.cluster_weight).read(),
                        self.param(layer.cluster_bias).read(),
                    );
                    let (kw, kb) = (
                        self.param(layer.class_weight).read(),
                        self.param(layer.class_bias).read(),
                    );
                    let params = HsmParams {
                        cluster_weight: &cw,
                        cluster_bias: &cb,
                        class_weight: &kw,
                        class_bias: &kb,
                    };
                    Value::Dense(layer.forward(&params, hidden, targets)?)
                }
            };
            trace.values.push(value);
        }
        Ok(trace)
    }
}

fn check_feed(
    id: NodeId,
    kind: InputKind,
    value: &Value,
    name: impl Fn() -> String,
) -> Result<(), EvalError> {
    match (kind, value) {
        (InputKind::Dense { width }, Value::Dense(t)) => {
            if t.shape.len() != 2 || t.cols() != width {
                return Err(EvalError::ShapeMismatch {
                    node: id,
                    expected: vec![t.rows(), width],
                    actual: t.shape.clone(),
                });
            }
            if t.rows() == 0 {
                return Err(EvalError::EmptyBatch);
            }
            Ok(())
        }
        (InputKind::Indices, Value::Indices(ix)) => {
            if ix.is_empty() {
                return Err(EvalError::EmptyBatch);
            }
            Ok(())
        }
        _ => Err(EvalError::WrongFeedKind(name())),
    }
}
