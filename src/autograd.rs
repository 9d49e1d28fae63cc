use crate::error::EvalError;
use crate::graph::{Graph, NodeId, Op, ParamId, Parameter, Trace};
use crate::nn::layers::HsmParams;
use crate::tensor::Tensor;

// ===== GRADIENT STORAGE =====

/// Gradients from one backward sweep, indexed like the graph they came from.
///
/// Node gradients are kept for every dense node the sweep reached, so
/// internal layers looked up through the registry can be inspected too.
#[derive(Clone, Debug)]
pub struct Gradients {
    nodes: Vec<Option<Tensor>>,
    parameters: Vec<Option<Tensor>>,
}

impl Gradients {
    /// Gradient w.r.t. the activation of `id`
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Tensor> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    /// Gradient w.r.t. a parameter; `None` if the output does not depend on it
    #[must_use]
    pub fn parameter(&self, id: ParamId) -> Option<&Tensor> {
        self.parameters.get(id.index()).and_then(Option::as_ref)
    }

    fn add_node(&mut self, id: NodeId, grad: Tensor) {
        accumulate(&mut self.nodes[id.index()], grad);
    }

    fn add_parameter(&mut self, id: ParamId, grad: Tensor) {
        accumulate(&mut self.parameters[id.index()], grad);
    }
}

fn accumulate(slot: &mut Option<Tensor>, grad: Tensor) {
    match slot {
        Some(existing) => existing.accumulate(&grad),
        None => *slot = Some(grad),
    }
}

// ===== BACKPROPAGATION =====

/// Reverse-mode sweep from `output`, seeded with `seed` (same shape as the
/// output's value in `trace`).
///
/// The arena is already in topological order, so walking it backwards
/// visits every consumer before its producers. A node reached along
/// several paths (the LSTM hidden state feeds four gates) has all of its
/// contributions summed before its own inputs are visited.
pub fn backward(
    graph: &Graph,
    trace: &Trace,
    output: NodeId,
    seed: Tensor,
) -> Result<Gradients, EvalError> {
    if !graph.contains(output) || trace.len() != graph.len() {
        return Err(EvalError::UnknownNode(output));
    }
    let out_value = trace.dense(output)?;
    if seed.shape != out_value.shape {
        return Err(EvalError::ShapeMismatch {
            node: output,
            expected: out_value.shape.clone(),
            actual: seed.shape,
        });
    }

    let mut grads = Gradients {
        nodes: vec![None; graph.len()],
        parameters: vec![None; graph.parameters().len()],
    };
    grads.nodes[output.index()] = Some(seed);

    let reachable: Vec<_> = graph.nodes().take(output.index() + 1).collect();
    for (id, node) in reachable.into_iter().rev() {
        let Some(out_grad) = grads.nodes[id.index()].take() else {
            continue;
        };
        match &node.op {
            Op::Input(_) => {}
            Op::Embedding(layer) => {
                let indices = trace.index_values(node.inputs[0])?;
                grads.add_parameter(layer.weight, layer.backward(&out_grad, indices));
            }
            Op::Projection(layer) => {
                let x = trace.dense(node.inputs[0])?;
                let g = {
                    let weight = graph.param(layer.weight).read();
                    layer.backward(&out_grad, x, &weight)
                };
                grads.add_node(node.inputs[0], g.input);
                grads.add_parameter(layer.weight, g.weight);
                if let (Some(bias), Some(gb)) = (layer.bias, g.bias) {
                    grads.add_parameter(bias, gb);
                }
            }
            Op::Elementwise(op) => {
                let a = trace.dense(node.inputs[0])?;
                let b = trace.dense(node.inputs[1])?;
                let (ga, gb) = op.backward(&out_grad, a, b);
                grads.add_node(node.inputs[0], ga);
                grads.add_node(node.inputs[1], gb);
            }
            Op::Activation(act) => {
                let x = trace.dense(node.inputs[0])?;
                let y = trace.dense(id)?;
                grads.add_node(node.inputs[0], act.backward(&out_grad, x, y));
            }
            Op::HierarchicalLoss(layer) => {
                let hidden = trace.dense(node.inputs[0])?;
                let targets = trace.index_values(node.inputs[1])?;
                let g = {
                    let (cw, cb) = (
                        graph.param(layer.cluster_weight).read(),
                        graph.param(layer.cluster_bias).read(),
                    );
                    let (kw, kb) = (
                        graph.param(layer.class_weight).read(),
                        graph.param(layer.class_bias).read(),
                    );
                    let params = HsmParams {
                        cluster_weight: &cw,
                        cluster_bias: &cb,
                        class_weight: &kw,
                        class_bias: &kb,
                    };
                    layer.backward(&params, out_grad.data[0], hidden, targets)
                };
                grads.add_node(node.inputs[0], g.hidden);
                grads.add_parameter(layer.cluster_weight, g.cluster_weight);
                grads.add_parameter(layer.cluster_bias, g.cluster_bias);
                grads.add_parameter(layer.class_weight, g.class_weight);
                grads.add_parameter(layer.class_bias, g.class_bias);
            }
        }
        grads.nodes[id.index()] = Some(out_grad);
    }
    Ok(grads)
}

// ===== NUMERICAL GRADIENT CHECKING =====

/// Compare an analytical parameter gradient against central differences
///
/// Each element of `parameter` is nudged by `±epsilon` in place and
/// `loss_fn` re-evaluated; the original value is restored afterwards.
/// Errors are relative to `max(|analytical|, |numerical|, 1)`, so tiny
/// gradients are compared absolutely.
///
/// Returns `(max_error, mean_error, passed)`.
pub fn check_gradients<F>(
    parameter: &Parameter,
    analytical: &Tensor,
    loss_fn: F,
    epsilon: f32,
    tolerance: f32,
) -> Result<(f32, f32, bool), EvalError>
where
    F: Fn() -> Result<f32, EvalError>,
{
    let n = parameter.read().numel();
    if analytical.numel() != n {
        return Err(EvalError::ShapeMismatch {
            node: NodeId(0),
            expected: parameter.shape(),
            actual: analytical.shape.clone(),
        });
    }

    let mut max_error: f32 = 0.0;
    let mut total_error: f32 = 0.0;
    for i in 0..n {
        let original = parameter.read().data[i];
        parameter.write().data[i] = original + epsilon;
        let plus = loss_fn();
        parameter.write().data[i] = original - epsilon;
        let minus = loss_fn();
        parameter.write().data[i] = original;

        let numerical = (plus? - minus?) / (2.0 * epsilon);
        let a = analytical.data[i];
        let error = (a - numerical).abs() / a.abs().max(numerical.abs()).max(1.0);
        max_error = max_error.max(error);
        total_error += error;
    }

    let mean_error = if n == 0 { 0.0 } else { total_error / n as f32 };
    Ok((max_error, mean_error, max_error < tolerance))
}
