use crate::tensor::Tensor;

/// Elementwise activations used by recurrent cells.
///
/// Each operation has a corresponding derivative:
/// - Tanh: d(tanh(x))/dx = 1 - tanh²(x)
/// - Sigmoid: d(σ(x))/dx = σ(x)·(1-σ(x))
/// - `ReLU`: d(max(0,x))/dx = x > 0 ? 1 : 0
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Tanh,
    Sigmoid,
    ReLU,
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

impl UnaryOp {
    /// Apply the operation element-wise
    #[must_use]
    pub fn forward(self, x: &Tensor) -> Tensor {
        let data = match self {
            Self::Tanh => x.data.iter().map(|v| v.tanh()).collect(),
            Self::Sigmoid => x.data.iter().map(|&v| sigmoid(v)).collect(),
            Self::ReLU => x.data.iter().map(|&v| v.max(0.0)).collect(),
        };
        Tensor::new(data, &x.shape)
    }

    /// Apply chain rule: ∂L/∂x = ∂L/∂y · ∂y/∂x
    #[must_use]
    pub fn backward(self, out_grad: &Tensor, x: &Tensor) -> Tensor {
        let pairs = out_grad.data.iter().zip(&x.data);
        let data = match self {
            Self::Tanh => pairs
                .map(|(&g, &x)| {
                    let t = x.tanh();
                    g * t.mul_add(-t, 1.0)
                })
                .collect(),
            Self::Sigmoid => pairs
                .map(|(&g, &x)| {
                    let s = sigmoid(x);
                    g * s * (1.0 - s)
                })
                .collect(),
            Self::ReLU => pairs.map(|(&g, &x)| if x > 0.0 { g } else { 0.0 }).collect(),
        };
        Tensor::new(data, &x.shape)
    }
}
