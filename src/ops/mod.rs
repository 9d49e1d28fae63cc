// Reference CPU kernels evaluated by `graph::exec` and `autograd`.
pub mod binary;
pub mod matmul;
pub mod reduce;
pub mod unary;

pub use binary::BinaryOp;
pub use matmul::{add_bias, matmul, matmul_grads, transpose};
pub use reduce::{log_softmax, log_softmax_backward, log_sum_exp, softmax_slice, sum_rows};
pub use unary::UnaryOp;

use crate::tensor::Tensor;

/// Activation node kinds.
///
/// The first three are elementwise and delegate to [`UnaryOp`];
/// `LogSoftmax` normalizes each row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Activation {
    Sigmoid,
    Tanh,
    /// Threshold at zero
    ReLU,
    LogSoftmax,
}

impl Activation {
    #[must_use]
    pub fn forward(self, x: &Tensor) -> Tensor {
        match self {
            Self::Sigmoid => UnaryOp::Sigmoid.forward(x),
            Self::Tanh => UnaryOp::Tanh.forward(x),
            Self::ReLU => UnaryOp::ReLU.forward(x),
            Self::LogSoftmax => log_softmax(x),
        }
    }

    /// Gradient w.r.t. the input, given the input `x`, the forward output `y`
    /// and the upstream gradient.
    #[must_use]
    pub fn backward(self, out_grad: &Tensor, x: &Tensor, y: &Tensor) -> Tensor {
        match self {
            Self::Sigmoid => UnaryOp::Sigmoid.backward(out_grad, x),
            Self::Tanh => UnaryOp::Tanh.backward(out_grad, x),
            Self::ReLU => UnaryOp::ReLU.backward(out_grad, x),
            Self::LogSoftmax => log_softmax_backward(out_grad, y),
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sigmoid => "sigmoid",
            Self::Tanh => "tanh",
            Self::ReLU => "relu",
            Self::LogSoftmax => "log_softmax",
        }
    }
}
