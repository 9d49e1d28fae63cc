use crate::graph::ParamId;
use crate::ops::{add_bias, matmul, matmul_grads, sum_rows};
use crate::tensor::Tensor;

/// Fully-connected projection
///
/// Computes: y = xW + b
/// where x is (batch, in_features), W is (in_features, out_features), b is (out_features)
#[derive(Debug, Clone)]
pub struct Linear {
    pub weight: ParamId,
    pub bias: Option<ParamId>,
    pub in_features: usize,
    pub out_features: usize,
}

pub struct LinearGrads {
    pub input: Tensor,
    pub weight: Tensor,
    pub bias: Option<Tensor>,
}

impl Linear {
    /// Xavier-uniform `[in_features, out_features]`
    #[must_use]
    pub fn init_weight(in_features: usize, out_features: usize) -> Tensor {
        Tensor::xavier_uniform(&[in_features, out_features])
    }

    #[must_use]
    pub fn init_bias(out_features: usize) -> Tensor {
        Tensor::zeros(&[out_features])
    }

    /// Forward pass through the layer
    #[must_use]
    pub fn forward(&self, weight: &Tensor, bias: Option<&Tensor>, x: &Tensor) -> Tensor {
        let out = matmul(x, weight);
        match bias {
            Some(b) => add_bias(&out, b),
            None => out,
        }
    }

    #[must_use]
    pub fn backward(&self, out_grad: &Tensor, x: &Tensor, weight: &Tensor) -> LinearGrads {
        let (input, weight) = matmul_grads(out_grad, x, weight);
        LinearGrads {
            input,
            weight,
            bias: self.bias.map(|_| sum_rows(out_grad)),
        }
    }
}
