use crate::tensor::Tensor;

/// Binary operations: two same-shape inputs, one output
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add, // x + y
    Mul, // x * y (element-wise)
}

impl BinaryOp {
    /// # Panics
    /// Panics if the shapes differ; the evaluator checks them first.
    #[must_use]
    pub fn forward(self, a: &Tensor, b: &Tensor) -> Tensor {
        assert_eq!(a.shape, b.shape, "binary op shape mismatch");
        let pairs = a.data.iter().zip(&b.data);
        let data = match self {
            Self::Add => pairs.map(|(x, y)| x + y).collect(),
            Self::Mul => pairs.map(|(x, y)| x * y).collect(),
        };
        Tensor::new(data, &a.shape)
    }

    /// Gradients w.r.t. `(a, b)`.
    /// - Add: ∂z/∂a = 1, ∂z/∂b = 1
    /// - Mul: ∂z/∂a = b, ∂z/∂b = a
    #[must_use]
    pub fn backward(self, out_grad: &Tensor, a: &Tensor, b: &Tensor) -> (Tensor, Tensor) {
        match self {
            Self::Add => (out_grad.clone(), out_grad.clone()),
            Self::Mul => (
                Self::Mul.forward(out_grad, b),
                Self::Mul.forward(out_grad, a),
            ),
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Mul => "mul",
        }
    }
}
