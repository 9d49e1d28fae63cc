use crate::error::EvalError;
use crate::graph::ParamId;
use crate::tensor::Tensor;

/// Embedding: Maps class indices to dense vectors
///
/// This node owns a lookup table that maps vocabulary indices to embedding
/// vectors. In a recurrent cell every gate gets its own table.
///
/// # Shape
/// - Input: indices `[batch]`
/// - Output: `[batch, dim]`
#[derive(Debug, Clone)]
pub struct Embedding {
    pub weight: ParamId,
    pub vocab_size: usize,
    pub dim: usize,
}

impl Embedding {
    /// Initial table, uniform in [-0.1, 0.1]
    ///
    /// # Panics
    /// Panics if either dimension is zero
    #[must_use]
    pub fn init_weight(vocab_size: usize, dim: usize) -> Tensor {
        assert!(vocab_size > 0, "vocab_size must be positive");
        assert!(dim > 0, "embedding_dim must be positive");
        Tensor::uniform(&[vocab_size, dim], 0.1)
    }

    /// Gather rows of `weight` for `indices`
    pub fn forward(&self, weight: &Tensor, indices: &[usize]) -> Result<Tensor, EvalError> {
        let mut output = Vec::with_capacity(indices.len() * self.dim);
        for &idx in indices {
            if idx >= self.vocab_size {
                return Err(EvalError::IndexOutOfBounds {
                    index: idx,
                    bound: self.vocab_size,
                });
            }
            output.extend_from_slice(weight.row(idx));
        }
        Ok(Tensor::new(output, &[indices.len(), self.dim]))
    }

    /// Scatter `out_grad` rows back into a table-shaped gradient.
    /// Repeated indices accumulate.
    #[must_use]
    pub fn backward(&self, out_grad: &Tensor, indices: &[usize]) -> Tensor {
        let mut grad_weight = vec![0.0; self.vocab_size * self.dim];
        for (i, &idx) in indices.iter().enumerate() {
            let dst = &mut grad_weight[idx * self.dim..(idx + 1) * self.dim];
            for (slot, g) in dst.iter_mut().zip(out_grad.row(i)) {
                *slot += g;
            }
        }
        Tensor::new(grad_weight, &[self.vocab_size, self.dim])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(vocab_size: usize, dim: usize) -> (Embedding, Tensor) {
        let weight = Embedding::init_weight(vocab_size, dim);
        let layer = Embedding {
            weight: ParamId(0),
            vocab_size,
            dim,
        };
        (layer, weight)
    }

    #[test]
    fn test_embedding_forward_shape() {
        let (embedding, weight) = layer(100, 32);
        let output = embedding.forward(&weight, &[5, 12, 7, 99]).unwrap();
        assert_eq!(output.shape, vec![4, 32]);
    }

    #[test]
    fn test_embedding_values() {
        let (embedding, weight) = layer(10, 4);
        let output = embedding.forward(&weight, &[0, 5, 9]).unwrap();
        assert_eq!(output.row(0), weight.row(0));
        assert_eq!(output.row(1), weight.row(5));
        assert_eq!(output.row(2), weight.row(9));
    }

    #[test]
    fn test_embedding_backward_accumulates_repeats() {
        let (embedding, _) = layer(10, 4);
        let grad = embedding.backward(&Tensor::ones(&[3, 4]), &[2, 7, 2]);
        assert!(grad.row(2).iter().all(|&g| (g - 2.0).abs() < 1e-6));
        assert!(grad.row(7).iter().all(|&g| (g - 1.0).abs() < 1e-6));
        assert!(grad.row(0).iter().all(|&g| g == 0.0));
    }

    #[test]
    fn test_embedding_invalid_index() {
        let (embedding, weight) = layer(10, 4);
        let err = embedding.forward(&weight, &[5, 15]).unwrap_err();
        assert_eq!(err, EvalError::IndexOutOfBounds { index: 15, bound: 10 });
    }

    #[test]
    fn test_init_within_range() {
        let w = Embedding::init_weight(50, 16);
        assert_eq!(w.shape, vec![50, 16]);
        assert!(w.data.iter().all(|v| v.abs() <= 0.1));
    }
}
