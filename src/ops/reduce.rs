use crate::tensor::Tensor;

/// Numerically stable softmax of one row
#[must_use]
pub fn softmax_slice(row: &[f32]) -> Vec<f32> {
    let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = row.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// ln Σ exp(row), shifted by the row max for stability
#[must_use]
pub fn log_sum_exp(row: &[f32]) -> f32 {
    let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    row.iter().map(|v| (v - max).exp()).sum::<f32>().ln() + max
}

/// Row-wise log-softmax over the last dimension of a `[B, C]` tensor.
///
/// log_softmax(x)_j = x_j - max(x) - ln Σ exp(x_k - max(x))
#[must_use]
pub fn log_softmax(x: &Tensor) -> Tensor {
    let cols = x.cols();
    let mut out = Vec::with_capacity(x.numel());
    for row in x.data.chunks(cols) {
        let lse = log_sum_exp(row);
        out.extend(row.iter().map(|v| v - lse));
    }
    Tensor::new(out, &x.shape)
}

/// Backward of log-softmax given its output `y`:
/// ∂L/∂x_j = g_j - exp(y_j) · Σ_k g_k
#[must_use]
pub fn log_softmax_backward(out_grad: &Tensor, y: &Tensor) -> Tensor {
    let cols = y.cols();
    let mut out = Vec::with_capacity(y.numel());
    for (g_row, y_row) in out_grad.data.chunks(cols).zip(y.data.chunks(cols)) {
        let g_sum: f32 = g_row.iter().sum();
        out.extend(g_row.iter().zip(y_row).map(|(g, y)| g - y.exp() * g_sum));
    }
    Tensor::new(out, &y.shape)
}

/// Sum a `[B, N]` tensor over rows into `[N]` (bias gradients)
#[must_use]
pub fn sum_rows(x: &Tensor) -> Tensor {
    let cols = x.cols();
    let mut out = vec![0.0; cols];
    for row in x.data.chunks(cols) {
        for (o, v) in out.iter_mut().zip(row) {
            *o += v;
        }
    }
    Tensor::new(out, &[cols])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_softmax_rows_normalize() {
        let x = Tensor::new(vec![1.0, 2.0, 3.0, -5.0, 0.0, 5.0], &[2, 3]);
        let y = log_softmax(&x);
        for row in y.data.chunks(3) {
            let total: f32 = row.iter().map(|v| v.exp()).sum();
            assert!((total - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_log_softmax_backward_sums_to_zero() {
        // Gradient of a log-softmax is orthogonal to the all-ones direction
        let x = Tensor::new(vec![0.3, -1.2, 2.0], &[1, 3]);
        let y = log_softmax(&x);
        let g = Tensor::new(vec![1.0, 0.0, 0.0], &[1, 3]);
        let dx = log_softmax_backward(&g, &y);
        let total: f32 = dx.data.iter().sum();
        assert!(total.abs() < 1e-5);
    }

    #[test]
    fn test_softmax_slice_uniform() {
        let p = softmax_slice(&[0.0, 0.0, 0.0, 0.0]);
        assert!(p.iter().all(|v| (v - 0.25).abs() < 1e-6));
    }

    #[test]
    fn test_sum_rows() {
        let x = Tensor::new(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]);
        assert_eq!(sum_rows(&x).data, vec![4.0, 6.0]);
    }
}
