use crate::tensor::Tensor;

// ===== MATRIX MULTIPLICATION =====

/// Raw matrix multiplication: (m,k) @ (k,n) -> (m,n)
/// Uses naive O(mnk) algorithm.
fn matmul_raw(a: &[f32], b: &[f32], m: usize, k: usize, n: usize) -> Vec<f32> {
    let mut result = vec![0.0; m * n];
    for i in 0..m {
        for p in 0..k {
            let a_ip = a[i * k + p];
            if a_ip == 0.0 {
                continue;
            }
            let b_row = &b[p * n..(p + 1) * n];
            let out_row = &mut result[i * n..(i + 1) * n];
            for (o, &bv) in out_row.iter_mut().zip(b_row) {
                *o += a_ip * bv;
            }
        }
    }
    result
}

/// Transpose a 2D matrix: [m, n] -> [n, m]
#[must_use]
pub fn transpose(x: &Tensor) -> Tensor {
    assert_eq!(x.shape.len(), 2, "Transpose expects 2D shape");
    let (m, n) = (x.rows(), x.cols());
    let mut result = vec![0.0; m * n];
    for i in 0..m {
        for j in 0..n {
            result[j * m + i] = x.data[i * n + j];
        }
    }
    Tensor::new(result, &[n, m])
}

/// `a @ b` for 2-D tensors.
///
/// # Panics
/// Panics if inner dimensions disagree
#[must_use]
pub fn matmul(a: &Tensor, b: &Tensor) -> Tensor {
    let (m, k) = (a.rows(), a.cols());
    let (k2, n) = (b.rows(), b.cols());
    assert_eq!(k, k2, "matmul inner dimension mismatch: {k} vs {k2}");
    Tensor::new(matmul_raw(&a.data, &b.data, m, k, n), &[m, n])
}

/// Add a `[n]` bias to every row of `[m, n]`.
#[must_use]
pub fn add_bias(x: &Tensor, bias: &Tensor) -> Tensor {
    let n = x.cols();
    assert_eq!(bias.numel(), n, "bias length must match columns");
    let data = x
        .data
        .iter()
        .enumerate()
        .map(|(i, v)| v + bias.data[i % n])
        .collect();
    Tensor::new(data, &x.shape)
}

/// Gradients for `y = x @ w`: returns `(∂L/∂x, ∂L/∂w)`.
/// - ∂L/∂x = out_grad @ wᵀ
/// - ∂L/∂w = xᵀ @ out_grad
#[must_use]
pub fn matmul_grads(out_grad: &Tensor, x: &Tensor, w: &Tensor) -> (Tensor, Tensor) {
    let grad_x = matmul(out_grad, &transpose(w));
    let grad_w = matmul(&transpose(x), out_grad);
    (grad_x, grad_w)
}
