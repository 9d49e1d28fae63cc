use crate::config::ClusterMapping;
use crate::error::EvalError;
use crate::graph::ParamId;
use crate::ops::{log_sum_exp, softmax_slice};
use crate::tensor::Tensor;

/// Two-level class-based softmax fused with its negative log-likelihood
///
/// Classes are grouped into clusters by a [`ClusterMapping`]. For a target
/// `t` in cluster `k` at slot `s`:
///
/// - p(k | h) = softmax(h·Wc + bc)_k       over all clusters
/// - p(t | k, h) = softmax(h·W_k + b_k)_s  over the members of `k` only
/// - loss = -mean_b [ln p(k | h_b) + ln p(t_b | k, h_b)]
///
/// so only `K + |cluster|` logits are computed per row instead of `n_classes`.
#[derive(Debug, Clone)]
pub struct HierarchicalSoftmax {
    pub mapping: ClusterMapping,
    pub n_hidden: usize,
    /// `[n_hidden, n_clusters]`
    pub cluster_weight: ParamId,
    /// `[n_clusters]`
    pub cluster_bias: ParamId,
    /// `[n_hidden, n_classes]`, column `c` scores class `c`
    pub class_weight: ParamId,
    /// `[n_classes]`
    pub class_bias: ParamId,
}

/// Borrowed parameter values for one evaluation
pub struct HsmParams<'a> {
    pub cluster_weight: &'a Tensor,
    pub cluster_bias: &'a Tensor,
    pub class_weight: &'a Tensor,
    pub class_bias: &'a Tensor,
}

pub struct HsmGrads {
    pub hidden: Tensor,
    pub cluster_weight: Tensor,
    pub cluster_bias: Tensor,
    pub class_weight: Tensor,
    pub class_bias: Tensor,
}

// h · w[:, col] + b[col]
fn column_logit(h: &[f32], w: &Tensor, b: &Tensor, col: usize) -> f32 {
    h.iter()
        .enumerate()
        .map(|(j, hv)| hv * w.get2(j, col))
        .sum::<f32>()
        + b.data[col]
}

impl HierarchicalSoftmax {
    fn cluster_logits(&self, p: &HsmParams<'_>, h: &[f32]) -> Vec<f32> {
        (0..self.mapping.n_clusters())
            .map(|k| column_logit(h, p.cluster_weight, p.cluster_bias, k))
            .collect()
    }

    fn member_logits(&self, p: &HsmParams<'_>, h: &[f32], cluster: usize) -> Vec<f32> {
        self.mapping
            .members(cluster)
            .iter()
            .map(|&m| column_logit(h, p.class_weight, p.class_bias, m))
            .collect()
    }

    fn locate(&self, target: usize) -> Result<(usize, usize), EvalError> {
        self.mapping
            .cluster_of(target)
            .ok_or(EvalError::IndexOutOfBounds {
                index: target,
                bound: self.mapping.n_classes(),
            })
    }

    /// Mean loss over the batch as a `[1]` tensor
    pub fn forward(
        &self,
        p: &HsmParams<'_>,
        hidden: &Tensor,
        targets: &[usize],
    ) -> Result<Tensor, EvalError> {
        let mut total = 0.0;
        for (r, &t) in targets.iter().enumerate() {
            let (k, slot) = self.locate(t)?;
            let h = hidden.row(r);
            let cl = self.cluster_logits(p, h);
            let zl = self.member_logits(p, h, k);
            total -= (cl[k] - log_sum_exp(&cl)) + (zl[slot] - log_sum_exp(&zl));
        }
        Ok(Tensor::new(vec![total / targets.len() as f32], &[1]))
    }

    /// Gradients of `out_grad * loss`. Targets must already have passed
    /// [`forward`](Self::forward).
    #[must_use]
    pub fn backward(
        &self,
        p: &HsmParams<'_>,
        out_grad: f32,
        hidden: &Tensor,
        targets: &[usize],
    ) -> HsmGrads {
        let (n_hidden, n_clusters) = (self.n_hidden, self.mapping.n_clusters());
        let n_classes = self.mapping.n_classes();
        let mut grads = HsmGrads {
            hidden: Tensor::zeros(&hidden.shape),
            cluster_weight: Tensor::zeros(&[n_hidden, n_clusters]),
            cluster_bias: Tensor::zeros(&[n_clusters]),
            class_weight: Tensor::zeros(&[n_hidden, n_classes]),
            class_bias: Tensor::zeros(&[n_classes]),
        };
        let scale = out_grad / targets.len() as f32;

        for (r, &t) in targets.iter().enumerate() {
            let Some((k, slot)) = self.mapping.cluster_of(t) else {
                continue;
            };
            let h = hidden.row(r);
            let dh = &mut grads.hidden.data[r * n_hidden..(r + 1) * n_hidden];

            // softmax - onehot, for the cluster choice
            let probs = softmax_slice(&self.cluster_logits(p, h));
            for (c, prob) in probs.into_iter().enumerate() {
                let dz = scale * (prob - if c == k { 1.0 } else { 0.0 });
                grads.cluster_bias.data[c] += dz;
                for j in 0..n_hidden {
                    grads.cluster_weight.data[j * n_clusters + c] += h[j] * dz;
                    dh[j] += p.cluster_weight.get2(j, c) * dz;
                }
            }

            // and for the class within its cluster
            let probs = softmax_slice(&self.member_logits(p, h, k));
            for (i, (&m, prob)) in self.mapping.members(k).iter().zip(probs).enumerate() {
                let dz = scale * (prob - if i == slot { 1.0 } else { 0.0 });
                grads.class_bias.data[m] += dz;
                for j in 0..n_hidden {
                    grads.class_weight.data[j * n_classes + m] += h[j] * dz;
                    dh[j] += p.class_weight.get2(j, m) * dz;
                }
            }
        }
        grads
    }
}
