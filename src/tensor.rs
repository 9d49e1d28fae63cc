use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::cell::RefCell;

thread_local! {
    static RNG: RefCell<StdRng> = RefCell::new(StdRng::from_os_rng());
}

/// Reseed the thread-local generator used for parameter initialization.
///
/// Two factories run on the same thread after the same seed produce
/// numerically identical parameters.
pub fn manual_seed(seed: u64) {
    RNG.with(|rng| *rng.borrow_mut() = StdRng::seed_from_u64(seed));
}

/// Run `f` with the thread-local generator.
pub fn with_rng<T>(f: impl FnOnce(&mut StdRng) -> T) -> T {
    RNG.with(|rng| f(&mut rng.borrow_mut()))
}

// ===== TENSOR STRUCTURE =====

/// Dense row-major `f32` buffer with a shape.
///
/// Activations flowing through a graph are always 2-D: `[batch, width]`.
/// Parameters are 2-D weight matrices or 1-D bias vectors. Losses are `[1]`.
///
/// Unlike a dynamic autograd tensor this carries no gradient or parent
/// links: graph structure lives in [`crate::graph::Graph`], gradients in
/// [`crate::autograd::Gradients`].
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    pub data: Vec<f32>,    // flat data vec, len = prod shape dims
    pub shape: Vec<usize>, // eg [B, H]
}

// ===== TENSOR CONSTRUCTORS =====
impl Tensor {
    /// Create a new tensor from data and shape
    ///
    /// # Panics
    /// Panics if `data.len() != shape.product()`
    #[must_use]
    pub fn new(data: Vec<f32>, shape: &[usize]) -> Self {
        assert_eq!(
            data.len(),
            shape.iter().product::<usize>(),
            "Data length must match shape"
        );
        Self {
            data,
            shape: shape.to_vec(),
        }
    }

    /// Create a tensor filled with zeros
    #[must_use]
    pub fn zeros(shape: &[usize]) -> Self {
        Self::constant(0.0, shape)
    }

    /// Create a tensor filled with ones
    #[must_use]
    pub fn ones(shape: &[usize]) -> Self {
        Self::constant(1.0, shape)
    }

    #[must_use]
    pub fn constant(value: f32, shape: &[usize]) -> Self {
        let size = shape.iter().product();
        Self::new(vec![value; size], shape)
    }

    /// Values from the standard normal distribution N(0, 1)
    #[must_use]
    pub fn randn(shape: &[usize]) -> Self {
        let size = shape.iter().product();
        let data = with_rng(|rng| {
            (0..size)
                .map(|_| rng.sample::<f32, _>(StandardNormal))
                .collect()
        });
        Self::new(data, shape)
    }

    /// Values drawn uniformly from `[-limit, limit]`
    #[must_use]
    pub fn uniform(shape: &[usize], limit: f32) -> Self {
        let size = shape.iter().product();
        let data = with_rng(|rng| {
            (0..size)
                .map(|_| rng.random::<f32>() * 2.0 * limit - limit)
                .collect()
        });
        Self::new(data, shape)
    }

    /// Xavier uniform initialization
    ///
    /// Samples weights uniformly from [-limit, limit] where
    /// limit = sqrt(6 / (fan_in + fan_out))
    ///
    /// # Panics
    /// Panics if `shape` is not 2-D
    #[must_use]
    pub fn xavier_uniform(shape: &[usize]) -> Self {
        let &[fan_in, fan_out] = shape else {
            panic!("xavier_uniform expects a 2-D shape, got {shape:?}");
        };
        let limit = (6.0 / (fan_in + fan_out) as f32).sqrt();
        Self::uniform(shape, limit)
    }
}

// ===== ACCESSORS =====
impl Tensor {
    #[must_use]
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// First dimension (batch for activations)
    #[must_use]
    pub fn rows(&self) -> usize {
        self.shape.first().copied().unwrap_or(1)
    }

    /// Product of all dimensions after the first
    #[must_use]
    pub fn cols(&self) -> usize {
        self.shape.iter().skip(1).product()
    }

    #[must_use]
    pub fn row(&self, r: usize) -> &[f32] {
        let cols = self.cols();
        &self.data[r * cols..(r + 1) * cols]
    }

    #[must_use]
    pub fn get2(&self, r: usize, c: usize) -> f32 {
        self.data[r * self.cols() + c]
    }

    /// In-place elementwise accumulation, used for gradient fan-in.
    ///
    /// # Panics
    /// Panics on shape mismatch
    pub fn accumulate(&mut self, other: &Tensor) {
        assert_eq!(
            self.shape, other.shape,
            "Gradient shape mismatch during accumulation"
        );
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += *b;
        }
    }

    /// Largest absolute elementwise difference; `f32::INFINITY` on shape mismatch.
    #[must_use]
    pub fn max_abs_diff(&self, other: &Tensor) -> f32 {
        if self.shape != other.shape {
            return f32::INFINITY;
        }
        self.data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f32::max)
    }
}
