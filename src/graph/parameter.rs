use crate::tensor::Tensor;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;
use std::sync::Arc;

/// Index of a parameter inside the graph that owns it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamId(pub(crate) usize);

impl ParamId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// A named trainable weight.
///
/// The graph structure is immutable once built, but parameter values are
/// updated in place by whoever trains the model. The lock makes a built
/// graph `Send + Sync`; cloning a `Parameter` shares the same storage.
#[derive(Clone, Debug)]
pub struct Parameter {
    name: String,
    value: Arc<RwLock<Tensor>>,
}

impl Parameter {
    #[must_use]
    pub fn new(name: impl Into<String>, value: Tensor) -> Self {
        Self {
            name: name.into(),
            value: Arc::new(RwLock::new(value)),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Tensor> {
        self.value.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Tensor> {
        self.value.write()
    }

    #[must_use]
    pub fn shape(&self) -> Vec<usize> {
        self.value.read().shape.clone()
    }

    /// Owned copy of the current value
    #[must_use]
    pub fn snapshot(&self) -> Tensor {
        self.value.read().clone()
    }

    /// True when both handles point at the same storage
    #[must_use]
    pub fn shares_storage(&self, other: &Parameter) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}
