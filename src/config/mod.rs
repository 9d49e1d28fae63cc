//! Hyperparameters and dictionary inputs to the model factory.

mod mapping;
mod name;

pub use mapping::ClusterMapping;
pub use name::{CellFamily, ModelSpec, OutputHeadKind};

use crate::error::{ConfigurationError, Result};
use crate::ops::Activation;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Model hyperparameters.
///
/// ```
/// use rnnfactory::Hyperparameters;
///
/// let hp = Hyperparameters::from_json_str(
///     r#"{ "name": "ptb_srn_sm", "n_hidden": 64, "non_linearity": "relu" }"#,
/// ).unwrap();
/// assert_eq!(hp.n_hidden, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hyperparameters {
    /// Encodes cell family and output head, see [`ModelSpec`]
    pub name: String,
    pub n_hidden: usize,
    /// `relu` or `sigmoid`; read by SRN cells only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_linearity: Option<String>,
}

impl Hyperparameters {
    #[must_use]
    pub fn new(name: impl Into<String>, n_hidden: usize) -> Self {
        Self {
            name: name.into(),
            n_hidden,
            non_linearity: None,
        }
    }

    #[must_use]
    pub fn with_non_linearity(mut self, non_linearity: impl Into<String>) -> Self {
        self.non_linearity = Some(non_linearity.into());
        self
    }

    pub fn spec(&self) -> std::result::Result<ModelSpec, ConfigurationError> {
        self.name.parse()
    }

    /// Parsed non-linearity; absent or unknown values are errors
    pub fn non_linearity(&self) -> std::result::Result<NonLinearity, ConfigurationError> {
        self.non_linearity
            .as_deref()
            .ok_or(ConfigurationError::MissingNonLinearity)?
            .parse()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}

/// SRN squashing function
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NonLinearity {
    /// Threshold at zero
    ReLU,
    Sigmoid,
}

impl NonLinearity {
    #[must_use]
    pub const fn activation(self) -> Activation {
        match self {
            Self::ReLU => Activation::ReLU,
            Self::Sigmoid => Activation::Sigmoid,
        }
    }
}

impl FromStr for NonLinearity {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "relu" => Ok(Self::ReLU),
            "sigmoid" => Ok(Self::Sigmoid),
            other => Err(ConfigurationError::InvalidNonLinearity(other.to_string())),
        }
    }
}

/// Vocabulary collaborator.
///
/// Only the length of `index_to_freq` matters here (it fixes the number of
/// classes). `mapping` holds one `(cluster, slot)` pair per class and is
/// required by the hierarchical head only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dictionary {
    pub index_to_freq: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<Vec<(usize, usize)>>,
}

impl Dictionary {
    #[must_use]
    pub fn new(index_to_freq: Vec<u64>) -> Self {
        Self {
            index_to_freq,
            mapping: None,
        }
    }

    #[must_use]
    pub fn with_mapping(mut self, mapping: Vec<(usize, usize)>) -> Self {
        self.mapping = Some(mapping);
        self
    }

    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.index_to_freq.len()
    }

    /// Validate the raw mapping against `n_classes`
    pub fn cluster_mapping(
        &self,
        n_classes: usize,
    ) -> std::result::Result<ClusterMapping, ConfigurationError> {
        let pairs = self
            .mapping
            .as_deref()
            .ok_or(ConfigurationError::MissingClusterMapping)?;
        ClusterMapping::from_pairs(pairs, n_classes)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}
