//! Assemble an encoder cell, an output head and the internal layer registry
//! from hyperparameters and a dictionary.

use crate::config::{CellFamily, Dictionary, Hyperparameters, OutputHeadKind};
use crate::error::ConfigurationError;
use crate::graph::Parameter;
use crate::nn::{
    Cell, DenseHead, HierarchicalHead, InternalLayerRegistry, LstmCellBuilder, OutputHead,
    SrnCellBuilder,
};
use tracing::{debug, info};

/// A built model: one encoder cell plus exactly one output head.
#[derive(Debug)]
pub struct Model {
    encoder: Cell,
    head: OutputHead,
    internal_layers: InternalLayerRegistry,
}

impl Model {
    #[must_use]
    pub fn encoder(&self) -> &Cell {
        &self.encoder
    }

    #[must_use]
    pub fn head(&self) -> &OutputHead {
        &self.head
    }

    /// Dense log-softmax head, if this is an `_sm` model
    #[must_use]
    pub fn decoder(&self) -> Option<&DenseHead> {
        match &self.head {
            OutputHead::Dense(head) => Some(head),
            OutputHead::Hierarchical(_) => None,
        }
    }

    /// Fused hierarchical-softmax loss head, if this is an `_hsm` model
    #[must_use]
    pub fn decoder_with_loss(&self) -> Option<&HierarchicalHead> {
        match &self.head {
            OutputHead::Dense(_) => None,
            OutputHead::Hierarchical(head) => Some(head),
        }
    }

    #[must_use]
    pub fn internal_layers(&self) -> &InternalLayerRegistry {
        &self.internal_layers
    }

    /// Every trainable parameter, encoder first, in construction order
    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.encoder
            .graph()
            .parameters()
            .iter()
            .chain(self.head.graph().parameters())
    }
}

/// Build a model from `hp` and `dictionary`.
///
/// `n_classes` overrides the dictionary size when given. Every input is
/// validated before the first parameter is allocated, so a failure never
/// leaves a half-built graph behind.
///
/// ```
/// use rnnfactory::{Dictionary, Hyperparameters, make_model};
///
/// let hp = Hyperparameters::new("ptb_srn_sm", 16).with_non_linearity("relu");
/// let dict = Dictionary::new(vec![1; 50]);
/// let (model, layers) = make_model(&hp, &dict, None).unwrap();
/// assert!(model.decoder().is_some());
/// assert_eq!(layers.names().collect::<Vec<_>>(), vec!["embed", "project"]);
/// ```
pub fn make_model(
    hp: &Hyperparameters,
    dictionary: &Dictionary,
    n_classes: Option<usize>,
) -> Result<(Model, InternalLayerRegistry), ConfigurationError> {
    let n_classes = n_classes.unwrap_or_else(|| dictionary.n_classes());
    if n_classes == 0 {
        return Err(ConfigurationError::ZeroClasses);
    }
    if hp.n_hidden == 0 {
        return Err(ConfigurationError::ZeroHidden);
    }
    let spec = hp.spec()?;
    debug!(name = %hp.name, %spec, n_classes, "resolved model name");

    let non_linearity = match spec.cell {
        CellFamily::Srn => Some(hp.non_linearity()?),
        CellFamily::Lstm => None,
    };
    let mapping = match spec.head {
        OutputHeadKind::Dense => None,
        OutputHeadKind::Hierarchical => Some(dictionary.cluster_mapping(n_classes)?),
    };

    let (encoder, internal_layers) = match non_linearity {
        Some(nl) => SrnCellBuilder::new(n_classes, hp.n_hidden, nl).build(),
        None => LstmCellBuilder::new(n_classes, hp.n_hidden).build(),
    };
    let head = match mapping {
        None => OutputHead::Dense(DenseHead::build(hp.n_hidden, n_classes)),
        Some(mapping) => OutputHead::Hierarchical(HierarchicalHead::build(hp.n_hidden, mapping)),
    };

    let model = Model {
        encoder,
        head,
        internal_layers: internal_layers.clone(),
    };
    info!(
        name = %hp.name,
        cell = %spec.cell,
        head = spec.head.token(),
        n_classes,
        n_hidden = hp.n_hidden,
        parameters = model.parameters().count(),
        "built model"
    );
    Ok((model, internal_layers))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(n: usize) -> Dictionary {
        Dictionary::new(vec![1; n])
    }

    #[test]
    fn test_zero_classes_rejected() {
        let hp = Hyperparameters::new("srn_sm", 4).with_non_linearity("relu");
        let err = make_model(&hp, &dict(0), None).unwrap_err();
        assert_eq!(err, ConfigurationError::ZeroClasses);
    }

    #[test]
    fn test_zero_hidden_rejected() {
        let hp = Hyperparameters::new("lstm_sm", 0);
        let err = make_model(&hp, &dict(10), None).unwrap_err();
        assert_eq!(err, ConfigurationError::ZeroHidden);
    }

    #[test]
    fn test_lstm_ignores_non_linearity() {
        let hp = Hyperparameters::new("lstm_sm", 4).with_non_linearity("tanh_typo");
        let (model, _) = make_model(&hp, &dict(10), None).unwrap();
        assert_eq!(model.encoder().family(), CellFamily::Lstm);
    }

    #[test]
    fn test_srn_requires_non_linearity() {
        let hp = Hyperparameters::new("srn_sm", 4);
        let err = make_model(&hp, &dict(10), None).unwrap_err();
        assert_eq!(err, ConfigurationError::MissingNonLinearity);
    }

    #[test]
    fn test_hsm_requires_mapping() {
        let hp = Hyperparameters::new("lstm_hsm", 4);
        let err = make_model(&hp, &dict(3), None).unwrap_err();
        assert_eq!(err, ConfigurationError::MissingClusterMapping);
    }

    #[test]
    fn test_parameters_cover_encoder_and_head() {
        let hp = Hyperparameters::new("srn_sm", 4).with_non_linearity("sigmoid");
        let (model, _) = make_model(&hp, &dict(10), None).unwrap();
        let names: Vec<&str> = model.parameters().map(Parameter::name).collect();
        assert_eq!(names, vec!["embed.weight", "project.weight", "decoder.weight"]);
    }
}
