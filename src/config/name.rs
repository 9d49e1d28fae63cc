use crate::error::ConfigurationError;
use std::fmt;
use std::str::FromStr;

/// Recurrent cell family selected by the model name
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellFamily {
    /// Simple recurrent network: one hidden vector of state
    Srn,
    /// Long short-term memory: hidden and memory vectors of state
    Lstm,
}

impl CellFamily {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Srn => "srn",
            Self::Lstm => "lstm",
        }
    }
}

impl fmt::Display for CellFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output head selected by the model name
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutputHeadKind {
    /// `_sm`: projection + log-softmax over every class
    Dense,
    /// `_hsm`: fused projection + class-clustered softmax loss
    Hierarchical,
}

impl OutputHeadKind {
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Dense => "_sm",
            Self::Hierarchical => "_hsm",
        }
    }
}

/// Typed form of a model name such as `"lstm_hsm"` or `"wiki_srn_sm_v2"`.
///
/// The name must contain exactly one of `srn` / `lstm` and exactly one of
/// `_sm` / `_hsm`; anything else around those tokens is ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ModelSpec {
    pub cell: CellFamily,
    pub head: OutputHeadKind,
}

fn exactly_one<T: Copy>(
    name: &str,
    candidates: [(&str, T); 2],
    none: fn(String) -> ConfigurationError,
    both: fn(String) -> ConfigurationError,
) -> Result<T, ConfigurationError> {
    let [(a_tok, a), (b_tok, b)] = candidates;
    match (name.contains(a_tok), name.contains(b_tok)) {
        (true, false) => Ok(a),
        (false, true) => Ok(b),
        (false, false) => Err(none(name.to_string())),
        (true, true) => Err(both(name.to_string())),
    }
}

impl FromStr for ModelSpec {
    type Err = ConfigurationError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let cell = exactly_one(
            name,
            [("srn", CellFamily::Srn), ("lstm", CellFamily::Lstm)],
            ConfigurationError::UnknownCellFamily,
            ConfigurationError::AmbiguousCellFamily,
        )?;
        let head = exactly_one(
            name,
            [
                (OutputHeadKind::Dense.token(), OutputHeadKind::Dense),
                (OutputHeadKind::Hierarchical.token(), OutputHeadKind::Hierarchical),
            ],
            ConfigurationError::UnknownOutputHead,
            ConfigurationError::AmbiguousOutputHead,
        )?;
        Ok(Self { cell, head })
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.cell, self.head.token())
    }
}
