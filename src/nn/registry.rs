use crate::config::CellFamily;
use crate::graph::{NodeId, Trace};
use crate::tensor::Tensor;
use std::fmt;

/// LSTM gates, numbered 1..=4 in registry names (`embed1` is the input
/// gate's embedding, `project4` the candidate's recurrent projection).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Gate {
    Input,
    Forget,
    Output,
    Candidate,
}

impl Gate {
    pub const ALL: [Gate; 4] = [Gate::Input, Gate::Forget, Gate::Output, Gate::Candidate];

    #[must_use]
    pub const fn ordinal(self) -> usize {
        match self {
            Self::Input => 1,
            Self::Forget => 2,
            Self::Output => 3,
            Self::Candidate => 4,
        }
    }
}

/// Closed set of introspectable layer names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerName {
    /// SRN input embedding
    Embed,
    /// SRN recurrent projection
    Project,
    /// LSTM per-gate input embedding
    GateEmbed(Gate),
    /// LSTM per-gate recurrent projection
    GateProject(Gate),
}

impl LayerName {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Embed => "embed",
            Self::Project => "project",
            Self::GateEmbed(Gate::Input) => "embed1",
            Self::GateEmbed(Gate::Forget) => "embed2",
            Self::GateEmbed(Gate::Output) => "embed3",
            Self::GateEmbed(Gate::Candidate) => "embed4",
            Self::GateProject(Gate::Input) => "project1",
            Self::GateProject(Gate::Forget) => "project2",
            Self::GateProject(Gate::Output) => "project3",
            Self::GateProject(Gate::Candidate) => "project4",
        }
    }

    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let gate = |ordinal: &str| Gate::ALL.into_iter().find(|g| g.ordinal().to_string() == ordinal);
        match name {
            "embed" => Some(Self::Embed),
            "project" => Some(Self::Project),
            _ => {
                if let Some(n) = name.strip_prefix("embed") {
                    gate(n).map(Self::GateEmbed)
                } else if let Some(n) = name.strip_prefix("project") {
                    gate(n).map(Self::GateProject)
                } else {
                    None
                }
            }
        }
    }
}

impl fmt::Display for LayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named handles into a cell's intermediate nodes.
///
/// Populated once by the cell builder: `{embed, project}` for SRN cells,
/// `{embed1..4, project1..4}` for LSTM cells. Handles refer to nodes of
/// the encoder graph; their values come from a
/// [`Trace`](crate::graph::Trace) of that graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InternalLayerRegistry {
    family: CellFamily,
    entries: Vec<(LayerName, NodeId)>,
}

impl InternalLayerRegistry {
    pub(crate) fn srn(embed: NodeId, project: NodeId) -> Self {
        Self {
            family: CellFamily::Srn,
            entries: vec![(LayerName::Embed, embed), (LayerName::Project, project)],
        }
    }

    pub(crate) fn lstm(embeds: [NodeId; 4], projects: [NodeId; 4]) -> Self {
        let embeds = Gate::ALL.into_iter().map(LayerName::GateEmbed).zip(embeds);
        let projects = Gate::ALL.into_iter().map(LayerName::GateProject).zip(projects);
        Self {
            family: CellFamily::Lstm,
            entries: embeds.chain(projects).collect(),
        }
    }

    #[must_use]
    pub const fn family(&self) -> CellFamily {
        self.family
    }

    /// Handle registered under `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<NodeId> {
        LayerName::parse(name).and_then(|layer| self.layer(layer))
    }

    #[must_use]
    pub fn layer(&self, layer: LayerName) -> Option<NodeId> {
        self.entries
            .iter()
            .find(|(name, _)| *name == layer)
            .map(|&(_, id)| id)
    }

    /// Activation of the layer registered under `name` in one evaluation
    /// of the encoder graph
    #[must_use]
    pub fn value<'t>(&self, trace: &'t Trace, name: &str) -> Option<&'t Tensor> {
        self.get(name).and_then(|id| trace.value(id))
    }

    /// Names in registration order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (LayerName, NodeId)> + '_ {
        self.entries.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
