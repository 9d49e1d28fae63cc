use crate::config::{CellFamily, NonLinearity};
use crate::graph::GraphBuilder;
use crate::nn::cell::{Cell, StatePorts};
use crate::nn::registry::InternalLayerRegistry;
use tracing::debug;

/// Simple recurrent cell
///
/// - s = E(token) + P(h_prev)     (P has no bias)
/// - h_next = nonlinearity(s)
pub struct SrnCellBuilder {
    pub n_classes: usize,
    pub n_hidden: usize,
    pub non_linearity: NonLinearity,
}

impl SrnCellBuilder {
    #[must_use]
    pub const fn new(n_classes: usize, n_hidden: usize, non_linearity: NonLinearity) -> Self {
        Self {
            n_classes,
            n_hidden,
            non_linearity,
        }
    }

    /// Build the cell graph and register `embed` / `project`
    #[must_use]
    pub fn build(self) -> (Cell, InternalLayerRegistry) {
        let mut b = GraphBuilder::new();
        let token = b.index_input("token");
        let h_prev = b.dense_input("prev_hidden", self.n_hidden);

        let embed = b.embedding("embed", token, self.n_classes, self.n_hidden);
        let project = b.projection("project", h_prev, self.n_hidden, false);
        let sum = b.add(embed, project);
        let h_next = b.activation(self.non_linearity.activation(), sum);

        let graph = b.build();
        debug!(
            n_classes = self.n_classes,
            n_hidden = self.n_hidden,
            non_linearity = self.non_linearity.activation().name(),
            nodes = graph.len(),
            "built srn cell"
        );
        let cell = Cell::new(
            CellFamily::Srn,
            graph,
            token,
            StatePorts {
                hidden: h_prev,
                memory: None,
            },
            StatePorts {
                hidden: h_next,
                memory: None,
            },
            self.n_classes,
            self.n_hidden,
        );
        (cell, InternalLayerRegistry::srn(embed, project))
    }
}
