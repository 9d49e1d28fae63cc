use crate::config::CellFamily;
use crate::graph::{GraphBuilder, NodeId};
use crate::nn::cell::{Cell, StatePorts};
use crate::nn::registry::{Gate, InternalLayerRegistry};
use crate::ops::Activation;
use tracing::debug;

/// LSTM cell - processes one timestep at a time
///
/// Implements the LSTM equations:
/// - i = `sigmoid(E_i(x) + P_i(h))`  (input gate)
/// - f = `sigmoid(E_f(x) + P_f(h))`  (forget gate)
/// - o = `sigmoid(E_o(x) + P_o(h))`  (output gate)
/// - g = `tanh(E_g(x) + P_g(h))`     (candidate)
/// - `c_next` = f * c + i * g
/// - `h_next` = o * `tanh(c_next)`
///
/// Each gate owns its own embedding `E_*` and bias-free recurrent
/// projection `P_*`; nothing is stored as one stacked matrix, so every
/// gate's pre-activations can be read back separately.
pub struct LstmCellBuilder {
    pub n_classes: usize,
    pub n_hidden: usize,
}

/// Nodes built for one gate
#[derive(Clone, Copy)]
struct GateNodes {
    embed: NodeId,
    project: NodeId,
    activation: NodeId,
}

impl Gate {
    const fn squash(self) -> Activation {
        match self {
            Gate::Candidate => Activation::Tanh,
            Gate::Input | Gate::Forget | Gate::Output => Activation::Sigmoid,
        }
    }
}

impl LstmCellBuilder {
    #[must_use]
    pub const fn new(n_classes: usize, n_hidden: usize) -> Self {
        Self {
            n_classes,
            n_hidden,
        }
    }

    /// Build the cell graph and register `embed1..4` / `project1..4`
    #[must_use]
    pub fn build(self) -> (Cell, InternalLayerRegistry) {
        let mut b = GraphBuilder::new();
        let token = b.index_input("token");
        let h_prev = b.dense_input("prev_hidden", self.n_hidden);
        let c_prev = b.dense_input("prev_memory", self.n_hidden);

        // token and h_prev each fan out to all four gates
        let gates: [GateNodes; 4] = Gate::ALL.map(|gate| {
            let n = gate.ordinal();
            let embed = b.embedding(format!("embed{n}"), token, self.n_classes, self.n_hidden);
            let project = b.projection(format!("project{n}"), h_prev, self.n_hidden, false);
            let pre = b.add(embed, project);
            GateNodes {
                embed,
                project,
                activation: b.activation(gate.squash(), pre),
            }
        });
        let [i, f, o, g] = gates.map(|nodes| nodes.activation);

        let keep = b.mul(f, c_prev);
        let write = b.mul(i, g);
        let c_next = b.add(keep, write);
        let c_squashed = b.activation(Activation::Tanh, c_next);
        let h_next = b.mul(o, c_squashed);

        let graph = b.build();
        debug!(
            n_classes = self.n_classes,
            n_hidden = self.n_hidden,
            nodes = graph.len(),
            parameters = graph.parameters().len(),
            "built lstm cell"
        );
        let registry = InternalLayerRegistry::lstm(
            gates.map(|nodes| nodes.embed),
            gates.map(|nodes| nodes.project),
        );
        let cell = Cell::new(
            CellFamily::Lstm,
            graph,
            token,
            StatePorts {
                hidden: h_prev,
                memory: Some(c_prev),
            },
            StatePorts {
                hidden: h_next,
                memory: Some(c_next),
            },
            self.n_classes,
            self.n_hidden,
        );
        (cell, registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Op;
    use crate::nn::cell::State;
    use crate::tensor::Tensor;

    #[test]
    fn test_lstm_shapes() {
        let (cell, _) = LstmCellBuilder::new(30, 5).build();
        let state = State::Lstm {
            hidden: Tensor::randn(&[3, 5]),
            memory: Tensor::randn(&[3, 5]),
        };
        let step = cell.step(&[0, 10, 29], &state).unwrap();
        assert_eq!(step.state.hidden().shape, vec![3, 5]);
        assert_eq!(step.state.memory().map(|m| m.shape.clone()), Some(vec![3, 5]));
    }

    #[test]
    fn test_eight_distinct_parameter_sets() {
        let (cell, _) = LstmCellBuilder::new(30, 5).build();
        let params = cell.graph().parameters();
        assert_eq!(params.len(), 8);
        for (a, p) in params.iter().enumerate() {
            for q in params.iter().skip(a + 1) {
                assert!(!p.shares_storage(q));
            }
        }
        assert!(params.iter().all(|p| !p.name().ends_with(".bias")));
    }

    #[test]
    fn test_prev_hidden_fans_out_to_four_projections() {
        let (cell, reg) = LstmCellBuilder::new(30, 5).build();
        let graph = cell.graph();
        let consumers = graph.consumers(cell.state_inputs().hidden);
        let projects: Vec<NodeId> = (1..=4)
            .map(|n| reg.get(&format!("project{n}")).unwrap())
            .collect();
        assert_eq!(consumers, projects);
        let embeds = graph.consumers(cell.token_input());
        assert_eq!(embeds.len(), 4);
        assert!(embeds
            .iter()
            .all(|&id| matches!(graph.node(id).map(|n| &n.op), Some(Op::Embedding(_)))));
    }

    #[test]
    fn test_zero_parameters_give_closed_form() {
        // all pre-activations vanish: i = f = o = 0.5, g = 0
        let (cell, _) = LstmCellBuilder::new(4, 2).build();
        for p in cell.graph().parameters() {
            p.write().data.fill(0.0);
        }
        let c_prev = Tensor::new(vec![1.0, -2.0], &[1, 2]);
        let state = State::Lstm {
            hidden: Tensor::randn(&[1, 2]),
            memory: c_prev,
        };
        let step = cell.step(&[3], &state).unwrap();
        let c_next = step.state.memory().unwrap();
        assert!(c_next.max_abs_diff(&Tensor::new(vec![0.5, -1.0], &[1, 2])) < 1e-6);
        let expected_h = Tensor::new(vec![0.5 * 0.5_f32.tanh(), 0.5 * (-1.0_f32).tanh()], &[1, 2]);
        assert!(step.state.hidden().max_abs_diff(&expected_h) < 1e-6);
    }

    #[test]
    fn test_initial_state_step() {
        let (cell, _) = LstmCellBuilder::new(4, 3).build();
        let state = cell.initial_state(2);
        let step = cell.step(&[0, 1], &state).unwrap();
        // c_prev = 0 so c_next = i * g, bounded by 1 in magnitude
        assert!(step.state.memory().unwrap().data.iter().all(|v| v.abs() < 1.0));
    }
}
