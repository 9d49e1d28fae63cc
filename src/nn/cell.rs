use crate::config::CellFamily;
use crate::error::EvalError;
use crate::graph::{Graph, NodeId, Trace, Value};
use crate::tensor::Tensor;

/// Recurrent state threaded between steps.
#[derive(Clone, Debug, PartialEq)]
pub enum State {
    Srn { hidden: Tensor },
    Lstm { hidden: Tensor, memory: Tensor },
}

impl State {
    #[must_use]
    pub fn hidden(&self) -> &Tensor {
        match self {
            Self::Srn { hidden } | Self::Lstm { hidden, .. } => hidden,
        }
    }

    #[must_use]
    pub fn memory(&self) -> Option<&Tensor> {
        match self {
            Self::Srn { .. } => None,
            Self::Lstm { memory, .. } => Some(memory),
        }
    }

    #[must_use]
    pub const fn family(&self) -> CellFamily {
        match self {
            Self::Srn { .. } => CellFamily::Srn,
            Self::Lstm { .. } => CellFamily::Lstm,
        }
    }
}

/// Graph ports carrying the state in or out of a cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatePorts {
    pub hidden: NodeId,
    pub memory: Option<NodeId>,
}

/// Result of one cell application
#[derive(Debug)]
pub struct Step {
    pub state: State,
    /// Every node's value, for introspection and backward
    pub trace: Trace,
}

/// A recurrent cell: `(token, previous state) -> next state`.
#[derive(Debug)]
pub struct Cell {
    family: CellFamily,
    graph: Graph,
    token: NodeId,
    prev: StatePorts,
    next: StatePorts,
    n_classes: usize,
    n_hidden: usize,
}

impl Cell {
    pub(crate) fn new(
        family: CellFamily,
        graph: Graph,
        token: NodeId,
        prev: StatePorts,
        next: StatePorts,
        n_classes: usize,
        n_hidden: usize,
    ) -> Self {
        Self {
            family,
            graph,
            token,
            prev,
            next,
            n_classes,
            n_hidden,
        }
    }

    #[must_use]
    pub const fn family(&self) -> CellFamily {
        self.family
    }

    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    #[must_use]
    pub const fn token_input(&self) -> NodeId {
        self.token
    }

    #[must_use]
    pub const fn state_inputs(&self) -> StatePorts {
        self.prev
    }

    #[must_use]
    pub const fn state_outputs(&self) -> StatePorts {
        self.next
    }

    #[must_use]
    pub const fn n_classes(&self) -> usize {
        self.n_classes
    }

    #[must_use]
    pub const fn n_hidden(&self) -> usize {
        self.n_hidden
    }

    /// All-zero state for `batch` rows
    #[must_use]
    pub fn initial_state(&self, batch: usize) -> State {
        let zeros = || Tensor::zeros(&[batch, self.n_hidden]);
        match self.family {
            CellFamily::Srn => State::Srn { hidden: zeros() },
            CellFamily::Lstm => State::Lstm {
                hidden: zeros(),
                memory: zeros(),
            },
        }
    }

    /// Apply the cell to one token per batch row.
    pub fn step(&self, tokens: &[usize], state: &State) -> Result<Step, EvalError> {
        if state.family() != self.family {
            return Err(EvalError::StateMismatch {
                expected: self.family.as_str(),
                found: state.family().as_str(),
            });
        }
        let mut feeds = vec![
            (self.token, Value::Indices(tokens.to_vec())),
            (self.prev.hidden, Value::Dense(state.hidden().clone())),
        ];
        if let (Some(port), Some(memory)) = (self.prev.memory, state.memory()) {
            feeds.push((port, Value::Dense(memory.clone())));
        }
        let trace = self.graph.forward(feeds)?;

        let hidden = trace.dense(self.next.hidden)?.clone();
        let state = match self.next.memory {
            None => State::Srn { hidden },
            Some(port) => State::Lstm {
                hidden,
                memory: trace.dense(port)?.clone(),
            },
        };
        Ok(Step { state, trace })
    }
}
