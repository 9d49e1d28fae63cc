//! Recurrent language-model factory.
//!
//! [`make_model`] reads a model name such as `"ptb_lstm_hsm"`, builds the
//! matching recurrent cell (simple recurrent network or LSTM) as a static
//! computation graph, attaches an output head (dense log-softmax or a
//! hierarchical softmax fused with its loss) and returns a registry of the
//! cell's named input layers for introspection.
//!
//! Graphs are evaluated on the CPU with [`Graph::forward`] and
//! differentiated with [`autograd::backward`].

pub mod autograd;
pub mod config;
pub mod error;
pub mod factory;
pub mod graph;
pub mod nn;
pub mod ops;
pub mod tensor;

pub use autograd::{Gradients, backward, check_gradients};
pub use config::{
    CellFamily, ClusterMapping, Dictionary, Hyperparameters, ModelSpec, NonLinearity,
    OutputHeadKind,
};
pub use error::{ConfigurationError, Error, EvalError, Result};
pub use factory::{Model, make_model};
pub use graph::{Graph, GraphBuilder, NodeId, ParamId, Parameter, Trace, Value};
pub use nn::{
    Cell, DenseHead, Gate, HierarchicalHead, InternalLayerRegistry, LayerName, OutputHead, State,
    Step,
};
pub use tensor::{Tensor, manual_seed};

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_built_artifacts_are_thread_safe() {
        assert_send_sync::<Model>();
        assert_send_sync::<InternalLayerRegistry>();
        assert_send_sync::<Graph>();
        assert_send_sync::<Parameter>();
    }
}
