//! Recurrent cells, output heads, and the registry of introspectable layers.

pub mod cell;
pub mod head;
pub mod layers;
pub mod registry;

pub use cell::{Cell, State, StatePorts, Step};
pub use head::{DenseHead, HierarchicalHead, OutputHead};
pub use layers::{LstmCellBuilder, SrnCellBuilder};
pub use registry::{Gate, InternalLayerRegistry, LayerName};
