pub mod embedding;
pub mod hsm;
pub mod linear;
pub mod lstm;
pub mod srn;

pub use embedding::Embedding;
pub use hsm::{HierarchicalSoftmax, HsmGrads, HsmParams};
pub use linear::{Linear, LinearGrads};
pub use lstm::LstmCellBuilder;
pub use srn::SrnCellBuilder;
