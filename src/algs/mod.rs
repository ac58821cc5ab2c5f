//! Extraction passes: planning, connectivity, node data, probing, assembly.

pub mod assemble;
pub mod connectivity;
pub mod node_data;
pub mod partition;
pub mod probe;

pub use assemble::{MeshResult, assemble};
pub use partition::{PartitionPlan, plan};
pub use probe::probe;
