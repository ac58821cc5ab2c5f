#![cfg_attr(docsrs, feature(doc_cfg))]
//! # salvus-mesh
//!
//! salvus-mesh reads the volumetric output of a spectral-element wave
//! simulation and serves it as an unstructured hexahedral mesh, one
//! contiguous piece of cells at a time, so a parallel visualization pipeline
//! can split the work across ranks.
//!
//! ## Features
//! - Equal-block cell partitioning with the remainder on the last piece
//! - Per-piece connectivity renumbering to a dense local node range
//! - Coordinate and field loading restricted to the piece's node range, by
//!   staging the full array or reading only the covering blocks
//! - Per-field enable/disable with zero I/O for disabled fields
//! - Time-step matching against the file's sampling rate and start time
//! - In-memory containers and an HDF5 backend (feature `hdf5`)
//! - Legacy VTK export of pieces with a JSON metadata sidecar
//!
//! ## Usage
//!
//! ```no_run
//! use salvus_mesh::prelude::*;
//!
//! # fn main() -> Result<(), MeshReadError> {
//! let files = MemoryFiles::new();
//! let mut reader = SalvusReader::new(files, ReaderConfig::default());
//! reader.set_file_name("volume.h5");
//! reader.request_information()?;
//! let piece = reader.request_data(&PieceRequest::new(0, 4), &mut NoProgress)?;
//! println!("{} cells", piece.cell_count());
//! # Ok(())
//! # }
//! ```
//!
//! ## Invariant checks
//! Enable the `check-invariants` feature to run the local-mesh structural
//! checks in release builds as well as debug builds.

pub mod algs;
pub mod config;
pub mod data;
pub mod debug_invariants;
pub mod io;
pub mod mesh_error;
pub mod reader;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::assemble::MeshResult;
    pub use crate::algs::partition::PartitionPlan;
    pub use crate::config::{ReadStrategy, ReaderConfig};
    pub use crate::data::local_mesh::PointField;
    pub use crate::data::metadata::MeshMetadata;
    pub use crate::data::model::ModelKind;
    pub use crate::data::selection::FieldSelection;
    pub use crate::debug_invariants::DebugInvariants;
    #[cfg(feature = "hdf5")]
    pub use crate::io::hdf5::{Hdf5File, Hdf5Opener};
    pub use crate::io::memory::{MemoryContainer, MemoryFiles};
    pub use crate::io::{ContainerOpener, DatasetAccessor, Hyperslab};
    pub use crate::mesh_error::MeshReadError;
    pub use crate::reader::{NoProgress, PieceRequest, ProgressObserver, SalvusReader};
    pub use crate::topology::cell_type::CellType;
}
