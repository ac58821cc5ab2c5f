//! MeshReadError: Unified error type for salvus-mesh public APIs
//!
//! Every stage of a pass (probe, plan, connectivity, node data, assembly, export)
//! reports failures through this type. A request either fully succeeds or
//! returns one of these; no partial mesh is ever produced.

use crate::data::model::ModelKind;
use thiserror::Error;

/// Unified error type for salvus-mesh operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshReadError {
    /// Underlying I/O failure (file open, read, write).
    #[error("I/O error: {0}")]
    Io(String),
    /// No file name has been associated with the reader.
    #[error("no file name specified")]
    NoFileName,
    /// A group or dataset expected by the layout is absent.
    #[error("missing entry `{0}`")]
    MissingEntry(String),
    /// A scalar attribute expected on a group is absent.
    #[error("missing attribute `{name}` on `{owner}`")]
    MissingAttribute { owner: String, name: String },
    /// A scalar attribute is present but its value is unusable.
    #[error("invalid attribute `{name}` on `{owner}`: {detail}")]
    InvalidAttribute {
        owner: String,
        name: String,
        detail: String,
    },
    /// A dataset has a rank or extent that does not fit the layout.
    #[error("shape mismatch in `{path}`: {detail}")]
    ShapeMismatch { path: String, detail: String },
    /// Connectivity stored with an integer width other than 32 or 64 bit.
    #[error("unsupported index width of {bytes} bytes in `{path}`")]
    UnsupportedIndexWidth { path: String, bytes: usize },
    /// The stored element type cannot be read into the requested buffer type.
    #[error("element type mismatch in `{path}`: expected {expected}")]
    ElementType { path: String, expected: &'static str },
    /// A hyperslab selection falls outside the dataset extent.
    #[error("hyperslab out of bounds in `{path}`: {detail}")]
    SlabOutOfBounds { path: String, detail: String },
    /// Invalid piece request (zero pieces, index out of range).
    #[error("invalid partition: {0}")]
    InvalidPartition(String),
    /// Field selection and metadata describe different model kinds.
    #[error("field selection for {selection} used with {metadata} metadata")]
    ModelKindMismatch {
        selection: ModelKind,
        metadata: ModelKind,
    },
    /// Geometry parameters that cannot describe a volume.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    /// Connectivity referenced a negative or out-of-range node id.
    #[error("node id {id} outside [0, {node_count})")]
    NodeIdOutOfRange { id: i64, node_count: usize },
    /// Array length disagrees with the expected node or cell count.
    #[error("length mismatch for `{name}`: expected {expected}, found {found}")]
    LengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    /// Metadata or configuration (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Generic parse failure on exported pieces.
    #[error("mesh I/O parse error: {0}")]
    MeshIoParse(String),
}

impl From<std::io::Error> for MeshReadError {
    fn from(err: std::io::Error) -> Self {
        MeshReadError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for MeshReadError {
    fn from(err: serde_json::Error) -> Self {
        MeshReadError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert_and_keep_message() {
        let err: MeshReadError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err, MeshReadError::Io("gone".into()));
        assert_eq!(err.to_string(), "I/O error: gone");
    }
}
