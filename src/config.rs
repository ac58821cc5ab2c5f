//! Reader configuration.

use crate::data::metadata::DEFAULT_TIME_TOLERANCE;
use crate::data::model::ModelKind;
use crate::mesh_error::MeshReadError;
use serde::{Deserialize, Serialize};

/// Default HDF5 dataset transfer buffer (1 MiB).
pub const DEFAULT_TRANSFER_BUFFER_BYTES: usize = 1024 * 1024;

/// How multi-piece requests read coordinates and fields.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadStrategy {
    /// Read the whole global array into a temporary and copy the piece's
    /// node range out of it. Peak memory is one full array per piece.
    #[default]
    StageFullArray,
    /// Read only the node blocks overlapping the piece's node range.
    PartialHyperslab,
}

/// Options shared by every pass of a [`SalvusReader`](crate::reader::SalvusReader).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Mesh variant to extract.
    pub model_kind: ModelKind,
    /// Maximum distance between a requested time and a published step.
    pub time_tolerance: f64,
    /// Node data read strategy for multi-piece requests.
    pub read_strategy: ReadStrategy,
    /// Transfer buffer size handed to the HDF5 backend.
    pub transfer_buffer_bytes: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            model_kind: ModelKind::Elastic,
            time_tolerance: DEFAULT_TIME_TOLERANCE,
            read_strategy: ReadStrategy::StageFullArray,
            transfer_buffer_bytes: DEFAULT_TRANSFER_BUFFER_BYTES,
        }
    }
}

impl ReaderConfig {
    /// Parse a JSON document; missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, MeshReadError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), MeshReadError> {
        if !(self.time_tolerance.is_finite() && self.time_tolerance > 0.0) {
            return Err(MeshReadError::Serialization(format!(
                "time_tolerance must be positive, got {}",
                self.time_tolerance
            )));
        }
        Ok(())
    }
}
