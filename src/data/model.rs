//! Model kinds and the fixed dataset layout they select.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Top-level group holding the time-varying wavefield.
pub const VOLUME_GROUP: &str = "volume";
/// Attribute on [`VOLUME_GROUP`]: output sampling rate in hertz.
pub const SAMPLING_RATE_ATTR: &str = "sampling_rate_in_hertz";
/// Attribute on [`VOLUME_GROUP`]: time of the first output sample in seconds.
pub const START_TIME_ATTR: &str = "start_time_in_seconds";

const ELASTIC_FIELDS: [&str; 6] = [
    "stress_xx",
    "stress_yy",
    "stress_zz",
    "stress_yz",
    "stress_xz",
    "stress_xy",
];
const ACOUSTIC_FIELDS: [&str; 1] = ["phi_tt"];

/// Mesh variant stored in a Salvus volume file.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ModelKind {
    /// Solid region; six stress tensor components.
    #[default]
    Elastic,
    /// Fluid region; one scalar potential.
    Acoustic,
}

impl ModelKind {
    /// Suffix used in top-level dataset names.
    pub fn tag(self) -> &'static str {
        match self {
            ModelKind::Elastic => "ELASTIC",
            ModelKind::Acoustic => "ACOUSTIC",
        }
    }

    /// `[cells, 8]` integer connectivity.
    pub fn connectivity_path(self) -> String {
        format!("connectivity_{}", self.tag())
    }

    /// `[blocks, nodes_per_block, 3]` float coordinates.
    pub fn coordinates_path(self) -> String {
        format!("coordinates_{}", self.tag())
    }

    /// `[steps, blocks, components, padded_block]` field dataset.
    pub fn field_path(self) -> String {
        format!("{VOLUME_GROUP}/{}", self.field_dataset())
    }

    /// Name of the field dataset inside [`VOLUME_GROUP`].
    pub fn field_dataset(self) -> &'static str {
        match self {
            ModelKind::Elastic => "stress",
            ModelKind::Acoustic => "phi_tt",
        }
    }

    /// Point array names, in component order of the field dataset.
    pub fn field_names(self) -> &'static [&'static str] {
        match self {
            ModelKind::Elastic => &ELASTIC_FIELDS,
            ModelKind::Acoustic => &ACOUSTIC_FIELDS,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ELASTIC" => Ok(ModelKind::Elastic),
            "ACOUSTIC" => Ok(ModelKind::Acoustic),
            other => Err(format!("unknown model kind `{other}`")),
        }
    }
}
