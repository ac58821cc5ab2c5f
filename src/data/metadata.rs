//! Global mesh and time-step metadata published by the information pass.

use crate::data::model::ModelKind;
use serde::{Deserialize, Serialize};

/// Default tolerance when matching a requested time to a published step.
pub const DEFAULT_TIME_TOLERANCE: f64 = 1e-6;

/// Sizes and time axis of one model kind in a volume file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshMetadata {
    /// Model kind the sizes were read for.
    pub model_kind: ModelKind,
    /// Rows in the connectivity table.
    pub global_cell_count: usize,
    /// `blocks * nodes_per_block` of the coordinate table.
    pub global_node_count: usize,
    /// Declared sub-block size of the coordinate table.
    pub nodes_per_block: usize,
    /// Leading extent of the field dataset.
    pub time_step_count: usize,
    /// `start_time + i / sampling_rate` for every step.
    pub time_step_values: Vec<f64>,
    /// Matching tolerance for requested times.
    pub time_tolerance: f64,
    pub sampling_rate_hz: f64,
    pub start_time_s: f64,
}

impl MeshMetadata {
    /// First and last published time, `None` without time steps.
    pub fn time_range(&self) -> Option<(f64, f64)> {
        match (self.time_step_values.first(), self.time_step_values.last()) {
            (Some(&first), Some(&last)) => Some((first, last)),
            _ => None,
        }
    }

    /// Index of the first step within tolerance of `requested`.
    pub fn match_time_step(&self, requested: f64) -> Option<usize> {
        self.time_step_values
            .iter()
            .position(|&t| (requested - t).abs() < self.time_tolerance)
    }

    /// Step to read for an optional requested time; falls back to step 0.
    pub fn resolve_time_step(&self, requested: Option<f64>) -> usize {
        let Some(requested) = requested else {
            return 0;
        };
        match self.match_time_step(requested) {
            Some(step) => step,
            None => {
                log::warn!(
                    "requested time {requested} matches no time step within {}; using step 0",
                    self.time_tolerance
                );
                0
            }
        }
    }
}

/// Linearly spaced time values `start + i * dt`.
pub fn time_values(start: f64, sampling_rate_hz: f64, count: usize) -> Vec<f64> {
    let dt = 1.0 / sampling_rate_hz;
    (0..count).map(|i| start + i as f64 * dt).collect()
}
