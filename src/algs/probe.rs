//! Metadata probing: global sizes and the time axis, without bulk reads.

use crate::algs::node_data::coordinate_layout;
use crate::data::metadata::{MeshMetadata, time_values};
use crate::data::model::{ModelKind, SAMPLING_RATE_ATTR, START_TIME_ATTR, VOLUME_GROUP};
use crate::io::{DatasetAccessor, shape_with_rank};
use crate::mesh_error::MeshReadError;

/// Read global cell/node counts and the time axis for `kind`.
///
/// The time-step count is dimension 0 of the field dataset of `kind`; a
/// dataset belonging to the other kind is never consulted, and without the
/// own dataset the count is zero. Fails when the volume group or the mesh
/// datasets of `kind` are absent.
pub fn probe<A: DatasetAccessor + ?Sized>(
    accessor: &A,
    kind: ModelKind,
    time_tolerance: f64,
) -> Result<MeshMetadata, MeshReadError> {
    let connectivity = shape_with_rank(accessor, &kind.connectivity_path(), 2)?;
    let layout = coordinate_layout(accessor, kind)?;

    if !accessor.exists(VOLUME_GROUP) {
        return Err(MeshReadError::MissingEntry(VOLUME_GROUP.to_string()));
    }
    let sampling_rate_hz = accessor.read_attribute_f64(VOLUME_GROUP, SAMPLING_RATE_ATTR)?;
    let start_time_s = accessor.read_attribute_f64(VOLUME_GROUP, START_TIME_ATTR)?;
    if !(sampling_rate_hz.is_finite() && sampling_rate_hz > 0.0) {
        return Err(MeshReadError::InvalidAttribute {
            owner: VOLUME_GROUP.to_string(),
            name: SAMPLING_RATE_ATTR.to_string(),
            detail: format!("sampling rate must be positive, got {sampling_rate_hz}"),
        });
    }

    let field_path = kind.field_path();
    let time_step_count = if accessor.exists(&field_path) {
        shape_with_rank(accessor, &field_path, 4)?[0]
    } else {
        log::debug!("{kind}: no {field_path} dataset, no time steps");
        0
    };

    let metadata = MeshMetadata {
        model_kind: kind,
        global_cell_count: connectivity[0],
        global_node_count: layout.global_node_count(),
        nodes_per_block: layout.nodes_per_block,
        time_step_count,
        time_step_values: time_values(start_time_s, sampling_rate_hz, time_step_count),
        time_tolerance,
        sampling_rate_hz,
        start_time_s,
    };
    log::debug!(
        "{kind}: {} cells, {} nodes ({} blocks of {}), {} time steps",
        metadata.global_cell_count,
        metadata.global_node_count,
        layout.blocks,
        layout.nodes_per_block,
        metadata.time_step_count
    );
    Ok(metadata)
}
