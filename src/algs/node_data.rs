//! Coordinate and point-field loading for a piece's node range.
//!
//! Node data is stored in blocks: coordinates as `[blocks, nodes_per_block, 3]`
//! and fields as `[steps, blocks, components, padded_block]`, where only the
//! first `nodes_per_block` entries of a padded block carry nodes. Global node
//! `g` lives in block `g / nodes_per_block` at position `g % nodes_per_block`.
//!
//! A single piece reads straight into the destination. Multi-piece requests
//! either stage the whole global array and copy the node range out of it
//! ([`ReadStrategy::StageFullArray`]) or read only the covering blocks
//! ([`ReadStrategy::PartialHyperslab`]).

use crate::config::ReadStrategy;
use crate::data::local_mesh::{NodeRange, PointField};
use crate::data::model::ModelKind;
use crate::data::selection::FieldSelection;
use crate::io::{DatasetAccessor, Hyperslab, shape_with_rank};
use crate::mesh_error::MeshReadError;
use std::ops::Range;

/// Block decomposition of the global node table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeLayout {
    pub blocks: usize,
    pub nodes_per_block: usize,
}

impl NodeLayout {
    #[inline]
    pub fn global_node_count(&self) -> usize {
        self.blocks * self.nodes_per_block
    }

    /// Blocks overlapping `nodes`, as a block index range.
    pub fn covering_blocks(&self, nodes: &NodeRange) -> Range<usize> {
        if nodes.node_count == 0 || self.nodes_per_block == 0 {
            return 0..0;
        }
        let first = nodes.start() / self.nodes_per_block;
        let last = (nodes.end() - 1) / self.nodes_per_block;
        first..last + 1
    }
}

/// Block layout declared by the coordinate dataset of `kind`.
pub fn coordinate_layout<A: DatasetAccessor + ?Sized>(
    accessor: &A,
    kind: ModelKind,
) -> Result<NodeLayout, MeshReadError> {
    let path = kind.coordinates_path();
    let shape = shape_with_rank(accessor, &path, 3)?;
    if shape[2] != 3 {
        return Err(MeshReadError::ShapeMismatch {
            path,
            detail: format!("expected 3 coordinate components, found {}", shape[2]),
        });
    }
    Ok(NodeLayout {
        blocks: shape[0],
        nodes_per_block: shape[1],
    })
}

/// Read `xyz` for every node of `nodes`; `3 * node_count` values.
pub fn load_coordinates<A: DatasetAccessor + ?Sized>(
    accessor: &A,
    kind: ModelKind,
    nodes: &NodeRange,
    piece_count: usize,
    strategy: ReadStrategy,
) -> Result<Vec<f32>, MeshReadError> {
    let path = kind.coordinates_path();
    let layout = coordinate_layout(accessor, kind)?;
    read_node_range(&path, &layout, nodes, piece_count, strategy, 3, |blocks, dst| {
        let slab = Hyperslab::new(
            vec![blocks.start, 0, 0],
            vec![blocks.len(), layout.nodes_per_block, 3],
        );
        accessor.read_f32(&path, &slab, dst)
    })
}

/// Read one field component at one time step for every node of `nodes`.
#[allow(clippy::too_many_arguments)]
pub fn load_field<A: DatasetAccessor + ?Sized>(
    accessor: &A,
    kind: ModelKind,
    component: usize,
    time_step: usize,
    nodes: &NodeRange,
    layout: &NodeLayout,
    piece_count: usize,
    strategy: ReadStrategy,
) -> Result<Vec<f32>, MeshReadError> {
    let path = kind.field_path();
    let shape = field_shape(accessor, kind, layout)?;
    if time_step >= shape[0] {
        return Err(MeshReadError::SlabOutOfBounds {
            path,
            detail: format!("time step {time_step} of {}", shape[0]),
        });
    }
    if component >= shape[2] {
        return Err(MeshReadError::SlabOutOfBounds {
            path,
            detail: format!("component {component} of {}", shape[2]),
        });
    }
    read_node_range(&path, layout, nodes, piece_count, strategy, 1, |blocks, dst| {
        let slab = Hyperslab::new(
            vec![time_step, blocks.start, component, 0],
            vec![1, blocks.len(), 1, layout.nodes_per_block],
        );
        accessor.read_f32(&path, &slab, dst)
    })
}

/// Load every enabled field of `selection`. Disabled fields are never read;
/// with nothing enabled the field dataset is not touched at all.
pub fn load_fields<A: DatasetAccessor + ?Sized>(
    accessor: &A,
    selection: &FieldSelection,
    time_step: usize,
    nodes: &NodeRange,
    layout: &NodeLayout,
    piece_count: usize,
    strategy: ReadStrategy,
) -> Result<Vec<PointField>, MeshReadError> {
    let kind = selection.kind();
    selection
        .enabled()
        .map(|field| {
            log::debug!(
                "loading {} (component {}) at step {time_step} for {} nodes",
                field.name,
                field.component,
                nodes.node_count
            );
            let values = load_field(
                accessor,
                kind,
                field.component,
                time_step,
                nodes,
                layout,
                piece_count,
                strategy,
            )?;
            Ok(PointField {
                name: field.name.clone(),
                values,
            })
        })
        .collect()
}

/// Shape of the field dataset, checked against the coordinate layout.
fn field_shape<A: DatasetAccessor + ?Sized>(
    accessor: &A,
    kind: ModelKind,
    layout: &NodeLayout,
) -> Result<Vec<usize>, MeshReadError> {
    let path = kind.field_path();
    let shape = shape_with_rank(accessor, &path, 4)?;
    if shape[1] != layout.blocks {
        return Err(MeshReadError::ShapeMismatch {
            path,
            detail: format!("{} node blocks, coordinates have {}", shape[1], layout.blocks),
        });
    }
    if shape[3] < layout.nodes_per_block {
        return Err(MeshReadError::ShapeMismatch {
            path,
            detail: format!(
                "block size {} smaller than coordinate block size {}",
                shape[3], layout.nodes_per_block
            ),
        });
    }
    Ok(shape)
}

/// Shared range extraction for coordinates (`width == 3`) and fields
/// (`width == 1`). `read(blocks, dst)` fills `dst` with the node values of
/// the given block range in node order.
fn read_node_range<F>(
    path: &str,
    layout: &NodeLayout,
    nodes: &NodeRange,
    piece_count: usize,
    strategy: ReadStrategy,
    width: usize,
    mut read: F,
) -> Result<Vec<f32>, MeshReadError>
where
    F: FnMut(Range<usize>, &mut [f32]) -> Result<(), MeshReadError>,
{
    let global = layout.global_node_count();
    if nodes.node_count == 0 {
        return Ok(Vec::new());
    }
    if nodes.end() > global {
        return Err(MeshReadError::NodeIdOutOfRange {
            id: nodes.max_global_node_id,
            node_count: global,
        });
    }

    if piece_count == 1 {
        if nodes.node_count != global {
            return Err(MeshReadError::LengthMismatch {
                name: path.to_string(),
                expected: global,
                found: nodes.node_count,
            });
        }
        let mut dst = vec![0.0f32; width * global];
        read(0..layout.blocks, &mut dst)?;
        return Ok(dst);
    }

    let (blocks, first_node) = match strategy {
        ReadStrategy::StageFullArray => (0..layout.blocks, 0),
        ReadStrategy::PartialHyperslab => {
            let blocks = layout.covering_blocks(nodes);
            let first = blocks.start * layout.nodes_per_block;
            (blocks, first)
        }
    };
    log::debug!(
        "{path}: staging {} nodes ({} bytes) for a {}-node range",
        blocks.len() * layout.nodes_per_block,
        blocks.len() * layout.nodes_per_block * width * std::mem::size_of::<f32>(),
        nodes.node_count
    );
    let mut staging = vec![0.0f32; width * blocks.len() * layout.nodes_per_block];
    read(blocks, &mut staging)?;
    let start = width * (nodes.start() - first_node);
    let dst = staging[start..start + width * nodes.node_count].to_vec();
    drop(staging);
    Ok(dst)
}
