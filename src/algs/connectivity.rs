//! Connectivity loading and piece-local renumbering.
//!
//! A piece reads its rows of the global `[cells, 8]` table straight into the
//! cell-array layout `[8, n0, .., n7]` per cell. For multi-piece requests the
//! referenced ids are then shifted so the smallest one becomes local id 0.

use crate::algs::partition::PartitionPlan;
use crate::data::local_mesh::{CELL_ARRAY_STRIDE, NODES_PER_CELL, NodeRange};
use crate::data::model::ModelKind;
use crate::io::{DatasetAccessor, Hyperslab, shape_with_rank};
use crate::mesh_error::MeshReadError;
use crate::topology::cell_type::CellType;
use itertools::{Itertools, MinMaxResult};

/// Cell array and node range of one piece.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PieceConnectivity {
    /// `[8, n0, .., n7]` per cell, local ids.
    pub cells: Vec<i64>,
    pub nodes: NodeRange,
}

/// Read and renumber the connectivity rows of `plan`.
///
/// With a single piece the ids are left untouched and the node range is the
/// whole global range. Otherwise the bounding range of referenced ids is
/// computed and every id is shifted by its minimum.
pub fn load_connectivity<A: DatasetAccessor + ?Sized>(
    accessor: &A,
    kind: ModelKind,
    plan: &PartitionPlan,
    global_node_count: usize,
) -> Result<PieceConnectivity, MeshReadError> {
    let path = kind.connectivity_path();
    let shape = shape_with_rank(accessor, &path, 2)?;
    if shape[1] != NODES_PER_CELL {
        return Err(MeshReadError::ShapeMismatch {
            path,
            detail: format!("expected {NODES_PER_CELL} nodes per cell, found {}", shape[1]),
        });
    }
    let slab = Hyperslab::new(
        vec![plan.cell_offset, 0],
        vec![plan.cell_count, NODES_PER_CELL],
    );
    slab.check_within(&path, &shape)?;

    if plan.is_empty() {
        log::debug!("piece {} of {} has no cells", plan.piece_index, plan.piece_count);
        // A single piece always owns every node, cells or not.
        let nodes = if plan.is_whole() {
            NodeRange::full(global_node_count)
        } else {
            NodeRange::empty()
        };
        return Ok(PieceConnectivity {
            cells: Vec::new(),
            nodes,
        });
    }

    let n = plan.cell_count;
    log::debug!(
        "piece {}: allocating {n} cells * {CELL_ARRAY_STRIDE} ids = {} bytes",
        plan.piece_index,
        n * CELL_ARRAY_STRIDE * std::mem::size_of::<i64>()
    );
    let mut cells = vec![0i64; n * CELL_ARRAY_STRIDE];
    accessor.read_indices(&path, &slab, &mut cells[..n * NODES_PER_CELL])?;
    spread_rows(&mut cells, n);

    let nodes = if plan.is_whole() {
        NodeRange::full(global_node_count)
    } else {
        let nodes = index_bounds(&cells).ok_or_else(|| {
            MeshReadError::ShapeMismatch {
                path: path.clone(),
                detail: "no node ids in a non-empty piece".into(),
            }
        })?;
        if nodes.min_global_node_id < 0 {
            return Err(MeshReadError::NodeIdOutOfRange {
                id: nodes.min_global_node_id,
                node_count: global_node_count,
            });
        }
        if nodes.max_global_node_id as usize >= global_node_count {
            return Err(MeshReadError::NodeIdOutOfRange {
                id: nodes.max_global_node_id,
                node_count: global_node_count,
            });
        }
        shift_indices(&mut cells, nodes.min_global_node_id);
        nodes
    };
    write_size_markers(&mut cells);

    log::debug!(
        "piece {}: cells {:?}, global nodes [{}, {}] -> {} local nodes",
        plan.piece_index,
        plan.cells(),
        nodes.min_global_node_id,
        nodes.max_global_node_id,
        nodes.node_count
    );
    Ok(PieceConnectivity { cells, nodes })
}

/// Move `rows` packed 8-wide rows at the front of `buf` into 9-wide rows,
/// leaving slot 0 of every row free.
///
/// Works back to front so no row is overwritten before it is moved.
pub fn spread_rows(buf: &mut [i64], rows: usize) {
    debug_assert!(buf.len() >= rows * CELL_ARRAY_STRIDE);
    for row in (0..rows).rev() {
        let src = row * NODES_PER_CELL;
        let dst = row * CELL_ARRAY_STRIDE + 1;
        buf.copy_within(src..src + NODES_PER_CELL, dst);
    }
}

/// Write the hexahedron size marker into slot 0 of every row.
pub fn write_size_markers(cells: &mut [i64]) {
    let marker = CellType::Hexahedron.vertex_count() as i64;
    for row in cells.chunks_exact_mut(CELL_ARRAY_STRIDE) {
        row[0] = marker;
    }
}

/// Bounding range of the node ids in a 9-wide cell array.
pub fn index_bounds(cells: &[i64]) -> Option<NodeRange> {
    let ids = cells
        .chunks_exact(CELL_ARRAY_STRIDE)
        .flat_map(|row| row[1..].iter().copied());
    match ids.minmax() {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(id) => Some(NodeRange::from_bounds(id, id)),
        MinMaxResult::MinMax(min, max) => Some(NodeRange::from_bounds(min, max)),
    }
}

/// Subtract `min` from every node id, keeping slot 0 of each row.
pub fn shift_indices(cells: &mut [i64], min: i64) {
    for row in cells.chunks_exact_mut(CELL_ARRAY_STRIDE) {
        for id in &mut row[1..] {
            *id -= min;
        }
    }
}
