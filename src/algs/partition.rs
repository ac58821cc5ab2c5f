//! Contiguous block partitioning of the global cell range.
//!
//! Pieces `0..count-1` receive `floor(N / count)` cells each and the last
//! piece receives the remainder, so the pieces tile `[0, N)` exactly once.

use crate::mesh_error::MeshReadError;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Cell range assigned to one piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionPlan {
    pub piece_index: usize,
    pub piece_count: usize,
    pub cell_offset: usize,
    pub cell_count: usize,
}

impl PartitionPlan {
    /// The whole mesh as one piece.
    pub fn single(global_cell_count: usize) -> Self {
        Self {
            piece_index: 0,
            piece_count: 1,
            cell_offset: 0,
            cell_count: global_cell_count,
        }
    }

    /// Whether this piece spans the whole mesh, so global ids are local ids.
    #[inline]
    pub fn is_whole(&self) -> bool {
        self.piece_count == 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cell_count == 0
    }

    /// Global cell rows covered by this piece.
    #[inline]
    pub fn cells(&self) -> Range<usize> {
        self.cell_offset..self.cell_offset + self.cell_count
    }
}

/// Plan the cell range of `piece_index` out of `piece_count` pieces.
///
/// When there are fewer cells than pieces the block size is zero, every
/// piece but the last is empty and the last takes all cells; counts never
/// go negative.
pub fn plan(
    global_cell_count: usize,
    piece_count: usize,
    piece_index: usize,
) -> Result<PartitionPlan, MeshReadError> {
    if piece_count == 0 {
        return Err(MeshReadError::InvalidPartition(
            "piece count must be at least 1".into(),
        ));
    }
    if piece_index >= piece_count {
        return Err(MeshReadError::InvalidPartition(format!(
            "piece index {piece_index} out of range for {piece_count} pieces"
        )));
    }
    if piece_count == 1 {
        return Ok(PartitionPlan::single(global_cell_count));
    }

    let load = global_cell_count / piece_count;
    let cell_offset = piece_index * load;
    let cell_count = if piece_index + 1 < piece_count {
        load
    } else {
        global_cell_count.saturating_sub((piece_count - 1) * load)
    };
    Ok(PartitionPlan {
        piece_index,
        piece_count,
        cell_offset,
        cell_count,
    })
}

/// Plans for every piece, in piece order.
pub fn plan_all(
    global_cell_count: usize,
    piece_count: usize,
) -> Result<Vec<PartitionPlan>, MeshReadError> {
    (0..piece_count)
        .map(|piece| plan(global_cell_count, piece_count, piece))
        .collect()
}
