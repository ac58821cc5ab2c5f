//! Piece-local mesh produced by the loaders.

use crate::algs::partition::PartitionPlan;
use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshReadError;
use crate::topology::cell_type::CellType;

/// Slots per cell in the cell array: the size marker then eight node ids.
pub const CELL_ARRAY_STRIDE: usize = 9;
/// Nodes per hexahedron.
pub const NODES_PER_CELL: usize = 8;

/// Dense range of global node ids referenced by a piece.
///
/// The range is the bounding interval `[min, max]` of the referenced ids, so
/// it may contain ids no local cell touches. An empty piece has
/// `count == 0`, `min == 0`, `max == -1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeRange {
    pub min_global_node_id: i64,
    pub max_global_node_id: i64,
    pub node_count: usize,
}

impl NodeRange {
    /// `[min, max]`, inclusive.
    pub fn from_bounds(min: i64, max: i64) -> Self {
        debug_assert!(max >= min);
        Self {
            min_global_node_id: min,
            max_global_node_id: max,
            node_count: (max - min + 1) as usize,
        }
    }

    /// Identity range covering every global node.
    pub fn full(global_node_count: usize) -> Self {
        Self {
            min_global_node_id: 0,
            max_global_node_id: global_node_count as i64 - 1,
            node_count: global_node_count,
        }
    }

    pub fn empty() -> Self {
        Self {
            min_global_node_id: 0,
            max_global_node_id: -1,
            node_count: 0,
        }
    }

    /// First global id as a buffer offset.
    #[inline]
    pub fn start(&self) -> usize {
        self.min_global_node_id as usize
    }

    /// One past the last global id as a buffer offset.
    #[inline]
    pub fn end(&self) -> usize {
        self.start() + self.node_count
    }
}

/// One loaded point array.
#[derive(Clone, Debug, PartialEq)]
pub struct PointField {
    pub name: String,
    pub values: Vec<f32>,
}

/// Everything loaded for one piece, in local node numbering.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalMesh {
    pub plan: PartitionPlan,
    pub nodes: NodeRange,
    /// `[8, n0, .., n7]` per cell; `plan.cell_count * 9` entries.
    pub cells: Vec<i64>,
    /// `xyz` per local node; `3 * nodes.node_count` entries.
    pub coordinates: Vec<f32>,
    /// Enabled point arrays in component order.
    pub fields: Vec<PointField>,
    /// Time step the fields were read at.
    pub time_step: usize,
}

impl LocalMesh {
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.plan.cell_count
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.node_count
    }

    /// Local node ids of cell `i`.
    pub fn cell_nodes(&self, i: usize) -> Option<&[i64]> {
        let start = i * CELL_ARRAY_STRIDE + 1;
        self.cells.get(start..start + NODES_PER_CELL)
    }

    /// Coordinates of local node `i`.
    pub fn point(&self, i: usize) -> Option<[f32; 3]> {
        let xyz = self.coordinates.get(3 * i..3 * i + 3)?;
        Some([xyz[0], xyz[1], xyz[2]])
    }

    pub fn field(&self, name: &str) -> Option<&[f32]> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.values.as_slice())
    }
}

impl DebugInvariants for LocalMesh {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "LocalMesh");
    }

    fn validate_invariants(&self) -> Result<(), MeshReadError> {
        let cells = self.cell_count();
        let nodes = self.node_count();
        let marker = CellType::Hexahedron.vertex_count() as i64;
        if self.cells.len() != cells * CELL_ARRAY_STRIDE {
            return Err(MeshReadError::LengthMismatch {
                name: "cells".into(),
                expected: cells * CELL_ARRAY_STRIDE,
                found: self.cells.len(),
            });
        }
        for row in self.cells.chunks_exact(CELL_ARRAY_STRIDE) {
            if row[0] != marker {
                return Err(MeshReadError::ShapeMismatch {
                    path: "cells".into(),
                    detail: format!("cell size marker {} instead of {marker}", row[0]),
                });
            }
            if let Some(&id) = row[1..].iter().find(|&&id| id < 0 || id as usize >= nodes) {
                return Err(MeshReadError::NodeIdOutOfRange {
                    id,
                    node_count: nodes,
                });
            }
        }
        if self.coordinates.len() != 3 * nodes {
            return Err(MeshReadError::LengthMismatch {
                name: "coordinates".into(),
                expected: 3 * nodes,
                found: self.coordinates.len(),
            });
        }
        for field in &self.fields {
            if field.values.len() != nodes {
                return Err(MeshReadError::LengthMismatch {
                    name: field.name.clone(),
                    expected: nodes,
                    found: field.values.len(),
                });
            }
        }
        Ok(())
    }
}
