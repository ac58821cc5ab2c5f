//! Final assembly of a piece into an unstructured hexahedral mesh.

use crate::algs::partition::PartitionPlan;
use crate::data::local_mesh::{CELL_ARRAY_STRIDE, LocalMesh, PointField};
use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshReadError;
use crate::topology::cell_type::CellType;

/// Unstructured grid handed to the consuming pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshResult {
    /// Partition this piece was cut from.
    pub plan: PartitionPlan,
    /// Cell array, `[8, n0, .., n7]` per cell in local node ids.
    pub cells: Vec<i64>,
    /// One entry per cell; always hexahedra.
    pub cell_types: Vec<CellType>,
    /// `xyz` per local node.
    pub points: Vec<f32>,
    /// Named per-point scalars, `point_count()` values each.
    pub point_data: Vec<PointField>,
    /// Global id of local node 0.
    pub global_node_offset: i64,
    /// Time step the point data was read at.
    pub time_step: usize,
    /// Requested time value stamped on the output, when one was given.
    pub time_value: Option<f64>,
}

impl MeshResult {
    pub fn cell_count(&self) -> usize {
        self.cell_types.len()
    }

    pub fn point_count(&self) -> usize {
        self.points.len() / 3
    }

    pub fn point_array(&self, name: &str) -> Option<&[f32]> {
        self.point_data
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.values.as_slice())
    }

    /// Global node id of every local node.
    pub fn global_node_ids(&self) -> impl Iterator<Item = i64> + '_ {
        (0..self.point_count() as i64).map(move |i| i + self.global_node_offset)
    }
}

/// Combine loaded connectivity, coordinates and fields into a [`MeshResult`].
///
/// Only lengths are validated: the cell array against the planned cell count,
/// coordinates and every field against the node count.
pub fn assemble(mesh: LocalMesh, time_value: Option<f64>) -> Result<MeshResult, MeshReadError> {
    let cells = mesh.cell_count();
    let nodes = mesh.node_count();
    check_len("cells", cells * CELL_ARRAY_STRIDE, mesh.cells.len())?;
    check_len("coordinates", 3 * nodes, mesh.coordinates.len())?;
    for field in &mesh.fields {
        check_len(&field.name, nodes, field.values.len())?;
    }
    mesh.debug_assert_invariants();

    log::info!(
        "piece {}/{}: {cells} hexahedra, {nodes} points, {} point arrays",
        mesh.plan.piece_index,
        mesh.plan.piece_count,
        mesh.fields.len()
    );
    Ok(MeshResult {
        plan: mesh.plan,
        cells: mesh.cells,
        cell_types: vec![CellType::Hexahedron; cells],
        points: mesh.coordinates,
        point_data: mesh.fields,
        global_node_offset: mesh.nodes.min_global_node_id,
        time_step: mesh.time_step,
        time_value,
    })
}

fn check_len(name: &str, expected: usize, found: usize) -> Result<(), MeshReadError> {
    if expected != found {
        return Err(MeshReadError::LengthMismatch {
            name: name.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}
