//! Per-piece output: one legacy VTK file plus a JSON metadata sidecar.
//!
//! Piece `k` of prefix `p` lands in `p.piece<k>.vtk` and `p.piece<k>.meta.json`.
//! The sidecar records what the `.vtk` file cannot: the partition plan, the
//! global node offset and the time stamp.

use crate::algs::assemble::MeshResult;
use crate::algs::partition::PartitionPlan;
use crate::io::vtk::{VtkReader, VtkWriter};
use crate::mesh_error::MeshReadError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

const PIECE_METADATA_VERSION: u32 = 1;

/// Sidecar describing one written piece.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PieceMetadata {
    /// Metadata format version.
    pub version: u32,
    pub piece_index: usize,
    pub piece_count: usize,
    /// First global cell of the piece.
    pub cell_offset: usize,
    pub cell_count: usize,
    /// Global id of local node 0.
    pub min_global_node_id: i64,
    pub node_count: usize,
    pub time_step: usize,
    pub time_value: Option<f64>,
}

impl PieceMetadata {
    pub fn for_mesh(mesh: &MeshResult) -> Self {
        Self {
            version: PIECE_METADATA_VERSION,
            piece_index: mesh.plan.piece_index,
            piece_count: mesh.plan.piece_count,
            cell_offset: mesh.plan.cell_offset,
            cell_count: mesh.plan.cell_count,
            min_global_node_id: mesh.global_node_offset,
            node_count: mesh.point_count(),
            time_step: mesh.time_step,
            time_value: mesh.time_value,
        }
    }

    fn plan(&self) -> PartitionPlan {
        PartitionPlan {
            piece_index: self.piece_index,
            piece_count: self.piece_count,
            cell_offset: self.cell_offset,
            cell_count: self.cell_count,
        }
    }
}

/// Path of the `.vtk` file for piece `index`.
pub fn local_mesh_path(dir: &Path, prefix: &str, index: usize) -> PathBuf {
    dir.join(format!("{prefix}.piece{index}.vtk"))
}

/// Path of the metadata sidecar for piece `index`.
pub fn local_meta_path(dir: &Path, prefix: &str, index: usize) -> PathBuf {
    dir.join(format!("{prefix}.piece{index}.meta.json"))
}

/// Write `mesh` and its metadata under `dir`, creating it if needed.
pub fn write_piece_with_metadata(
    dir: impl AsRef<Path>,
    prefix: &str,
    mesh: &MeshResult,
) -> Result<PieceMetadata, MeshReadError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let index = mesh.plan.piece_index;

    let mut mesh_bytes = Vec::new();
    VtkWriter.write(&mut mesh_bytes, mesh)?;
    fs::write(local_mesh_path(dir, prefix, index), mesh_bytes)?;

    let metadata = PieceMetadata::for_mesh(mesh);
    let meta_bytes = serde_json::to_vec_pretty(&metadata)?;
    fs::write(local_meta_path(dir, prefix, index), meta_bytes)?;
    log::debug!(
        "wrote piece {index}/{} ({} cells) to {}",
        metadata.piece_count,
        metadata.cell_count,
        dir.display()
    );
    Ok(metadata)
}

/// Read piece `index` back, restoring plan and time stamp from the sidecar.
pub fn read_piece(
    dir: impl AsRef<Path>,
    prefix: &str,
    index: usize,
) -> Result<MeshResult, MeshReadError> {
    let dir = dir.as_ref();
    let meta_bytes = fs::read(local_meta_path(dir, prefix, index))?;
    let metadata: PieceMetadata = serde_json::from_slice(&meta_bytes)?;
    if metadata.version != PIECE_METADATA_VERSION {
        return Err(MeshReadError::MeshIoParse(format!(
            "unsupported piece metadata version {}",
            metadata.version
        )));
    }
    if metadata.piece_index != index || index >= metadata.piece_count {
        return Err(MeshReadError::MeshIoParse(format!(
            "metadata piece index {} does not match requested {index}",
            metadata.piece_index
        )));
    }

    let mesh_bytes = fs::read(local_mesh_path(dir, prefix, index))?;
    let mut mesh = VtkReader.read(Cursor::new(mesh_bytes))?;
    if mesh.cell_count() != metadata.cell_count {
        return Err(MeshReadError::LengthMismatch {
            name: "cells".into(),
            expected: metadata.cell_count,
            found: mesh.cell_count(),
        });
    }
    if mesh.point_count() != metadata.node_count {
        return Err(MeshReadError::LengthMismatch {
            name: "points".into(),
            expected: metadata.node_count,
            found: mesh.point_count(),
        });
    }
    mesh.plan = metadata.plan();
    mesh.global_node_offset = metadata.min_global_node_id;
    mesh.time_step = metadata.time_step;
    mesh.time_value = metadata.time_value;
    Ok(mesh)
}

/// Write every piece, returning their metadata in piece order.
pub fn write_pieces<'a>(
    dir: impl AsRef<Path>,
    prefix: &str,
    pieces: impl IntoIterator<Item = &'a MeshResult>,
) -> Result<Vec<PieceMetadata>, MeshReadError> {
    let dir = dir.as_ref();
    pieces
        .into_iter()
        .map(|mesh| write_piece_with_metadata(dir, prefix, mesh))
        .collect()
}
