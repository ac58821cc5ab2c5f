//! Cell type metadata for extracted pieces.

/// Cell types emitted by the reader.
///
/// Salvus volume output only stores 8-node hexahedra, so this is the single
/// variant; the enum keeps the VTK mapping in one place.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum CellType {
    /// 3D tensor-product cell (hex).
    #[default]
    Hexahedron,
}

impl CellType {
    /// Returns the topological dimension of the cell.
    pub fn dimension(self) -> u8 {
        match self {
            CellType::Hexahedron => 3,
        }
    }

    /// Number of vertices per cell; also the leading marker in cell arrays.
    pub fn vertex_count(self) -> usize {
        match self {
            CellType::Hexahedron => 8,
        }
    }

    /// Legacy VTK cell type code.
    pub fn vtk_code(self) -> i32 {
        match self {
            CellType::Hexahedron => 12,
        }
    }

    /// Inverse of [`CellType::vtk_code`].
    pub fn from_vtk_code(code: i32) -> Option<Self> {
        match code {
            12 => Some(CellType::Hexahedron),
            _ => None,
        }
    }
}
