//! Container access and mesh export.
//!
//! The extraction engine only needs a small capability from the on-disk
//! container: report the shape of a named dataset, read a scalar attribute,
//! and copy a rectangular sub-block (hyperslab) into a caller buffer. That
//! capability is the [`DatasetAccessor`] trait; [`memory`] and (with the
//! `hdf5` feature) [`hdf5`] provide implementations.

#[cfg(feature = "hdf5")]
pub mod hdf5;
pub mod memory;
pub mod partitioned;
pub mod synthetic;
pub mod vtk;

use crate::mesh_error::MeshReadError;
use std::path::Path;
use std::sync::Arc;

/// Rectangular selection inside an N-dimensional dataset.
///
/// `offset[d]..offset[d] + count[d]` is selected along every dimension `d`.
/// Values are delivered in row-major order of the selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hyperslab {
    offset: Vec<usize>,
    count: Vec<usize>,
}

impl Hyperslab {
    /// Build a selection; `offset` and `count` must have equal rank.
    pub fn new(offset: Vec<usize>, count: Vec<usize>) -> Self {
        debug_assert_eq!(offset.len(), count.len(), "hyperslab rank mismatch");
        Self { offset, count }
    }

    /// Select a whole dataset of the given shape.
    pub fn whole(shape: &[usize]) -> Self {
        Self::new(vec![0; shape.len()], shape.to_vec())
    }

    #[inline]
    pub fn offset(&self) -> &[usize] {
        &self.offset
    }

    #[inline]
    pub fn count(&self) -> &[usize] {
        &self.count
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.count.len()
    }

    /// Number of elements selected.
    pub fn len(&self) -> usize {
        self.count.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check that the selection fits inside `shape`.
    pub fn check_within(&self, path: &str, shape: &[usize]) -> Result<(), MeshReadError> {
        if shape.len() != self.rank() || self.offset.len() != self.rank() {
            return Err(MeshReadError::SlabOutOfBounds {
                path: path.to_string(),
                detail: format!("rank {} selection on rank {} dataset", self.rank(), shape.len()),
            });
        }
        for (d, ((&off, &cnt), &ext)) in self
            .offset
            .iter()
            .zip(&self.count)
            .zip(shape)
            .enumerate()
        {
            if off.checked_add(cnt).is_none_or(|end| end > ext) {
                return Err(MeshReadError::SlabOutOfBounds {
                    path: path.to_string(),
                    detail: format!("dim {d}: {off}+{cnt} exceeds extent {ext}"),
                });
            }
        }
        Ok(())
    }
}

/// Read-only access to named datasets inside a hierarchical container.
///
/// Paths are `/`-separated and relative to the root (`"volume/stress"`);
/// a leading `/` is accepted.
pub trait DatasetAccessor {
    /// Whether a group or dataset exists at `path`.
    fn exists(&self, path: &str) -> bool;

    /// Extent of the dataset at `path`.
    fn shape(&self, path: &str) -> Result<Vec<usize>, MeshReadError>;

    /// Scalar `f64` attribute `name` attached to the group or dataset `owner`.
    fn read_attribute_f64(&self, owner: &str, name: &str) -> Result<f64, MeshReadError>;

    /// Copy the selected floating-point block into `dst`.
    ///
    /// `dst.len()` must equal `slab.len()`.
    fn read_f32(&self, path: &str, slab: &Hyperslab, dst: &mut [f32])
    -> Result<(), MeshReadError>;

    /// Copy the selected integer block into `dst`, widening to `i64`.
    ///
    /// Only 32- and 64-bit stored integers are accepted; anything else is
    /// [`MeshReadError::UnsupportedIndexWidth`].
    fn read_indices(
        &self,
        path: &str,
        slab: &Hyperslab,
        dst: &mut [i64],
    ) -> Result<(), MeshReadError>;
}

impl<A: DatasetAccessor + ?Sized> DatasetAccessor for &A {
    fn exists(&self, path: &str) -> bool {
        (**self).exists(path)
    }
    fn shape(&self, path: &str) -> Result<Vec<usize>, MeshReadError> {
        (**self).shape(path)
    }
    fn read_attribute_f64(&self, owner: &str, name: &str) -> Result<f64, MeshReadError> {
        (**self).read_attribute_f64(owner, name)
    }
    fn read_f32(
        &self,
        path: &str,
        slab: &Hyperslab,
        dst: &mut [f32],
    ) -> Result<(), MeshReadError> {
        (**self).read_f32(path, slab, dst)
    }
    fn read_indices(
        &self,
        path: &str,
        slab: &Hyperslab,
        dst: &mut [i64],
    ) -> Result<(), MeshReadError> {
        (**self).read_indices(path, slab, dst)
    }
}

impl<A: DatasetAccessor + ?Sized> DatasetAccessor for Arc<A> {
    fn exists(&self, path: &str) -> bool {
        (**self).exists(path)
    }
    fn shape(&self, path: &str) -> Result<Vec<usize>, MeshReadError> {
        (**self).shape(path)
    }
    fn read_attribute_f64(&self, owner: &str, name: &str) -> Result<f64, MeshReadError> {
        (**self).read_attribute_f64(owner, name)
    }
    fn read_f32(
        &self,
        path: &str,
        slab: &Hyperslab,
        dst: &mut [f32],
    ) -> Result<(), MeshReadError> {
        (**self).read_f32(path, slab, dst)
    }
    fn read_indices(
        &self,
        path: &str,
        slab: &Hyperslab,
        dst: &mut [i64],
    ) -> Result<(), MeshReadError> {
        (**self).read_indices(path, slab, dst)
    }
}

/// Opens a container file and yields a handle scoped to one pass.
///
/// The handle is dropped (and the file closed) at the end of the pass on
/// every exit path.
pub trait ContainerOpener {
    /// Handle type returned for an opened file.
    type Handle: DatasetAccessor;

    /// Open `path` read-only.
    fn open(&self, path: &Path) -> Result<Self::Handle, MeshReadError>;

    /// A file qualifies iff a top-level `volume` entry exists.
    fn can_read_file(&self, path: &Path) -> bool {
        match self.open(path) {
            Ok(handle) => handle.exists(crate::data::model::VOLUME_GROUP),
            Err(e) => {
                log::debug!("cannot open {}: {e}", path.display());
                false
            }
        }
    }
}

/// Fetch the shape of `path` and require it to have `rank` dimensions.
pub fn shape_with_rank<A: DatasetAccessor + ?Sized>(
    accessor: &A,
    path: &str,
    rank: usize,
) -> Result<Vec<usize>, MeshReadError> {
    if !accessor.exists(path) {
        return Err(MeshReadError::MissingEntry(path.to_string()));
    }
    let shape = accessor.shape(path)?;
    if shape.len() != rank {
        return Err(MeshReadError::ShapeMismatch {
            path: path.to_string(),
            detail: format!("expected rank {rank}, found shape {shape:?}"),
        });
    }
    Ok(shape)
}

/// Strip a leading `/` so both `"/volume"` and `"volume"` resolve alike.
pub(crate) fn normalize_path(path: &str) -> &str {
    path.trim_start_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hyperslab_bounds() {
        let slab = Hyperslab::new(vec![1, 0], vec![2, 8]);
        assert_eq!(slab.len(), 16);
        assert!(slab.check_within("c", &[3, 8]).is_ok());
        assert!(matches!(
            slab.check_within("c", &[2, 8]),
            Err(MeshReadError::SlabOutOfBounds { .. })
        ));
        assert!(slab.check_within("c", &[3, 8, 1]).is_err());
    }

    #[test]
    fn whole_selects_everything() {
        let slab = Hyperslab::whole(&[4, 125, 3]);
        assert_eq!(slab.offset(), &[0, 0, 0]);
        assert_eq!(slab.len(), 4 * 125 * 3);
    }

    #[test]
    fn normalize_strips_root() {
        assert_eq!(normalize_path("/volume/stress"), "volume/stress");
        assert_eq!(normalize_path("volume"), "volume");
    }
}
