//! HDF5 container backend (feature `hdf5`).
//!
//! Sub-block reads go through `read_slice` with one `s!` selection per
//! dataset rank; the mesh layout only uses ranks 2, 3 and 4.

use crate::data::model::VOLUME_GROUP;
use crate::io::{ContainerOpener, DatasetAccessor, Hyperslab, normalize_path};
use crate::mesh_error::MeshReadError;
use hdf5::{Dataset, File, H5Type};
use ndarray::{IxDyn, s};
use std::path::Path;

impl From<hdf5::Error> for MeshReadError {
    fn from(err: hdf5::Error) -> Self {
        MeshReadError::Io(err.to_string())
    }
}

/// One open HDF5 file; closed when dropped.
#[derive(Debug)]
pub struct Hdf5File {
    file: File,
}

impl Hdf5File {
    pub fn open(path: &Path) -> Result<Self, MeshReadError> {
        let file = File::open(path).map_err(|e| {
            MeshReadError::Io(format!("unable to open file {}: {e}", path.display()))
        })?;
        Ok(Self { file })
    }

    fn dataset(&self, path: &str) -> Result<Dataset, MeshReadError> {
        let path = normalize_path(path);
        if !self.exists(path) {
            return Err(MeshReadError::MissingEntry(path.to_string()));
        }
        Ok(self.file.dataset(path)?)
    }

    fn read_slab<T: H5Type + Copy>(
        &self,
        path: &str,
        slab: &Hyperslab,
        dst: &mut [T],
    ) -> Result<(), MeshReadError> {
        let dataset = self.dataset(path)?;
        let shape = dataset.shape();
        slab.check_within(path, &shape)?;
        if dst.len() != slab.len() {
            return Err(MeshReadError::LengthMismatch {
                name: path.to_string(),
                expected: slab.len(),
                found: dst.len(),
            });
        }
        if slab.is_empty() {
            return Ok(());
        }
        let o = slab.offset();
        let c = slab.count();
        let block = match slab.rank() {
            2 => dataset.read_slice::<T, _, IxDyn>(s![o[0]..o[0] + c[0], o[1]..o[1] + c[1]])?,
            3 => dataset.read_slice::<T, _, IxDyn>(s![
                o[0]..o[0] + c[0],
                o[1]..o[1] + c[1],
                o[2]..o[2] + c[2]
            ])?,
            4 => dataset.read_slice::<T, _, IxDyn>(s![
                o[0]..o[0] + c[0],
                o[1]..o[1] + c[1],
                o[2]..o[2] + c[2],
                o[3]..o[3] + c[3]
            ])?,
            rank => {
                return Err(MeshReadError::ShapeMismatch {
                    path: path.to_string(),
                    detail: format!("unsupported dataset rank {rank}"),
                });
            }
        };
        for (d, v) in dst.iter_mut().zip(block.iter()) {
            *d = *v;
        }
        Ok(())
    }
}

impl DatasetAccessor for Hdf5File {
    fn exists(&self, path: &str) -> bool {
        let path = normalize_path(path);
        // link_exists only resolves one level; walk the components.
        let mut prefix = String::new();
        for part in path.split('/') {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(part);
            if !self.file.link_exists(&prefix) {
                return false;
            }
        }
        !path.is_empty()
    }

    fn shape(&self, path: &str) -> Result<Vec<usize>, MeshReadError> {
        Ok(self.dataset(path)?.shape())
    }

    fn read_attribute_f64(&self, owner: &str, name: &str) -> Result<f64, MeshReadError> {
        let owner = normalize_path(owner);
        let missing = || MeshReadError::MissingAttribute {
            owner: owner.to_string(),
            name: name.to_string(),
        };
        let group = self.file.group(owner).map_err(|_| missing())?;
        let attr = group.attr(name).map_err(|_| missing())?;
        Ok(attr.read_scalar::<f64>()?)
    }

    fn read_f32(&self, path: &str, slab: &Hyperslab, dst: &mut [f32]) -> Result<(), MeshReadError> {
        let dataset = self.dataset(path)?;
        let dtype = dataset.dtype()?;
        if !dtype.is::<f32>() && !dtype.is::<f64>() {
            return Err(MeshReadError::ElementType {
                path: path.to_string(),
                expected: "floating point",
            });
        }
        self.read_slab(path, slab, dst)
    }

    fn read_indices(
        &self,
        path: &str,
        slab: &Hyperslab,
        dst: &mut [i64],
    ) -> Result<(), MeshReadError> {
        let dataset = self.dataset(path)?;
        let dtype = dataset.dtype()?;
        if dtype.is::<f32>() || dtype.is::<f64>() {
            return Err(MeshReadError::ElementType {
                path: path.to_string(),
                expected: "integer",
            });
        }
        match dtype.size() {
            4 => {
                let mut narrow = vec![0i32; slab.len()];
                self.read_slab(path, slab, &mut narrow)?;
                for (d, v) in dst.iter_mut().zip(narrow) {
                    *d = i64::from(v);
                }
                Ok(())
            }
            8 => self.read_slab(path, slab, dst),
            bytes => Err(MeshReadError::UnsupportedIndexWidth {
                path: path.to_string(),
                bytes,
            }),
        }
    }
}

/// Opens [`Hdf5File`] handles read-only.
#[derive(Clone, Copy, Debug)]
pub struct Hdf5Opener {
    /// Requested transfer buffer size, logged per open.
    pub transfer_buffer_bytes: usize,
}

impl Hdf5Opener {
    pub fn new(transfer_buffer_bytes: usize) -> Self {
        Self {
            transfer_buffer_bytes,
        }
    }
}

impl Default for Hdf5Opener {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_TRANSFER_BUFFER_BYTES)
    }
}

impl ContainerOpener for Hdf5Opener {
    type Handle = Hdf5File;

    fn open(&self, path: &Path) -> Result<Hdf5File, MeshReadError> {
        log::debug!(
            "opening {} (transfer buffer {} bytes)",
            path.display(),
            self.transfer_buffer_bytes
        );
        Hdf5File::open(path)
    }

    fn can_read_file(&self, path: &Path) -> bool {
        match Hdf5File::open(path) {
            Ok(file) => file.exists(VOLUME_GROUP),
            Err(err) => {
                log::debug!("{err}");
                false
            }
        }
    }
}
