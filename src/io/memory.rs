//! In-memory hierarchical container.
//!
//! Stores row-major datasets, groups and scalar attributes keyed by path and
//! implements [`DatasetAccessor`] with the same hyperslab semantics as the
//! HDF5 backend. Used to build synthetic volume files and to serve pieces
//! without touching disk.

use crate::io::{ContainerOpener, DatasetAccessor, Hyperslab, normalize_path};
use crate::mesh_error::MeshReadError;
use num_traits::AsPrimitive;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Typed element storage of one dataset.
#[derive(Clone, Debug, PartialEq)]
pub enum DatasetValues {
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl DatasetValues {
    pub fn len(&self) -> usize {
        match self {
            DatasetValues::I16(v) => v.len(),
            DatasetValues::I32(v) => v.len(),
            DatasetValues::I64(v) => v.len(),
            DatasetValues::F32(v) => v.len(),
            DatasetValues::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored element width in bytes.
    pub fn element_size(&self) -> usize {
        match self {
            DatasetValues::I16(_) => 2,
            DatasetValues::I32(_) | DatasetValues::F32(_) => 4,
            DatasetValues::I64(_) | DatasetValues::F64(_) => 8,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct MemoryDataset {
    shape: Vec<usize>,
    values: DatasetValues,
}

/// A container held entirely in memory.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryContainer {
    groups: BTreeSet<String>,
    datasets: BTreeMap<String, MemoryDataset>,
    attributes: BTreeMap<(String, String), f64>,
}

impl MemoryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a group and all of its parents.
    pub fn add_group(&mut self, path: &str) {
        let path = normalize_path(path);
        let mut prefix = String::new();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(part);
            self.groups.insert(prefix.clone());
        }
    }

    /// Insert a dataset, creating parent groups.
    pub fn insert(
        &mut self,
        path: &str,
        shape: Vec<usize>,
        values: DatasetValues,
    ) -> Result<(), MeshReadError> {
        let path = normalize_path(path);
        let expected: usize = shape.iter().product();
        if values.len() != expected {
            return Err(MeshReadError::LengthMismatch {
                name: path.to_string(),
                expected,
                found: values.len(),
            });
        }
        if let Some((parent, _)) = path.rsplit_once('/') {
            self.add_group(parent);
        }
        self.datasets
            .insert(path.to_string(), MemoryDataset { shape, values });
        Ok(())
    }

    pub fn insert_i32(
        &mut self,
        path: &str,
        shape: Vec<usize>,
        values: Vec<i32>,
    ) -> Result<(), MeshReadError> {
        self.insert(path, shape, DatasetValues::I32(values))
    }

    pub fn insert_i64(
        &mut self,
        path: &str,
        shape: Vec<usize>,
        values: Vec<i64>,
    ) -> Result<(), MeshReadError> {
        self.insert(path, shape, DatasetValues::I64(values))
    }

    pub fn insert_f32(
        &mut self,
        path: &str,
        shape: Vec<usize>,
        values: Vec<f32>,
    ) -> Result<(), MeshReadError> {
        self.insert(path, shape, DatasetValues::F32(values))
    }

    /// Attach a scalar attribute to an existing or new group/dataset path.
    pub fn set_attribute(&mut self, owner: &str, name: &str, value: f64) {
        let owner = normalize_path(owner);
        if !self.datasets.contains_key(owner) {
            self.add_group(owner);
        }
        self.attributes
            .insert((owner.to_string(), name.to_string()), value);
    }

    /// Remove a dataset or group (and everything below it).
    pub fn remove(&mut self, path: &str) {
        let path = normalize_path(path);
        let nested = format!("{path}/");
        self.datasets
            .retain(|k, _| k != path && !k.starts_with(&nested));
        self.groups.retain(|k| k != path && !k.starts_with(&nested));
        self.attributes
            .retain(|(owner, _), _| owner != path && !owner.starts_with(&nested));
    }

    fn dataset(&self, path: &str) -> Result<&MemoryDataset, MeshReadError> {
        let path = normalize_path(path);
        self.datasets
            .get(path)
            .ok_or_else(|| MeshReadError::MissingEntry(path.to_string()))
    }

    fn checked_dataset(
        &self,
        path: &str,
        slab: &Hyperslab,
        dst_len: usize,
    ) -> Result<&MemoryDataset, MeshReadError> {
        let ds = self.dataset(path)?;
        slab.check_within(path, &ds.shape)?;
        if dst_len != slab.len() {
            return Err(MeshReadError::LengthMismatch {
                name: path.to_string(),
                expected: slab.len(),
                found: dst_len,
            });
        }
        Ok(ds)
    }
}

impl DatasetAccessor for MemoryContainer {
    fn exists(&self, path: &str) -> bool {
        let path = normalize_path(path);
        path.is_empty() || self.groups.contains(path) || self.datasets.contains_key(path)
    }

    fn shape(&self, path: &str) -> Result<Vec<usize>, MeshReadError> {
        Ok(self.dataset(path)?.shape.clone())
    }

    fn read_attribute_f64(&self, owner: &str, name: &str) -> Result<f64, MeshReadError> {
        let owner = normalize_path(owner);
        self.attributes
            .get(&(owner.to_string(), name.to_string()))
            .copied()
            .ok_or_else(|| MeshReadError::MissingAttribute {
                owner: owner.to_string(),
                name: name.to_string(),
            })
    }

    fn read_f32(
        &self,
        path: &str,
        slab: &Hyperslab,
        dst: &mut [f32],
    ) -> Result<(), MeshReadError> {
        let ds = self.checked_dataset(path, slab, dst.len())?;
        match &ds.values {
            DatasetValues::F32(src) => copy_slab(src, &ds.shape, slab, dst),
            DatasetValues::F64(src) => copy_slab(src, &ds.shape, slab, dst),
            _ => {
                return Err(MeshReadError::ElementType {
                    path: path.to_string(),
                    expected: "floating point",
                });
            }
        }
        Ok(())
    }

    fn read_indices(
        &self,
        path: &str,
        slab: &Hyperslab,
        dst: &mut [i64],
    ) -> Result<(), MeshReadError> {
        let ds = self.checked_dataset(path, slab, dst.len())?;
        match &ds.values {
            DatasetValues::I32(src) => copy_slab(src, &ds.shape, slab, dst),
            DatasetValues::I64(src) => copy_slab(src, &ds.shape, slab, dst),
            DatasetValues::I16(_) => {
                return Err(MeshReadError::UnsupportedIndexWidth {
                    path: path.to_string(),
                    bytes: ds.values.element_size(),
                });
            }
            DatasetValues::F32(_) | DatasetValues::F64(_) => {
                return Err(MeshReadError::ElementType {
                    path: path.to_string(),
                    expected: "integer",
                });
            }
        }
        Ok(())
    }
}

/// Copy a row-major selection of `src` into `dst`, one contiguous run of the
/// innermost dimension at a time.
fn copy_slab<T: AsPrimitive<U>, U: Copy + 'static>(
    src: &[T],
    shape: &[usize],
    slab: &Hyperslab,
    dst: &mut [U],
) {
    if slab.is_empty() {
        return;
    }
    let rank = shape.len();
    let mut strides = vec![1usize; rank];
    for d in (0..rank.saturating_sub(1)).rev() {
        strides[d] = strides[d + 1] * shape[d + 1];
    }
    let run = slab.count()[rank - 1];
    let outer = &slab.count()[..rank - 1];
    let mut index = vec![0usize; rank - 1];
    for chunk in dst[..slab.len()].chunks_exact_mut(run) {
        let base: usize = index
            .iter()
            .zip(slab.offset())
            .zip(&strides)
            .map(|((&i, &off), &stride)| (i + off) * stride)
            .sum::<usize>()
            + slab.offset()[rank - 1];
        for (out, &v) in chunk.iter_mut().zip(&src[base..base + run]) {
            *out = v.as_();
        }
        for d in (0..outer.len()).rev() {
            index[d] += 1;
            if index[d] < outer[d] {
                break;
            }
            index[d] = 0;
        }
    }
}

/// Named in-memory files, opened as shared handles.
#[derive(Clone, Debug, Default)]
pub struct MemoryFiles {
    files: BTreeMap<PathBuf, Arc<MemoryContainer>>,
}

impl MemoryFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, container: MemoryContainer) {
        self.files.insert(path.into(), Arc::new(container));
    }
}

impl ContainerOpener for MemoryFiles {
    type Handle = Arc<MemoryContainer>;

    fn open(&self, path: &Path) -> Result<Self::Handle, MeshReadError> {
        self.files.get(path).cloned().ok_or_else(|| {
            MeshReadError::Io(format!("unable to open file {}", path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube() -> MemoryContainer {
        let mut c = MemoryContainer::new();
        c.insert_f32("volume/data", vec![2, 3, 4], (0..24).map(|v| v as f32).collect())
            .unwrap();
        c
    }

    #[test]
    fn datasets_create_parent_groups() {
        let c = cube();
        assert!(c.exists("volume"));
        assert!(c.exists("/volume/data"));
        assert!(!c.exists("coordinates_ELASTIC"));
        assert_eq!(c.shape("volume/data").unwrap(), vec![2, 3, 4]);
    }

    #[test]
    fn reads_strided_hyperslab() {
        let c = cube();
        let slab = Hyperslab::new(vec![1, 0, 1], vec![1, 3, 2]);
        let mut out = vec![0.0f32; 6];
        c.read_f32("volume/data", &slab, &mut out).unwrap();
        assert_eq!(out, vec![13.0, 14.0, 17.0, 18.0, 21.0, 22.0]);
    }

    #[test]
    fn rejects_wrong_destination_and_bounds() {
        let c = cube();
        let slab = Hyperslab::new(vec![0, 0, 0], vec![1, 1, 4]);
        let mut short = vec![0.0f32; 3];
        assert!(matches!(
            c.read_f32("volume/data", &slab, &mut short),
            Err(MeshReadError::LengthMismatch { .. })
        ));
        let outside = Hyperslab::new(vec![2, 0, 0], vec![1, 1, 4]);
        let mut out = vec![0.0f32; 4];
        assert!(matches!(
            c.read_f32("volume/data", &outside, &mut out),
            Err(MeshReadError::SlabOutOfBounds { .. })
        ));
    }

    #[test]
    fn index_width_is_checked() {
        let mut c = MemoryContainer::new();
        c.insert("conn", vec![1, 2], DatasetValues::I16(vec![0, 1])).unwrap();
        c.insert_i32("conn32", vec![1, 2], vec![3, 4]).unwrap();
        let slab = Hyperslab::whole(&[1, 2]);
        let mut out = vec![0i64; 2];
        assert_eq!(
            c.read_indices("conn", &slab, &mut out),
            Err(MeshReadError::UnsupportedIndexWidth { path: "conn".into(), bytes: 2 })
        );
        c.read_indices("conn32", &slab, &mut out).unwrap();
        assert_eq!(out, vec![3, 4]);
        assert!(matches!(
            c.read_f32("conn32", &slab, &mut [0.0; 2]),
            Err(MeshReadError::ElementType { .. })
        ));
    }

    #[test]
    fn attributes_and_removal() {
        let mut c = cube();
        c.set_attribute("volume", "sampling_rate_in_hertz", 10.0);
        assert_eq!(c.read_attribute_f64("/volume", "sampling_rate_in_hertz"), Ok(10.0));
        assert!(c.read_attribute_f64("volume", "missing").is_err());
        c.remove("volume");
        assert!(!c.exists("volume"));
        assert!(!c.exists("volume/data"));
    }

    #[test]
    fn opener_serves_named_files() {
        let mut files = MemoryFiles::new();
        files.insert("a.h5", cube());
        assert!(files.can_read_file(Path::new("a.h5")));
        assert!(!files.can_read_file(Path::new("b.h5")));
    }
}
