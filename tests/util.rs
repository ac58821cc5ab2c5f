#![allow(dead_code)]
use salvus_mesh::algs::assemble::MeshResult;
use salvus_mesh::algs::probe::probe;
use salvus_mesh::config::ReaderConfig;
use salvus_mesh::data::metadata::{DEFAULT_TIME_TOLERANCE, MeshMetadata};
use salvus_mesh::data::selection::FieldSelection;
use salvus_mesh::io::memory::MemoryContainer;
use salvus_mesh::io::{DatasetAccessor, Hyperslab};
use salvus_mesh::io::synthetic::SyntheticVolume;
use salvus_mesh::mesh_error::MeshReadError;
use salvus_mesh::reader::{NoProgress, PieceRequest, extract_piece};
use std::cell::RefCell;
use std::collections::BTreeMap;

/// Accessor wrapper recording how many bulk reads hit each dataset.
pub struct CountingAccessor<A> {
    pub inner: A,
    reads: RefCell<BTreeMap<String, usize>>,
}

impl<A> CountingAccessor<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            reads: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn reads(&self, path: &str) -> usize {
        self.reads.borrow().get(path).copied().unwrap_or(0)
    }

    pub fn reset(&self) {
        self.reads.borrow_mut().clear();
    }

    fn record(&self, path: &str) {
        *self.reads.borrow_mut().entry(path.to_string()).or_insert(0) += 1;
    }
}

impl<A: DatasetAccessor> DatasetAccessor for CountingAccessor<A> {
    fn exists(&self, path: &str) -> bool {
        self.inner.exists(path)
    }

    fn shape(&self, path: &str) -> Result<Vec<usize>, MeshReadError> {
        self.inner.shape(path)
    }

    fn read_attribute_f64(&self, owner: &str, name: &str) -> Result<f64, MeshReadError> {
        self.inner.read_attribute_f64(owner, name)
    }

    fn read_f32(&self, path: &str, slab: &Hyperslab, dst: &mut [f32]) -> Result<(), MeshReadError> {
        self.record(path);
        self.inner.read_f32(path, slab, dst)
    }

    fn read_indices(
        &self,
        path: &str,
        slab: &Hyperslab,
        dst: &mut [i64],
    ) -> Result<(), MeshReadError> {
        self.record(path);
        self.inner.read_indices(path, slab, dst)
    }
}

pub fn metadata_for(volume: &SyntheticVolume, container: &MemoryContainer) -> MeshMetadata {
    probe(container, volume.kind, DEFAULT_TIME_TOLERANCE).unwrap()
}

/// Extract every piece of a `piece_count` split at step 0.
pub fn extract_all(
    volume: &SyntheticVolume,
    piece_count: usize,
    config: &ReaderConfig,
) -> Vec<MeshResult> {
    let container = volume.build().unwrap();
    let metadata = metadata_for(volume, &container);
    let selection = FieldSelection::for_kind(volume.kind);
    (0..piece_count)
        .map(|k| {
            extract_piece(
                &container,
                &metadata,
                &selection,
                &PieceRequest::new(k, piece_count),
                config,
                &mut NoProgress,
            )
            .unwrap()
        })
        .collect()
}
