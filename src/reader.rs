//! Reader session: information and data passes over one volume file.
//!
//! The session owns the file name, configuration, field selections and the
//! cached [`MeshMetadata`]. Each pass opens its own container handle through
//! a [`ContainerOpener`] and drops it before returning, on success or error.

use crate::algs::assemble::{MeshResult, assemble};
use crate::algs::connectivity::load_connectivity;
use crate::algs::node_data::{NodeLayout, load_coordinates, load_fields};
use crate::algs::partition::plan;
use crate::algs::probe::probe;
use crate::config::ReaderConfig;
use crate::data::local_mesh::LocalMesh;
use crate::data::metadata::MeshMetadata;
use crate::data::model::ModelKind;
use crate::data::selection::FieldSelection;
use crate::io::{ContainerOpener, DatasetAccessor};
use crate::mesh_error::MeshReadError;
use std::path::{Path, PathBuf};

/// Progress checkpoint after the cell array is built.
pub const PROGRESS_CELLS: f64 = 0.5;
/// Progress checkpoint after coordinates are loaded.
pub const PROGRESS_POINTS: f64 = 0.7;

/// What the host pipeline asks for in a data pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PieceRequest {
    pub piece_index: usize,
    pub piece_count: usize,
    /// Requested time; `None` reads step 0.
    pub time: Option<f64>,
}

impl PieceRequest {
    pub fn new(piece_index: usize, piece_count: usize) -> Self {
        Self {
            piece_index,
            piece_count,
            time: None,
        }
    }

    pub fn at_time(mut self, time: f64) -> Self {
        self.time = Some(time);
        self
    }
}

impl Default for PieceRequest {
    fn default() -> Self {
        Self::new(0, 1)
    }
}

/// Receives monotonically increasing progress fractions in `[0, 1]`.
pub trait ProgressObserver {
    fn progress(&mut self, fraction: f64);
}

impl<F: FnMut(f64)> ProgressObserver for F {
    fn progress(&mut self, fraction: f64) {
        self(fraction)
    }
}

/// Observer that ignores progress.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn progress(&mut self, _fraction: f64) {}
}

/// Extract one piece from an already opened container.
///
/// Runs plan → connectivity → coordinates → fields → assembly. Any failure
/// aborts the whole request; nothing partial is returned.
pub fn extract_piece<A: DatasetAccessor + ?Sized>(
    accessor: &A,
    metadata: &MeshMetadata,
    selection: &FieldSelection,
    request: &PieceRequest,
    config: &ReaderConfig,
    progress: &mut dyn ProgressObserver,
) -> Result<MeshResult, MeshReadError> {
    let kind = metadata.model_kind;
    if selection.kind() != kind {
        return Err(MeshReadError::ModelKindMismatch {
            selection: selection.kind(),
            metadata: kind,
        });
    }
    let time_step = metadata.resolve_time_step(request.time);
    log::info!(
        "piece {} of {}: requested time {:?} -> step {time_step}",
        request.piece_index,
        request.piece_count,
        request.time
    );

    let plan = plan(
        metadata.global_cell_count,
        request.piece_count,
        request.piece_index,
    )?;
    let connectivity = load_connectivity(accessor, kind, &plan, metadata.global_node_count)?;
    progress.progress(PROGRESS_CELLS);

    let nodes = connectivity.nodes;
    let coordinates =
        load_coordinates(accessor, kind, &nodes, plan.piece_count, config.read_strategy)?;
    progress.progress(PROGRESS_POINTS);

    let layout = NodeLayout {
        blocks: metadata.global_node_count / metadata.nodes_per_block.max(1),
        nodes_per_block: metadata.nodes_per_block,
    };
    let fields = if nodes.node_count == 0 {
        Vec::new()
    } else {
        load_fields(
            accessor,
            selection,
            time_step,
            &nodes,
            &layout,
            plan.piece_count,
            config.read_strategy,
        )?
    };

    let local = LocalMesh {
        plan,
        nodes,
        cells: connectivity.cells,
        coordinates,
        fields,
        time_step,
    };
    let result = assemble(local, request.time)?;
    progress.progress(1.0);
    Ok(result)
}

/// A reader bound to (at most) one file at a time.
#[derive(Debug)]
pub struct SalvusReader<O: ContainerOpener> {
    opener: O,
    file_name: Option<PathBuf>,
    config: ReaderConfig,
    elastic: FieldSelection,
    acoustic: FieldSelection,
    metadata: Option<MeshMetadata>,
}

impl<O: ContainerOpener> SalvusReader<O> {
    pub fn new(opener: O, config: ReaderConfig) -> Self {
        Self {
            opener,
            file_name: None,
            config,
            elastic: FieldSelection::for_kind(ModelKind::Elastic),
            acoustic: FieldSelection::for_kind(ModelKind::Acoustic),
            metadata: None,
        }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn file_name(&self) -> Option<&Path> {
        self.file_name.as_deref()
    }

    /// Associate a file; a different name drops cached metadata.
    pub fn set_file_name(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if self.file_name.as_ref() != Some(&path) {
            self.file_name = Some(path);
            self.metadata = None;
        }
    }

    /// Switch model kind; cached metadata is dropped since sizes differ.
    pub fn set_model_kind(&mut self, kind: ModelKind) {
        if self.config.model_kind != kind {
            self.config.model_kind = kind;
            self.metadata = None;
        }
    }

    pub fn model_kind(&self) -> ModelKind {
        self.config.model_kind
    }

    pub fn selection(&self, kind: ModelKind) -> &FieldSelection {
        match kind {
            ModelKind::Elastic => &self.elastic,
            ModelKind::Acoustic => &self.acoustic,
        }
    }

    pub fn selection_mut(&mut self, kind: ModelKind) -> &mut FieldSelection {
        match kind {
            ModelKind::Elastic => &mut self.elastic,
            ModelKind::Acoustic => &mut self.acoustic,
        }
    }

    /// Whether `path` opens and has a top-level `volume` entry.
    pub fn can_read_file(&self, path: &Path) -> bool {
        self.opener.can_read_file(path)
    }

    /// Cached metadata from the last successful information pass.
    pub fn metadata(&self) -> Option<&MeshMetadata> {
        self.metadata.as_ref()
    }

    /// Zero until an information pass succeeds.
    pub fn number_of_time_steps(&self) -> usize {
        self.metadata.as_ref().map_or(0, |m| m.time_step_count)
    }

    /// Information pass: probe sizes and the time axis and cache them.
    ///
    /// On failure nothing is cached and the time-step count stays zero.
    pub fn request_information(&mut self) -> Result<&MeshMetadata, MeshReadError> {
        self.metadata = None;
        let path = self.file_name.as_deref().ok_or(MeshReadError::NoFileName)?;
        let file = self.opener.open(path)?;
        let metadata = probe(&file, self.config.model_kind, self.config.time_tolerance)?;
        drop(file);
        Ok(&*self.metadata.insert(metadata))
    }

    /// Data pass for one piece. Runs the information pass first when no
    /// metadata is cached.
    pub fn request_data(
        &mut self,
        request: &PieceRequest,
        progress: &mut dyn ProgressObserver,
    ) -> Result<MeshResult, MeshReadError> {
        if self.metadata.is_none() {
            self.request_information()?;
        }
        let metadata = self
            .metadata
            .as_ref()
            .ok_or_else(|| MeshReadError::MissingEntry("mesh metadata".into()))?;
        let path = self.file_name.as_deref().ok_or(MeshReadError::NoFileName)?;
        let file = self.opener.open(path)?;
        let selection = match self.config.model_kind {
            ModelKind::Elastic => &self.elastic,
            ModelKind::Acoustic => &self.acoustic,
        };
        extract_piece(&file, metadata, selection, request, &self.config, progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::memory::{MemoryContainer, MemoryFiles};
    use crate::data::model::{SAMPLING_RATE_ATTR, START_TIME_ATTR};

    fn files() -> MemoryFiles {
        let mut c = MemoryContainer::new();
        let conn: Vec<i32> = (0..2).flat_map(|cell| (0..8).map(move |n| cell * 4 + n)).collect();
        c.insert_i32("connectivity_ACOUSTIC", vec![2, 8], conn).unwrap();
        c.insert_f32("coordinates_ACOUSTIC", vec![3, 4, 3], vec![1.0; 36]).unwrap();
        c.insert_f32("volume/phi_tt", vec![2, 3, 1, 6], vec![0.5; 36]).unwrap();
        c.set_attribute("volume", SAMPLING_RATE_ATTR, 10.0);
        c.set_attribute("volume", START_TIME_ATTR, 0.0);
        let mut files = MemoryFiles::new();
        files.insert("mesh.h5", c);
        files
    }

    fn reader() -> SalvusReader<MemoryFiles> {
        let config = ReaderConfig {
            model_kind: ModelKind::Acoustic,
            ..Default::default()
        };
        SalvusReader::new(files(), config)
    }

    #[test]
    fn information_requires_a_file() {
        let mut r = reader();
        assert_eq!(r.request_information().unwrap_err(), MeshReadError::NoFileName);
        r.set_file_name("missing.h5");
        assert!(matches!(r.request_information(), Err(MeshReadError::Io(_))));
        assert_eq!(r.number_of_time_steps(), 0);
    }

    #[test]
    fn file_change_invalidates_metadata() {
        let mut r = reader();
        r.set_file_name("mesh.h5");
        r.request_information().unwrap();
        assert_eq!(r.number_of_time_steps(), 2);
        r.set_file_name("mesh.h5");
        assert!(r.metadata().is_some());
        r.set_file_name("other.h5");
        assert!(r.metadata().is_none());
    }

    #[test]
    fn data_pass_reports_progress_in_order() {
        let mut r = reader();
        r.set_file_name("mesh.h5");
        let mut seen = Vec::new();
        let mut observer = |f: f64| seen.push(f);
        let mesh = r
            .request_data(&PieceRequest::new(1, 2).at_time(0.1), &mut observer)
            .unwrap();
        assert_eq!(seen, vec![PROGRESS_CELLS, PROGRESS_POINTS, 1.0]);
        assert_eq!(mesh.time_step, 1);
        assert_eq!(mesh.cell_count(), 1);
        assert_eq!(mesh.global_node_offset, 4);
        assert_eq!(mesh.point_count(), 8);
    }

    #[test]
    fn selection_of_other_kind_is_rejected() {
        let handle = files().open(Path::new("mesh.h5")).unwrap();
        let metadata = probe(&*handle, ModelKind::Acoustic, 1e-6).unwrap();
        let err = extract_piece(
            &*handle,
            &metadata,
            &FieldSelection::for_kind(ModelKind::Elastic),
            &PieceRequest::default(),
            &ReaderConfig::default(),
            &mut NoProgress,
        )
        .unwrap_err();
        assert_eq!(
            err,
            MeshReadError::ModelKindMismatch {
                selection: ModelKind::Elastic,
                metadata: ModelKind::Acoustic,
            }
        );
    }

    #[test]
    fn switching_kind_drops_metadata() {
        let mut r = reader();
        r.set_file_name("mesh.h5");
        r.request_information().unwrap();
        r.set_model_kind(ModelKind::Elastic);
        assert!(r.metadata().is_none());
        assert_eq!(
            r.request_data(&PieceRequest::default(), &mut NoProgress).unwrap_err(),
            MeshReadError::MissingEntry("connectivity_ELASTIC".into())
        );
    }
}
