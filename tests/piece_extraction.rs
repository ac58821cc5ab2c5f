mod util;

use salvus_mesh::config::{ReadStrategy, ReaderConfig};
use salvus_mesh::data::model::ModelKind;
use salvus_mesh::data::selection::FieldSelection;
use salvus_mesh::io::memory::{MemoryContainer, MemoryFiles};
use salvus_mesh::io::synthetic::SyntheticVolume;
use salvus_mesh::mesh_error::MeshReadError;
use salvus_mesh::reader::{NoProgress, PieceRequest, SalvusReader, extract_piece};
use salvus_mesh::topology::cell_type::CellType;
use util::{extract_all, metadata_for};

fn acoustic_config(strategy: ReadStrategy) -> ReaderConfig {
    ReaderConfig {
        model_kind: ModelKind::Acoustic,
        read_strategy: strategy,
        ..Default::default()
    }
}

#[test]
fn three_pieces_of_sixteen_cells() {
    let volume = SyntheticVolume::new(ModelKind::Acoustic, 2, 2);
    let global = volume.connectivity();
    let coords = volume.coordinates();
    let pieces = extract_all(&volume, 3, &acoustic_config(ReadStrategy::StageFullArray));

    let counts: Vec<_> = pieces.iter().map(|p| p.cell_count()).collect();
    assert_eq!(counts, vec![5, 5, 6]);

    for piece in &pieces {
        let rows = &global[piece.plan.cell_offset * 8..(piece.plan.cell_offset + piece.plan.cell_count) * 8];
        let min = *rows.iter().min().unwrap();
        let max = *rows.iter().max().unwrap();
        assert_eq!(piece.global_node_offset, min);
        assert_eq!(piece.point_count() as i64, max - min + 1);
        assert!(piece.cell_types.iter().all(|&t| t == CellType::Hexahedron));

        for (cell, row) in piece.cells.chunks_exact(9).zip(rows.chunks_exact(8)) {
            assert_eq!(cell[0], 8);
            let restored: Vec<i64> = cell[1..].iter().map(|&id| id + min).collect();
            assert_eq!(restored, row);
            assert!(cell[1..].iter().all(|&id| id >= 0 && id < piece.point_count() as i64));
        }

        for (local, global_id) in piece.global_node_ids().enumerate() {
            let g = global_id as usize;
            assert_eq!(&piece.points[local * 3..local * 3 + 3], &coords[g * 3..g * 3 + 3]);
        }

        let phi = piece.point_array("phi_tt").unwrap();
        assert_eq!(phi.len(), piece.point_count());
        for (value, global_id) in phi.iter().zip(piece.global_node_ids()) {
            assert_eq!(*value, SyntheticVolume::field_value(0, 0, global_id as usize));
        }
    }
}

#[test]
fn read_strategies_agree() {
    let volume = SyntheticVolume::new(ModelKind::Elastic, 3, 2);
    for pieces in [2, 4, 7] {
        let staged = extract_all(&volume, pieces, &ReaderConfig::default());
        let partial = extract_all(
            &volume,
            pieces,
            &ReaderConfig {
                read_strategy: ReadStrategy::PartialHyperslab,
                ..Default::default()
            },
        );
        assert_eq!(staged, partial);
    }
}

#[test]
fn single_piece_keeps_global_ids() {
    let volume = SyntheticVolume::new(ModelKind::Acoustic, 2, 2);
    let pieces = extract_all(&volume, 1, &acoustic_config(ReadStrategy::StageFullArray));
    let piece = &pieces[0];
    assert_eq!(piece.cell_count(), 16);
    assert_eq!(piece.point_count(), volume.node_count());
    assert_eq!(piece.global_node_offset, 0);
    let ids: Vec<i64> = piece
        .cells
        .chunks_exact(9)
        .flat_map(|c| c[1..].to_vec())
        .collect();
    assert_eq!(ids, volume.connectivity());
    assert_eq!(piece.points, volume.coordinates());
}

#[test]
fn more_pieces_than_cells_leaves_leading_pieces_empty() {
    let volume = SyntheticVolume::new(ModelKind::Acoustic, 2, 1);
    let pieces = extract_all(&volume, 5, &acoustic_config(ReadStrategy::StageFullArray));
    for piece in &pieces[..4] {
        assert_eq!(piece.cell_count(), 0);
        assert_eq!(piece.point_count(), 0);
        assert!(piece.point_data.is_empty());
    }
    assert_eq!(pieces[4].cell_count(), 2);
    assert_eq!(pieces[4].point_count(), 16);
}

#[test]
fn wide_and_narrow_indices_agree() {
    let narrow = SyntheticVolume::new(ModelKind::Acoustic, 2, 2);
    let wide = narrow.clone().with_wide_indices();
    let config = acoustic_config(ReadStrategy::StageFullArray);
    assert_eq!(extract_all(&narrow, 3, &config), extract_all(&wide, 3, &config));
}

#[test]
fn sixteen_bit_connectivity_is_rejected() {
    let volume = SyntheticVolume::new(ModelKind::Acoustic, 1, 1);
    let mut container = volume.build().unwrap();
    let metadata = metadata_for(&volume, &container);
    container
        .insert(
            "connectivity_ACOUSTIC",
            vec![1, 8],
            salvus_mesh::io::memory::DatasetValues::I16((0..8).collect()),
        )
        .unwrap();
    let err = extract_piece(
        &container,
        &metadata,
        &FieldSelection::for_kind(ModelKind::Acoustic),
        &PieceRequest::default(),
        &acoustic_config(ReadStrategy::StageFullArray),
        &mut NoProgress,
    )
    .unwrap_err();
    assert_eq!(
        err,
        MeshReadError::UnsupportedIndexWidth {
            path: "connectivity_ACOUSTIC".into(),
            bytes: 2
        }
    );
}

fn reader_over(container: MemoryContainer, kind: ModelKind) -> SalvusReader<MemoryFiles> {
    let mut files = MemoryFiles::new();
    files.insert("volume.h5", container);
    let mut reader = SalvusReader::new(
        files,
        ReaderConfig {
            model_kind: kind,
            ..Default::default()
        },
    );
    reader.set_file_name("volume.h5");
    reader
}

#[test]
fn missing_model_kind_datasets_fail_cleanly() {
    let container = SyntheticVolume::new(ModelKind::Acoustic, 1, 1).build().unwrap();
    let mut reader = reader_over(container, ModelKind::Elastic);
    assert!(reader.can_read_file(std::path::Path::new("volume.h5")));
    assert_eq!(
        reader.request_information().unwrap_err(),
        MeshReadError::MissingEntry("connectivity_ELASTIC".into())
    );
    assert_eq!(reader.number_of_time_steps(), 0);
    assert!(reader.metadata().is_none());
}

#[test]
fn requested_time_selects_matching_step() {
    let volume = SyntheticVolume::new(ModelKind::Acoustic, 2, 1).with_time_steps(3);
    let mut reader = reader_over(volume.build().unwrap(), ModelKind::Acoustic);
    let meta = reader.request_information().unwrap();
    assert_eq!(meta.time_step_count, 3);
    assert_eq!(meta.time_range(), Some((0.0, 0.2)));

    let piece = reader
        .request_data(&PieceRequest::new(1, 2).at_time(0.2), &mut NoProgress)
        .unwrap();
    assert_eq!(piece.time_step, 2);
    assert_eq!(piece.time_value, Some(0.2));
    let first = piece.global_node_offset as usize;
    assert_eq!(
        piece.point_array("phi_tt").unwrap()[0],
        SyntheticVolume::field_value(2, 0, first)
    );

    let fallback = reader
        .request_data(&PieceRequest::new(1, 2).at_time(0.15), &mut NoProgress)
        .unwrap();
    assert_eq!(fallback.time_step, 0);
    assert_eq!(
        fallback.point_array("phi_tt").unwrap()[0],
        SyntheticVolume::field_value(0, 0, first)
    );
}

#[test]
fn volume_without_fields_reports_zero_steps() {
    let volume = SyntheticVolume::new(ModelKind::Acoustic, 1, 1).with_time_steps(0);
    let mut reader = reader_over(volume.build().unwrap(), ModelKind::Acoustic);
    assert_eq!(reader.request_information().unwrap().time_step_count, 0);
    assert_eq!(reader.number_of_time_steps(), 0);
}
