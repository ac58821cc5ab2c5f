mod util;

use salvus_mesh::config::{ReadStrategy, ReaderConfig};
use salvus_mesh::data::model::ModelKind;
use salvus_mesh::data::selection::FieldSelection;
use salvus_mesh::io::synthetic::SyntheticVolume;
use salvus_mesh::reader::{NoProgress, PieceRequest, extract_piece};
use util::{CountingAccessor, metadata_for};

const STRESS: &str = "volume/stress";

fn setup() -> (SyntheticVolume, CountingAccessor<salvus_mesh::io::memory::MemoryContainer>) {
    let volume = SyntheticVolume::new(ModelKind::Elastic, 2, 2).with_time_steps(2);
    let container = volume.build().unwrap();
    (volume, CountingAccessor::new(container))
}

#[test]
fn disabled_fields_cost_no_reads() {
    let (volume, accessor) = setup();
    let metadata = metadata_for(&volume, &accessor.inner);
    let mut selection = FieldSelection::for_kind(ModelKind::Elastic);
    selection.disable_all();

    let piece = extract_piece(
        &accessor,
        &metadata,
        &selection,
        &PieceRequest::new(0, 2),
        &ReaderConfig::default(),
        &mut NoProgress,
    )
    .unwrap();
    assert!(piece.point_data.is_empty());
    assert_eq!(accessor.reads(STRESS), 0);
    assert_eq!(accessor.reads("connectivity_ELASTIC"), 1);
    assert_eq!(accessor.reads("coordinates_ELASTIC"), 1);
}

#[test]
fn only_enabled_fields_are_read() {
    let (volume, accessor) = setup();
    let metadata = metadata_for(&volume, &accessor.inner);
    let mut selection = FieldSelection::for_kind(ModelKind::Elastic);
    selection.disable_all();
    assert!(selection.enable("stress_yz"));
    assert!(!selection.enable("phi_tt"));

    let piece = extract_piece(
        &accessor,
        &metadata,
        &selection,
        &PieceRequest::new(1, 2).at_time(0.1),
        &ReaderConfig {
            read_strategy: ReadStrategy::PartialHyperslab,
            ..Default::default()
        },
        &mut NoProgress,
    )
    .unwrap();
    assert_eq!(accessor.reads(STRESS), 1);
    assert_eq!(piece.point_data.len(), 1);
    let values = piece.point_array("stress_yz").unwrap();
    for (v, id) in values.iter().zip(piece.global_node_ids()) {
        assert_eq!(*v, SyntheticVolume::field_value(1, 3, id as usize));
    }
}

#[test]
fn re_enabled_fields_come_back_finite() {
    let (volume, accessor) = setup();
    let metadata = metadata_for(&volume, &accessor.inner);
    let mut selection = FieldSelection::for_kind(ModelKind::Elastic);
    selection.disable_all();
    let request = PieceRequest::new(0, 3);
    extract_piece(
        &accessor,
        &metadata,
        &selection,
        &request,
        &ReaderConfig::default(),
        &mut NoProgress,
    )
    .unwrap();
    assert_eq!(accessor.reads(STRESS), 0);

    selection.enable_all();
    accessor.reset();
    let piece = extract_piece(
        &accessor,
        &metadata,
        &selection,
        &request,
        &ReaderConfig::default(),
        &mut NoProgress,
    )
    .unwrap();
    assert_eq!(accessor.reads(STRESS), 6);
    let names: Vec<_> = piece.point_data.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ModelKind::Elastic.field_names());
    for field in &piece.point_data {
        assert_eq!(field.values.len(), piece.point_count());
        assert!(field.values.iter().all(|v| v.is_finite()));
    }
}
