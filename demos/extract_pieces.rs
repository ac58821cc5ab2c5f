// cargo run --example extract_pieces [-- <pieces> [config.json]]
use salvus_mesh::config::ReaderConfig;
use salvus_mesh::data::model::ModelKind;
use salvus_mesh::io::memory::MemoryFiles;
use salvus_mesh::io::partitioned::write_piece_with_metadata;
use salvus_mesh::io::synthetic::SyntheticVolume;
use salvus_mesh::reader::{PieceRequest, SalvusReader};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let pieces: usize = match args.next() {
        Some(arg) => arg.parse()?,
        None => 4,
    };
    let config = match args.next() {
        Some(path) => ReaderConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => ReaderConfig {
            model_kind: ModelKind::Acoustic,
            ..Default::default()
        },
    };

    let volume = SyntheticVolume::new(config.model_kind, 6, 4).with_time_steps(5);
    let mut files = MemoryFiles::new();
    files.insert("synthetic.h5", volume.build()?);

    let mut reader = SalvusReader::new(files, config);
    reader.set_file_name("synthetic.h5");
    let meta = reader.request_information()?;
    println!(
        "{} cells, {} nodes, {} steps over {:?}",
        meta.global_cell_count,
        meta.global_node_count,
        meta.time_step_count,
        meta.time_range()
    );
    let last_time = meta.time_step_values.last().copied();

    let out = std::env::temp_dir().join("salvus-mesh-demo");
    for k in 0..pieces {
        let mut request = PieceRequest::new(k, pieces);
        if let Some(t) = last_time {
            request = request.at_time(t);
        }
        let mut report = |f: f64| println!("  piece {k}: {:.0}%", f * 100.0);
        let piece = reader.request_data(&request, &mut report)?;
        let meta = write_piece_with_metadata(&out, "synthetic", &piece)?;
        println!(
            "piece {k}: cells {}..{}, nodes from {} ({}), step {}",
            meta.cell_offset,
            meta.cell_offset + meta.cell_count,
            meta.min_global_node_id,
            meta.node_count,
            meta.time_step
        );
    }
    println!("wrote {pieces} pieces to {}", out.display());
    Ok(())
}
