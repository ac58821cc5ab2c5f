//! Legacy VTK (`.vtk`) reader/writer for extracted pieces.
//!
//! This implementation targets ASCII legacy VTK files with an
//! `UNSTRUCTURED_GRID` dataset. Point arrays are written as `POINT_DATA`
//! `FIELD` arrays, together with the global node id of every local node.

use crate::algs::assemble::MeshResult;
use crate::algs::partition::PartitionPlan;
use crate::data::local_mesh::{CELL_ARRAY_STRIDE, PointField};
use crate::mesh_error::MeshReadError;
use crate::topology::cell_type::CellType;
use std::collections::HashMap;
use std::io::{Read, Write};

/// Point array carrying the global id of each local node.
pub const FIELD_GLOBAL_NODE_IDS: &str = "GlobalNodeIds";

#[derive(Debug, Default, Clone)]
pub struct VtkReader;

#[derive(Debug, Default, Clone)]
pub struct VtkWriter;

impl VtkWriter {
    fn write_field_array<W: Write>(
        writer: &mut W,
        name: &str,
        num_tuples: usize,
        data_type: &str,
        values: impl Iterator<Item = String>,
    ) -> Result<(), MeshReadError> {
        writeln!(writer, "{name} 1 {num_tuples} {data_type}")?;
        let mut line_len = 0usize;
        for value in values {
            if line_len + value.len() + 1 > 70 {
                writeln!(writer)?;
                line_len = 0;
            }
            if line_len > 0 {
                write!(writer, " ")?;
                line_len += 1;
            }
            write!(writer, "{value}")?;
            line_len += value.len();
        }
        writeln!(writer)?;
        Ok(())
    }

    /// Write `mesh` as an ASCII unstructured grid.
    pub fn write<W: Write>(&self, mut writer: W, mesh: &MeshResult) -> Result<(), MeshReadError> {
        let num_points = mesh.point_count();
        let num_cells = mesh.cell_count();
        if mesh.cells.len() != num_cells * CELL_ARRAY_STRIDE || mesh.points.len() % 3 != 0 {
            return Err(MeshReadError::MeshIoParse(
                "cell array or point array is malformed".into(),
            ));
        }

        writeln!(writer, "# vtk DataFile Version 3.0")?;
        writeln!(writer, "salvus-mesh piece {}/{}", mesh.plan.piece_index, mesh.plan.piece_count)?;
        writeln!(writer, "ASCII")?;
        writeln!(writer, "DATASET UNSTRUCTURED_GRID")?;
        writeln!(writer, "POINTS {num_points} float")?;
        for p in mesh.points.chunks_exact(3) {
            writeln!(writer, "{} {} {}", p[0], p[1], p[2])?;
        }

        writeln!(writer, "CELLS {num_cells} {}", mesh.cells.len())?;
        let mut rest = mesh.cells.as_slice();
        for _ in 0..num_cells {
            let (&size, tail) = rest.split_first().ok_or_else(|| {
                MeshReadError::MeshIoParse("cell array shorter than cell count".into())
            })?;
            let size = usize::try_from(size)
                .map_err(|_| MeshReadError::MeshIoParse(format!("negative cell size {size}")))?;
            if tail.len() < size {
                return Err(MeshReadError::MeshIoParse("truncated cell".into()));
            }
            let (ids, tail) = tail.split_at(size);
            write!(writer, "{size}")?;
            for id in ids {
                write!(writer, " {id}")?;
            }
            writeln!(writer)?;
            rest = tail;
        }

        writeln!(writer, "CELL_TYPES {num_cells}")?;
        for cell_type in &mesh.cell_types {
            writeln!(writer, "{}", cell_type.vtk_code())?;
        }

        writeln!(writer, "POINT_DATA {num_points}")?;
        writeln!(writer, "FIELD FieldData {}", mesh.point_data.len() + 1)?;
        Self::write_field_array(
            &mut writer,
            FIELD_GLOBAL_NODE_IDS,
            num_points,
            "long",
            mesh.global_node_ids().map(|id| id.to_string()),
        )?;
        for field in &mesh.point_data {
            if field.values.len() != num_points {
                return Err(MeshReadError::LengthMismatch {
                    name: field.name.clone(),
                    expected: num_points,
                    found: field.values.len(),
                });
            }
            Self::write_field_array(
                &mut writer,
                &field.name,
                num_points,
                "float",
                field.values.iter().map(|v| v.to_string()),
            )?;
        }
        Ok(())
    }
}

#[derive(Debug)]
struct FieldArray {
    values: Vec<String>,
}

impl FieldArray {
    fn values_as_i64(&self) -> Result<Vec<i64>, MeshReadError> {
        self.values
            .iter()
            .map(|v| {
                v.parse::<i64>()
                    .map_err(|_| MeshReadError::MeshIoParse(format!("invalid int value {v}")))
            })
            .collect()
    }

    fn values_as_f32(&self) -> Result<Vec<f32>, MeshReadError> {
        self.values
            .iter()
            .map(|v| {
                v.parse::<f32>()
                    .map_err(|_| MeshReadError::MeshIoParse(format!("invalid float value {v}")))
            })
            .collect()
    }
}

fn next_token(
    tokens: &mut impl Iterator<Item = String>,
    what: &str,
) -> Result<String, MeshReadError> {
    tokens
        .next()
        .ok_or_else(|| MeshReadError::MeshIoParse(format!("missing {what}")))
}

fn next_parsed<T: std::str::FromStr>(
    tokens: &mut impl Iterator<Item = String>,
    what: &str,
) -> Result<T, MeshReadError> {
    next_token(tokens, what)?
        .parse()
        .map_err(|_| MeshReadError::MeshIoParse(format!("invalid {what}")))
}

fn expect_keyword(
    tokens: &mut impl Iterator<Item = String>,
    keyword: &str,
) -> Result<(), MeshReadError> {
    let token = next_token(tokens, keyword)?;
    if token != keyword {
        return Err(MeshReadError::MeshIoParse(format!(
            "expected {keyword} section, found {token}"
        )));
    }
    Ok(())
}

impl VtkReader {
    /// Parse `POINT_DATA n FIELD name k` blocks, keeping array order.
    fn parse_point_fields(
        tokens: &mut impl Iterator<Item = String>,
    ) -> Result<Vec<(String, FieldArray)>, MeshReadError> {
        let mut fields = Vec::new();
        while let Some(token) = tokens.next() {
            match token.as_str() {
                "POINT_DATA" => {
                    let _count = next_token(tokens, "point data count")?;
                }
                "FIELD" => {
                    let _field_name = next_token(tokens, "field name")?;
                    let num_arrays: usize = next_parsed(tokens, "field count")?;
                    for _ in 0..num_arrays {
                        let name = next_token(tokens, "field name")?;
                        let components: usize = next_parsed(tokens, "field components")?;
                        let tuples: usize = next_parsed(tokens, "field tuples")?;
                        let _data_type = next_token(tokens, "field type")?;
                        let total = components * tuples;
                        let mut values = Vec::with_capacity(total);
                        for _ in 0..total {
                            values.push(next_token(tokens, "field data values")?);
                        }
                        fields.push((name, FieldArray { values }));
                    }
                }
                _ => {
                    return Err(MeshReadError::MeshIoParse(format!(
                        "unexpected token {token}"
                    )));
                }
            }
        }
        Ok(fields)
    }

    /// Read a piece written by [`VtkWriter`].
    ///
    /// The partition plan and time stamp are not stored in the `.vtk` file;
    /// the result carries a single-piece plan, step 0 and no time value.
    pub fn read<R: Read>(&self, mut reader: R) -> Result<MeshResult, MeshReadError> {
        let mut input = String::new();
        reader.read_to_string(&mut input)?;
        let mut lines = input.lines();
        let _version = lines.next();
        let _comment = lines.next();
        let format = lines
            .next()
            .ok_or_else(|| MeshReadError::MeshIoParse("missing ASCII line".into()))?;
        if format.trim() != "ASCII" {
            return Err(MeshReadError::MeshIoParse("VTK ASCII format required".into()));
        }
        let dataset = lines
            .next()
            .ok_or_else(|| MeshReadError::MeshIoParse("missing DATASET line".into()))?;
        if !dataset.trim().ends_with("UNSTRUCTURED_GRID") {
            return Err(MeshReadError::MeshIoParse(
                "VTK UNSTRUCTURED_GRID required".into(),
            ));
        }

        let mut tokens = lines
            .flat_map(str::split_whitespace)
            .map(str::to_string)
            .collect::<Vec<_>>()
            .into_iter();

        expect_keyword(&mut tokens, "POINTS")?;
        let num_points: usize = next_parsed(&mut tokens, "point count")?;
        let _point_type = next_token(&mut tokens, "point type")?;
        let mut points = Vec::with_capacity(num_points * 3);
        for _ in 0..num_points * 3 {
            points.push(next_parsed::<f32>(&mut tokens, "point value")?);
        }

        expect_keyword(&mut tokens, "CELLS")?;
        let num_cells: usize = next_parsed(&mut tokens, "cell count")?;
        let total_size: usize = next_parsed(&mut tokens, "cell array size")?;
        let mut cells = Vec::with_capacity(total_size);
        for _ in 0..num_cells {
            let count: i64 = next_parsed(&mut tokens, "cell size")?;
            cells.push(count);
            for _ in 0..count {
                cells.push(next_parsed::<i64>(&mut tokens, "cell index")?);
            }
        }
        if cells.len() != total_size {
            return Err(MeshReadError::LengthMismatch {
                name: "CELLS".into(),
                expected: total_size,
                found: cells.len(),
            });
        }

        expect_keyword(&mut tokens, "CELL_TYPES")?;
        let cell_types_count: usize = next_parsed(&mut tokens, "cell types count")?;
        let mut cell_types = Vec::with_capacity(cell_types_count);
        for _ in 0..cell_types_count {
            let code: i32 = next_parsed(&mut tokens, "cell type")?;
            let cell_type = CellType::from_vtk_code(code).ok_or_else(|| {
                MeshReadError::MeshIoParse(format!("unsupported VTK cell type {code}"))
            })?;
            cell_types.push(cell_type);
        }

        let fields = if tokens.len() > 0 {
            Self::parse_point_fields(&mut tokens)?
        } else {
            Vec::new()
        };

        let fields_by_name: HashMap<&str, &FieldArray> =
            fields.iter().map(|(n, f)| (n.as_str(), f)).collect();
        let global_node_offset = match fields_by_name.get(FIELD_GLOBAL_NODE_IDS) {
            Some(ids) => ids.values_as_i64()?.first().copied().unwrap_or(0),
            None => 0,
        };
        let mut point_data = Vec::new();
        for (name, field) in &fields {
            if name == FIELD_GLOBAL_NODE_IDS {
                continue;
            }
            let values = field.values_as_f32()?;
            if values.len() != num_points {
                return Err(MeshReadError::LengthMismatch {
                    name: name.clone(),
                    expected: num_points,
                    found: values.len(),
                });
            }
            point_data.push(PointField {
                name: name.clone(),
                values,
            });
        }

        Ok(MeshResult {
            plan: PartitionPlan::single(num_cells),
            cells,
            cell_types,
            points,
            point_data,
            global_node_offset,
            time_step: 0,
            time_value: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn piece() -> MeshResult {
        let mut cells = vec![8];
        cells.extend(0..8);
        MeshResult {
            plan: PartitionPlan::single(1),
            cells,
            cell_types: vec![CellType::Hexahedron],
            points: (0..24).map(|v| v as f32 * 0.5).collect(),
            point_data: vec![PointField {
                name: "phi_tt".into(),
                values: (0..8).map(|v| v as f32 - 3.25).collect(),
            }],
            global_node_offset: 40,
            time_step: 0,
            time_value: None,
        }
    }

    #[test]
    fn writes_hexahedra_and_point_data() {
        let mut out = Vec::new();
        VtkWriter.write(&mut out, &piece()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("CELLS 1 9\n8 0 1 2 3 4 5 6 7\n"));
        assert!(text.contains("CELL_TYPES 1\n12\n"));
        assert!(text.contains("FIELD FieldData 2"));
        assert!(text.contains("GlobalNodeIds 1 8 long\n40 41 42"));
    }

    #[test]
    fn read_back_matches_written_piece() {
        let mesh = piece();
        let mut out = Vec::new();
        VtkWriter.write(&mut out, &mesh).unwrap();
        let back = VtkReader.read(out.as_slice()).unwrap();
        assert_eq!(back, mesh);
    }

    #[test]
    fn cell_array_must_match_cell_count() {
        let mut mesh = piece();
        mesh.cells.remove(0);
        assert!(matches!(
            VtkWriter.write(Vec::new(), &mesh),
            Err(MeshReadError::MeshIoParse(_))
        ));
        mesh.cells = vec![8, 0, 1, 2, 3, 4, 5, 6, 7, 8, 0, 1, 2, 3, 4, 5, 6, 7];
        assert!(VtkWriter.write(Vec::new(), &mesh).is_err());
    }

    #[test]
    fn rejects_unknown_cell_type() {
        let text = "# vtk DataFile Version 3.0\nx\nASCII\nDATASET UNSTRUCTURED_GRID\n\
                    POINTS 0 float\nCELLS 0 0\nCELL_TYPES 1\n10\n";
        assert!(matches!(
            VtkReader.read(text.as_bytes()),
            Err(MeshReadError::MeshIoParse(_))
        ));
    }
}
