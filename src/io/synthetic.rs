//! Synthetic volume files for tests, demos and benchmarks.
//!
//! A volume is a row of node blocks along `x`. Each block is a structured
//! `order`×`order`×`order` hex grid whose `(order + 1)^3` nodes form one
//! storage block, so every cell only references nodes of its own block.
//! Field blocks are padded to a multiple of [`FIELD_BLOCK_ALIGNMENT`] and the
//! padding is filled with NaN.

use crate::data::model::{ModelKind, SAMPLING_RATE_ATTR, START_TIME_ATTR, VOLUME_GROUP};
use crate::io::memory::MemoryContainer;
use crate::mesh_error::MeshReadError;

/// Field blocks are padded up to a multiple of this many nodes.
pub const FIELD_BLOCK_ALIGNMENT: usize = 8;

/// Builder for an in-memory volume file.
#[derive(Clone, Debug)]
pub struct SyntheticVolume {
    pub kind: ModelKind,
    pub blocks: usize,
    /// Sub-cells per block edge.
    pub order: usize,
    pub time_steps: usize,
    pub sampling_rate_hz: f64,
    pub start_time_s: f64,
    /// Store connectivity as 64-bit integers instead of 32-bit.
    pub wide_indices: bool,
}

impl SyntheticVolume {
    pub fn new(kind: ModelKind, blocks: usize, order: usize) -> Self {
        Self {
            kind,
            blocks,
            order,
            time_steps: 1,
            sampling_rate_hz: 10.0,
            start_time_s: 0.0,
            wide_indices: false,
        }
    }

    pub fn with_time_steps(mut self, time_steps: usize) -> Self {
        self.time_steps = time_steps;
        self
    }

    pub fn with_wide_indices(mut self) -> Self {
        self.wide_indices = true;
        self
    }

    pub fn nodes_per_block(&self) -> usize {
        (self.order + 1).pow(3)
    }

    pub fn padded_nodes_per_block(&self) -> usize {
        self.nodes_per_block().next_multiple_of(FIELD_BLOCK_ALIGNMENT)
    }

    pub fn cells_per_block(&self) -> usize {
        self.order.pow(3)
    }

    pub fn cell_count(&self) -> usize {
        self.blocks * self.cells_per_block()
    }

    pub fn node_count(&self) -> usize {
        self.blocks * self.nodes_per_block()
    }

    /// Value stored for `(step, component, global node)`.
    pub fn field_value(step: usize, component: usize, node: usize) -> f32 {
        (step * 10_000 + component * 1_000 + node) as f32 * 0.5
    }

    /// Global node ids of every cell, block by block.
    pub fn connectivity(&self) -> Vec<i64> {
        let n = self.order;
        let row = n + 1;
        let slab = row * row;
        let npb = self.nodes_per_block();
        let mut cells = Vec::with_capacity(self.cell_count() * 8);
        for b in 0..self.blocks {
            let first = (b * npb) as i64;
            for k in 0..n {
                for j in 0..n {
                    for i in 0..n {
                        let base = k * slab + j * row + i;
                        let v3 = base + row;
                        let v4 = base + slab;
                        let v7 = v4 + row;
                        for local in [base, base + 1, v3 + 1, v3, v4, v4 + 1, v7 + 1, v7] {
                            cells.push(first + local as i64);
                        }
                    }
                }
            }
        }
        cells
    }

    /// Node positions, `xyz` per global node.
    pub fn coordinates(&self) -> Vec<f32> {
        let n = self.order.max(1);
        let row = self.order + 1;
        let mut coords = Vec::with_capacity(self.node_count() * 3);
        for b in 0..self.blocks {
            for local in 0..self.nodes_per_block() {
                let i = local % row;
                let j = (local / row) % row;
                let k = local / (row * row);
                coords.push(b as f32 + i as f32 / n as f32);
                coords.push(j as f32 / n as f32);
                coords.push(k as f32 / n as f32);
            }
        }
        coords
    }

    fn field_values(&self) -> Vec<f32> {
        let components = self.kind.field_names().len();
        let npb = self.nodes_per_block();
        let padded = self.padded_nodes_per_block();
        let mut values = Vec::with_capacity(self.time_steps * self.blocks * components * padded);
        for t in 0..self.time_steps {
            for b in 0..self.blocks {
                for c in 0..components {
                    for p in 0..padded {
                        values.push(if p < npb {
                            Self::field_value(t, c, b * npb + p)
                        } else {
                            f32::NAN
                        });
                    }
                }
            }
        }
        values
    }

    pub fn build(&self) -> Result<MemoryContainer, MeshReadError> {
        if self.blocks == 0 || self.order == 0 {
            return Err(MeshReadError::InvalidGeometry(
                "synthetic volume needs at least one block of order >= 1".into(),
            ));
        }
        let kind = self.kind;
        let mut c = MemoryContainer::new();
        let connectivity = self.connectivity();
        let conn_shape = vec![self.cell_count(), 8];
        if self.wide_indices {
            c.insert_i64(&kind.connectivity_path(), conn_shape, connectivity)?;
        } else {
            let narrow = connectivity
                .into_iter()
                .map(|id| {
                    i32::try_from(id).map_err(|_| MeshReadError::NodeIdOutOfRange {
                        id,
                        node_count: self.node_count(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            c.insert_i32(&kind.connectivity_path(), conn_shape, narrow)?;
        }
        c.insert_f32(
            &kind.coordinates_path(),
            vec![self.blocks, self.nodes_per_block(), 3],
            self.coordinates(),
        )?;
        c.add_group(VOLUME_GROUP);
        if self.time_steps > 0 {
            c.insert_f32(
                &kind.field_path(),
                vec![
                    self.time_steps,
                    self.blocks,
                    kind.field_names().len(),
                    self.padded_nodes_per_block(),
                ],
                self.field_values(),
            )?;
        }
        c.set_attribute(VOLUME_GROUP, SAMPLING_RATE_ATTR, self.sampling_rate_hz);
        c.set_attribute(VOLUME_GROUP, START_TIME_ATTR, self.start_time_s);
        Ok(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::DatasetAccessor;

    #[test]
    fn two_blocks_of_order_two() {
        let s = SyntheticVolume::new(ModelKind::Acoustic, 2, 2);
        assert_eq!(s.cell_count(), 16);
        assert_eq!(s.nodes_per_block(), 27);
        assert_eq!(s.padded_nodes_per_block(), 32);
        let c = s.build().unwrap();
        assert_eq!(c.shape("connectivity_ACOUSTIC").unwrap(), vec![16, 8]);
        assert_eq!(c.shape("coordinates_ACOUSTIC").unwrap(), vec![2, 27, 3]);
        assert_eq!(c.shape("volume/phi_tt").unwrap(), vec![1, 2, 1, 32]);
    }

    #[test]
    fn empty_geometry_is_rejected() {
        let err = SyntheticVolume::new(ModelKind::Acoustic, 0, 2).build().unwrap_err();
        assert!(matches!(err, MeshReadError::InvalidGeometry(_)));
    }

    #[test]
    fn cells_stay_inside_their_block() {
        let s = SyntheticVolume::new(ModelKind::Elastic, 3, 2);
        let conn = s.connectivity();
        for (cell, ids) in conn.chunks_exact(8).enumerate() {
            let block = (cell / s.cells_per_block()) as i64;
            let npb = s.nodes_per_block() as i64;
            assert!(ids.iter().all(|&id| id / npb == block));
        }
        assert_eq!(&conn[..8], &[0, 1, 4, 3, 9, 10, 13, 12]);
    }

    #[test]
    fn fifth_order_blocks_pad_to_128() {
        let s = SyntheticVolume::new(ModelKind::Acoustic, 1, 4);
        assert_eq!(s.nodes_per_block(), 125);
        assert_eq!(s.padded_nodes_per_block(), 128);
    }
}
