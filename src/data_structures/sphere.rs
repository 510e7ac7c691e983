//! UV sphere geometry and its wireframe.
//!
//! Vertices are laid out ring by ring from the north pole (+y) to the south
//! pole, `width_segments + 1` per ring so the seam gets its own column. The
//! degenerate triangles that would touch the poles twice are skipped.

use std::{collections::HashSet, f32::consts::PI};

use crate::data_structures::model::LineVertex;

#[derive(Clone, Debug)]
pub struct SphereGeometry {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl SphereGeometry {
    pub fn new(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);

        let mut positions = Vec::with_capacity(((width_segments + 1) * (height_segments + 1)) as usize);
        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            let theta = v * PI;
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let phi = u * 2.0 * PI;
                positions.push([
                    -radius * phi.cos() * theta.sin(),
                    radius * theta.cos(),
                    radius * phi.sin() * theta.sin(),
                ]);
            }
        }

        let stride = width_segments + 1;
        let mut indices = Vec::new();
        for iy in 0..height_segments {
            for ix in 0..width_segments {
                let a = iy * stride + ix + 1;
                let b = iy * stride + ix;
                let c = (iy + 1) * stride + ix;
                let d = (iy + 1) * stride + ix + 1;
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self { positions, indices }
    }

    /// Unique triangle edges as a line list.
    pub fn wireframe_indices(&self) -> Vec<u32> {
        let mut seen = HashSet::new();
        let mut lines = Vec::new();
        for triangle in self.indices.chunks_exact(3) {
            for (start, end) in [
                (triangle[0], triangle[1]),
                (triangle[1], triangle[2]),
                (triangle[2], triangle[0]),
            ] {
                if seen.insert((start.min(end), start.max(end))) {
                    lines.extend_from_slice(&[start, end]);
                }
            }
        }
        lines
    }

    pub fn line_vertices(&self, color: [f32; 3]) -> Vec<LineVertex> {
        self.positions
            .iter()
            .map(|&position| LineVertex { position, color })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_vertex_lies_on_the_sphere() {
        let sphere = SphereGeometry::new(1.0, 32, 32);
        assert_eq!(sphere.positions.len(), 33 * 33);
        for [x, y, z] in &sphere.positions {
            let r = (x * x + y * y + z * z).sqrt();
            assert!((r - 1.0).abs() < 1e-5, "radius was {r}");
        }
    }

    #[test]
    fn pole_rows_use_single_triangles() {
        let sphere = SphereGeometry::new(1.0, 32, 32);
        // first and last ring contribute one triangle per segment, the rest two
        assert_eq!(sphere.indices.len() / 3, 32 * (2 * 32 - 2));
    }

    #[test]
    fn wireframe_has_no_duplicate_edges() {
        let sphere = SphereGeometry::new(2.0, 8, 6);
        let lines = sphere.wireframe_indices();
        assert_eq!(lines.len() % 2, 0);

        let edges: HashSet<_> = lines
            .chunks_exact(2)
            .map(|l| (l[0].min(l[1]), l[0].max(l[1])))
            .collect();
        assert_eq!(edges.len(), lines.len() / 2);
        for triangle in sphere.indices.chunks_exact(3) {
            assert!(edges.contains(&(triangle[0].min(triangle[1]), triangle[0].max(triangle[1]))));
        }
    }
}
