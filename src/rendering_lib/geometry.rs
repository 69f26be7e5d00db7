// src/rendering_lib/geometry.rs

use glam::{Mat3, Vec3};

use super::vertex::Vertex;

/// CPU-side indexed triangle mesh.
#[derive(Clone, Debug, Default)]
pub struct Geometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    /// A `width` x `height` plane in the XY plane, centered on the origin, facing +Z,
    /// split into a `width_segments` x `height_segments` grid. UV (0, 1) is the
    /// top-left corner.
    pub fn plane(width: f32, height: f32, width_segments: u32, height_segments: u32) -> Self {
        let grid_x = width_segments.max(1);
        let grid_y = height_segments.max(1);
        let segment_w = width / grid_x as f32;
        let segment_h = height / grid_y as f32;

        let mut vertices = Vec::with_capacity(((grid_x + 1) * (grid_y + 1)) as usize);
        for iy in 0..=grid_y {
            let y = iy as f32 * segment_h - height / 2.0;
            for ix in 0..=grid_x {
                let x = ix as f32 * segment_w - width / 2.0;
                vertices.push(Vertex::new(
                    [x, -y, 0.0],
                    [ix as f32 / grid_x as f32, 1.0 - iy as f32 / grid_y as f32],
                ));
            }
        }

        let row = grid_x + 1;
        let mut indices = Vec::with_capacity((grid_x * grid_y * 6) as usize);
        for iy in 0..grid_y {
            for ix in 0..grid_x {
                let a = ix + row * iy;
                let b = ix + row * (iy + 1);
                let c = (ix + 1) + row * (iy + 1);
                let d = (ix + 1) + row * iy;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        Self { vertices, indices }
    }

    pub fn rotate_x(&mut self, angle_rad: f32) -> &mut Self {
        let rotation = Mat3::from_rotation_x(angle_rad);
        for v in &mut self.vertices {
            v.position = (rotation * Vec3::from(v.position)).to_array();
        }
        self
    }

    /// Line-list indices covering every triangle edge, for wireframe drawing.
    pub fn edge_indices(&self) -> Vec<u32> {
        let mut edges = Vec::with_capacity(self.indices.len() * 2);
        for tri in self.indices.chunks_exact(3) {
            edges.extend_from_slice(&[tri[0], tri[1], tri[1], tri[2], tri[2], tri[0]]);
        }
        edges
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_grid_has_expected_counts() {
        let plane = Geometry::plane(30.0, 30.0, 200, 200);
        assert_eq!(plane.vertices.len(), 201 * 201);
        assert_eq!(plane.triangle_count(), 200 * 200 * 2);
        assert!(plane.indices.iter().all(|&i| (i as usize) < plane.vertices.len()));
    }

    #[test]
    fn plane_spans_its_extent_with_unit_uvs() {
        let plane = Geometry::plane(2.0, 4.0, 2, 2);
        let first = plane.vertices[0];
        let last = plane.vertices[plane.vertices.len() - 1];
        assert_eq!(first.position, [-1.0, 2.0, 0.0]);
        assert_eq!(first.uv, [0.0, 1.0]);
        assert_eq!(last.position, [1.0, -2.0, 0.0]);
        assert_eq!(last.uv, [1.0, 0.0]);
    }

    #[test]
    fn rotating_flat_puts_the_plane_in_xz() {
        let mut plane = Geometry::plane(30.0, 30.0, 4, 4);
        plane.rotate_x(-std::f32::consts::FRAC_PI_2);
        for v in &plane.vertices {
            assert!(v.position[1].abs() < 1e-4);
        }
        let corner = plane.vertices[0].position;
        assert!((corner[0] + 15.0).abs() < 1e-4);
        assert!((corner[2] + 15.0).abs() < 1e-4);
    }

    #[test]
    fn edges_cover_each_triangle_side() {
        let plane = Geometry::plane(1.0, 1.0, 1, 1);
        assert_eq!(plane.edge_indices(), vec![0, 2, 2, 1, 1, 0, 2, 3, 3, 1, 1, 2]);
    }
}
