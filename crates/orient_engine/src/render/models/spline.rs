use crate::foundation::math::{self, Vec3};
use crate::render::mesh::{Mesh, Vertex};

/// Hermite spline rendered as a polyline
#[derive(Debug, Clone)]
pub struct SplineModel {
    color: Vec3,
}

impl Default for SplineModel {
    fn default() -> Self {
        Self {
            color: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl SplineModel {
    /// Segments used by the renderer
    pub const DEFAULT_SEGMENTS: u32 = 25;

    /// Sample the curve at `segments + 1` evenly spaced parameters and emit
    /// one line per consecutive pair. Zero segments yields an empty mesh.
    pub fn create_vertex_data(
        &self,
        segments: u32,
        start_vertex: &Vec3,
        start_tangent: &Vec3,
        end_vertex: &Vec3,
        end_tangent: &Vec3,
    ) -> Mesh {
        let mut mesh = Mesh::new();
        if segments == 0 {
            return mesh;
        }

        let point_at = |i: u32| {
            let t = i as f32 / segments as f32;
            math::hermite(start_vertex, start_tangent, end_vertex, end_tangent, t)
        };

        mesh.vertices.reserve(segments as usize * 2);
        let mut previous = point_at(0);
        for i in 1..=segments {
            let current = point_at(i);
            mesh.vertices.push(Vertex::colored(previous, self.color));
            mesh.vertices.push(Vertex::colored(current, self.color));
            previous = current;
        }
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_polyline_connects_endpoints() {
        let start = Vec3::new(-4.0, 1.0, -2.0);
        let end = Vec3::new(4.0, 2.0, -2.0);
        let mesh = SplineModel::default().create_vertex_data(
            25,
            &start,
            &Vec3::new(-10.0, -8.0, 8.0),
            &end,
            &Vec3::new(-6.0, 5.0, -6.0),
        );

        assert_eq!(mesh.len(), 50);
        assert_relative_eq!(mesh.vertices[0].position(), start);
        assert_relative_eq!(mesh.vertices[49].position(), end, epsilon = 1e-5);

        // consecutive segments share their joint
        for pair in mesh.vertices.chunks(2).collect::<Vec<_>>().windows(2) {
            assert_eq!(pair[0][1].position, pair[1][0].position);
        }
    }

    #[test]
    fn test_zero_segments_is_empty() {
        let mesh = SplineModel::default().create_vertex_data(0, &Vec3::zeros(), &Vec3::zeros(), &Vec3::x(), &Vec3::zeros());
        assert!(mesh.is_empty());
    }
}
