use crate::foundation::math::Vec3;
use crate::render::mesh::{Mesh, Vertex};

/// Length of the arrow shaft
const ARROW_LENGTH: f32 = 1.0;
/// Where the head lines meet the shaft, measured from the origin
const HEAD_BASE: f32 = 0.85;
/// Half width of the arrow head
const HEAD_WIDTH: f32 = 0.05;

/// Single arrow from the origin along +X with a four-line head.
///
/// Used to visualize an orientation: the arrow is rotated by a quaternion and
/// placed at a point on the spline.
#[derive(Debug, Clone)]
pub struct ArrowModel {
    mesh: Mesh,
}

impl Default for ArrowModel {
    fn default() -> Self {
        Self::new(Self::DEFAULT_COLOR)
    }
}

impl ArrowModel {
    /// Color of the interpolated orientation arrow
    pub const DEFAULT_COLOR: Vec3 = Vec3::new(0.8, 0.0, 0.0);

    /// Build an arrow with a uniform color
    pub fn new(color: Vec3) -> Self {
        Self {
            mesh: Mesh::from_vertices(arrow_lines(Vec3::x(), Vec3::y(), Vec3::z(), color)),
        }
    }

    /// Fresh copy of the arrow geometry
    pub fn vertex_data(&self) -> Mesh {
        self.mesh.clone()
    }
}

/// Line-list vertices of an arrow along `axis`; `side_a` and `side_b` span
/// the plane of the head.
pub(super) fn arrow_lines(axis: Vec3, side_a: Vec3, side_b: Vec3, color: Vec3) -> Vec<Vertex> {
    let tip = axis * ARROW_LENGTH;
    let base = axis * HEAD_BASE;

    let mut vertices = vec![Vertex::colored(Vec3::zeros(), color), Vertex::colored(tip, color)];
    for offset in [side_a, -side_a, side_b, -side_b] {
        vertices.push(Vertex::colored(tip, color));
        vertices.push(Vertex::colored(base + offset * HEAD_WIDTH, color));
    }
    vertices
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_arrow_is_a_line_list_along_x() {
        let mesh = ArrowModel::default().vertex_data();

        assert_eq!(mesh.len() % 2, 0);
        assert_eq!(mesh.len(), 10);
        assert_relative_eq!(mesh.vertices[1].position(), Vec3::new(1.0, 0.0, 0.0));
        assert!(mesh.vertices.iter().all(|v| v.position[0] >= 0.0 && v.position[0] <= 1.0));
    }

    #[test]
    fn test_arrow_uses_given_color() {
        let color = Vec3::new(0.1, 0.2, 0.3);
        let mesh = ArrowModel::new(color).vertex_data();
        assert!(mesh.vertices.iter().all(|v| v.color() == color));
    }
}
