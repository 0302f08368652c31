use crate::foundation::math::Vec3;
use crate::render::mesh::Mesh;

use super::arrow::arrow_lines;

/// World axes: red X, green Y, blue Z, each one unit long
#[derive(Debug, Clone)]
pub struct CoordArrowsModel {
    mesh: Mesh,
}

impl Default for CoordArrowsModel {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordArrowsModel {
    /// Build the three axis arrows
    pub fn new() -> Self {
        let mut vertices = arrow_lines(Vec3::x(), Vec3::y(), Vec3::z(), Vec3::new(1.0, 0.0, 0.0));
        vertices.extend(arrow_lines(Vec3::y(), Vec3::x(), Vec3::z(), Vec3::new(0.0, 1.0, 0.0)));
        vertices.extend(arrow_lines(Vec3::z(), Vec3::x(), Vec3::y(), Vec3::new(0.0, 0.0, 1.0)));

        Self {
            mesh: Mesh::from_vertices(vertices),
        }
    }

    /// Fresh copy of the axes geometry
    pub fn vertex_data(&self) -> Mesh {
        self.mesh.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_colored_axes() {
        let mesh = CoordArrowsModel::new().vertex_data();
        assert_eq!(mesh.len(), 30);

        let per_axis = mesh.len() / 3;
        assert!(mesh.vertices[..per_axis].iter().all(|v| v.color == [1.0, 0.0, 0.0]));
        assert!(mesh.vertices[per_axis..2 * per_axis].iter().all(|v| v.color == [0.0, 1.0, 0.0]));
        assert!(mesh.vertices[2 * per_axis..].iter().all(|v| v.color == [0.0, 0.0, 1.0]));
    }
}
