//! Vertex and mesh types for per-frame geometry staging
//!
//! All geometry of a frame is concatenated into one interleaved vertex list.
//! `Vertex` is a plain `#[repr(C)]` struct so the list can be copied into a
//! vertex buffer unchanged; the Vulkan attribute layout lives in
//! `vulkan/vertex_layout.rs`.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{Quat, Vec3};
use crate::foundation::math;

/// Interleaved vertex: position, color, texture coordinate
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    /// Position in world space
    pub position: [f32; 3],
    /// RGB color
    pub color: [f32; 3],
    /// Texture coordinate
    pub uv: [f32; 2],
}

impl Vertex {
    /// Create a vertex
    pub fn new(position: Vec3, color: Vec3, uv: [f32; 2]) -> Self {
        Self {
            position: position.into(),
            color: color.into(),
            uv,
        }
    }

    /// Create an untextured vertex for line geometry
    pub fn colored(position: Vec3, color: Vec3) -> Self {
        Self::new(position, color, [0.0, 0.0])
    }

    /// Position as a vector
    pub fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }

    /// Color as a vector
    pub fn color(&self) -> Vec3 {
        Vec3::from(self.color)
    }
}

/// Ordered vertex list, rebuilt every frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertices in draw order
    pub vertices: Vec<Vertex>,
}

impl Mesh {
    /// Create an empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh from vertices
    pub fn from_vertices(vertices: Vec<Vertex>) -> Self {
        Self { vertices }
    }

    /// Number of vertices
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the mesh has no vertices
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Remove all vertices, keeping the allocation
    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    /// Append all vertices of another mesh
    pub fn append(&mut self, other: &Self) {
        self.vertices.extend_from_slice(&other.vertices);
    }

    /// Multiply every vertex color by `factor`
    pub fn scale_colors(&mut self, factor: f32) {
        for vertex in &mut self.vertices {
            vertex.color = (vertex.color() * factor).into();
        }
    }

    /// Replace every vertex color
    pub fn set_color(&mut self, color: Vec3) {
        for vertex in &mut self.vertices {
            vertex.color = color.into();
        }
    }

    /// Rotate every vertex by `orientation` (`p' = q * p * q_conj`), then
    /// translate it by `translation`.
    ///
    /// `conjugate` must be the conjugate of `orientation`.
    pub fn rotate_translate(&mut self, orientation: &Quat, conjugate: &Quat, translation: &Vec3) {
        for vertex in &mut self.vertices {
            let rotated = math::rotate_by(orientation, conjugate, &vertex.position());
            vertex.position = (rotated + translation).into();
        }
    }

    /// Raw bytes for a GPU upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::utils;
    use approx::assert_relative_eq;

    #[test]
    fn test_vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
    }

    #[test]
    fn test_rotate_translate_uses_quaternion_sandwich() {
        let mut mesh = Mesh::from_vertices(vec![Vertex::colored(Vec3::new(1.0, 0.0, 0.0), Vec3::x())]);
        let orientation = Quat::from_axis_angle(&Vec3::z_axis(), utils::deg_to_rad(90.0));

        mesh.rotate_translate(&orientation, &math::conjugate(&orientation), &Vec3::new(0.0, 0.0, 5.0));

        assert_relative_eq!(mesh.vertices[0].position(), Vec3::new(0.0, 1.0, 5.0), epsilon = 1e-5);
    }

    #[test]
    fn test_scale_and_set_colors() {
        let mut mesh = Mesh::from_vertices(vec![
            Vertex::colored(Vec3::zeros(), Vec3::new(0.8, 0.0, 0.4)),
            Vertex::colored(Vec3::zeros(), Vec3::new(0.0, 1.0, 0.0)),
        ]);

        mesh.scale_colors(0.5);
        assert_relative_eq!(mesh.vertices[0].color(), Vec3::new(0.4, 0.0, 0.2));

        mesh.set_color(Vec3::new(0.0, 0.8, 0.8));
        assert!(mesh.vertices.iter().all(|v| v.color == [0.0, 0.8, 0.8]));
    }

    #[test]
    fn test_append_and_bytes() {
        let mut all = Mesh::new();
        let part = Mesh::from_vertices(vec![Vertex::default(); 3]);
        all.append(&part);
        all.append(&part);

        assert_eq!(all.len(), 6);
        assert_eq!(all.as_bytes().len(), 6 * 32);

        all.clear();
        assert!(all.is_empty());
    }
}
