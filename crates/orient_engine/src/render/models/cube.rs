use crate::foundation::math::Vec3;
use crate::render::mesh::{Mesh, Vertex};

const HALF: f32 = 0.5;

/// Corners of each face as seen from outside: bottom-left, bottom-right,
/// top-right, top-left. Counter-clockwise winding faces outwards.
const FACES: [[[f32; 3]; 4]; 6] = [
    // +Z
    [[-HALF, -HALF, HALF], [HALF, -HALF, HALF], [HALF, HALF, HALF], [-HALF, HALF, HALF]],
    // -Z
    [[HALF, -HALF, -HALF], [-HALF, -HALF, -HALF], [-HALF, HALF, -HALF], [HALF, HALF, -HALF]],
    // +X
    [[HALF, -HALF, HALF], [HALF, -HALF, -HALF], [HALF, HALF, -HALF], [HALF, HALF, HALF]],
    // -X
    [[-HALF, -HALF, -HALF], [-HALF, -HALF, HALF], [-HALF, HALF, HALF], [-HALF, HALF, -HALF]],
    // +Y
    [[-HALF, HALF, HALF], [HALF, HALF, HALF], [HALF, HALF, -HALF], [-HALF, HALF, -HALF]],
    // -Y
    [[-HALF, -HALF, -HALF], [HALF, -HALF, -HALF], [HALF, -HALF, HALF], [-HALF, -HALF, HALF]],
];

/// Texture coordinates matching the corner order of [`FACES`]
const FACE_UVS: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

/// Textured unit cube centered on the origin
#[derive(Debug, Clone)]
pub struct CubeModel {
    mesh: Mesh,
}

impl Default for CubeModel {
    fn default() -> Self {
        Self::new()
    }
}

impl CubeModel {
    /// Build the 12 triangles of the cube with white vertex color
    pub fn new() -> Self {
        let white = Vec3::new(1.0, 1.0, 1.0);
        let mut vertices = Vec::with_capacity(36);

        for face in &FACES {
            for corner in [0, 1, 2, 0, 2, 3] {
                vertices.push(Vertex::new(Vec3::from(face[corner]), white, FACE_UVS[corner]));
            }
        }

        Self {
            mesh: Mesh::from_vertices(vertices),
        }
    }

    /// Fresh copy of the cube geometry
    pub fn vertex_data(&self) -> Mesh {
        self.mesh.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_has_twelve_triangles() {
        assert_eq!(CubeModel::new().vertex_data().len(), 36);
    }

    #[test]
    fn test_triangles_wind_outwards() {
        let mesh = CubeModel::new().vertex_data();
        for triangle in mesh.vertices.chunks(3) {
            let a = triangle[0].position();
            let b = triangle[1].position();
            let c = triangle[2].position();
            let normal = (b - a).cross(&(c - a));
            let centroid = (a + b + c) / 3.0;

            assert!(normal.dot(&centroid) > 0.0, "inward facing triangle at {centroid:?}");
        }
    }
}
