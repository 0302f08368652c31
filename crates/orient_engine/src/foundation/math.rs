//! Math utilities and types
//!
//! nalgebra aliases plus the handful of quaternion and curve helpers the
//! frame loop needs: Euler construction, conjugate, sandwich rotation,
//! shortest-path slerp and cubic Hermite interpolation.

pub use nalgebra::{Matrix4, Quaternion, Unit, UnitQuaternion, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Unit quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Math constants
pub mod constants {
    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = std::f32::consts::PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }
}

/// Above this cosine the two orientations are treated as identical and
/// slerp falls back to a normalized lerp.
const SLERP_LINEAR_THRESHOLD: f32 = 1.0 - f32::EPSILON;

/// Build a rotation from Euler angles in radians.
///
/// The rotation applies X first, then Y, then Z (`q = qz * qy * qx`).
pub fn quat_from_euler(angles: Vec3) -> Quat {
    Quat::from_euler_angles(angles.x, angles.y, angles.z)
}

/// Quaternion conjugate. For unit quaternions this is the inverse rotation.
pub fn conjugate(q: &Quat) -> Quat {
    q.conjugate()
}

/// Rotate a point with the sandwich product `p' = q * p * q_conj`.
///
/// `q_conj` is passed in so callers that rotate many vertices with the same
/// orientation compute the conjugate once.
pub fn rotate_by(q: &Quat, q_conj: &Quat, point: &Vec3) -> Vec3 {
    let pure = Quaternion::from_imag(*point);
    let rotated = q.quaternion() * pure * q_conj.quaternion();
    rotated.imag()
}

/// Spherical linear interpolation along the shortest arc.
///
/// `t = 0` yields `from`, `t = 1` yields `to`. Orientations closer than
/// float precision interpolate linearly so the result stays finite.
pub fn slerp(from: &Quat, to: &Quat, t: f32) -> Quat {
    let a = from.quaternion();
    let mut b = *to.quaternion();

    let mut cos_theta = a.dot(&b);
    if cos_theta < 0.0 {
        b = -b;
        cos_theta = -cos_theta;
    }

    if cos_theta > SLERP_LINEAR_THRESHOLD {
        return Quat::new_normalize(a.lerp(&b, t));
    }

    let angle = cos_theta.acos();
    let sin_angle = angle.sin();
    let weight_a = ((1.0 - t) * angle).sin() / sin_angle;
    let weight_b = (t * angle).sin() / sin_angle;
    Quat::new_normalize(Quaternion::from(a.coords * weight_a + b.coords * weight_b))
}

/// Normalized linear interpolation along the shortest arc.
pub fn nlerp(from: &Quat, to: &Quat, t: f32) -> Quat {
    let a = from.quaternion();
    let mut b = *to.quaternion();
    if a.dot(&b) < 0.0 {
        b = -b;
    }
    Quat::new_normalize(a.lerp(&b, t))
}

/// Cubic Hermite interpolation between two vertices with their tangents.
pub fn hermite(start: &Vec3, start_tangent: &Vec3, end: &Vec3, end_tangent: &Vec3, t: f32) -> Vec3 {
    let t2 = t * t;
    let t3 = t2 * t;

    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h10 = t3 - 2.0 * t2 + t;
    let h11 = t3 - t2;

    start * h00 + end * h01 + start_tangent * h10 + end_tangent * h11
}

/// Extension trait for Mat4 with the projection and view builders
pub trait Mat4Ext {
    /// Right-handed perspective projection with depth mapped to `[0, 1]`.
    ///
    /// Y stays up; the renderer flips it through a negative viewport height.
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let tan_half_fovy = (fov_y * 0.5).tan();

        let mut result = Mat4::zeros();
        result[(0, 0)] = 1.0 / (aspect * tan_half_fovy);
        result[(1, 1)] = 1.0 / tan_half_fovy;
        result[(2, 2)] = far / (near - far);
        result[(2, 3)] = -(far * near) / (far - near);
        result[(3, 2)] = -1.0;
        result
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let forward = (target - eye).normalize();
        let right = forward.cross(&up).normalize();
        let camera_up = right.cross(&forward);

        let translation = Mat4::new(
            1.0, 0.0, 0.0, -eye.x,
            0.0, 1.0, 0.0, -eye.y,
            0.0, 0.0, 1.0, -eye.z,
            0.0, 0.0, 0.0, 1.0,
        );

        let rotation = Mat4::new(
            right.x, right.y, right.z, 0.0,
            camera_up.x, camera_up.y, camera_up.z, 0.0,
            -forward.x, -forward.y, -forward.z, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );

        rotation * translation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    fn assert_same_rotation(a: &Quat, b: &Quat) {
        // q and -q encode the same rotation
        assert_relative_eq!(a.quaternion().dot(b.quaternion()).abs(), 1.0, epsilon = EPSILON);
    }

    #[test]
    fn test_euler_matches_axis_composition() {
        let angles = Vec3::new(0.3, -0.7, 1.1);
        let expected = Quat::from_axis_angle(&Vec3::z_axis(), angles.z)
            * Quat::from_axis_angle(&Vec3::y_axis(), angles.y)
            * Quat::from_axis_angle(&Vec3::x_axis(), angles.x);

        assert_same_rotation(&quat_from_euler(angles), &expected);
    }

    #[test]
    fn test_rotate_by_matches_matrix_rotation() {
        let q = quat_from_euler(Vec3::new(0.0, utils::deg_to_rad(90.0), 0.0));
        let q_conj = conjugate(&q);
        let rotated = rotate_by(&q, &q_conj, &Vec3::new(1.0, 0.0, 0.0));

        // 90 degrees about Y sends +X to -Z
        assert_relative_eq!(rotated, Vec3::new(0.0, 0.0, -1.0), epsilon = EPSILON);
        assert_relative_eq!(rotated, q * Vec3::new(1.0, 0.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_slerp_endpoints() {
        let start = quat_from_euler(Vec3::new(0.2, 0.4, -0.9));
        let end = quat_from_euler(Vec3::new(-1.3, 2.0, 0.5));

        assert_same_rotation(&slerp(&start, &end, 0.0), &start);
        assert_same_rotation(&slerp(&start, &end, 1.0), &end);
    }

    #[test]
    fn test_slerp_midpoint_halves_angle() {
        let start = Quat::identity();
        let end = Quat::from_axis_angle(&Vec3::z_axis(), utils::deg_to_rad(90.0));
        let mid = slerp(&start, &end, 0.5);

        assert_relative_eq!(mid.angle(), utils::deg_to_rad(45.0), epsilon = EPSILON);
    }

    #[test]
    fn test_slerp_takes_shortest_path() {
        let start = Quat::from_axis_angle(&Vec3::z_axis(), utils::deg_to_rad(10.0));
        let flipped = Quat::new_unchecked(-*Quat::from_axis_angle(&Vec3::z_axis(), utils::deg_to_rad(30.0)).quaternion());
        let mid = slerp(&start, &flipped, 0.5);

        assert_relative_eq!(mid.angle(), utils::deg_to_rad(20.0), epsilon = 1e-4);
    }

    #[test]
    fn test_slerp_identical_orientations_stays_finite() {
        let q = quat_from_euler(Vec3::new(0.5, 0.5, 0.5));
        let result = slerp(&q, &q, 0.37);

        assert!(result.quaternion().coords.iter().all(|c| c.is_finite()));
        assert_same_rotation(&result, &q);
    }

    #[test]
    fn test_nlerp_endpoints() {
        let start = quat_from_euler(Vec3::new(0.1, 0.0, 0.0));
        let end = quat_from_euler(Vec3::new(0.0, 1.0, 0.0));

        assert_same_rotation(&nlerp(&start, &end, 0.0), &start);
        assert_same_rotation(&nlerp(&start, &end, 1.0), &end);
    }

    #[test]
    fn test_hermite_endpoints() {
        let start = Vec3::new(-4.0, 1.0, -2.0);
        let start_tangent = Vec3::new(-10.0, -8.0, 8.0);
        let end = Vec3::new(4.0, 2.0, -2.0);
        let end_tangent = Vec3::new(-6.0, 5.0, -6.0);

        assert_relative_eq!(hermite(&start, &start_tangent, &end, &end_tangent, 0.0), start);
        assert_relative_eq!(hermite(&start, &start_tangent, &end, &end_tangent, 1.0), end);
    }

    #[test]
    fn test_hermite_zero_tangents_is_smoothstep() {
        let start = Vec3::zeros();
        let end = Vec3::new(2.0, 0.0, 0.0);
        let mid = hermite(&start, &Vec3::zeros(), &end, &Vec3::zeros(), 0.5);

        assert_relative_eq!(mid, Vec3::new(1.0, 0.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_perspective_maps_near_and_far_to_unit_depth() {
        let proj = Mat4::perspective(utils::deg_to_rad(60.0), 1.5, 0.01, 50.0);

        let near = proj * nalgebra::Vector4::new(0.0, 0.0, -0.01, 1.0);
        let far = proj * nalgebra::Vector4::new(0.0, 0.0, -50.0, 1.0);

        assert_relative_eq!(near.z / near.w, 0.0, epsilon = EPSILON);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = EPSILON);
    }

    #[test]
    fn test_look_at_moves_eye_to_origin() {
        let eye = Vec3::new(-1.25, 2.0, 2.5);
        let view = Mat4::look_at(eye, eye + Vec3::new(0.0, 0.0, -1.0), Vec3::y());
        let transformed = view.transform_point(&nalgebra::Point3::from(eye));

        assert_relative_eq!(transformed.coords, Vec3::zeros(), epsilon = EPSILON);
    }
}
