//! # First-person Camera
//!
//! Turns the azimuth/elevation angles and world position stored in
//! [`RenderData`] into a view matrix each frame.
//!
//! ## Coordinate System
//! Right-handed, Y up. Azimuth 0 looks down -Z; positive azimuth turns
//! towards +X. Positive elevation looks up.

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};
use crate::render::render_data::RenderData;

/// Near clip plane distance
pub const NEAR_PLANE: f32 = 0.01;
/// Far clip plane distance
pub const FAR_PLANE: f32 = 50.0;

/// Camera holding the basis vectors of the last computed view.
///
/// No history is kept; every call to [`Camera::view_matrix`] rebuilds the
/// basis from the current render data.
#[derive(Debug, Clone)]
pub struct Camera {
    world_up: Vec3,
    view_direction: Vec3,
    right_direction: Vec3,
    up_direction: Vec3,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    /// Create a camera with a Y-up world
    pub fn new() -> Self {
        Self {
            world_up: Vec3::y(),
            view_direction: Vec3::new(0.0, 0.0, -1.0),
            right_direction: Vec3::x(),
            up_direction: Vec3::y(),
        }
    }

    /// Unit view direction for the given angles in degrees
    pub fn direction_from_angles(azimuth: f32, elevation: f32) -> Vec3 {
        let azim_rad = utils::deg_to_rad(azimuth);
        let elev_rad = utils::deg_to_rad(elevation);

        Vec3::new(
            azim_rad.sin() * elev_rad.cos(),
            elev_rad.sin(),
            -azim_rad.cos() * elev_rad.cos(),
        )
        .normalize()
    }

    /// Rebuild the camera basis, move the camera by the movement intents
    /// scaled with the tick delta, and return the view matrix.
    pub fn view_matrix(&mut self, data: &mut RenderData) -> Mat4 {
        self.view_direction = Self::direction_from_angles(data.view_azimuth, data.view_elevation);
        self.right_direction = self.view_direction.cross(&self.world_up).normalize();
        self.up_direction = self.right_direction.cross(&self.view_direction).normalize();

        data.camera_world_position += data.move_forward as f32 * data.tick_diff * self.view_direction
            + data.move_right as f32 * data.tick_diff * self.right_direction
            + data.move_up as f32 * data.tick_diff * self.up_direction;

        let eye = data.camera_world_position;
        Mat4::look_at(eye, eye + self.view_direction, self.up_direction)
    }

    /// Perspective projection for the current field of view.
    ///
    /// `aspect` comes from the image being rendered, which lags
    /// [`RenderData`]'s size until the swapchain is rebuilt.
    pub fn projection_matrix(data: &RenderData, aspect: f32) -> Mat4 {
        Mat4::perspective(
            utils::deg_to_rad(data.field_of_view),
            aspect,
            NEAR_PLANE,
            FAR_PLANE,
        )
    }

    /// View direction of the last computed view
    pub fn view_direction(&self) -> Vec3 {
        self.view_direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_zero_angles_look_down_negative_z() {
        assert_relative_eq!(Camera::direction_from_angles(0.0, 0.0), Vec3::new(0.0, 0.0, -1.0), epsilon = EPSILON);
    }

    #[test]
    fn test_azimuth_turns_towards_positive_x() {
        assert_relative_eq!(Camera::direction_from_angles(90.0, 0.0), Vec3::new(1.0, 0.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_negative_elevation_looks_down() {
        let dir = Camera::direction_from_angles(0.0, -30.0);
        assert!(dir.y < 0.0);
        assert_relative_eq!(dir.norm(), 1.0, epsilon = EPSILON);
    }

    #[test]
    fn test_movement_scales_with_tick_diff() {
        let mut camera = Camera::new();
        let mut data = RenderData {
            view_azimuth: 0.0,
            view_elevation: 0.0,
            camera_world_position: Vec3::zeros(),
            move_forward: 4,
            move_right: -1,
            tick_diff: 0.5,
            ..RenderData::default()
        };

        camera.view_matrix(&mut data);

        // forward is -Z, right is +X
        assert_relative_eq!(data.camera_world_position, Vec3::new(-0.5, 0.0, -2.0), epsilon = EPSILON);
    }

    #[test]
    fn test_no_intent_keeps_position() {
        let mut camera = Camera::new();
        let mut data = RenderData {
            tick_diff: 1.0,
            ..RenderData::default()
        };
        let before = data.camera_world_position;

        camera.view_matrix(&mut data);

        assert_relative_eq!(data.camera_world_position, before);
    }

    #[test]
    fn test_view_matrix_places_target_in_front() {
        let mut camera = Camera::new();
        let mut data = RenderData::default();
        let view = camera.view_matrix(&mut data);

        let ahead = data.camera_world_position + camera.view_direction();
        let in_view = view.transform_point(&nalgebra::Point3::from(ahead));

        assert_relative_eq!(in_view.coords, Vec3::new(0.0, 0.0, -1.0), epsilon = EPSILON);
    }

    #[test]
    fn test_projection_uses_given_aspect() {
        let data = RenderData {
            width: 800,
            height: 800,
            ..RenderData::default()
        };
        let projection = Camera::projection_matrix(&data, 2.0);

        assert_relative_eq!(projection[(1, 1)] / projection[(0, 0)], 2.0, epsilon = EPSILON);
    }
}
