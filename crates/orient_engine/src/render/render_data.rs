//! Shared per-frame render state
//!
//! `RenderData` is the context object threaded through the renderer, the
//! input handlers and the overlay. It is owned by the renderer and lent out
//! mutably for each call.

use crate::config::RendererConfig;
use crate::foundation::math::Vec3;

/// Width over height, 1.0 when `height` is zero
pub fn aspect_ratio(width: u32, height: u32) -> f32 {
    if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

/// Default spline start vertex
pub const DEFAULT_SPLINE_START_VERTEX: Vec3 = Vec3::new(-4.0, 1.0, -2.0);
/// Default spline start tangent
pub const DEFAULT_SPLINE_START_TANGENT: Vec3 = Vec3::new(-10.0, -8.0, 8.0);
/// Default spline end vertex
pub const DEFAULT_SPLINE_END_VERTEX: Vec3 = Vec3::new(4.0, 2.0, -2.0);
/// Default spline end tangent
pub const DEFAULT_SPLINE_END_TANGENT: Vec3 = Vec3::new(-6.0, 5.0, -6.0);

/// How the start and end orientations are blended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Spherical linear interpolation, constant angular velocity
    #[default]
    Slerp,
    /// Normalized linear interpolation
    Nlerp,
}

/// Phase durations of the last frame, in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTimings {
    /// Whole frame, measured from the previous frame start
    pub frame_time: f32,
    /// Projection and view matrix generation
    pub matrix_generate_time: f32,
    /// Vertex buffer upload
    pub upload_to_vbo_time: f32,
    /// Uniform buffer upload
    pub upload_to_ubo_time: f32,
    /// Overlay construction
    pub ui_generate_time: f32,
    /// Overlay recording
    pub ui_draw_time: f32,
}

/// Mutable state shared by the renderer, input handlers and overlay
#[derive(Debug, Clone, PartialEq)]
pub struct RenderData {
    /// Framebuffer width in pixels
    pub width: u32,
    /// Framebuffer height in pixels
    pub height: u32,
    /// Triangles of the model drawn last frame
    pub triangle_count: u32,
    /// Vertical field of view in degrees
    pub field_of_view: f32,

    /// Phase durations of the last frame
    pub timings: FrameTimings,

    /// Forward movement intent, signed and possibly multiplied
    pub move_forward: i32,
    /// Sideways movement intent
    pub move_right: i32,
    /// Vertical movement intent
    pub move_up: i32,
    /// Seconds since the previous frame
    pub tick_diff: f32,

    /// Horizontal view angle in degrees, `[0, 360)`
    pub view_azimuth: f32,
    /// Vertical view angle in degrees, `[-89, 89]`
    pub view_elevation: f32,
    /// Camera position in world space
    pub camera_world_position: Vec3,

    /// Draw the world coordinate axes
    pub draw_world_coord_arrows: bool,
    /// Draw the start, end and interpolated orientation arrows
    pub draw_model_coord_arrows: bool,
    /// Draw the spline polyline
    pub draw_spline_lines: bool,
    /// One-shot request to restore the orientation and spline defaults
    pub reset_angles_and_interp: bool,

    /// Euler X angle in degrees for the start `[0]` and end `[1]` orientation
    pub rot_x_angle: [i32; 2],
    /// Euler Y angle in degrees
    pub rot_y_angle: [i32; 2],
    /// Euler Z angle in degrees
    pub rot_z_angle: [i32; 2],
    /// Blend factor between start and end, `[0, 1]`
    pub interp_value: f32,
    /// Blend function
    pub blend_mode: BlendMode,

    /// Advance `interp_value` automatically each frame
    pub play_animation: bool,
    /// Auto-play speed in blend units per second
    pub animation_speed: f32,
    /// Auto-play runs from end to start
    pub animation_backward: bool,

    /// Spline start vertex
    pub spline_start_vertex: Vec3,
    /// Spline start tangent
    pub spline_start_tangent: Vec3,
    /// Spline end vertex
    pub spline_end_vertex: Vec3,
    /// Spline end tangent
    pub spline_end_tangent: Vec3,
}

impl Default for RenderData {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            triangle_count: 0,
            field_of_view: 60.0,
            timings: FrameTimings::default(),
            move_forward: 0,
            move_right: 0,
            move_up: 0,
            tick_diff: 0.0,
            view_azimuth: 0.0,
            view_elevation: -30.0,
            camera_world_position: Vec3::new(-1.25, 2.0, 2.5),
            draw_world_coord_arrows: true,
            draw_model_coord_arrows: true,
            draw_spline_lines: true,
            reset_angles_and_interp: false,
            rot_x_angle: [0, 0],
            rot_y_angle: [0, 0],
            rot_z_angle: [0, 0],
            interp_value: 0.0,
            blend_mode: BlendMode::Slerp,
            play_animation: false,
            animation_speed: 1.0,
            animation_backward: false,
            spline_start_vertex: DEFAULT_SPLINE_START_VERTEX,
            spline_start_tangent: DEFAULT_SPLINE_START_TANGENT,
            spline_end_vertex: DEFAULT_SPLINE_END_VERTEX,
            spline_end_tangent: DEFAULT_SPLINE_END_TANGENT,
        }
    }
}

impl RenderData {
    /// Create render data with the camera values from the configuration
    pub fn from_config(config: &RendererConfig, width: u32, height: u32) -> Self {
        let [x, y, z] = config.camera.world_position;
        Self {
            width,
            height,
            field_of_view: config.camera.field_of_view,
            view_azimuth: config.camera.view_azimuth,
            view_elevation: config.camera.view_elevation,
            camera_world_position: Vec3::new(x, y, z),
            ..Self::default()
        }
    }

    /// Width over height, 1.0 for a zero-sized viewport
    pub fn aspect_ratio(&self) -> f32 {
        aspect_ratio(self.width, self.height)
    }

    /// Apply a pending reset request.
    ///
    /// Restores angles, blend factor, spline vertices/tangents and the draw
    /// toggles, then clears the request. Returns whether a reset happened.
    pub fn apply_pending_reset(&mut self) -> bool {
        if !self.reset_angles_and_interp {
            return false;
        }
        self.reset_angles_and_interp = false;

        self.rot_x_angle = [0, 0];
        self.rot_y_angle = [0, 0];
        self.rot_z_angle = [0, 0];
        self.interp_value = 0.0;

        self.spline_start_vertex = DEFAULT_SPLINE_START_VERTEX;
        self.spline_start_tangent = DEFAULT_SPLINE_START_TANGENT;
        self.spline_end_vertex = DEFAULT_SPLINE_END_VERTEX;
        self.spline_end_tangent = DEFAULT_SPLINE_END_TANGENT;

        self.draw_world_coord_arrows = true;
        self.draw_model_coord_arrows = true;
        self.draw_spline_lines = true;

        log::debug!("Orientation and spline parameters reset");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scrambled() -> RenderData {
        RenderData {
            rot_x_angle: [45, -90],
            rot_y_angle: [10, 20],
            rot_z_angle: [-180, 180],
            interp_value: 0.7,
            spline_start_vertex: Vec3::new(1.0, 1.0, 1.0),
            spline_start_tangent: Vec3::zeros(),
            spline_end_vertex: Vec3::new(9.0, 9.0, 9.0),
            spline_end_tangent: Vec3::new(3.0, 3.0, 3.0),
            draw_world_coord_arrows: false,
            draw_model_coord_arrows: false,
            draw_spline_lines: false,
            ..RenderData::default()
        }
    }

    #[test]
    fn test_reset_restores_defaults_and_clears_flag() {
        let mut data = scrambled();
        data.reset_angles_and_interp = true;

        assert!(data.apply_pending_reset());
        assert!(!data.reset_angles_and_interp);

        assert_eq!(data.rot_x_angle, [0, 0]);
        assert_eq!(data.rot_y_angle, [0, 0]);
        assert_eq!(data.rot_z_angle, [0, 0]);
        assert_eq!(data.interp_value, 0.0);
        assert_eq!(data.spline_start_vertex, DEFAULT_SPLINE_START_VERTEX);
        assert_eq!(data.spline_start_tangent, DEFAULT_SPLINE_START_TANGENT);
        assert_eq!(data.spline_end_vertex, DEFAULT_SPLINE_END_VERTEX);
        assert_eq!(data.spline_end_tangent, DEFAULT_SPLINE_END_TANGENT);
        assert!(data.draw_world_coord_arrows);
        assert!(data.draw_model_coord_arrows);
        assert!(data.draw_spline_lines);
    }

    #[test]
    fn test_reset_fires_once_per_trigger() {
        let mut data = scrambled();
        data.reset_angles_and_interp = true;
        assert!(data.apply_pending_reset());

        // Changes made after the reset survive the following frames
        data.rot_x_angle = [30, 60];
        assert!(!data.apply_pending_reset());
        assert_eq!(data.rot_x_angle, [30, 60]);
    }

    #[test]
    fn test_reset_leaves_camera_alone() {
        let mut data = scrambled();
        data.view_azimuth = 200.0;
        data.field_of_view = 90.0;
        data.reset_angles_and_interp = true;
        data.apply_pending_reset();

        assert_eq!(data.view_azimuth, 200.0);
        assert_eq!(data.field_of_view, 90.0);
    }

    #[test]
    fn test_from_config_copies_camera() {
        let mut config = RendererConfig::default();
        config.camera.view_azimuth = 45.0;
        config.camera.world_position = [1.0, 2.0, 3.0];
        let data = RenderData::from_config(&config, 800, 400);

        assert_eq!(data.view_azimuth, 45.0);
        assert_eq!(data.camera_world_position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(data.aspect_ratio(), 2.0);
    }
}
