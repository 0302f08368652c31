//! Per-frame scene assembly
//!
//! Builds the orientation quaternions from the Euler angles in
//! [`RenderData`], evaluates the spline position and concatenates all
//! frame geometry into one vertex list. Line geometry comes first so a
//! single vertex buffer serves both draw calls: lines from offset 0, the
//! model triangles right after them.

use crate::foundation::math::{self, utils, Quat, Vec3};
use crate::render::mesh::Mesh;
use crate::render::models::{ArrowModel, CoordArrowsModel, CubeModel, SplineModel};
use crate::render::render_data::{BlendMode, RenderData};

/// Color of the start orientation arrow
pub const START_ARROW_COLOR: Vec3 = Vec3::new(0.0, 0.8, 0.8);
/// Color of the end orientation arrow
pub const END_ARROW_COLOR: Vec3 = Vec3::new(0.8, 0.8, 0.0);
/// World axes are drawn at this fraction of their color
pub const WORLD_ARROW_DIMMING: f32 = 0.5;

/// Start, end and blended orientation of one frame
#[derive(Debug, Clone, PartialEq)]
pub struct OrientationState {
    /// Start orientation from the first angle set
    pub start: Quat,
    /// End orientation from the second angle set
    pub end: Quat,
    /// Conjugate of `start`
    pub start_conjugate: Quat,
    /// Conjugate of `end`
    pub end_conjugate: Quat,
    /// Blend of start and end by the interpolation factor
    pub mix: Quat,
    /// Conjugate of `mix`
    pub mix_conjugate: Quat,
}

impl OrientationState {
    /// Build the orientations from the Euler angles (degrees) in `data`
    pub fn from_render_data(data: &RenderData) -> Self {
        let orientation = |i: usize| {
            let angles = Vec3::new(
                utils::deg_to_rad(data.rot_x_angle[i] as f32),
                utils::deg_to_rad(data.rot_y_angle[i] as f32),
                utils::deg_to_rad(data.rot_z_angle[i] as f32),
            );
            math::quat_from_euler(angles)
        };

        let start = orientation(0);
        let end = orientation(1);
        let t = data.interp_value.clamp(0.0, 1.0);
        let mix = match data.blend_mode {
            BlendMode::Slerp => math::slerp(&start, &end, t),
            BlendMode::Nlerp => math::nlerp(&start, &end, t),
        };

        Self {
            start_conjugate: math::conjugate(&start),
            end_conjugate: math::conjugate(&end),
            mix_conjugate: math::conjugate(&mix),
            start,
            end,
            mix,
        }
    }
}

/// Spline position for the current interpolation factor
pub fn interpolated_position(data: &RenderData) -> Vec3 {
    math::hermite(
        &data.spline_start_vertex,
        &data.spline_start_tangent,
        &data.spline_end_vertex,
        &data.spline_end_tangent,
        data.interp_value.clamp(0.0, 1.0),
    )
}

/// One forward and one backward sweep of the interpolation factor
const ANIMATION_PERIOD: f32 = 2.0;

/// Advance the interpolation factor while auto-play is on.
///
/// The factor follows a 0 -> 1 -> 0 triangle wave. The phase on that wave
/// is advanced by the whole step, so any number of reflections within one
/// frame keeps the factor and the direction in step.
pub fn advance_animation(data: &mut RenderData) {
    if !data.play_animation {
        return;
    }

    let value = data.interp_value.clamp(0.0, 1.0);
    let phase = if data.animation_backward { ANIMATION_PERIOD - value } else { value };
    let step = data.tick_diff * data.animation_speed;
    let phase = (phase + step).rem_euclid(ANIMATION_PERIOD);

    if phase < 1.0 {
        data.interp_value = phase;
        data.animation_backward = false;
    } else {
        data.interp_value = ANIMATION_PERIOD - phase;
        data.animation_backward = true;
    }
}

/// Vertex counts of the assembled frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Vertices drawn as lines, starting at offset 0
    pub line_vertex_count: u32,
    /// Vertices of the model, starting at `line_vertex_count`
    pub model_vertex_count: u32,
}

impl FrameStats {
    /// Triangles of the model
    pub fn triangle_count(&self) -> u32 {
        self.model_vertex_count / 3
    }
}

/// Owns the procedural models and the combined vertex list of a frame
#[derive(Debug, Clone, Default)]
pub struct SceneBuilder {
    coord_arrows: CoordArrowsModel,
    arrow: ArrowModel,
    spline: SplineModel,
    model: CubeModel,
    all_meshes: Mesh,
    orientation: Option<OrientationState>,
}

impl SceneBuilder {
    /// Create a builder with the default models
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble the geometry of one frame.
    ///
    /// Applies a pending reset, advances auto-play, rebuilds the
    /// orientations and concatenates world axes, orientation arrows, spline
    /// and model. Updates `data.triangle_count`.
    pub fn build(&mut self, data: &mut RenderData) -> FrameStats {
        data.apply_pending_reset();
        advance_animation(data);

        let orientation = OrientationState::from_render_data(data);
        let position = interpolated_position(data);

        self.all_meshes.clear();

        if data.draw_world_coord_arrows {
            let mut axes = self.coord_arrows.vertex_data();
            axes.scale_colors(WORLD_ARROW_DIMMING);
            self.all_meshes.append(&axes);
        }

        if data.draw_model_coord_arrows {
            let mut start_arrow = self.arrow.vertex_data();
            start_arrow.set_color(START_ARROW_COLOR);
            start_arrow.rotate_translate(&orientation.start, &orientation.start_conjugate, &data.spline_start_vertex);
            self.all_meshes.append(&start_arrow);

            let mut end_arrow = self.arrow.vertex_data();
            end_arrow.set_color(END_ARROW_COLOR);
            end_arrow.rotate_translate(&orientation.end, &orientation.end_conjugate, &data.spline_end_vertex);
            self.all_meshes.append(&end_arrow);

            let mut mix_arrow = self.arrow.vertex_data();
            mix_arrow.rotate_translate(&orientation.mix, &orientation.mix_conjugate, &position);
            self.all_meshes.append(&mix_arrow);
        }

        if data.draw_spline_lines {
            let spline = self.spline.create_vertex_data(
                SplineModel::DEFAULT_SEGMENTS,
                &data.spline_start_vertex,
                &data.spline_start_tangent,
                &data.spline_end_vertex,
                &data.spline_end_tangent,
            );
            self.all_meshes.append(&spline);
        }

        let line_vertex_count = self.all_meshes.len() as u32;

        let mut model = self.model.vertex_data();
        model.rotate_translate(&orientation.mix, &orientation.mix_conjugate, &position);
        self.all_meshes.append(&model);

        let stats = FrameStats {
            line_vertex_count,
            model_vertex_count: model.len() as u32,
        };
        data.triangle_count = stats.triangle_count();
        self.orientation = Some(orientation);
        stats
    }

    /// Combined vertex list of the last built frame
    pub fn vertices(&self) -> &Mesh {
        &self.all_meshes
    }

    /// Orientations of the last built frame
    pub fn orientation(&self) -> Option<&OrientationState> {
        self.orientation.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    fn assert_same_rotation(a: &Quat, b: &Quat) {
        assert_relative_eq!(a.quaternion().dot(b.quaternion()).abs(), 1.0, epsilon = EPSILON);
    }

    fn angled_data(interp_value: f32) -> RenderData {
        RenderData {
            rot_x_angle: [10, -40],
            rot_y_angle: [0, 90],
            rot_z_angle: [-30, 45],
            interp_value,
            ..RenderData::default()
        }
    }

    #[test]
    fn test_mix_matches_start_and_end_at_extremes() {
        let at_start = OrientationState::from_render_data(&angled_data(0.0));
        assert_same_rotation(&at_start.mix, &at_start.start);

        let at_end = OrientationState::from_render_data(&angled_data(1.0));
        assert_same_rotation(&at_end.mix, &at_end.end);
    }

    #[test]
    fn test_conjugates_invert_orientations() {
        let state = OrientationState::from_render_data(&angled_data(0.5));
        assert_same_rotation(&(state.start * state.start_conjugate), &Quat::identity());
        assert_same_rotation(&(state.end * state.end_conjugate), &Quat::identity());
        assert_same_rotation(&(state.mix * state.mix_conjugate), &Quat::identity());
    }

    #[test]
    fn test_model_is_rotated_with_stored_conjugate() {
        let mut builder = SceneBuilder::new();
        let mut data = RenderData {
            draw_world_coord_arrows: false,
            draw_model_coord_arrows: false,
            draw_spline_lines: false,
            ..angled_data(0.5)
        };
        builder.build(&mut data);

        let orientation = builder.orientation().unwrap();
        let mut expected = CubeModel::default().vertex_data();
        expected.rotate_translate(&orientation.mix, &orientation.mix_conjugate, &interpolated_position(&data));
        for (built, reference) in builder.vertices().vertices.iter().zip(&expected.vertices) {
            assert_relative_eq!(built.position(), reference.position(), epsilon = EPSILON);
        }
    }

    #[test]
    fn test_position_follows_spline_endpoints() {
        let data = angled_data(0.0);
        assert_relative_eq!(interpolated_position(&data), data.spline_start_vertex);

        let data = angled_data(1.0);
        assert_relative_eq!(interpolated_position(&data), data.spline_end_vertex, epsilon = EPSILON);
    }

    #[test]
    fn test_frame_layout_puts_lines_before_model() {
        let mut builder = SceneBuilder::new();
        let mut data = RenderData::default();

        let stats = builder.build(&mut data);

        // 30 axis vertices, 3 arrows of 10, 25 spline segments of 2
        assert_eq!(stats.line_vertex_count, 30 + 30 + 50);
        assert_eq!(stats.model_vertex_count, 36);
        assert_eq!(data.triangle_count, 12);
        assert_eq!(builder.vertices().len() as u32, stats.line_vertex_count + stats.model_vertex_count);
    }

    #[test]
    fn test_toggles_remove_line_geometry() {
        let mut builder = SceneBuilder::new();
        let mut data = RenderData {
            draw_world_coord_arrows: false,
            draw_model_coord_arrows: false,
            draw_spline_lines: false,
            ..RenderData::default()
        };

        let stats = builder.build(&mut data);

        assert_eq!(stats.line_vertex_count, 0);
        assert_eq!(builder.vertices().len(), 36);
    }

    #[test]
    fn test_world_arrows_are_dimmed() {
        let mut builder = SceneBuilder::new();
        let mut data = RenderData::default();
        builder.build(&mut data);

        assert_eq!(builder.vertices().vertices[0].color, [0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_arrows_are_placed_at_spline_points() {
        let mut builder = SceneBuilder::new();
        let mut data = RenderData {
            draw_world_coord_arrows: false,
            draw_spline_lines: false,
            ..RenderData::default()
        };
        builder.build(&mut data);
        let vertices = &builder.vertices().vertices;

        // each arrow starts at its origin, which lands on the translation
        assert_relative_eq!(vertices[0].position(), data.spline_start_vertex, epsilon = EPSILON);
        assert_eq!(vertices[0].color(), START_ARROW_COLOR);
        assert_relative_eq!(vertices[10].position(), data.spline_end_vertex, epsilon = EPSILON);
        assert_eq!(vertices[10].color(), END_ARROW_COLOR);
        assert_relative_eq!(vertices[20].position(), interpolated_position(&data), epsilon = EPSILON);
    }

    #[test]
    fn test_arrow_tip_follows_orientation() {
        let mut builder = SceneBuilder::new();
        let mut data = RenderData {
            draw_world_coord_arrows: false,
            draw_spline_lines: false,
            rot_y_angle: [90, 0],
            ..RenderData::default()
        };
        builder.build(&mut data);

        // +X rotated 90 degrees about Y points along -Z
        let tip = builder.vertices().vertices[1].position() - data.spline_start_vertex;
        assert_relative_eq!(tip, Vec3::new(0.0, 0.0, -1.0), epsilon = EPSILON);
    }

    #[test]
    fn test_build_consumes_reset_request() {
        let mut builder = SceneBuilder::new();
        let mut data = angled_data(0.6);
        data.reset_angles_and_interp = true;

        builder.build(&mut data);

        assert!(!data.reset_angles_and_interp);
        assert_eq!(data.interp_value, 0.0);
        let orientation = builder.orientation().unwrap();
        assert_same_rotation(&orientation.start, &Quat::identity());
    }

    #[test]
    fn test_animation_ping_pongs() {
        let mut data = RenderData {
            play_animation: true,
            animation_speed: 1.0,
            interp_value: 0.9,
            tick_diff: 0.3,
            ..RenderData::default()
        };

        advance_animation(&mut data);
        assert_relative_eq!(data.interp_value, 0.8, epsilon = EPSILON);
        assert!(data.animation_backward);

        data.tick_diff = 1.0;
        advance_animation(&mut data);
        assert_relative_eq!(data.interp_value, 0.2, epsilon = EPSILON);
        assert!(!data.animation_backward);
    }

    #[test]
    fn test_animation_survives_steps_longer_than_a_sweep() {
        let mut data = RenderData {
            play_animation: true,
            animation_speed: 2.0,
            interp_value: 0.9,
            tick_diff: 1.0,
            ..RenderData::default()
        };

        // a full period returns to the same point and direction
        advance_animation(&mut data);
        assert_relative_eq!(data.interp_value, 0.9, epsilon = EPSILON);
        assert!(!data.animation_backward);

        data.tick_diff = 0.15;
        advance_animation(&mut data);
        assert_relative_eq!(data.interp_value, 0.8, epsilon = EPSILON);
        assert!(data.animation_backward);

        // backward from 0.8 by 2.6: down to 0, up to 1, down to 0.2
        data.tick_diff = 1.3;
        advance_animation(&mut data);
        assert_relative_eq!(data.interp_value, 0.2, epsilon = EPSILON);
        assert!(data.animation_backward);
    }

    #[test]
    fn test_paused_animation_keeps_factor() {
        let mut data = RenderData {
            interp_value: 0.4,
            tick_diff: 1.0,
            ..RenderData::default()
        };
        advance_animation(&mut data);
        assert_eq!(data.interp_value, 0.4);
    }
}
