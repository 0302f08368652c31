//! Control panel overlay
//!
//! One egui window per frame that shows timings and camera state and edits
//! the orientation, spline and animation fields of [`RenderData`] in place.

use egui::{Color32, Context, FullOutput, RawInput, Ui};
use glfw::{Action, Key, MouseButton};

use crate::foundation::math::Vec3;
use crate::render::render_data::{BlendMode, RenderData};

use super::fps::FpsCounter;
use super::input::UiInputProcessor;

/// Field of view slider range in degrees
pub const FIELD_OF_VIEW_RANGE: std::ops::RangeInclusive<f32> = 40.0..=150.0;
/// Euler angle slider range in degrees
pub const ANGLE_RANGE: std::ops::RangeInclusive<i32> = -180..=180;
/// Spline vertex and tangent component range
pub const SPLINE_RANGE: std::ops::RangeInclusive<f32> = -10.0..=10.0;
/// Animation speed slider range
pub const ANIMATION_SPEED_RANGE: std::ops::RangeInclusive<f32> = 0.0..=2.0;

const WINDOW_BACKGROUND_ALPHA: u8 = 204;

/// Manual interpolation is locked while the animation drives the factor
pub fn interp_slider_enabled(data: &RenderData) -> bool {
    !data.play_animation
}

/// The speed only matters while the animation plays
pub fn speed_slider_enabled(data: &RenderData) -> bool {
    data.play_animation
}

/// egui context plus the input gathered since the last frame
pub struct UserInterface {
    context: Context,
    input: UiInputProcessor,
    fps: FpsCounter,
    pixels_per_point: f32,
}

impl Default for UserInterface {
    fn default() -> Self {
        Self::new()
    }
}

impl UserInterface {
    /// Create the overlay with the dark style
    pub fn new() -> Self {
        let context = Context::default();
        context.set_visuals(egui::Visuals::dark());
        Self {
            context,
            input: UiInputProcessor::new(),
            fps: FpsCounter::new(),
            pixels_per_point: 1.0,
        }
    }

    /// Framebuffer pixels per window coordinate.
    ///
    /// Cursor positions arrive in window coordinates, which egui treats as
    /// points; the panel is laid out in points and scaled by this factor.
    pub fn set_pixels_per_point(&mut self, pixels_per_point: f32) {
        if pixels_per_point.is_finite() && pixels_per_point > 0.0 {
            self.pixels_per_point = pixels_per_point;
        }
    }

    /// egui context, used for tessellation
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Smoothed frame rate shown in the panel
    pub fn frames_per_second(&self) -> f32 {
        self.fps.value()
    }

    /// Whether the overlay uses the pointer (hovered or dragging)
    pub fn wants_pointer(&self) -> bool {
        self.context.wants_pointer_input() || self.context.is_pointer_over_area()
    }

    /// Whether a text field of the overlay has keyboard focus
    pub fn wants_keyboard(&self) -> bool {
        self.context.wants_keyboard_input()
    }

    /// Forward a key event
    pub fn on_key(&mut self, key: Key, action: Action, mods: glfw::Modifiers) {
        self.input.key(key, action, mods);
    }

    /// Forward a typed character
    pub fn on_char(&mut self, character: char) {
        self.input.char(character);
    }

    /// Forward a mouse button event
    pub fn on_mouse_button(&mut self, button: MouseButton, action: Action, mods: glfw::Modifiers) {
        self.input.mouse_button(button, action, mods);
    }

    /// Forward a cursor position
    pub fn on_cursor_position(&mut self, x: f64, y: f64) {
        self.input.cursor_position(x, y);
    }

    /// Forward a scroll wheel event
    pub fn on_scroll(&mut self, x_offset: f64, y_offset: f64) {
        self.input.scroll(x_offset, y_offset);
    }

    /// Build the overlay for this frame.
    ///
    /// `time` is the tick time in seconds. The returned output carries the
    /// shapes and texture changes for the painter.
    pub fn create_frame(&mut self, data: &mut RenderData, time: f64) -> FullOutput {
        let mut raw_input = RawInput {
            screen_rect: Some(egui::Rect::from_min_size(
                egui::Pos2::ZERO,
                egui::vec2(data.width as f32, data.height as f32) / self.pixels_per_point,
            )),
            time: Some(time),
            modifiers: self.input.modifiers(),
            events: self.input.drain(),
            ..RawInput::default()
        };
        raw_input
            .viewports
            .entry(raw_input.viewport_id)
            .or_default()
            .native_pixels_per_point = Some(self.pixels_per_point);

        let fps = self.fps.update(data.timings.frame_time);
        self.context.run(raw_input, |ctx| control_window(ctx, data, fps))
    }
}

fn control_window(ctx: &Context, data: &mut RenderData, fps: f32) {
    let frame = egui::Frame::window(&ctx.style()).fill(Color32::from_black_alpha(WINDOW_BACKGROUND_ALPHA));

    egui::Window::new("Control").frame(frame).show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.label("FPS:");
            ui.label(format!("{fps:.1}"));
        });

        egui::CollapsingHeader::new("Info").show(ui, |ui| {
            ui.label(format!("Triangles: {}", data.triangle_count));
            ui.label(format!("Window Dimensions: {}x{}", data.width, data.height));
        });

        egui::CollapsingHeader::new("Timers").show(ui, |ui| timers_section(ui, data));
        egui::CollapsingHeader::new("Camera").show(ui, |ui| camera_section(ui, data));
        egui::CollapsingHeader::new("Angles")
            .default_open(true)
            .show(ui, |ui| angles_section(ui, data));
        egui::CollapsingHeader::new("Spline").show(ui, |ui| spline_section(ui, data));
        egui::CollapsingHeader::new("Interpolation")
            .default_open(true)
            .show(ui, |ui| interpolation_section(ui, data));
        egui::CollapsingHeader::new("Drawing").show(ui, |ui| {
            ui.checkbox(&mut data.draw_world_coord_arrows, "Draw World Coordinate Arrows");
            ui.checkbox(&mut data.draw_model_coord_arrows, "Draw Model Coordinate Arrows");
            ui.checkbox(&mut data.draw_spline_lines, "Draw Spline Lines");
        });
    });
}

fn timers_section(ui: &mut Ui, data: &RenderData) {
    let timings = &data.timings;
    for (label, value) in [
        ("Frame Time", timings.frame_time),
        ("Model Upload Time", timings.upload_to_vbo_time),
        ("Matrix Generation Time", timings.matrix_generate_time),
        ("Matrix Upload Time", timings.upload_to_ubo_time),
        ("UI Generation Time", timings.ui_generate_time),
        ("UI Draw Time", timings.ui_draw_time),
    ] {
        ui.label(format!("{label}: {value:.3} ms"));
    }
}

fn camera_section(ui: &mut Ui, data: &mut RenderData) {
    let position = data.camera_world_position;
    ui.label(format!("Camera Position: {:.2}/{:.2}/{:.2}", position.x, position.y, position.z));
    ui.label(format!("View Azimuth: {:.1}", data.view_azimuth));
    ui.label(format!("View Elevation: {:.1}", data.view_elevation));
    ui.add(egui::Slider::new(&mut data.field_of_view, FIELD_OF_VIEW_RANGE).text("Field of View"));
}

fn angles_section(ui: &mut Ui, data: &mut RenderData) {
    for (index, title) in ["Start", "End"].into_iter().enumerate() {
        ui.label(format!("{title} Orientation"));
        ui.add(egui::Slider::new(&mut data.rot_x_angle[index], ANGLE_RANGE).text("X"));
        ui.add(egui::Slider::new(&mut data.rot_y_angle[index], ANGLE_RANGE).text("Y"));
        ui.add(egui::Slider::new(&mut data.rot_z_angle[index], ANGLE_RANGE).text("Z"));
    }
}

fn spline_section(ui: &mut Ui, data: &mut RenderData) {
    vector_editor(ui, "Start Vertex", &mut data.spline_start_vertex);
    vector_editor(ui, "Start Tangent", &mut data.spline_start_tangent);
    vector_editor(ui, "End Vertex", &mut data.spline_end_vertex);
    vector_editor(ui, "End Tangent", &mut data.spline_end_tangent);
}

fn vector_editor(ui: &mut Ui, label: &str, value: &mut Vec3) {
    ui.horizontal(|ui| {
        ui.label(label);
        for component in value.iter_mut() {
            ui.add(egui::DragValue::new(component).speed(0.1).clamp_range(SPLINE_RANGE));
        }
    });
}

fn interpolation_section(ui: &mut Ui, data: &mut RenderData) {
    ui.add_enabled(
        interp_slider_enabled(data),
        egui::Slider::new(&mut data.interp_value, 0.0..=1.0).text("Interpolation"),
    );

    ui.checkbox(&mut data.play_animation, "Play Animation");
    ui.add_enabled(
        speed_slider_enabled(data),
        egui::Slider::new(&mut data.animation_speed, ANIMATION_SPEED_RANGE).text("Speed"),
    );
    ui.checkbox(&mut data.animation_backward, "Backward");

    ui.horizontal(|ui| {
        ui.radio_value(&mut data.blend_mode, BlendMode::Slerp, "Slerp");
        ui.radio_value(&mut data.blend_mode, BlendMode::Nlerp, "Nlerp");
    });

    if ui.button("Reset Angles and Interpolation").clicked() {
        data.reset_angles_and_interp = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sized_data() -> RenderData {
        RenderData {
            width: 1280,
            height: 720,
            ..RenderData::default()
        }
    }

    #[test]
    fn test_interp_and_speed_sliders_are_exclusive() {
        let mut data = RenderData::default();
        assert!(interp_slider_enabled(&data));
        assert!(!speed_slider_enabled(&data));

        data.play_animation = true;
        assert!(!interp_slider_enabled(&data));
        assert!(speed_slider_enabled(&data));
    }

    #[test]
    fn test_headless_frame_produces_shapes_and_font_texture() {
        let mut ui = UserInterface::new();
        let mut data = sized_data();

        let first = ui.create_frame(&mut data, 0.0);
        assert!(!first.textures_delta.set.is_empty());

        // windows may fade in over the first frames
        let mut output = first;
        for frame in 1..=10 {
            output = ui.create_frame(&mut data, f64::from(frame) * 0.1);
        }
        assert!(!output.shapes.is_empty());
    }

    #[test]
    fn test_frame_leaves_data_untouched_without_input() {
        let mut ui = UserInterface::new();
        let mut data = sized_data();
        let before = data.clone();

        ui.create_frame(&mut data, 0.0);
        ui.create_frame(&mut data, 0.016);

        assert_eq!(data, before);
    }

    #[test]
    fn test_fps_is_smoothed_per_frame() {
        let mut ui = UserInterface::new();
        let mut data = sized_data();
        data.timings.frame_time = 10.0;

        ui.create_frame(&mut data, 0.0);
        assert!((ui.frames_per_second() - 4.0).abs() < 1e-3);
    }

    #[test]
    fn test_pointer_far_from_window_is_not_claimed() {
        let mut ui = UserInterface::new();
        let mut data = sized_data();
        ui.create_frame(&mut data, 0.0);

        ui.on_cursor_position(1270.0, 710.0);
        ui.create_frame(&mut data, 0.016);

        assert!(!ui.wants_pointer());
        assert!(!ui.wants_keyboard());
    }

    #[test]
    fn test_scaled_framebuffer_lays_out_in_window_coordinates() {
        let mut ui = UserInterface::new();
        ui.set_pixels_per_point(2.0);
        let mut data = RenderData {
            width: 2560,
            height: 1440,
            ..RenderData::default()
        };

        let output = ui.create_frame(&mut data, 0.0);
        assert_eq!(output.pixels_per_point, 2.0);
        assert_eq!(ui.context().screen_rect().size(), egui::vec2(1280.0, 720.0));

        let panel = ui
            .context()
            .memory(|memory| memory.area_rect(egui::Id::new("Control")))
            .unwrap();
        let center = panel.center();
        ui.on_cursor_position(f64::from(center.x), f64::from(center.y));
        ui.create_frame(&mut data, 0.016);
        assert!(ui.wants_pointer());

        ui.on_cursor_position(1270.0, 710.0);
        ui.create_frame(&mut data, 0.032);
        assert!(!ui.wants_pointer());
    }

    #[test]
    fn test_invalid_scale_is_ignored() {
        let mut ui = UserInterface::new();
        ui.set_pixels_per_point(0.0);
        ui.set_pixels_per_point(f32::NAN);
        let mut data = sized_data();

        let output = ui.create_frame(&mut data, 0.0);
        assert_eq!(output.pixels_per_point, 1.0);
    }
}
