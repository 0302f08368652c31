//! Debug overlay
//!
//! egui builds the control panel; the Vulkan painter in
//! `render::vulkan::ui_painter` draws the tessellated output.

mod fps;
mod input;
mod overlay;

pub use fps::{FpsCounter, FPS_AVERAGING_ALPHA};
pub use input::UiInputProcessor;
pub use overlay::{interp_slider_enabled, speed_slider_enabled, UserInterface};
