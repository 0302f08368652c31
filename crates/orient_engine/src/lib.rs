//! # Orient Engine
//!
//! A Vulkan renderer that blends two orientations with quaternion slerp
//! while moving a model along a cubic Hermite spline.
//!
//! ## Features
//!
//! - **Orientation blending**: Euler angles to quaternions, slerp or nlerp by an interpolation factor
//! - **Spline motion**: Hermite curve between two editable vertices and tangents
//! - **Camera**: mouse-look and WASD/QE movement
//! - **Debug overlay**: egui panel painted by a custom Vulkan pipeline
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use orient_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RendererConfig::default();
//!     let window = Window::new(&config.window)?;
//!     let mut renderer = VkRenderer::init(window, &config)?;
//!
//!     while !renderer.should_close() {
//!         for event in renderer.poll_events() {
//!             renderer.handle_window_event(event);
//!         }
//!         if !renderer.draw()? {
//!             break;
//!         }
//!     }
//!     renderer.cleanup();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod input;
pub mod render;
pub mod ui;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, RendererConfig},
        foundation::{
            math::{Mat4, Quat, Vec3},
            time::{Stopwatch, Timer},
        },
        render::{
            vulkan::{VkRenderer, VulkanError, VulkanResult, Window},
            BlendMode, Camera, RenderData,
        },
        ui::UserInterface,
    };
}
