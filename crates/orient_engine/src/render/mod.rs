//! # Rendering
//!
//! CPU-side frame preparation and the Vulkan backend that draws it.
//!
//! - **RenderData**: shared state the overlay, input handlers and scene read and write
//! - **Camera**: view and projection matrices from azimuth/elevation angles
//! - **Scene**: per-frame orientation blending, spline placement and vertex assembly
//! - **Vulkan**: RAII resource wrappers and [`VkRenderer`]

pub mod camera;
pub mod mesh;
pub mod models;
pub mod render_data;
pub mod scene;
pub mod vulkan;

pub use camera::Camera;
pub use mesh::{Mesh, Vertex};
pub use render_data::{BlendMode, FrameTimings, RenderData};
pub use scene::{FrameStats, OrientationState, SceneBuilder};
pub use vulkan::{VkRenderer, VulkanError, VulkanResult, Window};
