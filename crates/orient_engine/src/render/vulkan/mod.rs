//! Vulkan rendering backend
//!
//! RAII wrappers over ash plus [`VkRenderer`], which owns them and records
//! one frame per [`VkRenderer::draw`]. Wrappers hold a cloned device handle
//! and destroy only their own objects; the renderer drops them in reverse
//! order of creation.

pub mod buffer;
pub mod commands;
pub mod context;
pub mod descriptor;
pub mod framebuffer;
pub mod render_pass;
pub mod renderer;
pub mod shader;
pub mod swapchain;
pub mod sync;
pub mod texture;
pub mod ui_painter;
pub mod vertex_layout;
pub mod window;

// Re-export commonly used types
pub use buffer::{Buffer, IndexBuffer, UniformBuffer, VertexBuffer};
pub use commands::{ActiveRenderPass, CommandPool, CommandRecorder};
pub use context::{PhysicalDeviceInfo, VulkanContext, VulkanError, VulkanResult};
pub use descriptor::{DescriptorPool, DescriptorSetLayout, DescriptorSetLayoutBuilder, DescriptorSetWriter};
pub use framebuffer::{DepthBuffer, Framebuffer};
pub use render_pass::RenderPass;
pub use renderer::{Matrices, VkRenderer};
pub use shader::{GraphicsPipeline, PipelineSettings, ShaderModule};
pub use swapchain::{Swapchain, SwapchainLifecycle};
pub use sync::{Fence, FrameSync, Semaphore};
pub use texture::{ImageData, Texture};
pub use ui_painter::UiPainter;
pub use window::{Window, WindowError};
