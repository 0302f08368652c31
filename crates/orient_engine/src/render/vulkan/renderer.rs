//! Frame orchestration
//!
//! [`VkRenderer`] owns the window, the Vulkan context and every GPU resource,
//! together with the CPU-side state the overlay and input handlers mutate.
//! One call to [`VkRenderer::draw`] renders and presents one frame.

use ash::vk;
use bytemuck::{Pod, Zeroable};
use glfw::{Action, Key, Modifiers, MouseButton, WindowEvent};

use crate::config::{RendererConfig, ShaderConfig};
use crate::foundation::time::{Stopwatch, Timer};
use crate::input::{MouseLook, MovementKeys};
use crate::render::camera::Camera;
use crate::render::render_data::{aspect_ratio, RenderData};
use crate::render::scene::SceneBuilder;
use crate::render::vulkan::buffer::{UniformBuffer, VertexBuffer};
use crate::render::vulkan::commands::{CommandPool, CommandRecorder};
use crate::render::vulkan::descriptor::{
    DescriptorPool, DescriptorSetLayout, DescriptorSetLayoutBuilder, DescriptorSetWriter,
};
use crate::render::vulkan::framebuffer::{DepthBuffer, Framebuffer};
use crate::render::vulkan::render_pass::RenderPass;
use crate::render::vulkan::shader::{GraphicsPipeline, PipelineSettings, ShaderModule, VertexInput};
use crate::render::vulkan::swapchain::{Swapchain, SwapchainLifecycle};
use crate::render::vulkan::sync::FrameSync;
use crate::render::vulkan::texture::{ImageData, Texture};
use crate::render::vulkan::ui_painter::UiPainter;
use crate::render::vulkan::vertex_layout::SceneVertexLayout;
use crate::render::vulkan::window::Window;
use crate::render::vulkan::{VulkanContext, VulkanError, VulkanResult};
use crate::ui::UserInterface;

/// Line width when the device supports wide lines
pub const WIDE_LINE_WIDTH: f32 = 3.0;

/// View and projection matrices as laid out in the `Matrices` uniform block
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Matrices {
    /// World to view, column-major
    pub view: [[f32; 4]; 4],
    /// View to clip, column-major
    pub projection: [[f32; 4]; 4],
}

/// Viewport of the scene pipelines.
///
/// Starts at the bottom edge with a negative height so +Y points up in
/// clip space, like the projection expects.
pub fn scene_viewport(extent: vk::Extent2D) -> vk::Viewport {
    vk::Viewport {
        x: 0.0,
        y: extent.height as f32,
        width: extent.width as f32,
        height: -(extent.height as f32),
        min_depth: 0.0,
        max_depth: 1.0,
    }
}

/// Width used for the line pipeline
pub fn line_width(wide_lines_supported: bool, max_line_width: f32) -> f32 {
    if wide_lines_supported {
        WIDE_LINE_WIDTH.min(max_line_width).max(1.0)
    } else {
        1.0
    }
}

/// Decide from a present result whether the swapchain must be rebuilt.
///
/// Out-of-date, suboptimal and a pending resize all ask for recreation; any
/// other error is returned.
pub fn present_needs_recreation(result: Result<bool, vk::Result>, resize_pending: bool) -> VulkanResult<bool> {
    match result {
        Ok(suboptimal) => Ok(suboptimal || resize_pending),
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(true),
        Err(e) => Err(VulkanError::Api(e)),
    }
}

/// Vulkan renderer of the orientation scene and its overlay.
///
/// Fields drop top to bottom: CPU state, then GPU resources in reverse order
/// of creation, then the context, then the window whose surface it uses.
pub struct VkRenderer {
    render_data: RenderData,
    camera: Camera,
    scene: SceneBuilder,
    user_interface: UserInterface,
    mouse_look: MouseLook,
    timer: Timer,
    frame_stopwatch: Stopwatch,
    phase_stopwatch: Stopwatch,
    lifecycle: SwapchainLifecycle,
    resize_pending: bool,
    line_width: f32,
    clear_color: [f32; 4],

    ui_painter: UiPainter,
    basic_pipeline: GraphicsPipeline,
    line_pipeline: GraphicsPipeline,
    descriptor_sets: [vk::DescriptorSet; 2],
    _descriptor_pool: DescriptorPool,
    uniform_buffer: UniformBuffer<Matrices>,
    _texture: Texture,
    vertex_buffer: VertexBuffer,
    _matrices_layout: DescriptorSetLayout,
    _texture_layout: DescriptorSetLayout,
    frame_sync: FrameSync,
    command_buffer: vk::CommandBuffer,
    command_pool: CommandPool,
    framebuffers: Vec<Framebuffer>,
    depth_buffer: Option<DepthBuffer>,
    render_pass: RenderPass,
    swapchain: Swapchain,
    context: VulkanContext,
    window: Window,
}

impl VkRenderer {
    /// Create the Vulkan context and all resources for `window`.
    ///
    /// The initial viewport size is the window's framebuffer size.
    pub fn init(mut window: Window, config: &RendererConfig) -> VulkanResult<Self> {
        config.validate()?;
        config.shaders.validate()?;

        let context = VulkanContext::new(&mut window, config)?;
        window.set_title(&format!(
            "{} ({})",
            config.application_name,
            context.physical_device().name()
        ));

        let (width, height) = window.framebuffer_size();
        let swapchain = Swapchain::new(
            &context,
            vk::Extent2D {
                width: width.max(1),
                height: height.max(1),
            },
            vk::SwapchainKHR::null(),
        )?;
        let extent = swapchain.extent();

        let render_pass = RenderPass::new_forward_pass(context.raw_device(), swapchain.format().format)?;
        let depth_buffer = DepthBuffer::new(&context, extent)?;
        let framebuffers = Framebuffer::for_swapchain(
            context.device(),
            render_pass.handle(),
            swapchain.image_views(),
            depth_buffer.image_view(),
            extent,
        )?;

        let command_pool = CommandPool::new(context.raw_device(), context.graphics_queue_family())?;
        let command_buffer = command_pool.allocate_command_buffer()?;
        let frame_sync = FrameSync::new(context.raw_device())?;

        let texture_layout = DescriptorSetLayoutBuilder::new()
            .add_combined_image_sampler(0, vk::ShaderStageFlags::FRAGMENT)
            .build(context.device())?;
        let matrices_layout = DescriptorSetLayoutBuilder::new()
            .add_uniform_buffer(0, vk::ShaderStageFlags::VERTEX)
            .build(context.device())?;

        let image = ImageData::load_or_checkerboard(&config.texture_path);
        let texture = Texture::new(
            &context,
            &command_pool,
            &image,
            vk::Format::R8G8B8A8_SRGB,
            vk::SamplerAddressMode::REPEAT,
        )?;
        let uniform_buffer = UniformBuffer::<Matrices>::new(&context)?;

        let descriptor_pool = DescriptorPool::new(
            context.raw_device(),
            2,
            &[
                (vk::DescriptorType::COMBINED_IMAGE_SAMPLER, 1),
                (vk::DescriptorType::UNIFORM_BUFFER, 1),
            ],
        )?;
        let set_layouts = [texture_layout.handle(), matrices_layout.handle()];
        let descriptor_sets: [vk::DescriptorSet; 2] = descriptor_pool
            .allocate(&set_layouts)?
            .try_into()
            .map_err(|_| VulkanError::InvalidOperation {
                reason: "Expected two scene descriptor sets".to_string(),
            })?;

        DescriptorSetWriter::new()
            .write_image(descriptor_sets[0], 0, texture.image_view(), texture.sampler())
            .write_buffer(descriptor_sets[1], 0, uniform_buffer.handle(), uniform_buffer.size())
            .update(context.device());

        let basic_pipeline = create_scene_pipeline(
            &context,
            render_pass.handle(),
            &config.shaders.basic,
            &set_layouts,
            PipelineSettings::triangles(),
        )?;
        let line_pipeline = create_scene_pipeline(
            &context,
            render_pass.handle(),
            &config.shaders.line,
            &set_layouts,
            PipelineSettings::lines(),
        )?;
        let ui_painter = UiPainter::new(&context, render_pass.handle(), &config.shaders.ui)?;

        let physical_device = context.physical_device();
        let line_width = line_width(
            physical_device.supports_wide_lines(),
            physical_device.properties.limits.line_width_range[1],
        );
        if line_width < WIDE_LINE_WIDTH {
            log::warn!("Wide lines unavailable, drawing lines {line_width} px wide");
        }

        let lifecycle = SwapchainLifecycle::default().initialize()?;
        let timer = Timer::new();

        log::info!(
            "Renderer initialized: {}x{}, {} swapchain images",
            extent.width,
            extent.height,
            swapchain.image_count()
        );

        Ok(Self {
            render_data: RenderData::from_config(config, extent.width, extent.height),
            camera: Camera::new(),
            scene: SceneBuilder::new(),
            user_interface: UserInterface::new(),
            mouse_look: MouseLook::new(),
            timer,
            frame_stopwatch: Stopwatch::start_new(),
            phase_stopwatch: Stopwatch::new(),
            lifecycle,
            resize_pending: false,
            line_width,
            clear_color: config.clear_color,
            ui_painter,
            basic_pipeline,
            line_pipeline,
            descriptor_sets,
            _descriptor_pool: descriptor_pool,
            uniform_buffer,
            _texture: texture,
            vertex_buffer: VertexBuffer::new(),
            _matrices_layout: matrices_layout,
            _texture_layout: texture_layout,
            frame_sync,
            command_buffer,
            command_pool,
            framebuffers,
            depth_buffer: Some(depth_buffer),
            render_pass,
            swapchain,
            context,
            window,
        })
    }

    /// Whether the window asked to close
    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    /// Poll the window and return the events received since the last call
    pub fn poll_events(&mut self) -> Vec<WindowEvent> {
        self.window.poll_events();
        self.window.flush_events()
    }

    /// Record a new framebuffer size; the swapchain follows after the next
    /// present
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.render_data.width = width;
        self.render_data.height = height;
        self.resize_pending = true;
        log::debug!("Framebuffer resized to {width}x{height}");
    }

    /// Forward a key event to the overlay.
    ///
    /// Movement keys are polled during [`draw`](Self::draw) instead.
    pub fn handle_key_events(&mut self, key: Key, action: Action, mods: Modifiers) {
        self.user_interface.on_key(key, action, mods);
    }

    /// Forward a typed character to the overlay
    pub fn handle_char_events(&mut self, character: char) {
        self.user_interface.on_char(character);
    }

    /// Forward a scroll event to the overlay
    pub fn handle_scroll_events(&mut self, x_offset: f64, y_offset: f64) {
        self.user_interface.on_scroll(x_offset, y_offset);
    }

    /// Offer a mouse button to the overlay; a right press it does not claim
    /// toggles mouse-look
    pub fn handle_mouse_button_events(&mut self, button: MouseButton, action: Action, mods: Modifiers) {
        self.user_interface.on_mouse_button(button, action, mods);
        if self.user_interface.wants_pointer() && !self.mouse_look.is_locked() {
            return;
        }

        if button == MouseButton::Button2 && action == Action::Press {
            let locked = self.mouse_look.toggle_lock();
            self.window.set_cursor_locked(locked);
            log::debug!("Mouse look {}", if locked { "locked" } else { "released" });
        }
    }

    /// Turn the camera while mouse-look is locked, otherwise offer the
    /// position to the overlay first
    pub fn handle_mouse_position_events(&mut self, x: f64, y: f64) {
        if !self.mouse_look.is_locked() {
            self.user_interface.on_cursor_position(x, y);
            if self.user_interface.wants_pointer() {
                return;
            }
        }
        self.mouse_look.handle_motion(&mut self.render_data, x, y);
    }

    /// Route one window event to the matching handler
    pub fn handle_window_event(&mut self, event: WindowEvent) {
        match event {
            WindowEvent::FramebufferSize(width, height) => {
                self.set_size(width.max(0) as u32, height.max(0) as u32);
            }
            WindowEvent::Key(key, _, action, mods) => self.handle_key_events(key, action, mods),
            WindowEvent::Char(character) => self.handle_char_events(character),
            WindowEvent::MouseButton(button, action, mods) => self.handle_mouse_button_events(button, action, mods),
            WindowEvent::CursorPos(x, y) => self.handle_mouse_position_events(x, y),
            WindowEvent::Scroll(x, y) => self.handle_scroll_events(x, y),
            _ => {}
        }
    }

    /// Render and present one frame.
    ///
    /// Returns `Ok(false)` once the window closed while waiting for a
    /// non-zero framebuffer size.
    pub fn draw(&mut self) -> VulkanResult<bool> {
        let (width, height) = self.window.framebuffer_size();
        if (width == 0 || height == 0) && !self.recreate_swapchain()? {
            return Ok(false);
        }
        if !self.lifecycle.is_usable() {
            return Err(VulkanError::InvalidOperation {
                reason: format!("Swapchain is {:?}", self.lifecycle),
            });
        }

        let (tick_time, tick_diff) = self.timer.advance();
        self.render_data.tick_diff = tick_diff;
        self.render_data.timings.frame_time = self.frame_stopwatch.lap();

        let movement = if self.user_interface.wants_keyboard() {
            MovementKeys::default()
        } else {
            MovementKeys::from_key_state(|key| self.window.is_key_pressed(key))
        };
        movement.apply(&mut self.render_data);

        self.frame_sync.in_flight.wait(u64::MAX)?;
        let image_index = match self
            .swapchain
            .acquire_next_image(self.frame_sync.image_available.handle())
        {
            Ok((index, _)) => index,
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => return self.recreate_swapchain(),
            Err(e) => {
                log::error!("Failed to acquire swapchain image: {e:?}");
                return Err(VulkanError::Api(e));
            }
        };
        self.frame_sync.in_flight.reset()?;

        self.phase_stopwatch.start();
        let extent = self.swapchain.extent();
        let projection = Camera::projection_matrix(&self.render_data, aspect_ratio(extent.width, extent.height));
        let view = self.camera.view_matrix(&mut self.render_data);
        let matrices = Matrices {
            view: view.into(),
            projection: projection.into(),
        };
        self.render_data.timings.matrix_generate_time = self.phase_stopwatch.stop();

        let stats = self.scene.build(&mut self.render_data);

        let mut recorder = CommandRecorder::new(self.command_buffer, self.context.raw_device());
        recorder.begin()?;

        self.phase_stopwatch.start();
        self.vertex_buffer
            .upload(&self.context, self.scene.vertices().as_bytes())?;
        self.render_data.timings.upload_to_vbo_time = self.phase_stopwatch.stop();

        let extent = self.swapchain.extent();
        let framebuffer = self
            .framebuffers
            .get(image_index as usize)
            .map(Framebuffer::handle)
            .ok_or_else(|| VulkanError::InvalidOperation {
                reason: format!("No framebuffer for swapchain image {image_index}"),
            })?;
        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: self.clear_color,
                },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue { depth: 1.0, stencil: 0 },
            },
        ];
        let render_area = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        };

        {
            let mut pass =
                recorder.begin_render_pass(self.render_pass.handle(), framebuffer, render_area, &clear_values)?;
            pass.set_viewport(&scene_viewport(extent));
            pass.set_scissor(&render_area);

            if let Some(vertex_buffer) = self.vertex_buffer.handle() {
                pass.bind_vertex_buffer(vertex_buffer, 0);
                pass.bind_descriptor_sets(self.basic_pipeline.layout(), &self.descriptor_sets);

                if stats.line_vertex_count > 0 {
                    pass.bind_pipeline(self.line_pipeline.handle());
                    pass.set_line_width(self.line_width);
                    pass.draw(stats.line_vertex_count, 0);
                }

                pass.bind_pipeline(self.basic_pipeline.handle());
                pass.draw(stats.triangle_count() * 3, stats.line_vertex_count);
            }

            self.phase_stopwatch.start();
            self.user_interface.set_pixels_per_point(self.window.pixels_per_point());
            let output = self.user_interface.create_frame(&mut self.render_data, tick_time);
            self.render_data.timings.ui_generate_time = self.phase_stopwatch.stop();

            self.ui_painter
                .update_textures(&self.context, &self.command_pool, &output.textures_delta)?;

            self.phase_stopwatch.start();
            let primitives = self
                .user_interface
                .context()
                .tessellate(output.shapes, output.pixels_per_point);
            self.ui_painter
                .paint(&self.context, &mut pass, &primitives, output.pixels_per_point, extent)?;
            self.render_data.timings.ui_draw_time = self.phase_stopwatch.stop();
        }
        let command_buffer = recorder.end()?;

        self.phase_stopwatch.start();
        self.uniform_buffer.update(&matrices)?;
        self.render_data.timings.upload_to_ubo_time = self.phase_stopwatch.stop();

        let wait_semaphores = [self.frame_sync.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [command_buffer];
        let signal_semaphores = [self.frame_sync.render_finished.handle()];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores)
            .build();

        unsafe {
            self.context
                .device()
                .queue_submit(self.context.graphics_queue(), &[submit_info], self.frame_sync.in_flight.handle())
        }
        .map_err(|e| {
            log::error!("Failed to submit draw command buffer: {e:?}");
            VulkanError::Api(e)
        })?;

        let presented = self.swapchain.present(
            self.context.present_queue(),
            image_index,
            self.frame_sync.render_finished.handle(),
        );
        if present_needs_recreation(presented, self.resize_pending)? && !self.recreate_swapchain()? {
            return Ok(false);
        }

        Ok(true)
    }

    /// Rebuild the swapchain, depth buffer and framebuffers.
    ///
    /// Blocks while the framebuffer is zero-sized. Returns `Ok(false)` when
    /// the window closed during that wait.
    pub fn recreate_swapchain(&mut self) -> VulkanResult<bool> {
        let (mut width, mut height) = self.window.framebuffer_size();
        while width == 0 || height == 0 {
            if self.window.should_close() {
                return Ok(false);
            }
            self.window.wait_events();
            (width, height) = self.window.framebuffer_size();
        }

        self.context.wait_idle()?;

        self.lifecycle = self.lifecycle.tear_down()?;
        self.framebuffers.clear();
        self.depth_buffer = None;
        self.swapchain.destroy_image_views();

        let previous_format = self.swapchain.format().format;
        self.swapchain = Swapchain::new(&self.context, vk::Extent2D { width, height }, self.swapchain.handle())?;
        if self.swapchain.format().format != previous_format {
            log::warn!(
                "Surface format changed from {previous_format:?} to {:?}",
                self.swapchain.format().format
            );
        }

        let extent = self.swapchain.extent();
        let depth_buffer = DepthBuffer::new(&self.context, extent)?;
        self.framebuffers = Framebuffer::for_swapchain(
            self.context.device(),
            self.render_pass.handle(),
            self.swapchain.image_views(),
            depth_buffer.image_view(),
            extent,
        )?;
        self.depth_buffer = Some(depth_buffer);
        self.lifecycle = self.lifecycle.reinitialize()?;

        self.render_data.width = extent.width;
        self.render_data.height = extent.height;
        self.resize_pending = false;

        log::info!("Swapchain recreated: {}x{}", extent.width, extent.height);
        Ok(true)
    }

    /// Wait for the device and release every resource
    pub fn cleanup(self) {
        log::info!("Renderer shutting down");
        drop(self);
    }
}

impl Drop for VkRenderer {
    fn drop(&mut self) {
        if let Err(e) = self.context.wait_idle() {
            log::error!("Failed to wait for device idle during cleanup: {e}");
        }
    }
}

fn create_scene_pipeline(
    context: &VulkanContext,
    render_pass: vk::RenderPass,
    shaders: &ShaderConfig,
    set_layouts: &[vk::DescriptorSetLayout],
    settings: PipelineSettings,
) -> VulkanResult<GraphicsPipeline> {
    let device = context.raw_device();
    let vertex_shader = ShaderModule::from_file(device.clone(), &shaders.vertex_shader_path)?;
    let fragment_shader = ShaderModule::from_file(device.clone(), &shaders.fragment_shader_path)?;
    let attributes = SceneVertexLayout::attribute_descriptions();

    GraphicsPipeline::new(
        device,
        render_pass,
        &vertex_shader,
        &fragment_shader,
        &VertexInput {
            binding: SceneVertexLayout::binding_description(),
            attributes: &attributes,
        },
        set_layouts,
        None,
        settings,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4, Vec3};
    use approx::assert_relative_eq;

    #[test]
    fn test_matrices_match_std140_block() {
        assert_eq!(std::mem::size_of::<Matrices>(), 128);

        let translation = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0));
        let matrices = Matrices {
            view: translation.into(),
            projection: Mat4::identity().into(),
        };
        // column-major: translation sits in the fourth column
        assert_eq!(matrices.view[3][..3], [1.0, 2.0, 3.0]);

        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&matrices));
        assert_eq!(floats.len(), 32);
        assert_eq!(floats[12..15], [1.0, 2.0, 3.0]);
        assert_eq!(floats[16], 1.0);
    }

    #[test]
    fn test_scene_viewport_is_flipped() {
        let viewport = scene_viewport(vk::Extent2D {
            width: 800,
            height: 600,
        });
        assert_relative_eq!(viewport.y, 600.0);
        assert_relative_eq!(viewport.height, -600.0);
        assert_relative_eq!(viewport.width, 800.0);
        assert_relative_eq!(viewport.max_depth, 1.0);
    }

    #[test]
    fn test_line_width_falls_back_without_wide_lines() {
        assert_relative_eq!(line_width(true, 64.0), 3.0);
        assert_relative_eq!(line_width(false, 64.0), 1.0);
        assert_relative_eq!(line_width(true, 2.0), 2.0);
        assert_relative_eq!(line_width(true, 0.5), 1.0);
    }

    #[test]
    fn test_present_results_requesting_recreation() {
        assert!(!present_needs_recreation(Ok(false), false).unwrap());
        assert!(present_needs_recreation(Ok(true), false).unwrap());
        assert!(present_needs_recreation(Ok(false), true).unwrap());
        assert!(present_needs_recreation(Err(vk::Result::ERROR_OUT_OF_DATE_KHR), false).unwrap());
        assert!(matches!(
            present_needs_recreation(Err(vk::Result::ERROR_DEVICE_LOST), false),
            Err(VulkanError::Api(vk::Result::ERROR_DEVICE_LOST))
        ));
    }
}
