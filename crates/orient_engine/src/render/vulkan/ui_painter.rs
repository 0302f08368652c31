//! Vulkan painter for the egui overlay
//!
//! Uploads egui's font atlas, concatenates the tessellated meshes into one
//! vertex and index buffer and records one indexed draw per clip rectangle
//! inside the scene render pass.

use ash::{vk, Device};
use egui::epaint::{ImageDelta, Primitive};
use egui::{ClippedPrimitive, TextureId, TexturesDelta};

use crate::config::ShaderConfig;
use crate::render::vulkan::buffer::{IndexBuffer, VertexBuffer};
use crate::render::vulkan::commands::{ActiveRenderPass, CommandPool};
use crate::render::vulkan::descriptor::{
    DescriptorPool, DescriptorSetLayout, DescriptorSetLayoutBuilder, DescriptorSetWriter,
};
use crate::render::vulkan::shader::{GraphicsPipeline, PipelineSettings, ShaderModule, VertexInput};
use crate::render::vulkan::texture::{ImageData, Texture};
use crate::render::vulkan::vertex_layout::UiVertexLayout;
use crate::render::vulkan::{VulkanContext, VulkanResult};

/// The only texture the overlay uses: egui's font atlas
const FONT_TEXTURE: TextureId = TextureId::Managed(0);

/// Bytes of the screen-size push constant (`vec2`)
const PUSH_CONSTANT_SIZE: u32 = 8;

/// One indexed draw of the merged overlay geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UiDraw {
    /// Clip rectangle in points
    pub clip_rect: egui::Rect,
    /// First index in the merged index buffer
    pub first_index: u32,
    /// Number of indices
    pub index_count: u32,
    /// Added to every index of this draw
    pub vertex_offset: i32,
}

/// Merged overlay geometry of one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiBatch {
    /// All vertices
    pub vertices: Vec<egui::epaint::Vertex>,
    /// All indices, relative to each draw's vertex offset
    pub indices: Vec<u32>,
    /// Draws in paint order
    pub draws: Vec<UiDraw>,
}

impl UiBatch {
    /// Merge the meshes that sample the font atlas.
    ///
    /// Empty meshes, paint callbacks and meshes with other textures are
    /// skipped.
    pub fn from_primitives(primitives: &[ClippedPrimitive]) -> Self {
        let mut batch = Self::default();

        for primitive in primitives {
            let Primitive::Mesh(mesh) = &primitive.primitive else {
                continue;
            };
            if mesh.is_empty() || mesh.texture_id != FONT_TEXTURE {
                continue;
            }

            batch.draws.push(UiDraw {
                clip_rect: primitive.clip_rect,
                first_index: batch.indices.len() as u32,
                index_count: mesh.indices.len() as u32,
                vertex_offset: batch.vertices.len() as i32,
            });
            batch.vertices.extend_from_slice(&mesh.vertices);
            batch.indices.extend_from_slice(&mesh.indices);
        }

        batch
    }

    /// Whether nothing is drawn
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }
}

/// Convert a clip rectangle in points to a scissor in pixels.
///
/// Returns `None` when nothing of the rectangle is inside the framebuffer.
pub fn clip_to_scissor(clip_rect: egui::Rect, pixels_per_point: f32, extent: vk::Extent2D) -> Option<vk::Rect2D> {
    let min_x = (clip_rect.min.x * pixels_per_point).round().clamp(0.0, extent.width as f32) as u32;
    let min_y = (clip_rect.min.y * pixels_per_point).round().clamp(0.0, extent.height as f32) as u32;
    let max_x = (clip_rect.max.x * pixels_per_point).round().clamp(0.0, extent.width as f32) as u32;
    let max_y = (clip_rect.max.y * pixels_per_point).round().clamp(0.0, extent.height as f32) as u32;

    if max_x <= min_x || max_y <= min_y {
        return None;
    }

    Some(vk::Rect2D {
        offset: vk::Offset2D {
            x: min_x as i32,
            y: min_y as i32,
        },
        extent: vk::Extent2D {
            width: max_x - min_x,
            height: max_y - min_y,
        },
    })
}

/// RGBA8 pixels of a texture delta as premultiplied sRGB
pub fn delta_pixels(delta: &ImageDelta) -> ImageData {
    let [width, height] = delta.image.size();
    let data = match &delta.image {
        egui::ImageData::Color(image) => image.pixels.iter().flat_map(|color| color.to_array()).collect(),
        egui::ImageData::Font(font) => font.srgba_pixels(None).flat_map(|color| color.to_array()).collect(),
    };

    ImageData {
        data,
        width: width as u32,
        height: height as u32,
    }
}

/// Pipeline, font texture and geometry buffers of the overlay
pub struct UiPainter {
    device: Device,
    pipeline: GraphicsPipeline,
    font_texture: Option<Texture>,
    descriptor_set: vk::DescriptorSet,
    _descriptor_pool: DescriptorPool,
    _set_layout: DescriptorSetLayout,
    vertex_buffer: VertexBuffer,
    index_buffer: IndexBuffer,
}

impl UiPainter {
    /// Create the overlay pipeline for `render_pass`
    pub fn new(context: &VulkanContext, render_pass: vk::RenderPass, shaders: &ShaderConfig) -> VulkanResult<Self> {
        let device = context.raw_device();

        let set_layout = DescriptorSetLayoutBuilder::new()
            .add_combined_image_sampler(0, vk::ShaderStageFlags::FRAGMENT)
            .build(&device)?;
        let descriptor_pool =
            DescriptorPool::new(device.clone(), 1, &[(vk::DescriptorType::COMBINED_IMAGE_SAMPLER, 1)])?;
        let descriptor_set = descriptor_pool.allocate_one(set_layout.handle())?;

        let vertex_shader = ShaderModule::from_file(device.clone(), &shaders.vertex_shader_path)?;
        let fragment_shader = ShaderModule::from_file(device.clone(), &shaders.fragment_shader_path)?;
        let attributes = UiVertexLayout::attribute_descriptions();
        let pipeline = GraphicsPipeline::new(
            device.clone(),
            render_pass,
            &vertex_shader,
            &fragment_shader,
            &VertexInput {
                binding: UiVertexLayout::binding_description(),
                attributes: &attributes,
            },
            &[set_layout.handle()],
            Some(PUSH_CONSTANT_SIZE),
            PipelineSettings::overlay(),
        )?;

        log::debug!("Overlay painter created");
        Ok(Self {
            device,
            pipeline,
            font_texture: None,
            descriptor_set,
            _descriptor_pool: descriptor_pool,
            _set_layout: set_layout,
            vertex_buffer: VertexBuffer::new(),
            index_buffer: IndexBuffer::new(),
        })
    }

    /// Apply egui's texture changes.
    ///
    /// Must run while the GPU does not sample the font texture, i.e. after
    /// the in-flight fence was waited on.
    pub fn update_textures(
        &mut self,
        context: &VulkanContext,
        command_pool: &CommandPool,
        textures_delta: &TexturesDelta,
    ) -> VulkanResult<()> {
        for (id, delta) in &textures_delta.set {
            if *id != FONT_TEXTURE {
                log::debug!("Ignoring overlay texture {id:?}");
                continue;
            }

            let pixels = delta_pixels(delta);
            match (delta.pos, &self.font_texture) {
                (Some([x, y]), Some(texture)) => {
                    texture.update_region(
                        context,
                        command_pool,
                        [x as u32, y as u32],
                        [pixels.width, pixels.height],
                        &pixels.data,
                    )?;
                }
                _ => self.replace_font_texture(context, command_pool, &pixels)?,
            }
        }

        for id in &textures_delta.free {
            if *id == FONT_TEXTURE {
                self.font_texture = None;
            }
        }
        Ok(())
    }

    fn replace_font_texture(
        &mut self,
        context: &VulkanContext,
        command_pool: &CommandPool,
        pixels: &ImageData,
    ) -> VulkanResult<()> {
        let texture = Texture::new(
            context,
            command_pool,
            pixels,
            vk::Format::R8G8B8A8_SRGB,
            vk::SamplerAddressMode::CLAMP_TO_EDGE,
        )?;

        DescriptorSetWriter::new()
            .write_image(self.descriptor_set, 0, texture.image_view(), texture.sampler())
            .update(&self.device);

        log::debug!("Font atlas uploaded: {}x{}", pixels.width, pixels.height);
        self.font_texture = Some(texture);
        Ok(())
    }

    /// Upload the overlay geometry and record its draws into `pass`
    pub fn paint(
        &mut self,
        context: &VulkanContext,
        pass: &mut ActiveRenderPass<'_>,
        primitives: &[ClippedPrimitive],
        pixels_per_point: f32,
        extent: vk::Extent2D,
    ) -> VulkanResult<()> {
        if self.font_texture.is_none() {
            return Ok(());
        }

        let batch = UiBatch::from_primitives(primitives);
        if batch.is_empty() {
            return Ok(());
        }

        self.vertex_buffer
            .upload(context, bytemuck::cast_slice(&batch.vertices))?;
        self.index_buffer.upload(context, &batch.indices)?;
        let (Some(vertex_buffer), Some(index_buffer)) = (self.vertex_buffer.handle(), self.index_buffer.handle())
        else {
            return Ok(());
        };

        pass.bind_pipeline(self.pipeline.handle());
        pass.set_viewport(&vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        });
        pass.bind_descriptor_sets(self.pipeline.layout(), &[self.descriptor_set]);
        pass.bind_vertex_buffer(vertex_buffer, 0);
        pass.bind_index_buffer(index_buffer, 0);

        let screen_size = [
            extent.width as f32 / pixels_per_point,
            extent.height as f32 / pixels_per_point,
        ];
        pass.push_constants(self.pipeline.layout(), bytemuck::cast_slice(&screen_size));

        for draw in &batch.draws {
            let Some(scissor) = clip_to_scissor(draw.clip_rect, pixels_per_point, extent) else {
                continue;
            };
            pass.set_scissor(&scissor);
            pass.draw_indexed(draw.index_count, draw.first_index, draw.vertex_offset);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{Color32, Pos2, Rect};

    fn rect_primitive(clip: Rect, texture_id: TextureId) -> ClippedPrimitive {
        let mut mesh = egui::epaint::Mesh::with_texture(texture_id);
        mesh.add_colored_rect(Rect::from_min_max(Pos2::ZERO, Pos2::new(10.0, 10.0)), Color32::WHITE);
        ClippedPrimitive {
            clip_rect: clip,
            primitive: Primitive::Mesh(mesh),
        }
    }

    #[test]
    fn test_batch_offsets_follow_previous_meshes() {
        let clip = Rect::from_min_max(Pos2::ZERO, Pos2::new(100.0, 100.0));
        let primitives = vec![rect_primitive(clip, FONT_TEXTURE), rect_primitive(clip, FONT_TEXTURE)];

        let batch = UiBatch::from_primitives(&primitives);
        assert_eq!(batch.vertices.len(), 8);
        assert_eq!(batch.indices.len(), 12);
        assert_eq!(batch.draws.len(), 2);

        assert_eq!(batch.draws[1].first_index, 6);
        assert_eq!(batch.draws[1].index_count, 6);
        assert_eq!(batch.draws[1].vertex_offset, 4);
        // indices stay relative to their own mesh
        assert!(batch.indices[6..].iter().all(|&index| index < 4));
    }

    #[test]
    fn test_batch_skips_foreign_textures_and_empty_meshes() {
        let clip = Rect::from_min_max(Pos2::ZERO, Pos2::new(100.0, 100.0));
        let primitives = vec![
            rect_primitive(clip, TextureId::User(3)),
            ClippedPrimitive {
                clip_rect: clip,
                primitive: Primitive::Mesh(egui::epaint::Mesh::default()),
            },
        ];

        assert!(UiBatch::from_primitives(&primitives).is_empty());
    }

    #[test]
    fn test_scissor_is_scaled_and_clamped() {
        let extent = vk::Extent2D {
            width: 800,
            height: 600,
        };

        let scissor = clip_to_scissor(Rect::from_min_max(Pos2::new(10.0, 20.0), Pos2::new(110.0, 70.0)), 2.0, extent)
            .unwrap();
        assert_eq!((scissor.offset.x, scissor.offset.y), (20, 40));
        assert_eq!((scissor.extent.width, scissor.extent.height), (200, 100));

        let clamped = clip_to_scissor(Rect::from_min_max(Pos2::new(-50.0, -50.0), Pos2::new(1e6, 1e6)), 1.0, extent)
            .unwrap();
        assert_eq!((clamped.offset.x, clamped.offset.y), (0, 0));
        assert_eq!((clamped.extent.width, clamped.extent.height), (800, 600));

        assert!(clip_to_scissor(Rect::from_min_max(Pos2::new(900.0, 0.0), Pos2::new(950.0, 10.0)), 1.0, extent)
            .is_none());
    }

    #[test]
    fn test_color_delta_converts_to_rgba_bytes() {
        let image = egui::ColorImage::new([2, 1], Color32::from_rgba_premultiplied(10, 20, 30, 40));
        let delta = ImageDelta::full(image, egui::TextureOptions::LINEAR);

        let pixels = delta_pixels(&delta);
        assert_eq!((pixels.width, pixels.height), (2, 1));
        assert_eq!(pixels.data, vec![10, 20, 30, 40, 10, 20, 30, 40]);
    }

    #[test]
    fn test_headless_overlay_batches_into_draws() {
        let ctx = egui::Context::default();
        let mut output = ctx.run(egui::RawInput::default(), |_| {});
        for _ in 0..3 {
            output = ctx.run(egui::RawInput::default(), |ctx| {
                egui::Window::new("Probe").show(ctx, |ui| ui.label("text"));
            });
        }

        let primitives = ctx.tessellate(output.shapes, output.pixels_per_point);
        let batch = UiBatch::from_primitives(&primitives);
        assert!(!batch.is_empty());
        assert!(batch.indices.len() % 3 == 0);
    }
}
