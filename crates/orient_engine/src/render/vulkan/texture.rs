//! Sampled 2D textures
//!
//! [`ImageData`] holds RGBA8 pixels on the CPU; [`Texture`] uploads them to
//! a device-local image through a staging buffer and can later replace a
//! sub-rectangle, which the overlay uses for font atlas updates.

use ash::{vk, Device};
use std::path::Path;

use crate::render::vulkan::buffer::Buffer;
use crate::render::vulkan::commands::{CommandPool, CommandRecorder};
use crate::render::vulkan::{VulkanContext, VulkanError, VulkanResult};

/// Side length of the fallback checkerboard in pixels
pub const CHECKERBOARD_SIZE: u32 = 64;
/// Side length of one checkerboard cell in pixels
pub const CHECKERBOARD_CELL: u32 = 8;

const CHECKER_LIGHT: [u8; 4] = [200, 200, 200, 255];
const CHECKER_DARK: [u8; 4] = [90, 90, 90, 255];

/// RGBA8 pixels ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// Row-major RGBA pixels
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl ImageData {
    /// Decode an image file into RGBA8
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, image::ImageError> {
        let path = path.as_ref();
        log::debug!("Loading image from: {}", path.display());

        let rgba = image::open(path)?.to_rgba8();
        let (width, height) = rgba.dimensions();

        log::info!("Loaded image {width}x{height} from {}", path.display());
        Ok(Self {
            data: rgba.into_raw(),
            width,
            height,
        })
    }

    /// Decode an encoded image held in memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            data: rgba.into_raw(),
            width,
            height,
        })
    }

    /// Two-tone checkerboard used when the model texture is missing
    pub fn checkerboard(size: u32, cell: u32) -> Self {
        let cell = cell.max(1);
        let mut data = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let light = ((x / cell) + (y / cell)) % 2 == 0;
                data.extend_from_slice(if light { &CHECKER_LIGHT } else { &CHECKER_DARK });
            }
        }

        Self {
            data,
            width: size,
            height: size,
        }
    }

    /// Load `path`, or fall back to the checkerboard with a warning
    pub fn load_or_checkerboard(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::from_file(path).unwrap_or_else(|e| {
            log::warn!("Texture '{}' unavailable ({e}), using checkerboard", path.display());
            Self::checkerboard(CHECKERBOARD_SIZE, CHECKERBOARD_CELL)
        })
    }
}

/// Device-local sampled image with view and sampler
pub struct Texture {
    device: Device,
    image: vk::Image,
    memory: vk::DeviceMemory,
    image_view: vk::ImageView,
    sampler: vk::Sampler,
    extent: vk::Extent2D,
}

impl Texture {
    /// Create the texture and upload `pixels`.
    ///
    /// `format` must be a four-byte RGBA format. The image ends in
    /// SHADER_READ_ONLY_OPTIMAL.
    pub fn new(
        context: &VulkanContext,
        command_pool: &CommandPool,
        pixels: &ImageData,
        format: vk::Format,
        address_mode: vk::SamplerAddressMode,
    ) -> VulkanResult<Self> {
        if pixels.width == 0 || pixels.height == 0 {
            return Err(VulkanError::InvalidOperation {
                reason: "Texture dimensions must be non-zero".to_string(),
            });
        }

        let device = context.raw_device();
        let extent = vk::Extent2D {
            width: pixels.width,
            height: pixels.height,
        };

        let image_create_info = vk::ImageCreateInfo::builder()
            .image_type(vk::ImageType::TYPE_2D)
            .extent(vk::Extent3D {
                width: extent.width,
                height: extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .format(format)
            .tiling(vk::ImageTiling::OPTIMAL)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .samples(vk::SampleCountFlags::TYPE_1);

        let image = unsafe { device.create_image(&image_create_info, None).map_err(VulkanError::Api)? };

        // Handles created so far are owned by the partially built texture so
        // an early return releases them through Drop.
        let mut texture = Self {
            device: device.clone(),
            image,
            memory: vk::DeviceMemory::null(),
            image_view: vk::ImageView::null(),
            sampler: vk::Sampler::null(),
            extent,
        };

        let requirements = unsafe { device.get_image_memory_requirements(image) };
        let memory_type_index =
            context.find_memory_type(requirements.memory_type_bits, vk::MemoryPropertyFlags::DEVICE_LOCAL)?;
        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);
        texture.memory = unsafe { device.allocate_memory(&alloc_info, None).map_err(VulkanError::Api)? };
        unsafe {
            device
                .bind_image_memory(image, texture.memory, 0)
                .map_err(VulkanError::Api)?;
        }

        texture.upload(
            context,
            command_pool,
            vk::ImageLayout::UNDEFINED,
            vk::Offset2D { x: 0, y: 0 },
            extent,
            &pixels.data,
        )?;

        let view_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(color_subresource_range());
        texture.image_view = unsafe { device.create_image_view(&view_info, None).map_err(VulkanError::Api)? };

        let sampler_info = vk::SamplerCreateInfo::builder()
            .mag_filter(vk::Filter::LINEAR)
            .min_filter(vk::Filter::LINEAR)
            .address_mode_u(address_mode)
            .address_mode_v(address_mode)
            .address_mode_w(address_mode)
            .anisotropy_enable(false)
            .max_anisotropy(1.0)
            .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
            .unnormalized_coordinates(false)
            .compare_enable(false)
            .compare_op(vk::CompareOp::ALWAYS)
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR);
        texture.sampler = unsafe { device.create_sampler(&sampler_info, None).map_err(VulkanError::Api)? };

        log::debug!("Texture created: {}x{} {format:?}", extent.width, extent.height);
        Ok(texture)
    }

    /// Replace the pixels of a sub-rectangle.
    ///
    /// Blocks until the copy finished; the caller guarantees no frame in
    /// flight samples the texture.
    pub fn update_region(
        &self,
        context: &VulkanContext,
        command_pool: &CommandPool,
        offset: [u32; 2],
        size: [u32; 2],
        pixels: &[u8],
    ) -> VulkanResult<()> {
        let [x, y] = offset;
        let [width, height] = size;
        if x + width > self.extent.width || y + height > self.extent.height {
            return Err(VulkanError::InvalidOperation {
                reason: format!(
                    "Region {width}x{height} at ({x}, {y}) exceeds texture {}x{}",
                    self.extent.width, self.extent.height
                ),
            });
        }

        self.upload(
            context,
            command_pool,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            vk::Offset2D {
                x: x as i32,
                y: y as i32,
            },
            vk::Extent2D { width, height },
            pixels,
        )
    }

    fn upload(
        &self,
        context: &VulkanContext,
        command_pool: &CommandPool,
        old_layout: vk::ImageLayout,
        offset: vk::Offset2D,
        extent: vk::Extent2D,
        pixels: &[u8],
    ) -> VulkanResult<()> {
        let expected = (extent.width * extent.height * 4) as usize;
        if pixels.len() != expected {
            return Err(VulkanError::InvalidOperation {
                reason: format!("Expected {expected} bytes of RGBA pixels, got {}", pixels.len()),
            });
        }

        let staging = Buffer::staging(context, pixels)?;
        let image = self.image;

        command_pool.submit_single_time(context.graphics_queue(), |recorder: &mut CommandRecorder| {
            let (src_access, src_stage) = if old_layout == vk::ImageLayout::UNDEFINED {
                (vk::AccessFlags::empty(), vk::PipelineStageFlags::TOP_OF_PIPE)
            } else {
                (vk::AccessFlags::SHADER_READ, vk::PipelineStageFlags::FRAGMENT_SHADER)
            };

            recorder.image_barrier(
                src_stage,
                vk::PipelineStageFlags::TRANSFER,
                layout_barrier(
                    image,
                    old_layout,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    src_access,
                    vk::AccessFlags::TRANSFER_WRITE,
                ),
            );

            let region = vk::BufferImageCopy::builder()
                .buffer_offset(0)
                .buffer_row_length(0)
                .buffer_image_height(0)
                .image_subresource(vk::ImageSubresourceLayers {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_level: 0,
                    base_array_layer: 0,
                    layer_count: 1,
                })
                .image_offset(vk::Offset3D {
                    x: offset.x,
                    y: offset.y,
                    z: 0,
                })
                .image_extent(vk::Extent3D {
                    width: extent.width,
                    height: extent.height,
                    depth: 1,
                })
                .build();
            recorder.copy_buffer_to_image(staging.handle(), image, &[region]);

            recorder.image_barrier(
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
                layout_barrier(
                    image,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                    vk::AccessFlags::TRANSFER_WRITE,
                    vk::AccessFlags::SHADER_READ,
                ),
            );
            Ok(())
        })
    }

    /// Image view handle
    pub fn image_view(&self) -> vk::ImageView {
        self.image_view
    }

    /// Sampler handle
    pub fn sampler(&self) -> vk::Sampler {
        self.sampler
    }

    /// Size in pixels
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            if self.sampler != vk::Sampler::null() {
                self.device.destroy_sampler(self.sampler, None);
            }
            if self.image_view != vk::ImageView::null() {
                self.device.destroy_image_view(self.image_view, None);
            }
            self.device.destroy_image(self.image, None);
            if self.memory != vk::DeviceMemory::null() {
                self.device.free_memory(self.memory, None);
            }
        }
    }
}

fn color_subresource_range() -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange {
        aspect_mask: vk::ImageAspectFlags::COLOR,
        base_mip_level: 0,
        level_count: 1,
        base_array_layer: 0,
        layer_count: 1,
    }
}

fn layout_barrier(
    image: vk::Image,
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
    src_access: vk::AccessFlags,
    dst_access: vk::AccessFlags,
) -> vk::ImageMemoryBarrier {
    vk::ImageMemoryBarrier::builder()
        .old_layout(old_layout)
        .new_layout(new_layout)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(color_subresource_range())
        .src_access_mask(src_access)
        .dst_access_mask(dst_access)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(image: &ImageData, x: u32, y: u32) -> &[u8] {
        let start = ((y * image.width + x) * 4) as usize;
        &image.data[start..start + 4]
    }

    #[test]
    fn test_checkerboard_alternates_cells() {
        let board = ImageData::checkerboard(16, 4);
        assert_eq!(board.data.len(), 16 * 16 * 4);

        assert_eq!(pixel(&board, 0, 0), CHECKER_LIGHT);
        assert_eq!(pixel(&board, 3, 3), CHECKER_LIGHT);
        assert_eq!(pixel(&board, 4, 0), CHECKER_DARK);
        assert_eq!(pixel(&board, 0, 4), CHECKER_DARK);
        assert_eq!(pixel(&board, 4, 4), CHECKER_LIGHT);
    }

    #[test]
    fn test_missing_file_falls_back_to_checkerboard() {
        let image = ImageData::load_or_checkerboard("does/not/exist.png");
        assert_eq!(image.width, CHECKERBOARD_SIZE);
        assert_eq!(image.height, CHECKERBOARD_SIZE);
    }

    #[test]
    fn test_png_decodes_to_rgba() {
        let mut source = image::RgbaImage::new(2, 1);
        source.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        source.put_pixel(1, 0, image::Rgba([0, 0, 255, 128]));

        let mut encoded = std::io::Cursor::new(Vec::new());
        source.write_to(&mut encoded, image::ImageFormat::Png).unwrap();

        let decoded = ImageData::from_bytes(encoded.get_ref()).unwrap();
        assert_eq!((decoded.width, decoded.height), (2, 1));
        assert_eq!(decoded.data, vec![255, 0, 0, 255, 0, 0, 255, 128]);
    }
}
