//! Vulkan swapchain management
//!
//! Swapchain creation and recreation plus the lifecycle of the
//! swapchain-dependent resource set.

use ash::extensions::khr::Swapchain as SwapchainLoader;
use ash::{vk, Device};

use crate::render::vulkan::{VulkanContext, VulkanError, VulkanResult};

/// State of the swapchain-dependent resources (swapchain, depth buffer,
/// framebuffers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwapchainLifecycle {
    /// Nothing created yet
    #[default]
    Uninitialized,
    /// Created at startup
    Initialized,
    /// Destroyed, waiting to be rebuilt
    TornDown,
    /// Rebuilt after a tear-down
    Reinitialized,
}

impl SwapchainLifecycle {
    /// First creation
    pub fn initialize(self) -> VulkanResult<Self> {
        match self {
            Self::Uninitialized => Ok(Self::Initialized),
            other => Err(invalid_transition(other, "initialize")),
        }
    }

    /// Destruction before a rebuild
    pub fn tear_down(self) -> VulkanResult<Self> {
        match self {
            Self::Initialized | Self::Reinitialized => Ok(Self::TornDown),
            other => Err(invalid_transition(other, "tear down")),
        }
    }

    /// Rebuild after a tear-down
    pub fn reinitialize(self) -> VulkanResult<Self> {
        match self {
            Self::TornDown => Ok(Self::Reinitialized),
            other => Err(invalid_transition(other, "reinitialize")),
        }
    }

    /// Whether the resources can be used for drawing
    pub fn is_usable(self) -> bool {
        matches!(self, Self::Initialized | Self::Reinitialized)
    }
}

fn invalid_transition(state: SwapchainLifecycle, action: &str) -> VulkanError {
    VulkanError::InvalidOperation {
        reason: format!("Cannot {action} swapchain resources in state {state:?}"),
    }
}

/// Swapchain management wrapper with RAII cleanup
pub struct Swapchain {
    device: Device,
    swapchain_loader: SwapchainLoader,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    format: vk::SurfaceFormatKHR,
    extent: vk::Extent2D,
}

impl Swapchain {
    /// Create a swapchain for the context surface.
    ///
    /// Pass the previous handle as `old_swapchain` when recreating, or a
    /// null handle the first time.
    pub fn new(
        context: &VulkanContext,
        window_extent: vk::Extent2D,
        old_swapchain: vk::SwapchainKHR,
    ) -> VulkanResult<Self> {
        let device = context.raw_device();
        let swapchain_loader = context.swapchain_loader().clone();
        let surface = context.surface();
        let physical_device = context.physical_device().device;
        let surface_loader = context.surface_loader();

        let surface_caps = unsafe {
            surface_loader
                .get_physical_device_surface_capabilities(physical_device, surface)
                .map_err(VulkanError::Api)?
        };
        let surface_formats = unsafe {
            surface_loader
                .get_physical_device_surface_formats(physical_device, surface)
                .map_err(VulkanError::Api)?
        };
        let present_modes = unsafe {
            surface_loader
                .get_physical_device_surface_present_modes(physical_device, surface)
                .map_err(VulkanError::Api)?
        };

        let format = choose_surface_format(&surface_formats)?;
        let present_mode = choose_present_mode(&present_modes);
        let extent = choose_extent(&surface_caps, window_extent);
        let image_count = choose_image_count(&surface_caps);

        let mut queue_families = vec![context.graphics_queue_family()];
        let present_family = context.physical_device().present_family;
        if present_family != queue_families[0] {
            queue_families.push(present_family);
        }
        let sharing_mode = if queue_families.len() > 1 {
            vk::SharingMode::CONCURRENT
        } else {
            vk::SharingMode::EXCLUSIVE
        };

        let create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface)
            .min_image_count(image_count)
            .image_format(format.format)
            .image_color_space(format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(sharing_mode)
            .queue_family_indices(&queue_families)
            .pre_transform(surface_caps.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(old_swapchain);

        let swapchain = unsafe {
            swapchain_loader
                .create_swapchain(&create_info, None)
                .map_err(VulkanError::Api)?
        };

        let images = match unsafe { swapchain_loader.get_swapchain_images(swapchain) } {
            Ok(images) => images,
            Err(e) => {
                unsafe { swapchain_loader.destroy_swapchain(swapchain, None) };
                return Err(VulkanError::Api(e));
            }
        };

        let mut result = Self {
            device,
            swapchain_loader,
            swapchain,
            images,
            image_views: Vec::new(),
            format,
            extent,
        };
        result.create_image_views()?;

        log::debug!(
            "Swapchain created: {}x{}, {} images, {:?}, {:?}",
            extent.width,
            extent.height,
            result.images.len(),
            format.format,
            present_mode
        );
        Ok(result)
    }

    fn create_image_views(&mut self) -> VulkanResult<()> {
        for &image in &self.images {
            let create_info = vk::ImageViewCreateInfo::builder()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(self.format.format)
                .components(vk::ComponentMapping::default())
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            let view = unsafe { self.device.create_image_view(&create_info, None).map_err(VulkanError::Api)? };
            self.image_views.push(view);
        }
        Ok(())
    }

    /// Destroy the image views ahead of a recreation.
    ///
    /// The swapchain handle stays alive so it can be passed as the old
    /// swapchain.
    pub fn destroy_image_views(&mut self) {
        for view in self.image_views.drain(..) {
            unsafe { self.device.destroy_image_view(view, None) };
        }
    }

    /// Swapchain extent
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Surface format
    pub fn format(&self) -> vk::SurfaceFormatKHR {
        self.format
    }

    /// Image views, one per swapchain image
    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }

    /// Swapchain handle
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    /// Number of swapchain images
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Acquire the next image.
    ///
    /// Returns the image index and whether the swapchain is suboptimal.
    pub fn acquire_next_image(&self, signal: vk::Semaphore) -> Result<(u32, bool), vk::Result> {
        unsafe {
            self.swapchain_loader
                .acquire_next_image(self.swapchain, u64::MAX, signal, vk::Fence::null())
        }
    }

    /// Queue `image_index` for presentation after `wait` is signaled.
    ///
    /// Returns whether the swapchain is suboptimal.
    pub fn present(&self, queue: vk::Queue, image_index: u32, wait: vk::Semaphore) -> Result<bool, vk::Result> {
        let wait_semaphores = [wait];
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        unsafe { self.swapchain_loader.queue_present(queue, &present_info) }
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        self.destroy_image_views();
        unsafe { self.swapchain_loader.destroy_swapchain(self.swapchain, None) };
    }
}

/// Prefer sRGB BGRA, else take the first format offered
fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> VulkanResult<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .find(|sf| sf.format == vk::Format::B8G8R8A8_SRGB && sf.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR)
        .or_else(|| formats.first())
        .copied()
        .ok_or_else(|| VulkanError::InitializationFailed("Surface reports no formats".to_string()))
}

/// Mailbox when available, FIFO otherwise
fn choose_present_mode(modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    modes
        .iter()
        .copied()
        .find(|&mode| mode == vk::PresentModeKHR::MAILBOX)
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

fn choose_extent(caps: &vk::SurfaceCapabilitiesKHR, window_extent: vk::Extent2D) -> vk::Extent2D {
    if caps.current_extent.width != u32::MAX {
        return caps.current_extent;
    }
    vk::Extent2D {
        width: window_extent
            .width
            .clamp(caps.min_image_extent.width, caps.max_image_extent.width),
        height: window_extent
            .height
            .clamp(caps.min_image_extent.height, caps.max_image_extent.height),
    }
}

/// One more than the minimum, capped when the surface has a maximum
fn choose_image_count(caps: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let desired = caps.min_image_count + 1;
    if caps.max_image_count > 0 {
        desired.min(caps.max_image_count)
    } else {
        desired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(current: (u32, u32), min: (u32, u32), max: (u32, u32)) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: current.0,
                height: current.1,
            },
            min_image_extent: vk::Extent2D {
                width: min.0,
                height: min.1,
            },
            max_image_extent: vk::Extent2D {
                width: max.0,
                height: max.1,
            },
            min_image_count: 2,
            max_image_count: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_lifecycle_follows_init_teardown_reinit() {
        let state = SwapchainLifecycle::default();
        assert_eq!(state, SwapchainLifecycle::Uninitialized);
        assert!(!state.is_usable());

        let state = state.initialize().unwrap();
        assert!(state.is_usable());

        let state = state.tear_down().unwrap();
        assert_eq!(state, SwapchainLifecycle::TornDown);
        assert!(!state.is_usable());

        let state = state.reinitialize().unwrap();
        assert_eq!(state, SwapchainLifecycle::Reinitialized);

        // recreation can repeat
        let state = state.tear_down().unwrap().reinitialize().unwrap();
        assert!(state.is_usable());
    }

    #[test]
    fn test_lifecycle_rejects_invalid_transitions() {
        assert!(SwapchainLifecycle::Uninitialized.tear_down().is_err());
        assert!(SwapchainLifecycle::Uninitialized.reinitialize().is_err());
        assert!(SwapchainLifecycle::Initialized.initialize().is_err());
        assert!(SwapchainLifecycle::Initialized.reinitialize().is_err());
        assert!(SwapchainLifecycle::TornDown.tear_down().is_err());
        assert!(matches!(
            SwapchainLifecycle::Reinitialized.initialize(),
            Err(VulkanError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn test_surface_format_prefers_srgb() {
        let unorm = vk::SurfaceFormatKHR {
            format: vk::Format::B8G8R8A8_UNORM,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        };
        let srgb = vk::SurfaceFormatKHR {
            format: vk::Format::B8G8R8A8_SRGB,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        };

        assert_eq!(choose_surface_format(&[unorm, srgb]).unwrap(), srgb);
        assert_eq!(choose_surface_format(&[unorm]).unwrap(), unorm);
        assert!(choose_surface_format(&[]).is_err());
    }

    #[test]
    fn test_present_mode_falls_back_to_fifo() {
        assert_eq!(
            choose_present_mode(&[vk::PresentModeKHR::IMMEDIATE, vk::PresentModeKHR::MAILBOX]),
            vk::PresentModeKHR::MAILBOX
        );
        assert_eq!(choose_present_mode(&[vk::PresentModeKHR::IMMEDIATE]), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn test_extent_uses_surface_or_clamps_window() {
        let fixed = caps((800, 600), (1, 1), (4096, 4096));
        let extent = choose_extent(&fixed, vk::Extent2D { width: 10, height: 10 });
        assert_eq!((extent.width, extent.height), (800, 600));

        let free = caps((u32::MAX, u32::MAX), (100, 100), (2000, 1000));
        let extent = choose_extent(&free, vk::Extent2D { width: 50, height: 5000 });
        assert_eq!((extent.width, extent.height), (100, 1000));
    }

    #[test]
    fn test_image_count_respects_maximum() {
        let mut surface = caps((1, 1), (1, 1), (1, 1));
        assert_eq!(choose_image_count(&surface), 3);

        surface.max_image_count = 2;
        assert_eq!(choose_image_count(&surface), 2);
    }
}
