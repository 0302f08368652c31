//! Window management using GLFW
//!
//! Window creation without a client API, event polling and cursor control
//! for mouse-look.

use glfw::{CursorMode, Key, WindowEvent};
use thiserror::Error;

use crate::config::WindowConfig;
use crate::render::vulkan::VulkanError;

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// `glfwInit` failed
    #[error("GLFW initialization failed")]
    InitializationFailed,

    /// The window could not be created
    #[error("Window creation failed")]
    CreationFailed,

    /// Any other GLFW failure
    #[error("GLFW error: {0}")]
    GlfwError(String),
}

/// Result type for window operations
pub type WindowResult<T> = Result<T, WindowError>;

impl From<WindowError> for VulkanError {
    fn from(error: WindowError) -> Self {
        VulkanError::Window(error.to_string())
    }
}

/// Ratio of framebuffer to window width, 1.0 while either is zero
pub fn pixels_per_point(framebuffer_width: u32, window_width: u32) -> f32 {
    if framebuffer_width == 0 || window_width == 0 {
        1.0
    } else {
        framebuffer_width as f32 / window_width as f32
    }
}

/// GLFW window wrapper with proper resource management
pub struct Window {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, WindowEvent)>,
}

impl Window {
    /// Create a resizable window without a client API
    pub fn new(config: &WindowConfig) -> WindowResult<Self> {
        let mut glfw = glfw::init(glfw::fail_on_errors).map_err(|_| WindowError::InitializationFailed)?;

        if !glfw.vulkan_supported() {
            return Err(WindowError::GlfwError("Vulkan is not supported".to_string()));
        }

        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        let (mut window, events) = glfw
            .create_window(config.width, config.height, &config.title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        window.set_key_polling(true);
        window.set_char_polling(true);
        window.set_mouse_button_polling(true);
        window.set_cursor_pos_polling(true);
        window.set_scroll_polling(true);
        window.set_close_polling(true);
        window.set_framebuffer_size_polling(true);

        log::info!("Window created: {}x{} '{}'", config.width, config.height, config.title);
        Ok(Self { glfw, window, events })
    }

    /// Whether the user asked to close the window
    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    /// Process pending events without blocking
    pub fn poll_events(&mut self) {
        self.glfw.poll_events();
    }

    /// Block until at least one event arrives
    pub fn wait_events(&mut self) {
        self.glfw.wait_events();
    }

    /// Events received since the last flush
    pub fn flush_events(&self) -> Vec<WindowEvent> {
        glfw::flush_messages(&self.events).map(|(_, event)| event).collect()
    }

    /// Framebuffer size in pixels
    pub fn framebuffer_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (width.max(0) as u32, height.max(0) as u32)
    }

    /// Window size in screen coordinates, the space cursor positions use
    pub fn window_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_size();
        (width.max(0) as u32, height.max(0) as u32)
    }

    /// Framebuffer pixels per screen coordinate
    pub fn pixels_per_point(&self) -> f32 {
        let (framebuffer_width, _) = self.framebuffer_size();
        let (window_width, _) = self.window_size();
        pixels_per_point(framebuffer_width, window_width)
    }

    /// Whether `key` is currently held
    pub fn is_key_pressed(&self, key: Key) -> bool {
        matches!(self.window.get_key(key), glfw::Action::Press | glfw::Action::Repeat)
    }

    /// Hide and capture the cursor for mouse-look, or release it.
    ///
    /// Raw motion is used while locked when the platform supports it.
    pub fn set_cursor_locked(&mut self, locked: bool) {
        if locked {
            self.window.set_cursor_mode(CursorMode::Disabled);
            if self.glfw.supports_raw_motion() {
                self.window.set_raw_mouse_motion(true);
            }
        } else {
            if self.glfw.supports_raw_motion() {
                self.window.set_raw_mouse_motion(false);
            }
            self.window.set_cursor_mode(CursorMode::Normal);
        }
    }

    /// Replace the window title
    pub fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }

    /// Required Vulkan instance extensions from GLFW
    pub fn required_instance_extensions(&self) -> WindowResult<Vec<String>> {
        self.glfw
            .get_required_instance_extensions()
            .ok_or_else(|| WindowError::GlfwError("Failed to get required extensions".to_string()))
    }

    /// Create a Vulkan surface for this window
    pub fn create_vulkan_surface(&mut self, instance: ash::vk::Instance) -> WindowResult<ash::vk::SurfaceKHR> {
        let mut surface = ash::vk::SurfaceKHR::null();
        let result = self.window.create_window_surface(instance, std::ptr::null(), &mut surface);

        if result == ash::vk::Result::SUCCESS {
            Ok(surface)
        } else {
            Err(WindowError::GlfwError(format!("Failed to create Vulkan surface: {result:?}")))
        }
    }
}
