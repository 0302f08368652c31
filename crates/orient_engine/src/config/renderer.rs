//! # Renderer Configuration
//!
//! Window, shader, texture and camera settings for the Vulkan renderer.
//! Every struct uses `#[serde(default)]` so a config file only needs the
//! keys it wants to override.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{Config, ConfigError};

/// Directories searched for compiled SPIR-V, in order
const SHADER_DIRS: [&str; 4] = ["target/shaders/", "shaders/", "resources/shaders/", "../target/shaders/"];

/// # Shader Configuration
///
/// Paths to the SPIR-V files of one vertex/fragment program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderConfig {
    /// Path to the vertex shader SPIR-V file
    pub vertex_shader_path: String,
    /// Path to the fragment shader SPIR-V file
    pub fragment_shader_path: String,
}

impl ShaderConfig {
    /// Create a new shader configuration
    pub fn new(vertex_path: impl Into<String>, fragment_path: impl Into<String>) -> Self {
        Self {
            vertex_shader_path: vertex_path.into(),
            fragment_shader_path: fragment_path.into(),
        }
    }

    /// Create shader config with automatic path resolution
    ///
    /// Tries the common shader locations so the binary can be started from
    /// the workspace root or from its own directory.
    pub fn with_path_resolution(base_vertex: &str, base_fragment: &str) -> Self {
        let resolve = |file: &str| {
            SHADER_DIRS
                .iter()
                .map(|dir| format!("{dir}{file}"))
                .find(|candidate| Path::new(candidate).exists())
                .unwrap_or_else(|| format!("{}{file}", SHADER_DIRS[0]))
        };

        Self {
            vertex_shader_path: resolve(base_vertex),
            fragment_shader_path: resolve(base_fragment),
        }
    }

    /// Validate that shader files exist
    pub fn validate(&self) -> Result<(), ConfigError> {
        for path in [&self.vertex_shader_path, &self.fragment_shader_path] {
            if !Path::new(path).exists() {
                return Err(ConfigError::Validation(format!("Shader not found: {path}")));
            }
        }
        Ok(())
    }
}

/// The three programs the renderer uses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderSet {
    /// Textured model shader
    pub basic: ShaderConfig,
    /// Vertex-colored line shader
    pub line: ShaderConfig,
    /// Overlay shader
    pub ui: ShaderConfig,
}

impl Default for ShaderSet {
    fn default() -> Self {
        Self {
            basic: ShaderConfig::with_path_resolution("basic_vert.spv", "basic_frag.spv"),
            line: ShaderConfig::with_path_resolution("line_vert.spv", "line_frag.spv"),
            ui: ShaderConfig::with_path_resolution("ui_vert.spv", "ui_frag.spv"),
        }
    }
}

impl ShaderSet {
    /// Validate that every shader file exists
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.basic.validate()?;
        self.line.validate()?;
        self.ui.validate()
    }
}

/// Initial window settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Initial width in screen coordinates
    pub width: u32,
    /// Initial height in screen coordinates
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Quaternion Spline Renderer".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Camera values used at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub field_of_view: f32,
    /// Horizontal view angle in degrees, `[0, 360)`
    pub view_azimuth: f32,
    /// Vertical view angle in degrees, `[-89, 89]`
    pub view_elevation: f32,
    /// Camera position in world space
    pub world_position: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            field_of_view: 60.0,
            view_azimuth: 0.0,
            view_elevation: -30.0,
            world_position: [-1.25, 2.0, 2.5],
        }
    }
}

/// # Renderer Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Application name for Vulkan instance creation
    pub application_name: String,
    /// Whether to enable Vulkan validation layers
    pub enable_validation: bool,
    /// PNG texture applied to the model
    pub texture_path: String,
    /// Framebuffer clear color (RGBA, 0..1)
    pub clear_color: [f32; 4],
    // Tables follow plain values so the TOML output stays valid
    /// Window settings
    pub window: WindowConfig,
    /// Shader locations
    pub shaders: ShaderSet,
    /// Startup camera
    pub camera: CameraConfig,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            application_name: "Quaternion Spline Renderer".to_string(),
            enable_validation: cfg!(debug_assertions),
            texture_path: "textures/crate.png".to_string(),
            clear_color: [0.25, 0.25, 0.25, 1.0],
            window: WindowConfig::default(),
            shaders: ShaderSet::default(),
            camera: CameraConfig::default(),
        }
    }
}

impl Config for RendererConfig {}

impl RendererConfig {
    /// Create a new renderer configuration
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            application_name: app_name.into(),
            ..Self::default()
        }
    }

    /// Set the initial window size
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window.width = width;
        self.window.height = height;
        self
    }

    /// Enable or disable validation layers
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.enable_validation = enabled;
        self
    }

    /// Validate value ranges.
    ///
    /// Shader files are checked separately by [`ShaderSet::validate`] when
    /// the renderer starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.application_name.is_empty() {
            return Err(ConfigError::Validation("Application name cannot be empty".to_string()));
        }

        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Validation(format!(
                "Window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }

        let camera = &self.camera;
        if !(40.0..=150.0).contains(&camera.field_of_view) {
            return Err(ConfigError::Validation(format!(
                "Field of view {} outside 40..=150",
                camera.field_of_view
            )));
        }
        if !(0.0..360.0).contains(&camera.view_azimuth) {
            return Err(ConfigError::Validation(format!(
                "View azimuth {} outside [0, 360)",
                camera.view_azimuth
            )));
        }
        if !(-89.0..=89.0).contains(&camera.view_elevation) {
            return Err(ConfigError::Validation(format!(
                "View elevation {} outside [-89, 89]",
                camera.view_elevation
            )));
        }

        if self.clear_color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(ConfigError::Validation("Clear color components must be in [0, 1]".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("orient_engine_{}_{name}", std::process::id()))
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(RendererConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_out_of_range_values() {
        let mut config = RendererConfig::default();
        config.camera.field_of_view = 170.0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = RendererConfig::default();
        config.camera.view_elevation = -90.0;
        assert!(config.validate().is_err());

        let config = RendererConfig::default().with_window_size(0, 600);
        assert!(config.validate().is_err());

        let config = RendererConfig::new("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let path = temp_path("roundtrip.toml");
        let config = RendererConfig::new("toml test").with_window_size(800, 600).with_validation(false);

        config.save_to_file(&path).unwrap();
        let loaded = RendererConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_ron_roundtrip() {
        let path = temp_path("roundtrip.ron");
        let mut config = RendererConfig::new("ron test");
        config.camera.view_azimuth = 123.0;

        config.save_to_file(&path).unwrap();
        let loaded = RendererConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: RendererConfig = toml::from_str(
            r#"
            application_name = "partial"

            [window]
            width = 1024
            "#,
        )
        .unwrap();

        assert_eq!(config.application_name, "partial");
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, WindowConfig::default().height);
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn test_unsupported_extension_is_rejected() {
        let result = RendererConfig::default().save_to_file(temp_path("config.json"));
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_missing_shader_fails_validation() {
        let shader = ShaderConfig::new("does/not/exist.spv", "neither.spv");
        assert!(shader.validate().is_err());
    }
}
