//! Quaternion orientation demo
//!
//! Opens a window, renders the slerp/spline scene with its control panel and
//! dispatches window events to the renderer until the window closes.
//!
//! Usage: `orient_app [config.toml|config.ron]`

use std::path::{Path, PathBuf};

use orient_engine::config::{Config, ConfigError, RendererConfig};
use orient_engine::foundation::logging;
use orient_engine::render::vulkan::{VkRenderer, VulkanError, Window, WindowError};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "resources/config/renderer.toml";

/// Application-level errors
#[derive(Error, Debug)]
enum AppError {
    /// The configuration file exists but could not be used
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The window could not be opened
    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    /// Renderer initialization or a frame failed
    #[error("Renderer error: {0}")]
    Renderer(#[from] VulkanError),
}

/// Load the configuration, or use the defaults when the file does not exist
fn load_config(path: &Path) -> Result<RendererConfig, AppError> {
    if !path.exists() {
        log::info!("No configuration at {}, using defaults", path.display());
        return Ok(RendererConfig::default());
    }

    let config = RendererConfig::load_from_file(path).map_err(|e| {
        log::error!("Failed to load {}: {e}", path.display());
        e
    })?;
    log::info!("Loaded configuration from {}", path.display());
    Ok(config)
}

fn run(config: &RendererConfig) -> Result<(), AppError> {
    let window = Window::new(&config.window)?;
    let mut renderer = VkRenderer::init(window, config)?;

    while !renderer.should_close() {
        for event in renderer.poll_events() {
            renderer.handle_window_event(event);
        }

        if !renderer.draw()? {
            break;
        }
    }

    renderer.cleanup();
    Ok(())
}

fn main() -> Result<(), AppError> {
    logging::init();

    let config_path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = load_config(&config_path)?;

    log::info!("Starting {}", config.application_name);
    match run(&config) {
        Ok(()) => {
            log::info!("{} exited normally", config.application_name);
            Ok(())
        }
        Err(e) => {
            log::error!("{} failed: {e}", config.application_name);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_falls_back_to_defaults() {
        let config = load_config(Path::new("does/not/exist/renderer.toml")).unwrap();
        assert_eq!(config, RendererConfig::default());
    }

    #[test]
    fn test_unsupported_config_extension_is_an_error() {
        let path = std::env::temp_dir().join(format!("orient_app_config_{}.ini", std::process::id()));
        std::fs::write(&path, "title = 1").unwrap();

        let result = load_config(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(AppError::Config(ConfigError::UnsupportedFormat(_)))));
    }

    #[test]
    fn test_shipped_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join(DEFAULT_CONFIG_PATH);
        let config = load_config(&path).unwrap();
        assert!(config.validate().is_ok());
    }
}
