//! # Engine Configuration
//!
//! Settings consumed by [`crate::Engine`]: window size, shader and
//! asset locations, and renderer tuning. Every section has defaults so a
//! partial file only needs to name the values it changes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};

/// Upper bound on frame slots accepted from configuration
const MAX_FRAMES_IN_FLIGHT: usize = 4;

/// Directories searched for compiled shaders when a path is relative
const SHADER_SEARCH_DIRS: [&str; 4] = ["target/shaders", "shaders", "resources/shaders", "."];

/// Window creation parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Initial framebuffer width in pixels
    pub width: u32,
    /// Initial framebuffer height in pixels
    pub height: u32,
    /// Window title
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            title: "oceanlight".to_string(),
        }
    }
}

/// Compiled SPIR-V shader locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
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

    /// Resolve both shader paths against the shader search directories
    pub fn resolve(&self) -> Result<(PathBuf, PathBuf), ConfigError> {
        Ok((
            resolve_shader_path(&self.vertex_shader_path)?,
            resolve_shader_path(&self.fragment_shader_path)?,
        ))
    }
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self::new("vertex_shader.spv", "fragment_shader.spv")
    }
}

fn resolve_shader_path(name: &str) -> Result<PathBuf, ConfigError> {
    let path = Path::new(name);
    if path.is_absolute() || path.exists() {
        return Ok(path.to_path_buf());
    }

    SHADER_SEARCH_DIRS
        .iter()
        .map(|dir| Path::new(dir).join(name))
        .find(|candidate| candidate.exists())
        .ok_or_else(|| ConfigError::Invalid(format!("Shader not found: {name}")))
}

/// Model and texture locations handed to the application's loaders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory scanned for `.obj` models
    pub model_dir: String,
    /// RGBA texture applied to every model
    pub texture_path: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            model_dir: "models".to_string(),
            texture_path: "textures/texture.png".to_string(),
        }
    }
}

/// Presentation mode preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PresentModePreference {
    /// Mailbox, then immediate, then FIFO
    #[default]
    LowLatency,
    /// Always FIFO
    VSync,
}

/// Renderer tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Number of frame slots cycled by the frame scheduler
    pub max_frames_in_flight: usize,
    /// Whether to enable Vulkan validation layers
    pub enable_validation: bool,
    /// Presentation mode preference
    pub present_mode: PresentModePreference,
    /// Color the render pass clears to
    pub clear_color: [f32; 4],
    /// Vertical field of view
    pub field_of_view_degrees: f32,
    /// Near clip plane
    pub near_plane: f32,
    /// Far clip plane
    pub far_plane: f32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_frames_in_flight: 2,
            enable_validation: cfg!(debug_assertions),
            present_mode: PresentModePreference::default(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            field_of_view_degrees: 60.0,
            near_plane: 0.1,
            far_plane: 1000.0,
        }
    }
}

/// Top-level configuration file contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Application name for Vulkan instance creation
    pub application_name: String,
    /// Application version (major, minor, patch)
    pub application_version: (u32, u32, u32),
    /// Default log level when `RUST_LOG` is unset
    pub log_level: String,
    /// Window settings
    pub window: WindowConfig,
    /// Shader locations
    pub shaders: ShaderConfig,
    /// Asset locations
    pub assets: AssetConfig,
    /// Renderer tuning
    pub renderer: RendererConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            application_name: "oceanlight".to_string(),
            application_version: (1, 0, 0),
            log_level: "info".to_string(),
            window: WindowConfig::default(),
            shaders: ShaderConfig::default(),
            assets: AssetConfig::default(),
            renderer: RendererConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Override the initial window size
    #[must_use]
    pub const fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window.width = width;
        self.window.height = height;
        self
    }

    /// Enable or disable validation layers
    #[must_use]
    pub const fn with_validation(mut self, enabled: bool) -> Self {
        self.renderer.enable_validation = enabled;
        self
    }

    /// Override the shader locations
    #[must_use]
    pub fn with_shaders(mut self, shaders: ShaderConfig) -> Self {
        self.shaders = shaders;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.application_name.is_empty() {
            return Err(ConfigError::Invalid("Application name cannot be empty".to_string()));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "Window size must be nonzero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if !(1..=MAX_FRAMES_IN_FLIGHT).contains(&self.renderer.max_frames_in_flight) {
            return Err(ConfigError::Invalid(format!(
                "Max frames in flight must be between 1 and {MAX_FRAMES_IN_FLIGHT}, got {}",
                self.renderer.max_frames_in_flight
            )));
        }
        if self.shaders.vertex_shader_path.is_empty() || self.shaders.fragment_shader_path.is_empty() {
            return Err(ConfigError::Invalid("Shader paths cannot be empty".to_string()));
        }
        let (near, far) = (self.renderer.near_plane, self.renderer.far_plane);
        if !(near > 0.0 && near < far) {
            return Err(ConfigError::Invalid(format!(
                "Clip planes must satisfy 0 < near < far, got near={near} far={far}"
            )));
        }
        Ok(())
    }
}

impl Config for EngineConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, TempDir};

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, 480);
        assert_eq!(config.renderer.max_frames_in_flight, 2);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(EngineConfig::default().with_window_size(0, 480).validate().is_err());

        let mut config = EngineConfig::default();
        config.renderer.max_frames_in_flight = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.renderer.near_plane = 10.0;
        config.renderer.far_plane = 1.0;
        assert!(config.validate().is_err());

        let config = EngineConfig::default().with_shaders(ShaderConfig::new("", "frag.spv"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "application_name = \"viewer\"\n\n[window]\nwidth = 1024").unwrap();

        let config = EngineConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.application_name, "viewer");
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 480);
        assert_eq!(config.renderer, RendererConfig::default());
    }

    #[test]
    fn test_save_and_load_ron() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("engine.ron");
        let mut config = EngineConfig::default().with_window_size(800, 600);
        config.renderer.present_mode = PresentModePreference::VSync;

        config.save_to_file(&path).unwrap();
        let loaded = EngineConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let file = Builder::new().suffix(".yaml").tempfile().unwrap();
        let result = EngineConfig::load_from_file(file.path());
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_shader_resolution() {
        let dir = TempDir::new().unwrap();
        let vert = dir.path().join("v.spv");
        let frag = dir.path().join("f.spv");
        std::fs::write(&vert, [0u8; 4]).unwrap();
        std::fs::write(&frag, [0u8; 4]).unwrap();

        let shaders = ShaderConfig::new(vert.to_string_lossy(), frag.to_string_lossy());
        let (v, f) = shaders.resolve().unwrap();
        assert_eq!(v, vert);
        assert_eq!(f, frag);

        let missing = ShaderConfig::new("definitely_missing_shader.spv", "also_missing.spv");
        assert!(matches!(missing.resolve(), Err(ConfigError::Invalid(_))));
    }
}
