//! oceanlight: textured model viewer
//!
//! Loads every `.obj` model from a directory and one RGBA texture, then hands
//! them to the engine until the window is closed.

mod obj_loader;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use ocean_engine::prelude::*;
use thiserror::Error;

use crate::obj_loader::{find_obj_files, load_obj, ObjError};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "oceanlight", version, about = "Render OBJ models with a Vulkan forward pass")]
struct Args {
    /// Initial window width
    #[arg(short = 'x', long)]
    width: Option<u32>,

    /// Initial window height
    #[arg(short = 'y', long)]
    height: Option<u32>,

    /// TOML or RON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory scanned for .obj models
    #[arg(long)]
    models: Option<PathBuf>,

    /// Texture applied to every model
    #[arg(long)]
    texture: Option<PathBuf>,

    /// Enable Vulkan validation layers
    #[arg(long)]
    validation: bool,
}

#[derive(Error, Debug)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to load model {}: {source}", path.display())]
    Model { path: PathBuf, source: ObjError },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("oceanlight: {err}");
            return ExitCode::FAILURE;
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_level.as_str())).init();
    log::info!("Starting {} {}", config.application_name, env!("CARGO_PKG_VERSION"));

    match run(&config) {
        Ok(report) => {
            log::info!(
                "Rendered {} frames in {:.1}s",
                report.stats.frames_presented,
                report.elapsed_seconds
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err}");
            eprintln!("oceanlight: {err}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> Result<EngineConfig, AppError> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load_from_file(path)?,
        None => EngineConfig::default(),
    };

    if let Some(width) = args.width {
        config.window.width = width;
    }
    if let Some(height) = args.height {
        config.window.height = height;
    }
    if let Some(models) = &args.models {
        config.assets.model_dir = models.display().to_string();
    }
    if let Some(texture) = &args.texture {
        config.assets.texture_path = texture.display().to_string();
    }
    if args.validation {
        config.renderer.enable_validation = true;
    }

    config.validate()?;
    Ok(config)
}

fn run(config: &EngineConfig) -> Result<RunReport, AppError> {
    let scene = Scene {
        meshes: load_models(Path::new(&config.assets.model_dir))?,
        texture: load_texture(Path::new(&config.assets.texture_path)),
        view: look_at(Vec3::new(2.0, 2.0, 2.0), Vec3::zeros(), Vec3::y()),
    };

    Ok(Engine::run(config, &scene)?)
}

/// Load every model in `dir`; a missing directory yields an empty scene
fn load_models(dir: &Path) -> Result<Vec<Mesh>, AppError> {
    let files = match find_obj_files(dir) {
        Ok(files) => files,
        Err(err) => {
            log::warn!("Cannot read model directory {}: {err}", dir.display());
            return Ok(Vec::new());
        }
    };

    let mut meshes = Vec::with_capacity(files.len());
    for path in files {
        let mesh = load_obj(&path).map_err(|source| AppError::Model {
            path: path.clone(),
            source,
        })?;
        log::info!(
            "Loaded model '{}': {} vertices, {} indices",
            mesh.name,
            mesh.vertices.len(),
            mesh.indices.len()
        );
        meshes.push(mesh);
    }
    Ok(meshes)
}

/// Decode `path` as RGBA8, falling back to a single white texel
fn load_texture(path: &Path) -> ImageData {
    let decoded = image::open(path).map_err(|err| err.to_string()).and_then(|image| {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        ImageData::from_rgba8(width, height, rgba.into_raw()).map_err(|err| err.to_string())
    });

    match decoded {
        Ok(texture) => {
            log::info!("Loaded texture {} ({}x{})", path.display(), texture.width(), texture.height());
            texture
        }
        Err(err) => {
            log::warn!("Using a white texture, {} could not be loaded: {err}", path.display());
            ImageData::solid([255, 255, 255, 255])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_overrides_defaults() {
        let args = Args::parse_from(["oceanlight", "-x", "1024", "-y", "768", "--models", "assets"]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 768);
        assert_eq!(config.assets.model_dir, "assets");
    }

    #[test]
    fn test_zero_width_is_rejected() {
        let args = Args::parse_from(["oceanlight", "--width", "0"]);
        assert!(matches!(load_config(&args), Err(AppError::Config(_))));
    }

    #[test]
    fn test_config_file_is_loaded() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("oceanlight.toml");
        std::fs::write(&path, "[window]\nwidth = 300\nheight = 200\n").unwrap();

        let args = Args::parse_from(["oceanlight", "--config", path.to_str().unwrap()]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.window.width, 300);
        assert_eq!(config.window.height, 200);
        assert_eq!(config.window.title, "oceanlight");
    }

    #[test]
    fn test_missing_texture_falls_back_to_white() {
        let texture = load_texture(Path::new("does/not/exist.png"));
        assert_eq!((texture.width(), texture.height()), (1, 1));
        assert_eq!(texture.pixels(), &[255, 255, 255, 255]);
    }

    #[test]
    fn test_texture_is_decoded_to_rgba() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("checker.png");
        let mut checker = image::RgbaImage::new(2, 2);
        checker.put_pixel(1, 0, image::Rgba([0, 0, 0, 255]));
        checker.save(&path).unwrap();

        let texture = load_texture(&path);
        assert_eq!((texture.width(), texture.height()), (2, 2));
        assert_eq!(texture.pixels().len(), 16);
    }

    #[test]
    fn test_missing_model_directory_gives_empty_scene() {
        let meshes = load_models(Path::new("does/not/exist")).unwrap();
        assert!(meshes.is_empty());
    }

    #[test]
    fn test_broken_model_names_the_file() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("broken.obj"), "v 0 0 0\nf 1 2 3\n").unwrap();
        let err = load_models(dir.path()).unwrap_err();
        assert!(err.to_string().contains("broken.obj"));
    }
}
