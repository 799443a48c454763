//! Core engine implementation
//!
//! [`Engine::run`] is the only place that turns GPU errors into a return value
//! for the application. Out-of-date swapchains are handled inside the frame
//! scheduler and never reach this level.

use thiserror::Error;

use crate::config::{ConfigError, EngineConfig};
use crate::foundation::math::Mat4;
use crate::foundation::time::Timer;
use crate::render::backends::vulkan::{RendererSettings, VulkanError, VulkanRenderer, Window, WindowError};
use crate::render::frame_scheduler::{FrameScheduler, SchedulerStats};
use crate::render::image_data::ImageData;
use crate::render::mesh::Mesh;
use crate::render::uniforms::FrameInput;

/// Engine error types
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Window could not be created
    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    /// Vulkan initialization or runtime failure
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] VulkanError),
}

/// Decoded scene handed to the renderer
#[derive(Debug, Clone)]
pub struct Scene {
    /// Meshes drawn every frame
    pub meshes: Vec<Mesh>,
    /// Texture sampled by every mesh
    pub texture: ImageData,
    /// World-to-view transform
    pub view: Mat4,
}

/// What happened during a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunReport {
    /// Frame scheduler counters
    pub stats: SchedulerStats,
    /// Seconds the render loop ran
    pub elapsed_seconds: f32,
    /// Average frames per second over the run
    pub average_fps: f32,
}

/// Main engine entry point
pub struct Engine;

impl Engine {
    /// Open a window, render `scene` until it is closed, then shut down cleanly
    pub fn run(config: &EngineConfig, scene: &Scene) -> Result<RunReport, EngineError> {
        log::info!("Initializing engine...");
        let settings = RendererSettings::from_config(config)?;

        let mut window = Window::new(&config.window.title, config.window.width, config.window.height)?;
        let mut renderer = VulkanRenderer::new(&mut window, &settings, &scene.meshes, &scene.texture)?;
        let mut scheduler = FrameScheduler::for_backend(&renderer);

        log::info!("Starting main loop...");
        let mut timer = Timer::new();
        scheduler.run(&mut renderer, &mut window, || {
            timer.tick();
            FrameInput {
                elapsed_seconds: timer.total_time(),
                view: scene.view,
            }
        })?;

        let report = RunReport {
            stats: scheduler.stats(),
            elapsed_seconds: timer.total_time(),
            average_fps: timer.average_fps(),
        };
        log::info!(
            "Engine shutdown: {} frames presented, {} skipped, {} swapchain rebuilds, {:.1} fps average",
            report.stats.frames_presented,
            report.stats.frames_skipped,
            report.stats.rebuilds,
            report.average_fps
        );
        Ok(report)
    }
}
