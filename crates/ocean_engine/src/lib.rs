//! # Ocean Engine
//!
//! A Vulkan rendering engine built around one render pass, one graphics
//! pipeline and one swapchain, with explicit frame pacing.
//!
//! ## Features
//!
//! - **Device selection**: scored over every physical device, rejecting devices
//!   without geometry shading, anisotropic sampling or a graphics+present queue
//! - **Staged uploads**: vertex, index and texture data always travel through a
//!   transient host-visible staging buffer
//! - **Swapchain lifecycle**: full teardown and rebuild on resize or
//!   out-of-date surfaces, suspending while the window is minimized
//! - **Frames in flight**: fence and semaphore discipline per frame slot
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ocean_engine::prelude::*;
//!
//! fn main() -> Result<(), EngineError> {
//!     let config = EngineConfig::default();
//!     let scene = Scene {
//!         meshes: Vec::new(),
//!         texture: ImageData::solid([255, 255, 255, 255]),
//!         view: look_at(Vec3::new(2.0, 2.0, 2.0), Vec3::zeros(), Vec3::y()),
//!     };
//!     let report = Engine::run(&config, &scene)?;
//!     println!("{} frames", report.stats.frames_presented);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod foundation;
pub mod render;

mod engine;

pub use engine::{Engine, EngineError, RunReport, Scene};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, EngineConfig, PresentModePreference},
        foundation::{
            math::{look_at, Mat4, Vec3},
            time::Timer,
        },
        render::{
            backends::vulkan::{ErrorKind, VulkanError, VulkanResult},
            FrameInput, ImageData, Mesh, MeshBuilder, Vertex,
        },
        Engine, EngineError, RunReport, Scene,
    };
}
