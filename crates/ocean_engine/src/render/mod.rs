//! Rendering: backend-agnostic data and the frame scheduler, plus the Vulkan backend

pub mod backends;
pub mod frame_scheduler;
pub mod image_data;
pub mod mesh;
pub mod uniforms;

pub use frame_scheduler::{FrameBackend, FrameOutcome, FrameScheduler, SchedulerStats, SurfaceProvider};
pub use image_data::ImageData;
pub use mesh::{Mesh, MeshBuilder, Vertex};
pub use uniforms::{FrameInput, Projection, UniformBufferObject};
