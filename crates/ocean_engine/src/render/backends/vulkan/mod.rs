//! Vulkan backend implementation
//!
//! Organized into initialization, resources, rendering and state modules.

/// Backend error type and taxonomy
pub mod error;

/// Instance, device selection, context and window
pub mod initialization;

/// Buffers, uploads, textures, uniforms and descriptors
pub mod resources;

/// Shaders, pipelines, render passes and commands
pub mod rendering;

/// Swapchain, framebuffers and synchronization
pub mod state;

/// Main Vulkan renderer implementation
pub mod renderer;

pub use error::{ErrorKind, VulkanError, VulkanResult};

// Re-export main renderer
pub use renderer::{RendererSettings, VulkanRenderer};

// Re-export initialization types
pub use initialization::{select_device, DeviceCandidate, PhysicalDeviceInfo, VulkanContext, Window, WindowError};

// Re-export resource types
pub use resources::{Buffer, GpuModel, ResourceUploader, Texture, UniformBuffer, UploadPlan};

// Re-export rendering types
pub use rendering::{CommandPool, GraphicsPipeline, PipelineBuilder, RenderPass, ShaderModule};

// Re-export state types
pub use state::{Framebuffer, FrameSync, Swapchain, SwapchainManager, SwapchainSettings};
