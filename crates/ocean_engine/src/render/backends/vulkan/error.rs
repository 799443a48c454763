//! Vulkan backend errors
//!
//! Every failure the backend can produce is a [`VulkanError`]. Variants are
//! grouped into four categories exposed through [`VulkanError::kind`]:
//! startup failures, resource failures, runtime submission failures, and the
//! single recoverable condition, an out-of-date surface.

use ash::vk;
use thiserror::Error;

/// Error category used by callers to decide how to react
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Instance, device, surface, swapchain or pipeline could not be set up
    Initialization,
    /// Upload payload, memory type, buffer or image failure
    Resource,
    /// Submission or presentation failure not caused by the surface
    Runtime,
    /// Swapchain no longer matches the surface; handled by a rebuild
    SurfaceInvalidated,
}

/// Vulkan-specific error types
#[derive(Error, Debug)]
pub enum VulkanError {
    /// The Vulkan loader library could not be opened
    #[error("Failed to load Vulkan: {0}")]
    Loader(String),

    /// No enumerated device passed the feature and scoring checks
    #[error("No suitable graphics device found")]
    NoSuitableDevice,

    /// An instance or device extension is not available
    #[error("Required extension not available: {0}")]
    MissingExtension(String),

    /// The selected device has no queue family doing graphics and presentation
    #[error("No queue family supports graphics and presentation: {0}")]
    NoSuitableQueueFamily(String),

    /// A validation layer is not available
    #[error("Required layer not available: {0}")]
    MissingLayer(String),

    /// Window system failure while setting up the surface
    #[error("Window error: {0}")]
    Window(String),

    /// Shader bytecode could not be read or is malformed
    #[error("Shader error: {0}")]
    Shader(String),

    /// A creation call failed during startup or rebuild
    #[error("Failed to create {what}: {result:?}")]
    Initialization {
        /// Object being created
        what: &'static str,
        /// Result code returned by the driver
        result: vk::Result,
    },

    /// Upload payload is empty
    #[error("Invalid upload payload: {0}")]
    InvalidPayload(String),

    /// No memory type satisfies the type mask and property flags
    #[error("No suitable memory type found")]
    NoSuitableMemoryType,

    /// Image layout transition without a known barrier mapping
    #[error("Unsupported layout transition: {from:?} -> {to:?}")]
    UnsupportedLayoutTransition {
        /// Current layout
        from: vk::ImageLayout,
        /// Requested layout
        to: vk::ImageLayout,
    },

    /// Buffer, image or memory operation failed
    #[error("Resource operation '{what}' failed: {result:?}")]
    Resource {
        /// Operation that failed
        what: &'static str,
        /// Result code returned by the driver
        result: vk::Result,
    },

    /// Per-frame operation failed
    #[error("Runtime operation '{what}' failed: {result:?}")]
    Runtime {
        /// Operation that failed
        what: &'static str,
        /// Result code returned by the driver
        result: vk::Result,
    },

    /// Swapchain is out of date or suboptimal for the surface
    #[error("Swapchain no longer matches the surface")]
    SurfaceInvalidated,
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;

impl VulkanError {
    /// Category of this error
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Loader(_)
            | Self::NoSuitableDevice
            | Self::MissingExtension(_)
            | Self::NoSuitableQueueFamily(_)
            | Self::MissingLayer(_)
            | Self::Window(_)
            | Self::Shader(_)
            | Self::Initialization { .. } => ErrorKind::Initialization,
            Self::InvalidPayload(_)
            | Self::NoSuitableMemoryType
            | Self::UnsupportedLayoutTransition { .. }
            | Self::Resource { .. } => ErrorKind::Resource,
            Self::Runtime { .. } => ErrorKind::Runtime,
            Self::SurfaceInvalidated => ErrorKind::SurfaceInvalidated,
        }
    }

    /// Whether a swapchain rebuild recovers from this error
    pub const fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::SurfaceInvalidated)
    }

    /// Mapper for creation failures, for use with `map_err`
    pub fn init(what: &'static str) -> impl Fn(vk::Result) -> Self {
        move |result| Self::Initialization { what, result }
    }

    /// Mapper for resource failures, for use with `map_err`
    pub fn resource(what: &'static str) -> impl Fn(vk::Result) -> Self {
        move |result| Self::Resource { what, result }
    }

    /// Mapper for per-frame failures; out-of-date results become `SurfaceInvalidated`
    pub fn runtime(what: &'static str) -> impl Fn(vk::Result) -> Self {
        move |result| match result {
            vk::Result::ERROR_OUT_OF_DATE_KHR | vk::Result::SUBOPTIMAL_KHR => {
                Self::SurfaceInvalidated
            }
            other => Self::Runtime { what, result: other },
        }
    }
}
