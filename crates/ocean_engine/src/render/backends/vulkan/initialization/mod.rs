//! Vulkan initialization: instance, device selection, context and window

pub mod context;
pub mod device_selector;
pub mod instance;
pub mod window;

pub use context::{LogicalDevice, PresentationSurface, SurfaceSource, VulkanContext};
pub use device_selector::{select_device, DeviceCandidate, PhysicalDeviceInfo};
pub use instance::VulkanInstance;
pub use window::{Window, WindowError};
