//! Surface-dependent state and synchronization

pub mod framebuffer;
pub mod swapchain;
pub mod swapchain_manager;
pub mod sync;

pub use framebuffer::{find_depth_format, DepthBuffer, Framebuffer};
pub use swapchain::{Swapchain, SwapchainSettings, SwapchainSupport};
pub use swapchain_manager::SwapchainManager;
pub use sync::{Fence, FrameSync, Semaphore};
