//! Backend implementations for the render module
//!
//! Only Vulkan is implemented; the frame scheduler talks to it through
//! [`FrameBackend`](crate::render::frame_scheduler::FrameBackend).

/// Vulkan rendering backend implementation
pub mod vulkan;
