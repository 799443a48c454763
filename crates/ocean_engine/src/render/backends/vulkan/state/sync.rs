//! Vulkan synchronization primitives
//!
//! RAII wrappers for semaphores and fences plus [`FrameSync`], the set owned
//! by one frame slot.

use ash::{vk, Device};

use crate::render::backends::vulkan::{VulkanError, VulkanResult};

/// Binary semaphore for GPU-GPU ordering
pub struct Semaphore {
    device: Device,
    semaphore: vk::Semaphore,
}

impl Semaphore {
    /// Create an unsignaled semaphore
    pub fn new(device: &Device) -> VulkanResult<Self> {
        let create_info = vk::SemaphoreCreateInfo::builder();
        let semaphore =
            unsafe { device.create_semaphore(&create_info, None) }.map_err(VulkanError::init("semaphore"))?;

        Ok(Self {
            device: device.clone(),
            semaphore,
        })
    }

    /// Semaphore handle
    pub const fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_semaphore(self.semaphore, None);
        }
    }
}

/// Fence for CPU-GPU synchronization
pub struct Fence {
    device: Device,
    fence: vk::Fence,
}

impl Fence {
    /// Create a fence, optionally already signaled
    pub fn new(device: &Device, signaled: bool) -> VulkanResult<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let create_info = vk::FenceCreateInfo::builder().flags(flags);
        let fence = unsafe { device.create_fence(&create_info, None) }.map_err(VulkanError::init("fence"))?;

        Ok(Self {
            device: device.clone(),
            fence,
        })
    }

    /// Block until the fence is signaled
    pub fn wait(&self, timeout: u64) -> VulkanResult<()> {
        unsafe { self.device.wait_for_fences(&[self.fence], true, timeout) }
            .map_err(VulkanError::runtime("wait for fence"))
    }

    /// Return the fence to the unsignaled state
    pub fn reset(&self) -> VulkanResult<()> {
        unsafe { self.device.reset_fences(&[self.fence]) }.map_err(VulkanError::runtime("reset fence"))
    }

    /// Fence handle
    pub const fn handle(&self) -> vk::Fence {
        self.fence
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_fence(self.fence, None);
        }
    }
}

/// Synchronization objects of one frame slot
///
/// The fence starts signaled so the first wait on a fresh slot returns at once.
pub struct FrameSync {
    /// Signaled when the acquired image is ready to be rendered to
    pub image_available: Semaphore,
    /// Signaled when rendering is complete and the image can be presented
    pub render_finished: Semaphore,
    /// Signaled when the slot's submission has finished executing
    pub in_flight: Fence,
}

impl FrameSync {
    /// Create the three objects
    pub fn new(device: &Device) -> VulkanResult<Self> {
        Ok(Self {
            image_available: Semaphore::new(device)?,
            render_finished: Semaphore::new(device)?,
            in_flight: Fence::new(device, true)?,
        })
    }
}
