//! Persistently mapped per-frame uniform buffers

use ash::vk;
use std::ptr::NonNull;

use super::buffer::Buffer;
use crate::render::backends::vulkan::initialization::VulkanContext;
use crate::render::backends::vulkan::{VulkanError, VulkanResult};
use crate::render::uniforms::UniformBufferObject;

/// Host-visible uniform buffer mapped for its whole lifetime
pub struct UniformBuffer {
    mapped: NonNull<u8>,
    buffer: Buffer,
}

impl UniformBuffer {
    /// Size of one [`UniformBufferObject`]
    pub const SIZE: vk::DeviceSize = std::mem::size_of::<UniformBufferObject>() as vk::DeviceSize;

    /// Create and map one uniform buffer
    pub fn new(context: &VulkanContext) -> VulkanResult<Self> {
        let buffer = Buffer::new(
            context.device(),
            &context.physical_device().memory_properties,
            Self::SIZE,
            vk::BufferUsageFlags::UNIFORM_BUFFER,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;
        let mapped = NonNull::new(buffer.map()?.cast::<u8>()).ok_or(VulkanError::Resource {
            what: "map uniform buffer",
            result: vk::Result::ERROR_MEMORY_MAP_FAILED,
        })?;

        Ok(Self { mapped, buffer })
    }

    /// One buffer per frame slot
    pub fn per_frame(context: &VulkanContext, frames_in_flight: usize) -> VulkanResult<Vec<Self>> {
        (0..frames_in_flight).map(|_| Self::new(context)).collect()
    }

    /// Overwrite the buffer contents in place
    pub fn write(&mut self, ubo: &UniformBufferObject) {
        let bytes = ubo.as_bytes();
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), self.mapped.as_ptr(), bytes.len());
        }
    }

    /// Descriptor payload covering the whole buffer
    pub fn descriptor_info(&self) -> vk::DescriptorBufferInfo {
        vk::DescriptorBufferInfo {
            buffer: self.buffer.handle(),
            offset: 0,
            range: Self::SIZE,
        }
    }
}

impl Drop for UniformBuffer {
    fn drop(&mut self) {
        self.buffer.unmap();
    }
}
