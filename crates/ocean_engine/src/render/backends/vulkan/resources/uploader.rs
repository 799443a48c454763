//! Staging uploads into device-local memory
//!
//! Every upload goes through a transient host-visible staging buffer sized to
//! the payload. The copy runs on a one-shot command buffer and the call blocks
//! until the queue is idle, after which the staging buffer is released. Images
//! get a barrier on each side of the copy so they end up shader-readable.

use ash::{vk, Device};

use super::buffer::Buffer;
use super::image::{single_subresource, GpuImage, ImageDescription};
use crate::render::backends::vulkan::initialization::VulkanContext;
use crate::render::backends::vulkan::rendering::CommandPool;
use crate::render::backends::vulkan::{VulkanError, VulkanResult};
use crate::render::image_data::ImageData;

/// Buffer parameters for one staged upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPlan {
    /// Exact payload size in bytes
    pub size: vk::DeviceSize,
    /// Staging buffer usage
    pub staging_usage: vk::BufferUsageFlags,
    /// Staging memory properties
    pub staging_memory: vk::MemoryPropertyFlags,
    /// Destination buffer usage
    pub destination_usage: vk::BufferUsageFlags,
    /// Destination memory properties
    pub destination_memory: vk::MemoryPropertyFlags,
}

impl UploadPlan {
    /// Plan an upload of `len` bytes into a buffer used as `usage`
    pub fn new(len: usize, usage: vk::BufferUsageFlags) -> VulkanResult<Self> {
        if len == 0 {
            return Err(VulkanError::InvalidPayload("upload payload is empty".to_string()));
        }

        Ok(Self {
            size: len as vk::DeviceSize,
            staging_usage: vk::BufferUsageFlags::TRANSFER_SRC,
            staging_memory: vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            destination_usage: usage | vk::BufferUsageFlags::TRANSFER_DST,
            destination_memory: vk::MemoryPropertyFlags::DEVICE_LOCAL,
        })
    }
}

/// Access masks and stages for one image layout change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutTransition {
    /// Layout before the barrier
    pub old_layout: vk::ImageLayout,
    /// Layout after the barrier
    pub new_layout: vk::ImageLayout,
    /// Accesses made available
    pub src_access: vk::AccessFlags,
    /// Accesses made visible
    pub dst_access: vk::AccessFlags,
    /// Stage the barrier waits on
    pub src_stage: vk::PipelineStageFlags,
    /// Stage blocked by the barrier
    pub dst_stage: vk::PipelineStageFlags,
    /// Aspect of the image affected
    pub aspect: vk::ImageAspectFlags,
}

impl LayoutTransition {
    /// Look up the barrier for `old -> new`
    ///
    /// Only the transitions the renderer performs are known; anything else is
    /// [`VulkanError::UnsupportedLayoutTransition`].
    pub fn between(old: vk::ImageLayout, new: vk::ImageLayout) -> VulkanResult<Self> {
        let (src_access, dst_access, src_stage, dst_stage, aspect) = match (old, new) {
            (vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL) => (
                vk::AccessFlags::empty(),
                vk::AccessFlags::TRANSFER_WRITE,
                vk::PipelineStageFlags::TOP_OF_PIPE,
                vk::PipelineStageFlags::TRANSFER,
                vk::ImageAspectFlags::COLOR,
            ),
            (vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL) => (
                vk::AccessFlags::TRANSFER_WRITE,
                vk::AccessFlags::SHADER_READ,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
                vk::ImageAspectFlags::COLOR,
            ),
            (vk::ImageLayout::UNDEFINED, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL) => (
                vk::AccessFlags::empty(),
                vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
                vk::PipelineStageFlags::TOP_OF_PIPE,
                vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
                vk::ImageAspectFlags::DEPTH,
            ),
            _ => return Err(VulkanError::UnsupportedLayoutTransition { from: old, to: new }),
        };

        Ok(Self {
            old_layout: old,
            new_layout: new,
            src_access,
            dst_access,
            src_stage,
            dst_stage,
            aspect,
        })
    }

    /// Same transition with the stencil aspect added, for combined depth/stencil formats
    pub fn with_stencil(mut self, has_stencil: bool) -> Self {
        if has_stencil && self.aspect.contains(vk::ImageAspectFlags::DEPTH) {
            self.aspect |= vk::ImageAspectFlags::STENCIL;
        }
        self
    }

    /// Record the barrier into `command_buffer`
    pub fn record(&self, device: &Device, command_buffer: vk::CommandBuffer, image: vk::Image) {
        let barrier = vk::ImageMemoryBarrier::builder()
            .old_layout(self.old_layout)
            .new_layout(self.new_layout)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image)
            .subresource_range(single_subresource(self.aspect))
            .src_access_mask(self.src_access)
            .dst_access_mask(self.dst_access)
            .build();

        unsafe {
            device.cmd_pipeline_barrier(
                command_buffer,
                self.src_stage,
                self.dst_stage,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[barrier],
            );
        }
    }
}

/// Moves CPU data into device-local buffers and images
pub struct ResourceUploader<'a> {
    context: &'a VulkanContext,
    command_pool: &'a CommandPool,
}

impl<'a> ResourceUploader<'a> {
    /// Create an uploader submitting through `command_pool` on the context queue
    pub const fn new(context: &'a VulkanContext, command_pool: &'a CommandPool) -> Self {
        Self { context, command_pool }
    }

    /// Upload `bytes` into a new device-local buffer used as `usage`
    pub fn upload_buffer(&self, bytes: &[u8], usage: vk::BufferUsageFlags) -> VulkanResult<Buffer> {
        let plan = UploadPlan::new(bytes.len(), usage)?;
        let staging = self.staging_buffer(&plan, bytes)?;

        let destination = Buffer::new(
            self.context.device(),
            &self.context.physical_device().memory_properties,
            plan.size,
            plan.destination_usage,
            plan.destination_memory,
        )?;

        self.command_pool.run_one_shot(self.context.queue(), |device, command_buffer| {
            let region = vk::BufferCopy {
                src_offset: 0,
                dst_offset: 0,
                size: plan.size,
            };
            unsafe {
                device.cmd_copy_buffer(command_buffer, staging.handle(), destination.handle(), &[region]);
            }
        })?;

        log::trace!("Uploaded {} bytes as {:?}", plan.size, usage);
        Ok(destination)
    }

    /// Upload RGBA8 pixels into a sampled image left in shader-read layout
    pub fn upload_image(&self, image: &ImageData, format: vk::Format) -> VulkanResult<GpuImage> {
        let plan = UploadPlan::new(image.pixels().len(), vk::BufferUsageFlags::empty())?;
        let staging = self.staging_buffer(&plan, image.pixels())?;

        let extent = vk::Extent2D {
            width: image.width(),
            height: image.height(),
        };
        let destination = GpuImage::new(
            self.context.device(),
            &self.context.physical_device().memory_properties,
            ImageDescription {
                extent,
                format,
                usage: vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED,
                aspect: vk::ImageAspectFlags::COLOR,
            },
        )?;

        let to_transfer = LayoutTransition::between(vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL)?;
        let to_shader_read = LayoutTransition::between(
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        )?;

        self.command_pool.run_one_shot(self.context.queue(), |device, command_buffer| {
            to_transfer.record(device, command_buffer, destination.handle());

            let region = vk::BufferImageCopy::builder()
                .buffer_offset(0)
                .buffer_row_length(0)
                .buffer_image_height(0)
                .image_subresource(vk::ImageSubresourceLayers {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_level: 0,
                    base_array_layer: 0,
                    layer_count: 1,
                })
                .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
                .image_extent(vk::Extent3D {
                    width: extent.width,
                    height: extent.height,
                    depth: 1,
                })
                .build();
            unsafe {
                device.cmd_copy_buffer_to_image(
                    command_buffer,
                    staging.handle(),
                    destination.handle(),
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    &[region],
                );
            }

            to_shader_read.record(device, command_buffer, destination.handle());
        })?;

        log::debug!("Uploaded {}x{} image as {:?}", extent.width, extent.height, format);
        Ok(destination)
    }

    /// Move a freshly created image into `new_layout` with no data copy
    pub fn transition_image(
        &self,
        image: vk::Image,
        transition: LayoutTransition,
    ) -> VulkanResult<()> {
        self.command_pool.run_one_shot(self.context.queue(), |device, command_buffer| {
            transition.record(device, command_buffer, image);
        })
    }

    fn staging_buffer(&self, plan: &UploadPlan, bytes: &[u8]) -> VulkanResult<Buffer> {
        let staging = Buffer::new(
            self.context.device(),
            &self.context.physical_device().memory_properties,
            plan.size,
            plan.staging_usage,
            plan.staging_memory,
        )?;
        staging.write_bytes(bytes)?;
        Ok(staging)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_payload_is_rejected() {
        let result = UploadPlan::new(0, vk::BufferUsageFlags::VERTEX_BUFFER);
        assert!(matches!(result, Err(VulkanError::InvalidPayload(_))));
    }

    #[test]
    fn test_plan_keeps_exact_size() {
        for len in [1_usize, 3, 32, 4099] {
            let plan = UploadPlan::new(len, vk::BufferUsageFlags::INDEX_BUFFER).unwrap();
            assert_eq!(plan.size, len as vk::DeviceSize);
        }
    }

    #[test]
    fn test_plan_flags() {
        let plan = UploadPlan::new(64, vk::BufferUsageFlags::VERTEX_BUFFER).unwrap();

        assert_eq!(plan.staging_usage, vk::BufferUsageFlags::TRANSFER_SRC);
        assert!(plan.staging_memory.contains(vk::MemoryPropertyFlags::HOST_VISIBLE));
        assert!(plan.staging_memory.contains(vk::MemoryPropertyFlags::HOST_COHERENT));
        assert!(!plan.staging_memory.contains(vk::MemoryPropertyFlags::DEVICE_LOCAL));

        assert!(plan.destination_usage.contains(vk::BufferUsageFlags::VERTEX_BUFFER));
        assert!(plan.destination_usage.contains(vk::BufferUsageFlags::TRANSFER_DST));
        assert_eq!(plan.destination_memory, vk::MemoryPropertyFlags::DEVICE_LOCAL);
    }

    #[test]
    fn test_texture_transitions() {
        let before = LayoutTransition::between(vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL).unwrap();
        assert_eq!(before.src_stage, vk::PipelineStageFlags::TOP_OF_PIPE);
        assert_eq!(before.dst_stage, vk::PipelineStageFlags::TRANSFER);
        assert_eq!(before.dst_access, vk::AccessFlags::TRANSFER_WRITE);

        let after = LayoutTransition::between(
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        )
        .unwrap();
        assert_eq!(after.src_access, vk::AccessFlags::TRANSFER_WRITE);
        assert_eq!(after.dst_access, vk::AccessFlags::SHADER_READ);
        assert_eq!(after.dst_stage, vk::PipelineStageFlags::FRAGMENT_SHADER);
        assert_eq!(after.aspect, vk::ImageAspectFlags::COLOR);
    }

    #[test]
    fn test_depth_transition_aspect() {
        let depth = LayoutTransition::between(
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        )
        .unwrap();
        assert_eq!(depth.aspect, vk::ImageAspectFlags::DEPTH);
        assert_eq!(depth.dst_stage, vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS);

        let with_stencil = depth.with_stencil(true);
        assert_eq!(
            with_stencil.aspect,
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        );
        assert_eq!(depth.with_stencil(false).aspect, vk::ImageAspectFlags::DEPTH);
    }

    #[test]
    fn test_unknown_transition_is_an_error() {
        let result = LayoutTransition::between(
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        );
        assert!(matches!(
            result,
            Err(VulkanError::UnsupportedLayoutTransition { .. })
        ));
    }
}
