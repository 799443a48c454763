//! Command pool and command buffer recording

use ash::{vk, Device};

use crate::render::backends::vulkan::{VulkanError, VulkanResult};

/// Command pool wrapper with RAII cleanup
pub struct CommandPool {
    device: Device,
    command_pool: vk::CommandPool,
}

impl CommandPool {
    /// Create a pool whose buffers can be reset individually
    pub fn new(device: &Device, queue_family_index: u32) -> VulkanResult<Self> {
        let pool_create_info = vk::CommandPoolCreateInfo::builder()
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
            .queue_family_index(queue_family_index);

        let command_pool = unsafe { device.create_command_pool(&pool_create_info, None) }
            .map_err(VulkanError::init("command pool"))?;

        Ok(Self {
            device: device.clone(),
            command_pool,
        })
    }

    /// Allocate primary command buffers
    pub fn allocate_command_buffers(&self, count: u32) -> VulkanResult<Vec<vk::CommandBuffer>> {
        let alloc_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(self.command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count);

        unsafe { self.device.allocate_command_buffers(&alloc_info) }
            .map_err(VulkanError::init("command buffers"))
    }

    /// Record, submit and wait for a single-use command buffer
    ///
    /// Blocks until `queue` is idle, then frees the command buffer.
    pub fn run_one_shot<F>(&self, queue: vk::Queue, record: F) -> VulkanResult<()>
    where
        F: FnOnce(&Device, vk::CommandBuffer),
    {
        let command_buffer = self
            .allocate_command_buffers(1)?
            .into_iter()
            .next()
            .ok_or(VulkanError::Resource {
                what: "allocate one-shot command buffer",
                result: vk::Result::ERROR_UNKNOWN,
            })?;

        let result = self.submit_one_shot(queue, command_buffer, record);
        unsafe {
            self.device.free_command_buffers(self.command_pool, &[command_buffer]);
        }
        result
    }

    fn submit_one_shot<F>(&self, queue: vk::Queue, command_buffer: vk::CommandBuffer, record: F) -> VulkanResult<()>
    where
        F: FnOnce(&Device, vk::CommandBuffer),
    {
        let begin_info = vk::CommandBufferBeginInfo::builder().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe { self.device.begin_command_buffer(command_buffer, &begin_info) }
            .map_err(VulkanError::resource("begin one-shot commands"))?;

        record(&self.device, command_buffer);

        unsafe { self.device.end_command_buffer(command_buffer) }
            .map_err(VulkanError::resource("end one-shot commands"))?;

        let command_buffers = [command_buffer];
        let submit_info = vk::SubmitInfo::builder().command_buffers(&command_buffers).build();
        unsafe {
            self.device
                .queue_submit(queue, &[submit_info], vk::Fence::null())
                .map_err(VulkanError::resource("submit one-shot commands"))?;
            self.device
                .queue_wait_idle(queue)
                .map_err(VulkanError::resource("wait for one-shot commands"))
        }
    }

    /// Pool handle
    pub const fn handle(&self) -> vk::CommandPool {
        self.command_pool
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_command_pool(self.command_pool, None);
        }
    }
}

/// Records one frame into a resettable command buffer
pub struct CommandRecorder<'a> {
    device: &'a Device,
    command_buffer: vk::CommandBuffer,
}

impl<'a> CommandRecorder<'a> {
    /// Reset `command_buffer` and begin recording
    pub fn begin(device: &'a Device, command_buffer: vk::CommandBuffer) -> VulkanResult<Self> {
        unsafe {
            device
                .reset_command_buffer(command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(VulkanError::runtime("reset command buffer"))?;
            device
                .begin_command_buffer(command_buffer, &vk::CommandBufferBeginInfo::builder())
                .map_err(VulkanError::runtime("begin command buffer"))?;
        }
        Ok(Self { device, command_buffer })
    }

    /// Begin a render pass; it ends when the returned guard drops
    pub fn begin_render_pass(
        &mut self,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        render_area: vk::Rect2D,
        clear_values: &[vk::ClearValue],
    ) -> ActiveRenderPass<'_, 'a> {
        let begin_info = vk::RenderPassBeginInfo::builder()
            .render_pass(render_pass)
            .framebuffer(framebuffer)
            .render_area(render_area)
            .clear_values(clear_values);

        unsafe {
            self.device
                .cmd_begin_render_pass(self.command_buffer, &begin_info, vk::SubpassContents::INLINE);
        }
        ActiveRenderPass { recorder: self }
    }

    /// Finish recording
    pub fn end(self) -> VulkanResult<vk::CommandBuffer> {
        unsafe { self.device.end_command_buffer(self.command_buffer) }
            .map_err(VulkanError::runtime("end command buffer"))?;
        Ok(self.command_buffer)
    }
}

/// Render pass scope; ends the pass on drop
pub struct ActiveRenderPass<'r, 'a> {
    recorder: &'r mut CommandRecorder<'a>,
}

impl ActiveRenderPass<'_, '_> {
    fn device(&self) -> &Device {
        self.recorder.device
    }

    fn command_buffer(&self) -> vk::CommandBuffer {
        self.recorder.command_buffer
    }

    /// Set the dynamic viewport
    pub fn set_viewport(&mut self, viewport: vk::Viewport) {
        unsafe { self.device().cmd_set_viewport(self.command_buffer(), 0, &[viewport]) }
    }

    /// Set the dynamic scissor
    pub fn set_scissor(&mut self, scissor: vk::Rect2D) {
        unsafe { self.device().cmd_set_scissor(self.command_buffer(), 0, &[scissor]) }
    }

    /// Bind a graphics pipeline
    pub fn bind_pipeline(&mut self, pipeline: vk::Pipeline) {
        unsafe {
            self.device()
                .cmd_bind_pipeline(self.command_buffer(), vk::PipelineBindPoint::GRAPHICS, pipeline);
        }
    }

    /// Bind one descriptor set at set 0
    pub fn bind_descriptor_set(&mut self, layout: vk::PipelineLayout, descriptor_set: vk::DescriptorSet) {
        unsafe {
            self.device().cmd_bind_descriptor_sets(
                self.command_buffer(),
                vk::PipelineBindPoint::GRAPHICS,
                layout,
                0,
                &[descriptor_set],
                &[],
            );
        }
    }

    /// Bind a vertex buffer at binding 0
    pub fn bind_vertex_buffer(&mut self, buffer: vk::Buffer) {
        unsafe { self.device().cmd_bind_vertex_buffers(self.command_buffer(), 0, &[buffer], &[0]) }
    }

    /// Bind a 32-bit index buffer
    pub fn bind_index_buffer(&mut self, buffer: vk::Buffer) {
        unsafe {
            self.device()
                .cmd_bind_index_buffer(self.command_buffer(), buffer, 0, vk::IndexType::UINT32);
        }
    }

    /// Draw one instance of `index_count` indices
    pub fn draw_indexed(&mut self, index_count: u32) {
        unsafe { self.device().cmd_draw_indexed(self.command_buffer(), index_count, 1, 0, 0, 0) }
    }
}

impl Drop for ActiveRenderPass<'_, '_> {
    fn drop(&mut self) {
        unsafe {
            self.recorder.device.cmd_end_render_pass(self.recorder.command_buffer);
        }
    }
}
