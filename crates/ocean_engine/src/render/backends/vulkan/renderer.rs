//! Vulkan renderer
//!
//! [`VulkanRenderer`] is the context object for one engine run. It owns every
//! GPU object, from the context down to the per-frame slots, and implements
//! [`FrameBackend`] so the frame scheduler can drive it. Fields are declared
//! in reverse dependency order; `Drop` waits for the device to go idle before
//! any of them is released.

use ash::vk;
use std::path::PathBuf;

use super::initialization::{SurfaceSource, VulkanContext};
use super::rendering::{CommandPool, CommandRecorder, PipelineBuilder, PipelineBundle};
use super::resources::descriptor_set::scene_layout_builder;
use super::resources::{DescriptorPool, DescriptorSetLayout, GpuModel, ResourceUploader, Texture, UniformBuffer};
use super::state::{find_depth_format, FrameSync, SwapchainManager};
use super::{VulkanError, VulkanResult};
use crate::config::{ConfigError, EngineConfig, PresentModePreference};
use crate::render::frame_scheduler::{AcquireOutcome, FrameBackend, PresentOutcome, SurfaceProvider};
use crate::render::image_data::ImageData;
use crate::render::mesh::Mesh;
use crate::render::uniforms::{FrameInput, Projection, UniformBufferObject};

/// Renderer settings taken from [`EngineConfig`]
#[derive(Debug, Clone)]
pub struct RendererSettings {
    /// Application name reported to the driver
    pub application_name: String,
    /// Application version reported to the driver
    pub application_version: (u32, u32, u32),
    /// Enable validation layers
    pub enable_validation: bool,
    /// Number of frame slots
    pub frames_in_flight: usize,
    /// Presentation mode preference
    pub present_mode: PresentModePreference,
    /// Color the frame is cleared to
    pub clear_color: [f32; 4],
    /// Projection parameters
    pub projection: Projection,
    /// Resolved vertex shader path
    pub vertex_shader: PathBuf,
    /// Resolved fragment shader path
    pub fragment_shader: PathBuf,
}

impl RendererSettings {
    /// Validate `config` and resolve its shader paths
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (vertex_shader, fragment_shader) = config.shaders.resolve()?;

        Ok(Self {
            application_name: config.application_name.clone(),
            application_version: config.application_version,
            enable_validation: config.renderer.enable_validation,
            frames_in_flight: config.renderer.max_frames_in_flight,
            present_mode: config.renderer.present_mode,
            clear_color: config.renderer.clear_color,
            projection: Projection {
                fov_y_degrees: config.renderer.field_of_view_degrees,
                near: config.renderer.near_plane,
                far: config.renderer.far_plane,
            },
            vertex_shader,
            fragment_shader,
        })
    }
}

/// Resources exclusively owned by one frame slot
struct FrameSlot {
    uniform_buffer: UniformBuffer,
    sync: FrameSync,
    command_buffer: vk::CommandBuffer,
    descriptor_set: vk::DescriptorSet,
}

/// Vulkan implementation of the per-frame protocol
pub struct VulkanRenderer {
    models: Vec<GpuModel>,
    frames: Vec<FrameSlot>,
    // held for the lifetime of the descriptor sets
    _descriptor_pool: DescriptorPool,
    _texture: Texture,
    swapchain: Option<SwapchainManager>,
    pipeline: PipelineBundle,
    pipeline_builder: PipelineBuilder,
    _descriptor_set_layout: DescriptorSetLayout,
    command_pool: CommandPool,
    depth_format: vk::Format,
    present_mode: PresentModePreference,
    clear_color: [f32; 4],
    projection: Projection,
    context: VulkanContext,
}

impl VulkanRenderer {
    /// Bring up the whole GPU side for `window` and upload the scene
    ///
    /// Any failure aborts startup; objects created so far are released in
    /// reverse order.
    pub fn new<W>(window: &mut W, settings: &RendererSettings, meshes: &[Mesh], texture: &ImageData) -> VulkanResult<Self>
    where
        W: SurfaceSource + SurfaceProvider,
    {
        let context = VulkanContext::new(
            window,
            &settings.application_name,
            settings.application_version,
            settings.enable_validation,
        )?;
        let device = context.device();

        let command_pool = CommandPool::new(device, context.logical_device().queue_family_index())?;
        let depth_format = find_depth_format(&context)?;
        let descriptor_set_layout = scene_layout_builder().build(device)?;
        let pipeline_builder = PipelineBuilder::new(
            &settings.vertex_shader,
            &settings.fragment_shader,
            descriptor_set_layout.handle(),
        );

        let swapchain_settings = SwapchainManager::plan(&context, window.framebuffer_size(), settings.present_mode)?;
        let pipeline = pipeline_builder.build(device, swapchain_settings.surface_format.format, depth_format)?;

        let uploader = ResourceUploader::new(&context, &command_pool);
        let swapchain = SwapchainManager::build(
            &context,
            &uploader,
            swapchain_settings,
            depth_format,
            &pipeline.render_pass,
        )?;

        let texture = Texture::from_image_data(
            &uploader,
            device,
            texture,
            context.physical_device().max_sampler_anisotropy(),
        )?;

        let mut models = Vec::with_capacity(meshes.len());
        for mesh in meshes {
            if mesh.is_empty() {
                log::warn!("Skipping empty mesh '{}'", mesh.name);
                continue;
            }
            models.push(GpuModel::upload(&uploader, mesh)?);
        }

        let frames_in_flight = settings.frames_in_flight.max(1);
        let uniform_buffers = UniformBuffer::per_frame(&context, frames_in_flight)?;
        let descriptor_pool = DescriptorPool::for_frames(device, frames_in_flight as u32)?;
        let descriptor_sets = descriptor_pool.allocate_scene_sets(&descriptor_set_layout, &uniform_buffers, &texture)?;
        let command_buffers = command_pool.allocate_command_buffers(frames_in_flight as u32)?;

        let mut frames = Vec::with_capacity(frames_in_flight);
        for ((uniform_buffer, command_buffer), descriptor_set) in
            uniform_buffers.into_iter().zip(command_buffers).zip(descriptor_sets)
        {
            frames.push(FrameSlot {
                uniform_buffer,
                sync: FrameSync::new(device)?,
                command_buffer,
                descriptor_set,
            });
        }

        log::info!(
            "Renderer ready: {} models, {} frames in flight",
            models.len(),
            frames.len()
        );

        Ok(Self {
            models,
            frames,
            _descriptor_pool: descriptor_pool,
            _texture: texture,
            swapchain: Some(swapchain),
            pipeline,
            pipeline_builder,
            _descriptor_set_layout: descriptor_set_layout,
            command_pool,
            depth_format,
            present_mode: settings.present_mode,
            clear_color: settings.clear_color,
            projection: settings.projection,
            context,
        })
    }

    /// Number of uploaded models
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Current swapchain extent
    pub fn swapchain_extent(&self) -> VulkanResult<vk::Extent2D> {
        self.targets().map(SwapchainManager::extent)
    }

    /// Vulkan context
    pub const fn context(&self) -> &VulkanContext {
        &self.context
    }

    fn targets(&self) -> VulkanResult<&SwapchainManager> {
        self.swapchain.as_ref().ok_or(VulkanError::SurfaceInvalidated)
    }

    fn slot(&self, slot: usize) -> VulkanResult<&FrameSlot> {
        self.frames.get(slot).ok_or(VulkanError::Runtime {
            what: "frame slot lookup",
            result: vk::Result::ERROR_UNKNOWN,
        })
    }
}

impl FrameBackend for VulkanRenderer {
    fn frames_in_flight(&self) -> usize {
        self.frames.len()
    }

    fn wait_for_slot(&mut self, slot: usize) -> VulkanResult<()> {
        self.slot(slot)?.sync.in_flight.wait(u64::MAX)
    }

    fn acquire_image(&mut self, slot: usize) -> VulkanResult<AcquireOutcome> {
        let image_available = self.slot(slot)?.sync.image_available.handle();
        self.targets()?.swapchain().acquire_next_image(image_available)
    }

    fn record_commands(&mut self, slot: usize, image_index: u32) -> VulkanResult<()> {
        let frame = self.slot(slot)?;
        let targets = self.targets()?;
        let extent = targets.extent();
        let framebuffer = targets.framebuffer(image_index)?;

        frame.sync.in_flight.reset()?;

        let mut recorder = CommandRecorder::begin(self.context.device(), frame.command_buffer)?;
        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: self.clear_color,
                },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue { depth: 1.0, stencil: 0 },
            },
        ];
        let render_area = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        };

        {
            let mut pass = recorder.begin_render_pass(
                self.pipeline.render_pass.handle(),
                framebuffer,
                render_area,
                &clear_values,
            );
            pass.set_viewport(vk::Viewport {
                x: 0.0,
                y: 0.0,
                width: extent.width as f32,
                height: extent.height as f32,
                min_depth: 0.0,
                max_depth: 1.0,
            });
            pass.set_scissor(render_area);
            pass.bind_pipeline(self.pipeline.pipeline.handle());
            pass.bind_descriptor_set(self.pipeline.pipeline.layout(), frame.descriptor_set);

            for model in &self.models {
                pass.bind_vertex_buffer(model.vertex_buffer());
                pass.bind_index_buffer(model.index_buffer());
                pass.draw_indexed(model.index_count());
            }
        }

        recorder.end()?;
        Ok(())
    }

    fn update_uniforms(&mut self, slot: usize, input: &FrameInput) -> VulkanResult<()> {
        let extent = self.targets()?.extent();
        let ubo = UniformBufferObject::for_frame(input, (extent.width, extent.height), &self.projection);

        let frame = self.frames.get_mut(slot).ok_or(VulkanError::Runtime {
            what: "frame slot lookup",
            result: vk::Result::ERROR_UNKNOWN,
        })?;
        frame.uniform_buffer.write(&ubo);
        Ok(())
    }

    fn submit(&mut self, slot: usize) -> VulkanResult<()> {
        let frame = self.slot(slot)?;

        let wait_semaphores = [frame.sync.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [frame.command_buffer];
        let signal_semaphores = [frame.sync.render_finished.handle()];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores)
            .build();

        unsafe {
            self.context
                .device()
                .queue_submit(self.context.queue(), &[submit_info], frame.sync.in_flight.handle())
        }
        .map_err(VulkanError::runtime("queue submit"))
    }

    fn present(&mut self, slot: usize, image_index: u32) -> VulkanResult<PresentOutcome> {
        let render_finished = self.slot(slot)?.sync.render_finished.handle();
        self.targets()?
            .swapchain()
            .present(self.context.queue(), render_finished, image_index)
    }

    fn rebuild_swapchain(&mut self, framebuffer_size: (u32, u32)) -> VulkanResult<()> {
        // full teardown before anything is recreated
        self.swapchain = None;

        let settings = SwapchainManager::plan(&self.context, framebuffer_size, self.present_mode)?;
        let color_format = settings.surface_format.format;
        if color_format != self.pipeline.render_pass.color_format() {
            log::info!(
                "Swapchain format changed {:?} -> {:?}, rebuilding render pass and pipeline",
                self.pipeline.render_pass.color_format(),
                color_format
            );
            self.pipeline = self
                .pipeline_builder
                .build(self.context.device(), color_format, self.depth_format)?;
        }

        let uploader = ResourceUploader::new(&self.context, &self.command_pool);
        let targets = SwapchainManager::build(
            &self.context,
            &uploader,
            settings,
            self.depth_format,
            &self.pipeline.render_pass,
        )?;
        self.swapchain = Some(targets);
        Ok(())
    }

    fn wait_idle(&mut self) -> VulkanResult<()> {
        self.context.wait_idle()
    }
}

impl Drop for VulkanRenderer {
    fn drop(&mut self) {
        if let Err(e) = self.context.wait_idle() {
            log::error!("Device wait idle failed during shutdown: {e}");
        }
        log::debug!("Releasing renderer resources");
    }
}
