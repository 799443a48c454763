//! Graphics pipeline builder
//!
//! The pipeline is compiled against a render pass built for the swapchain's
//! color format. Viewport and scissor are dynamic, so a resize only needs new
//! framebuffers; a format change rebuilds the render pass and the pipeline.

use ash::{vk, Device};
use std::path::{Path, PathBuf};

use super::render_pass::RenderPass;
use super::shader::ShaderModule;
use super::vertex_layout::VulkanVertexLayout;
use crate::render::backends::vulkan::{VulkanError, VulkanResult};

/// States the pipeline expects to be set in the command buffer
pub const DYNAMIC_STATES: [vk::DynamicState; 2] = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];

/// Filled triangles, back faces culled, counter-clockwise front face
pub fn rasterization_state() -> vk::PipelineRasterizationStateCreateInfo {
    vk::PipelineRasterizationStateCreateInfo::builder()
        .depth_clamp_enable(false)
        .rasterizer_discard_enable(false)
        .polygon_mode(vk::PolygonMode::FILL)
        .line_width(1.0)
        .cull_mode(vk::CullModeFlags::BACK)
        .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
        .depth_bias_enable(false)
        .build()
}

/// Depth test LESS with writes, no stencil
pub fn depth_stencil_state() -> vk::PipelineDepthStencilStateCreateInfo {
    vk::PipelineDepthStencilStateCreateInfo::builder()
        .depth_test_enable(true)
        .depth_write_enable(true)
        .depth_compare_op(vk::CompareOp::LESS)
        .depth_bounds_test_enable(false)
        .stencil_test_enable(false)
        .build()
}

/// Graphics pipeline and its layout
pub struct GraphicsPipeline {
    device: Device,
    pipeline: vk::Pipeline,
    layout: vk::PipelineLayout,
}

impl GraphicsPipeline {
    /// Create the scene pipeline for `render_pass`
    ///
    /// The shader modules are only borrowed; callers drop them once this returns.
    pub fn new(
        device: &Device,
        render_pass: &RenderPass,
        vertex_shader: &ShaderModule,
        fragment_shader: &ShaderModule,
        descriptor_set_layout: vk::DescriptorSetLayout,
    ) -> VulkanResult<Self> {
        let shader_stages = [
            vertex_shader.stage_info(vk::ShaderStageFlags::VERTEX),
            fragment_shader.stage_info(vk::ShaderStageFlags::FRAGMENT),
        ];

        let bindings = [VulkanVertexLayout::binding_description()];
        let attributes = VulkanVertexLayout::attribute_descriptions();
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::builder()
            .vertex_binding_descriptions(&bindings)
            .vertex_attribute_descriptions(&attributes);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        // counts only; the actual rectangles are recorded per frame
        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewport_count(1)
            .scissor_count(1);

        let rasterizer = rasterization_state();

        let multisampling = vk::PipelineMultisampleStateCreateInfo::builder()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let depth_stencil = depth_stencil_state();

        let color_blend_attachments = [vk::PipelineColorBlendAttachmentState::builder()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(false)
            .build()];
        let color_blending = vk::PipelineColorBlendStateCreateInfo::builder()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let dynamic_state = vk::PipelineDynamicStateCreateInfo::builder().dynamic_states(&DYNAMIC_STATES);

        let set_layouts = [descriptor_set_layout];
        let layout_info = vk::PipelineLayoutCreateInfo::builder().set_layouts(&set_layouts);
        let layout = unsafe { device.create_pipeline_layout(&layout_info, None) }
            .map_err(VulkanError::init("pipeline layout"))?;

        let pipeline_info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterizer)
            .multisample_state(&multisampling)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blending)
            .dynamic_state(&dynamic_state)
            .layout(layout)
            .render_pass(render_pass.handle())
            .subpass(0)
            .build();

        let pipelines = unsafe { device.create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info], None) };
        let pipeline = match pipelines {
            Ok(pipelines) => pipelines.into_iter().next(),
            Err((_, result)) => {
                unsafe { device.destroy_pipeline_layout(layout, None) };
                return Err(VulkanError::init("graphics pipeline")(result));
            }
        };
        let Some(pipeline) = pipeline else {
            unsafe { device.destroy_pipeline_layout(layout, None) };
            return Err(VulkanError::init("graphics pipeline")(vk::Result::ERROR_UNKNOWN));
        };

        Ok(Self {
            device: device.clone(),
            pipeline,
            layout,
        })
    }

    /// Pipeline handle
    pub const fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    /// Layout handle
    pub const fn layout(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Drop for GraphicsPipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
            self.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}

/// Render pass and pipeline built for one color format
///
/// The pipeline is declared first so it is destroyed before its render pass.
pub struct PipelineBundle {
    /// Scene pipeline
    pub pipeline: GraphicsPipeline,
    /// Forward render pass
    pub render_pass: RenderPass,
}

/// Builds the render pass and scene pipeline from SPIR-V files
pub struct PipelineBuilder {
    vertex_shader_path: PathBuf,
    fragment_shader_path: PathBuf,
    descriptor_set_layout: vk::DescriptorSetLayout,
}

impl PipelineBuilder {
    /// Builder reading shaders from the given paths
    pub fn new(
        vertex_shader_path: impl AsRef<Path>,
        fragment_shader_path: impl AsRef<Path>,
        descriptor_set_layout: vk::DescriptorSetLayout,
    ) -> Self {
        Self {
            vertex_shader_path: vertex_shader_path.as_ref().to_path_buf(),
            fragment_shader_path: fragment_shader_path.as_ref().to_path_buf(),
            descriptor_set_layout,
        }
    }

    /// Build a render pass for `color_format`/`depth_format` and a pipeline for it
    ///
    /// Shader modules are loaded fresh and destroyed as soon as the pipeline exists.
    pub fn build(&self, device: &Device, color_format: vk::Format, depth_format: vk::Format) -> VulkanResult<PipelineBundle> {
        let render_pass = RenderPass::new_forward_pass(device, color_format, depth_format)?;

        let vertex_shader = ShaderModule::from_file(device, &self.vertex_shader_path)?;
        let fragment_shader = ShaderModule::from_file(device, &self.fragment_shader_path)?;
        let pipeline = GraphicsPipeline::new(
            device,
            &render_pass,
            &vertex_shader,
            &fragment_shader,
            self.descriptor_set_layout,
        )?;
        drop(vertex_shader);
        drop(fragment_shader);

        log::info!("Graphics pipeline built for {:?}", color_format);
        Ok(PipelineBundle { pipeline, render_pass })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_function_state() {
        let rasterizer = rasterization_state();
        assert_eq!(rasterizer.polygon_mode, vk::PolygonMode::FILL);
        assert_eq!(rasterizer.cull_mode, vk::CullModeFlags::BACK);
        assert_eq!(rasterizer.front_face, vk::FrontFace::COUNTER_CLOCKWISE);

        let depth = depth_stencil_state();
        assert_eq!(depth.depth_test_enable, vk::TRUE);
        assert_eq!(depth.depth_write_enable, vk::TRUE);
        assert_eq!(depth.depth_compare_op, vk::CompareOp::LESS);
        assert_eq!(depth.stencil_test_enable, vk::FALSE);
    }

    #[test]
    fn test_viewport_and_scissor_are_dynamic() {
        assert!(DYNAMIC_STATES.contains(&vk::DynamicState::VIEWPORT));
        assert!(DYNAMIC_STATES.contains(&vk::DynamicState::SCISSOR));
    }
}
