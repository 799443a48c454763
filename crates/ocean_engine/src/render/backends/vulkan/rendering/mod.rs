//! Render pass, shaders, pipeline and command recording

pub mod commands;
pub mod pipeline;
pub mod render_pass;
pub mod shader;
pub mod vertex_layout;

pub use commands::{ActiveRenderPass, CommandPool, CommandRecorder};
pub use pipeline::{GraphicsPipeline, PipelineBuilder, PipelineBundle};
pub use render_pass::RenderPass;
pub use shader::ShaderModule;
pub use vertex_layout::VulkanVertexLayout;
