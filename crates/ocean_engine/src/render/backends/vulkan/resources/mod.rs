//! GPU resources: buffers, images, uploads, textures, uniforms and descriptors

pub mod buffer;
pub mod descriptor_set;
pub mod image;
pub mod model;
pub mod texture;
pub mod uniform_buffer;
pub mod uploader;

pub use buffer::{find_memory_type, Buffer};
pub use descriptor_set::{DescriptorPool, DescriptorSetLayout, DescriptorSetLayoutBuilder};
pub use image::{GpuImage, ImageDescription};
pub use model::GpuModel;
pub use texture::Texture;
pub use uniform_buffer::UniformBuffer;
pub use uploader::{LayoutTransition, ResourceUploader, UploadPlan};
