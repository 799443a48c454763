//! Meshes resident on the GPU

use ash::vk;

use super::buffer::Buffer;
use super::uploader::ResourceUploader;
use crate::render::backends::vulkan::{VulkanError, VulkanResult};
use crate::render::mesh::Mesh;

/// Vertex and index buffers of one uploaded mesh
pub struct GpuModel {
    name: String,
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    index_count: u32,
}

impl GpuModel {
    /// Upload `mesh` through the staging path
    pub fn upload(uploader: &ResourceUploader<'_>, mesh: &Mesh) -> VulkanResult<Self> {
        if !mesh.indices_in_bounds() {
            return Err(VulkanError::InvalidPayload(format!(
                "mesh '{}' references vertices past the end of its vertex list",
                mesh.name
            )));
        }

        let vertex_buffer = uploader.upload_buffer(mesh.vertex_bytes(), vk::BufferUsageFlags::VERTEX_BUFFER)?;
        let index_buffer = uploader.upload_buffer(mesh.index_bytes(), vk::BufferUsageFlags::INDEX_BUFFER)?;

        log::info!(
            "Model '{}' uploaded: {} vertices, {} indices",
            mesh.name,
            mesh.vertices.len(),
            mesh.indices.len()
        );

        Ok(Self {
            name: mesh.name.clone(),
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
        })
    }

    /// Model name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Vertex buffer handle
    pub const fn vertex_buffer(&self) -> vk::Buffer {
        self.vertex_buffer.handle()
    }

    /// Index buffer handle
    pub const fn index_buffer(&self) -> vk::Buffer {
        self.index_buffer.handle()
    }

    /// Indices drawn per frame
    pub const fn index_count(&self) -> u32 {
        self.index_count
    }
}
