//! Vertex input description for [`Vertex`]
//!
//! Kept on the Vulkan side so the mesh types stay backend-agnostic.

use ash::vk;
use std::mem::{offset_of, size_of};

use crate::render::mesh::Vertex;

/// Vulkan vertex layout for the engine's [`Vertex`] type
pub struct VulkanVertexLayout;

impl VulkanVertexLayout {
    /// One interleaved binding advancing per vertex
    pub const fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: size_of::<Vertex>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }
    }

    /// Position, color and texture coordinate at locations 0, 1 and 2
    pub const fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 3] {
        [
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: offset_of!(Vertex, position) as u32,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: offset_of!(Vertex, color) as u32,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 2,
                format: vk::Format::R32G32_SFLOAT,
                offset: offset_of!(Vertex, tex_coord) as u32,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_matches_vertex() {
        let binding = VulkanVertexLayout::binding_description();
        assert_eq!(binding.stride, 32);

        let offsets: Vec<u32> = VulkanVertexLayout::attribute_descriptions()
            .iter()
            .map(|attribute| attribute.offset)
            .collect();
        assert_eq!(offsets, vec![0, 12, 24]);
    }
}
