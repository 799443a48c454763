//! Descriptor set layout, pool and per-frame sets
//!
//! The renderer binds one set per frame slot: binding 0 is that slot's
//! uniform buffer (vertex stage), binding 1 the shared texture (fragment stage).

use ash::{vk, Device};

use super::texture::Texture;
use super::uniform_buffer::UniformBuffer;
use crate::render::backends::vulkan::{VulkanError, VulkanResult};

/// Binding of the per-frame uniform buffer
pub const UNIFORM_BINDING: u32 = 0;
/// Binding of the texture sampler
pub const SAMPLER_BINDING: u32 = 1;

/// Builder for descriptor set layouts
#[derive(Default)]
pub struct DescriptorSetLayoutBuilder {
    bindings: Vec<vk::DescriptorSetLayoutBinding>,
}

impl DescriptorSetLayoutBuilder {
    /// Empty layout
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a uniform buffer binding
    pub fn add_uniform_buffer(self, binding: u32, stage_flags: vk::ShaderStageFlags) -> Self {
        self.add(binding, vk::DescriptorType::UNIFORM_BUFFER, stage_flags)
    }

    /// Add a combined image sampler binding
    pub fn add_combined_image_sampler(self, binding: u32, stage_flags: vk::ShaderStageFlags) -> Self {
        self.add(binding, vk::DescriptorType::COMBINED_IMAGE_SAMPLER, stage_flags)
    }

    fn add(mut self, binding: u32, descriptor_type: vk::DescriptorType, stage_flags: vk::ShaderStageFlags) -> Self {
        self.bindings.push(
            vk::DescriptorSetLayoutBinding::builder()
                .binding(binding)
                .descriptor_type(descriptor_type)
                .descriptor_count(1)
                .stage_flags(stage_flags)
                .build(),
        );
        self
    }

    /// Bindings added so far
    pub fn bindings(&self) -> &[vk::DescriptorSetLayoutBinding] {
        &self.bindings
    }

    /// Create the layout
    pub fn build(self, device: &Device) -> VulkanResult<DescriptorSetLayout> {
        let layout_info = vk::DescriptorSetLayoutCreateInfo::builder().bindings(&self.bindings);

        let layout = unsafe { device.create_descriptor_set_layout(&layout_info, None) }
            .map_err(VulkanError::init("descriptor set layout"))?;

        Ok(DescriptorSetLayout {
            layout,
            device: device.clone(),
        })
    }
}

/// Layout used by the scene pipeline
pub fn scene_layout_builder() -> DescriptorSetLayoutBuilder {
    DescriptorSetLayoutBuilder::new()
        .add_uniform_buffer(UNIFORM_BINDING, vk::ShaderStageFlags::VERTEX)
        .add_combined_image_sampler(SAMPLER_BINDING, vk::ShaderStageFlags::FRAGMENT)
}

/// Descriptor set layout wrapper with automatic cleanup
pub struct DescriptorSetLayout {
    layout: vk::DescriptorSetLayout,
    device: Device,
}

impl DescriptorSetLayout {
    /// Layout handle
    pub const fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_set_layout(self.layout, None);
        }
    }
}

/// Pool sizes for `frames` scene sets
pub fn scene_pool_sizes(frames: u32) -> [vk::DescriptorPoolSize; 2] {
    [
        vk::DescriptorPoolSize {
            ty: vk::DescriptorType::UNIFORM_BUFFER,
            descriptor_count: frames,
        },
        vk::DescriptorPoolSize {
            ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
            descriptor_count: frames,
        },
    ]
}

/// Pool holding one scene set per frame slot
pub struct DescriptorPool {
    pool: vk::DescriptorPool,
    device: Device,
}

impl DescriptorPool {
    /// Create a pool sized for `frames` scene sets
    pub fn for_frames(device: &Device, frames: u32) -> VulkanResult<Self> {
        let pool_sizes = scene_pool_sizes(frames);
        let pool_info = vk::DescriptorPoolCreateInfo::builder()
            .pool_sizes(&pool_sizes)
            .max_sets(frames);

        let pool = unsafe { device.create_descriptor_pool(&pool_info, None) }
            .map_err(VulkanError::init("descriptor pool"))?;

        Ok(Self {
            pool,
            device: device.clone(),
        })
    }

    /// Allocate one set per uniform buffer and point it at that buffer and `texture`
    pub fn allocate_scene_sets(
        &self,
        layout: &DescriptorSetLayout,
        uniform_buffers: &[UniformBuffer],
        texture: &Texture,
    ) -> VulkanResult<Vec<vk::DescriptorSet>> {
        let layouts = vec![layout.handle(); uniform_buffers.len()];
        let alloc_info = vk::DescriptorSetAllocateInfo::builder()
            .descriptor_pool(self.pool)
            .set_layouts(&layouts);

        let sets = unsafe { self.device.allocate_descriptor_sets(&alloc_info) }
            .map_err(VulkanError::init("descriptor sets"))?;

        let image_info = [texture.descriptor_info()];
        for (set, uniform_buffer) in sets.iter().zip(uniform_buffers) {
            let buffer_info = [uniform_buffer.descriptor_info()];
            let writes = [
                vk::WriteDescriptorSet::builder()
                    .dst_set(*set)
                    .dst_binding(UNIFORM_BINDING)
                    .dst_array_element(0)
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                    .buffer_info(&buffer_info)
                    .build(),
                vk::WriteDescriptorSet::builder()
                    .dst_set(*set)
                    .dst_binding(SAMPLER_BINDING)
                    .dst_array_element(0)
                    .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                    .image_info(&image_info)
                    .build(),
            ];
            unsafe { self.device.update_descriptor_sets(&writes, &[]) };
        }

        log::debug!("Allocated {} descriptor sets", sets.len());
        Ok(sets)
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_pool(self.pool, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_layout_bindings() {
        let builder = scene_layout_builder();
        let bindings = builder.bindings();
        assert_eq!(bindings.len(), 2);

        assert_eq!(bindings[0].binding, 0);
        assert_eq!(bindings[0].descriptor_type, vk::DescriptorType::UNIFORM_BUFFER);
        assert_eq!(bindings[0].stage_flags, vk::ShaderStageFlags::VERTEX);

        assert_eq!(bindings[1].binding, 1);
        assert_eq!(bindings[1].descriptor_type, vk::DescriptorType::COMBINED_IMAGE_SAMPLER);
        assert_eq!(bindings[1].stage_flags, vk::ShaderStageFlags::FRAGMENT);
    }

    #[test]
    fn test_pool_sized_per_frame() {
        let sizes = scene_pool_sizes(3);
        assert!(sizes.iter().all(|size| size.descriptor_count == 3));
    }
}
