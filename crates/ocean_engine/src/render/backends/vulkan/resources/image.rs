//! Device-local 2D images with a view

use ash::{vk, Device};

use super::buffer::find_memory_type;
use crate::render::backends::vulkan::{VulkanError, VulkanResult};

/// Creation parameters for a single-mip 2D image
#[derive(Debug, Clone, Copy)]
pub struct ImageDescription {
    /// Size in pixels
    pub extent: vk::Extent2D,
    /// Texel format
    pub format: vk::Format,
    /// How the image will be used
    pub usage: vk::ImageUsageFlags,
    /// Aspect viewed by the image view
    pub aspect: vk::ImageAspectFlags,
}

/// Image, its memory and one view, destroyed together
pub struct GpuImage {
    device: Device,
    image: vk::Image,
    memory: vk::DeviceMemory,
    view: vk::ImageView,
    description: ImageDescription,
}

impl GpuImage {
    /// Create an optimal-tiling image in device-local memory
    pub fn new(
        device: &Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        description: ImageDescription,
    ) -> VulkanResult<Self> {
        let image_info = vk::ImageCreateInfo::builder()
            .image_type(vk::ImageType::TYPE_2D)
            .extent(vk::Extent3D {
                width: description.extent.width,
                height: description.extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .format(description.format)
            .tiling(vk::ImageTiling::OPTIMAL)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(description.usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .samples(vk::SampleCountFlags::TYPE_1);

        let image = unsafe { device.create_image(&image_info, None) }.map_err(VulkanError::resource("create image"))?;

        let requirements = unsafe { device.get_image_memory_requirements(image) };
        let memory = find_memory_type(
            memory_properties,
            requirements.memory_type_bits,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        )
        .and_then(|memory_type_index| {
            let alloc_info = vk::MemoryAllocateInfo::builder()
                .allocation_size(requirements.size)
                .memory_type_index(memory_type_index);
            unsafe { device.allocate_memory(&alloc_info, None) }.map_err(VulkanError::resource("allocate image memory"))
        });
        let memory = match memory {
            Ok(memory) => memory,
            Err(e) => {
                unsafe { device.destroy_image(image, None) };
                return Err(e);
            }
        };

        let view = unsafe { device.bind_image_memory(image, memory, 0) }
            .map_err(VulkanError::resource("bind image memory"))
            .and_then(|()| create_image_view(device, image, description.format, description.aspect));
        let view = match view {
            Ok(view) => view,
            Err(e) => {
                unsafe {
                    device.destroy_image(image, None);
                    device.free_memory(memory, None);
                }
                return Err(e);
            }
        };

        Ok(Self {
            device: device.clone(),
            image,
            memory,
            view,
            description,
        })
    }

    /// Image handle
    pub const fn handle(&self) -> vk::Image {
        self.image
    }

    /// View over the whole image
    pub const fn view(&self) -> vk::ImageView {
        self.view
    }

    /// Texel format
    pub const fn format(&self) -> vk::Format {
        self.description.format
    }

    /// Size in pixels
    pub const fn extent(&self) -> vk::Extent2D {
        self.description.extent
    }
}

impl Drop for GpuImage {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_image_view(self.view, None);
            self.device.destroy_image(self.image, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

/// 2D view over mip 0, layer 0
pub fn create_image_view(
    device: &Device,
    image: vk::Image,
    format: vk::Format,
    aspect: vk::ImageAspectFlags,
) -> VulkanResult<vk::ImageView> {
    let view_info = vk::ImageViewCreateInfo::builder()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format)
        .components(vk::ComponentMapping::default())
        .subresource_range(single_subresource(aspect));

    unsafe { device.create_image_view(&view_info, None) }.map_err(VulkanError::resource("create image view"))
}

/// Mip 0, layer 0 of `aspect`
pub fn single_subresource(aspect: vk::ImageAspectFlags) -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange {
        aspect_mask: aspect,
        base_mip_level: 0,
        level_count: 1,
        base_array_layer: 0,
        layer_count: 1,
    }
}
