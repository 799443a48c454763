//! Sampled textures

use ash::{vk, Device};

use super::image::GpuImage;
use super::uploader::ResourceUploader;
use crate::render::backends::vulkan::{VulkanError, VulkanResult};
use crate::render::image_data::ImageData;

/// Format used for color textures
pub const TEXTURE_FORMAT: vk::Format = vk::Format::R8G8B8A8_SRGB;

/// Shader-readable image plus its sampler
pub struct Texture {
    sampler: vk::Sampler,
    image: GpuImage,
    device: Device,
}

impl Texture {
    /// Upload `image_data` and create a linear, repeating, anisotropic sampler
    pub fn from_image_data(
        uploader: &ResourceUploader<'_>,
        device: &Device,
        image_data: &ImageData,
        max_anisotropy: f32,
    ) -> VulkanResult<Self> {
        let image = uploader.upload_image(image_data, TEXTURE_FORMAT)?;
        let sampler = create_sampler(device, max_anisotropy)?;

        log::info!(
            "Texture ready: {}x{} (anisotropy {:.1})",
            image_data.width(),
            image_data.height(),
            max_anisotropy
        );

        Ok(Self {
            sampler,
            image,
            device: device.clone(),
        })
    }

    /// Image view bound to the fragment shader
    pub const fn image_view(&self) -> vk::ImageView {
        self.image.view()
    }

    /// Sampler bound alongside the view
    pub const fn sampler(&self) -> vk::Sampler {
        self.sampler
    }

    /// Descriptor payload for a combined image sampler
    pub fn descriptor_info(&self) -> vk::DescriptorImageInfo {
        vk::DescriptorImageInfo {
            sampler: self.sampler,
            image_view: self.image.view(),
            image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        }
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_sampler(self.sampler, None);
        }
    }
}

fn create_sampler(device: &Device, max_anisotropy: f32) -> VulkanResult<vk::Sampler> {
    let sampler_info = vk::SamplerCreateInfo::builder()
        .mag_filter(vk::Filter::LINEAR)
        .min_filter(vk::Filter::LINEAR)
        .address_mode_u(vk::SamplerAddressMode::REPEAT)
        .address_mode_v(vk::SamplerAddressMode::REPEAT)
        .address_mode_w(vk::SamplerAddressMode::REPEAT)
        .anisotropy_enable(true)
        .max_anisotropy(max_anisotropy)
        .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
        .unnormalized_coordinates(false)
        .compare_enable(false)
        .compare_op(vk::CompareOp::ALWAYS)
        .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
        .mip_lod_bias(0.0)
        .min_lod(0.0)
        .max_lod(0.0);

    unsafe { device.create_sampler(&sampler_info, None) }.map_err(VulkanError::resource("create texture sampler"))
}
