//! Framebuffers and the depth buffer

use ash::{vk, Device};

use crate::render::backends::vulkan::initialization::VulkanContext;
use crate::render::backends::vulkan::resources::{GpuImage, ImageDescription, LayoutTransition, ResourceUploader};
use crate::render::backends::vulkan::{VulkanError, VulkanResult};

/// Depth formats in order of preference
pub const DEPTH_FORMAT_CANDIDATES: [vk::Format; 3] = [
    vk::Format::D32_SFLOAT,
    vk::Format::D32_SFLOAT_S8_UINT,
    vk::Format::D24_UNORM_S8_UINT,
];

/// First candidate for which `supports_depth_attachment` holds
pub fn choose_depth_format(
    candidates: &[vk::Format],
    supports_depth_attachment: impl Fn(vk::Format) -> bool,
) -> VulkanResult<vk::Format> {
    candidates
        .iter()
        .copied()
        .find(|&format| supports_depth_attachment(format))
        .ok_or(VulkanError::Initialization {
            what: "depth buffer (no supported depth format)",
            result: vk::Result::ERROR_FORMAT_NOT_SUPPORTED,
        })
}

/// Whether `format` carries a stencil component
pub fn has_stencil_component(format: vk::Format) -> bool {
    format == vk::Format::D32_SFLOAT_S8_UINT || format == vk::Format::D24_UNORM_S8_UINT
}

/// Depth format usable with optimal tiling on the context's device
pub fn find_depth_format(context: &VulkanContext) -> VulkanResult<vk::Format> {
    choose_depth_format(&DEPTH_FORMAT_CANDIDATES, |format| {
        context
            .format_properties(format)
            .optimal_tiling_features
            .contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
    })
}

/// Depth attachment sized to the swapchain
pub struct DepthBuffer {
    image: GpuImage,
}

impl DepthBuffer {
    /// Create the depth image and move it into attachment layout
    pub fn new(uploader: &ResourceUploader<'_>, context: &VulkanContext, format: vk::Format, extent: vk::Extent2D) -> VulkanResult<Self> {
        let image = GpuImage::new(
            context.device(),
            &context.physical_device().memory_properties,
            ImageDescription {
                extent,
                format,
                usage: vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
                aspect: vk::ImageAspectFlags::DEPTH,
            },
        )?;

        let transition = LayoutTransition::between(
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        )?
        .with_stencil(has_stencil_component(format));
        uploader.transition_image(image.handle(), transition)?;

        log::debug!("Depth buffer {}x{} ({:?})", extent.width, extent.height, format);
        Ok(Self { image })
    }

    /// Depth image view
    pub const fn image_view(&self) -> vk::ImageView {
        self.image.view()
    }

    /// Depth format
    pub const fn format(&self) -> vk::Format {
        self.image.format()
    }
}

/// Framebuffer wrapper with RAII cleanup
pub struct Framebuffer {
    device: Device,
    framebuffer: vk::Framebuffer,
}

impl Framebuffer {
    /// Framebuffer for `render_pass` over `attachments`
    pub fn new(
        device: &Device,
        render_pass: vk::RenderPass,
        attachments: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> VulkanResult<Self> {
        let framebuffer_info = vk::FramebufferCreateInfo::builder()
            .render_pass(render_pass)
            .attachments(attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = unsafe { device.create_framebuffer(&framebuffer_info, None) }
            .map_err(VulkanError::init("framebuffer"))?;

        Ok(Self {
            device: device.clone(),
            framebuffer,
        })
    }

    /// Framebuffer handle
    pub const fn handle(&self) -> vk::Framebuffer {
        self.framebuffer
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_first_supported_candidate() {
        let all = choose_depth_format(&DEPTH_FORMAT_CANDIDATES, |_| true).unwrap();
        assert_eq!(all, vk::Format::D32_SFLOAT);

        let no_plain = choose_depth_format(&DEPTH_FORMAT_CANDIDATES, |format| format != vk::Format::D32_SFLOAT).unwrap();
        assert_eq!(no_plain, vk::Format::D32_SFLOAT_S8_UINT);
    }

    #[test]
    fn test_no_depth_format_is_an_error() {
        let result = choose_depth_format(&DEPTH_FORMAT_CANDIDATES, |_| false);
        assert!(matches!(result, Err(VulkanError::Initialization { .. })));
    }

    #[test]
    fn test_stencil_formats() {
        assert!(!has_stencil_component(vk::Format::D32_SFLOAT));
        assert!(has_stencil_component(vk::Format::D32_SFLOAT_S8_UINT));
        assert!(has_stencil_component(vk::Format::D24_UNORM_S8_UINT));
    }
}
