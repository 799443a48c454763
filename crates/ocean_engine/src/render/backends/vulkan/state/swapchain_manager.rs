//! Swapchain and framebuffer management
//!
//! A [`SwapchainManager`] owns every object whose size or format follows the
//! surface: the swapchain with its image views, the depth buffer and one
//! framebuffer per image. It is never patched in place; a rebuild drops the
//! whole manager and builds a new one in dependency order.

use ash::vk;

use super::framebuffer::{DepthBuffer, Framebuffer};
use super::swapchain::{Swapchain, SwapchainSettings, SwapchainSupport};
use crate::config::PresentModePreference;
use crate::render::backends::vulkan::initialization::VulkanContext;
use crate::render::backends::vulkan::rendering::RenderPass;
use crate::render::backends::vulkan::resources::ResourceUploader;
use crate::render::backends::vulkan::{VulkanError, VulkanResult};

/// Surface-dependent render targets
///
/// Fields are declared so framebuffers drop before the depth buffer and the
/// swapchain views they reference.
pub struct SwapchainManager {
    framebuffers: Vec<Framebuffer>,
    depth_buffer: DepthBuffer,
    swapchain: Swapchain,
}

impl SwapchainManager {
    /// Query surface support and choose settings for a `framebuffer_size` window
    ///
    /// Support is queried fresh each call since it changes with the surface.
    pub fn plan(
        context: &VulkanContext,
        framebuffer_size: (u32, u32),
        preference: PresentModePreference,
    ) -> VulkanResult<SwapchainSettings> {
        let support = SwapchainSupport::query(
            context.surface().loader(),
            context.physical_device().handle,
            context.surface().handle(),
        )?;
        log::debug!(
            "Surface support: images {}..{}, {} formats, present modes {:?}",
            support.capabilities.min_image_count,
            support.capabilities.max_image_count,
            support.formats.len(),
            support.present_modes
        );
        SwapchainSettings::choose(&support, framebuffer_size, preference)
    }

    /// Create swapchain, views, depth buffer and framebuffers, in that order
    pub fn build(
        context: &VulkanContext,
        uploader: &ResourceUploader<'_>,
        settings: SwapchainSettings,
        depth_format: vk::Format,
        render_pass: &RenderPass,
    ) -> VulkanResult<Self> {
        if render_pass.color_format() != settings.surface_format.format {
            return Err(VulkanError::Initialization {
                what: "framebuffers (render pass format differs from swapchain)",
                result: vk::Result::ERROR_FORMAT_NOT_SUPPORTED,
            });
        }

        let swapchain = Swapchain::new(
            context.device(),
            context.logical_device().swapchain_loader(),
            context.surface().handle(),
            settings,
        )?;

        let depth_buffer = DepthBuffer::new(uploader, context, depth_format, swapchain.extent())?;

        let framebuffers = swapchain
            .image_views()
            .iter()
            .map(|&view| {
                Framebuffer::new(
                    context.device(),
                    render_pass.handle(),
                    &[view, depth_buffer.image_view()],
                    swapchain.extent(),
                )
            })
            .collect::<VulkanResult<Vec<_>>>()?;

        log::debug!("SwapchainManager created with {} framebuffers", framebuffers.len());
        Ok(Self {
            framebuffers,
            depth_buffer,
            swapchain,
        })
    }

    /// The swapchain
    pub const fn swapchain(&self) -> &Swapchain {
        &self.swapchain
    }

    /// Framebuffer for a swapchain image
    pub fn framebuffer(&self, image_index: u32) -> VulkanResult<vk::Framebuffer> {
        self.framebuffers
            .get(image_index as usize)
            .map(Framebuffer::handle)
            .ok_or(VulkanError::Runtime {
                what: "framebuffer lookup",
                result: vk::Result::ERROR_UNKNOWN,
            })
    }

    /// Number of framebuffers, one per swapchain image
    pub fn framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    /// Current image size
    pub const fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    /// Current color format
    pub const fn color_format(&self) -> vk::Format {
        self.swapchain.surface_format().format
    }

    /// Depth format
    pub const fn depth_format(&self) -> vk::Format {
        self.depth_buffer.format()
    }
}
