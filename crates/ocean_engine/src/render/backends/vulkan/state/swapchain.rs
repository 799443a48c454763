//! Vulkan swapchain
//!
//! Creation is split in two. The `choose_*` functions turn freshly queried
//! surface support into [`SwapchainSettings`] without touching the GPU;
//! [`Swapchain`] then creates the chain and one view per image.

use ash::extensions::khr::{Surface, Swapchain as SwapchainLoader};
use ash::{vk, Device};

use crate::config::PresentModePreference;
use crate::render::backends::vulkan::resources::image::create_image_view;
use crate::render::backends::vulkan::{VulkanError, VulkanResult};
use crate::render::frame_scheduler::{AcquireOutcome, PresentOutcome};

/// Preferred color format
pub const PREFERRED_FORMAT: vk::SurfaceFormatKHR = vk::SurfaceFormatKHR {
    format: vk::Format::B8G8R8A8_SRGB,
    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
};

/// Surface support queried fresh before every (re)build
#[derive(Debug, Clone)]
pub struct SwapchainSupport {
    /// Image count, extent and transform limits
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported format / color space pairs
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// Supported presentation modes
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapchainSupport {
    /// Query `surface` support on `physical_device`
    pub fn query(
        surface_loader: &Surface,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VulkanResult<Self> {
        unsafe {
            Ok(Self {
                capabilities: surface_loader
                    .get_physical_device_surface_capabilities(physical_device, surface)
                    .map_err(VulkanError::init("surface capabilities query"))?,
                formats: surface_loader
                    .get_physical_device_surface_formats(physical_device, surface)
                    .map_err(VulkanError::init("surface formats query"))?,
                present_modes: surface_loader
                    .get_physical_device_surface_present_modes(physical_device, surface)
                    .map_err(VulkanError::init("surface present modes query"))?,
            })
        }
    }
}

/// Extent for a framebuffer of `desired` pixels
///
/// `u32::MAX` in `current_extent.width` means the surface lets the swapchain
/// pick its size; the desired size is then clamped into the allowed range.
/// Any other value is the size the swapchain must use.
pub fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, desired: (u32, u32)) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    vk::Extent2D {
        width: desired.0.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: desired.1.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

/// sRGB BGRA8 when available, else the first supported format
pub fn choose_format(formats: &[vk::SurfaceFormatKHR]) -> VulkanResult<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .find(|sf| sf.format == PREFERRED_FORMAT.format && sf.color_space == PREFERRED_FORMAT.color_space)
        .or_else(|| formats.first())
        .copied()
        .ok_or(VulkanError::Initialization {
            what: "swapchain (surface reports no formats)",
            result: vk::Result::ERROR_FORMAT_NOT_SUPPORTED,
        })
}

/// Presentation mode for `preference`
///
/// Low latency tries MAILBOX then IMMEDIATE; everything falls back to FIFO,
/// which every surface supports.
pub fn choose_present_mode(
    present_modes: &[vk::PresentModeKHR],
    preference: PresentModePreference,
) -> VulkanResult<vk::PresentModeKHR> {
    if present_modes.is_empty() {
        return Err(VulkanError::Initialization {
            what: "swapchain (surface reports no present modes)",
            result: vk::Result::ERROR_INITIALIZATION_FAILED,
        });
    }

    let candidates: &[vk::PresentModeKHR] = match preference {
        PresentModePreference::LowLatency => &[vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::IMMEDIATE],
        PresentModePreference::VSync => &[],
    };

    Ok(candidates
        .iter()
        .copied()
        .find(|mode| present_modes.contains(mode))
        .unwrap_or(vk::PresentModeKHR::FIFO))
}

/// One more image than the minimum, clamped to the maximum when there is one
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        count.min(capabilities.max_image_count)
    } else {
        count
    }
}

/// Everything needed to create a swapchain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainSettings {
    /// Image size
    pub extent: vk::Extent2D,
    /// Image format and color space
    pub surface_format: vk::SurfaceFormatKHR,
    /// Presentation mode
    pub present_mode: vk::PresentModeKHR,
    /// Minimum number of images requested
    pub image_count: u32,
    /// Transform applied by the presentation engine
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
}

impl SwapchainSettings {
    /// Apply the selection policy to `support`
    pub fn choose(
        support: &SwapchainSupport,
        framebuffer_size: (u32, u32),
        preference: PresentModePreference,
    ) -> VulkanResult<Self> {
        Ok(Self {
            extent: choose_extent(&support.capabilities, framebuffer_size),
            surface_format: choose_format(&support.formats)?,
            present_mode: choose_present_mode(&support.present_modes, preference)?,
            image_count: choose_image_count(&support.capabilities),
            pre_transform: support.capabilities.current_transform,
        })
    }
}

/// Swapchain and its image views with RAII cleanup
pub struct Swapchain {
    device: Device,
    loader: SwapchainLoader,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    settings: SwapchainSettings,
}

impl Swapchain {
    /// Create a swapchain on `surface` with `settings`
    pub fn new(
        device: &Device,
        loader: &SwapchainLoader,
        surface: vk::SurfaceKHR,
        settings: SwapchainSettings,
    ) -> VulkanResult<Self> {
        let create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface)
            .min_image_count(settings.image_count)
            .image_format(settings.surface_format.format)
            .image_color_space(settings.surface_format.color_space)
            .image_extent(settings.extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(settings.pre_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(settings.present_mode)
            .clipped(true)
            .old_swapchain(vk::SwapchainKHR::null());

        let swapchain =
            unsafe { loader.create_swapchain(&create_info, None) }.map_err(VulkanError::init("swapchain"))?;

        // from here on Drop cleans up whatever has been created
        let mut chain = Self {
            device: device.clone(),
            loader: loader.clone(),
            swapchain,
            images: Vec::new(),
            image_views: Vec::new(),
            settings,
        };

        chain.images = unsafe { loader.get_swapchain_images(swapchain) }.map_err(VulkanError::init("swapchain images"))?;
        for &image in &chain.images {
            let view = create_image_view(
                device,
                image,
                settings.surface_format.format,
                vk::ImageAspectFlags::COLOR,
            )?;
            chain.image_views.push(view);
        }

        log::info!(
            "Swapchain created: {}x{}, {:?}, {:?}, {} images",
            settings.extent.width,
            settings.extent.height,
            settings.surface_format.format,
            settings.present_mode,
            chain.images.len()
        );
        Ok(chain)
    }

    /// Acquire the next image, signalling `image_available`
    pub fn acquire_next_image(&self, image_available: vk::Semaphore) -> VulkanResult<AcquireOutcome> {
        let result = unsafe {
            self.loader
                .acquire_next_image(self.swapchain, u64::MAX, image_available, vk::Fence::null())
        };
        match result {
            Ok((image_index, suboptimal)) => Ok(AcquireOutcome::Ready { image_index, suboptimal }),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireOutcome::OutOfDate),
            Err(e) => Err(VulkanError::runtime("acquire next image")(e)),
        }
    }

    /// Queue `image_index` for presentation after `render_finished`
    pub fn present(
        &self,
        queue: vk::Queue,
        render_finished: vk::Semaphore,
        image_index: u32,
    ) -> VulkanResult<PresentOutcome> {
        let wait_semaphores = [render_finished];
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        match unsafe { self.loader.queue_present(queue, &present_info) } {
            Ok(false) => Ok(PresentOutcome::Presented),
            Ok(true) => Ok(PresentOutcome::Suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentOutcome::OutOfDate),
            Err(e) => Err(VulkanError::runtime("present")(e)),
        }
    }

    /// Image size
    pub const fn extent(&self) -> vk::Extent2D {
        self.settings.extent
    }

    /// Image format and color space
    pub const fn surface_format(&self) -> vk::SurfaceFormatKHR {
        self.settings.surface_format
    }

    /// Settings the chain was created with
    pub const fn settings(&self) -> SwapchainSettings {
        self.settings
    }

    /// One view per swapchain image
    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }

    /// Number of images actually created
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Swapchain handle
    pub const fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            for &image_view in &self.image_views {
                self.device.destroy_image_view(image_view, None);
            }
            self.loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capabilities(min: u32, max: u32) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            min_image_count: min,
            max_image_count: max,
            current_extent: vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            min_image_extent: vk::Extent2D { width: 1, height: 1 },
            max_image_extent: vk::Extent2D {
                width: 4096,
                height: 4096,
            },
            ..Default::default()
        }
    }

    fn support(formats: Vec<vk::SurfaceFormatKHR>, present_modes: Vec<vk::PresentModeKHR>) -> SwapchainSupport {
        SwapchainSupport {
            capabilities: capabilities(2, 3),
            formats,
            present_modes,
        }
    }

    #[test]
    fn test_image_count_bounded_by_max() {
        assert_eq!(choose_image_count(&capabilities(2, 3)), 3);
        assert_eq!(choose_image_count(&capabilities(2, 2)), 2);
    }

    #[test]
    fn test_image_count_unbounded_when_max_is_zero() {
        assert_eq!(choose_image_count(&capabilities(3, 0)), 4);
    }

    #[test]
    fn test_image_count_within_limits() {
        for min in 1..6 {
            for max in (min + 1)..10 {
                let count = choose_image_count(&capabilities(min, max));
                assert!(min < count && count <= max, "min {min} max {max} gave {count}");
            }
            assert_eq!(choose_image_count(&capabilities(min, 0)), min + 1);
        }
    }

    #[test]
    fn test_defined_current_extent_wins() {
        let mut caps = capabilities(2, 3);
        caps.current_extent = vk::Extent2D { width: 800, height: 600 };
        assert_eq!(
            choose_extent(&caps, (1920, 1080)),
            vk::Extent2D { width: 800, height: 600 }
        );
    }

    #[test]
    fn test_undefined_extent_clamps_desired() {
        let mut caps = capabilities(2, 3);
        caps.min_image_extent = vk::Extent2D { width: 100, height: 100 };
        caps.max_image_extent = vk::Extent2D { width: 1000, height: 700 };

        assert_eq!(choose_extent(&caps, (640, 480)), vk::Extent2D { width: 640, height: 480 });
        assert_eq!(choose_extent(&caps, (5000, 10)), vk::Extent2D { width: 1000, height: 100 });
    }

    #[test]
    fn test_format_preference() {
        let unorm = vk::SurfaceFormatKHR {
            format: vk::Format::B8G8R8A8_UNORM,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        };
        assert_eq!(choose_format(&[unorm, PREFERRED_FORMAT]).unwrap(), PREFERRED_FORMAT);
        assert_eq!(choose_format(&[unorm]).unwrap(), unorm);
        assert!(matches!(
            choose_format(&[]),
            Err(VulkanError::Initialization { .. })
        ));
    }

    #[test]
    fn test_present_mode_preference() {
        use vk::PresentModeKHR as Mode;

        let all = [Mode::FIFO, Mode::IMMEDIATE, Mode::MAILBOX];
        assert_eq!(choose_present_mode(&all, PresentModePreference::LowLatency).unwrap(), Mode::MAILBOX);
        assert_eq!(
            choose_present_mode(&[Mode::FIFO, Mode::IMMEDIATE], PresentModePreference::LowLatency).unwrap(),
            Mode::IMMEDIATE
        );
        assert_eq!(
            choose_present_mode(&[Mode::FIFO], PresentModePreference::LowLatency).unwrap(),
            Mode::FIFO
        );
        assert_eq!(choose_present_mode(&all, PresentModePreference::VSync).unwrap(), Mode::FIFO);
        assert!(choose_present_mode(&[], PresentModePreference::VSync).is_err());
    }

    #[test]
    fn test_settings_are_stable_for_unchanged_surface() {
        let support = support(vec![PREFERRED_FORMAT], vec![vk::PresentModeKHR::FIFO]);

        let first = SwapchainSettings::choose(&support, (1024, 768), PresentModePreference::LowLatency).unwrap();
        let second = SwapchainSettings::choose(&support, (1024, 768), PresentModePreference::LowLatency).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.extent, vk::Extent2D { width: 1024, height: 768 });
        assert_eq!(first.surface_format, PREFERRED_FORMAT);
        assert_eq!(first.image_count, 3);
    }
}
