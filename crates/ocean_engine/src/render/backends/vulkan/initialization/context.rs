//! Vulkan context management
//!
//! [`VulkanContext`] owns the objects that live for the whole engine run:
//! instance, surface, selected physical device and logical device. Fields are
//! declared in reverse creation order so the default drop order tears them
//! down correctly.

use ash::extensions::khr::{Surface, Swapchain as SwapchainLoader};
use ash::{vk, Device, Entry, Instance};
use std::os::raw::c_char;

use super::device_selector::PhysicalDeviceInfo;
use super::instance::{InstanceSettings, VulkanInstance};
use crate::render::backends::vulkan::{VulkanError, VulkanResult};

/// Window-side source of a presentable Vulkan surface
pub trait SurfaceSource {
    /// Instance extensions the window system needs
    fn required_instance_extensions(&self) -> VulkanResult<Vec<String>>;

    /// Create a surface for this window on `instance`
    fn create_surface(&mut self, instance: &Instance) -> VulkanResult<vk::SurfaceKHR>;
}

/// Surface handle destroyed on drop
pub struct PresentationSurface {
    loader: Surface,
    handle: vk::SurfaceKHR,
}

impl PresentationSurface {
    /// Surface extension loader
    pub const fn loader(&self) -> &Surface {
        &self.loader
    }

    /// Raw surface handle
    pub const fn handle(&self) -> vk::SurfaceKHR {
        self.handle
    }
}

impl Drop for PresentationSurface {
    fn drop(&mut self) {
        unsafe {
            self.loader.destroy_surface(self.handle, None);
        }
    }
}

/// Logical device wrapper with RAII cleanup
pub struct LogicalDevice {
    device: Device,
    queue: vk::Queue,
    queue_family_index: u32,
    swapchain_loader: SwapchainLoader,
}

impl LogicalDevice {
    /// Create the device with one graphics+present queue and anisotropic sampling
    pub fn new(instance: &Instance, physical_device: &PhysicalDeviceInfo) -> VulkanResult<Self> {
        let queue_family_index = physical_device.queue_family_index;
        let priorities = [1.0_f32];
        let queue_infos = [vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(queue_family_index)
            .queue_priorities(&priorities)
            .build()];

        let extension_ptrs: [*const c_char; 1] = [SwapchainLoader::name().as_ptr()];
        let features = vk::PhysicalDeviceFeatures::builder().sampler_anisotropy(true).build();

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&extension_ptrs)
            .enabled_features(&features);

        let device = unsafe { instance.create_device(physical_device.handle, &create_info, None) }
            .map_err(VulkanError::init("logical device"))?;
        let queue = unsafe { device.get_device_queue(queue_family_index, 0) };
        let swapchain_loader = SwapchainLoader::new(instance, &device);

        Ok(Self {
            device,
            queue,
            queue_family_index,
            swapchain_loader,
        })
    }

    /// Logical device
    pub const fn device(&self) -> &Device {
        &self.device
    }

    /// Queue used for graphics, transfer and presentation
    pub const fn queue(&self) -> vk::Queue {
        self.queue
    }

    /// Family of [`LogicalDevice::queue`]
    pub const fn queue_family_index(&self) -> u32 {
        self.queue_family_index
    }

    /// Swapchain extension loader
    pub const fn swapchain_loader(&self) -> &SwapchainLoader {
        &self.swapchain_loader
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            self.device.destroy_device(None);
        }
    }
}

/// Process-lifetime Vulkan objects
pub struct VulkanContext {
    device: LogicalDevice,
    physical_device: PhysicalDeviceInfo,
    surface: PresentationSurface,
    instance: VulkanInstance,
}

impl VulkanContext {
    /// Create instance, surface and device for `window`
    pub fn new(
        window: &mut impl SurfaceSource,
        application_name: &str,
        application_version: (u32, u32, u32),
        enable_validation: bool,
    ) -> VulkanResult<Self> {
        let surface_extensions = window.required_instance_extensions()?;
        let instance = VulkanInstance::new(&InstanceSettings {
            application_name,
            application_version,
            surface_extensions: &surface_extensions,
            enable_validation,
        })?;

        let surface = PresentationSurface {
            loader: Surface::new(instance.entry(), instance.instance()),
            handle: window.create_surface(instance.instance())?,
        };

        let physical_device = PhysicalDeviceInfo::select(instance.instance(), surface.loader(), surface.handle())?;
        let device = LogicalDevice::new(instance.instance(), &physical_device)?;
        log::info!(
            "Logical device ready on queue family {}",
            physical_device.queue_family_index
        );

        Ok(Self {
            device,
            physical_device,
            surface,
            instance,
        })
    }

    /// Vulkan entry point
    pub const fn entry(&self) -> &Entry {
        self.instance.entry()
    }

    /// Vulkan instance
    pub const fn instance(&self) -> &Instance {
        self.instance.instance()
    }

    /// Logical device
    pub const fn device(&self) -> &Device {
        self.device.device()
    }

    /// Logical device wrapper
    pub const fn logical_device(&self) -> &LogicalDevice {
        &self.device
    }

    /// Selected physical device
    pub const fn physical_device(&self) -> &PhysicalDeviceInfo {
        &self.physical_device
    }

    /// Presentation surface
    pub const fn surface(&self) -> &PresentationSurface {
        &self.surface
    }

    /// Queue used for all submissions
    pub const fn queue(&self) -> vk::Queue {
        self.device.queue()
    }

    /// Query format features for `format`
    pub fn format_properties(&self, format: vk::Format) -> vk::FormatProperties {
        unsafe {
            self.instance()
                .get_physical_device_format_properties(self.physical_device.handle, format)
        }
    }

    /// Block until all submitted work has finished
    pub fn wait_idle(&self) -> VulkanResult<()> {
        unsafe { self.device().device_wait_idle() }.map_err(VulkanError::runtime("device wait idle"))
    }
}
