//! Physical device selection
//!
//! Every enumerated device is reduced to a [`DeviceCandidate`] and scored:
//! devices without geometry shaders or anisotropic sampling score 0, the rest
//! get a type bonus plus their maximum 2D image dimension. The highest score
//! wins (first device on ties). The winner must then expose one queue family
//! that does both graphics and presentation, and the swapchain extension;
//! failing either check is fatal.

use ash::extensions::khr::{Surface, Swapchain as SwapchainLoader};
use ash::{vk, Instance};

use super::instance::{first_missing, name_from_raw};
use crate::render::backends::vulkan::{VulkanError, VulkanResult};

/// Score bonus for discrete GPUs
pub const DISCRETE_GPU_BONUS: u64 = 64;
/// Score bonus for integrated GPUs
pub const INTEGRATED_GPU_BONUS: u64 = 8;

/// Capability summary of one physical device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCandidate {
    /// Driver-reported device name
    pub name: String,
    /// Discrete, integrated, virtual, CPU or other
    pub device_type: vk::PhysicalDeviceType,
    /// `geometryShader` feature
    pub geometry_shader: bool,
    /// `samplerAnisotropy` feature
    pub sampler_anisotropy: bool,
    /// `maxImageDimension2D` limit
    pub max_image_dimension_2d: u32,
}

impl DeviceCandidate {
    /// Summarize driver-reported properties and features
    pub fn from_properties(properties: &vk::PhysicalDeviceProperties, features: &vk::PhysicalDeviceFeatures) -> Self {
        Self {
            name: name_from_raw(&properties.device_name),
            device_type: properties.device_type,
            geometry_shader: features.geometry_shader == vk::TRUE,
            sampler_anisotropy: features.sampler_anisotropy == vk::TRUE,
            max_image_dimension_2d: properties.limits.max_image_dimension2_d,
        }
    }

    /// Suitability score; 0 means unusable
    pub fn score(&self) -> u64 {
        if !self.geometry_shader || !self.sampler_anisotropy {
            return 0;
        }
        let bonus = match self.device_type {
            vk::PhysicalDeviceType::DISCRETE_GPU => DISCRETE_GPU_BONUS,
            vk::PhysicalDeviceType::INTEGRATED_GPU => INTEGRATED_GPU_BONUS,
            _ => 0,
        };
        bonus + u64::from(self.max_image_dimension_2d)
    }
}

/// Index of the highest-scoring candidate
///
/// Ties go to the earliest candidate. Fails with `NoSuitableDevice` when the
/// list is empty or the best score is 0.
pub fn select_device(candidates: &[DeviceCandidate]) -> VulkanResult<usize> {
    let mut best: Option<(usize, u64)> = None;
    for (index, candidate) in candidates.iter().enumerate() {
        let score = candidate.score();
        log::debug!("Device candidate '{}' ({:?}) scored {}", candidate.name, candidate.device_type, score);
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((index, score));
        }
    }

    match best {
        Some((index, score)) if score > 0 => Ok(index),
        _ => Err(VulkanError::NoSuitableDevice),
    }
}

/// Queue family capabilities relevant to selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilySupport {
    /// Operations the family supports
    pub flags: vk::QueueFlags,
    /// Number of queues in the family
    pub queue_count: u32,
    /// Whether the family can present to the target surface
    pub presents: bool,
}

/// First queue family supporting both graphics and presentation
pub fn find_graphics_present_family(families: &[QueueFamilySupport]) -> Option<u32> {
    families
        .iter()
        .position(|family| {
            family.queue_count > 0 && family.presents && family.flags.contains(vk::QueueFlags::GRAPHICS)
        })
        .map(|index| index as u32)
}

/// Render queue flags as `|Graphics|Compute|...|` for logs
pub fn queue_flags_to_string(flags: vk::QueueFlags) -> String {
    const NAMES: [(vk::QueueFlags, &str); 5] = [
        (vk::QueueFlags::GRAPHICS, "Graphics"),
        (vk::QueueFlags::COMPUTE, "Compute"),
        (vk::QueueFlags::TRANSFER, "Transfer"),
        (vk::QueueFlags::SPARSE_BINDING, "Sparsebinding"),
        (vk::QueueFlags::PROTECTED, "Protected"),
    ];

    let mut formatted = String::new();
    for (bit, name) in NAMES {
        if flags.contains(bit) {
            formatted.push('|');
            formatted.push_str(name);
        }
    }
    formatted.push('|');
    formatted
}

/// Device-level extensions every selected device must expose
pub fn required_device_extensions() -> Vec<String> {
    vec![SwapchainLoader::name().to_string_lossy().into_owned()]
}

/// The selected physical device
#[derive(Debug, Clone)]
pub struct PhysicalDeviceInfo {
    /// Vulkan physical device handle
    pub handle: vk::PhysicalDevice,
    /// Capability summary used for selection
    pub candidate: DeviceCandidate,
    /// Device properties and limits
    pub properties: vk::PhysicalDeviceProperties,
    /// Memory heaps and types
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    /// Queue family used for graphics and presentation
    pub queue_family_index: u32,
}

impl PhysicalDeviceInfo {
    /// Enumerate, score and validate physical devices for `surface`
    pub fn select(instance: &Instance, surface_loader: &Surface, surface: vk::SurfaceKHR) -> VulkanResult<Self> {
        let devices = unsafe { instance.enumerate_physical_devices() }
            .map_err(VulkanError::init("physical device list"))?;

        let candidates: Vec<DeviceCandidate> = devices
            .iter()
            .map(|&device| unsafe {
                DeviceCandidate::from_properties(
                    &instance.get_physical_device_properties(device),
                    &instance.get_physical_device_features(device),
                )
            })
            .collect();

        let index = select_device(&candidates)?;
        let handle = devices[index];
        let candidate = candidates[index].clone();
        log::info!("Selected GPU: {} (score {})", candidate.name, candidate.score());

        let families = unsafe { instance.get_physical_device_queue_family_properties(handle) };
        let mut support = Vec::with_capacity(families.len());
        for (family_index, family) in families.iter().enumerate() {
            let presents = unsafe {
                surface_loader.get_physical_device_surface_support(handle, family_index as u32, surface)
            }
            .map_err(VulkanError::init("surface support query"))?;
            log::debug!(
                "Queue family {}: {} x{} (present: {})",
                family_index,
                queue_flags_to_string(family.queue_flags),
                family.queue_count,
                presents
            );
            support.push(QueueFamilySupport {
                flags: family.queue_flags,
                queue_count: family.queue_count,
                presents,
            });
        }

        let queue_family_index = find_graphics_present_family(&support).ok_or_else(|| {
            VulkanError::NoSuitableQueueFamily(candidate.name.clone())
        })?;

        let extensions = unsafe { instance.enumerate_device_extension_properties(handle) }
            .map_err(VulkanError::init("device extension list"))?;
        let available: Vec<String> = extensions.iter().map(|e| name_from_raw(&e.extension_name)).collect();
        if let Some(missing) = first_missing(&required_device_extensions(), &available) {
            return Err(VulkanError::MissingExtension(missing.to_string()));
        }

        let properties = unsafe { instance.get_physical_device_properties(handle) };
        let memory_properties = unsafe { instance.get_physical_device_memory_properties(handle) };

        Ok(Self {
            handle,
            candidate,
            properties,
            memory_properties,
            queue_family_index,
        })
    }

    /// Maximum sampler anisotropy supported by the device
    pub const fn max_sampler_anisotropy(&self) -> f32 {
        self.properties.limits.max_sampler_anisotropy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(name: &str, device_type: vk::PhysicalDeviceType, features: bool, max_dim: u32) -> DeviceCandidate {
        DeviceCandidate {
            name: name.to_string(),
            device_type,
            geometry_shader: features,
            sampler_anisotropy: features,
            max_image_dimension_2d: max_dim,
        }
    }

    #[test]
    fn test_discrete_beats_integrated() {
        let devices = [
            device("discrete", vk::PhysicalDeviceType::DISCRETE_GPU, true, 8192),
            device("integrated", vk::PhysicalDeviceType::INTEGRATED_GPU, true, 4096),
        ];
        assert_eq!(devices[0].score(), DISCRETE_GPU_BONUS + 8192);
        assert_eq!(devices[1].score(), INTEGRATED_GPU_BONUS + 4096);
        assert_eq!(select_device(&devices).unwrap(), 0);

        let reversed = [devices[1].clone(), devices[0].clone()];
        assert_eq!(select_device(&reversed).unwrap(), 1);
    }

    #[test]
    fn test_missing_feature_scores_zero() {
        let mut candidate = device("gpu", vk::PhysicalDeviceType::DISCRETE_GPU, true, 16384);
        candidate.sampler_anisotropy = false;
        assert_eq!(candidate.score(), 0);

        let mut candidate = device("gpu", vk::PhysicalDeviceType::DISCRETE_GPU, true, 16384);
        candidate.geometry_shader = false;
        assert_eq!(candidate.score(), 0);
    }

    #[test]
    fn test_all_unsuitable_fails() {
        let devices = [
            device("a", vk::PhysicalDeviceType::DISCRETE_GPU, false, 16384),
            device("b", vk::PhysicalDeviceType::CPU, false, 4096),
        ];
        assert!(matches!(select_device(&devices), Err(VulkanError::NoSuitableDevice)));
        assert!(matches!(select_device(&[]), Err(VulkanError::NoSuitableDevice)));
    }

    #[test]
    fn test_selection_is_deterministic_on_ties() {
        let devices = [
            device("first", vk::PhysicalDeviceType::INTEGRATED_GPU, true, 4096),
            device("second", vk::PhysicalDeviceType::INTEGRATED_GPU, true, 4096),
        ];
        for _ in 0..4 {
            assert_eq!(select_device(&devices).unwrap(), 0);
        }
    }

    #[test]
    fn test_unsuitable_device_never_wins() {
        let devices = [
            device("huge but featureless", vk::PhysicalDeviceType::DISCRETE_GPU, false, 65536),
            device("small", vk::PhysicalDeviceType::VIRTUAL_GPU, true, 1024),
        ];
        assert_eq!(select_device(&devices).unwrap(), 1);
    }

    #[test]
    fn test_from_properties() {
        let mut properties = vk::PhysicalDeviceProperties {
            device_type: vk::PhysicalDeviceType::DISCRETE_GPU,
            ..Default::default()
        };
        properties.limits.max_image_dimension2_d = 8192;
        for (slot, byte) in properties.device_name.iter_mut().zip(b"Test GPU") {
            *slot = *byte as std::os::raw::c_char;
        }
        let features = vk::PhysicalDeviceFeatures {
            geometry_shader: vk::TRUE,
            sampler_anisotropy: vk::TRUE,
            ..Default::default()
        };

        let candidate = DeviceCandidate::from_properties(&properties, &features);
        assert_eq!(candidate.name, "Test GPU");
        assert_eq!(candidate.score(), DISCRETE_GPU_BONUS + 8192);
    }

    #[test]
    fn test_queue_family_must_do_both() {
        let families = [
            QueueFamilySupport { flags: vk::QueueFlags::GRAPHICS, queue_count: 1, presents: false },
            QueueFamilySupport { flags: vk::QueueFlags::TRANSFER, queue_count: 1, presents: true },
            QueueFamilySupport {
                flags: vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE,
                queue_count: 4,
                presents: true,
            },
        ];
        assert_eq!(find_graphics_present_family(&families), Some(2));
        assert_eq!(find_graphics_present_family(&families[..2]), None);
    }

    #[test]
    fn test_queue_flags_to_string() {
        assert_eq!(
            queue_flags_to_string(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER),
            "|Graphics|Compute|Transfer|"
        );
        assert_eq!(queue_flags_to_string(vk::QueueFlags::empty()), "|");
    }

    #[test]
    fn test_swapchain_extension_required() {
        assert_eq!(required_device_extensions(), vec!["VK_KHR_swapchain".to_string()]);
    }
}
