//! Vulkan instance and validation messenger

#[cfg(debug_assertions)]
use ash::extensions::ext::DebugUtils;
use ash::{vk, Entry, Instance};
#[cfg(debug_assertions)]
use std::ffi::CStr;
use std::ffi::CString;
use std::os::raw::c_char;

use crate::render::backends::vulkan::{VulkanError, VulkanResult};

/// Khronos validation layer name
pub const VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";

/// Application identity passed to the driver
#[derive(Debug, Clone)]
pub struct InstanceSettings<'a> {
    /// Application name
    pub application_name: &'a str,
    /// Application version (major, minor, patch)
    pub application_version: (u32, u32, u32),
    /// Extensions the surface provider needs
    pub surface_extensions: &'a [String],
    /// Enable validation layers and the debug messenger (debug builds only)
    pub enable_validation: bool,
}

/// Vulkan instance wrapper with RAII cleanup
pub struct VulkanInstance {
    entry: Entry,
    instance: Instance,
    #[cfg(debug_assertions)]
    debug: Option<(DebugUtils, vk::DebugUtilsMessengerEXT)>,
}

impl VulkanInstance {
    /// Load Vulkan and create an instance for the given surface extensions
    pub fn new(settings: &InstanceSettings<'_>) -> VulkanResult<Self> {
        let entry = unsafe { Entry::load() }.map_err(|e| VulkanError::Loader(e.to_string()))?;

        let validation = cfg!(debug_assertions) && settings.enable_validation;

        let app_name = to_cstring(settings.application_name)?;
        let engine_name = to_cstring("ocean_engine")?;
        let (major, minor, patch) = settings.application_version;
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, major, minor, patch))
            .engine_name(&engine_name)
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_0);

        #[allow(unused_mut)] // extended with the debug extension in debug builds
        let mut extension_names = settings.surface_extensions.to_vec();
        #[cfg(debug_assertions)]
        if validation {
            extension_names.push(DebugUtils::name().to_string_lossy().into_owned());
        }
        let available_extensions = unsafe { entry.enumerate_instance_extension_properties(None) }
            .map_err(VulkanError::init("instance extension list"))?;
        let available_extensions: Vec<String> =
            available_extensions.iter().map(|p| name_from_raw(&p.extension_name)).collect();
        log::debug!("Available instance extensions: {}", available_extensions.join(", "));
        if let Some(missing) = first_missing(&extension_names, &available_extensions) {
            return Err(VulkanError::MissingExtension(missing.to_string()));
        }

        let layer_names: Vec<String> = if validation {
            vec![VALIDATION_LAYER.to_string()]
        } else {
            Vec::new()
        };
        if !layer_names.is_empty() {
            let available_layers = unsafe { entry.enumerate_instance_layer_properties() }
                .map_err(VulkanError::init("instance layer list"))?;
            let available_layers: Vec<String> =
                available_layers.iter().map(|p| name_from_raw(&p.layer_name)).collect();
            log::debug!("Available instance layers: {}", available_layers.join(", "));
            if let Some(missing) = first_missing(&layer_names, &available_layers) {
                return Err(VulkanError::MissingLayer(missing.to_string()));
            }
        }

        let extension_cstrings = extension_names
            .iter()
            .map(|name| to_cstring(name))
            .collect::<VulkanResult<Vec<_>>>()?;
        let layer_cstrings = layer_names
            .iter()
            .map(|name| to_cstring(name))
            .collect::<VulkanResult<Vec<_>>>()?;
        let extension_ptrs: Vec<*const c_char> = extension_cstrings.iter().map(|s| s.as_ptr()).collect();
        let layer_ptrs: Vec<*const c_char> = layer_cstrings.iter().map(|s| s.as_ptr()).collect();

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extension_ptrs)
            .enabled_layer_names(&layer_ptrs);

        let instance = unsafe { entry.create_instance(&create_info, None) }
            .map_err(VulkanError::init("instance"))?;
        log::info!(
            "Vulkan instance created (validation {})",
            if validation { "on" } else { "off" }
        );

        #[cfg(debug_assertions)]
        let debug = if validation {
            let debug_utils = DebugUtils::new(&entry, &instance);
            match setup_debug_messenger(&debug_utils) {
                Ok(messenger) => Some((debug_utils, messenger)),
                Err(e) => {
                    unsafe { instance.destroy_instance(None) };
                    return Err(e);
                }
            }
        } else {
            None
        };

        Ok(Self {
            entry,
            instance,
            #[cfg(debug_assertions)]
            debug,
        })
    }

    /// Vulkan entry point
    pub const fn entry(&self) -> &Entry {
        &self.entry
    }

    /// Vulkan instance
    pub const fn instance(&self) -> &Instance {
        &self.instance
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            #[cfg(debug_assertions)]
            if let Some((debug_utils, messenger)) = self.debug.take() {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

#[cfg(debug_assertions)]
fn setup_debug_messenger(debug_utils: &DebugUtils) -> VulkanResult<vk::DebugUtilsMessengerEXT> {
    let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(debug_callback));

    unsafe { debug_utils.create_debug_utils_messenger(&create_info, None) }
        .map_err(VulkanError::init("debug messenger"))
}

/// Forwards validation messages to the `log` facade
#[cfg(debug_assertions)]
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    if callback_data.is_null() || (*callback_data).p_message.is_null() {
        return vk::FALSE;
    }
    let message = CStr::from_ptr((*callback_data).p_message).to_string_lossy();

    if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        log::error!("[Vulkan] {:?} - {}", message_type, message);
    } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        log::warn!("[Vulkan] {:?} - {}", message_type, message);
    } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        log::info!("[Vulkan] {:?} - {}", message_type, message);
    } else {
        log::debug!("[Vulkan] {:?} - {}", message_type, message);
    }

    vk::FALSE
}

fn to_cstring(value: &str) -> VulkanResult<CString> {
    CString::new(value).map_err(|_| VulkanError::Loader(format!("name contains a NUL byte: {value:?}")))
}

/// Decode a fixed-size, NUL-terminated name array from a Vulkan properties struct
pub(crate) fn name_from_raw(raw: &[c_char]) -> String {
    let bytes: Vec<u8> = raw.iter().take_while(|&&c| c != 0).map(|&c| c as u8).collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// First entry of `required` absent from `available`
pub(crate) fn first_missing<'a>(required: &'a [String], available: &[String]) -> Option<&'a str> {
    required
        .iter()
        .find(|name| !available.iter().any(|have| have == *name))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_from_raw_stops_at_nul() {
        let mut raw = [0 as c_char; 16];
        for (slot, byte) in raw.iter_mut().zip(b"VK_KHR_surface") {
            *slot = *byte as c_char;
        }
        assert_eq!(name_from_raw(&raw), "VK_KHR_surface");
    }

    #[test]
    fn test_first_missing() {
        let available = vec!["VK_KHR_surface".to_string(), "VK_KHR_xcb_surface".to_string()];
        let satisfied = vec!["VK_KHR_surface".to_string()];
        let unsatisfied = vec!["VK_KHR_surface".to_string(), "VK_EXT_debug_utils".to_string()];

        assert_eq!(first_missing(&satisfied, &available), None);
        assert_eq!(first_missing(&unsatisfied, &available), Some("VK_EXT_debug_utils"));
        assert_eq!(first_missing(&[], &available), None);
    }
}
