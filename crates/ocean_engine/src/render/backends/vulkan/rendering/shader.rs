//! SPIR-V shader modules

use ash::{vk, Device};
use std::ffi::CStr;
use std::io::Cursor;
use std::path::Path;

use crate::render::backends::vulkan::{VulkanError, VulkanResult};

/// Entry point used by both shader stages
pub const ENTRY_POINT: &CStr = c"main";

/// Decode SPIR-V bytecode into words
///
/// Rejects input whose length is not a multiple of four or that lacks the
/// SPIR-V magic number.
pub fn decode_spirv(bytes: &[u8]) -> VulkanResult<Vec<u32>> {
    ash::util::read_spv(&mut Cursor::new(bytes)).map_err(|e| VulkanError::Shader(format!("invalid SPIR-V: {e}")))
}

/// Shader module wrapper with RAII cleanup
pub struct ShaderModule {
    device: Device,
    module: vk::ShaderModule,
}

impl ShaderModule {
    /// Create a shader module from SPIR-V bytecode
    pub fn from_bytes(device: &Device, bytes: &[u8]) -> VulkanResult<Self> {
        let code = decode_spirv(bytes)?;
        let create_info = vk::ShaderModuleCreateInfo::builder().code(&code);

        let module = unsafe { device.create_shader_module(&create_info, None) }
            .map_err(VulkanError::init("shader module"))?;

        Ok(Self {
            device: device.clone(),
            module,
        })
    }

    /// Load a shader module from a SPIR-V file
    pub fn from_file(device: &Device, path: impl AsRef<Path>) -> VulkanResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| VulkanError::Shader(format!("failed to read {}: {e}", path.display())))?;
        log::debug!("Loaded shader {} ({} bytes)", path.display(), bytes.len());
        Self::from_bytes(device, &bytes)
    }

    /// Shader module handle
    pub const fn handle(&self) -> vk::ShaderModule {
        self.module
    }

    /// Stage description using [`ENTRY_POINT`]
    pub fn stage_info(&self, stage: vk::ShaderStageFlags) -> vk::PipelineShaderStageCreateInfo {
        vk::PipelineShaderStageCreateInfo::builder()
            .stage(stage)
            .module(self.module)
            .name(ENTRY_POINT)
            .build()
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid_header() {
        let words = [0x0723_0203_u32, 0x0001_0000, 0, 1, 0];
        let bytes: Vec<u8> = words.iter().flat_map(|word| word.to_le_bytes()).collect();
        assert_eq!(decode_spirv(&bytes).unwrap(), words.to_vec());
    }

    #[test]
    fn test_decode_rejects_truncated_input() {
        let bytes = [0x03, 0x02, 0x23, 0x07, 0x00];
        assert!(matches!(decode_spirv(&bytes), Err(VulkanError::Shader(_))));
    }

    #[test]
    fn test_decode_rejects_missing_magic() {
        let bytes = [0_u8; 16];
        assert!(matches!(decode_spirv(&bytes), Err(VulkanError::Shader(_))));
    }
}
