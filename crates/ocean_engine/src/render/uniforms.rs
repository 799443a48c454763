//! Per-frame uniform data

use crate::foundation::math::{perspective_vulkan, rotation_y, Mat4};

/// Initial yaw applied to every model
const BASE_YAW_DEGREES: f32 = -135.0;
/// Amplitude of the idle oscillation around the base yaw
const SWAY_DEGREES: f32 = 35.0;

/// Inputs consumed by one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    /// Seconds since the render loop started
    pub elapsed_seconds: f32,
    /// World-to-view transform supplied by the caller
    pub view: Mat4,
}

impl Default for FrameInput {
    fn default() -> Self {
        Self {
            elapsed_seconds: 0.0,
            view: Mat4::identity(),
        }
    }
}

/// Projection parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Vertical field of view in degrees
    pub fov_y_degrees: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y_degrees: 60.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Uniform block bound at binding 0, matching the vertex shader layout
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformBufferObject {
    /// Model-to-world matrix, column-major
    pub model: [[f32; 4]; 4],
    /// World-to-view matrix, column-major
    pub view: [[f32; 4]; 4],
    /// View-to-clip matrix, column-major
    pub proj: [[f32; 4]; 4],
}

unsafe impl bytemuck::Pod for UniformBufferObject {}
unsafe impl bytemuck::Zeroable for UniformBufferObject {}

impl UniformBufferObject {
    /// Compute the uniform block for one frame
    ///
    /// `extent` is the current swapchain size; a zero height is treated as 1
    /// so the aspect ratio stays finite.
    pub fn for_frame(input: &FrameInput, extent: (u32, u32), projection: &Projection) -> Self {
        let yaw = BASE_YAW_DEGREES.to_radians() + input.elapsed_seconds.sin() * SWAY_DEGREES.to_radians();
        let aspect = extent.0 as f32 / extent.1.max(1) as f32;
        let proj = perspective_vulkan(
            projection.fov_y_degrees.to_radians(),
            aspect,
            projection.near,
            projection.far,
        );

        Self {
            model: rotation_y(yaw).into(),
            view: input.view.into(),
            proj: proj.into(),
        }
    }

    /// Raw bytes for the mapped buffer
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_layout_is_three_matrices() {
        assert_eq!(std::mem::size_of::<UniformBufferObject>(), 3 * 64);
        let ubo = UniformBufferObject::for_frame(&FrameInput::default(), (640, 480), &Projection::default());
        assert_eq!(ubo.as_bytes().len(), 192);
    }

    #[test]
    fn test_projection_is_flipped_and_uses_aspect() {
        let ubo = UniformBufferObject::for_frame(&FrameInput::default(), (800, 400), &Projection::default());
        // proj[column][row]
        assert!(ubo.proj[1][1] < 0.0);
        assert_relative_eq!(ubo.proj[0][0] * 2.0, -ubo.proj[1][1], epsilon = 1e-5);
    }

    #[test]
    fn test_model_starts_at_base_yaw() {
        let ubo = UniformBufferObject::for_frame(&FrameInput::default(), (1, 1), &Projection::default());
        let expected: [[f32; 4]; 4] = rotation_y(BASE_YAW_DEGREES.to_radians()).into();
        for (column, expected_column) in ubo.model.iter().zip(expected.iter()) {
            for (value, expected_value) in column.iter().zip(expected_column.iter()) {
                assert_relative_eq!(value, expected_value, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_view_is_passed_through() {
        let mut view = Mat4::identity();
        view[(0, 3)] = 4.0;
        let input = FrameInput { elapsed_seconds: 1.0, view };
        let ubo = UniformBufferObject::for_frame(&input, (640, 480), &Projection::default());
        assert_eq!(ubo.view[3][0], 4.0);
    }

    #[test]
    fn test_zero_height_does_not_divide_by_zero() {
        let ubo = UniformBufferObject::for_frame(&FrameInput::default(), (640, 0), &Projection::default());
        assert!(ubo.proj[0][0].is_finite());
    }
}
