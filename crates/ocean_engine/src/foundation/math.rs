//! Math utilities and types
//!
//! `nalgebra` aliases plus the projection helpers the renderer needs. Vulkan
//! clip space has Y pointing down and depth in `[0, 1]`, so projections are
//! built here rather than with the OpenGL-style constructors.

pub use nalgebra::{Matrix4, Point3 as NPoint3, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = NPoint3<f32>;

/// Right-handed perspective projection for Vulkan clip space
///
/// Depth maps `-near` to 0 and `-far` to 1; the Y axis is flipped so that
/// +Y in view space points up on screen.
pub fn perspective_vulkan(fov_y_radians: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let f = 1.0 / (fov_y_radians * 0.5).tan();
    let depth = far / (near - far);

    Mat4::new(
        f / aspect, 0.0, 0.0, 0.0,
        0.0, -f, 0.0, 0.0,
        0.0, 0.0, depth, near * depth,
        0.0, 0.0, -1.0, 0.0,
    )
}

/// Right-handed view matrix looking from `eye` towards `target`
pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up)
}

/// Rotation about the Y axis
pub fn rotation_y(angle_radians: f32) -> Mat4 {
    Mat4::from_axis_angle(&Vec3::y_axis(), angle_radians)
}
