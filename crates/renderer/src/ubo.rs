//! Uniform buffer object definitions for shaders.
//!
//! These structures must match the shader uniform block layouts exactly.
//! All structures use `#[repr(C)]` for predictable memory layout and
//! implement `Pod` and `Zeroable` for safe byte casting.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use glint_scene::Camera;

/// Camera uniform buffer data, one copy per swapchain image.
///
/// # Memory Layout
///
/// - Offset 0: view matrix (64 bytes)
/// - Offset 64: projection matrix (64 bytes)
/// - Offset 128: viewProjection matrix (64 bytes)
/// - Offset 192: camera position (12 bytes)
/// - Offset 204: padding (4 bytes)
/// - Total size: 208 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct CameraUbo {
    /// View matrix (world to view space).
    pub view: Mat4,
    /// Projection matrix (view to clip space), Vulkan Y flip applied.
    pub projection: Mat4,
    /// Combined view-projection matrix.
    pub view_projection: Mat4,
    /// Camera world position.
    pub camera_position: Vec3,
    /// Padding for 16-byte alignment.
    pub _padding: f32,
}

impl CameraUbo {
    /// Size of the struct in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Creates a camera UBO from view and projection matrices.
    pub fn new(view: Mat4, projection: Mat4, camera_position: Vec3) -> Self {
        Self {
            view,
            projection,
            view_projection: projection * view,
            camera_position,
            _padding: 0.0,
        }
    }

    /// Creates a camera UBO from a camera.
    pub fn from_camera(camera: &Camera) -> Self {
        Self::new(
            camera.view_matrix(),
            camera.projection_matrix(),
            camera.eye,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_ubo_size() {
        // 3 Mat4 (3 * 64) + Vec3 (12) + padding (4) = 208 bytes
        assert_eq!(CameraUbo::SIZE, 208);
    }

    #[test]
    fn test_camera_ubo_alignment() {
        // Mat4 requires 16-byte alignment on the GPU
        assert_eq!(std::mem::align_of::<CameraUbo>(), 16);
    }

    #[test]
    fn test_camera_ubo_combines_matrices() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let projection = Mat4::perspective_rh(45.0_f32.to_radians(), 16.0 / 9.0, 0.1, 100.0);

        let ubo = CameraUbo::new(view, projection, Vec3::new(0.0, 0.0, 5.0));

        assert_eq!(ubo.view, view);
        assert_eq!(ubo.projection, projection);
        assert_eq!(ubo.view_projection, projection * view);
    }

    #[test]
    fn test_camera_ubo_from_camera() {
        let camera = Camera::default();
        let ubo = CameraUbo::from_camera(&camera);

        assert_eq!(ubo.view, camera.view_matrix());
        assert_eq!(ubo.camera_position, camera.eye);

        let bytes: &[u8] = bytemuck::bytes_of(&ubo);
        assert_eq!(bytes.len(), CameraUbo::SIZE);
    }
}
