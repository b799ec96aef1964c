//! Camera producing view and projection matrices.

use glam::{Mat4, Vec3};

/// A perspective camera described by eye, forward, and up vectors.
#[derive(Clone, Debug)]
pub struct Camera {
    /// Camera position in world space.
    pub eye: Vec3,
    /// View direction (does not need to be normalized).
    pub forward: Vec3,
    /// Up vector.
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Aspect ratio (width / height).
    pub aspect: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 2.0, 5.0),
            forward: Vec3::new(0.0, -0.3, -1.0),
            up: Vec3::Y,
            fov_y: 45.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    /// Creates a camera with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Points the camera at a target position.
    pub fn look_at(&mut self, target: Vec3) {
        self.forward = target - self.eye;
    }

    /// Updates the aspect ratio, typically after a window resize.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Returns the view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.eye + self.forward, self.up)
    }

    /// Returns the projection matrix with the Vulkan Y-flip applied.
    ///
    /// glam produces OpenGL-convention clip space with Y up; Vulkan's clip
    /// space has Y down, so the Y axis of the projection is negated.
    pub fn projection_matrix(&self) -> Mat4 {
        let mut proj = Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far);
        proj.y_axis.y *= -1.0;
        proj
    }

    /// Returns the combined view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn test_projection_flips_y() {
        let camera = Camera::default();
        let proj = camera.projection_matrix();
        // A point above the view axis lands in negative clip-space Y.
        let clip = proj * Vec4::new(0.0, 1.0, -5.0, 1.0);
        assert!(clip.y < 0.0);
    }

    #[test]
    fn test_view_matrix_centers_eye() {
        let mut camera = Camera::default();
        camera.eye = Vec3::new(3.0, 4.0, 5.0);
        camera.look_at(Vec3::ZERO);

        let view = camera.view_matrix();
        let eye_in_view = view * camera.eye.extend(1.0);
        assert!(eye_in_view.truncate().length() < 1e-5);
    }

    #[test]
    fn test_look_at_sets_forward() {
        let mut camera = Camera::default();
        camera.eye = Vec3::new(0.0, 0.0, 5.0);
        camera.look_at(Vec3::ZERO);
        assert_eq!(camera.forward, Vec3::new(0.0, 0.0, -5.0));
    }
}
