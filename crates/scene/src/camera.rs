use glam::{Mat4, Vec3};

/// Perspective camera with an optional look-at target.
///
/// Without a target the camera looks down -Z from its position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Option<Vec3>,
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: None,
            fov_degrees: 75.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl PerspectiveCamera {
    pub fn with_viewport(width: f32, height: f32) -> Self {
        let mut camera = Self::default();
        camera.set_viewport(width, height);
        camera
    }

    /// Set `aspect = width / height`. Returns false, leaving the aspect
    /// untouched, for a degenerate viewport.
    pub fn set_viewport(&mut self, width: f32, height: f32) -> bool {
        if !(width > 0.0 && height > 0.0) || !width.is_finite() || !height.is_finite() {
            tracing::debug!(width, height, "ignoring degenerate viewport");
            return false;
        }
        self.aspect = width / height;
        true
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = Some(target);
    }

    pub fn forward(&self) -> Vec3 {
        match self.target {
            Some(target) if target != self.position => (target - self.position).normalize(),
            _ => Vec3::NEG_Z,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
