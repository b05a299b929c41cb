use glam::{Mat4, Vec3};

/// Perspective camera that follows the orbit and tracks the look-at target
#[derive(Clone, Debug)]
pub struct PerspectiveCamera {
    pub eye: Vec3,
    pub center: Vec3,
    pub up: Vec3,
    pub fov_rad: f32,
    pub aspect_ratio: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(3.0, 1.0, 0.0),
            center: Vec3::ZERO,
            up: Vec3::Y,
            fov_rad: std::f32::consts::FRAC_PI_4,
            aspect_ratio: 1.0,
            z_near: 0.1,
            z_far: 10.0,
        }
    }
}

impl PerspectiveCamera {
    pub fn look_at(&mut self, eye: Vec3, center: Vec3, up: Vec3) {
        self.eye = eye;
        self.center = center;
        self.up = up;
    }

    /// Unit vector from the eye towards the target
    pub fn forward(&self) -> Vec3 {
        (self.center - self.eye).normalize_or_zero()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.center, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_rad, self.aspect_ratio, self.z_near, self.z_far)
    }
}
