use std::f32::consts::TAU;

use glam::Vec3;

/// Number of components in a GQN viewpoint vector
pub const VIEWPOINT_SIZE: usize = 7;

pub type Viewpoint = [f32; VIEWPOINT_SIZE];

/// Heading of the horizontal look direction, measured from +Z in [0, 2π)
pub fn yaw(eye: Vec3, center: Vec3) -> f32 {
    let direction_x = center.x - eye.x;
    let direction_z = center.z - eye.z;
    let norm = (direction_x * direction_x + direction_z * direction_z).sqrt();
    if norm == 0.0 {
        return 0.0;
    }

    let rad = (direction_z / norm).clamp(-1.0, 1.0).acos();
    if direction_x < 0.0 { TAU - rad } else { rad }
}

/// Elevation of the look direction above the horizontal plane
pub fn pitch(eye: Vec3, center: Vec3) -> f32 {
    let direction = center - eye;
    let horizontal = (direction.x * direction.x + direction.z * direction.z).sqrt();
    (direction.y / (horizontal + 1e-16)).atan()
}

/// Viewpoint vector fed to the generator for a camera at `eye` looking at `center`.
///
/// The orientation terms repeat `cos(yaw)` and `sin(pitch)` rather than pairing
/// them with `sin(yaw)` / `cos(pitch)`; trained snapshots expect this layout.
pub fn query_viewpoint(eye: Vec3, center: Vec3) -> Viewpoint {
    let yaw = yaw(eye, center);
    let pitch = pitch(eye, center);
    [
        eye.x,
        eye.y,
        eye.z,
        yaw.cos(),
        yaw.cos(),
        pitch.sin(),
        pitch.sin(),
    ]
}

/// Circular camera sweep around the scene
#[derive(Clone, Debug)]
pub struct OrbitPath {
    pub radius: f32,
    pub height: f32,
    pub center: Vec3,
    pub up: Vec3,
    pub total_frames: usize,
}

impl Default for OrbitPath {
    fn default() -> Self {
        Self {
            radius: 3.0,
            height: 1.0,
            center: Vec3::new(0.0, 0.5, 0.0),
            up: Vec3::Y,
            total_frames: 100,
        }
    }
}

/// One step of an [`OrbitPath`]
#[derive(Clone, Debug, PartialEq)]
pub struct OrbitFrame {
    pub tick: usize,
    pub azimuth: f32,
    pub eye: Vec3,
    pub query: Viewpoint,
}

impl OrbitPath {
    pub fn azimuth(&self, tick: usize) -> f32 {
        TAU * tick as f32 / self.total_frames as f32
    }

    pub fn eye(&self, tick: usize) -> Vec3 {
        let azimuth = self.azimuth(tick);
        Vec3::new(
            self.radius * azimuth.cos(),
            self.height,
            self.radius * azimuth.sin(),
        )
    }

    pub fn frame(&self, tick: usize) -> OrbitFrame {
        let eye = self.eye(tick);
        OrbitFrame {
            tick,
            azimuth: self.azimuth(tick),
            eye,
            query: query_viewpoint(eye, self.center),
        }
    }

    pub fn frames(&self) -> impl Iterator<Item = OrbitFrame> + '_ {
        (0..self.total_frames).map(|tick| self.frame(tick))
    }
}
