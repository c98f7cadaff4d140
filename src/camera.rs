use glam::{Mat4, Vec3};

use crate::config::CameraConfig;
use crate::render::CameraParams;

const MIN_DISTANCE: f32 = 0.5;
const MAX_DISTANCE: f32 = 200.0;
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Perspective camera orbiting a target point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub position: Vec3,
    pub target: Vec3,
    fov: f32,
    near: f32,
    far: f32,
}

impl OrbitCamera {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            position: config.home,
            target: Vec3::ZERO,
            fov: config.fov,
            near: config.near,
            far: config.far,
        }
    }

    pub fn reset(&mut self, position: Vec3, target: Vec3) {
        self.position = position;
        self.target = target;
    }

    /// Rotates the camera around the target by the given yaw/pitch deltas (radians).
    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        let (yaw, pitch, distance) = self.spherical();
        let pitch = (pitch + delta_pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.set_spherical(yaw + delta_yaw, pitch, distance);
    }

    /// Scales the distance to the target; factors below one move closer.
    pub fn zoom(&mut self, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let (yaw, pitch, distance) = self.spherical();
        self.set_spherical(yaw, pitch, (distance * factor).clamp(MIN_DISTANCE, MAX_DISTANCE));
    }

    pub fn params(&self, aspect: f32) -> CameraParams {
        let view = Mat4::look_at_rh(self.position, self.target, Vec3::Y);
        let projection =
            Mat4::perspective_rh(self.fov.to_radians(), aspect.max(0.01), self.near, self.far);
        CameraParams {
            view_proj: projection * view,
            position: self.position,
        }
    }

    fn spherical(&self) -> (f32, f32, f32) {
        let offset = self.position - self.target;
        let distance = offset.length().max(MIN_DISTANCE);
        let yaw = offset.x.atan2(offset.z);
        let pitch = (offset.y / distance).clamp(-1.0, 1.0).asin();
        (yaw, pitch, distance)
    }

    fn set_spherical(&mut self, yaw: f32, pitch: f32, distance: f32) {
        let (sy, cy) = yaw.sin_cos();
        let (sp, cp) = pitch.sin_cos();
        let offset = Vec3::new(distance * cp * sy, distance * sp, distance * cp * cy);
        self.position = self.target + offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> OrbitCamera {
        OrbitCamera::new(&CameraConfig::default())
    }

    #[test]
    fn orbit_keeps_distance_to_target() {
        let mut camera = camera();
        let before = camera.position.distance(camera.target);
        camera.orbit(0.7, 0.3);
        let after = camera.position.distance(camera.target);
        assert!((before - after).abs() < 1e-4);
        assert_ne!(camera.position, CameraConfig::default().home);
    }

    #[test]
    fn pitch_is_clamped_below_the_pole() {
        let mut camera = camera();
        camera.orbit(0.0, 10.0);
        let offset = camera.position - camera.target;
        assert!(offset.x.abs() > 0.0 || offset.z.abs() > 0.0);
    }

    #[test]
    fn zoom_respects_limits() {
        let mut camera = camera();
        camera.zoom(0.0001);
        assert!((camera.position.distance(camera.target) - MIN_DISTANCE).abs() < 1e-4);
        camera.zoom(f32::NAN);
        assert!((camera.position.distance(camera.target) - MIN_DISTANCE).abs() < 1e-4);
    }

    #[test]
    fn reset_restores_position_and_target() {
        let mut camera = camera();
        camera.orbit(1.0, 0.2);
        camera.reset(Vec3::new(0.0, 2.0, 5.0), Vec3::new(0.0, 0.9, 0.0));
        assert_eq!(camera.position, Vec3::new(0.0, 2.0, 5.0));
        assert_eq!(camera.target, Vec3::new(0.0, 0.9, 0.0));
    }
}
