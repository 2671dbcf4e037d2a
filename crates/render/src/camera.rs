use glam::{Mat4, Vec3};
use hopscene_kernel::CameraConfig;

/// Perspective camera looking from `eye` at `target`.
///
/// Orbit controls move `eye` and `target`; window resizes change `aspect`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub eye: Vec3,
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default(), 16.0 / 9.0)
    }
}

impl OrbitCamera {
    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            eye: config.eye,
            target: config.target,
            fov: config.fov_degrees.to_radians(),
            aspect,
            near: config.near,
            far: config.far,
        }
    }

    /// Update the aspect ratio after a viewport resize. Zero-sized viewports
    /// (minimised windows) keep the previous ratio.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn distance(&self) -> f32 {
        self.eye.distance(self.target)
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye).normalize_or_zero()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_matches_scene_setup() {
        let cam = OrbitCamera::default();
        assert_eq!(cam.eye, Vec3::new(0.0, 4.0, 8.7));
        assert_eq!(cam.target, Vec3::ZERO);
        assert!((cam.fov - 45.0_f32.to_radians()).abs() < 1e-6);
        assert_eq!(cam.near, 0.25);
        assert_eq!(cam.far, 20.0);
    }

    #[test]
    fn view_projection_is_finite() {
        let vp = OrbitCamera::default().view_projection();
        assert!(vp.is_finite());
    }

    #[test]
    fn target_projects_to_screen_centre() {
        let cam = OrbitCamera::default();
        let clip = cam.view_projection() * cam.target.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
    }

    #[test]
    fn resize_updates_aspect() {
        let mut cam = OrbitCamera::default();
        cam.resize(800, 400);
        assert_eq!(cam.aspect, 2.0);
        cam.resize(0, 400);
        assert_eq!(cam.aspect, 2.0);
    }
}
