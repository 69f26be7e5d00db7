// src/engine_lib/camera.rs

use glam::{Mat4, Vec3};

use crate::config::CameraConfig;

#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    pub fov_y_rad: f32,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl PerspectiveCamera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            fov_y_rad: config.fov_y_deg.to_radians(),
            aspect,
            znear: config.znear,
            zfar: config.zfar,
            position: config.position,
            target: config.target,
        }
    }

    /// Callers filter out zero-area sizes.
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    // Depth maps to [0, 1] as wgpu expects.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_rad, self.aspect, self.znear, self.zfar)
    }

    // The projection is rebuilt from `aspect` on every call, so a resize is
    // picked up by the very next frame.
    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn distance_to_target(&self) -> f32 {
        self.position.distance(self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn aspect_follows_resize() {
        let mut camera = PerspectiveCamera::new(&CameraConfig::default(), 1.0);
        camera.set_aspect(1920, 1080);
        assert_eq!(camera.aspect, 1920.0 / 1080.0);
        let p = camera.projection_matrix();
        assert!((p.y_axis.y / p.x_axis.x - 1920.0 / 1080.0).abs() < 1e-5);
    }

    #[test]
    fn target_projects_to_screen_center() {
        let camera = PerspectiveCamera::new(&CameraConfig::default(), 16.0 / 9.0);
        let clip = camera.view_proj() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }
}
