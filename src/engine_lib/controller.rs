// src/engine_lib/controller.rs

use glam::{Vec2, Vec3};
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

use crate::config::OrbitConfig;
use crate::engine_lib::camera::PerspectiveCamera;

const POLAR_EPSILON: f32 = 1e-6;

/// Drag-to-rotate, wheel-to-zoom camera orbit around `camera.target`.
/// Input accumulates into a pending delta; `update` applies a damped share of it
/// each frame.
pub struct OrbitControls {
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,

    // x: azimuth (theta), y: polar (phi)
    spherical_delta: Vec2,
    scale: f32,

    dragging: bool,
    last_cursor: Option<PhysicalPosition<f64>>,
    enabled: bool,
}

impl OrbitControls {
    pub fn new(config: &OrbitConfig) -> Self {
        Self {
            damping_factor: config.damping_factor,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
            spherical_delta: Vec2::ZERO,
            scale: 1.0,
            dragging: false,
            last_cursor: None,
            enabled: true,
        }
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.spherical_delta.x -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.spherical_delta.y -= angle;
    }

    fn zoom_scale(&self) -> f32 {
        0.95_f32.powf(self.zoom_speed)
    }

    pub fn dolly_in(&mut self) {
        self.scale *= self.zoom_scale();
    }

    pub fn dolly_out(&mut self) {
        self.scale /= self.zoom_scale();
    }

    /// Returns true when the event drove the camera.
    pub fn handle_window_event(&mut self, event: &WindowEvent, viewport_height: f32) -> bool {
        if !self.enabled {
            return false;
        }
        match event {
            WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => {
                self.dragging = *state == ElementState::Pressed;
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                let previous = self.last_cursor.replace(*position);
                match previous {
                    Some(prev) if self.dragging => {
                        let height = viewport_height.max(1.0);
                        let dx = (position.x - prev.x) as f32;
                        let dy = (position.y - prev.y) as f32;
                        self.rotate_left(std::f32::consts::TAU * dx / height * self.rotate_speed);
                        self.rotate_up(std::f32::consts::TAU * dy / height * self.rotate_speed);
                        true
                    }
                    _ => false,
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.last_cursor = None;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
                };
                if scroll > 0.0 {
                    self.dolly_in();
                } else if scroll < 0.0 {
                    self.dolly_out();
                }
                scroll != 0.0
            }
            _ => false,
        }
    }

    /// Applies one damped step of the pending orbit to the camera.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) {
        if !self.enabled {
            return;
        }
        let offset = camera.position - camera.target;
        let mut radius = offset.length();
        if radius <= f32::EPSILON {
            return;
        }
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        theta += self.spherical_delta.x * self.damping_factor;
        phi += self.spherical_delta.y * self.damping_factor;
        phi = phi.clamp(POLAR_EPSILON, std::f32::consts::PI - POLAR_EPSILON);

        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.scale = 1.0;

        let sin_phi = phi.sin();
        camera.position = camera.target
            + Vec3::new(
                radius * sin_phi * theta.sin(),
                radius * phi.cos(),
                radius * sin_phi * theta.cos(),
            );

        self.spherical_delta *= 1.0 - self.damping_factor;
    }

    /// Stops reacting to input and drops pending motion. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        self.dragging = false;
        self.last_cursor = None;
        self.spherical_delta = Vec2::ZERO;
        self.scale = 1.0;
        log::debug!("Orbit controls disposed");
    }
}
