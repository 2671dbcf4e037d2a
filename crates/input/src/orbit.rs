use std::f32::consts::{PI, TAU};

use glam::Vec3;
use hopscene_kernel::ControlsConfig;
use hopscene_render::OrbitCamera;

use crate::action::ControlAction;

/// Movement below this (squared distance) does not count as a change.
const CHANGE_EPSILON: f32 = 1e-6;
/// Keeps the polar angle off the poles so `look_at` stays well defined.
const POLE_EPSILON: f32 = 1e-3;
/// Dolly factor for one wheel notch at zoom speed 1.
const ZOOM_STEP: f32 = 0.95;

/// Receives a notification whenever the orbit controls move the camera.
///
/// The frame loop subscribes one of these to trigger an out-of-band redraw.
pub trait ControlsListener {
    fn controls_changed(&mut self, camera: &OrbitCamera);
}

impl<F: FnMut(&OrbitCamera)> ControlsListener for F {
    fn controls_changed(&mut self, camera: &OrbitCamera) {
        self(camera)
    }
}

/// Handle returned by [`OrbitControls::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Orbit, dolly and pan a camera around its target.
///
/// Gestures accumulate as pending motion. [`OrbitControls::update`] applies
/// it to the camera once per frame; with damping enabled only a fraction is
/// applied each time, so the camera eases out after input stops.
pub struct OrbitControls {
    config: ControlsConfig,
    viewport_height: f32,
    /// Pending azimuth change in radians.
    theta_delta: f32,
    /// Pending polar change in radians.
    phi_delta: f32,
    /// Pending radius multiplier.
    scale: f32,
    pan_offset: Vec3,
    listeners: Vec<(SubscriptionId, Box<dyn ControlsListener>)>,
    next_subscription: u64,
}

impl OrbitControls {
    pub fn new(config: ControlsConfig) -> Self {
        Self {
            config,
            viewport_height: 1.0,
            theta_delta: 0.0,
            phi_delta: 0.0,
            scale: 1.0,
            pan_offset: Vec3::ZERO,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn config(&self) -> &ControlsConfig {
        &self.config
    }

    /// Pixel height of the viewport; rotation and pan are scaled against it.
    pub fn set_viewport_height(&mut self, height: u32) {
        self.viewport_height = height.max(1) as f32;
    }

    pub fn subscribe(&mut self, listener: Box<dyn ControlsListener>) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Remove a listener. Returns false if it was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Queue a gesture. Nothing moves until the next [`update`](Self::update).
    pub fn apply(&mut self, action: ControlAction, camera: &OrbitCamera) {
        if action.is_empty() {
            return;
        }
        match action {
            ControlAction::Rotate { dx, dy } => {
                let k = TAU * self.config.rotate_speed / self.viewport_height;
                self.theta_delta -= dx * k;
                self.phi_delta -= dy * k;
            }
            ControlAction::Zoom(notches) => {
                self.scale *= ZOOM_STEP.powf(self.config.zoom_speed * notches);
            }
            ControlAction::Pan { dx, dy } => {
                let forward = camera.forward();
                let right = forward.cross(Vec3::Y).normalize_or_zero();
                let up = right.cross(forward).normalize_or_zero();
                // World units covered by one pixel at the target's depth.
                let per_pixel =
                    2.0 * camera.distance() * (camera.fov * 0.5).tan() / self.viewport_height;
                let k = per_pixel * self.config.pan_speed;
                self.pan_offset += -right * dx * k + up * dy * k;
            }
        }
        tracing::trace!(?action, "control gesture queued");
    }

    /// True while queued motion has not been fully applied yet.
    pub fn is_settling(&self) -> bool {
        self.theta_delta.abs() > CHANGE_EPSILON
            || self.phi_delta.abs() > CHANGE_EPSILON
            || (self.scale - 1.0).abs() > CHANGE_EPSILON
            || self.pan_offset.length_squared() > CHANGE_EPSILON
    }

    /// Apply pending motion to the camera.
    ///
    /// Returns whether the camera moved; listeners are notified if it did.
    pub fn update(&mut self, camera: &mut OrbitCamera) -> bool {
        let before = (camera.eye, camera.target);
        let cfg = self.config;
        let step = if cfg.enable_damping {
            cfg.damping_factor
        } else {
            1.0
        };

        let offset = camera.eye - camera.target;
        let mut radius = offset.length();
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = if radius > 0.0 {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        };

        theta += self.theta_delta * step;
        phi = (phi + self.phi_delta * step).clamp(POLE_EPSILON, PI - POLE_EPSILON);
        radius = (radius * self.scale).clamp(cfg.min_distance, cfg.max_distance);

        camera.target += self.pan_offset * step;
        let sin_phi = phi.sin();
        let new_offset = Vec3::new(
            radius * sin_phi * theta.sin(),
            radius * phi.cos(),
            radius * sin_phi * theta.cos(),
        );
        camera.eye = camera.target + new_offset;

        if cfg.enable_damping {
            let keep = 1.0 - cfg.damping_factor;
            self.theta_delta *= keep;
            self.phi_delta *= keep;
            self.pan_offset *= keep;
        } else {
            self.theta_delta = 0.0;
            self.phi_delta = 0.0;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        let changed = before.0.distance_squared(camera.eye) > CHANGE_EPSILON
            || before.1.distance_squared(camera.target) > CHANGE_EPSILON;
        if changed {
            for (_, listener) in &mut self.listeners {
                listener.controls_changed(camera);
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn undamped() -> ControlsConfig {
        ControlsConfig {
            enable_damping: false,
            ..ControlsConfig::default()
        }
    }

    fn controls(config: ControlsConfig) -> OrbitControls {
        let mut c = OrbitControls::new(config);
        c.set_viewport_height(720);
        c
    }

    #[test]
    fn idle_update_does_not_change_camera() {
        let mut cam = OrbitCamera::default();
        let mut ctl = controls(undamped());
        assert!(!ctl.update(&mut cam));
        assert!(cam.eye.abs_diff_eq(OrbitCamera::default().eye, 1e-4));
    }

    #[test]
    fn rotate_keeps_distance() {
        let mut cam = OrbitCamera::default();
        let start = cam.distance();
        let mut ctl = controls(undamped());
        ctl.apply(ControlAction::Rotate { dx: 120.0, dy: 30.0 }, &cam);
        assert!(ctl.update(&mut cam));
        assert!((cam.distance() - start).abs() < 1e-4);
        assert_ne!(cam.eye, OrbitCamera::default().eye);
    }

    #[test]
    fn full_viewport_drag_is_full_turn() {
        let mut cam = OrbitCamera::default();
        let start = cam.eye;
        let mut ctl = controls(undamped());
        ctl.apply(ControlAction::Rotate { dx: 720.0, dy: 0.0 }, &cam);
        ctl.update(&mut cam);
        assert!(cam.eye.abs_diff_eq(start, 1e-3));
    }

    #[test]
    fn zoom_respects_distance_limits() {
        let mut cam = OrbitCamera::default();
        let mut ctl = controls(undamped());
        ctl.apply(ControlAction::Zoom(200.0), &cam);
        ctl.update(&mut cam);
        assert!((cam.distance() - 2.0).abs() < 1e-4);

        ctl.apply(ControlAction::Zoom(-200.0), &cam);
        ctl.update(&mut cam);
        assert!((cam.distance() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn zoom_in_moves_closer() {
        let mut cam = OrbitCamera::default();
        let start = cam.distance();
        let mut ctl = controls(undamped());
        ctl.apply(ControlAction::Zoom(1.0), &cam);
        ctl.update(&mut cam);
        assert!((cam.distance() - start * 0.95).abs() < 1e-4);
    }

    #[test]
    fn polar_angle_stays_off_the_pole() {
        let mut cam = OrbitCamera::default();
        let mut ctl = controls(undamped());
        ctl.apply(ControlAction::Rotate { dx: 0.0, dy: 5_000.0 }, &cam);
        ctl.update(&mut cam);
        let offset = cam.eye - cam.target;
        assert!(offset.is_finite());
        let horizontal = glam::Vec2::new(offset.x, offset.z).length();
        assert!(horizontal > 0.0);
        assert!(cam.view_matrix().is_finite());
    }

    #[test]
    fn pan_moves_target_and_eye_together() {
        let mut cam = OrbitCamera::default();
        let start_offset = cam.eye - cam.target;
        let mut ctl = controls(undamped());
        ctl.apply(ControlAction::Pan { dx: 100.0, dy: 0.0 }, &cam);
        assert!(ctl.update(&mut cam));
        assert!(cam.target.x < 0.0);
        assert!((cam.eye - cam.target).abs_diff_eq(start_offset, 1e-3));
    }

    #[test]
    fn damping_eases_out_over_several_updates() {
        let mut cam = OrbitCamera::default();
        let mut ctl = controls(ControlsConfig::default());
        ctl.apply(ControlAction::Rotate { dx: 200.0, dy: 0.0 }, &cam);

        let mut moving_updates = 0;
        for _ in 0..10 {
            if ctl.update(&mut cam) {
                moving_updates += 1;
            }
        }
        assert_eq!(moving_updates, 10);
        assert!(ctl.is_settling());
    }

    #[test]
    fn undamped_motion_settles_at_once() {
        let mut cam = OrbitCamera::default();
        let mut ctl = controls(undamped());
        ctl.apply(ControlAction::Rotate { dx: 50.0, dy: 0.0 }, &cam);
        assert!(ctl.update(&mut cam));
        assert!(!ctl.is_settling());
        assert!(!ctl.update(&mut cam));
    }

    #[test]
    fn listeners_hear_about_changes_only() {
        let hits = Rc::new(Cell::new(0));
        let seen = hits.clone();

        let mut cam = OrbitCamera::default();
        let mut ctl = controls(undamped());
        ctl.subscribe(Box::new(move |_: &OrbitCamera| seen.set(seen.get() + 1)));

        ctl.update(&mut cam);
        assert_eq!(hits.get(), 0);

        ctl.apply(ControlAction::Zoom(1.0), &cam);
        ctl.update(&mut cam);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn unsubscribed_listener_is_silent() {
        let hits = Rc::new(Cell::new(0));
        let seen = hits.clone();

        let mut cam = OrbitCamera::default();
        let mut ctl = controls(undamped());
        let id = ctl.subscribe(Box::new(move |_: &OrbitCamera| seen.set(seen.get() + 1)));
        assert!(ctl.unsubscribe(id));
        assert!(!ctl.unsubscribe(id));

        ctl.apply(ControlAction::Zoom(1.0), &cam);
        ctl.update(&mut cam);
        assert_eq!(hits.get(), 0);
    }
}
