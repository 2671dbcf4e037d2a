//! Camera controls: orbit gestures mapped onto the scene camera.
//!
//! # Invariants
//! - Controls only ever touch the camera, never the scene.
//! - Listeners hear about a change only when the camera actually moved.

pub mod action;
pub mod orbit;

pub use action::ControlAction;
pub use orbit::{ControlsListener, OrbitControls, SubscriptionId};
