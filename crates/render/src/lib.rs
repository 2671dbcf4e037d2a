//! Rendering adapter: renderer-agnostic interface and the orbit camera.
//!
//! # Invariants
//! - Renderers never mutate the scene.
//! - What is drawn derives only from the scene and the camera.

mod camera;
mod renderer;

pub use camera::OrbitCamera;
pub use renderer::{DebugTextRenderer, Renderer};
