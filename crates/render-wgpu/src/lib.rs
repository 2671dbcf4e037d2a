//! wgpu render backend for the hop scene.
//!
//! Clears to the environment background and draws each loaded model as a lit
//! proxy box sized from its mesh bounds, shaded with its surface parameters.
//!
//! # Invariants
//! - Rendering never mutates the scene.
//! - Render reads the character position only after the frame's motion update.

mod gpu;
mod shaders;

pub use gpu::WgpuRenderer;
