//! Developer tooling: scene inspector shared by the desktop overlay and the CLI.
//!
//! # Invariants
//! - Tools only read the scene.

mod inspector;

pub use inspector::{SceneInspector, SceneSummary};
