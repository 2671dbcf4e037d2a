//! Scene kernel: clock sources, procedural hop motion, scene state, config.
//!
//! # Invariants
//! - Each frame reads the clock before moving the character, and the caller
//!   renders only after the move.
//! - The motion driver is the only writer of the character position.
//! - While the character is absent, frame updates leave the scene untouched
//!   apart from the frame counter.

pub mod clock;
pub mod config;
pub mod motion;
pub mod scene;

pub use clock::{ClockSource, ManualClock, SystemClock};
pub use config::{CameraConfig, ConfigError, ControlsConfig, ModelPlacement, SceneConfig};
pub use motion::{HopParams, HopPhase, MotionDriver, MotionStep};
pub use scene::{
    CharacterSlot, CharacterState, Environment, FrameStep, Scene, SceneEvent, SceneModel,
};
