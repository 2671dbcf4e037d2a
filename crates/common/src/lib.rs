//! Shared value types used across the hopscene crates.

mod types;

pub use types::{Aabb, Position, Surface, Transform};
