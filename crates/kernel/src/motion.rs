use hopscene_common::Position;
use serde::{Deserialize, Serialize};

use crate::scene::CharacterSlot;

/// Shape of the hop cycle.
///
/// Height follows `baseline_y + sin(t * frequency) / amplitude_divisor`,
/// clamped so it never drops below `baseline_y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HopParams {
    /// Ground height. The character rests here between hops.
    pub baseline_y: f64,
    /// Angular frequency applied to elapsed seconds.
    pub frequency: f64,
    pub amplitude_divisor: f64,
    /// Airborne frames advance x by `height / drift_divisor`.
    pub drift_divisor: f64,
    /// x past `+wrap_bound` snaps back to `-wrap_bound`.
    pub wrap_bound: f64,
}

impl Default for HopParams {
    fn default() -> Self {
        Self {
            baseline_y: 0.3,
            frequency: 8.0,
            amplitude_divisor: 3.0,
            drift_divisor: 16.0,
            wrap_bound: 5.0,
        }
    }
}

impl HopParams {
    /// Length of one full hop cycle in seconds.
    pub fn period(&self) -> f64 {
        std::f64::consts::TAU / self.frequency
    }
}

/// Whether the character is resting or in the air on a given frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HopPhase {
    Grounded,
    Airborne,
}

/// Outcome of one motion update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionStep {
    pub phase: HopPhase,
    /// Clamped hop height applied to y.
    pub height: f64,
    /// x crossed the positive bound and was reset this frame.
    pub wrapped: bool,
}

/// Per-frame procedural hop driver.
///
/// Stateless apart from its parameters: the phase is recomputed from elapsed
/// time every frame, only the accumulated x drift is carried in the position.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionDriver {
    params: HopParams,
}

impl MotionDriver {
    pub fn new(params: HopParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &HopParams {
        &self.params
    }

    /// Hop height at `elapsed`, with the lower half of the sine wave cut off.
    pub fn hop_height(&self, elapsed: f64) -> f64 {
        let p = &self.params;
        let raw = p.baseline_y + (elapsed * p.frequency).sin() / p.amplitude_divisor;
        // f64::max also maps a NaN height to the baseline.
        raw.max(p.baseline_y)
    }

    /// Compute the next position from the previous one.
    pub fn step(&self, elapsed: f64, previous: Position) -> (Position, MotionStep) {
        let p = &self.params;
        let height = self.hop_height(elapsed);
        let mut next = previous;
        next.y = height as f32;

        let phase = if height > p.baseline_y {
            next.x += (height / p.drift_divisor) as f32;
            HopPhase::Airborne
        } else {
            HopPhase::Grounded
        };

        let wrapped = f64::from(next.x) > p.wrap_bound;
        if wrapped {
            next.x = -p.wrap_bound as f32;
        }

        (
            next,
            MotionStep {
                phase,
                height,
                wrapped,
            },
        )
    }

    /// Apply one frame of motion to the character, if it is present.
    ///
    /// Returns `None` and touches nothing while the slot is empty.
    pub fn update(&self, elapsed: f64, slot: &mut CharacterSlot) -> Option<MotionStep> {
        let character = slot.as_present_mut()?;
        let (next, step) = self.step(elapsed, character.transform.position);
        character.transform.position = next;
        if step.wrapped {
            tracing::debug!(elapsed, x = next.x, "character wrapped around");
        }
        Some(step)
    }
}
