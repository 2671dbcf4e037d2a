use std::fmt;

use hopscene_common::Position;
use hopscene_kernel::{FrameStep, HopPhase, MotionDriver, Scene, SceneEvent};

/// Read-only view of the scene for overlays and headless runs.
///
/// Counters are fed from frame steps and drained scene events; the inspector
/// never writes to the scene.
#[derive(Debug, Default, Clone)]
pub struct SceneInspector {
    wraps: u64,
    hops: u64,
    last_phase: Option<HopPhase>,
}

/// Snapshot of the scene for display.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSummary {
    pub frame: u64,
    pub elapsed: f64,
    pub character: Option<Position>,
    pub phase: Option<HopPhase>,
    pub structure_loaded: bool,
    pub hops: u64,
    pub wraps: u64,
}

impl SceneInspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one frame. A hop starts on every grounded-to-airborne edge.
    pub fn observe(&mut self, step: &FrameStep) {
        let Some(motion) = step.motion else {
            return;
        };
        if motion.phase == HopPhase::Airborne && self.last_phase != Some(HopPhase::Airborne) {
            self.hops += 1;
        }
        self.last_phase = Some(motion.phase);
    }

    /// Account for drained scene events.
    pub fn observe_events(&mut self, events: &[SceneEvent]) {
        for event in events {
            match event {
                SceneEvent::Wrapped { frame, elapsed } => {
                    self.wraps += 1;
                    tracing::debug!(frame, elapsed, total = self.wraps, "wrap observed");
                }
                SceneEvent::CharacterPlaced { .. } => self.last_phase = None,
                SceneEvent::EnvironmentSet(_) | SceneEvent::StructurePlaced { .. } => {}
            }
        }
    }

    pub fn summary(&self, scene: &Scene, driver: &MotionDriver) -> SceneSummary {
        let character = scene.character().position();
        let phase = character.map(|_| {
            if driver.hop_height(scene.elapsed()) > driver.params().baseline_y {
                HopPhase::Airborne
            } else {
                HopPhase::Grounded
            }
        });
        SceneSummary {
            frame: scene.frame(),
            elapsed: scene.elapsed(),
            character,
            phase,
            structure_loaded: scene.structure().is_some(),
            hops: self.hops,
            wraps: self.wraps,
        }
    }
}

impl fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame={} t={:.3}s", self.frame, self.elapsed)?;
        match (self.character, self.phase) {
            (Some(p), Some(phase)) => write!(
                f,
                " character=({:.3}, {:.3}, {:.3}) {:?}",
                p.x, p.y, p.z, phase
            )?,
            _ => write!(f, " character=absent")?,
        }
        write!(f, " hops={} wraps={}", self.hops, self.wraps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use hopscene_common::Transform;
    use hopscene_kernel::{ManualClock, SceneModel};

    fn scene_with_character(x: f32) -> Scene {
        let mut scene = Scene::default();
        scene.place_character(SceneModel {
            name: "frog".into(),
            transform: Transform {
                position: Vec3::new(x, 0.3, 0.2),
                ..Transform::default()
            },
            ..SceneModel::default()
        });
        scene
    }

    #[test]
    fn summary_of_empty_scene() {
        let scene = Scene::default();
        let s = SceneInspector::new().summary(&scene, &MotionDriver::default());
        assert_eq!(s.frame, 0);
        assert!(s.character.is_none());
        assert!(s.phase.is_none());
        assert!(!s.structure_loaded);
        assert!(s.to_string().contains("character=absent"));
    }

    #[test]
    fn counts_hops_over_one_second() {
        let mut scene = scene_with_character(-4.0);
        let mut inspector = SceneInspector::new();
        inspector.observe_events(&scene.drain_events());
        let clock = ManualClock::new();
        let driver = MotionDriver::default();

        for _ in 0..60 {
            clock.advance(1.0 / 60.0);
            let step = scene.advance(&clock, &driver);
            inspector.observe(&step);
        }
        // One hop cycle lasts pi/4 s, so one second holds two hop starts.
        assert_eq!(inspector.summary(&scene, &driver).hops, 2);
    }

    #[test]
    fn counts_wraps_from_events() {
        let mut scene = scene_with_character(4.99);
        let mut inspector = SceneInspector::new();
        let clock = ManualClock::new();
        clock.advance_to(std::f64::consts::PI / 16.0);
        let driver = MotionDriver::default();

        let step = scene.advance(&clock, &driver);
        inspector.observe(&step);
        inspector.observe_events(&scene.drain_events());

        let s = inspector.summary(&scene, &driver);
        assert_eq!(s.wraps, 1);
        assert_eq!(s.phase, Some(HopPhase::Airborne));
        assert_eq!(s.character.unwrap().x, -5.0);
        assert!(s.to_string().contains("wraps=1"));
    }
}
