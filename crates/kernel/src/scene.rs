use hopscene_common::{Aabb, Position, Surface, Transform};
use serde::{Deserialize, Serialize};

use crate::clock::ClockSource;
use crate::motion::{MotionDriver, MotionStep};

/// A drawable model placed in the scene: where it is, how big its mesh is,
/// and how its surface is shaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneModel {
    pub name: String,
    pub transform: Transform,
    /// Mesh bounds in model space, before `transform` is applied.
    pub bounds: Aabb,
    pub surface: Surface,
}

impl Default for SceneModel {
    fn default() -> Self {
        Self {
            name: "unnamed".into(),
            transform: Transform::default(),
            bounds: Aabb::default(),
            surface: Surface::default(),
        }
    }
}

/// The animated character. Its position is written only by the motion driver.
pub type CharacterState = SceneModel;

/// Presence of the character, which arrives asynchronously from the loader.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CharacterSlot {
    #[default]
    Absent,
    Present(CharacterState),
}

impl CharacterSlot {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn as_present(&self) -> Option<&CharacterState> {
        match self {
            Self::Present(c) => Some(c),
            Self::Absent => None,
        }
    }

    pub(crate) fn as_present_mut(&mut self) -> Option<&mut CharacterState> {
        match self {
            Self::Present(c) => Some(c),
            Self::Absent => None,
        }
    }

    /// Current character position, if the character has arrived.
    pub fn position(&self) -> Option<Position> {
        self.as_present().map(|c| c.transform.position)
    }
}

/// Background and global lighting settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Environment {
    /// Linear RGBA clear colour drawn behind everything.
    pub background: [f32; 4],
    /// Ambient light intensity contributed by the environment.
    pub ambient: f32,
    /// Exposure applied before filmic tone mapping.
    pub exposure: f32,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            background: [0.32, 0.38, 0.46, 1.0],
            ambient: 0.35,
            exposure: 1.0,
        }
    }
}

/// Record of every change made to the scene outside the per-frame motion.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    EnvironmentSet(Environment),
    StructurePlaced { name: String },
    CharacterPlaced { name: String, position: Position },
    /// The character crossed the positive bound on this frame.
    Wrapped { frame: u64, elapsed: f64 },
}

/// Result of advancing the scene by one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStep {
    pub frame: u64,
    pub elapsed: f64,
    /// `None` while the character has not arrived yet.
    pub motion: Option<MotionStep>,
}

/// Everything the renderer draws: environment, static structure, character.
///
/// The frame loop is the only writer. Renderers and tools take `&Scene`.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    environment: Environment,
    structure: Option<SceneModel>,
    character: CharacterSlot,
    frame: u64,
    elapsed: f64,
    events: Vec<SceneEvent>,
}

impl Scene {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            ..Default::default()
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn set_environment(&mut self, environment: Environment) {
        self.environment = environment;
        self.events.push(SceneEvent::EnvironmentSet(environment));
    }

    pub fn structure(&self) -> Option<&SceneModel> {
        self.structure.as_ref()
    }

    /// Add or replace the static structural model.
    pub fn place_structure(&mut self, model: SceneModel) {
        tracing::info!(name = %model.name, "structure placed");
        self.events.push(SceneEvent::StructurePlaced {
            name: model.name.clone(),
        });
        self.structure = Some(model);
    }

    pub fn character(&self) -> &CharacterSlot {
        &self.character
    }

    /// Make the character present. A second delivery replaces the first.
    pub fn place_character(&mut self, character: CharacterState) {
        tracing::info!(
            name = %character.name,
            x = character.transform.position.x,
            y = character.transform.position.y,
            z = character.transform.position.z,
            "character placed"
        );
        self.events.push(SceneEvent::CharacterPlaced {
            name: character.name.clone(),
            position: character.transform.position,
        });
        self.character = CharacterSlot::Present(character);
    }

    /// Number of frames advanced so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Clock reading taken on the most recent frame.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn events(&self) -> &[SceneEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advance one frame: read the clock, then move the character.
    ///
    /// Rendering must happen after this returns so the frame shows the
    /// position computed here.
    pub fn advance(&mut self, clock: &impl ClockSource, driver: &MotionDriver) -> FrameStep {
        let _span = tracing::trace_span!("scene_advance", frame = self.frame + 1).entered();
        let elapsed = clock.elapsed();
        self.frame += 1;
        self.elapsed = elapsed;

        let motion = driver.update(elapsed, &mut self.character);
        if let Some(step) = motion {
            if step.wrapped {
                self.events.push(SceneEvent::Wrapped {
                    frame: self.frame,
                    elapsed,
                });
            }
            tracing::trace!(phase = ?step.phase, height = step.height, "motion step");
        }

        FrameStep {
            frame: self.frame,
            elapsed,
            motion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::motion::HopPhase;
    use glam::Vec3;
    use std::f64::consts::PI;

    fn frog() -> CharacterState {
        CharacterState {
            name: "frog".into(),
            transform: Transform {
                position: Vec3::new(1.0, 0.3, 0.2),
                ..Transform::default()
            },
            ..CharacterState::default()
        }
    }

    #[test]
    fn scene_starts_without_models() {
        let scene = Scene::new(Environment::default());
        assert!(scene.character().is_absent());
        assert!(scene.structure().is_none());
        assert_eq!(scene.frame(), 0);
        assert_eq!(scene.elapsed(), 0.0);
    }

    #[test]
    fn advance_without_character_only_counts_frames() {
        let mut scene = Scene::default();
        let clock = ManualClock::new();
        let driver = MotionDriver::default();
        for _ in 0..10 {
            clock.advance(1.0 / 60.0);
            let step = scene.advance(&clock, &driver);
            assert!(step.motion.is_none());
        }
        assert_eq!(scene.frame(), 10);
        assert!(scene.character().is_absent());
        assert!(scene.events().is_empty());
    }

    #[test]
    fn advance_uses_current_clock_reading() {
        let mut scene = Scene::default();
        scene.place_character(frog());
        let clock = ManualClock::new();
        clock.advance_to(PI / 16.0);
        let step = scene.advance(&clock, &MotionDriver::default());
        assert_eq!(step.elapsed, PI / 16.0);
        assert_eq!(step.motion.unwrap().phase, HopPhase::Airborne);
        let pos = scene.character().position().unwrap();
        assert!((pos.y - 0.633_333).abs() < 1e-5);
    }

    #[test]
    fn character_arriving_mid_run_starts_moving() {
        let mut scene = Scene::default();
        let clock = ManualClock::new();
        let driver = MotionDriver::default();
        for _ in 0..5 {
            clock.advance(0.05);
            scene.advance(&clock, &driver);
        }
        scene.place_character(frog());
        clock.advance_to(PI / 16.0);
        let step = scene.advance(&clock, &driver);
        assert!(step.motion.is_some());
        assert_eq!(step.frame, 6);
    }

    #[test]
    fn wraparound_is_recorded() {
        let mut scene = Scene::default();
        let mut c = frog();
        c.transform.position.x = 4.99;
        scene.place_character(c);
        scene.drain_events();

        let clock = ManualClock::new();
        clock.advance_to(PI / 16.0);
        scene.advance(&clock, &MotionDriver::default());

        assert_eq!(scene.character().position().unwrap().x, -5.0);
        assert!(matches!(
            scene.events(),
            [SceneEvent::Wrapped { frame: 1, .. }]
        ));
    }

    #[test]
    fn placement_events_are_logged() {
        let mut scene = Scene::default();
        scene.set_environment(Environment::default());
        scene.place_structure(SceneModel {
            name: "bridge".into(),
            ..SceneModel::default()
        });
        scene.place_character(frog());
        let events = scene.drain_events();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[1], SceneEvent::StructurePlaced { .. }));
        assert!(scene.events().is_empty());
    }

    #[test]
    fn replacing_character_keeps_single_slot() {
        let mut scene = Scene::default();
        scene.place_character(frog());
        let mut other = frog();
        other.name = "toad".into();
        scene.place_character(other);
        assert_eq!(scene.character().as_present().unwrap().name, "toad");
    }
}
