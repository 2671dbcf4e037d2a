/// A camera-control gesture, already decoupled from the windowing backend.
///
/// The desktop app translates mouse events into these; the orbit controls
/// consume them. Deltas are in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlAction {
    /// Orbit around the target.
    Rotate { dx: f32, dy: f32 },
    /// Move eye and target together in the view plane.
    Pan { dx: f32, dy: f32 },
    /// Dolly toward (positive) or away from (negative) the target, in wheel notches.
    Zoom(f32),
}

impl ControlAction {
    /// True when the gesture would not move the camera.
    pub fn is_empty(&self) -> bool {
        match *self {
            Self::Rotate { dx, dy } | Self::Pan { dx, dy } => dx == 0.0 && dy == 0.0,
            Self::Zoom(notches) => notches == 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_deltas_are_empty() {
        assert!(ControlAction::Rotate { dx: 0.0, dy: 0.0 }.is_empty());
        assert!(ControlAction::Pan { dx: 0.0, dy: 0.0 }.is_empty());
        assert!(ControlAction::Zoom(0.0).is_empty());
    }

    #[test]
    fn nonzero_deltas_are_not_empty() {
        assert!(!ControlAction::Rotate { dx: 1.0, dy: 0.0 }.is_empty());
        assert!(!ControlAction::Pan { dx: 0.0, dy: -2.0 }.is_empty());
        assert!(!ControlAction::Zoom(-1.0).is_empty());
    }
}
