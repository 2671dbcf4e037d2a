use std::fmt::Write;

use hopscene_kernel::{CharacterSlot, Scene, SceneModel};

use crate::camera::OrbitCamera;

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer reads the scene and the camera and produces output. It never
/// writes to the scene.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given scene and camera.
    fn render(&self, scene: &Scene, camera: &OrbitCamera) -> Self::Output;
}

/// Headless renderer producing a readable description of the frame.
///
/// Used by the CLI and by tests of the render interface.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

fn describe_model(out: &mut String, label: &str, model: &SceneModel) {
    let p = model.transform.position;
    let size = model.bounds.size() * model.transform.scale;
    let _ = writeln!(
        out,
        "  {label} '{}': pos=({:.3}, {:.3}, {:.3}) size=({:.2}, {:.2}, {:.2})",
        model.name, p.x, p.y, p.z, size.x, size.y, size.z
    );
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &Scene, camera: &OrbitCamera) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Frame {} (t={:.3}s) ===",
            scene.frame(),
            scene.elapsed()
        );
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}",
            camera.eye.x,
            camera.eye.y,
            camera.eye.z,
            camera.target.x,
            camera.target.y,
            camera.target.z,
            camera.fov.to_degrees()
        );
        let env = scene.environment();
        let _ = writeln!(out, "Environment: exposure={:.2}", env.exposure);

        match scene.structure() {
            Some(model) => describe_model(&mut out, "structure", model),
            None => out.push_str("  structure: (loading)\n"),
        }
        match scene.character() {
            CharacterSlot::Present(model) => describe_model(&mut out, "character", model),
            CharacterSlot::Absent => out.push_str("  character: (absent)\n"),
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use hopscene_common::Transform;
    use hopscene_kernel::Environment;

    #[test]
    fn empty_scene_reports_missing_models() {
        let scene = Scene::new(Environment::default());
        let output = DebugTextRenderer::new().render(&scene, &OrbitCamera::default());

        assert!(output.contains("Frame 0"));
        assert!(output.contains("character: (absent)"));
        assert!(output.contains("structure: (loading)"));
        assert!(output.contains("fov=45"));
    }

    #[test]
    fn present_models_are_listed() {
        let mut scene = Scene::default();
        scene.place_structure(SceneModel {
            name: "bridge".into(),
            ..SceneModel::default()
        });
        scene.place_character(SceneModel {
            name: "frog".into(),
            transform: Transform {
                position: Vec3::new(1.0, 0.3, 0.2),
                ..Transform::default()
            },
            ..SceneModel::default()
        });

        let output = DebugTextRenderer::new().render(&scene, &OrbitCamera::default());
        assert!(output.contains("structure 'bridge'"));
        assert!(output.contains("character 'frog': pos=(1.000, 0.300, 0.200)"));
    }
}
