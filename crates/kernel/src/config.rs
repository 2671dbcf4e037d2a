use std::path::{Path, PathBuf};

use glam::Vec3;
use hopscene_common::{Surface, Transform};
use serde::{Deserialize, Serialize};

use crate::motion::HopParams;
use crate::scene::Environment;

/// Errors from loading or validating a [`SceneConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Perspective camera placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub eye: Vec3,
    pub target: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            near: 0.25,
            far: 20.0,
            eye: Vec3::new(0.0, 4.0, 8.7),
            target: Vec3::ZERO,
        }
    }
}

/// Orbit control limits and feel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub min_distance: f32,
    pub max_distance: f32,
    pub enable_damping: bool,
    /// Fraction of the pending motion applied per update when damping.
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            min_distance: 2.0,
            max_distance: 10.0,
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
        }
    }
}

/// Where a loaded model goes and how it is shaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelPlacement {
    pub asset: PathBuf,
    pub position: Vec3,
    /// XYZ Euler angles in radians.
    pub rotation: Vec3,
    pub scale: f32,
    /// Overrides the material found in the asset.
    pub surface: Option<Surface>,
}

impl ModelPlacement {
    pub fn transform(&self) -> Transform {
        Transform::from_placement(self.position, self.rotation, self.scale)
    }
}

impl Default for ModelPlacement {
    fn default() -> Self {
        Self {
            asset: PathBuf::new(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: 1.0,
            surface: None,
        }
    }
}

fn default_character() -> ModelPlacement {
    ModelPlacement {
        asset: PathBuf::from("assets/scene.glb"),
        position: Vec3::new(1.0, 0.3, 0.2),
        rotation: Vec3::new(-1.53, 0.0, 1.53),
        scale: 0.005,
        surface: Some(Surface::from_hex(0x1daa21, 0.9, 0.1)),
    }
}

fn default_structure() -> ModelPlacement {
    ModelPlacement {
        asset: PathBuf::from("assets/face.glb"),
        ..ModelPlacement::default()
    }
}

/// Top-level viewer configuration. Every field has a default, so `{}` is a
/// complete config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub hop: HopParams,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub environment: Environment,
    pub character: ModelPlacement,
    pub structure: ModelPlacement,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            hop: HopParams::default(),
            camera: CameraConfig::default(),
            controls: ControlsConfig::default(),
            environment: Environment::default(),
            character: default_character(),
            structure: default_structure(),
        }
    }
}

impl SceneConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&data)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Load from `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let hop = &self.hop;
        let hop_values = [
            hop.baseline_y,
            hop.frequency,
            hop.amplitude_divisor,
            hop.drift_divisor,
            hop.wrap_bound,
        ];
        if hop_values.iter().any(|v| !v.is_finite()) {
            return invalid("hop parameters must be finite");
        }
        if hop.amplitude_divisor == 0.0 || hop.drift_divisor == 0.0 {
            return invalid("hop divisors must be non-zero");
        }
        if hop.wrap_bound <= 0.0 {
            return invalid("hop.wrap_bound must be positive");
        }

        let cam = &self.camera;
        if !(cam.fov_degrees > 0.0 && cam.fov_degrees < 180.0) {
            return invalid("camera.fov_degrees must be in (0, 180)");
        }
        if !(cam.near > 0.0 && cam.near < cam.far) {
            return invalid("camera.near must be positive and below camera.far");
        }
        if !cam.eye.is_finite() || !cam.target.is_finite() {
            return invalid("camera eye and target must be finite");
        }

        let ctl = &self.controls;
        if !(ctl.min_distance >= 0.0 && ctl.min_distance <= ctl.max_distance) {
            return invalid("controls.min_distance must be within [0, max_distance]");
        }
        if !(ctl.damping_factor > 0.0 && ctl.damping_factor <= 1.0) {
            return invalid("controls.damping_factor must be in (0, 1]");
        }

        for (label, placement) in [("character", &self.character), ("structure", &self.structure)] {
            if !(placement.scale.is_finite() && placement.scale > 0.0) {
                return invalid(&format!("{label}.scale must be positive"));
            }
            if !placement.position.is_finite() || !placement.rotation.is_finite() {
                return invalid(&format!("{label} placement must be finite"));
            }
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid(reason.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_object_yields_defaults() {
        let config = SceneConfig::from_json("{}").unwrap();
        assert_eq!(config, SceneConfig::default());
    }

    #[test]
    fn defaults_describe_the_hop_scene() {
        let config = SceneConfig::default();
        assert_eq!(config.camera.fov_degrees, 45.0);
        assert_eq!(config.camera.eye, Vec3::new(0.0, 4.0, 8.7));
        assert_eq!(config.controls.min_distance, 2.0);
        assert_eq!(config.controls.max_distance, 10.0);
        assert_eq!(config.character.scale, 0.005);
        assert_eq!(config.character.position, Vec3::new(1.0, 0.3, 0.2));
        assert!(config.character.surface.is_some());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = SceneConfig::from_json(r#"{ "hop": { "wrap_bound": 3.0 } }"#).unwrap();
        assert_eq!(config.hop.wrap_bound, 3.0);
        assert_eq!(config.hop.frequency, 8.0);
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn rejects_zero_divisor() {
        let err = SceneConfig::from_json(r#"{ "hop": { "drift_divisor": 0.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_inverted_distances() {
        let json = r#"{ "controls": { "min_distance": 12.0, "max_distance": 4.0 } }"#;
        assert!(matches!(
            SceneConfig::from_json(json),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_near_beyond_far() {
        let json = r#"{ "camera": { "near": 30.0 } }"#;
        assert!(SceneConfig::from_json(json).is_err());
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        assert!(matches!(
            SceneConfig::from_json("{ hop"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, r#"{{ "environment": {{ "exposure": 1.5 }} }}"#).unwrap();
        let config = SceneConfig::load(tmp.path()).unwrap();
        assert_eq!(config.environment.exposure, 1.5);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = SceneConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("not/here.json"));
    }

    #[test]
    fn load_or_default_without_path() {
        let config = SceneConfig::load_or_default(None).unwrap();
        assert_eq!(config, SceneConfig::default());
    }

    #[test]
    fn placement_transform_uses_euler_and_scale() {
        let t = SceneConfig::default().character.transform();
        assert_eq!(t.position, Vec3::new(1.0, 0.3, 0.2));
        assert_eq!(t.scale, Vec3::splat(0.005));
    }
}
