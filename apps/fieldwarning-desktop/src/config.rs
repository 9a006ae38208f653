use anyhow::{Context, Result};
use fieldwarning_common::{Colour, Transform};
use glam::{EulerRot, Quat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which stage renders on top of the clear stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    #[default]
    Pbr,
    Mesh,
    Quad,
}

impl StageKind {
    /// The quad stage owns its geometry.
    pub fn needs_model(self) -> bool {
        !matches!(self, StageKind::Quad)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1440,
            height: 960,
            title: "Project Field Warning".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Radians per second.
    pub orbit_speed: f32,
    pub distance: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            orbit_speed: 0.5,
            distance: 3.0,
        }
    }
}

/// Desktop settings, read from an optional JSON file and overridden by flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub model: PathBuf,
    pub shader_dir: PathBuf,
    pub stage: StageKind,
    pub clear_colour: Colour,
    /// Euler angles in degrees, applied X then Y then Z.
    pub model_rotation: [f32; 3],
    pub camera: CameraConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            model: PathBuf::from("data/models/DamagedHelmet/glTF-Embedded/DamagedHelmet.gltf"),
            shader_dir: PathBuf::from("data/shaders"),
            stage: StageKind::default(),
            clear_colour: Colour::BLACK,
            model_rotation: [90.0, 0.0, 0.0],
            camera: CameraConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn model_transform(&self) -> Transform {
        let [x, y, z] = self.model_rotation.map(f32::to_radians);
        Transform {
            rotation: Quat::from_euler(EulerRot::XYZ, x, y, z),
            ..Transform::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        assert_eq!(config.window.width, 1440);
        assert_eq!(config.window.height, 960);
        assert_eq!(config.window.title, "Project Field Warning");
        assert_eq!(config.stage, StageKind::Pbr);
        assert_eq!(config.clear_colour, Colour::BLACK);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "stage": "quad", "window": {{ "width": 800 }} }}"#).unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.stage, StageKind::Quad);
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 960);
        assert_eq!(config.shader_dir, PathBuf::from("data/shaders"));
    }

    #[test]
    fn malformed_file_names_the_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains(&file.path().display().to_string()));
    }

    #[test]
    fn rotation_turns_y_up_into_z() {
        let config = AppConfig::default();
        let rotated = config.model_transform().matrix().transform_vector3(Vec3::Y);
        assert!((rotated - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn quad_needs_no_model() {
        assert!(!StageKind::Quad.needs_model());
        assert!(StageKind::Pbr.needs_model());
        assert!(StageKind::Mesh.needs_model());
    }
}
