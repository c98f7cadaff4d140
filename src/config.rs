use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::scene::{AmbientLight, DirectionalLight, GroundPlane, Stage};

pub const DEFAULT_ASSET_URL: &str = "assets/helmet.obj";

/// Startup configuration of the viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub asset_url: String,
    pub background: Color,
    pub camera: CameraConfig,
    pub model: ModelConfig,
    pub light: DirectionalLight,
    pub ambient: AmbientLight,
    pub plane: GroundPlane,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Camera position restored by the home reset.
    pub home: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Placement applied once the asset has loaded, before the home state is captured.
    pub position: Vec3,
    /// Metalness forced onto every mesh at load time.
    pub metalness: f32,
    /// Metalness used by the gloss toggle when switching a mesh on.
    pub glossy_metalness: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            asset_url: DEFAULT_ASSET_URL.to_string(),
            background: Color::BLACK,
            camera: CameraConfig::default(),
            model: ModelConfig::default(),
            light: DirectionalLight {
                position: Vec3::new(5.0, 8.0, 5.0),
                color: Color::WHITE,
                intensity: 1.0,
                cast_shadow: true,
            },
            ambient: AmbientLight {
                color: Color::WHITE,
                intensity: 0.9,
            },
            plane: GroundPlane {
                size: 100.0,
                color: Color::WHITE,
                receive_shadow: true,
            },
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            home: Vec3::new(0.0, 2.0, 5.0),
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.9, 0.0),
            metalness: 0.5,
            glossy_metalness: 0.9,
        }
    }
}

impl ViewerConfig {
    /// Parses a `<viewer>` document. Every element is optional.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid viewer XML")?;
        let root = document.root_element();
        if !root.has_tag_name("viewer") {
            return Err(anyhow!(
                "expected <viewer> root element, found <{}>",
                root.tag_name().name()
            ));
        }

        let mut config = Self::default();
        if let Some(url) = optional_text(&root, "asset") {
            config.asset_url = url;
        }
        config.background = parse_color(optional_text(&root, "background"), config.background)
            .context("invalid <background>")?;

        if let Some(camera) = child(&root, "camera") {
            let target = &mut config.camera;
            target.home = parse_vec3(optional_text(&camera, "position"), target.home)
                .context("invalid camera <position>")?;
            target.fov = parse_f32(optional_text(&camera, "fov"), target.fov)?;
            target.near = parse_f32(optional_text(&camera, "near"), target.near)?;
            target.far = parse_f32(optional_text(&camera, "far"), target.far)?;
        }

        if let Some(model) = child(&root, "model") {
            let target = &mut config.model;
            target.position = parse_vec3(optional_text(&model, "position"), target.position)
                .context("invalid model <position>")?;
            target.metalness = parse_f32(optional_text(&model, "metalness"), target.metalness)?;
            target.glossy_metalness =
                parse_f32(optional_text(&model, "glossy"), target.glossy_metalness)?;
        }

        if let Some(light) = child(&root, "light") {
            let target = &mut config.light;
            target.position = parse_vec3(optional_text(&light, "position"), target.position)
                .context("invalid light <position>")?;
            target.color = parse_color(optional_text(&light, "color"), target.color)
                .context("invalid light <color>")?;
            target.intensity = parse_f32(optional_text(&light, "intensity"), target.intensity)?;
            target.cast_shadow =
                parse_bool(optional_text(&light, "castShadow"), target.cast_shadow)?;
            config.ambient.intensity =
                parse_f32(optional_text(&light, "ambient"), config.ambient.intensity)?;
        }

        if let Some(plane) = child(&root, "plane") {
            let target = &mut config.plane;
            target.size = parse_f32(optional_text(&plane, "size"), target.size)?;
            target.color = parse_color(optional_text(&plane, "color"), target.color)
                .context("invalid plane <color>")?;
        }

        if config.camera.near <= 0.0 || config.camera.far <= config.camera.near {
            return Err(anyhow!(
                "camera clip range {}..{} is invalid",
                config.camera.near,
                config.camera.far
            ));
        }
        let model = &config.model;
        if !(0.0..=1.0).contains(&model.metalness) {
            return Err(anyhow!(
                "model metalness {} must be within 0..1",
                model.metalness
            ));
        }
        if !(model.glossy_metalness > 0.0 && model.glossy_metalness <= 1.0) {
            return Err(anyhow!(
                "glossy metalness {} must be within (0, 1]",
                model.glossy_metalness
            ));
        }
        Ok(config)
    }

    pub fn stage(&self) -> Stage {
        Stage {
            background: self.background,
            light: self.light,
            ambient: self.ambient,
            plane: self.plane,
        }
    }
}

fn child<'a, 'input>(node: &Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| child.has_tag_name(tag))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    child(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    let numbers = value
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f32>()
                .map_err(|err| anyhow!("failed to parse {component:?}: {err}"))
        })
        .collect::<Result<Vec<_>>>()?;
    match numbers.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(anyhow!("vector must have 3 components, found {}", numbers.len())),
    }
}

fn parse_color(value: Option<String>, default: Color) -> Result<Color> {
    match value {
        Some(value) => Ok(Color::parse(&value)?),
        None => Ok(default),
    }
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float {value:?}: {err}")),
        None => Ok(default),
    }
}

fn parse_bool(value: Option<String>, default: bool) -> Result<bool> {
    match value.as_deref() {
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(other) => Err(anyhow!("failed to parse boolean {other:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    <viewer>
        <asset>models/crate.obj</asset>
        <background>#202020</background>
        <camera>
            <position>0 3 8</position>
            <fov>60</fov>
        </camera>
        <model>
            <metalness>0.25</metalness>
        </model>
        <light>
            <position>1 10 1</position>
            <color>rgb(255, 128, 0)</color>
            <castShadow>false</castShadow>
            <ambient>0.4</ambient>
        </light>
    </viewer>
    "#;

    #[test]
    fn parse_overrides_and_keeps_defaults() {
        let config = ViewerConfig::from_xml(SAMPLE).unwrap();
        assert_eq!(config.asset_url, "models/crate.obj");
        assert_eq!(config.background.to_hex(), 0x202020);
        assert_eq!(config.camera.home, Vec3::new(0.0, 3.0, 8.0));
        assert_eq!(config.camera.fov, 60.0);
        assert_eq!(config.camera.near, 0.1);
        assert_eq!(config.model.metalness, 0.25);
        assert_eq!(config.model.glossy_metalness, 0.9);
        assert_eq!(config.model.position, Vec3::new(0.0, 0.9, 0.0));
        assert_eq!(config.light.color.to_hex(), 0xff8000);
        assert!(!config.light.cast_shadow);
        assert!((config.ambient.intensity - 0.4).abs() < f32::EPSILON);
        assert!(config.plane.receive_shadow);
    }

    #[test]
    fn empty_viewer_matches_defaults() {
        let config = ViewerConfig::from_xml("<viewer/>").unwrap();
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn malformed_vector_is_an_error() {
        let bad = "<viewer><camera><position>0 2</position></camera></viewer>";
        assert!(ViewerConfig::from_xml(bad).is_err());
    }

    #[test]
    fn malformed_metalness_is_an_error() {
        for value in ["5", "-0.1", "NaN", "inf"] {
            let xml = format!("<viewer><model><metalness>{value}</metalness></model></viewer>");
            assert!(ViewerConfig::from_xml(&xml).is_err(), "accepted {value}");
        }
        let edge = "<viewer><model><metalness>0</metalness></model></viewer>";
        assert_eq!(ViewerConfig::from_xml(edge).unwrap().model.metalness, 0.0);
    }

    #[test]
    fn malformed_glossy_metalness_is_an_error() {
        for value in ["0", "-1", "1.5", "NaN"] {
            let xml = format!("<viewer><model><glossy>{value}</glossy></model></viewer>");
            assert!(ViewerConfig::from_xml(&xml).is_err(), "accepted {value}");
        }
        let full = "<viewer><model><glossy>1</glossy></model></viewer>";
        assert_eq!(ViewerConfig::from_xml(full).unwrap().model.glossy_metalness, 1.0);
    }

    #[test]
    fn wrong_root_is_an_error() {
        assert!(ViewerConfig::from_xml("<scene/>").is_err());
    }
}
