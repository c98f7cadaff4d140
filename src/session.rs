//! Viewer session: the loaded asset, the shadow mode and the mutation
//! commands the UI can issue.
//!
//! Loading completes asynchronously and may arrive after the user has already
//! pressed buttons. Every mutation therefore checks whether the asset is ready
//! and silently does nothing otherwise.

use glam::Vec3;
use log::{debug, error, info, trace, warn};

use crate::camera::OrbitCamera;
use crate::color::Color;
use crate::config::ViewerConfig;
use crate::home::HomeMemory;
use crate::loader::LoadError;
use crate::render::{Frame, LightParams, MeshDraw, PlaneDraw};
use crate::scene::{Material, NodeId, NodeKind, SceneGraph, SceneNode, Stage, Transform};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Pending,
    Ready,
    Failed(String),
}

/// The single loaded model together with handles to its meshes and lights.
#[derive(Debug, Clone)]
pub struct Asset {
    graph: SceneGraph,
    meshes: Vec<NodeId>,
    lights: Vec<NodeId>,
}

impl Asset {
    fn new(graph: SceneGraph) -> Self {
        let meshes = graph.collect(SceneNode::is_mesh);
        let lights = graph.collect(SceneNode::is_light);
        Self {
            graph,
            meshes,
            lights,
        }
    }

    pub fn name(&self) -> &str {
        &self.graph.root_node().name
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn transform(&self) -> Transform {
        self.graph.root_node().transform
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Mesh nodes in traversal order.
    pub fn meshes(&self) -> impl Iterator<Item = &SceneNode> + '_ {
        self.meshes.iter().filter_map(|id| self.graph.node(*id))
    }

    pub fn materials(&self) -> Vec<Material> {
        self.meshes()
            .filter_map(SceneNode::material)
            .copied()
            .collect()
    }

    fn transform_mut(&mut self) -> &mut Transform {
        &mut self.graph.root_node_mut().transform
    }

    fn for_each_material<F>(&mut self, mut apply: F)
    where
        F: FnMut(&mut Material),
    {
        for id in &self.meshes {
            if let Some(material) = self.graph.node_mut(*id).and_then(SceneNode::material_mut) {
                apply(material);
            }
        }
    }

    fn set_shadows(&mut self, enabled: bool) {
        self.for_each_material(|material| {
            material.cast_shadow = enabled;
            material.receive_shadow = enabled;
        });
        for id in &self.lights {
            if let Some(NodeKind::Light(light)) = self.graph.node_mut(*id).map(|node| &mut node.kind)
            {
                light.cast_shadow = enabled;
            }
        }
    }
}

/// State shared by the load-completion handler, the UI commands and the render loop.
#[derive(Debug)]
pub struct ViewerSession {
    config: ViewerConfig,
    stage: Stage,
    camera: OrbitCamera,
    shadows_enabled: bool,
    asset: Option<Asset>,
    home: HomeMemory,
    load_state: LoadState,
}

impl ViewerSession {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            stage: config.stage(),
            camera: OrbitCamera::new(&config.camera),
            shadows_enabled: true,
            asset: None,
            home: HomeMemory::new(),
            load_state: LoadState::Pending,
            config,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    pub fn shadows_enabled(&self) -> bool {
        self.shadows_enabled
    }

    pub fn asset(&self) -> Option<&Asset> {
        self.asset.as_ref()
    }

    pub fn home(&self) -> Option<Transform> {
        self.home.get()
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn is_ready(&self) -> bool {
        self.asset.is_some()
    }

    /// Handles the outcome of the one asset load of the session.
    ///
    /// Returns `true` when the asset became available. Outcomes arriving after
    /// the first are ignored.
    pub fn complete_load(&mut self, outcome: Result<SceneGraph, LoadError>) -> bool {
        if self.load_state != LoadState::Pending {
            warn!("ignoring asset load completion; the session already loaded once");
            return false;
        }
        match outcome {
            Ok(mut graph) => {
                let meshes = graph.collect(SceneNode::is_mesh);
                for id in meshes {
                    if let Some(material) = graph.node_mut(id).and_then(SceneNode::material_mut) {
                        material.cast_shadow = true;
                        material.receive_shadow = true;
                        material.metalness = self.config.model.metalness;
                    }
                }
                graph.root_node_mut().transform.position = self.config.model.position;

                let asset = Asset::new(graph);
                self.home.capture(asset.transform());
                info!(
                    "loaded model {} with {} mesh(es)",
                    asset.name(),
                    asset.mesh_count()
                );
                self.asset = Some(asset);
                self.load_state = LoadState::Ready;
                true
            }
            Err(err) => {
                error!("Error loading model: {err}");
                self.load_state = LoadState::Failed(err.to_string());
                false
            }
        }
    }

    /// Flips the shadow mode. Returns the new value.
    ///
    /// Before the asset is ready only the global flag changes; the light,
    /// plane and mesh flags catch up on the next toggle after loading.
    pub fn toggle_shadows(&mut self) -> bool {
        self.shadows_enabled = !self.shadows_enabled;
        let enabled = self.shadows_enabled;
        let Some(asset) = self.asset.as_mut() else {
            debug!("shadow mode set to {enabled} before the model loaded");
            return enabled;
        };
        asset.set_shadows(enabled);
        self.stage.light.cast_shadow = enabled;
        self.stage.plane.receive_shadow = enabled;
        enabled
    }

    /// Paints every mesh with `value`. Returns whether anything changed.
    pub fn apply_color(&mut self, value: &str) -> bool {
        let Some(asset) = self.asset.as_mut() else {
            debug!("ignoring color {value:?}; model not loaded");
            return false;
        };
        let color = match Color::parse(value) {
            Ok(color) => color,
            Err(err) => {
                trace!("ignoring color input: {err}");
                return false;
            }
        };
        asset.for_each_material(|material| material.color = color);
        true
    }

    /// Switches every mesh between matte (0) and glossy metalness.
    ///
    /// The decision is made per mesh from its current value, so an authored
    /// metalness that is neither 0 nor the glossy value is not restored.
    pub fn toggle_gloss(&mut self) -> bool {
        let glossy = self.config.model.glossy_metalness;
        let Some(asset) = self.asset.as_mut() else {
            debug!("ignoring gloss toggle; model not loaded");
            return false;
        };
        asset.for_each_material(|material| {
            material.metalness = if material.metalness > 0.0 { 0.0 } else { glossy };
        });
        true
    }

    /// Restores the home position, clears the rotation and re-aims the camera.
    pub fn reset_home(&mut self) -> bool {
        let (Some(asset), Some(home)) = (self.asset.as_mut(), self.home.get()) else {
            debug!("ignoring home reset; model not loaded");
            return false;
        };
        let transform = asset.transform_mut();
        *transform = home;
        transform.rotation = Vec3::ZERO;
        self.camera.reset(self.config.camera.home, home.position);
        true
    }

    /// Moves and rotates the model relative to its current transform.
    pub fn nudge_model(&mut self, translation: Vec3, rotation: Vec3) -> bool {
        let Some(asset) = self.asset.as_mut() else {
            return false;
        };
        let transform = asset.transform_mut();
        transform.position += translation;
        transform.rotation += rotation;
        true
    }

    /// Builds the render snapshot for the current state.
    pub fn frame(&self, aspect: f32) -> Frame<'_> {
        let stage = &self.stage;
        let meshes = self
            .asset
            .iter()
            .flat_map(|asset| {
                asset.meshes.iter().filter_map(move |id| {
                    let node = asset.graph.node(*id)?;
                    let NodeKind::Mesh(mesh) = &node.kind else {
                        return None;
                    };
                    Some(MeshDraw {
                        id: *id,
                        geometry: &mesh.geometry,
                        model: asset.graph.world_matrix(*id),
                        color: mesh.material.color.to_vec3(),
                        metalness: mesh.material.metalness,
                        cast_shadow: mesh.material.cast_shadow,
                        receive_shadow: mesh.material.receive_shadow,
                    })
                })
            })
            .collect();

        Frame {
            background: stage.background,
            camera: self.camera.params(aspect),
            light: LightParams {
                position: stage.light.position,
                direction: stage.light.direction(),
                color: stage.light.color.to_vec3(),
                intensity: stage.light.intensity,
                ambient: stage.ambient.color.to_vec3() * stage.ambient.intensity,
                cast_shadow: stage.light.cast_shadow,
            },
            shadow_map_enabled: self.shadows_enabled,
            plane: PlaneDraw {
                size: stage.plane.size,
                color: stage.plane.color.to_vec3(),
                receive_shadow: stage.plane.receive_shadow,
            },
            meshes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::graph_from_obj;
    use crate::scene::{LightNode, MeshNode};

    const HELMET: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\no Shell\nf 1 2 3\no Visor\nf 3 2 1\n";

    fn loaded() -> ViewerSession {
        let mut session = ViewerSession::new(ViewerConfig::default());
        assert!(session.complete_load(graph_from_obj("helmet.obj", HELMET)));
        session
    }

    #[test]
    fn load_applies_shadow_and_metalness_defaults() {
        let session = loaded();
        let asset = session.asset().unwrap();
        assert_eq!(asset.mesh_count(), 2);
        for material in asset.materials() {
            assert!(material.cast_shadow && material.receive_shadow);
            assert_eq!(material.metalness, 0.5);
            assert_eq!(material.color, Color::WHITE);
        }
        assert_eq!(asset.transform().position, Vec3::new(0.0, 0.9, 0.0));
        assert_eq!(session.home().unwrap(), asset.transform());
        assert_eq!(session.load_state(), &LoadState::Ready);
    }

    #[test]
    fn failed_load_leaves_asset_absent() {
        let mut session = ViewerSession::new(ViewerConfig::default());
        assert!(!session.complete_load(graph_from_obj("x.obj", "garbage")));
        assert!(matches!(session.load_state(), LoadState::Failed(_)));
        assert!(session.home().is_none());
        // a late success does not revive the session
        assert!(!session.complete_load(graph_from_obj("helmet.obj", HELMET)));
        assert!(!session.is_ready());
    }

    #[test]
    fn second_load_does_not_recapture_home() {
        let mut session = loaded();
        session.nudge_model(Vec3::X, Vec3::ZERO);
        assert!(!session.complete_load(graph_from_obj("other.obj", HELMET)));
        assert_eq!(session.home().unwrap().position, Vec3::new(0.0, 0.9, 0.0));
        assert_eq!(session.asset().unwrap().name(), "helmet");
    }

    #[test]
    fn commands_before_load_do_nothing() {
        let mut session = ViewerSession::new(ViewerConfig::default());
        assert!(!session.apply_color("#ff0000"));
        assert!(!session.toggle_gloss());
        assert!(!session.reset_home());
        assert!(!session.nudge_model(Vec3::ONE, Vec3::ONE));
        assert!(session.frame(1.0).meshes.is_empty());
    }

    #[test]
    fn shadow_toggle_before_load_only_flips_the_flag() {
        let mut session = ViewerSession::new(ViewerConfig::default());
        assert!(!session.toggle_shadows());
        assert!(session.stage().light.cast_shadow);
        assert!(session.stage().plane.receive_shadow);
    }

    #[test]
    fn shadow_toggle_updates_meshes_light_and_plane() {
        let mut session = loaded();
        assert!(!session.toggle_shadows());
        assert!(!session.stage().light.cast_shadow);
        assert!(!session.stage().plane.receive_shadow);
        for material in session.asset().unwrap().materials() {
            assert!(!material.cast_shadow && !material.receive_shadow);
        }
        let frame = session.frame(1.0);
        assert!(frame.meshes.iter().all(|mesh| !frame.draws_shadow(mesh)));
    }

    #[test]
    fn shadow_toggle_reaches_lights_inside_the_asset() {
        let mut graph = SceneGraph::new("lamp");
        let root = graph.root();
        graph.add_child(
            root,
            SceneNode::new(
                "bulb",
                NodeKind::Light(LightNode {
                    color: Color::WHITE,
                    intensity: 1.0,
                    cast_shadow: true,
                }),
            ),
        );
        graph.add_child(
            root,
            SceneNode::new(
                "shade",
                NodeKind::Mesh(MeshNode {
                    geometry: Default::default(),
                    material: Material::default(),
                }),
            ),
        );
        let mut session = ViewerSession::new(ViewerConfig::default());
        session.complete_load(Ok(graph));
        session.toggle_shadows();

        let asset = session.asset().unwrap();
        let mut light_flags = Vec::new();
        asset.graph().traverse(|_, node| {
            if let NodeKind::Light(light) = &node.kind {
                light_flags.push(light.cast_shadow);
            }
        });
        assert_eq!(light_flags, [false]);
    }

    #[test]
    fn invalid_color_is_ignored() {
        let mut session = loaded();
        assert!(session.apply_color("#00ff00"));
        assert!(!session.apply_color("not-a-color"));
        for material in session.asset().unwrap().materials() {
            assert_eq!(material.color.to_hex(), 0x00ff00);
        }
    }

    #[test]
    fn reset_home_restores_position_and_zeroes_rotation() {
        let mut session = loaded();
        session.nudge_model(Vec3::new(3.0, -1.0, 2.0), Vec3::new(0.3, 1.2, -0.4));
        session.camera_mut().orbit(1.0, 0.5);
        assert!(session.reset_home());

        let transform = session.asset().unwrap().transform();
        assert_eq!(transform.position, Vec3::new(0.0, 0.9, 0.0));
        assert_eq!(transform.rotation, Vec3::ZERO);
        assert_eq!(session.camera().position, Vec3::new(0.0, 2.0, 5.0));
        assert_eq!(session.camera().target, Vec3::new(0.0, 0.9, 0.0));
    }

    #[test]
    fn frame_reflects_material_state() {
        let mut session = loaded();
        session.apply_color("red");
        // 0.5 -> 0.0 -> glossy
        session.toggle_gloss();
        session.toggle_gloss();
        let frame = session.frame(16.0 / 9.0);
        assert_eq!(frame.meshes.len(), 2);
        for mesh in &frame.meshes {
            assert_eq!(mesh.color, Vec3::new(1.0, 0.0, 0.0));
            assert_eq!(mesh.metalness, 0.9);
            assert!(frame.draws_shadow(mesh));
            let origin = mesh.model.transform_point3(Vec3::ZERO);
            assert_eq!(origin, Vec3::new(0.0, 0.9, 0.0));
        }
    }
}
