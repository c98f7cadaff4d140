use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::obj::ObjMesh;

/// Position, Euler rotation (radians, XYZ order) and scale of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

/// Surface parameters of a mesh, including its shadow participation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub color: Color,
    pub metalness: f32,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            metalness: 0.0,
            cast_shadow: false,
            receive_shadow: false,
        }
    }
}

/// Index of a node inside its [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshNode {
    pub geometry: ObjMesh,
    pub material: Material,
}

/// Light embedded in a loaded asset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightNode {
    pub color: Color,
    pub intensity: f32,
    pub cast_shadow: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    Mesh(MeshNode),
    Light(LightNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            transform: Transform::IDENTITY,
            kind,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self.kind, NodeKind::Mesh(_))
    }

    pub fn is_light(&self) -> bool {
        matches!(self.kind, NodeKind::Light(_))
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn material(&self) -> Option<&Material> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(&mesh.material),
            _ => None,
        }
    }

    pub fn material_mut(&mut self) -> Option<&mut Material> {
        match &mut self.kind {
            NodeKind::Mesh(mesh) => Some(&mut mesh.material),
            _ => None,
        }
    }
}

/// Arena backed node tree rooted at a single group node.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
}

impl SceneGraph {
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![SceneNode::new(root_name, NodeKind::Group)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Attaches `node` under `parent` and returns its id, or `None` when
    /// `parent` is not a node of this graph.
    pub fn add_child(&mut self, parent: NodeId, mut node: SceneNode) -> Option<NodeId> {
        let id = NodeId(self.nodes.len());
        self.nodes.get_mut(parent.0)?.children.push(id);
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.push(node);
        Some(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn root_node(&self) -> &SceneNode {
        &self.nodes[0]
    }

    pub fn root_node_mut(&mut self) -> &mut SceneNode {
        &mut self.nodes[0]
    }

    /// Visits every node depth first, parents before children.
    pub fn traverse<F>(&self, mut visit: F)
    where
        F: FnMut(NodeId, &SceneNode),
    {
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            visit(id, node);
            stack.extend(node.children.iter().rev().copied());
        }
    }

    /// Collects the ids of every node matching `predicate`, in traversal order.
    pub fn collect<P>(&self, mut predicate: P) -> Vec<NodeId>
    where
        P: FnMut(&SceneNode) -> bool,
    {
        let mut ids = Vec::new();
        self.traverse(|id, node| {
            if predicate(node) {
                ids.push(id);
            }
        });
        ids
    }

    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = self.node(id);
        while let Some(node) = current {
            matrix = node.transform.matrix() * matrix;
            current = node.parent.and_then(|parent| self.node(parent));
        }
        matrix
    }
}

/// Scene wide directional light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub position: Vec3,
    pub color: Color,
    pub intensity: f32,
    pub cast_shadow: bool,
}

impl DirectionalLight {
    /// Direction the light travels, from its position towards the origin.
    pub fn direction(&self) -> Vec3 {
        (-self.position).normalize_or_zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

/// Horizontal ground plane centred on the origin at `y = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundPlane {
    pub size: f32,
    pub color: Color,
    pub receive_shadow: bool,
}

/// Everything in the scene that is not the loaded asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub background: Color,
    pub light: DirectionalLight,
    pub ambient: AmbientLight,
    pub plane: GroundPlane,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh(name: &str) -> SceneNode {
        SceneNode::new(
            name,
            NodeKind::Mesh(MeshNode {
                geometry: ObjMesh::default(),
                material: Material::default(),
            }),
        )
    }

    #[test]
    fn traversal_is_depth_first_preorder() {
        let mut graph = SceneGraph::new("root");
        let body = graph
            .add_child(graph.root(), SceneNode::new("body", NodeKind::Group))
            .unwrap();
        graph.add_child(body, mesh("shell"));
        graph.add_child(graph.root(), mesh("visor"));

        let mut names = Vec::new();
        graph.traverse(|_, node| names.push(node.name.clone()));
        assert_eq!(names, ["root", "body", "shell", "visor"]);
        assert_eq!(graph.collect(SceneNode::is_mesh).len(), 2);
    }

    #[test]
    fn world_matrix_composes_parent_chain() {
        let mut graph = SceneGraph::new("root");
        graph.root_node_mut().transform.position = Vec3::new(0.0, 1.0, 0.0);
        let child = graph.add_child(graph.root(), mesh("part")).unwrap();
        graph.node_mut(child).unwrap().transform.position = Vec3::new(2.0, 0.0, 0.0);

        let world = graph.world_matrix(child);
        assert_eq!(world.transform_point3(Vec3::ZERO), Vec3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn foreign_parent_is_rejected() {
        let mut small = SceneGraph::new("small");
        let mut large = SceneGraph::new("large");
        let group = large
            .add_child(large.root(), SceneNode::new("group", NodeKind::Group))
            .unwrap();

        assert_eq!(small.add_child(group, mesh("stray")), None);
        assert!(small.root_node().children().is_empty());
        assert_eq!(small.collect(|_| true), vec![small.root()]);
    }

    #[test]
    fn material_is_only_exposed_on_meshes() {
        let group = SceneNode::new("g", NodeKind::Group);
        assert!(group.material().is_none());
        assert!(mesh("m").material().is_some());
    }

    #[test]
    fn light_direction_points_at_origin() {
        let light = DirectionalLight {
            position: Vec3::new(0.0, 4.0, 0.0),
            color: Color::WHITE,
            intensity: 1.0,
            cast_shadow: true,
        };
        assert_eq!(light.direction(), Vec3::NEG_Y);
    }
}
