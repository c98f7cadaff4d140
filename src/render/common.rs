use glam::{Mat4, Vec3, Vec4};

use crate::color::Color;
use crate::obj::ObjMesh;
use crate::scene::NodeId;

/// Height above the ground plane at which projected shadows are drawn.
pub const SHADOW_OFFSET: f32 = 0.002;

/// Camera parameters consumed by the renderer's uniform buffer.
#[derive(Clone, Debug)]
pub struct CameraParams {
    pub view_proj: Mat4,
    pub position: Vec3,
}

/// Lighting state consumed by the renderer's uniform buffer.
#[derive(Clone, Debug)]
pub struct LightParams {
    pub position: Vec3,
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub ambient: Vec3,
    pub cast_shadow: bool,
}

#[derive(Clone, Debug)]
pub struct PlaneDraw {
    pub size: f32,
    pub color: Vec3,
    pub receive_shadow: bool,
}

/// One mesh of the loaded asset as it should appear this frame.
#[derive(Clone, Debug)]
pub struct MeshDraw<'a> {
    pub id: NodeId,
    pub geometry: &'a ObjMesh,
    pub model: Mat4,
    pub color: Vec3,
    pub metalness: f32,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

/// Read-only snapshot of the session handed to the renderer every frame.
#[derive(Clone, Debug)]
pub struct Frame<'a> {
    pub background: Color,
    pub camera: CameraParams,
    pub light: LightParams,
    pub shadow_map_enabled: bool,
    pub plane: PlaneDraw,
    pub meshes: Vec<MeshDraw<'a>>,
}

impl Frame<'_> {
    /// Whether `mesh` throws a projected shadow onto the ground this frame.
    pub fn draws_shadow(&self, mesh: &MeshDraw<'_>) -> bool {
        self.shadow_map_enabled
            && self.light.cast_shadow
            && self.plane.receive_shadow
            && mesh.cast_shadow
            && self.light.direction.y < -f32::EPSILON
    }

    /// Matrix flattening geometry onto the ground plane along the light direction.
    pub fn shadow_projection(&self) -> Mat4 {
        let dir = self.light.direction;
        let dy = if dir.y.abs() > f32::EPSILON { dir.y } else { -1.0 };
        Mat4::from_cols(
            Vec4::new(1.0, 0.0, 0.0, 0.0),
            Vec4::new(-dir.x / dy, 0.0, -dir.z / dy, 0.0),
            Vec4::new(0.0, 0.0, 1.0, 0.0),
            Vec4::new(0.0, SHADOW_OFFSET, 0.0, 1.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(mesh: &ObjMesh) -> Frame<'_> {
        Frame {
            background: Color::BLACK,
            camera: CameraParams {
                view_proj: Mat4::IDENTITY,
                position: Vec3::ZERO,
            },
            light: LightParams {
                position: Vec3::new(5.0, 8.0, 5.0),
                direction: Vec3::new(-5.0, -8.0, -5.0).normalize(),
                color: Vec3::ONE,
                intensity: 1.0,
                ambient: Vec3::splat(0.9),
                cast_shadow: true,
            },
            shadow_map_enabled: true,
            plane: PlaneDraw {
                size: 100.0,
                color: Vec3::ONE,
                receive_shadow: true,
            },
            meshes: vec![MeshDraw {
                id: crate::scene::SceneGraph::new("root").root(),
                geometry: mesh,
                model: Mat4::IDENTITY,
                color: Vec3::ONE,
                metalness: 0.5,
                cast_shadow: true,
                receive_shadow: true,
            }],
        }
    }

    #[test]
    fn shadow_requires_every_flag() {
        let geometry = ObjMesh::default();
        let mut frame = frame(&geometry);
        let mesh = frame.meshes[0].clone();
        assert!(frame.draws_shadow(&mesh));
        frame.shadow_map_enabled = false;
        assert!(!frame.draws_shadow(&mesh));
        frame.shadow_map_enabled = true;
        frame.plane.receive_shadow = false;
        assert!(!frame.draws_shadow(&mesh));
    }

    #[test]
    fn projection_lands_points_on_the_plane() {
        let geometry = ObjMesh::default();
        let frame = frame(&geometry);
        let projected = frame
            .shadow_projection()
            .transform_point3(Vec3::new(0.0, 8.0, 0.0));
        assert!((projected.y - SHADOW_OFFSET).abs() < 1e-6);
        assert!((projected.x + 5.0).abs() < 1e-4);
        assert!((projected.z + 5.0).abs() < 1e-4);
    }
}
