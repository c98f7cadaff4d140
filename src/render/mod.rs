pub mod common;
pub mod gpu;
mod shared;

pub use common::{CameraParams, Frame, LightParams, MeshDraw, PlaneDraw};
pub use gpu::Renderer;
