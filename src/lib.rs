//! Lit 3D model viewer.
//!
//! A [`ViewerSession`] owns one asynchronously loaded model together with the
//! stage around it (light, ground plane, camera) and exposes the four UI
//! mutations: shadow toggle, color application, gloss toggle and the reset to
//! the captured home position. Every mutation is a silent no-op until the
//! asset has finished loading. The same session drives the native binary, the
//! wasm page and headless tooling.

pub mod app;
pub mod camera;
pub mod color;
pub mod commands;
pub mod config;
pub mod home;
pub mod input;
pub mod loader;
pub mod obj;
pub mod render;
pub mod scene;
pub mod session;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use camera::OrbitCamera;
pub use color::{Color, ColorError};
pub use commands::{ColorPicker, ViewerCommand};
pub use config::ViewerConfig;
pub use home::HomeMemory;
pub use input::{InputState, KeyCode, MouseButton, NamedKey};
pub use loader::{graph_from_obj, LoadError};
pub use obj::{load_obj_from_str, ObjMesh};
pub use render::{CameraParams, Frame, LightParams, Renderer};
pub use scene::{Material, NodeId, SceneGraph, SceneNode, Stage, Transform};
pub use session::{Asset, LoadState, ViewerSession};
