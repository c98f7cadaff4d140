//! Frontend plumbing shared by the native binary and the wasm entry point.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use glam::{Vec2, Vec3};
use log::{debug, info};
use winit::event::{
    ElementState, Event, KeyboardInput, MouseButton as WinitMouseButton, MouseScrollDelta,
    VirtualKeyCode, WindowEvent,
};
use winit::event_loop::ControlFlow;

use crate::commands::{ColorPicker, ViewerCommand};
use crate::input::{InputState, KeyCode, MouseButton, NamedKey};
use crate::loader::LoadError;
use crate::render::Renderer;
use crate::scene::SceneGraph;
use crate::session::{LoadState, ViewerSession};

/// Custom event delivered to the window event loop.
#[derive(Debug)]
pub enum ViewerEvent {
    AssetLoaded(Result<SceneGraph, LoadError>),
}

/// Window-side state: renderer, pointer tracking and the shared session.
pub struct ViewerApp {
    renderer: Renderer,
    session: Rc<RefCell<ViewerSession>>,
    input: InputState,
    picker: ColorPicker,
    after_load: Vec<ViewerCommand>,
}

impl ViewerApp {
    pub fn new(renderer: Renderer, session: Rc<RefCell<ViewerSession>>) -> Self {
        Self {
            renderer,
            session,
            input: InputState::new(),
            picker: ColorPicker::default(),
            after_load: Vec::new(),
        }
    }

    /// Commands dispatched once the asset load event has been handled.
    pub fn with_after_load(mut self, commands: Vec<ViewerCommand>) -> Self {
        self.after_load = commands;
        self
    }

    pub fn session(&self) -> &Rc<RefCell<ViewerSession>> {
        &self.session
    }

    pub fn process_event(
        &mut self,
        event: Event<'_, ViewerEvent>,
        control_flow: &mut ControlFlow,
    ) -> Result<()> {
        match event {
            Event::WindowEvent { event, window_id } if window_id == self.renderer.window_id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        control_flow.set_exit();
                    }
                    WindowEvent::Resized(size) => {
                        self.renderer.resize(size);
                    }
                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        self.renderer.resize(*new_inner_size);
                    }
                    WindowEvent::ModifiersChanged(modifiers) => {
                        let shift = KeyCode::Named(NamedKey::Shift);
                        if modifiers.shift() {
                            self.input.set_key_down(shift);
                        } else {
                            self.input.set_key_up(shift);
                        }
                    }
                    WindowEvent::KeyboardInput { input, .. } => {
                        self.handle_keyboard(&input, control_flow);
                    }
                    WindowEvent::MouseInput { state, button, .. } => {
                        self.handle_mouse_button(state, button);
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        let pos = Vec2::new(position.x as f32, position.y as f32);
                        if let Some(drag) = self.input.set_mouse_position(pos) {
                            let (yaw, pitch) = InputState::orbit_delta(drag);
                            self.session.borrow_mut().camera_mut().orbit(yaw, pitch);
                        }
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        let lines = match delta {
                            MouseScrollDelta::LineDelta(_, y) => y,
                            MouseScrollDelta::PixelDelta(position) => position.y as f32 / 40.0,
                        };
                        let factor = InputState::zoom_factor(lines);
                        self.session.borrow_mut().camera_mut().zoom(factor);
                    }
                    _ => {}
                }
            }
            Event::UserEvent(ViewerEvent::AssetLoaded(outcome)) => {
                handle_asset_loaded(&self.session, &mut self.after_load, outcome);
            }
            Event::RedrawRequested(window_id) if window_id == self.renderer.window_id() => {
                self.render()?;
            }
            Event::MainEventsCleared => {
                self.renderer.window().request_redraw();
            }
            _ => {}
        }
        Ok(())
    }

    /// Runs one UI command against the session.
    pub fn dispatch(&self, command: &ViewerCommand) {
        dispatch_command(&self.session, command);
    }

    fn render(&mut self) -> Result<()> {
        let session = self.session.borrow();
        let frame = session.frame(self.renderer.aspect());
        match self.renderer.render(&frame) {
            Ok(()) => Ok(()),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = self.renderer.window().inner_size();
                self.renderer.resize(size);
                Ok(())
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(anyhow!("GPU is out of memory")),
            Err(wgpu::SurfaceError::Timeout) => {
                info!("Surface timeout; retrying next frame");
                Ok(())
            }
        }
    }

    fn handle_keyboard(&mut self, input: &KeyboardInput, control_flow: &mut ControlFlow) {
        let Some(keycode) = input.virtual_keycode.and_then(map_keycode) else {
            return;
        };
        if input.state == ElementState::Released {
            self.input.set_key_up(keycode);
            return;
        }
        self.input.set_key_down(keycode);
        match keycode {
            KeyCode::Named(NamedKey::Escape) => control_flow.set_exit(),
            KeyCode::Digit(slot) => {
                if self.picker.pick(slot) {
                    info!("color picker set to {}", self.picker.value());
                }
            }
            key => {
                if let Some(command) =
                    ViewerCommand::from_key(key, self.input.shift_down(), &self.picker)
                {
                    self.dispatch(&command);
                }
            }
        }
    }

    fn handle_mouse_button(&mut self, state: ElementState, button: WinitMouseButton) {
        let button = map_mouse_button(button);
        match state {
            ElementState::Pressed => self.input.set_mouse_button_down(button),
            ElementState::Released => self.input.set_mouse_button_up(button),
        }
    }
}

/// Hands a finished load to the session. Commands queued in `after_load`
/// run once if the asset became available and are discarded otherwise.
pub fn handle_asset_loaded(
    session: &Rc<RefCell<ViewerSession>>,
    after_load: &mut Vec<ViewerCommand>,
    outcome: Result<SceneGraph, LoadError>,
) -> bool {
    let loaded = session.borrow_mut().complete_load(outcome);
    let queued = std::mem::take(after_load);
    if loaded {
        for command in &queued {
            dispatch_command(session, command);
        }
    } else if !queued.is_empty() {
        debug!("dropping {} queued command(s); model not loaded", queued.len());
    }
    loaded
}

fn dispatch_command(session: &Rc<RefCell<ViewerSession>>, command: &ViewerCommand) -> bool {
    let changed = command.dispatch(&mut session.borrow_mut());
    debug!("{command}: {}", if changed { "applied" } else { "ignored" });
    changed
}

pub fn map_mouse_button(button: WinitMouseButton) -> MouseButton {
    let index = match button {
        WinitMouseButton::Left => 0,
        WinitMouseButton::Right => 1,
        WinitMouseButton::Middle => 2,
        WinitMouseButton::Other(value) => value.min(u8::MAX as u16) as u8,
    };
    MouseButton::new(index)
}

pub fn map_keycode(code: VirtualKeyCode) -> Option<KeyCode> {
    use winit::event::VirtualKeyCode as Key;
    Some(match code {
        Key::Left => KeyCode::Named(NamedKey::Left),
        Key::Right => KeyCode::Named(NamedKey::Right),
        Key::Up => KeyCode::Named(NamedKey::Up),
        Key::Down => KeyCode::Named(NamedKey::Down),
        Key::Home => KeyCode::Named(NamedKey::Home),
        Key::Escape => KeyCode::Named(NamedKey::Escape),
        Key::LShift | Key::RShift => KeyCode::Named(NamedKey::Shift),
        Key::C => KeyCode::Character('C'),
        Key::G => KeyCode::Character('G'),
        Key::H => KeyCode::Character('H'),
        Key::S => KeyCode::Character('S'),
        Key::Key1 | Key::Numpad1 => KeyCode::Digit(1),
        Key::Key2 | Key::Numpad2 => KeyCode::Digit(2),
        Key::Key3 | Key::Numpad3 => KeyCode::Digit(3),
        Key::Key4 | Key::Numpad4 => KeyCode::Digit(4),
        Key::Key5 | Key::Numpad5 => KeyCode::Digit(5),
        Key::Key6 | Key::Numpad6 => KeyCode::Digit(6),
        Key::Key7 | Key::Numpad7 => KeyCode::Digit(7),
        Key::Key8 | Key::Numpad8 => KeyCode::Digit(8),
        Key::Key9 | Key::Numpad9 => KeyCode::Digit(9),
        _ => return None,
    })
}

/// Human readable report of the session state, one line per entry.
pub fn summary(session: &ViewerSession) -> Vec<String> {
    let mut lines = Vec::new();
    match (session.load_state(), session.asset()) {
        (LoadState::Ready, Some(asset)) => lines.push(format!(
            "Loaded model {} with {} mesh(es)",
            asset.name(),
            asset.mesh_count()
        )),
        (LoadState::Failed(reason), _) => lines.push(format!("Model not loaded: {reason}")),
        _ => lines.push("Model still loading".to_string()),
    }

    let stage = session.stage();
    lines.push(format!(
        "Shadows: {} (light cast={} plane receive={})",
        if session.shadows_enabled() { "on" } else { "off" },
        stage.light.cast_shadow,
        stage.plane.receive_shadow
    ));

    if let Some(asset) = session.asset() {
        let transform = asset.transform();
        lines.push(format!(
            "Model pos={} rot={}",
            format_vec3(transform.position),
            format_vec3(transform.rotation)
        ));
        for mesh in asset.meshes() {
            let Some(material) = mesh.material() else {
                continue;
            };
            lines.push(format!(
                " - {} color={} metalness={:.2} cast={} receive={}",
                mesh.name,
                material.color,
                material.metalness,
                material.cast_shadow,
                material.receive_shadow
            ));
        }
    }

    let camera = session.camera();
    lines.push(format!(
        "Camera pos={} target={}",
        format_vec3(camera.position),
        format_vec3(camera.target)
    ));
    lines
}

pub fn print_summary(session: &ViewerSession) {
    for line in summary(session) {
        println!("{line}");
    }
}

fn format_vec3(value: Vec3) -> String {
    // avoid printing "-0.00"
    let clean = |v: f32| if v.abs() < 0.005 { 0.0 } else { v };
    format!(
        "({:.2}, {:.2}, {:.2})",
        clean(value.x),
        clean(value.y),
        clean(value.z)
    )
}
