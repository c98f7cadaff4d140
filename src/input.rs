use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Radians of orbit per pixel of pointer drag.
pub const ORBIT_SPEED: f32 = 0.005;
/// Zoom factor per wheel line; scrolling up moves closer.
pub const ZOOM_STEP: f32 = 0.9;

/// Identifier for a physical keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    Named(NamedKey),
    Character(char),
    Digit(u8),
}

/// Friendly names for the non-character keys the viewer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedKey {
    Left,
    Right,
    Up,
    Down,
    Home,
    Escape,
    Shift,
}

/// Identifier for a mouse button (left button is zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MouseButton(u8);

impl MouseButton {
    pub const LEFT: Self = Self(0);

    pub fn new(index: u8) -> Self {
        Self(index)
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

/// Pointer and modifier tracking used to drive the orbit controls.
#[derive(Debug, Default)]
pub struct InputState {
    keys: HashSet<KeyCode>,
    mouse_buttons: HashSet<MouseButton>,
    mouse_position: Option<Vec2>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key_down(&mut self, key: KeyCode) {
        self.keys.insert(key);
    }

    pub fn set_key_up(&mut self, key: KeyCode) {
        self.keys.remove(&key);
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }

    pub fn shift_down(&self) -> bool {
        self.is_key_down(KeyCode::Named(NamedKey::Shift))
    }

    pub fn set_mouse_button_down(&mut self, button: MouseButton) {
        self.mouse_buttons.insert(button);
    }

    pub fn set_mouse_button_up(&mut self, button: MouseButton) {
        self.mouse_buttons.remove(&button);
    }

    pub fn is_mouse_button_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons.contains(&button)
    }

    /// Records the pointer position and returns the drag delta while the
    /// left button is held.
    pub fn set_mouse_position(&mut self, position: Vec2) -> Option<Vec2> {
        let previous = self.mouse_position.replace(position)?;
        self.is_mouse_button_down(MouseButton::LEFT)
            .then(|| position - previous)
    }

    /// Converts a drag delta in pixels into `(yaw, pitch)` orbit radians.
    pub fn orbit_delta(drag: Vec2) -> (f32, f32) {
        (-drag.x * ORBIT_SPEED, drag.y * ORBIT_SPEED)
    }

    /// Converts wheel lines into a camera zoom factor.
    pub fn zoom_factor(lines: f32) -> f32 {
        ZOOM_STEP.powf(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_only_reports_while_left_button_held() {
        let mut input = InputState::new();
        assert_eq!(input.set_mouse_position(Vec2::new(10.0, 10.0)), None);
        assert_eq!(input.set_mouse_position(Vec2::new(12.0, 10.0)), None);
        input.set_mouse_button_down(MouseButton::LEFT);
        assert_eq!(
            input.set_mouse_position(Vec2::new(15.0, 6.0)),
            Some(Vec2::new(3.0, -4.0))
        );
        input.set_mouse_button_up(MouseButton::LEFT);
        assert_eq!(input.set_mouse_position(Vec2::new(20.0, 6.0)), None);
    }

    #[test]
    fn tracks_shift_modifier() {
        let mut input = InputState::new();
        input.set_key_down(KeyCode::Named(NamedKey::Shift));
        assert!(input.shift_down());
        input.set_key_up(KeyCode::Named(NamedKey::Shift));
        assert!(!input.shift_down());
    }

    #[test]
    fn scrolling_up_zooms_in() {
        assert!(InputState::zoom_factor(1.0) < 1.0);
        assert!(InputState::zoom_factor(-1.0) > 1.0);
    }
}
