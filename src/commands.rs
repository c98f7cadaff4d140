use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use thiserror::Error;

use crate::color::Color;
use crate::input::{KeyCode, NamedKey};
use crate::session::ViewerSession;

/// Rotation applied per arrow key press, in radians.
pub const NUDGE_ROTATION: f32 = std::f32::consts::PI / 24.0;
/// Translation applied per shifted arrow key press.
pub const NUDGE_DISTANCE: f32 = 0.1;

/// Discrete UI trigger. Each variant maps to exactly one session operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerCommand {
    ToggleShadows,
    ApplyColor(String),
    ToggleGloss,
    GoHome,
    NudgeModel { translation: Vec3, rotation: Vec3 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown command {0:?}; expected toggle-shadows, toggle-gloss, home or apply-color=<color>")]
pub struct UnknownCommand(pub String);

impl ViewerCommand {
    /// Maps a page element id to its command. `value` is the color picker
    /// value read when the trigger fired.
    pub fn from_trigger(id: &str, value: Option<&str>) -> Option<Self> {
        Some(match id {
            "toggleShadows" => Self::ToggleShadows,
            "applyColor" => Self::ApplyColor(value.unwrap_or_default().to_string()),
            "toggleGloss" => Self::ToggleGloss,
            "homePosition" => Self::GoHome,
            _ => return None,
        })
    }

    /// Keyboard shortcut for `key`, reading the picker value for color application.
    pub fn from_key(key: KeyCode, shift: bool, picker: &ColorPicker) -> Option<Self> {
        let nudge = |translation: Vec3, rotation: Vec3| Self::NudgeModel {
            translation,
            rotation,
        };
        Some(match key {
            KeyCode::Character('S') => Self::ToggleShadows,
            KeyCode::Character('G') => Self::ToggleGloss,
            KeyCode::Character('H') | KeyCode::Named(NamedKey::Home) => Self::GoHome,
            KeyCode::Character('C') => Self::ApplyColor(picker.value().to_string()),
            KeyCode::Named(NamedKey::Left) if shift => nudge(Vec3::NEG_X * NUDGE_DISTANCE, Vec3::ZERO),
            KeyCode::Named(NamedKey::Right) if shift => nudge(Vec3::X * NUDGE_DISTANCE, Vec3::ZERO),
            KeyCode::Named(NamedKey::Up) if shift => nudge(Vec3::Y * NUDGE_DISTANCE, Vec3::ZERO),
            KeyCode::Named(NamedKey::Down) if shift => nudge(Vec3::NEG_Y * NUDGE_DISTANCE, Vec3::ZERO),
            KeyCode::Named(NamedKey::Left) => nudge(Vec3::ZERO, Vec3::NEG_Y * NUDGE_ROTATION),
            KeyCode::Named(NamedKey::Right) => nudge(Vec3::ZERO, Vec3::Y * NUDGE_ROTATION),
            KeyCode::Named(NamedKey::Up) => nudge(Vec3::ZERO, Vec3::NEG_X * NUDGE_ROTATION),
            KeyCode::Named(NamedKey::Down) => nudge(Vec3::ZERO, Vec3::X * NUDGE_ROTATION),
            _ => return None,
        })
    }

    /// Runs the command against the session. Returns whether the session changed.
    pub fn dispatch(&self, session: &mut ViewerSession) -> bool {
        match self {
            Self::ToggleShadows => {
                session.toggle_shadows();
                true
            }
            Self::ApplyColor(value) => session.apply_color(value),
            Self::ToggleGloss => session.toggle_gloss(),
            Self::GoHome => session.reset_home(),
            Self::NudgeModel {
                translation,
                rotation,
            } => session.nudge_model(*translation, *rotation),
        }
    }
}

impl FromStr for ViewerCommand {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = match s.split_once('=') {
            Some((name, value)) => (name.trim(), Some(value.trim())),
            None => (s.trim(), None),
        };
        match (name, value) {
            ("toggle-shadows", None) => Ok(Self::ToggleShadows),
            ("toggle-gloss", None) => Ok(Self::ToggleGloss),
            ("home", None) => Ok(Self::GoHome),
            ("apply-color", Some(value)) => Ok(Self::ApplyColor(value.to_string())),
            _ => Err(UnknownCommand(s.to_string())),
        }
    }
}

impl fmt::Display for ViewerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToggleShadows => f.write_str("toggle-shadows"),
            Self::ApplyColor(value) => write!(f, "apply-color={value}"),
            Self::ToggleGloss => f.write_str("toggle-gloss"),
            Self::GoHome => f.write_str("home"),
            Self::NudgeModel {
                translation,
                rotation,
            } => write!(f, "nudge translation={translation} rotation={rotation}"),
        }
    }
}

/// Palette offered by the native color picker, selected with the digit keys.
pub const PALETTE: [u32; 9] = [
    0xffffff, 0xff0000, 0x00ff00, 0x0000ff, 0xffff00, 0xff00ff, 0x00ffff, 0xffa500, 0x808080,
];

/// Value holder standing in for the page's color input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorPicker {
    value: String,
}

impl ColorPicker {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Selects palette entry `slot` (1-based, as printed on the digit keys).
    pub fn pick(&mut self, slot: u8) -> bool {
        let Some(hex) = (slot as usize)
            .checked_sub(1)
            .and_then(|index| PALETTE.get(index))
        else {
            return false;
        };
        self.value = Color::from_hex(*hex).to_string();
        true
    }
}

impl Default for ColorPicker {
    fn default() -> Self {
        Self::new("#ffffff")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewerConfig;
    use crate::loader::graph_from_obj;

    #[test]
    fn page_triggers_map_one_to_one() {
        assert_eq!(
            ViewerCommand::from_trigger("toggleShadows", None),
            Some(ViewerCommand::ToggleShadows)
        );
        assert_eq!(
            ViewerCommand::from_trigger("applyColor", Some("#123456")),
            Some(ViewerCommand::ApplyColor("#123456".into()))
        );
        assert_eq!(
            ViewerCommand::from_trigger("toggleGloss", None),
            Some(ViewerCommand::ToggleGloss)
        );
        assert_eq!(
            ViewerCommand::from_trigger("homePosition", None),
            Some(ViewerCommand::GoHome)
        );
        assert_eq!(ViewerCommand::from_trigger("colorPicker", None), None);
    }

    #[test]
    fn parses_cli_command_names() {
        assert_eq!(
            "apply-color=#00ff00".parse::<ViewerCommand>().unwrap(),
            ViewerCommand::ApplyColor("#00ff00".into())
        );
        assert_eq!("home".parse::<ViewerCommand>().unwrap(), ViewerCommand::GoHome);
        assert!("apply-color".parse::<ViewerCommand>().is_err());
        assert!("explode".parse::<ViewerCommand>().is_err());
        assert_eq!(ViewerCommand::ToggleGloss.to_string(), "toggle-gloss");
    }

    #[test]
    fn keys_read_the_picker() {
        let mut picker = ColorPicker::default();
        assert!(picker.pick(2));
        assert!(!picker.pick(0));
        assert!(!picker.pick(10));
        assert_eq!(
            ViewerCommand::from_key(KeyCode::Character('C'), false, &picker),
            Some(ViewerCommand::ApplyColor("#ff0000".into()))
        );
        assert!(matches!(
            ViewerCommand::from_key(KeyCode::Named(NamedKey::Left), true, &picker),
            Some(ViewerCommand::NudgeModel { rotation, .. }) if rotation == Vec3::ZERO
        ));
        assert_eq!(
            ViewerCommand::from_key(KeyCode::Character('Q'), false, &picker),
            None
        );
    }

    #[test]
    fn dispatch_is_safe_before_load() {
        let mut session = ViewerSession::new(ViewerConfig::default());
        for command in [
            ViewerCommand::ApplyColor("#ff0000".into()),
            ViewerCommand::ToggleGloss,
            ViewerCommand::GoHome,
        ] {
            assert!(!command.dispatch(&mut session));
        }
        session.complete_load(graph_from_obj(
            "tri.obj",
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n",
        ));
        assert!(ViewerCommand::ToggleGloss.dispatch(&mut session));
        assert_eq!(session.asset().unwrap().materials()[0].metalness, 0.0);
    }
}
