//! Pointer and keyboard events delivered by the host.

use crate::coords::CanvasPoint;
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Pointer event in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: CanvasPoint,
        button: MouseButton,
    },
    Move {
        position: CanvasPoint,
    },
    Up {
        position: CanvasPoint,
        button: MouseButton,
    },
    /// A press and release the host reports as a click.
    Click {
        position: CanvasPoint,
        button: MouseButton,
    },
}

impl PointerEvent {
    pub fn position(&self) -> CanvasPoint {
        match *self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Move { position }
            | PointerEvent::Up { position, .. }
            | PointerEvent::Click { position, .. } => position,
        }
    }
}

/// Keys the editor reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Escape,
    Delete,
    Backspace,
    Other(String),
}

impl Key {
    /// Map a host key name (DOM `KeyboardEvent.key` style) to a key.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Escape" | "Esc" => Key::Escape,
            "Delete" | "Del" => Key::Delete,
            "Backspace" => Key::Backspace,
            other => Key::Other(other.to_string()),
        }
    }
}

/// Keyboard event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyEvent {
    Pressed(Key),
    Released(Key),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names() {
        assert_eq!(Key::from_name("Escape"), Key::Escape);
        assert_eq!(Key::from_name("Del"), Key::Delete);
        assert_eq!(Key::from_name("a"), Key::Other("a".to_string()));
    }

    #[test]
    fn test_event_position() {
        let event = PointerEvent::Move {
            position: CanvasPoint::new(3.0, 4.0),
        };
        assert_eq!(event.position(), CanvasPoint::new(3.0, 4.0));
    }
}
