//! Input abstraction layer.
//!
//! The host normalizes whatever its windowing/UI layer produces into this
//! enum and dispatches it into the engine; the engine never touches a
//! concrete input source. Pointer events carry a host-supplied timestamp
//! so double-click detection and the post-drag pick suppression window
//! stay deterministic under test.

/// Modifier key state accompanying an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };
}

/// A normalized input event from any pointing device or keyboard.
#[derive(Debug, Clone)]
pub enum InputEvent {
    /// Pointer pressed (mouse down, touch start, pencil contact).
    PointerDown {
        x: f32,
        y: f32,
        time_ms: f64,
        modifiers: Modifiers,
    },

    /// Pointer moved.
    PointerMove {
        x: f32,
        y: f32,
        time_ms: f64,
        modifiers: Modifiers,
    },

    /// Pointer released.
    PointerUp {
        x: f32,
        y: f32,
        time_ms: f64,
        modifiers: Modifiers,
    },

    /// Keyboard key pressed. `key` follows `KeyboardEvent.key` values
    /// (e.g. `"z"`, `"Delete"`, `"Escape"`).
    KeyDown { key: String, modifiers: Modifiers },
}

impl InputEvent {
    /// Extract the pointer position, if this is a pointer event.
    pub fn position(&self) -> Option<(f32, f32)> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. } => Some((*x, *y)),
            Self::KeyDown { .. } => None,
        }
    }

    /// Extract the host timestamp, if this is a pointer event.
    pub fn time_ms(&self) -> Option<f64> {
        match self {
            Self::PointerDown { time_ms, .. }
            | Self::PointerMove { time_ms, .. }
            | Self::PointerUp { time_ms, .. } => Some(*time_ms),
            Self::KeyDown { .. } => None,
        }
    }
}
