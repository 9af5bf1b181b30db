//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s consumed by
//! the engine. Mode keys follow the usual 3D-editor conventions
//! (G/R/S, B for basis slide).

use crate::input::Modifiers;

/// Actions keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Transform modes ──
    ModeTranslate,
    ModeRotate,
    ModeScale,
    ModeSlide,
    /// Toggle local ↔ world transform space.
    ToggleSpace,
    /// Toggle rigid-body main translation on the selected patch.
    ToggleLockMain,

    // ── Edit ──
    Undo,
    Redo,
    Delete,
    AddPatch,

    // ── UI ──
    Deselect,
}

/// Resolves key events into shortcut actions.
///
/// Platform-aware: on macOS `meta` is ⌘, elsewhere `ctrl` serves the
/// same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action. `key` is the
    /// `KeyboardEvent.key` value. Returns `None` for unbound combos.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let cmd = modifiers.ctrl || modifiers.meta;

        // ── Modifier combos first (most specific) ──
        if cmd && modifiers.shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }

        // ── Single keys (no modifiers) ──
        match key {
            "g" | "G" => Some(ShortcutAction::ModeTranslate),
            "r" | "R" => Some(ShortcutAction::ModeRotate),
            "s" | "S" => Some(ShortcutAction::ModeScale),
            "b" | "B" => Some(ShortcutAction::ModeSlide),
            "x" | "X" => Some(ShortcutAction::ToggleSpace),
            "l" | "L" => Some(ShortcutAction::ToggleLockMain),
            "n" | "N" => Some(ShortcutAction::AddPatch),
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Deselect),
            _ => None,
        }
    }
}
