//! Key-event input type.

use crate::keys;

/// Modifier flags accompanying a key event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub caps_lock: bool,
}

/// One physical key event as the host reports it.
///
/// `vk` is an internal key code from [`crate::keys`]; `character` is the
/// translated character for the event, if the key produces one under the
/// current modifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub vk: u16,
    pub character: Option<char>,
    pub modifiers: Modifiers,
}

impl KeyInput {
    /// A plain character key with no modifiers.
    pub fn from_char(ch: char) -> Self {
        Self {
            vk: keys::NULL,
            character: Some(ch),
            modifiers: Modifiers::default(),
        }
    }

    /// A bare virtual key that produces no character (Backspace, arrows,
    /// function keys).
    pub fn from_vk(vk: u16) -> Self {
        Self {
            vk,
            character: None,
            modifiers: Modifiers::default(),
        }
    }

    /// A character-producing key with a known key code.
    pub fn new(vk: u16, ch: char) -> Self {
        Self {
            vk,
            character: Some(ch),
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.modifiers.shift = true;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.modifiers.ctrl = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.modifiers.alt = true;
        self
    }
}
