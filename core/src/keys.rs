//! Internal virtual-key space.
//!
//! Rules address physical keys through a dense, platform-neutral code space
//! declared once here. `PREDEFINED` operands in compiled keyboard files use
//! these codes directly, so the numbering is a stable file-format contract:
//! never renumber, only append.
//!
//! Hosts that receive Windows virtual-key codes translate through
//! [`from_windows`]; unknown Windows codes map to [`NULL`].

/// Placeholder / unknown key. Also the RHS "clear output" operand.
pub const NULL: u16 = 1;

pub const BACK: u16 = 2;
pub const TAB: u16 = 3;
pub const RETURN: u16 = 4;
pub const SHIFT: u16 = 5;
pub const CONTROL: u16 = 6;
pub const MENU: u16 = 7; // Alt
pub const PAUSE: u16 = 8;
pub const CAPITAL: u16 = 9; // CapsLock
pub const ESCAPE: u16 = 10;
pub const SPACE: u16 = 11;
pub const PRIOR: u16 = 12; // PageUp
pub const NEXT: u16 = 13; // PageDown
pub const END: u16 = 14;
pub const HOME: u16 = 15;
pub const LEFT: u16 = 16;
pub const UP: u16 = 17;
pub const RIGHT: u16 = 18;
pub const DOWN: u16 = 19;
pub const INSERT: u16 = 20;
pub const DELETE: u16 = 21;

pub const N0: u16 = 22;
pub const N1: u16 = 23;
pub const N2: u16 = 24;
pub const N3: u16 = 25;
pub const N4: u16 = 26;
pub const N5: u16 = 27;
pub const N6: u16 = 28;
pub const N7: u16 = 29;
pub const N8: u16 = 30;
pub const N9: u16 = 31;

pub const A: u16 = 32;
pub const B: u16 = 33;
pub const C: u16 = 34;
pub const D: u16 = 35;
pub const E: u16 = 36;
pub const F: u16 = 37;
pub const G: u16 = 38;
pub const H: u16 = 39;
pub const I: u16 = 40;
pub const J: u16 = 41;
pub const K: u16 = 42;
pub const L: u16 = 43;
pub const M: u16 = 44;
pub const N: u16 = 45;
pub const O: u16 = 46;
pub const P: u16 = 47;
pub const Q: u16 = 48;
pub const R: u16 = 49;
pub const S: u16 = 50;
pub const T: u16 = 51;
pub const U: u16 = 52;
pub const V: u16 = 53;
pub const W: u16 = 54;
pub const X: u16 = 55;
pub const Y: u16 = 56;
pub const Z: u16 = 57;

pub const NUMPAD0: u16 = 58;
pub const NUMPAD1: u16 = 59;
pub const NUMPAD2: u16 = 60;
pub const NUMPAD3: u16 = 61;
pub const NUMPAD4: u16 = 62;
pub const NUMPAD5: u16 = 63;
pub const NUMPAD6: u16 = 64;
pub const NUMPAD7: u16 = 65;
pub const NUMPAD8: u16 = 66;
pub const NUMPAD9: u16 = 67;
pub const MULTIPLY: u16 = 68;
pub const ADD: u16 = 69;
pub const SEPARATOR: u16 = 70;
pub const SUBTRACT: u16 = 71;
pub const DECIMAL: u16 = 72;
pub const DIVIDE: u16 = 73;

pub const F1: u16 = 74;
pub const F2: u16 = 75;
pub const F3: u16 = 76;
pub const F4: u16 = 77;
pub const F5: u16 = 78;
pub const F6: u16 = 79;
pub const F7: u16 = 80;
pub const F8: u16 = 81;
pub const F9: u16 = 82;
pub const F10: u16 = 83;
pub const F11: u16 = 84;
pub const F12: u16 = 85;

pub const LSHIFT: u16 = 86;
pub const RSHIFT: u16 = 87;
pub const LCONTROL: u16 = 88;
pub const RCONTROL: u16 = 89;
pub const LMENU: u16 = 90; // left Alt
pub const RMENU: u16 = 91; // right Alt / AltGr

pub const OEM_1: u16 = 92; // ';'
pub const OEM_PLUS: u16 = 93; // '='
pub const OEM_COMMA: u16 = 94; // ','
pub const OEM_MINUS: u16 = 95; // '-'
pub const OEM_PERIOD: u16 = 96; // '.'
pub const OEM_2: u16 = 97; // '/'
pub const OEM_3: u16 = 98; // '`'
pub const OEM_4: u16 = 99; // '['
pub const OEM_5: u16 = 100; // '\'
pub const OEM_6: u16 = 101; // ']'
pub const OEM_7: u16 = 102; // '\''
pub const OEM_8: u16 = 103;

/// True for keys that stand for a modifier flag rather than a scancode.
///
/// In a rule's key combination these match against the input's modifier
/// state instead of its key code.
pub fn is_modifier(code: u16) -> bool {
    matches!(
        code,
        SHIFT | LSHIFT | RSHIFT | CONTROL | LCONTROL | RCONTROL | MENU | LMENU | RMENU
    )
}

/// Translate a Windows virtual-key code to the internal code space.
///
/// The table is a fixed 1:1 contract with hosts; unknown codes map to
/// [`NULL`].
pub fn from_windows(vk: u32) -> u16 {
    match vk {
        0x08 => BACK,
        0x09 => TAB,
        0x0D => RETURN,
        0x10 => SHIFT,
        0x11 => CONTROL,
        0x12 => MENU,
        0x13 => PAUSE,
        0x14 => CAPITAL,
        0x1B => ESCAPE,
        0x20 => SPACE,
        0x21 => PRIOR,
        0x22 => NEXT,
        0x23 => END,
        0x24 => HOME,
        0x25 => LEFT,
        0x26 => UP,
        0x27 => RIGHT,
        0x28 => DOWN,
        0x2D => INSERT,
        0x2E => DELETE,
        // '0'..'9'
        0x30..=0x39 => N0 + (vk - 0x30) as u16,
        // 'A'..'Z'
        0x41..=0x5A => A + (vk - 0x41) as u16,
        0x60..=0x69 => NUMPAD0 + (vk - 0x60) as u16,
        0x6A => MULTIPLY,
        0x6B => ADD,
        0x6C => SEPARATOR,
        0x6D => SUBTRACT,
        0x6E => DECIMAL,
        0x6F => DIVIDE,
        0x70..=0x7B => F1 + (vk - 0x70) as u16,
        0xA0 => LSHIFT,
        0xA1 => RSHIFT,
        0xA2 => LCONTROL,
        0xA3 => RCONTROL,
        0xA4 => LMENU,
        0xA5 => RMENU,
        0xBA => OEM_1,
        0xBB => OEM_PLUS,
        0xBC => OEM_COMMA,
        0xBD => OEM_MINUS,
        0xBE => OEM_PERIOD,
        0xBF => OEM_2,
        0xC0 => OEM_3,
        0xDB => OEM_4,
        0xDC => OEM_5,
        0xDD => OEM_6,
        0xDE => OEM_7,
        0xDF => OEM_8,
        _ => NULL,
    }
}

/// Canonical display name of a key code.
pub fn name(code: u16) -> Option<&'static str> {
    let s = match code {
        NULL => "Null",
        BACK => "Backspace",
        TAB => "Tab",
        RETURN => "Enter",
        SHIFT => "Shift",
        CONTROL => "Ctrl",
        MENU => "Alt",
        PAUSE => "Pause",
        CAPITAL => "CapsLock",
        ESCAPE => "Escape",
        SPACE => "Space",
        PRIOR => "PageUp",
        NEXT => "PageDown",
        END => "End",
        HOME => "Home",
        LEFT => "Left",
        UP => "Up",
        RIGHT => "Right",
        DOWN => "Down",
        INSERT => "Insert",
        DELETE => "Delete",
        N0 => "0",
        N1 => "1",
        N2 => "2",
        N3 => "3",
        N4 => "4",
        N5 => "5",
        N6 => "6",
        N7 => "7",
        N8 => "8",
        N9 => "9",
        A => "A",
        B => "B",
        C => "C",
        D => "D",
        E => "E",
        F => "F",
        G => "G",
        H => "H",
        I => "I",
        J => "J",
        K => "K",
        L => "L",
        M => "M",
        N => "N",
        O => "O",
        P => "P",
        Q => "Q",
        R => "R",
        S => "S",
        T => "T",
        U => "U",
        V => "V",
        W => "W",
        X => "X",
        Y => "Y",
        Z => "Z",
        NUMPAD0 => "Numpad0",
        NUMPAD1 => "Numpad1",
        NUMPAD2 => "Numpad2",
        NUMPAD3 => "Numpad3",
        NUMPAD4 => "Numpad4",
        NUMPAD5 => "Numpad5",
        NUMPAD6 => "Numpad6",
        NUMPAD7 => "Numpad7",
        NUMPAD8 => "Numpad8",
        NUMPAD9 => "Numpad9",
        MULTIPLY => "Multiply",
        ADD => "Add",
        SEPARATOR => "Separator",
        SUBTRACT => "Subtract",
        DECIMAL => "Decimal",
        DIVIDE => "Divide",
        F1 => "F1",
        F2 => "F2",
        F3 => "F3",
        F4 => "F4",
        F5 => "F5",
        F6 => "F6",
        F7 => "F7",
        F8 => "F8",
        F9 => "F9",
        F10 => "F10",
        F11 => "F11",
        F12 => "F12",
        LSHIFT => "LShift",
        RSHIFT => "RShift",
        LCONTROL => "LCtrl",
        RCONTROL => "RCtrl",
        LMENU => "LAlt",
        RMENU => "RAlt",
        OEM_1 => "Semicolon",
        OEM_PLUS => "Plus",
        OEM_COMMA => "Comma",
        OEM_MINUS => "Minus",
        OEM_PERIOD => "Period",
        OEM_2 => "Slash",
        OEM_3 => "Grave",
        OEM_4 => "LeftBracket",
        OEM_5 => "Backslash",
        OEM_6 => "RightBracket",
        OEM_7 => "Quote",
        OEM_8 => "Oem8",
        _ => return None,
    };
    Some(s)
}

/// Resolve a key name to its code. Case-insensitive; accepts the aliases
/// used by the hotkey grammar as well as single-character spellings for
/// letters, digits and punctuation.
pub fn from_name(token: &str) -> Option<u16> {
    // Single-character spellings first.
    let mut chars = token.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        match c.to_ascii_uppercase() {
            'A'..='Z' => return Some(A + (c.to_ascii_uppercase() as u16 - 'A' as u16)),
            '0'..='9' => return Some(N0 + (c as u16 - '0' as u16)),
            '=' => return Some(OEM_PLUS),
            '-' => return Some(OEM_MINUS),
            ',' => return Some(OEM_COMMA),
            '.' => return Some(OEM_PERIOD),
            ';' => return Some(OEM_1),
            '/' => return Some(OEM_2),
            '`' => return Some(OEM_3),
            '[' => return Some(OEM_4),
            '\\' => return Some(OEM_5),
            ']' => return Some(OEM_6),
            '\'' => return Some(OEM_7),
            _ => {}
        }
    }

    let code = match token.to_ascii_lowercase().as_str() {
        "space" => SPACE,
        "enter" | "return" => RETURN,
        "tab" => TAB,
        "backspace" | "back" => BACK,
        "delete" | "del" => DELETE,
        "escape" | "esc" => ESCAPE,
        "capslock" | "caps" | "capital" => CAPITAL,
        "insert" | "ins" => INSERT,
        "home" => HOME,
        "end" => END,
        "pageup" | "pgup" | "prior" => PRIOR,
        "pagedown" | "pgdn" | "next" => NEXT,
        "left" => LEFT,
        "up" => UP,
        "right" => RIGHT,
        "down" => DOWN,
        "pause" => PAUSE,
        "plus" => OEM_PLUS,
        "minus" => OEM_MINUS,
        "comma" => OEM_COMMA,
        "period" => OEM_PERIOD,
        "semicolon" => OEM_1,
        "slash" => OEM_2,
        "grave" => OEM_3,
        "leftbracket" | "lbracket" => OEM_4,
        "backslash" => OEM_5,
        "rightbracket" | "rbracket" => OEM_6,
        "quote" | "apostrophe" => OEM_7,
        "f1" => F1,
        "f2" => F2,
        "f3" => F3,
        "f4" => F4,
        "f5" => F5,
        "f6" => F6,
        "f7" => F7,
        "f8" => F8,
        "f9" => F9,
        "f10" => F10,
        "f11" => F11,
        "f12" => F12,
        "numpad0" => NUMPAD0,
        "numpad1" => NUMPAD1,
        "numpad2" => NUMPAD2,
        "numpad3" => NUMPAD3,
        "numpad4" => NUMPAD4,
        "numpad5" => NUMPAD5,
        "numpad6" => NUMPAD6,
        "numpad7" => NUMPAD7,
        "numpad8" => NUMPAD8,
        "numpad9" => NUMPAD9,
        _ => return None,
    };
    Some(code)
}
