//! Hotkey text grammar.
//!
//! Keyboard files carry their activation hotkey as text ("Ctrl+Shift+M",
//! "alt space"). Parsing is case-insensitive, accepts `+` or whitespace as
//! separators, and requires exactly one non-modifier key.

use std::fmt;

use crate::keys;

/// A parsed hotkey: one key plus modifier flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hotkey {
    /// Internal key code from [`crate::keys`].
    pub key: u16,
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Parse hotkey text. Returns `None` on empty input, unknown tokens, or
/// zero / multiple non-modifier keys.
pub fn parse(text: &str) -> Option<Hotkey> {
    let mut key: Option<u16> = None;
    let mut shift = false;
    let mut ctrl = false;
    let mut alt = false;
    let mut meta = false;
    let mut seen_any = false;

    for token in text.split(|c: char| c == '+' || c.is_whitespace()) {
        if token.is_empty() {
            continue;
        }
        seen_any = true;
        match token.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => ctrl = true,
            "alt" | "option" => alt = true,
            "shift" => shift = true,
            "meta" | "cmd" | "command" | "win" | "super" => meta = true,
            _ => {
                let code = keys::from_name(token)?;
                if key.is_some() {
                    // Two non-modifier keys: not a hotkey.
                    return None;
                }
                key = Some(code);
            }
        }
    }

    if !seen_any {
        return None;
    }
    key.map(|key| Hotkey {
        key,
        shift,
        ctrl,
        alt,
        meta,
    })
}

impl fmt::Display for Hotkey {
    /// Canonical form: `Ctrl+Alt+Shift+Meta+<Key>`, only present modifiers
    /// listed. `parse(format!("{h}"))` reproduces `h`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            write!(f, "Ctrl+")?;
        }
        if self.alt {
            write!(f, "Alt+")?;
        }
        if self.shift {
            write!(f, "Shift+")?;
        }
        if self.meta {
            write!(f, "Meta+")?;
        }
        write!(f, "{}", keys::name(self.key).unwrap_or("Null"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Ctrl+Shift+M", keys::M, true, true, false, false)]
    #[case("ctrl+shift+m", keys::M, true, true, false, false)]
    #[case("ALT SPACE", keys::SPACE, false, false, true, false)]
    #[case("Cmd+K", keys::K, false, false, false, true)]
    #[case("super+F5", keys::F5, false, false, false, true)]
    #[case("Ctrl + =", keys::OEM_PLUS, false, true, false, false)]
    #[case("Enter", keys::RETURN, false, false, false, false)]
    fn test_parse(
        #[case] text: &str,
        #[case] key: u16,
        #[case] shift: bool,
        #[case] ctrl: bool,
        #[case] alt: bool,
        #[case] meta: bool,
    ) {
        let h = parse(text).unwrap();
        assert_eq!(h.key, key);
        assert_eq!(h.shift, shift);
        assert_eq!(h.ctrl, ctrl);
        assert_eq!(h.alt, alt);
        assert_eq!(h.meta, meta);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("Ctrl+Shift")] // no key
    #[case("A+B")] // two keys
    #[case("Ctrl+Bogus")]
    fn test_parse_rejects(#[case] text: &str) {
        assert!(parse(text).is_none());
    }

    #[test]
    fn test_display_roundtrip() {
        for text in ["Ctrl+Shift+M", "Alt+Space", "Ctrl+Alt+Shift+Meta+F12", "K"] {
            let h = parse(text).unwrap();
            assert_eq!(parse(&h.to_string()), Some(h));
        }
        assert_eq!(parse("control+m").unwrap().to_string(), "Ctrl+M");
    }
}
