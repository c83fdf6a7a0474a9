//! Text codec - UTF-8 / UTF-16 conversions and character predicates.
//!
//! The engine works on UTF-16 code units throughout (the keyboard file
//! stores rule text as UTF-16, and edit actions report code-unit counts).
//! Hosts speak UTF-8, so the boundary converts in both directions here.
//!
//! Internally-built buffers are always valid UTF-16: typed characters are
//! appended as whole scalars and rule output comes from strings the loader
//! already decoded. Only data arriving from outside can be malformed, and
//! only those paths return [`Error::InvalidEncoding`].

use crate::error::{Error, Result};

/// Encode a string as UTF-16 code units.
pub fn to_utf16(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

/// Decode UTF-16 code units from an external source.
///
/// Fails with [`Error::InvalidEncoding`] on unpaired surrogates.
pub fn from_utf16(units: &[u16]) -> Result<String> {
    String::from_utf16(units).map_err(|_| Error::InvalidEncoding { encoding: "UTF-16" })
}

/// Decode UTF-16 code units the engine built itself.
///
/// Never panics; an unpaired surrogate (which the engine does not produce)
/// decodes as U+FFFD.
pub fn from_utf16_lossy(units: &[u16]) -> String {
    String::from_utf16_lossy(units)
}

/// Append one scalar to a UTF-16 buffer, emitting a surrogate pair for
/// characters above U+FFFF.
pub fn push_char(units: &mut Vec<u16>, ch: char) {
    let mut buf = [0u16; 2];
    units.extend_from_slice(ch.encode_utf16(&mut buf));
}

/// Encode one scalar as UTF-16 code units.
pub fn encode_char(ch: char) -> Vec<u16> {
    let mut units = Vec::with_capacity(2);
    push_char(&mut units, ch);
    units
}

/// The ANY wildcard character class: printable ASCII excluding space
/// (U+0021 ..= U+007E).
#[inline]
pub fn is_any_character(unit: u16) -> bool {
    (0x0021..=0x007E).contains(&unit)
}

/// True when `units` is exactly one printable ASCII character.
///
/// This is the recursion stop condition: a lone keystroke-sized buffer is
/// never re-matched.
#[inline]
pub fn is_single_ascii_printable(units: &[u16]) -> bool {
    units.len() == 1 && is_any_character(units[0])
}
