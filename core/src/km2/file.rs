//! In-memory model of a loaded keyboard file.
//!
//! The model is immutable after load and shared read-only with the rule
//! compiler and the matcher. Rules keep their raw opcode words here; the
//! typed form lives in [`crate::rules`].

use crate::km2::format;
use crate::text;

/// Header, upgraded to the v1.5 shape regardless of the on-disk version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub major_version: u8,
    pub minor_version: u8,
    pub string_count: u16,
    /// Always 0 for v1.3 files.
    pub info_count: u16,
    pub rule_count: u16,
    pub layout_options: LayoutOptions,
}

/// Layout behavior flags.
///
/// `right_alt` is absent before v1.5 and defaults to on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutOptions {
    pub track_caps: bool,
    pub auto_bksp: bool,
    pub eat: bool,
    pub pos_based: bool,
    pub right_alt: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            track_caps: true,
            auto_bksp: false,
            eat: false,
            pos_based: false,
            right_alt: true,
        }
    }
}

/// One info-table entry: a 4-byte tag and raw payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoEntry {
    pub id: [u8; 4],
    pub data: Vec<u8>,
}

/// One rule: both sides are raw little-endian opcode word streams,
/// validated by the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub lhs: Vec<u16>,
    pub rhs: Vec<u16>,
}

/// A fully loaded keyboard file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Km2File {
    pub header: FileHeader,
    /// String table as UTF-16 code units. Rules index this 1-based.
    pub strings: Vec<Vec<u16>>,
    pub info: Vec<InfoEntry>,
    pub rules: Vec<Rule>,
}

impl Km2File {
    /// String-table lookup by the 1-based index rules use.
    pub fn string(&self, one_based: usize) -> Option<&[u16]> {
        if one_based == 0 {
            return None;
        }
        self.strings.get(one_based - 1).map(Vec::as_slice)
    }

    /// Raw info payload for a tag.
    pub fn info(&self, id: [u8; 4]) -> Option<&[u8]> {
        self.info
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.data.as_slice())
    }

    fn info_text(&self, id: [u8; 4]) -> Option<String> {
        self.info(id)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Keyboard display name.
    pub fn name(&self) -> Option<String> {
        self.info_text(format::TAG_NAME)
    }

    /// Keyboard description.
    pub fn description(&self) -> Option<String> {
        self.info_text(format::TAG_DESCRIPTION)
    }

    /// Textual hotkey as authored (parse with [`crate::hotkey`]).
    pub fn hotkey_text(&self) -> Option<String> {
        self.info_text(format::TAG_HOTKEY)
    }

    /// Preferred display font family.
    pub fn font_family(&self) -> Option<String> {
        self.info_text(format::TAG_FONT)
    }

    /// Raw icon bytes (format is host-defined).
    pub fn icon(&self) -> Option<&[u8]> {
        self.info(format::TAG_ICON)
    }

    /// String-table entry decoded to UTF-8, for diagnostics.
    pub fn string_text(&self, one_based: usize) -> Option<String> {
        self.string(one_based).map(text::from_utf16_lossy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Km2File {
        Km2File {
            header: FileHeader {
                major_version: 1,
                minor_version: 5,
                string_count: 2,
                info_count: 1,
                rule_count: 0,
                layout_options: LayoutOptions::default(),
            },
            strings: vec![text::to_utf16("abc"), text::to_utf16("ABC")],
            info: vec![InfoEntry {
                id: format::TAG_NAME,
                data: b"Test Layout".to_vec(),
            }],
            rules: vec![],
        }
    }

    #[test]
    fn test_string_lookup_is_one_based() {
        let f = sample();
        assert_eq!(f.string(1), Some(text::to_utf16("abc").as_slice()));
        assert_eq!(f.string(2), Some(text::to_utf16("ABC").as_slice()));
        assert_eq!(f.string(0), None);
        assert_eq!(f.string(3), None);
    }

    #[test]
    fn test_metadata_accessors() {
        let f = sample();
        assert_eq!(f.name().as_deref(), Some("Test Layout"));
        assert_eq!(f.description(), None);
        assert_eq!(f.icon(), None);
    }

    #[test]
    fn test_default_options() {
        let o = LayoutOptions::default();
        assert!(o.track_caps);
        assert!(!o.auto_bksp);
        assert!(!o.eat);
        assert!(!o.pos_based);
        assert!(o.right_alt);
    }
}
