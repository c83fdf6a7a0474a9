//! Binary keyboard file reader.
//!
//! Parsing order is header, strings, info (v1.4+), rules. All integers are
//! little-endian. Validation happens eagerly while parsing: every rule word
//! stream is checked for operand counts, in-range string references and
//! known opcodes, so downstream stages can assume well-formed data.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use tracing::debug;

use crate::error::{Error, Result};
use crate::km2::file::{FileHeader, InfoEntry, Km2File, LayoutOptions, Rule};
use crate::km2::format::{
    opcode_name, MAGIC, MAJOR_VERSION, OP_AND, OP_ANY, OP_ANYOF, OP_MODIFIER, OP_NANYOF,
    OP_PREDEFINED, OP_REFERENCE, OP_STRING, OP_SWITCH, OP_VARIABLE,
};
use crate::text;

/// Load a keyboard from disk.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<Km2File> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| Error::FileNotFound {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_memory(&bytes)
}

/// Load a keyboard from an in-memory byte image.
pub fn load_from_memory(bytes: &[u8]) -> Result<Km2File> {
    Parser::new(bytes).parse()
}

/// Check a byte image without keeping the parsed model.
pub fn validate(bytes: &[u8]) -> Result<()> {
    load_from_memory(bytes).map(|_| ())
}

/// Check a file on disk without keeping the parsed model.
pub fn validate_file(path: impl AsRef<Path>) -> Result<()> {
    load_from_file(path).map(|_| ())
}

struct Parser<'a> {
    cur: Cursor<&'a [u8]>,
}

impl<'a> Parser<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            cur: Cursor::new(bytes),
        }
    }

    fn offset(&self) -> u64 {
        self.cur.position()
    }

    fn read_u8(&mut self, what: &str) -> Result<u8> {
        let at = self.offset();
        self.cur
            .read_u8()
            .map_err(|_| Error::format(at, format!("unexpected end of file reading {what}")))
    }

    fn read_u16(&mut self, what: &str) -> Result<u16> {
        let at = self.offset();
        self.cur
            .read_u16::<LittleEndian>()
            .map_err(|_| Error::format(at, format!("unexpected end of file reading {what}")))
    }

    fn read_bytes(&mut self, len: usize, what: &str) -> Result<Vec<u8>> {
        let at = self.offset();
        let start = at as usize;
        let end = start
            .checked_add(len)
            .filter(|&e| e <= self.cur.get_ref().len())
            .ok_or_else(|| {
                Error::format(at, format!("unexpected end of file reading {what}"))
            })?;
        let result = self.cur.get_ref()[start..end].to_vec();
        self.cur.set_position(end as u64);
        Ok(result)
    }

    fn read_words(&mut self, count: usize, what: &str) -> Result<Vec<u16>> {
        let mut words = Vec::with_capacity(count);
        for _ in 0..count {
            words.push(self.read_u16(what)?);
        }
        Ok(words)
    }

    fn parse(mut self) -> Result<Km2File> {
        let header = self.parse_header()?;
        let strings = self.parse_strings(header.string_count)?;
        let info = self.parse_info(header.info_count)?;
        let rules = self.parse_rules(header.rule_count, header.string_count)?;

        debug!(
            version = format_args!("{}.{}", header.major_version, header.minor_version),
            strings = strings.len(),
            info = info.len(),
            rules = rules.len(),
            "keyboard file loaded"
        );

        Ok(Km2File {
            header,
            strings,
            info,
            rules,
        })
    }

    fn parse_header(&mut self) -> Result<FileHeader> {
        let magic = self.read_bytes(4, "magic")?;
        if magic != MAGIC {
            return Err(Error::format(0, "bad magic, not a keyboard file"));
        }
        let major_version = self.read_u8("major version")?;
        let minor_version = self.read_u8("minor version")?;
        if major_version != MAJOR_VERSION {
            return Err(Error::UnsupportedVersion {
                major: major_version,
                minor: minor_version,
            });
        }

        // v1.5 carries rightAlt plus one padding byte; v1.4 drops both;
        // v1.3 additionally has no info table. Older layouts upgrade to the
        // v1.5 in-memory shape with rightAlt defaulted on.
        let header = match minor_version {
            5 => {
                let string_count = self.read_u16("string count")?;
                let info_count = self.read_u16("info count")?;
                let rule_count = self.read_u16("rule count")?;
                let layout_options = self.parse_options(true)?;
                let _pad = self.read_u8("header padding")?;
                FileHeader {
                    major_version,
                    minor_version,
                    string_count,
                    info_count,
                    rule_count,
                    layout_options,
                }
            }
            4 => {
                let string_count = self.read_u16("string count")?;
                let info_count = self.read_u16("info count")?;
                let rule_count = self.read_u16("rule count")?;
                let layout_options = self.parse_options(false)?;
                FileHeader {
                    major_version,
                    minor_version,
                    string_count,
                    info_count,
                    rule_count,
                    layout_options,
                }
            }
            3 => {
                let string_count = self.read_u16("string count")?;
                let rule_count = self.read_u16("rule count")?;
                let layout_options = self.parse_options(false)?;
                FileHeader {
                    major_version,
                    minor_version,
                    string_count,
                    info_count: 0,
                    rule_count,
                    layout_options,
                }
            }
            _ => {
                return Err(Error::UnsupportedVersion {
                    major: major_version,
                    minor: minor_version,
                })
            }
        };
        Ok(header)
    }

    fn parse_options(&mut self, has_right_alt: bool) -> Result<LayoutOptions> {
        let track_caps = self.read_u8("trackCaps option")? != 0;
        let auto_bksp = self.read_u8("autoBksp option")? != 0;
        let eat = self.read_u8("eat option")? != 0;
        let pos_based = self.read_u8("posBased option")? != 0;
        let right_alt = if has_right_alt {
            self.read_u8("rightAlt option")? != 0
        } else {
            true
        };
        Ok(LayoutOptions {
            track_caps,
            auto_bksp,
            eat,
            pos_based,
            right_alt,
        })
    }

    fn parse_strings(&mut self, count: u16) -> Result<Vec<Vec<u16>>> {
        let mut strings = Vec::with_capacity(count as usize);
        for index in 0..count {
            let at = self.offset();
            let len = self.read_u16("string length")?;
            let units = self.read_words(len as usize, "string data")?;
            // Reject unpaired surrogates here so everything downstream can
            // treat table entries as valid UTF-16.
            if text::from_utf16(&units).is_err() {
                return Err(Error::format(
                    at,
                    format!("string {} is not valid UTF-16", index + 1),
                ));
            }
            strings.push(units);
        }
        Ok(strings)
    }

    fn parse_info(&mut self, count: u16) -> Result<Vec<InfoEntry>> {
        let mut info = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let id_bytes = self.read_bytes(4, "info tag")?;
            let id = [id_bytes[0], id_bytes[1], id_bytes[2], id_bytes[3]];
            let len = self.read_u16("info length")?;
            let data = self.read_bytes(len as usize, "info data")?;
            info.push(InfoEntry { id, data });
        }
        Ok(info)
    }

    fn parse_rules(&mut self, count: u16, string_count: u16) -> Result<Vec<Rule>> {
        let mut rules = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let lhs = self.parse_side(string_count)?;
            let rhs = self.parse_side(string_count)?;
            rules.push(Rule { lhs, rhs });
        }
        Ok(rules)
    }

    /// Read one rule side: a word count followed by that many opcode words.
    /// The count is in uint16 words, not bytes. An empty side is legal.
    fn parse_side(&mut self, string_count: u16) -> Result<Vec<u16>> {
        let len = self.read_u16("rule side length")?;
        let base = self.offset();
        let words = self.read_words(len as usize, "rule opcodes")?;
        validate_side(&words, string_count, base)?;
        Ok(words)
    }
}

/// Opcode-stream validation. `base` is the byte offset of the first word,
/// used to report the exact location of a violation.
fn validate_side(words: &[u16], string_count: u16, base: u64) -> Result<()> {
    let at = |word_index: usize| base + (word_index as u64) * 2;
    let mut i = 0;
    while i < words.len() {
        let op = words[i];
        match op {
            OP_STRING => {
                let len = *words.get(i + 1).ok_or_else(|| {
                    Error::format(at(i), "STRING missing length operand")
                })? as usize;
                if i + 2 + len > words.len() {
                    return Err(Error::format(
                        at(i),
                        format!("STRING declares {len} characters but the side ends early"),
                    ));
                }
                i += 2 + len;
            }
            OP_VARIABLE => {
                let var = *words.get(i + 1).ok_or_else(|| {
                    Error::format(at(i), "VARIABLE missing index operand")
                })?;
                if var == 0 || var > string_count {
                    return Err(Error::format(
                        at(i + 1),
                        format!("variable index {var} outside [1, {string_count}]"),
                    ));
                }
                i += 2;
            }
            OP_REFERENCE | OP_PREDEFINED | OP_MODIFIER | OP_SWITCH => {
                if i + 1 >= words.len() {
                    let name = opcode_name(op).unwrap_or("opcode");
                    return Err(Error::format(at(i), format!("{name} missing operand")));
                }
                i += 2;
            }
            // ANYOF / NANYOF normally ride as MODIFIER operands; standalone
            // occurrences are legal words that later stages ignore.
            OP_AND | OP_ANY | OP_ANYOF | OP_NANYOF => i += 1,
            other => {
                return Err(Error::format(
                    at(i),
                    format!("unknown opcode 0x{other:04X}"),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimal hand-rolled byte images; integration tests use the richer
    // builder in tests/common.

    fn header_v15(strings: u16, infos: u16, rules: u16) -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(b"KMKL");
        b.push(1);
        b.push(5);
        b.extend_from_slice(&strings.to_le_bytes());
        b.extend_from_slice(&infos.to_le_bytes());
        b.extend_from_slice(&rules.to_le_bytes());
        b.extend_from_slice(&[1, 0, 0, 0, 1]); // trackCaps .. rightAlt
        b.push(0); // padding
        b
    }

    fn push_side(b: &mut Vec<u8>, words: &[u16]) {
        b.extend_from_slice(&(words.len() as u16).to_le_bytes());
        for w in words {
            b.extend_from_slice(&w.to_le_bytes());
        }
    }

    #[test]
    fn test_empty_keyboard() {
        let b = header_v15(0, 0, 0);
        let f = load_from_memory(&b).unwrap();
        assert_eq!(f.header.minor_version, 5);
        assert!(f.strings.is_empty());
        assert!(f.rules.is_empty());
    }

    #[test]
    fn test_bad_magic() {
        let mut b = header_v15(0, 0, 0);
        b[0] = b'X';
        let err = load_from_memory(&b).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat { offset: 0, .. }));
    }

    #[test]
    fn test_unsupported_versions() {
        let mut b = header_v15(0, 0, 0);
        b[4] = 2;
        assert!(matches!(
            load_from_memory(&b).unwrap_err(),
            Error::UnsupportedVersion { major: 2, minor: 5 }
        ));

        let mut b = header_v15(0, 0, 0);
        b[5] = 6;
        assert!(matches!(
            load_from_memory(&b).unwrap_err(),
            Error::UnsupportedVersion { major: 1, minor: 6 }
        ));
    }

    #[test]
    fn test_truncated_header() {
        let full = header_v15(0, 0, 0);
        assert!(matches!(
            load_from_memory(&full[..10]).unwrap_err(),
            Error::InvalidFormat { .. }
        ));
    }

    #[test]
    fn test_unknown_opcode_rejected() {
        let mut b = header_v15(0, 0, 1);
        push_side(&mut b, &[0x00EE]);
        push_side(&mut b, &[]);
        let err = load_from_memory(&b).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("unknown opcode 0x00EE"), "{msg}");
    }

    #[test]
    fn test_string_overrun_rejected() {
        let mut b = header_v15(0, 0, 1);
        push_side(&mut b, &[OP_STRING, 5, 0x0061]); // declares 5, has 1
        push_side(&mut b, &[]);
        assert!(matches!(
            load_from_memory(&b).unwrap_err(),
            Error::InvalidFormat { .. }
        ));
    }

    #[test]
    fn test_variable_range_check() {
        // One string in the table, rule references #2.
        let mut b = header_v15(1, 0, 1);
        b.extend_from_slice(&1u16.to_le_bytes()); // string length
        b.extend_from_slice(&0x0061u16.to_le_bytes()); // "a"
        push_side(&mut b, &[OP_VARIABLE, 2]);
        push_side(&mut b, &[]);
        let err = load_from_memory(&b).unwrap_err();
        assert!(err.to_string().contains("outside [1, 1]"), "{err}");
    }

    #[test]
    fn test_modifier_forms_accepted() {
        let mut b = header_v15(1, 0, 1);
        b.extend_from_slice(&1u16.to_le_bytes());
        b.extend_from_slice(&0x0061u16.to_le_bytes());
        push_side(&mut b, &[OP_VARIABLE, 1, OP_MODIFIER, OP_ANYOF]);
        push_side(&mut b, &[OP_VARIABLE, 1, OP_MODIFIER, OP_NANYOF]);
        assert!(load_from_memory(&b).is_ok());
    }

    #[test]
    fn test_lone_surrogate_in_string_table() {
        let mut b = header_v15(1, 0, 0);
        b.extend_from_slice(&1u16.to_le_bytes());
        b.extend_from_slice(&0xD800u16.to_le_bytes());
        let err = load_from_memory(&b).unwrap_err();
        assert!(err.to_string().contains("not valid UTF-16"), "{err}");
    }

    #[test]
    fn test_repeated_load_is_idempotent() {
        let mut b = header_v15(1, 0, 1);
        b.extend_from_slice(&1u16.to_le_bytes());
        b.extend_from_slice(&0x1000u16.to_le_bytes());
        push_side(&mut b, &[OP_STRING, 1, 0x0075]);
        push_side(&mut b, &[OP_VARIABLE, 1]);
        let first = load_from_memory(&b).unwrap();
        let second = load_from_memory(&b).unwrap();
        assert_eq!(first, second);
    }
}
