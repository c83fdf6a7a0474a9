//! Shared test helpers - keyboard byte-image builder and fixture layouts.
//!
//! The builder produces real `.km2` byte images so every integration test
//! also exercises the loader.

#![allow(dead_code)]

use kmflow_core::km2::format::{
    OP_AND, OP_ANY, OP_ANYOF, OP_MODIFIER, OP_NANYOF, OP_PREDEFINED, OP_REFERENCE, OP_STRING,
    OP_SWITCH, OP_VARIABLE,
};

// ============================================================
// Opcode composers
// ============================================================

/// Literal STRING opcode run.
pub fn s(text: &str) -> Vec<u16> {
    let units: Vec<u16> = text.encode_utf16().collect();
    let mut words = vec![OP_STRING, units.len() as u16];
    words.extend(units);
    words
}

pub fn var(index: u16) -> Vec<u16> {
    vec![OP_VARIABLE, index]
}

pub fn var_anyof(index: u16) -> Vec<u16> {
    vec![OP_VARIABLE, index, OP_MODIFIER, OP_ANYOF]
}

pub fn var_nanyof(index: u16) -> Vec<u16> {
    vec![OP_VARIABLE, index, OP_MODIFIER, OP_NANYOF]
}

/// RHS indexed lookup: one unit of variable `index`, selected by capture
/// `capture_ref`.
pub fn var_indexed(index: u16, capture_ref: u16) -> Vec<u16> {
    vec![OP_VARIABLE, index, OP_MODIFIER, capture_ref]
}

pub fn any() -> Vec<u16> {
    vec![OP_ANY]
}

pub fn switch(state_id: u16) -> Vec<u16> {
    vec![OP_SWITCH, state_id]
}

pub fn reference(n: u16) -> Vec<u16> {
    vec![OP_REFERENCE, n]
}

/// RHS NULL marker (clear output).
pub fn null() -> Vec<u16> {
    vec![OP_PREDEFINED, 1]
}

/// Virtual-key combination: AND followed by one PREDEFINED per key.
pub fn combo(vks: &[u16]) -> Vec<u16> {
    let mut words = vec![OP_AND];
    for &vk in vks {
        words.push(OP_PREDEFINED);
        words.push(vk);
    }
    words
}

/// Concatenate opcode runs into one rule side.
pub fn seq(parts: &[&[u16]]) -> Vec<u16> {
    parts.iter().flat_map(|p| p.iter().copied()).collect()
}

// ============================================================
// Byte-image builder
// ============================================================

pub struct Km2Builder {
    minor: u8,
    options: [u8; 5], // trackCaps, autoBksp, eat, posBased, rightAlt
    strings: Vec<Vec<u16>>,
    infos: Vec<([u8; 4], Vec<u8>)>,
    rules: Vec<(Vec<u16>, Vec<u16>)>,
}

impl Km2Builder {
    pub fn new() -> Self {
        Self {
            minor: 5,
            options: [1, 0, 0, 0, 1],
            strings: Vec::new(),
            infos: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn minor(mut self, minor: u8) -> Self {
        self.minor = minor;
        self
    }

    pub fn auto_bksp(mut self, on: bool) -> Self {
        self.options[1] = u8::from(on);
        self
    }

    pub fn eat(mut self, on: bool) -> Self {
        self.options[2] = u8::from(on);
        self
    }

    pub fn right_alt(mut self, on: bool) -> Self {
        self.options[4] = u8::from(on);
        self
    }

    /// Append a string-table entry. Entries are referenced 1-based in
    /// file order.
    pub fn string(mut self, text: &str) -> Self {
        self.strings.push(text.encode_utf16().collect());
        self
    }

    pub fn info(mut self, id: [u8; 4], data: &[u8]) -> Self {
        self.infos.push((id, data.to_vec()));
        self
    }

    pub fn rule(mut self, lhs: Vec<u16>, rhs: Vec<u16>) -> Self {
        self.rules.push((lhs, rhs));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(b"KMKL");
        b.push(1);
        b.push(self.minor);
        b.extend_from_slice(&(self.strings.len() as u16).to_le_bytes());
        if self.minor >= 4 {
            b.extend_from_slice(&(self.infos.len() as u16).to_le_bytes());
        }
        b.extend_from_slice(&(self.rules.len() as u16).to_le_bytes());
        match self.minor {
            5 => {
                b.extend_from_slice(&self.options);
                b.push(0); // header padding
            }
            _ => b.extend_from_slice(&self.options[..4]),
        }

        for units in &self.strings {
            b.extend_from_slice(&(units.len() as u16).to_le_bytes());
            for u in units {
                b.extend_from_slice(&u.to_le_bytes());
            }
        }

        if self.minor >= 4 {
            for (id, data) in &self.infos {
                b.extend_from_slice(id);
                b.extend_from_slice(&(data.len() as u16).to_le_bytes());
                b.extend_from_slice(data);
            }
        }

        for (lhs, rhs) in &self.rules {
            for side in [lhs, rhs] {
                b.extend_from_slice(&(side.len() as u16).to_le_bytes());
                for w in side {
                    b.extend_from_slice(&w.to_le_bytes());
                }
            }
        }

        b
    }
}

impl Default for Km2Builder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================
// Fixture layouts
// ============================================================

/// A small Myanmar layout: letter keys map to Myanmar characters, plus
/// the visual-order fix that reorders a typed vowel sign E before its
/// consonant.
pub fn myanmar_layout() -> Km2Builder {
    Km2Builder::new()
        .info(*b"eman", "Myanmar Test".as_bytes())
        // Typed E vowel sign reorders around a following consonant key.
        .rule(s("\u{1031}u"), s("\u{1000}\u{1031}"))
        .rule(s("u"), s("\u{1000}")) // က
        .rule(s("i"), s("\u{1004}")) // င
        .rule(s("a"), s("\u{1031}")) // ေ
        .rule(s("s"), s("\u{103B}")) // ျ
        .rule(s("l"), s("\u{1030}")) // ူ
        .rule(s("r"), s("\u{1019}")) // မ
        .rule(s("j"), s("\u{103C}")) // ြ
        .rule(s("d"), s("\u{102D}")) // ိ
        .rule(s("k"), s("\u{102F}")) // ု
        .rule(s("h"), s("\u{1037}")) // ့
        .rule(s("p"), s("\u{1005}")) // စ
        .rule(s("F"), s("\u{1039}")) // ္ stack marker
}

/// Feed a string of characters through the engine, returning the last
/// output.
pub fn type_chars(
    engine: &mut kmflow_core::Engine,
    chars: &str,
) -> kmflow_core::EngineOutput {
    let mut last = None;
    for ch in chars.chars() {
        last = Some(
            engine
                .process_key(kmflow_core::KeyInput::from_char(ch))
                .expect("keyboard is loaded"),
        );
    }
    last.expect("at least one character")
}
