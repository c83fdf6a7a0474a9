//! Opcode walker - raw rule words to typed segments.
//!
//! Each segment is one logical unit of a rule side. The walker is
//! deliberately forgiving: the loader has already validated operand counts
//! and references, so anything still out of place here (a stray modifier,
//! an empty key combination) is dropped rather than surfaced.

use crate::km2::format::{
    OP_AND, OP_ANY, OP_ANYOF, OP_MODIFIER, OP_NANYOF, OP_PREDEFINED, OP_REFERENCE, OP_STRING,
    OP_SWITCH, OP_VARIABLE,
};

/// Which rule side is being segmented. A few encodings are only meaningful
/// on one side (indexed variable lookup and NULL on the right, key
/// combinations on the left).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Lhs,
    Rhs,
}

/// One typed unit of a rule side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal UTF-16 run.
    String(Vec<u16>),
    /// Whole string-table entry (1-based index).
    Variable(usize),
    /// RHS only: one code unit of a variable, selected by the position of
    /// the capture `index_ref` points at.
    VariableIndexed { var: usize, index_ref: usize },
    /// Character class: any code unit of the variable.
    AnyOf(usize),
    /// Character class: any character not in the variable.
    NotAnyOf(usize),
    /// Single printable-ASCII wildcard.
    Any,
    /// LHS: state precondition. RHS: state activation.
    State(usize),
    /// Virtual-key combination (one AND group).
    VirtualKeys(Vec<u16>),
    /// RHS back-reference to an LHS capture (1-based).
    Reference(usize),
    /// RHS: discard output accumulated so far.
    Null,
}

impl Segment {
    /// True for segments the matcher walks over text (and therefore the
    /// segments that receive capture indices).
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            Segment::String(_)
                | Segment::Variable(_)
                | Segment::AnyOf(_)
                | Segment::NotAnyOf(_)
                | Segment::Any
        )
    }
}

/// Walk one side's opcode words and emit segments.
pub fn segment_side(words: &[u16], side: Side) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut i = 0;
    while i < words.len() {
        match words[i] {
            OP_STRING => {
                let len = words.get(i + 1).copied().unwrap_or(0) as usize;
                let start = i + 2;
                let end = (start + len).min(words.len());
                segments.push(Segment::String(words[start..end].to_vec()));
                i = end;
            }
            OP_VARIABLE => {
                let var = words.get(i + 1).copied().unwrap_or(0) as usize;
                i += 2;
                // An immediately following MODIFIER refines the reference.
                if i + 1 < words.len() && words[i] == OP_MODIFIER {
                    let flag = words[i + 1];
                    i += 2;
                    match flag {
                        OP_ANYOF => segments.push(Segment::AnyOf(var)),
                        OP_NANYOF => segments.push(Segment::NotAnyOf(var)),
                        other => match side {
                            // Indexed lookup only means something on the
                            // output side; elsewhere the modifier is noise.
                            Side::Rhs => segments.push(Segment::VariableIndexed {
                                var,
                                index_ref: other as usize,
                            }),
                            Side::Lhs => segments.push(Segment::Variable(var)),
                        },
                    }
                } else {
                    segments.push(Segment::Variable(var));
                }
            }
            OP_ANY => {
                segments.push(Segment::Any);
                i += 1;
            }
            OP_SWITCH => {
                let state = words.get(i + 1).copied().unwrap_or(0) as usize;
                segments.push(Segment::State(state));
                i += 2;
            }
            OP_AND => {
                // Consume the whole run of PREDEFINED operands as one
                // combination.
                i += 1;
                let mut vks = Vec::new();
                while i + 1 < words.len() && words[i] == OP_PREDEFINED {
                    vks.push(words[i + 1]);
                    i += 2;
                }
                if !vks.is_empty() {
                    segments.push(Segment::VirtualKeys(vks));
                }
            }
            OP_PREDEFINED => {
                let value = words.get(i + 1).copied().unwrap_or(0);
                i += 2;
                match side {
                    // Bare PREDEFINED on the output side is the NULL
                    // marker; anything else there is illegal and dropped
                    // later by the generator.
                    Side::Rhs if value == 1 => segments.push(Segment::Null),
                    Side::Rhs => segments.push(Segment::VirtualKeys(vec![value])),
                    // On the left it can only have meant a combination.
                    Side::Lhs => segments.push(Segment::VirtualKeys(vec![value])),
                }
            }
            OP_REFERENCE => {
                let n = words.get(i + 1).copied().unwrap_or(0) as usize;
                segments.push(Segment::Reference(n));
                i += 2;
            }
            // Stray modifier words with nothing to modify.
            OP_MODIFIER => i += 2,
            OP_ANYOF | OP_NANYOF => i += 1,
            _ => i += 1,
        }
    }
    segments
}
