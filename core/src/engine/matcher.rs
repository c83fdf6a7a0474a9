//! Suffix matcher - left-hand sides against composing text plus key event.
//!
//! Matching is anchored at the end of the text: a rule's textual pattern
//! consumes the trailing `L` code units of the match context, where `L` is
//! the sum of the per-segment lengths. State preconditions and the
//! virtual-key combination gate the attempt before any text is inspected.

use crate::keys;
use crate::km2::Km2File;
use crate::rules::compile::{segment_length, CompiledRule};
use crate::rules::Segment;
use crate::text;

use super::input::KeyInput;

/// One captured LHS segment.
///
/// `segment_index` is 1-based and counts only textual segments, which is
/// how RHS back-references address them. `position` is 0 except for an
/// any-of capture, where it records which alternative matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub segment_index: usize,
    pub text: Vec<u16>,
    pub position: usize,
}

/// Successful match: captures in segment order plus the number of trailing
/// code units the pattern consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub captures: Vec<Capture>,
    pub matched_length: usize,
}

/// Try one compiled rule against a match context.
///
/// `context` is the composing text, already extended with the typed
/// character when the caller decided that applies. `input` is `None`
/// during recursive re-matching.
pub fn match_rule(
    rule: &CompiledRule,
    context: &[u16],
    input: Option<&KeyInput>,
    active_states: &[usize],
    file: &Km2File,
) -> Option<RuleMatch> {
    // A rule with no left side at all would match every event; the file
    // format permits the encoding, matching rejects it.
    if rule.lhs.is_empty() {
        return None;
    }

    // State gate: every precondition must be active.
    if !rule.state_ids.iter().all(|id| active_states.contains(id)) {
        return None;
    }

    // Virtual-key gate.
    if rule.has_key_combo() {
        let input = input?;
        if !combo_matches(&rule.key_combo, input) {
            return None;
        }
    }

    if !rule.has_textual_lhs() {
        // Pure state/VK precondition rules consume no text.
        return Some(RuleMatch {
            captures: Vec::new(),
            matched_length: 0,
        });
    }

    let needed: usize = rule.lhs.iter().map(|s| segment_length(s, file)).sum();
    if context.len() < needed {
        return None;
    }
    let suffix = &context[context.len() - needed..];

    let mut captures = Vec::new();
    let mut pos = 0usize;
    let mut segment_index = 0usize;

    for segment in &rule.lhs {
        if !segment.is_textual() {
            continue;
        }
        segment_index += 1;
        match segment {
            Segment::String(units) => {
                if !suffix[pos..].starts_with(units) {
                    return None;
                }
                captures.push(Capture {
                    segment_index,
                    text: units.clone(),
                    position: 0,
                });
                pos += units.len();
            }
            Segment::Variable(v) => {
                let var = file.string(*v)?;
                if !suffix[pos..].starts_with(var) {
                    return None;
                }
                captures.push(Capture {
                    segment_index,
                    text: var.to_vec(),
                    position: 0,
                });
                pos += var.len();
            }
            Segment::AnyOf(v) => {
                let var = file.string(*v)?;
                let unit = suffix[pos];
                let position = var.iter().position(|&u| u == unit)?;
                captures.push(Capture {
                    segment_index,
                    text: vec![unit],
                    position,
                });
                pos += 1;
            }
            Segment::NotAnyOf(v) => {
                let var = file.string(*v)?;
                let unit = suffix[pos];
                if var.contains(&unit) {
                    return None;
                }
                captures.push(Capture {
                    segment_index,
                    text: vec![unit],
                    position: 0,
                });
                pos += 1;
            }
            Segment::Any => {
                let unit = suffix[pos];
                if !text::is_any_character(unit) {
                    return None;
                }
                captures.push(Capture {
                    segment_index,
                    text: vec![unit],
                    position: 0,
                });
                pos += 1;
            }
            _ => unreachable!("non-textual segments filtered above"),
        }
    }

    if pos != needed {
        return None;
    }

    Some(RuleMatch {
        captures,
        matched_length: needed,
    })
}

/// Match every key of a combination against the input: modifier keys test
/// the corresponding flag, anything else must equal the input's key code.
fn combo_matches(combo: &[u16], input: &KeyInput) -> bool {
    combo.iter().all(|&code| match code {
        keys::SHIFT | keys::LSHIFT | keys::RSHIFT => input.modifiers.shift,
        keys::CONTROL | keys::LCONTROL | keys::RCONTROL => input.modifiers.ctrl,
        keys::MENU | keys::LMENU | keys::RMENU => input.modifiers.alt,
        other => input.vk == other,
    })
}
