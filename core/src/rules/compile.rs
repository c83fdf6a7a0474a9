//! Compiled rules - classification, priority and ordering.
//!
//! Priority puts state-gated rules first, then key-combination rules, then
//! plain text rules, longer patterns before shorter ones. Ties fall back to
//! the rule's position in the file, so authors can rely on source order.

use tracing::warn;

use crate::km2::Km2File;
use crate::rules::segment::{segment_side, Segment, Side};

/// One rule after preprocessing, ready for the matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRule {
    /// Position in the keyboard file, the stable tie-break.
    pub original_index: usize,
    pub lhs: Vec<Segment>,
    pub rhs: Vec<Segment>,
    /// All SWITCH preconditions; every listed state must be active.
    pub state_ids: Vec<usize>,
    /// The single virtual-key combination, in file order.
    pub key_combo: Vec<u16>,
    /// Concatenated literal characters, kept for metrics only.
    pub pattern_text: Vec<u16>,
    /// Total code units the textual pattern consumes.
    pub pattern_char_length: usize,
    pub priority: u32,
}

impl CompiledRule {
    pub fn has_states(&self) -> bool {
        !self.state_ids.is_empty()
    }

    pub fn has_key_combo(&self) -> bool {
        !self.key_combo.is_empty()
    }

    /// True when the LHS has segments that consume composing text.
    pub fn has_textual_lhs(&self) -> bool {
        self.lhs.iter().any(Segment::is_textual)
    }
}

/// Code units one LHS segment consumes during matching.
pub fn segment_length(segment: &Segment, file: &Km2File) -> usize {
    match segment {
        Segment::String(units) => units.len(),
        Segment::Variable(v) => file.string(*v).map_or(0, <[u16]>::len),
        Segment::AnyOf(_) | Segment::NotAnyOf(_) | Segment::Any => 1,
        _ => 0,
    }
}

fn priority(state_count: usize, vk_count: usize, char_length: usize) -> u32 {
    let state_count = state_count as u32;
    let vk_count = vk_count as u32;
    let char_length = char_length as u32;
    if state_count > 0 {
        1000 + 100 * state_count + 10 * vk_count + char_length
    } else if vk_count > 0 {
        500 + 10 * vk_count + char_length
    } else {
        char_length
    }
}

/// Segment, classify and sort every rule of a loaded keyboard.
///
/// Rules with more than one virtual-key combination are unmatchable by
/// construction and are dropped here.
pub fn compile(file: &Km2File) -> Vec<CompiledRule> {
    let mut compiled: Vec<CompiledRule> = Vec::with_capacity(file.rules.len());

    for (original_index, rule) in file.rules.iter().enumerate() {
        let lhs = segment_side(&rule.lhs, Side::Lhs);
        let rhs = segment_side(&rule.rhs, Side::Rhs);

        let state_ids: Vec<usize> = lhs
            .iter()
            .filter_map(|s| match s {
                Segment::State(id) => Some(*id),
                _ => None,
            })
            .collect();

        let mut combos = lhs.iter().filter_map(|s| match s {
            Segment::VirtualKeys(vks) => Some(vks.clone()),
            _ => None,
        });
        let key_combo = combos.next().unwrap_or_default();
        if combos.next().is_some() {
            warn!(rule = original_index, "multiple key combinations, rule dropped");
            continue;
        }

        let pattern_text: Vec<u16> = lhs
            .iter()
            .filter_map(|s| match s {
                Segment::String(units) => Some(units.as_slice()),
                _ => None,
            })
            .flatten()
            .copied()
            .collect();

        let pattern_char_length: usize = lhs.iter().map(|s| segment_length(s, file)).sum();
        let priority = priority(state_ids.len(), key_combo.len(), pattern_char_length);

        compiled.push(CompiledRule {
            original_index,
            lhs,
            rhs,
            state_ids,
            key_combo,
            pattern_text,
            pattern_char_length,
            priority,
        });
    }

    // State-bearing rules strictly before the rest; higher priority first;
    // source order breaks ties.
    compiled.sort_by(|a, b| {
        b.has_states()
            .cmp(&a.has_states())
            .then_with(|| b.priority.cmp(&a.priority))
            .then_with(|| a.original_index.cmp(&b.original_index))
    });

    compiled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::km2::file::{FileHeader, LayoutOptions, Rule};
    use crate::km2::format::{OP_AND, OP_PREDEFINED, OP_STRING, OP_SWITCH, OP_VARIABLE};
    use crate::text;

    fn keyboard(strings: &[&str], rules: Vec<Rule>) -> Km2File {
        Km2File {
            header: FileHeader {
                major_version: 1,
                minor_version: 5,
                string_count: strings.len() as u16,
                info_count: 0,
                rule_count: rules.len() as u16,
                layout_options: LayoutOptions::default(),
            },
            strings: strings.iter().map(|s| text::to_utf16(s)).collect(),
            info: vec![],
            rules,
        }
    }

    fn string_rule(lhs_text: &str, rhs_text: &str) -> Rule {
        let mut lhs = vec![OP_STRING, lhs_text.encode_utf16().count() as u16];
        lhs.extend(lhs_text.encode_utf16());
        let mut rhs = vec![OP_STRING, rhs_text.encode_utf16().count() as u16];
        rhs.extend(rhs_text.encode_utf16());
        Rule { lhs, rhs }
    }

    #[test]
    fn test_priority_formula() {
        assert_eq!(priority(0, 0, 3), 3);
        assert_eq!(priority(0, 2, 1), 500 + 20 + 1);
        assert_eq!(priority(1, 0, 0), 1000 + 100);
        assert_eq!(priority(2, 1, 4), 1000 + 200 + 10 + 4);
    }

    #[test]
    fn test_pattern_char_length_sums_segments() {
        // var #1 = "abc" (3 units), plus a 2-unit literal and a wildcard.
        let mut lhs = vec![OP_VARIABLE, 1, OP_STRING, 2, 0x0078, 0x0079];
        lhs.push(crate::km2::format::OP_ANY);
        let kb = keyboard(&["abc"], vec![Rule { lhs, rhs: vec![] }]);
        let compiled = compile(&kb);
        assert_eq!(compiled[0].pattern_char_length, 6);
        assert_eq!(compiled[0].pattern_text, text::to_utf16("xy"));
    }

    #[test]
    fn test_sort_states_first_then_priority_then_source_order() {
        let plain_short = string_rule("a", "x"); // P = 1
        let plain_long = string_rule("aa", "y"); // P = 2
        let stated = Rule {
            lhs: vec![OP_SWITCH, 1, OP_STRING, 1, 0x0061],
            rhs: vec![],
        };
        let tied = string_rule("b", "z"); // P = 1, later in file

        let kb = keyboard(&[], vec![plain_short, plain_long, stated, tied]);
        let compiled = compile(&kb);

        assert_eq!(compiled[0].original_index, 2); // state rule first
        assert_eq!(compiled[1].original_index, 1); // longer pattern
        assert_eq!(compiled[2].original_index, 0); // tie: source order
        assert_eq!(compiled[3].original_index, 3);
    }

    #[test]
    fn test_vk_rule_between_state_and_plain() {
        let plain = string_rule("abcdef", "x"); // P = 6
        let vk = Rule {
            lhs: vec![OP_AND, OP_PREDEFINED, crate::keys::Q],
            rhs: vec![],
        };
        let kb = keyboard(&[], vec![plain, vk]);
        let compiled = compile(&kb);
        // VK rule: P = 510 beats any plain-length pattern.
        assert_eq!(compiled[0].original_index, 1);
        assert_eq!(compiled[0].key_combo, vec![crate::keys::Q]);
    }

    #[test]
    fn test_multiple_combos_dropped() {
        let bad = Rule {
            lhs: vec![
                OP_AND,
                OP_PREDEFINED,
                crate::keys::Q,
                OP_STRING,
                1,
                0x0061,
                OP_AND,
                OP_PREDEFINED,
                crate::keys::W,
            ],
            rhs: vec![],
        };
        let kb = keyboard(&[], vec![bad, string_rule("a", "b")]);
        let compiled = compile(&kb);
        assert_eq!(compiled.len(), 1);
        assert_eq!(compiled[0].original_index, 1);
    }

    #[test]
    fn test_state_ids_collects_all_switches() {
        let rule = Rule {
            lhs: vec![OP_SWITCH, 3, OP_SWITCH, 7, OP_STRING, 1, 0x0061],
            rhs: vec![],
        };
        let kb = keyboard(&[], vec![rule]);
        let compiled = compile(&kb);
        assert_eq!(compiled[0].state_ids, vec![3, 7]);
        assert_eq!(compiled[0].priority, 1000 + 200 + 1);
    }
}
