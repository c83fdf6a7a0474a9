//! Right-hand-side evaluation and edit-action generation.
//!
//! The generator folds RHS segments into a UTF-16 fragment plus the list
//! of states the rule activates. The edit action is a minimal diff between
//! the composing text before and after the key: common prefix kept, the
//! divergent tail deleted and re-inserted.

use tracing::warn;

use crate::km2::Km2File;
use crate::rules::Segment;
use crate::text;

use super::matcher::Capture;

/// What the host must do to its document, with counts in UTF-16 code
/// units and text in UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditAction {
    /// Nothing changed.
    None,
    /// Insert text at the caret.
    Insert(String),
    /// Delete `count` code units before the caret.
    Delete(usize),
    /// Delete `count` code units, then insert text.
    DeleteAndInsert(usize, String),
}

/// Result of processing one key event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOutput {
    pub action: EditAction,
    /// The full composing text after the event.
    pub composing: String,
    /// False when the engine did nothing and the host should let the key
    /// through untouched.
    pub is_processed: bool,
}

impl EngineOutput {
    pub(crate) fn pass_through(composing: String) -> Self {
        Self {
            action: EditAction::None,
            composing,
            is_processed: false,
        }
    }
}

/// Evaluate RHS segments against the captures of a successful match.
///
/// Returns the output fragment and the states to activate. Segments that
/// cannot be evaluated (dangling references, illegal RHS key codes) are
/// dropped, mirroring the loader's recovery posture.
pub fn generate(
    rhs: &[Segment],
    captures: &[Capture],
    file: &Km2File,
) -> (Vec<u16>, Vec<usize>) {
    let mut fragment: Vec<u16> = Vec::new();
    let mut new_states: Vec<usize> = Vec::new();

    let capture_by_index =
        |n: usize| captures.iter().find(|c| c.segment_index == n);

    for segment in rhs {
        match segment {
            Segment::String(units) => fragment.extend_from_slice(units),
            Segment::Variable(v) => {
                if let Some(var) = file.string(*v) {
                    fragment.extend_from_slice(var);
                }
            }
            Segment::VariableIndexed { var, index_ref } => {
                // The referenced capture's position picks one code unit of
                // the variable; out of range produces nothing.
                if let (Some(var), Some(capture)) =
                    (file.string(*var), capture_by_index(*index_ref))
                {
                    if let Some(&unit) = var.get(capture.position) {
                        fragment.push(unit);
                    }
                }
            }
            Segment::Reference(n) => {
                if let Some(capture) = capture_by_index(*n) {
                    fragment.extend_from_slice(&capture.text);
                }
            }
            Segment::State(id) => new_states.push(*id),
            Segment::Null => fragment.clear(),
            Segment::VirtualKeys(vks) => {
                // Only the NULL marker is legal on the output side; the
                // segmenter already folded that case, so whatever reaches
                // here is dropped.
                warn!(?vks, "key codes in rule output, ignored");
            }
            Segment::AnyOf(_) | Segment::NotAnyOf(_) | Segment::Any => {
                warn!("character class in rule output, ignored");
            }
        }
    }

    (fragment, new_states)
}

/// Diff two composing texts into the minimal edit action.
pub fn diff(old: &[u16], new: &[u16]) -> EditAction {
    if old == new {
        return EditAction::None;
    }
    let common = old
        .iter()
        .zip(new.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let delete = old.len() - common;
    let insert = &new[common..];

    if delete > 0 && insert.is_empty() {
        EditAction::Delete(delete)
    } else if delete == 0 {
        EditAction::Insert(text::from_utf16_lossy(insert))
    } else {
        EditAction::DeleteAndInsert(delete, text::from_utf16_lossy(insert))
    }
}
