//! Engine orchestration - one key event in, one edit action out.
//!
//! Per event: gate on a loaded keyboard, search the compiled rules in
//! priority order, apply the first hit (append the typed character,
//! replace the matched suffix, adopt the RHS states), then re-match
//! text-only rules until the composing text settles. Unmatched keys fall
//! back to backspace handling, the `eat` option, or a plain character
//! append. The emitted action is always the minimal diff between the
//! composing text before and after.

use std::path::Path;

use tracing::trace;

use crate::error::{Error, Result};
use crate::keys;
use crate::km2::{self, Km2File};
use crate::rules::{self, CompiledRule};
use crate::text;

use super::input::KeyInput;
use super::matcher::{match_rule, RuleMatch};
use super::output::{self, EditAction, EngineOutput};
use super::state::EngineState;

/// Hard cap on re-match passes after a rule application.
pub const MAX_RECURSION: usize = 100;

/// A loaded keyboard with its compiled rule order.
#[derive(Debug, Clone)]
struct Keyboard {
    file: Km2File,
    rules: Vec<CompiledRule>,
}

/// The keystroke-to-text engine.
///
/// Create empty, load a keyboard (any number of times; each load resets),
/// then feed key events. All processing is synchronous; one engine belongs
/// to one input context.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    keyboard: Option<Keyboard>,
    state: EngineState,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Keyboard lifecycle =====

    /// Load a keyboard from disk. Replaces any current keyboard and
    /// resets all state.
    pub fn load_keyboard_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let file = km2::load_from_file(path)?;
        self.set_keyboard(file);
        Ok(())
    }

    /// Load a keyboard from an in-memory byte image.
    pub fn load_keyboard_memory(&mut self, bytes: &[u8]) -> Result<()> {
        let file = km2::load_from_memory(bytes)?;
        self.set_keyboard(file);
        Ok(())
    }

    /// Install an already-parsed keyboard.
    pub fn set_keyboard(&mut self, file: Km2File) {
        let rules = rules::compile(&file);
        self.keyboard = Some(Keyboard { file, rules });
        self.state.reset();
    }

    pub fn has_keyboard(&self) -> bool {
        self.keyboard.is_some()
    }

    /// The loaded keyboard model, if any.
    pub fn keyboard(&self) -> Option<&Km2File> {
        self.keyboard.as_ref().map(|kb| &kb.file)
    }

    // ===== State access =====

    /// Current composing text as UTF-8.
    pub fn composing_text(&self) -> String {
        text::from_utf16_lossy(self.state.composing())
    }

    /// Current composing text as UTF-16 code units.
    pub fn composing_utf16(&self) -> &[u16] {
        self.state.composing()
    }

    /// Replace the composing text from the host (caret moved, document
    /// edited externally). Clears history and active states.
    pub fn set_composing_text(&mut self, text_utf8: &str) {
        self.state.set_composing(text::to_utf16(text_utf8));
    }

    pub fn active_states(&self) -> &[usize] {
        self.state.active_states()
    }

    /// Number of snapshots currently held for smart backspace.
    pub fn history_len(&self) -> usize {
        self.state.history().len()
    }

    /// Clear composing text, active states and history.
    pub fn reset(&mut self) {
        self.state.reset();
    }

    // ===== Key processing =====

    /// Process one key event, mutating the engine and returning the edit
    /// action for the host. Fails only when no keyboard is loaded.
    pub fn process_key(&mut self, input: KeyInput) -> Result<EngineOutput> {
        let kb = self.keyboard.as_ref().ok_or(Error::NoKeyboard)?;

        let old = self.state.composing().to_vec();
        let is_backspace = input.vk == keys::BACK;
        let char_units = input.character.map(text::encode_char);

        // Rules without a key combination see the typed character as part
        // of the match context; combination rules match the bare text.
        let extended = char_units.as_ref().map(|units| {
            let mut ctx = old.clone();
            ctx.extend_from_slice(units);
            ctx
        });

        let mut hit: Option<(&CompiledRule, RuleMatch)> = None;
        for rule in &kb.rules {
            let context: &[u16] = if rule.has_key_combo() {
                &old
            } else {
                extended.as_deref().unwrap_or(&old)
            };
            if let Some(m) = match_rule(
                rule,
                context,
                Some(&input),
                self.state.active_states(),
                &kb.file,
            ) {
                hit = Some((rule, m));
                break;
            }
        }

        if let Some((rule, m)) = hit {
            trace!(
                rule = rule.original_index,
                matched = m.matched_length,
                "rule applied"
            );
            // Backspace never records history; it only consumes it.
            if !is_backspace {
                self.state.push_snapshot();
            }

            let (fragment, new_states) = output::generate(&rule.rhs, &m.captures, &kb.file);
            if !rule.has_key_combo() {
                if let Some(units) = &char_units {
                    self.state.append(units);
                }
            }
            self.state.replace_from_end(m.matched_length, &fragment);
            self.state.set_states(&new_states);

            Self::run_recursion(&mut self.state, kb);

            let action = output::diff(&old, self.state.composing());
            return Ok(EngineOutput {
                action,
                composing: text::from_utf16_lossy(self.state.composing()),
                is_processed: true,
            });
        }

        // No rule matched.
        if is_backspace && !old.is_empty() {
            if kb.file.header.layout_options.auto_bksp && !self.state.history().is_empty() {
                // Smart backspace: roll back to the previous snapshot.
                self.state.pop_snapshot();
            } else {
                self.state.delete_last_unit();
                self.state.clear_states();
            }
            let action = output::diff(&old, self.state.composing());
            return Ok(EngineOutput {
                action,
                composing: text::from_utf16_lossy(self.state.composing()),
                is_processed: true,
            });
        }

        if kb.file.header.layout_options.eat {
            // Swallow the key without touching any state.
            return Ok(EngineOutput {
                action: EditAction::None,
                composing: text::from_utf16_lossy(self.state.composing()),
                is_processed: true,
            });
        }

        if let Some(units) = &char_units {
            self.state.push_snapshot();
            self.state.append(units);
            self.state.clear_states();
            let action = output::diff(&old, self.state.composing());
            return Ok(EngineOutput {
                action,
                composing: text::from_utf16_lossy(self.state.composing()),
                is_processed: true,
            });
        }

        self.state.clear_states();
        Ok(EngineOutput::pass_through(text::from_utf16_lossy(
            self.state.composing(),
        )))
    }

    /// Non-mutating preview: identical output contract, engine state is
    /// byte-identical afterwards.
    pub fn process_key_test(&mut self, input: KeyInput) -> Result<EngineOutput> {
        let saved = self.state.clone();
        let result = self.process_key(input);
        self.state = saved;
        result
    }

    /// Re-match text-only rules until the composing text is empty, is a
    /// single printable-ASCII character, stops changing, or the pass cap
    /// is hit.
    fn run_recursion(state: &mut EngineState, kb: &Keyboard) {
        for _ in 0..MAX_RECURSION {
            if state.composing().is_empty()
                || text::is_single_ascii_printable(state.composing())
            {
                break;
            }
            let before = state.composing().to_vec();
            let mut applied = false;
            for rule in &kb.rules {
                // Key-combination rules need a key; recursion has none.
                if rule.has_key_combo() {
                    continue;
                }
                if let Some(m) = match_rule(rule, &before, None, state.active_states(), &kb.file)
                {
                    trace!(rule = rule.original_index, "recursive rule applied");
                    let (fragment, new_states) =
                        output::generate(&rule.rhs, &m.captures, &kb.file);
                    state.replace_from_end(m.matched_length, &fragment);
                    state.set_states(&new_states);
                    applied = true;
                    break;
                }
            }
            if !applied || state.composing() == before.as_slice() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::km2::file::{FileHeader, LayoutOptions, Rule};
    use crate::km2::format::{OP_STRING, OP_SWITCH};

    fn string_rule(lhs_text: &str, rhs_text: &str) -> Rule {
        let mut lhs = vec![OP_STRING, lhs_text.encode_utf16().count() as u16];
        lhs.extend(lhs_text.encode_utf16());
        let mut rhs = vec![OP_STRING, rhs_text.encode_utf16().count() as u16];
        rhs.extend(rhs_text.encode_utf16());
        Rule { lhs, rhs }
    }

    fn keyboard(rules: Vec<Rule>, options: LayoutOptions) -> Km2File {
        Km2File {
            header: FileHeader {
                major_version: 1,
                minor_version: 5,
                string_count: 0,
                info_count: 0,
                rule_count: rules.len() as u16,
                layout_options: options,
            },
            strings: vec![],
            info: vec![],
            rules,
        }
    }

    fn engine_with(rules: Vec<Rule>, options: LayoutOptions) -> Engine {
        let mut e = Engine::new();
        e.set_keyboard(keyboard(rules, options));
        e
    }

    #[test]
    fn test_no_keyboard_is_an_error() {
        let mut e = Engine::new();
        assert!(matches!(
            e.process_key(KeyInput::from_char('a')),
            Err(Error::NoKeyboard)
        ));
    }

    #[test]
    fn test_unmatched_character_appends() {
        let mut e = engine_with(vec![], LayoutOptions::default());
        let out = e.process_key(KeyInput::from_char('a')).unwrap();
        assert_eq!(out.action, EditAction::Insert("a".into()));
        assert_eq!(out.composing, "a");
        assert!(out.is_processed);
        assert_eq!(e.history_len(), 1);
    }

    #[test]
    fn test_simple_rule_rewrites_typed_character() {
        let mut e = engine_with(
            vec![string_rule("u", "\u{1000}")],
            LayoutOptions::default(),
        );
        let out = e.process_key(KeyInput::from_char('u')).unwrap();
        assert_eq!(out.action, EditAction::Insert("\u{1000}".into()));
        assert_eq!(e.composing_text(), "\u{1000}");
    }

    #[test]
    fn test_eat_consumes_without_state_change() {
        let options = LayoutOptions {
            eat: true,
            ..LayoutOptions::default()
        };
        let mut e = engine_with(vec![], options);
        e.set_composing_text("x");
        let out = e.process_key(KeyInput::from_char('a')).unwrap();
        assert_eq!(out.action, EditAction::None);
        assert!(out.is_processed);
        assert_eq!(e.composing_text(), "x");
    }

    #[test]
    fn test_bare_vk_without_character_passes_through() {
        let mut e = engine_with(vec![], LayoutOptions::default());
        let out = e.process_key(KeyInput::from_vk(keys::F5)).unwrap();
        assert_eq!(out.action, EditAction::None);
        assert!(!out.is_processed);
    }

    #[test]
    fn test_rule_application_replaces_states() {
        // "z" arms state 1 without emitting text.
        let arm = Rule {
            lhs: vec![OP_STRING, 1, 0x007A],
            rhs: vec![OP_SWITCH, 1],
        };
        let mut e = engine_with(vec![arm], LayoutOptions::default());
        e.process_key(KeyInput::from_char('z')).unwrap();
        assert_eq!(e.active_states(), &[1]);

        // Any unmatched key clears the armed state.
        e.process_key(KeyInput::from_char('q')).unwrap();
        assert!(e.active_states().is_empty());
    }

    #[test]
    fn test_reset_and_reload_clear_state() {
        let mut e = engine_with(vec![], LayoutOptions::default());
        e.process_key(KeyInput::from_char('a')).unwrap();
        assert_eq!(e.composing_text(), "a");
        e.reset();
        assert_eq!(e.composing_text(), "");
        assert_eq!(e.history_len(), 0);

        e.process_key(KeyInput::from_char('b')).unwrap();
        e.set_keyboard(keyboard(vec![], LayoutOptions::default()));
        assert_eq!(e.composing_text(), "");
    }
}
