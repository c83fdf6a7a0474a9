//! Keystroke-to-text engine.
//!
//! ## Architecture
//!
//! ```text
//! KeyInput → rule search (priority order) → RHS generation → recursion
//!              matcher.rs                     output.rs        engine.rs
//! ```
//!
//! State (composing buffer, active states, snapshot history) lives in
//! [`state::EngineState`]; [`Engine`] owns one plus the loaded keyboard.

pub mod input;
pub mod matcher;
pub mod output;
pub mod state;

mod engine;

pub use engine::{Engine, MAX_RECURSION};
pub use input::{KeyInput, Modifiers};
pub use matcher::{Capture, RuleMatch};
pub use output::{EditAction, EngineOutput};
pub use state::{EngineState, Snapshot, HISTORY_CAPACITY};
