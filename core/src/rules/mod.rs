//! Rule preprocessor.
//!
//! Raw opcode words from the keyboard file become typed [`Segment`]s, then
//! [`CompiledRule`]s carrying the state preconditions, the virtual-key
//! combination, the pattern length and the match priority. Compilation
//! happens once per keyboard load; the engine only ever sees the sorted
//! compiled form.

pub mod compile;
pub mod segment;

pub use compile::{compile, CompiledRule};
pub use segment::{segment_side, Segment, Side};
