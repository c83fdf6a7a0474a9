//! Compiled keyboard file (.km2) support.
//!
//! A keyboard file is a little-endian, self-describing container with four
//! sections in fixed order: header, string table, info table (v1.4+), and
//! rules. Three minor versions are understood (1.3, 1.4, 1.5); older
//! layouts are upgraded to the v1.5 in-memory shape at load time.

pub mod file;
pub mod format;
pub mod loader;

pub use file::{FileHeader, InfoEntry, Km2File, LayoutOptions, Rule};
pub use loader::{load_from_file, load_from_memory, validate, validate_file};
