//! KmFlow - rule-driven smart keyboard layout engine.
//!
//! Given a compiled keyboard layout (a `.km2` binary rule-set) and a
//! stream of key events, the engine maintains an in-progress composing
//! text and emits, for each key, the minimal edit the host must apply:
//! insert, delete, delete-and-insert, or nothing.
//!
//! ## Pipeline
//!
//! ```text
//! .km2 bytes → km2 loader → rules compiler → Engine
//!                                               │ per key event
//!                      matcher → generator → recursion → edit action
//! ```
//!
//! The engine is purely synchronous and host-agnostic. Native hosts embed
//! it through the C surface in [`ffi`]; Rust hosts and tests use
//! [`Engine`] directly:
//!
//! ```no_run
//! use kmflow_core::{Engine, KeyInput};
//!
//! let mut engine = Engine::new();
//! engine.load_keyboard_file("layout.km2")?;
//! let out = engine.process_key(KeyInput::from_char('u'))?;
//! println!("composing: {}", out.composing);
//! # Ok::<(), kmflow_core::Error>(())
//! ```

pub mod engine;
pub mod error;
pub mod ffi;
pub mod hotkey;
pub mod keys;
pub mod km2;
pub mod rules;
pub mod text;

pub use engine::{EditAction, Engine, EngineOutput, KeyInput, Modifiers};
pub use error::{Error, Result};
pub use hotkey::Hotkey;
pub use km2::{load_from_file, load_from_memory, validate, Km2File};
