//! Error taxonomy shared by the loader, the engine and the FFI boundary.
//!
//! Loader failures carry the byte offset of the offending field so keyboard
//! authors can locate problems in their compiled files. The matcher and the
//! output generator never produce errors: malformed runtime data cannot
//! reach them because the loader validates every rule stream up front.

use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The keyboard file could not be opened or read.
    #[error("keyboard file not found: {}", path.display())]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The byte stream does not describe a well-formed keyboard file.
    #[error("invalid keyboard file at byte {offset}: {reason}")]
    InvalidFormat { offset: u64, reason: String },

    /// Recognized magic but a version this build does not understand.
    #[error("unsupported keyboard file version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    /// External text data that is not valid in its declared encoding.
    #[error("malformed {encoding} data")]
    InvalidEncoding { encoding: &'static str },

    /// An engine operation that requires a loaded keyboard.
    #[error("no keyboard loaded")]
    NoKeyboard,

    /// Internal invariant violation. Kept for forward compatibility;
    /// current code paths do not produce it.
    #[error("engine failure: {0}")]
    EngineFailure(String),
}

impl Error {
    /// Shorthand for an [`Error::InvalidFormat`] at a known offset.
    pub(crate) fn format(offset: u64, reason: impl Into<String>) -> Self {
        Error::InvalidFormat {
            offset,
            reason: reason.into(),
        }
    }
}
