//! Error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Cartridge loading failures. Bad checksums and ambiguous sizes are not
/// errors; see [`LoadOutcome`](crate::LoadOutcome).
#[derive(Debug, Error)]
pub enum CartError {
    #[error("cannot open cartridge {}", path.display())]
    CannotOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("not a raw image or CART file")]
    UnrecognizedFormat,

    #[error("unknown cartridge type {0}")]
    UnknownType(i32),

    #[error("no cartridge image loaded")]
    NoImage,
}

/// Machine construction and state restore failures.
#[derive(Debug, Error)]
pub enum AtariError {
    #[error("OS ROM is {actual} bytes, expected {expected}")]
    BadRomSize { expected: usize, actual: usize },

    #[error("BASIC ROM is {0} bytes, expected 8192")]
    BadBasicSize(usize),

    #[error("{ram_kb} KB of RAM is not supported on {machine}")]
    UnsupportedRam { machine: &'static str, ram_kb: u32 },

    #[error("saved state does not match this machine: {0}")]
    StateMismatch(&'static str),

    #[error(transparent)]
    Cartridge(#[from] CartError),
}
