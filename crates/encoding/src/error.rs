//! Encoding error types

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("Empty input: no values to serialize")]
    EmptyInput,

    #[error("Value 0x{value:x} at index {index} does not fit in {digits} hex digits")]
    ValueTooWide {
        index: usize,
        value: u32,
        digits: usize,
    },

    #[error("Invalid digit width {0}: expected 2 or 4")]
    InvalidWidth(usize),

    #[error("Unknown output format: {0}")]
    UnknownFormat(String),

    #[error("Missing COE header line: expected {expected:?}")]
    MissingHeader { expected: &'static str },

    #[error("Malformed artifact at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, EncodingError>;
