//! Image error types

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Pixel count mismatch: {width}x{height} needs {expected} bytes, got {got}")]
    SizeMismatch {
        width: usize,
        height: usize,
        expected: usize,
        got: usize,
    },

    #[error("Invalid image size {width}x{height}")]
    InvalidSize { width: usize, height: usize },

    #[error("Unknown test pattern: {0}")]
    UnknownPattern(String),

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ImageError>;
