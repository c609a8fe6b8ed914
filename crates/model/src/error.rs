//! Model loading error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Safetensors error: {0}")]
    Safetensors(String),

    #[error("Missing tensor: {0}")]
    MissingTensor(String),

    #[error("Invalid shape for {name}: expected {expected:?}, got {got:?}")]
    InvalidShape {
        name: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("Invalid tensor dtype: expected {expected}, got {got}")]
    InvalidDtype { expected: String, got: String },

    #[error("Layer {next} expects {expected} inputs but {prev} produces {got}")]
    LayerMismatch {
        prev: String,
        next: String,
        expected: usize,
        got: usize,
    },

    #[error("Output index {index} out of range for {outputs} outputs")]
    InvalidSelection { index: usize, outputs: usize },

    #[error("No weight/bias layer pairs found")]
    NoLayers,

    #[error("Fixed-point error: {0}")]
    FixedPoint(#[from] bramgen_fixed_point::FixedPointError),
}

pub type Result<T> = std::result::Result<T, ModelError>;
