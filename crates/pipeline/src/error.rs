//! Pipeline error types

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Fixed-point error: {0}")]
    FixedPoint(#[from] bramgen_fixed_point::FixedPointError),

    #[error("Encoding error: {0}")]
    Encoding(#[from] bramgen_encoding::EncodingError),

    #[error("Model error: {0}")]
    Model(#[from] bramgen_model::ModelError),

    #[error("Image error: {0}")]
    Image(#[from] bramgen_image::ImageError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Cannot infer artifact format from {}", .0.display())]
    UnknownFormat(PathBuf),

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
