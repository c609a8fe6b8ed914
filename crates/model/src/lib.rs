//! bramgen Model Loading
//!
//! Dense-network weights and biases from safetensors files, ready to be
//! quantized and exported layer by layer.

mod error;
mod loader;
mod network;
mod summary;
mod tensor;

pub use error::{ModelError, Result};
pub use loader::SafetensorsLoader;
pub use network::{DenseLayer, LayerSpec, Network, QuantizedLayer};
pub use summary::{InputGeometry, LayerSummary, NetworkSummary, BYTES_PER_PARAM};
pub use tensor::Tensor;
