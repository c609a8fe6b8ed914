//! bramgen Image Source
//!
//! Row-major 8-bit grayscale buffers and synthetic shape images. Decoding
//! of compressed formats is left to the caller; this crate only deals with
//! raw intensities.

mod error;
mod gray;
pub mod shapes;

pub use error::{ImageError, Result};
pub use gray::GrayImage;
pub use shapes::{TestPattern, DEFAULT_SIZE};
