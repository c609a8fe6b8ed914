//! bramgen Fixed-Point Encoding
//!
//! Saturating quantization of floating-point values into 16-bit
//! two's-complement words (Q1.15 by default) for BRAM initialization.

mod error;
mod fixed;
mod vector;

pub use error::{FixedPointError, Result};
pub use fixed::{
    check_finite, quantize, ClampBounds, QFormat, Quantizer, Rounding, DEFAULT_FRAC_BITS,
    WORD_BITS,
};
pub use vector::{count_saturated, WordVector};
