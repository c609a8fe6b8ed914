//! Fixed-point error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FixedPointError {
    #[error("Invalid input at index {index}: {value} is not a finite number")]
    NonFinite { index: usize, value: f64 },

    #[error("Invalid format Q{int_bits}.{frac_bits}: need at least one integer bit and at most 16 bits total")]
    InvalidFormat { int_bits: u8, frac_bits: u8 },

    #[error("Invalid clamp bounds [{min}, {max}] for representable range [{lo}, {hi}]")]
    InvalidBounds { min: f64, max: f64, lo: f64, hi: f64 },

    #[error("Unknown rounding mode: {0} (expected \"nearest\" or \"truncate\")")]
    UnknownRounding(String),
}

pub type Result<T> = std::result::Result<T, FixedPointError>;
