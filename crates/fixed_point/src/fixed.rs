//! Q-format words and the saturating quantizer

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FixedPointError, Result};

/// Default number of fractional bits (Q1.15)
pub const DEFAULT_FRAC_BITS: u8 = 15;

/// Width of every emitted word
pub const WORD_BITS: u8 = 16;

/// Signed fixed-point layout: `int_bits` (sign included) + `frac_bits`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawQFormat")]
pub struct QFormat {
    /// Integer bits, including the sign bit
    pub int_bits: u8,
    /// Fractional bits
    pub frac_bits: u8,
}

impl QFormat {
    /// 1 sign bit, 15 fractional bits
    pub const Q1_15: Self = Self {
        int_bits: 1,
        frac_bits: DEFAULT_FRAC_BITS,
    };

    /// Create a format, rejecting layouts that do not fit a 16-bit word
    pub fn new(int_bits: u8, frac_bits: u8) -> Result<Self> {
        if int_bits == 0 || int_bits as u16 + frac_bits as u16 > WORD_BITS as u16 {
            return Err(FixedPointError::InvalidFormat {
                int_bits,
                frac_bits,
            });
        }
        Ok(Self {
            int_bits,
            frac_bits,
        })
    }

    /// Q1.F with the given fractional bit count
    pub fn from_frac_bits(frac_bits: u8) -> Result<Self> {
        Self::new(1, frac_bits)
    }

    /// Total significant bits
    pub fn bits(self) -> u8 {
        self.int_bits + self.frac_bits
    }

    /// 2^frac_bits
    pub fn scale(self) -> f64 {
        (1u64 << self.frac_bits) as f64
    }

    /// 2^(int_bits + frac_bits), added to negative values
    pub fn modulus(self) -> i64 {
        1i64 << self.bits()
    }

    /// Smallest representable value
    pub fn min_value(self) -> f64 {
        -((1u64 << (self.int_bits - 1)) as f64)
    }

    /// Largest representable value (one LSB below the positive limit)
    pub fn max_value(self) -> f64 {
        (1u64 << (self.int_bits - 1)) as f64 - 1.0 / self.scale()
    }

    /// One least significant bit in real units
    pub fn lsb(self) -> f64 {
        1.0 / self.scale()
    }

    /// Interpret a word as a signed value in this format
    pub fn decode(self, word: u16) -> f64 {
        let modulus = self.modulus();
        let raw = word as i64 & (modulus - 1);
        let signed = if raw >= modulus / 2 { raw - modulus } else { raw };
        signed as f64 / self.scale()
    }
}

impl Default for QFormat {
    fn default() -> Self {
        Self::Q1_15
    }
}

/// Unchecked wire form of [`QFormat`]
#[derive(Deserialize)]
struct RawQFormat {
    int_bits: u8,
    frac_bits: u8,
}

impl TryFrom<RawQFormat> for QFormat {
    type Error = FixedPointError;

    fn try_from(raw: RawQFormat) -> Result<Self> {
        Self::new(raw.int_bits, raw.frac_bits)
    }
}

impl fmt::Display for QFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}.{}", self.int_bits, self.frac_bits)
    }
}

/// How the scaled value is brought to an integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rounding {
    /// Round to nearest, ties to even (numpy `round` semantics)
    #[default]
    Nearest,
    /// Drop the fractional part (toward zero)
    Truncate,
}

impl Rounding {
    fn apply(self, scaled: f64) -> f64 {
        match self {
            Rounding::Nearest => scaled.round_ties_even(),
            Rounding::Truncate => scaled.trunc(),
        }
    }
}

impl FromStr for Rounding {
    type Err = FixedPointError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" | "round" => Ok(Rounding::Nearest),
            "truncate" | "trunc" => Ok(Rounding::Truncate),
            _ => Err(FixedPointError::UnknownRounding(s.to_string())),
        }
    }
}

impl fmt::Display for Rounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rounding::Nearest => f.write_str("nearest"),
            Rounding::Truncate => f.write_str("truncate"),
        }
    }
}

/// Saturation interval applied before scaling
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClampBounds {
    pub min: f64,
    pub max: f64,
}

impl ClampBounds {
    /// The full representable range of `format`
    pub fn for_format(format: QFormat) -> Self {
        Self {
            min: format.min_value(),
            max: format.max_value(),
        }
    }

    /// Bounds must be finite, ordered, and inside the representable range
    pub fn new(min: f64, max: f64, format: QFormat) -> Result<Self> {
        let lo = format.min_value();
        let hi = format.max_value();
        let valid = min.is_finite() && max.is_finite() && min <= max && min >= lo && max <= hi;
        if !valid {
            return Err(FixedPointError::InvalidBounds { min, max, lo, hi });
        }
        Ok(Self { min, max })
    }

    /// Whether `value` lies outside the interval and will be clamped
    pub fn saturates(&self, value: f64) -> bool {
        value < self.min || value > self.max
    }
}

/// Reject NaN and infinities before they reach the quantizer
pub fn check_finite(index: usize, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(FixedPointError::NonFinite { index, value })
    }
}

/// Stateless float -> word mapping
///
/// Values are clamped to the configured bounds, scaled by 2^frac_bits,
/// rounded, shifted into two's complement and masked to 16 bits. Clamping is
/// silent: out-of-range finite values saturate instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quantizer {
    format: QFormat,
    rounding: Rounding,
    bounds: ClampBounds,
}

impl Quantizer {
    /// Quantizer clamping to the full range of `format`, rounding to nearest
    pub fn new(format: QFormat) -> Self {
        Self {
            format,
            rounding: Rounding::default(),
            bounds: ClampBounds::for_format(format),
        }
    }

    /// Q1.15 with default bounds `[-1, 1 - 2^-15]`
    pub fn q1_15() -> Self {
        Self::new(QFormat::Q1_15)
    }

    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }

    /// Narrow the clamp interval
    pub fn with_bounds(mut self, min: f64, max: f64) -> Result<Self> {
        self.bounds = ClampBounds::new(min, max, self.format)?;
        Ok(self)
    }

    pub fn format(&self) -> QFormat {
        self.format
    }

    pub fn rounding(&self) -> Rounding {
        self.rounding
    }

    pub fn bounds(&self) -> ClampBounds {
        self.bounds
    }

    /// Quantize a value. Total for finite input; callers validate finiteness
    /// with [`check_finite`] or use [`Quantizer::try_quantize`].
    pub fn quantize(&self, value: f64) -> u16 {
        let clamped = value.clamp(self.bounds.min, self.bounds.max);
        let scaled = self.rounding.apply(clamped * self.format.scale()) as i64;
        let encoded = if scaled < 0 {
            scaled + self.format.modulus()
        } else {
            scaled
        };
        (encoded & 0xFFFF) as u16
    }

    /// Quantize after rejecting non-finite input
    pub fn try_quantize(&self, value: f64) -> Result<u16> {
        check_finite(0, value)?;
        Ok(self.quantize(value))
    }

    /// Decode a word produced by this quantizer
    pub fn decode(&self, word: u16) -> f64 {
        self.format.decode(word)
    }
}

impl Default for Quantizer {
    fn default() -> Self {
        Self::q1_15()
    }
}

/// Quantize with the Q1.F defaults (`frac_bits` = 15 gives Q1.15)
pub fn quantize(value: f64, frac_bits: u8) -> Result<u16> {
    Quantizer::new(QFormat::from_frac_bits(frac_bits)?).try_quantize(value)
}
