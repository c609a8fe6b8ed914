//! Hex and COE serialization

use std::path::Path;

use bramgen_fixed_point::WordVector;
use serde::{Deserialize, Serialize};

use crate::error::{EncodingError, Result};
use crate::format::{DigitWidth, EmptyPolicy, OutputFormat, COE_RADIX_LINE, COE_VECTOR_LINE};
use crate::write::write_atomic;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Values to serialize, in row-major flatten order
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    /// 8-bit pixel intensities
    Pixels(&'a [u8]),
    /// 16-bit fixed-point words
    Words(&'a [u16]),
}

impl<'a> Payload<'a> {
    pub fn len(&self) -> usize {
        match self {
            Payload::Pixels(p) => p.len(),
            Payload::Words(w) => w.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Width that holds every possible value of this domain
    pub fn natural_width(&self) -> DigitWidth {
        match self {
            Payload::Pixels(_) => DigitWidth::Two,
            Payload::Words(_) => DigitWidth::Four,
        }
    }

    fn values(&self) -> Box<dyn Iterator<Item = u32> + 'a> {
        match *self {
            Payload::Pixels(p) => Box::new(p.iter().map(|&v| v as u32)),
            Payload::Words(w) => Box::new(w.iter().map(|&v| v as u32)),
        }
    }
}

impl<'a> From<&'a [u8]> for Payload<'a> {
    fn from(pixels: &'a [u8]) -> Self {
        Payload::Pixels(pixels)
    }
}

impl<'a> From<&'a [u16]> for Payload<'a> {
    fn from(words: &'a [u16]) -> Self {
        Payload::Words(words)
    }
}

impl<'a> From<&'a WordVector> for Payload<'a> {
    fn from(words: &'a WordVector) -> Self {
        Payload::Words(words.as_slice())
    }
}

/// A finished, immutable text artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    format: OutputFormat,
    width: DigitWidth,
    token_count: usize,
    text: String,
}

impl Artifact {
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn width(&self) -> DigitWidth {
        self.width
    }

    pub fn token_count(&self) -> usize {
        self.token_count
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// Write the artifact; the destination is either fully written or left
    /// untouched
    pub fn write_to(&self, path: &Path) -> Result<()> {
        write_atomic(path, self.as_bytes())?;
        tracing::debug!(
            path = %path.display(),
            tokens = self.token_count,
            format = %self.format,
            "wrote artifact"
        );
        Ok(())
    }
}

/// Serialization settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Serializer {
    pub format: OutputFormat,
    pub width: DigitWidth,
    #[serde(default)]
    pub empty: EmptyPolicy,
    /// Emit `\n` after the COE terminator
    #[serde(default)]
    pub trailing_newline: bool,
}

impl Serializer {
    pub fn new(format: OutputFormat, width: DigitWidth) -> Self {
        Self {
            format,
            width,
            empty: EmptyPolicy::default(),
            trailing_newline: false,
        }
    }

    pub fn plain_hex(width: DigitWidth) -> Self {
        Self::new(OutputFormat::PlainHex, width)
    }

    pub fn coe(width: DigitWidth) -> Self {
        Self::new(OutputFormat::Coe, width)
    }

    pub fn with_empty_policy(mut self, empty: EmptyPolicy) -> Self {
        self.empty = empty;
        self
    }

    pub fn with_trailing_newline(mut self, trailing_newline: bool) -> Self {
        self.trailing_newline = trailing_newline;
        self
    }

    /// Render `payload` into an artifact, preserving input order
    pub fn serialize<'a>(&self, payload: impl Into<Payload<'a>>) -> Result<Artifact> {
        let payload = payload.into();
        let count = payload.len();
        if count == 0 && self.empty == EmptyPolicy::Reject {
            return Err(EncodingError::EmptyInput);
        }

        let digits = self.width.digits();
        let max = self.width.max_value();

        // header + token + separator per value
        let mut text = String::with_capacity(64 + count * (digits + 2));
        if self.format == OutputFormat::Coe {
            text.push_str(COE_RADIX_LINE);
            text.push('\n');
            text.push_str(COE_VECTOR_LINE);
            text.push('\n');
        }

        for (index, value) in payload.values().enumerate() {
            if value > max {
                return Err(EncodingError::ValueTooWide {
                    index,
                    value,
                    digits,
                });
            }
            push_hex(&mut text, value, digits);

            match self.format {
                OutputFormat::PlainHex => text.push('\n'),
                OutputFormat::Coe if index + 1 < count => text.push_str(",\n"),
                OutputFormat::Coe => {
                    text.push(';');
                    if self.trailing_newline {
                        text.push('\n');
                    }
                }
            }
        }

        Ok(Artifact {
            format: self.format,
            width: self.width,
            token_count: count,
            text,
        })
    }

    /// Serialize and write in one step
    pub fn write<'a>(&self, payload: impl Into<Payload<'a>>, path: &Path) -> Result<Artifact> {
        let artifact = self.serialize(payload)?;
        artifact.write_to(path)?;
        Ok(artifact)
    }
}

/// Append `value` as exactly `digits` lowercase hex digits
fn push_hex(out: &mut String, value: u32, digits: usize) {
    for shift in (0..digits).rev() {
        let nibble = (value >> (shift * 4)) & 0xF;
        out.push(HEX_DIGITS[nibble as usize] as char);
    }
}
