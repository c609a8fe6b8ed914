//! Output format and token width

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EncodingError, Result};

/// First COE header line
pub const COE_RADIX_LINE: &str = "memory_initialization_radix=16;";

/// Second COE header line
pub const COE_VECTOR_LINE: &str = "memory_initialization_vector=";

/// Text layout of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One token per line, newline-terminated
    #[serde(rename = "hex")]
    PlainHex,
    /// Vivado coefficient file
    Coe,
}

impl OutputFormat {
    /// File extension without the dot
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::PlainHex => "hex",
            OutputFormat::Coe => "coe",
        }
    }

    /// Infer the format from a file extension (`.hex`, `.mem`, `.coe`)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "hex" | "mem" => Some(OutputFormat::PlainHex),
            "coe" => Some(OutputFormat::Coe),
            _ => None,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hex" | "plain" | "mem" => Ok(OutputFormat::PlainHex),
            "coe" => Ok(OutputFormat::Coe),
            _ => Err(EncodingError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Zero-padded hex digits per token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum DigitWidth {
    /// 8-bit pixels
    Two,
    /// 16-bit words
    Four,
}

impl DigitWidth {
    pub fn digits(self) -> usize {
        match self {
            DigitWidth::Two => 2,
            DigitWidth::Four => 4,
        }
    }

    /// Largest value that fits
    pub fn max_value(self) -> u32 {
        (1u32 << (4 * self.digits())) - 1
    }
}

impl TryFrom<usize> for DigitWidth {
    type Error = EncodingError;

    fn try_from(digits: usize) -> Result<Self> {
        match digits {
            2 => Ok(DigitWidth::Two),
            4 => Ok(DigitWidth::Four),
            other => Err(EncodingError::InvalidWidth(other)),
        }
    }
}

impl From<DigitWidth> for usize {
    fn from(width: DigitWidth) -> usize {
        width.digits()
    }
}

/// What to do with a zero-length input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyPolicy {
    /// Fail with [`EncodingError::EmptyInput`]
    #[default]
    Reject,
    /// Emit a header-only COE or an empty hex file
    Allow,
}
