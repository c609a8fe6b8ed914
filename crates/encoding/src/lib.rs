//! bramgen Hex/COE Encoding
//!
//! Serializes 8-bit pixels and 16-bit fixed-point words into the text layouts
//! read by FPGA BRAM initialization:
//!
//! - plain hex: one zero-padded lowercase token per line
//! - COE: Vivado `memory_initialization_radix` / `memory_initialization_vector`
//!   header followed by a comma-separated, semicolon-terminated vector
//!
//! Token order always equals input order.

mod error;
mod format;
mod parse;
mod serializer;
mod write;

pub use error::{EncodingError, Result};
pub use format::{DigitWidth, EmptyPolicy, OutputFormat, COE_RADIX_LINE, COE_VECTOR_LINE};
pub use parse::{parse_artifact, ParsedArtifact};
pub use serializer::{Artifact, Payload, Serializer};
pub use write::write_atomic;
