//! Readback of hex and COE artifacts

use crate::error::{EncodingError, Result};
use crate::format::{OutputFormat, COE_RADIX_LINE, COE_VECTOR_LINE};

/// Tokens recovered from an artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArtifact {
    pub format: OutputFormat,
    /// Digits per token; zero when there are no tokens
    pub digits: usize,
    /// Token values in file order
    pub values: Vec<u32>,
}

impl ParsedArtifact {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values narrowed to 16-bit words
    pub fn words(&self) -> Vec<u16> {
        self.values.iter().map(|&v| v as u16).collect()
    }
}

/// Parse an artifact produced by [`crate::Serializer`]
///
/// COE input may carry a newline after the terminating `;`. Every token must
/// have the same number of hex digits (at most 8).
pub fn parse_artifact(text: &str, format: OutputFormat) -> Result<ParsedArtifact> {
    let tokens = match format {
        OutputFormat::PlainHex => plain_tokens(text)?,
        OutputFormat::Coe => coe_tokens(text)?,
    };

    let mut digits = 0;
    let mut values = Vec::with_capacity(tokens.len());
    for (line, token) in tokens {
        if digits == 0 {
            digits = token.len();
        }
        values.push(parse_token(line, token, digits)?);
    }

    Ok(ParsedArtifact {
        format,
        digits,
        values,
    })
}

fn plain_tokens(text: &str) -> Result<Vec<(usize, &str)>> {
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            let token = line.trim();
            if token.is_empty() {
                Err(EncodingError::Malformed {
                    line: i + 1,
                    reason: "blank line".to_string(),
                })
            } else {
                Ok((i + 1, token))
            }
        })
        .collect()
}

fn coe_tokens(text: &str) -> Result<Vec<(usize, &str)>> {
    let mut lines = text.lines().enumerate();

    for expected in [COE_RADIX_LINE, COE_VECTOR_LINE] {
        match lines.next() {
            Some((_, line)) if line.trim().eq_ignore_ascii_case(expected) => {}
            _ => return Err(EncodingError::MissingHeader { expected }),
        }
    }

    let body: Vec<(usize, &str)> = lines
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .collect();

    let mut tokens = Vec::with_capacity(body.len());
    let last = body.len().saturating_sub(1);
    for (pos, (line, content)) in body.into_iter().enumerate() {
        let terminator = if pos == last { ';' } else { ',' };
        let token = content
            .strip_suffix(terminator)
            .ok_or_else(|| EncodingError::Malformed {
                line,
                reason: format!("expected token followed by '{terminator}'"),
            })?;
        tokens.push((line, token.trim()));
    }

    Ok(tokens)
}

fn parse_token(line: usize, token: &str, digits: usize) -> Result<u32> {
    if token.len() != digits || digits > 8 {
        return Err(EncodingError::Malformed {
            line,
            reason: format!("token {token:?} is not {digits} hex digits"),
        });
    }
    if !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(EncodingError::Malformed {
            line,
            reason: format!("invalid hex token {token:?}"),
        });
    }
    // at most 8 hex digits always fits
    Ok(token
        .bytes()
        .fold(0u32, |acc, b| (acc << 4) | (b as char).to_digit(16).unwrap_or(0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{DigitWidth, EmptyPolicy};
    use crate::serializer::Serializer;

    #[test]
    fn test_coe_roundtrip() {
        let words: &[u16] = &[0x8000, 0x7fff, 0x0000, 0x1234];
        let artifact = Serializer::coe(DigitWidth::Four).serialize(words).unwrap();
        let parsed = parse_artifact(artifact.as_str(), OutputFormat::Coe).unwrap();
        assert_eq!(parsed.words(), words);
        assert_eq!(parsed.digits, 4);
    }

    #[test]
    fn test_coe_tolerates_trailing_newline() {
        let text = "memory_initialization_radix=16;\nmemory_initialization_vector=\n0001,\n0002;\n";
        let parsed = parse_artifact(text, OutputFormat::Coe).unwrap();
        assert_eq!(parsed.values, vec![1, 2]);
    }

    #[test]
    fn test_coe_header_only() {
        let artifact = Serializer::coe(DigitWidth::Four)
            .with_empty_policy(EmptyPolicy::Allow)
            .serialize(&[] as &[u16])
            .unwrap();
        let parsed = parse_artifact(artifact.as_str(), OutputFormat::Coe).unwrap();
        assert!(parsed.is_empty());
        assert_eq!(parsed.digits, 0);
    }

    #[test]
    fn test_coe_missing_header() {
        let err = parse_artifact("0001;", OutputFormat::Coe).unwrap_err();
        assert!(matches!(
            err,
            EncodingError::MissingHeader {
                expected: COE_RADIX_LINE
            }
        ));
    }

    #[test]
    fn test_coe_bad_separator() {
        let text = "memory_initialization_radix=16;\nmemory_initialization_vector=\n0001;\n0002;";
        let err = parse_artifact(text, OutputFormat::Coe).unwrap_err();
        assert!(matches!(err, EncodingError::Malformed { line: 3, .. }));
    }

    #[test]
    fn test_plain_roundtrip() {
        let parsed = parse_artifact("00\nff\n10\n", OutputFormat::PlainHex).unwrap();
        assert_eq!(parsed.values, vec![0x00, 0xff, 0x10]);
        assert_eq!(parsed.digits, 2);
    }

    #[test]
    fn test_plain_rejects_mixed_width() {
        let err = parse_artifact("00\n0ff\n", OutputFormat::PlainHex).unwrap_err();
        assert!(matches!(err, EncodingError::Malformed { line: 2, .. }));
    }

    #[test]
    fn test_plain_rejects_non_hex() {
        let err = parse_artifact("0g\n", OutputFormat::PlainHex).unwrap_err();
        assert!(matches!(err, EncodingError::Malformed { line: 1, .. }));
    }
}
