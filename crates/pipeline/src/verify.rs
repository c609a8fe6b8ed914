//! Artifact readback

use std::path::{Path, PathBuf};

use bramgen_encoding::{parse_artifact, OutputFormat};
use bramgen_fixed_point::QFormat;
use serde::Serialize;

use crate::error::{PipelineError, Result};

/// What an artifact on disk holds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifyReport {
    pub path: PathBuf,
    pub format: OutputFormat,
    /// Hex digits per token; zero for an empty artifact
    pub digits: usize,
    pub tokens: usize,
    pub min_raw: Option<u32>,
    pub max_raw: Option<u32>,
    /// Smallest decoded fixed-point value (four-digit artifacts only)
    pub min_value: Option<f64>,
    /// Largest decoded fixed-point value (four-digit artifacts only)
    pub max_value: Option<f64>,
}

/// Read back a Q1.15 artifact, inferring its format from the extension
pub fn verify_artifact(path: &Path) -> Result<VerifyReport> {
    verify_artifact_as(path, QFormat::Q1_15)
}

/// Read back an artifact whose words use `qformat`
pub fn verify_artifact_as(path: &Path, qformat: QFormat) -> Result<VerifyReport> {
    let format =
        OutputFormat::from_path(path).ok_or_else(|| PipelineError::UnknownFormat(path.into()))?;
    let text = std::fs::read_to_string(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed = parse_artifact(&text, format)?;

    let (min_value, max_value) = if parsed.digits == 4 {
        let decoded: Vec<f64> = parsed
            .words()
            .into_iter()
            .map(|w| qformat.decode(w))
            .collect();
        (
            decoded.iter().copied().reduce(f64::min),
            decoded.iter().copied().reduce(f64::max),
        )
    } else {
        (None, None)
    };

    tracing::debug!(path = %path.display(), tokens = parsed.len(), "verified");
    Ok(VerifyReport {
        path: path.to_path_buf(),
        format,
        digits: parsed.digits,
        tokens: parsed.len(),
        min_raw: parsed.values.iter().copied().min(),
        max_raw: parsed.values.iter().copied().max(),
        min_value,
        max_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_coe() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("w.coe");
        std::fs::write(
            &path,
            "memory_initialization_radix=16;\nmemory_initialization_vector=\n8000,\n0000,\n7fff;",
        )
        .unwrap();

        let report = verify_artifact(&path).unwrap();
        assert_eq!(report.format, OutputFormat::Coe);
        assert_eq!(report.tokens, 3);
        assert_eq!(report.digits, 4);
        assert_eq!(report.min_raw, Some(0x0000));
        assert_eq!(report.max_raw, Some(0x8000));
        assert_eq!(report.min_value, Some(-1.0));
        assert_eq!(report.max_value, Some(1.0 - 1.0 / 32768.0));
    }

    #[test]
    fn test_verify_pixels_skip_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("circle_image.hex");
        std::fs::write(&path, "00\nff\n10\n").unwrap();

        let report = verify_artifact(&path).unwrap();
        assert_eq!(report.format, OutputFormat::PlainHex);
        assert_eq!(report.tokens, 3);
        assert_eq!(report.max_raw, Some(255));
        assert_eq!(report.min_value, None);
    }

    #[test]
    fn test_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("w.bin");
        std::fs::write(&path, "00\n").unwrap();
        assert!(matches!(
            verify_artifact(&path),
            Err(PipelineError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_missing_file_carries_path() {
        let err = verify_artifact(Path::new("/nonexistent/w.hex")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/w.hex"));
    }
}
