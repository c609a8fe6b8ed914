//! Export configuration

use std::path::{Path, PathBuf};

use bramgen_encoding::{DigitWidth, EmptyPolicy, OutputFormat, Serializer};
use bramgen_fixed_point::{QFormat, Quantizer, Rounding, DEFAULT_FRAC_BITS};
use bramgen_image::DEFAULT_SIZE;
use bramgen_model::{InputGeometry, LayerSpec};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Quantization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantizationConfig {
    /// Integer bits including sign
    pub int_bits: u8,
    /// Fractional bits
    pub frac_bits: u8,
    /// Rounding policy, applied to every value of a run
    pub rounding: Rounding,
    /// Lower clamp bound (defaults to the format minimum)
    pub clamp_min: Option<f64>,
    /// Upper clamp bound (defaults to the format maximum)
    pub clamp_max: Option<f64>,
}

impl Default for QuantizationConfig {
    fn default() -> Self {
        Self {
            int_bits: 1,
            frac_bits: DEFAULT_FRAC_BITS,
            rounding: Rounding::Nearest,
            clamp_min: None,
            clamp_max: None,
        }
    }
}

/// Network export settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Explicit layer list; discovered from tensor names when empty
    pub layers: Vec<LayerSpec>,
    /// Output columns to keep, in order; all when empty
    pub select_outputs: Vec<usize>,
    /// Input image geometry reported in the summary
    pub input: Option<InputGeometry>,
}

/// Image export settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Edge length of synthetic test images
    pub size: usize,
    /// Formats written for every image
    pub formats: Vec<OutputFormat>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            formats: vec![OutputFormat::PlainHex],
        }
    }
}

/// Complete export configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory receiving every artifact
    pub output_dir: PathBuf,
    /// Formats written for every weight and bias tensor
    pub formats: Vec<OutputFormat>,
    /// Empty-input handling
    pub empty: EmptyPolicy,
    /// Emit a newline after the COE terminator
    pub coe_trailing_newline: bool,
    /// Write independent files on the rayon pool
    pub parallel: bool,
    pub quantization: QuantizationConfig,
    pub network: NetworkConfig,
    pub image: ImageConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("bram_out"),
            formats: vec![OutputFormat::PlainHex, OutputFormat::Coe],
            empty: EmptyPolicy::Reject,
            coe_trailing_newline: false,
            parallel: true,
            quantization: QuantizationConfig::default(),
            network: NetworkConfig::default(),
            image: ImageConfig::default(),
        }
    }
}

impl ExportConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| PipelineError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| PipelineError::Config(e.to_string()))?;
        std::fs::write(path, content).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// File (or defaults) with environment overrides applied
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Override fields from `BRAMGEN_*` environment variables
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = var("BRAMGEN_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }

        if let Some(bits) = var("BRAMGEN_FRAC_BITS") {
            match bits.parse() {
                Ok(b) => self.quantization.frac_bits = b,
                Err(e) => tracing::warn!("Ignoring BRAMGEN_FRAC_BITS={}: {}", bits, e),
            }
        }

        if let Some(rounding) = var("BRAMGEN_ROUNDING") {
            match rounding.parse() {
                Ok(r) => self.quantization.rounding = r,
                Err(e) => tracing::warn!("Ignoring BRAMGEN_ROUNDING: {}", e),
            }
        }

        if let Some(allow) = var("BRAMGEN_ALLOW_EMPTY") {
            match allow.parse::<bool>() {
                Ok(true) => self.empty = EmptyPolicy::Allow,
                Ok(false) => self.empty = EmptyPolicy::Reject,
                Err(e) => tracing::warn!("Ignoring BRAMGEN_ALLOW_EMPTY={}: {}", allow, e),
            }
        }
    }

    /// Build the quantizer described by `quantization`
    pub fn quantizer(&self) -> Result<Quantizer> {
        let q = &self.quantization;
        let format = QFormat::new(q.int_bits, q.frac_bits)?;
        let quantizer = Quantizer::new(format).with_rounding(q.rounding);
        let bounds = quantizer.bounds();
        match (q.clamp_min, q.clamp_max) {
            (None, None) => Ok(quantizer),
            (min, max) => Ok(quantizer
                .with_bounds(min.unwrap_or(bounds.min), max.unwrap_or(bounds.max))?),
        }
    }

    /// Serializer for one format at the given width
    pub fn serializer(&self, format: OutputFormat, width: DigitWidth) -> Serializer {
        Serializer::new(format, width)
            .with_empty_policy(self.empty)
            .with_trailing_newline(self.coe_trailing_newline)
    }
}
