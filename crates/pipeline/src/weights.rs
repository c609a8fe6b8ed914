//! Network weight export

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use bramgen_encoding::{write_atomic, DigitWidth, OutputFormat, Payload, Serializer};
use bramgen_model::{ModelError, Network, NetworkSummary, QuantizedLayer};
use rayon::prelude::*;
use serde::Serialize;

use crate::config::ExportConfig;
use crate::error::{PipelineError, Result};

/// Summary file written next to the layer artifacts
pub const SUMMARY_FILE: &str = "network_summary.txt";

/// One file written by an export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactRecord {
    pub path: PathBuf,
    pub format: OutputFormat,
    pub tokens: usize,
}

/// Result of [`export_network`]
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub artifacts: Vec<ArtifactRecord>,
    pub summary_path: PathBuf,
    pub summary: NetworkSummary,
    /// Values clamped to the quantizer bounds across all layers
    pub saturated: usize,
}

/// A single pending file write
pub(crate) struct Job<'a> {
    pub path: PathBuf,
    pub serializer: Serializer,
    pub payload: Payload<'a>,
}

impl Job<'_> {
    fn run(&self) -> Result<ArtifactRecord> {
        let artifact = self.serializer.write(self.payload, &self.path)?;
        tracing::info!(
            path = %self.path.display(),
            tokens = artifact.token_count(),
            "wrote {}",
            artifact.format()
        );
        Ok(ArtifactRecord {
            path: self.path.clone(),
            format: artifact.format(),
            tokens: artifact.token_count(),
        })
    }
}

/// Create `dir` and run jobs in order, or on the rayon pool when `parallel`
/// is set
///
/// Two jobs targeting the same path are rejected before anything is
/// written.
pub(crate) fn run_jobs(
    jobs: &[Job<'_>],
    dir: &Path,
    parallel: bool,
) -> Result<Vec<ArtifactRecord>> {
    let mut seen = HashSet::with_capacity(jobs.len());
    if let Some(dup) = jobs.iter().find(|job| !seen.insert(job.path.as_path())) {
        return Err(PipelineError::Config(format!(
            "{} would be written more than once; rename the colliding layers or images",
            dup.path.display()
        )));
    }

    create_output_dir(dir)?;
    if parallel {
        jobs.par_iter().map(Job::run).collect()
    } else {
        jobs.iter().map(Job::run).collect()
    }
}

fn create_output_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|source| PipelineError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

/// File-name-safe form of a layer or image name
pub fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Quantize every layer and write weights, biases and the summary
///
/// Every layer is quantized before the first file is written, so a
/// non-finite value anywhere leaves the output directory untouched.
pub fn export_network(network: &Network, config: &ExportConfig) -> Result<ExportReport> {
    let quantizer = config.quantizer()?;
    let network = if config.network.select_outputs.is_empty() {
        network.clone()
    } else {
        network.clone().select_outputs(&config.network.select_outputs)?
    };

    let quantized = network
        .layers()
        .iter()
        .map(|layer| layer.quantize(&quantizer))
        .collect::<std::result::Result<Vec<QuantizedLayer>, ModelError>>()?;

    let saturated: usize = quantized.iter().map(|q| q.saturated).sum();
    for layer in quantized.iter().filter(|q| q.saturated > 0) {
        tracing::warn!(
            "{}: {} values clamped to [{}, {}]",
            layer.name,
            layer.saturated,
            quantizer.bounds().min,
            quantizer.bounds().max
        );
    }

    if let Some(input) = config.network.input {
        if input.pixels() != network.input_features() {
            tracing::warn!(
                "Input geometry {}x{} has {} pixels but the first layer takes {}",
                input.width,
                input.height,
                input.pixels(),
                network.input_features()
            );
        }
    }

    let dir = &config.output_dir;
    let mut jobs = Vec::with_capacity(quantized.len() * config.formats.len() * 2);
    for layer in &quantized {
        let stem = file_stem(&layer.name);
        for &format in &config.formats {
            let serializer = config.serializer(format, DigitWidth::Four);
            let ext = format.extension();
            jobs.push(Job {
                path: dir.join(format!("{stem}_weights.{ext}")),
                serializer,
                payload: Payload::from(&layer.weights),
            });
            jobs.push(Job {
                path: dir.join(format!("{stem}_biases.{ext}")),
                serializer,
                payload: Payload::from(&layer.biases),
            });
        }
    }
    let artifacts = run_jobs(&jobs, dir, config.parallel)?;

    let summary = network.summary(config.network.input);
    let summary_path = dir.join(SUMMARY_FILE);
    write_atomic(&summary_path, summary.render().as_bytes())?;
    tracing::info!(
        "Exported {} layers ({} parameters, {} bytes of BRAM) to {}",
        summary.layers.len(),
        summary.total_parameters(),
        summary.bram_bytes(),
        dir.display()
    );

    Ok(ExportReport {
        artifacts,
        summary_path,
        summary,
        saturated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("layer1"), "layer1");
        assert_eq!(file_stem("model.fc-2/out"), "model_fc-2_out");
    }
}
