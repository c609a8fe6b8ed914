//! bramgen CLI
//!
//! Generates FPGA BRAM initialization files from trained network weights
//! and grayscale images.
//!
//! # Usage
//!
//! ```bash
//! # Export every dense layer as hex + COE
//! bramgen weights model.safetensors --out coe_files --input-size 60x60
//!
//! # Keep classes 3, 2 and 0 of the output layer, COE only
//! bramgen weights model.safetensors --format coe --select-outputs 3,2,0
//!
//! # Raw 8-bit grayscale image to hex
//! bramgen image circle.gray --width 60 --height 60 --name circle
//!
//! # Synthetic test images
//! bramgen shapes --out test_images
//!
//! # Read artifacts back
//! bramgen verify coe_files/layer1_weights.coe
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use console::style;

use bramgen_encoding::OutputFormat;
use bramgen_fixed_point::{QFormat, Rounding};
use bramgen_image::GrayImage;
use bramgen_model::{InputGeometry, LayerSpec, SafetensorsLoader};
use bramgen_pipeline::{
    export_image, export_network, generate_test_images, verify_artifact_as, ArtifactRecord,
    ExportConfig,
};

#[derive(Parser)]
#[command(name = "bramgen")]
#[command(version)]
#[command(about = "Generate FPGA BRAM initialization files (hex / COE)")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true, env = "BRAMGEN_CONFIG")]
    config: Option<PathBuf>,

    /// Output directory (overrides config and BRAMGEN_OUTPUT_DIR)
    #[arg(short, long, global = true)]
    out: Option<PathBuf>,

    /// Print a JSON report instead of status lines
    #[arg(long, global = true, default_value = "false")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Quantize dense-layer weights and biases from a safetensors file
    Weights {
        /// Model weights (.safetensors)
        model: PathBuf,

        /// Output format, repeatable (hex, coe)
        #[arg(short, long)]
        format: Vec<OutputFormat>,

        /// Layer tensor prefix, repeatable; discovered when omitted
        #[arg(short, long)]
        layer: Vec<String>,

        /// Weights are stored [out, in] and need transposing
        #[arg(long, default_value = "false")]
        transpose: bool,

        /// Output-layer columns to keep, in order (e.g. 3,2,0)
        #[arg(long, value_delimiter = ',')]
        select_outputs: Vec<usize>,

        /// Fractional bits of the fixed-point format
        #[arg(long)]
        frac_bits: Option<u8>,

        /// Rounding policy (nearest, truncate)
        #[arg(long)]
        rounding: Option<Rounding>,

        /// Input image geometry for the summary (e.g. 60x60)
        #[arg(long, value_parser = parse_geometry)]
        input_size: Option<InputGeometry>,
    },

    /// Convert a raw 8-bit grayscale image to hex
    Image {
        /// Raw row-major pixel file
        input: PathBuf,

        /// Image width in pixels
        #[arg(long)]
        width: usize,

        /// Image height in pixels
        #[arg(long)]
        height: usize,

        /// Output name; defaults to the input file stem
        #[arg(short, long)]
        name: Option<String>,

        /// Also write a COE file
        #[arg(long, default_value = "false")]
        coe: bool,
    },

    /// Write the synthetic circle, square, triangle and checkerboard images
    Shapes {
        /// Edge length in pixels
        #[arg(long)]
        size: Option<usize>,
    },

    /// Parse artifacts back and report their contents
    Verify {
        /// Hex or COE files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bramgen=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ExportConfig::load(cli.config.as_deref())
        .with_context(|| match &cli.config {
            Some(path) => format!("loading {}", path.display()),
            None => "loading default configuration".to_string(),
        })?;
    if let Some(out) = cli.out {
        config.output_dir = out;
    }
    tracing::debug!("Output directory: {}", config.output_dir.display());

    match cli.command {
        Commands::Weights {
            model,
            format,
            layer,
            transpose,
            select_outputs,
            frac_bits,
            rounding,
            input_size,
        } => {
            if !format.is_empty() {
                config.formats = format;
            }
            if !layer.is_empty() {
                config.network.layers = layer
                    .iter()
                    .map(|prefix| LayerSpec {
                        transpose,
                        ..LayerSpec::from_prefix(prefix)
                    })
                    .collect();
            }
            if !select_outputs.is_empty() {
                config.network.select_outputs = select_outputs;
            }
            if let Some(bits) = frac_bits {
                config.quantization.frac_bits = bits;
            }
            if let Some(r) = rounding {
                config.quantization.rounding = r;
            }
            if input_size.is_some() {
                config.network.input = input_size;
            }
            run_weights(&model, &config, cli.json)?;
        }
        Commands::Image {
            input,
            width,
            height,
            name,
            coe,
        } => {
            if coe && !config.image.formats.contains(&OutputFormat::Coe) {
                config.image.formats.push(OutputFormat::Coe);
            }
            let name = match name {
                Some(n) => n,
                None => input
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .context("input path has no file name")?,
            };
            run_image(&input, width, height, &name, &config, cli.json)?;
        }
        Commands::Shapes { size } => {
            if let Some(size) = size {
                config.image.size = size;
            }
            let records = generate_test_images(&config)?;
            report_records(&records, cli.json)?;
        }
        Commands::Verify { files } => {
            let qformat = QFormat::new(
                config.quantization.int_bits,
                config.quantization.frac_bits,
            )?;
            run_verify(&files, qformat, cli.json)?;
        }
    }

    Ok(())
}

fn run_weights(model: &Path, config: &ExportConfig, json: bool) -> Result<()> {
    let loader = SafetensorsLoader::from_file(model)
        .with_context(|| format!("reading {}", model.display()))?;
    let network = loader.load_network(&config.network.layers)?;

    if !json {
        println!(
            "{} {} layers from {}",
            style("Loaded").cyan().bold(),
            network.layers().len(),
            model.display()
        );
    }

    let report = export_network(&network, config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for record in &report.artifacts {
        print_record(record);
    }
    println!();
    print!("{}", report.summary.render());
    if report.saturated > 0 {
        println!(
            "{} {} values were clamped to the representable range",
            style("[WARN]").yellow().bold(),
            report.saturated
        );
    }
    println!(
        "{} Summary written to {}",
        style("[OK]").green().bold(),
        report.summary_path.display()
    );
    Ok(())
}

fn run_image(
    input: &Path,
    width: usize,
    height: usize,
    name: &str,
    config: &ExportConfig,
    json: bool,
) -> Result<()> {
    let image = GrayImage::from_raw_file(input, width, height)?;
    let records = export_image(&image, name, config)?;
    report_records(&records, json)
}

fn run_verify(files: &[PathBuf], qformat: QFormat, json: bool) -> Result<()> {
    let mut reports = Vec::with_capacity(files.len());
    let mut failed = 0usize;

    for file in files {
        match verify_artifact_as(file, qformat) {
            Ok(report) => {
                if !json {
                    let range = match (report.min_value, report.max_value) {
                        (Some(min), Some(max)) => format!(" {qformat} range [{min:.6}, {max:.6}]"),
                        _ => String::new(),
                    };
                    println!(
                        "{} {} ({}, {} tokens x {} digits){}",
                        style("[OK]").green().bold(),
                        report.path.display(),
                        report.format,
                        report.tokens,
                        report.digits,
                        range
                    );
                }
                reports.push(report);
            }
            Err(e) => {
                failed += 1;
                eprintln!("{} {}", style("[ERROR]").red().bold(), e);
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    if failed > 0 {
        bail!("{} of {} files failed verification", failed, files.len());
    }
    Ok(())
}

fn report_records(records: &[ArtifactRecord], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
    } else {
        records.iter().for_each(print_record);
    }
    Ok(())
}

fn print_record(record: &ArtifactRecord) {
    println!(
        "{} {} ({} tokens)",
        style("[OK]").green().bold(),
        record.path.display(),
        record.tokens
    );
}

/// Parse `WIDTHxHEIGHT`
fn parse_geometry(s: &str) -> std::result::Result<InputGeometry, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let width = w
        .trim()
        .parse()
        .map_err(|_| format!("invalid width '{w}'"))?;
    let height = h
        .trim()
        .parse()
        .map_err(|_| format!("invalid height '{h}'"))?;
    Ok(InputGeometry { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_geometry() {
        assert_eq!(
            parse_geometry("60x60").unwrap(),
            InputGeometry {
                width: 60,
                height: 60
            }
        );
        assert_eq!(parse_geometry("32X8").unwrap().pixels(), 256);
        assert!(parse_geometry("60").is_err());
        assert!(parse_geometry("ax4").is_err());
    }

    #[test]
    fn test_weights_args() {
        let cli = Cli::try_parse_from([
            "bramgen",
            "weights",
            "model.safetensors",
            "--format",
            "coe",
            "--select-outputs",
            "3,2,0",
            "--rounding",
            "truncate",
            "--input-size",
            "60x60",
        ])
        .unwrap();
        match cli.command {
            Commands::Weights {
                format,
                select_outputs,
                rounding,
                input_size,
                ..
            } => {
                assert_eq!(format, vec![OutputFormat::Coe]);
                assert_eq!(select_outputs, vec![3, 2, 0]);
                assert_eq!(rounding, Some(Rounding::Truncate));
                assert_eq!(input_size.map(|g| g.pixels()), Some(3600));
            }
            _ => panic!("expected weights"),
        }
    }

    #[test]
    fn test_verify_requires_files() {
        assert!(Cli::try_parse_from(["bramgen", "verify"]).is_err());
    }
}
