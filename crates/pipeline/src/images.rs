//! Image export

use bramgen_encoding::{DigitWidth, Payload};
use bramgen_image::{GrayImage, TestPattern};

use crate::config::ExportConfig;
use crate::error::Result;
use crate::weights::{file_stem, run_jobs, ArtifactRecord, Job};

/// Write `<name>_image.<ext>` for every configured image format
///
/// Pixels are emitted row by row as two-digit tokens.
pub fn export_image(
    image: &GrayImage,
    name: &str,
    config: &ExportConfig,
) -> Result<Vec<ArtifactRecord>> {
    let jobs = image_jobs(image, name, config);
    run_jobs(&jobs, &config.output_dir, false)
}

fn image_jobs<'a>(image: &'a GrayImage, name: &str, config: &ExportConfig) -> Vec<Job<'a>> {
    let stem = file_stem(name);
    config
        .image
        .formats
        .iter()
        .map(|&format| Job {
            path: config
                .output_dir
                .join(format!("{stem}_image.{}", format.extension())),
            serializer: config.serializer(format, DigitWidth::Two),
            payload: Payload::from(image.pixels()),
        })
        .collect()
}

/// Render and export every synthetic test pattern at `config.image.size`
pub fn generate_test_images(config: &ExportConfig) -> Result<Vec<ArtifactRecord>> {
    let images = TestPattern::ALL
        .iter()
        .map(|&pattern| Ok((pattern, pattern.render(config.image.size)?)))
        .collect::<Result<Vec<(TestPattern, GrayImage)>>>()?;

    for (pattern, image) in &images {
        tracing::debug!("{}: {} lit pixels", pattern, image.lit_pixels());
    }

    let jobs: Vec<Job<'_>> = images
        .iter()
        .flat_map(|(pattern, image)| image_jobs(image, pattern.stem(), config))
        .collect();
    let records = run_jobs(&jobs, &config.output_dir, config.parallel)?;
    tracing::info!(
        "Generated {} test images ({}x{}) in {}",
        images.len(),
        config.image.size,
        config.image.size,
        config.output_dir.display()
    );
    Ok(records)
}
