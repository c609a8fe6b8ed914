//! bramgen Export Pipelines
//!
//! Ties the fixed-point quantizer, the hex/COE serializer and the model and
//! image sources together. Every output location comes from
//! [`ExportConfig`].

mod config;
mod error;
mod images;
mod verify;
mod weights;

pub use config::{ExportConfig, ImageConfig, NetworkConfig, QuantizationConfig};
pub use error::{PipelineError, Result};
pub use images::{export_image, generate_test_images};
pub use verify::{verify_artifact, verify_artifact_as, VerifyReport};
pub use weights::{export_network, file_stem, ArtifactRecord, ExportReport, SUMMARY_FILE};
