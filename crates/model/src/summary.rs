//! Human-readable network summary

use std::fmt::Write;

use serde::{Deserialize, Serialize};

/// Bytes per stored parameter (one 16-bit word)
pub const BYTES_PER_PARAM: usize = 2;

/// Grayscale input image feeding the first layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputGeometry {
    pub width: usize,
    pub height: usize,
}

impl InputGeometry {
    pub fn pixels(&self) -> usize {
        self.width * self.height
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSummary {
    /// 1-based position in the network
    pub index: usize,
    pub name: String,
    pub in_features: usize,
    pub out_features: usize,
    pub weight_shape: String,
    pub bias_shape: String,
    pub weights: usize,
    pub biases: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSummary {
    pub input: Option<InputGeometry>,
    pub layers: Vec<LayerSummary>,
}

impl NetworkSummary {
    pub fn total_weights(&self) -> usize {
        self.layers.iter().map(|l| l.weights).sum()
    }

    pub fn total_biases(&self) -> usize {
        self.layers.iter().map(|l| l.biases).sum()
    }

    pub fn total_parameters(&self) -> usize {
        self.total_weights() + self.total_biases()
    }

    /// BRAM needed to hold every parameter as one 16-bit word
    pub fn bram_bytes(&self) -> usize {
        self.total_parameters() * BYTES_PER_PARAM
    }

    /// Render the `network_summary.txt` text
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("Neural Network Weights Summary\n");
        out.push_str("--------------------------\n");
        if let Some(input) = self.input {
            let _ = writeln!(
                out,
                "Input size: {} ({}x{} grayscale)",
                input.pixels(),
                input.width,
                input.height
            );
        }

        for layer in &self.layers {
            let _ = writeln!(
                out,
                "Layer {}: {} -> {}",
                layer.index, layer.in_features, layer.out_features
            );
            let _ = writeln!(out, "  Weights: {} parameters", layer.weights);
            let _ = writeln!(out, "  Biases: {} parameters", layer.biases);
        }

        let bram = self.bram_bytes();
        let _ = writeln!(out, "\nTotal weights: {} parameters", self.total_weights());
        let _ = writeln!(out, "Total biases: {} parameters", self.total_biases());
        let _ = writeln!(out, "Total parameters: {} parameters", self.total_parameters());
        let _ = writeln!(
            out,
            "BRAM requirement: {} bytes ({:.2} KB)",
            bram,
            bram as f64 / 1024.0
        );
        out
    }
}
