//! Fully connected network layers

use bramgen_fixed_point::{count_saturated, Quantizer, WordVector};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::summary::{InputGeometry, LayerSummary, NetworkSummary};
use crate::tensor::Tensor;

/// Where to find one layer's tensors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSpec {
    /// Name used for output files, e.g. `layer1`
    pub name: String,
    /// Weight tensor name
    pub weight: String,
    /// Bias tensor name
    pub bias: String,
    /// Weight is stored `[out, in]` (PyTorch `nn.Linear`) and must be
    /// transposed to `[in, out]`
    #[serde(default)]
    pub transpose: bool,
}

impl LayerSpec {
    /// `<prefix>.weight` / `<prefix>.bias`, named after the prefix
    pub fn from_prefix(prefix: &str) -> Self {
        Self {
            name: prefix.to_string(),
            weight: format!("{prefix}.weight"),
            bias: format!("{prefix}.bias"),
            transpose: false,
        }
    }
}

/// Weight matrix `[in, out]` plus bias `[out]`
#[derive(Debug, Clone, PartialEq)]
pub struct DenseLayer {
    pub name: String,
    pub weight: Tensor,
    pub bias: Tensor,
}

/// A layer after quantization, in flatten order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedLayer {
    pub name: String,
    pub weights: WordVector,
    pub biases: WordVector,
    /// Values that hit the clamp bounds
    pub saturated: usize,
}

impl DenseLayer {
    pub fn new(name: impl Into<String>, weight: Tensor, bias: Tensor) -> Result<Self> {
        let [_, out_features] = weight.matrix_dims()?;
        if bias.shape != [out_features] {
            return Err(ModelError::InvalidShape {
                name: bias.name,
                expected: vec![out_features],
                got: bias.shape,
            });
        }
        Ok(Self {
            name: name.into(),
            weight,
            bias,
        })
    }

    pub fn in_features(&self) -> usize {
        self.weight.shape[0]
    }

    pub fn out_features(&self) -> usize {
        self.weight.shape[1]
    }

    /// Keep only the given output columns, in the given order
    ///
    /// Column `k` of the result is column `indices[k]` of this layer; the bias
    /// is reordered the same way.
    pub fn select_outputs(&self, indices: &[usize]) -> Result<Self> {
        let out = self.out_features();
        if let Some(&index) = indices.iter().find(|&&i| i >= out) {
            return Err(ModelError::InvalidSelection {
                index,
                outputs: out,
            });
        }

        let rows = self.in_features();
        let mut weight = Vec::with_capacity(rows * indices.len());
        // a zero-width matrix has no rows to walk
        if out > 0 {
            for row in self.weight.data.chunks_exact(out) {
                weight.extend(indices.iter().map(|&i| row[i]));
            }
        }
        let bias = indices.iter().map(|&i| self.bias.data[i]).collect();

        Self::new(
            self.name.clone(),
            Tensor::new(
                self.weight.name.clone(),
                vec![rows, indices.len()],
                weight,
            )?,
            Tensor::new(self.bias.name.clone(), vec![indices.len()], bias)?,
        )
    }

    /// Quantize weights then biases, both in row-major order
    pub fn quantize(&self, quantizer: &Quantizer) -> Result<QuantizedLayer> {
        let weights = WordVector::from_f32_slice(&self.weight.data, quantizer)?;
        let biases = WordVector::from_f32_slice(&self.bias.data, quantizer)?;
        let saturated = count_saturated(&self.weight.data, quantizer)
            + count_saturated(&self.bias.data, quantizer);
        Ok(QuantizedLayer {
            name: self.name.clone(),
            weights,
            biases,
            saturated,
        })
    }
}

/// Ordered chain of dense layers
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    layers: Vec<DenseLayer>,
}

impl Network {
    /// Each layer's input width must match the previous layer's output width
    pub fn new(layers: Vec<DenseLayer>) -> Result<Self> {
        if layers.is_empty() {
            return Err(ModelError::NoLayers);
        }
        for pair in layers.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if prev.out_features() != next.in_features() {
                return Err(ModelError::LayerMismatch {
                    prev: prev.name.clone(),
                    next: next.name.clone(),
                    expected: next.in_features(),
                    got: prev.out_features(),
                });
            }
        }
        Ok(Self { layers })
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    pub fn input_features(&self) -> usize {
        self.layers[0].in_features()
    }

    pub fn output_features(&self) -> usize {
        self.layers[self.layers.len() - 1].out_features()
    }

    /// Restrict the output layer to a subset of classes
    pub fn select_outputs(mut self, indices: &[usize]) -> Result<Self> {
        if let Some(last) = self.layers.last_mut() {
            *last = last.select_outputs(indices)?;
        }
        Ok(self)
    }

    pub fn summary(&self, input: Option<InputGeometry>) -> NetworkSummary {
        let layers = self
            .layers
            .iter()
            .enumerate()
            .map(|(i, layer)| LayerSummary {
                index: i + 1,
                name: layer.name.clone(),
                in_features: layer.in_features(),
                out_features: layer.out_features(),
                weight_shape: layer.weight.shape_string(),
                bias_shape: layer.bias.shape_string(),
                weights: layer.weight.numel(),
                biases: layer.bias.numel(),
            })
            .collect();
        NetworkSummary { input, layers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(name: &str, rows: usize, cols: usize, base: f32) -> DenseLayer {
        let weight: Vec<f32> = (0..rows * cols).map(|i| base + i as f32 * 0.01).collect();
        let bias: Vec<f32> = (0..cols).map(|i| -(i as f32) * 0.1).collect();
        DenseLayer::new(
            name,
            Tensor::new(format!("{name}.weight"), vec![rows, cols], weight).unwrap(),
            Tensor::new(format!("{name}.bias"), vec![cols], bias).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_bias_shape_checked() {
        let weight = Tensor::new("w", vec![2, 3], vec![0.0; 6]).unwrap();
        let bias = Tensor::new("b", vec![2], vec![0.0; 2]).unwrap();
        assert!(matches!(
            DenseLayer::new("l", weight, bias),
            Err(ModelError::InvalidShape { .. })
        ));
    }

    #[test]
    fn test_select_outputs_reorders_columns() {
        // 2 inputs x 4 classes [triangle, star, square, circle]
        let weight = Tensor::new(
            "w",
            vec![2, 4],
            vec![0.0, 0.1, 0.2, 0.3, 1.0, 1.1, 1.2, 1.3],
        )
        .unwrap();
        let bias = Tensor::new("b", vec![4], vec![-0.0, -0.1, -0.2, -0.3]).unwrap();
        let out = DenseLayer::new("output", weight, bias).unwrap();

        let picked = out.select_outputs(&[3, 2, 0]).unwrap();
        assert_eq!(picked.weight.shape, vec![2, 3]);
        assert_eq!(picked.weight.data, vec![0.3, 0.2, 0.0, 1.3, 1.2, 1.0]);
        assert_eq!(picked.bias.data, vec![-0.3, -0.2, -0.0]);

        assert!(matches!(
            out.select_outputs(&[4]),
            Err(ModelError::InvalidSelection {
                index: 4,
                outputs: 4
            })
        ));
    }

    #[test]
    fn test_select_outputs_zero_width() {
        let empty = DenseLayer::new(
            "empty",
            Tensor::new("w", vec![3, 0], vec![]).unwrap(),
            Tensor::new("b", vec![0], vec![]).unwrap(),
        )
        .unwrap();
        let picked = empty.select_outputs(&[]).unwrap();
        assert_eq!(picked.weight.shape, vec![3, 0]);
        assert!(picked.bias.data.is_empty());

        let net = Network::new(vec![empty]).unwrap().select_outputs(&[]).unwrap();
        assert_eq!(net.output_features(), 0);
    }

    #[test]
    fn test_network_chain_checked() {
        let ok = Network::new(vec![layer("l1", 4, 3, 0.0), layer("l2", 3, 2, 0.0)]).unwrap();
        assert_eq!(ok.input_features(), 4);
        assert_eq!(ok.output_features(), 2);

        let err = Network::new(vec![layer("l1", 4, 3, 0.0), layer("l2", 5, 2, 0.0)]).unwrap_err();
        assert!(matches!(err, ModelError::LayerMismatch { expected: 5, got: 3, .. }));
        assert!(matches!(Network::new(vec![]), Err(ModelError::NoLayers)));
    }

    #[test]
    fn test_network_select_outputs() {
        let net = Network::new(vec![layer("l1", 4, 3, 0.0), layer("out", 3, 4, 0.0)])
            .unwrap()
            .select_outputs(&[3, 2, 0])
            .unwrap();
        assert_eq!(net.output_features(), 3);
        assert_eq!(net.layers()[0].out_features(), 3);
    }

    #[test]
    fn test_quantize_layer() {
        let l = layer("l1", 2, 2, 0.5);
        let q = l.quantize(&Quantizer::q1_15()).unwrap();
        // 0.5, 0.51, 0.52, 0.53 / 0.0, -0.1
        assert_eq!(q.weights.len(), 4);
        assert_eq!(q.weights.get(0), Some(0x4000));
        assert_eq!(q.biases.get(0), Some(0x0000));
        assert_eq!(q.biases.get(1), Some(Quantizer::q1_15().quantize(-0.1f32 as f64)));
        assert_eq!(q.saturated, 0);

        let hot = layer("hot", 1, 2, 1.5);
        assert_eq!(hot.quantize(&Quantizer::q1_15()).unwrap().saturated, 2);
    }

    #[test]
    fn test_quantize_rejects_nan() {
        let mut l = layer("l1", 2, 2, 0.0);
        l.weight.data[3] = f32::NAN;
        assert!(matches!(
            l.quantize(&Quantizer::q1_15()),
            Err(ModelError::FixedPoint(_))
        ));
    }
}
