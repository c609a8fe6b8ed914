//! Safetensors model weight loading

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use half::{bf16, f16};
use safetensors::SafeTensors;

use crate::error::{ModelError, Result};
use crate::network::{DenseLayer, LayerSpec, Network};
use crate::tensor::Tensor;

/// Suffixes accepted for a layer's weight tensor during discovery
const WEIGHT_SUFFIXES: [&str; 2] = [".weight", ".kernel"];

/// Load dense-network weights from a safetensors file
pub struct SafetensorsLoader {
    /// Raw safetensors data
    data: Vec<u8>,
}

impl SafetensorsLoader {
    /// Read a `.safetensors` file into memory
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path.as_ref())?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        let loader = Self { data };
        // fail early on a corrupt header
        loader.tensors()?;
        Ok(loader)
    }

    /// Use an in-memory safetensors buffer
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let loader = Self { data };
        loader.tensors()?;
        Ok(loader)
    }

    fn tensors(&self) -> Result<SafeTensors<'_>> {
        SafeTensors::deserialize(&self.data).map_err(|e| ModelError::Safetensors(e.to_string()))
    }

    /// Tensor names, sorted
    pub fn tensor_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .tensors()?
            .names()
            .into_iter()
            .map(String::from)
            .collect();
        names.sort();
        Ok(names)
    }

    /// Load a tensor as f32 values
    pub fn load_tensor(&self, name: &str) -> Result<Tensor> {
        let tensors = self.tensors()?;
        let tensor = tensors
            .tensor(name)
            .map_err(|_| ModelError::MissingTensor(name.to_string()))?;

        let data = tensor.data();
        let values: Vec<f32> = match tensor.dtype() {
            safetensors::Dtype::F32 => data
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect(),
            safetensors::Dtype::F64 => data
                .chunks_exact(8)
                .map(|b| {
                    f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f32
                })
                .collect(),
            safetensors::Dtype::BF16 => data
                .chunks_exact(2)
                .map(|b| bf16::from_le_bytes([b[0], b[1]]).to_f32())
                .collect(),
            safetensors::Dtype::F16 => data
                .chunks_exact(2)
                .map(|b| f16::from_le_bytes([b[0], b[1]]).to_f32())
                .collect(),
            other => {
                return Err(ModelError::InvalidDtype {
                    expected: "f32, f64, bf16, or f16".to_string(),
                    got: format!("{:?}", other),
                });
            }
        };

        Tensor::new(name, tensor.shape().to_vec(), values)
    }

    /// Load one layer, transposing the weight when `transpose` is set
    pub fn load_layer(&self, spec: &LayerSpec) -> Result<DenseLayer> {
        let mut weight = self.load_tensor(&spec.weight)?;
        if spec.transpose {
            weight = weight.transposed()?;
        }
        let bias = self.load_tensor(&spec.bias)?;
        tracing::debug!(
            layer = %spec.name,
            weight = %weight.shape_string(),
            bias = %bias.shape_string(),
            "loaded layer"
        );
        DenseLayer::new(spec.name.clone(), weight, bias)
    }

    /// Find `<prefix>.weight` (or `.kernel`) / `<prefix>.bias` pairs, ordered
    /// by natural sort of the prefix (`layer2` before `layer10`)
    pub fn discover_layers(&self) -> Result<Vec<LayerSpec>> {
        let names: BTreeSet<String> = self.tensor_names()?.into_iter().collect();

        let mut specs: Vec<LayerSpec> = names
            .iter()
            .filter_map(|name| {
                WEIGHT_SUFFIXES.iter().find_map(|suffix| {
                    let prefix = name.strip_suffix(suffix)?;
                    let bias = format!("{prefix}.bias");
                    names.contains(&bias).then(|| LayerSpec {
                        name: prefix.to_string(),
                        weight: name.clone(),
                        bias,
                        transpose: false,
                    })
                })
            })
            .collect();

        if specs.is_empty() {
            return Err(ModelError::NoLayers);
        }
        specs.sort_by(|a, b| natural_cmp(&a.name, &b.name));
        Ok(specs)
    }

    /// Load the given layers in order, or every discovered layer when `specs`
    /// is empty
    pub fn load_network(&self, specs: &[LayerSpec]) -> Result<Network> {
        let discovered;
        let specs = if specs.is_empty() {
            discovered = self.discover_layers()?;
            &discovered
        } else {
            specs
        };

        let layers = specs
            .iter()
            .map(|spec| self.load_layer(spec))
            .collect::<Result<Vec<_>>>()?;
        tracing::info!("Loaded {} layers", layers.len());
        Network::new(layers)
    }
}

/// Compare strings treating digit runs as numbers
fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a).cmp(&natural_key(b))
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum KeyPart {
    Text(String),
    Number(u64),
}

fn natural_key(s: &str) -> Vec<KeyPart> {
    let mut parts = Vec::new();
    let mut chars = s.chars().peekable();
    while let Some(&c) = chars.peek() {
        let is_digit = c.is_ascii_digit();
        let mut run = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_ascii_digit() != is_digit {
                break;
            }
            run.push(c);
            chars.next();
        }
        parts.push(match run.parse::<u64>() {
            Ok(n) if is_digit => KeyPart::Number(n),
            _ => KeyPart::Text(run),
        });
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_order() {
        let mut names = vec!["layer10", "layer2", "layer1", "output", "layer2a"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["layer1", "layer2", "layer2a", "layer10", "output"]);
    }

    #[test]
    fn test_half_precision_decode() {
        assert_eq!(bf16::from_le_bytes([0x80, 0x3F]).to_f32(), 1.0);
        assert_eq!(bf16::from_le_bytes([0x80, 0xBF]).to_f32(), -1.0);
        assert_eq!(f16::from_le_bytes([0x00, 0x38]).to_f32(), 0.5);
    }

    #[test]
    fn test_corrupt_buffer_rejected() {
        assert!(matches!(
            SafetensorsLoader::from_bytes(vec![1, 2, 3]),
            Err(ModelError::Safetensors(_))
        ));
    }
}
