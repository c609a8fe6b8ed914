//! Safetensors loading tests against files built on the fly

use bramgen_model::{InputGeometry, LayerSpec, ModelError, SafetensorsLoader};
use safetensors::tensor::TensorView;
use safetensors::Dtype;

fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Serialize `(name, shape, values)` triples as f32 tensors
fn build_safetensors(tensors: &[(&str, Vec<usize>, Vec<f32>)]) -> Vec<u8> {
    let buffers: Vec<(String, Vec<usize>, Vec<u8>)> = tensors
        .iter()
        .map(|(name, shape, values)| (name.to_string(), shape.clone(), f32_bytes(values)))
        .collect();
    let views: Vec<(String, TensorView<'_>)> = buffers
        .iter()
        .map(|(name, shape, bytes)| {
            (
                name.clone(),
                TensorView::new(Dtype::F32, shape.clone(), bytes).unwrap(),
            )
        })
        .collect();
    safetensors::serialize(views, &None).unwrap()
}

fn mlp_bytes() -> Vec<u8> {
    build_safetensors(&[
        ("layer1.weight", vec![4, 3], (0..12).map(|i| i as f32 * 0.05).collect()),
        ("layer1.bias", vec![3], vec![0.1, -0.1, 0.0]),
        ("layer10.weight", vec![2, 4], vec![0.5; 8]),
        ("layer10.bias", vec![4], vec![-0.5, -0.25, 0.25, 0.5]),
        ("layer2.weight", vec![3, 2], vec![-1.5, 0.25, 0.5, -0.5, 0.75, 2.0]),
        ("layer2.bias", vec![2], vec![0.0, 0.0]),
        ("unrelated.scale", vec![1], vec![1.0]),
    ])
}

#[test]
fn test_discover_natural_order() {
    let loader = SafetensorsLoader::from_bytes(mlp_bytes()).unwrap();
    let specs = loader.discover_layers().unwrap();
    let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["layer1", "layer2", "layer10"]);
}

#[test]
fn test_load_network_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.safetensors");
    std::fs::write(&path, mlp_bytes()).unwrap();

    let loader = SafetensorsLoader::from_file(&path).unwrap();
    let net = loader.load_network(&[]).unwrap();
    assert_eq!(net.layers().len(), 3);
    assert_eq!(net.input_features(), 4);
    assert_eq!(net.output_features(), 4);

    let net = net.select_outputs(&[3, 2, 0]).unwrap();
    let summary = net.summary(Some(InputGeometry {
        width: 2,
        height: 2,
    }));
    assert_eq!(summary.total_weights(), 12 + 6 + 6);
    assert_eq!(summary.total_biases(), 3 + 2 + 3);
    assert!(summary.render().contains("Layer 3: 2 -> 3\n"));

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["layers"][2]["bias_shape"], "(3,)");
}

#[test]
fn test_row_major_values_preserved() {
    let loader = SafetensorsLoader::from_bytes(mlp_bytes()).unwrap();
    let tensor = loader.load_tensor("layer2.weight").unwrap();
    assert_eq!(tensor.shape, vec![3, 2]);
    assert_eq!(tensor.data, vec![-1.5, 0.25, 0.5, -0.5, 0.75, 2.0]);
}

#[test]
fn test_explicit_specs_with_transpose() {
    // PyTorch layout: [out=2, in=3]
    let bytes = build_safetensors(&[
        ("fc.weight", vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
        ("fc.bias", vec![2], vec![0.0, 0.0]),
    ]);
    let loader = SafetensorsLoader::from_bytes(bytes).unwrap();
    let spec = LayerSpec {
        transpose: true,
        ..LayerSpec::from_prefix("fc")
    };
    let net = loader.load_network(&[spec]).unwrap();
    let layer = &net.layers()[0];
    assert_eq!(layer.in_features(), 3);
    assert_eq!(layer.out_features(), 2);
    assert_eq!(layer.weight.data, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
}

#[test]
fn test_missing_tensor() {
    let loader = SafetensorsLoader::from_bytes(mlp_bytes()).unwrap();
    let err = loader
        .load_network(&[LayerSpec::from_prefix("layer3")])
        .unwrap_err();
    assert!(matches!(err, ModelError::MissingTensor(name) if name == "layer3.weight"));
}

#[test]
fn test_no_layers() {
    let bytes = build_safetensors(&[("embed", vec![2], vec![0.0, 1.0])]);
    let loader = SafetensorsLoader::from_bytes(bytes).unwrap();
    assert!(matches!(loader.discover_layers(), Err(ModelError::NoLayers)));
}

#[test]
fn test_unsupported_dtype() {
    let raw = [1u8, 2, 3, 4];
    let view = TensorView::new(Dtype::U8, vec![4], &raw).unwrap();
    let bytes = safetensors::serialize(vec![("ids".to_string(), view)], &None).unwrap();
    let loader = SafetensorsLoader::from_bytes(bytes).unwrap();
    assert!(matches!(
        loader.load_tensor("ids"),
        Err(ModelError::InvalidDtype { .. })
    ));
}
