//! Quantized word sequences

use crate::error::Result;
use crate::fixed::{check_finite, QFormat, Quantizer};

/// Ordered words sharing one format
///
/// Element order is the row-major flatten order of the source tensor and is
/// never changed by any operation here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordVector {
    /// Raw 16-bit words
    pub data: Vec<u16>,
    /// Format every word is encoded in
    pub format: QFormat,
}

impl WordVector {
    /// Wrap already-encoded words
    pub fn from_raw(data: Vec<u16>, format: QFormat) -> Self {
        Self { data, format }
    }

    /// Quantize a slice; fails on the first non-finite value before any
    /// word is produced
    pub fn from_f64_slice(values: &[f64], quantizer: &Quantizer) -> Result<Self> {
        Self::from_values(values.iter().copied(), values.len(), quantizer)
    }

    /// Quantize f32 values (the usual weight storage type)
    pub fn from_f32_slice(values: &[f32], quantizer: &Quantizer) -> Result<Self> {
        Self::from_values(values.iter().map(|&v| v as f64), values.len(), quantizer)
    }

    fn from_values<I>(values: I, len: usize, quantizer: &Quantizer) -> Result<Self>
    where
        I: Iterator<Item = f64> + Clone,
    {
        for (index, value) in values.clone().enumerate() {
            check_finite(index, value)?;
        }

        let mut data = Vec::with_capacity(len);
        data.extend(values.map(|v| quantizer.quantize(v)));

        Ok(Self {
            data,
            format: quantizer.format(),
        })
    }

    /// Decode back to real values
    pub fn to_f64_vec(&self) -> Vec<f64> {
        self.data.iter().map(|&w| self.format.decode(w)).collect()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<u16> {
        self.data.get(index).copied()
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.data
    }

    /// Largest |source - decoded| over the sequence
    pub fn max_abs_error(&self, source: &[f32]) -> f64 {
        self.data
            .iter()
            .zip(source)
            .map(|(&w, &v)| (v as f64 - self.format.decode(w)).abs())
            .fold(0.0, f64::max)
    }
}

/// Count values the quantizer will clamp
pub fn count_saturated(values: &[f32], quantizer: &Quantizer) -> usize {
    let bounds = quantizer.bounds();
    values.iter().filter(|&&v| bounds.saturates(v as f64)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FixedPointError;

    #[test]
    fn test_vector_roundtrip() {
        let q = Quantizer::q1_15();
        let values = vec![0.25, -0.75, 0.0, 0.5, -1.0];
        let vec = WordVector::from_f64_slice(&values, &q).unwrap();
        assert_eq!(vec.data, vec![0x2000, 0xA000, 0x0000, 0x4000, 0x8000]);

        let back = vec.to_f64_vec();
        for (expected, got) in values.iter().zip(&back) {
            assert!((expected - got).abs() < 1e-9);
        }
    }

    #[test]
    fn test_order_preserved() {
        let q = Quantizer::q1_15();
        let vec = WordVector::from_f32_slice(&[0.5, -0.5, 0.25], &q).unwrap();
        assert_eq!(vec.get(0), Some(0x4000));
        assert_eq!(vec.get(1), Some(0xC000));
        assert_eq!(vec.get(2), Some(0x2000));
        assert_eq!(vec.get(3), None);
    }

    #[test]
    fn test_non_finite_reports_index() {
        let q = Quantizer::q1_15();
        let err = WordVector::from_f32_slice(&[0.1, 0.2, f32::NAN], &q).unwrap_err();
        match err {
            FixedPointError::NonFinite { index, .. } => assert_eq!(index, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_saturation_count_and_error() {
        let q = Quantizer::q1_15();
        let values = [0.1f32, 1.5, -2.0, 0.999];
        assert_eq!(count_saturated(&values, &q), 2);

        let vec = WordVector::from_f32_slice(&values[..1], &q).unwrap();
        assert!(vec.max_abs_error(&values[..1]) <= QFormat::Q1_15.lsb());
    }

    #[test]
    fn test_empty() {
        let vec = WordVector::from_f64_slice(&[], &Quantizer::q1_15()).unwrap();
        assert!(vec.is_empty());
        assert_eq!(vec.len(), 0);
    }
}
