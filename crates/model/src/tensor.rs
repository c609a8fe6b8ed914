//! Dense f32 tensors

use crate::error::{ModelError, Result};

/// Named tensor stored row-major (last dimension varies fastest)
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    pub name: String,
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl Tensor {
    /// Create a tensor; `data.len()` must equal the product of `shape`
    pub fn new(name: impl Into<String>, shape: Vec<usize>, data: Vec<f32>) -> Result<Self> {
        let name = name.into();
        let numel = shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d));
        if numel != Some(data.len()) {
            return Err(ModelError::InvalidShape {
                name,
                expected: shape,
                got: vec![data.len()],
            });
        }
        Ok(Self { name, shape, data })
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Swap the two axes of a matrix
    pub fn transposed(&self) -> Result<Self> {
        let [rows, cols] = self.matrix_dims()?;
        let mut data = vec![0.0f32; self.data.len()];
        for i in 0..rows {
            for j in 0..cols {
                data[j * rows + i] = self.data[i * cols + j];
            }
        }
        Ok(Self {
            name: self.name.clone(),
            shape: vec![cols, rows],
            data,
        })
    }

    pub(crate) fn matrix_dims(&self) -> Result<[usize; 2]> {
        match self.shape.as_slice() {
            &[rows, cols] => Ok([rows, cols]),
            _ => Err(ModelError::InvalidShape {
                name: self.name.clone(),
                expected: vec![0, 0],
                got: self.shape.clone(),
            }),
        }
    }

    /// Shape in tuple notation, e.g. `(3600, 64)` or `(64,)`
    pub fn shape_string(&self) -> String {
        match self.shape.as_slice() {
            [single] => format!("({},)", single),
            dims => {
                let parts: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
                format!("({})", parts.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflowing_shape_rejected() {
        let huge = 1usize << (usize::BITS / 2 + 1);
        assert!(matches!(
            Tensor::new("w", vec![huge, huge], vec![]),
            Err(ModelError::InvalidShape { .. })
        ));
    }

    #[test]
    fn test_shape_check() {
        assert!(Tensor::new("w", vec![2, 3], vec![0.0; 6]).is_ok());
        assert!(matches!(
            Tensor::new("w", vec![2, 3], vec![0.0; 5]),
            Err(ModelError::InvalidShape { .. })
        ));
    }

    #[test]
    fn test_transpose() {
        let t = Tensor::new("w", vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let tt = t.transposed().unwrap();
        assert_eq!(tt.shape, vec![3, 2]);
        assert_eq!(tt.data, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        assert_eq!(tt.transposed().unwrap(), t);
    }

    #[test]
    fn test_shape_string() {
        let m = Tensor::new("w", vec![3600, 1], vec![0.0; 3600]).unwrap();
        assert_eq!(m.shape_string(), "(3600, 1)");
        let v = Tensor::new("b", vec![64], vec![0.0; 64]).unwrap();
        assert_eq!(v.shape_string(), "(64,)");
    }
}
