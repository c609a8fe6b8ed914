//! Owned 8-bit grayscale buffers

use std::path::Path;

use crate::error::{ImageError, Result};

/// Row-major 8-bit grayscale image
///
/// `pixels()[y * width + x]` is the pixel at column `x`, row `y`. This is the
/// order in which pixels are written to BRAM.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl GrayImage {
    /// Wrap raw bytes; the length must equal `width * height`
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        let expected = pixel_count(width, height)?;
        if data.len() != expected {
            return Err(ImageError::SizeMismatch {
                width,
                height,
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// All-black image
    pub fn blank(width: usize, height: usize) -> Result<Self> {
        let len = pixel_count(width, height)?;
        Self::new(width, height, vec![0; len])
    }

    /// Read a headerless 8-bit grayscale dump of known geometry
    pub fn from_raw_file(path: &Path, width: usize, height: usize) -> Result<Self> {
        let data = std::fs::read(path).map_err(|source| ImageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(width, height, data)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixels in row-major order
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    pub fn row(&self, y: usize) -> &[u8] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x < self.width && y < self.height {
            Some(self.data[y * self.width + x])
        } else {
            None
        }
    }

    pub(crate) fn set(&mut self, x: usize, y: usize, value: u8) {
        self.data[y * self.width + x] = value;
    }

    /// Count of non-zero pixels
    pub fn lit_pixels(&self) -> usize {
        self.data.iter().filter(|&&p| p != 0).count()
    }
}

/// `width * height`, rejecting empty and overflowing geometries
fn pixel_count(width: usize, height: usize) -> Result<usize> {
    width
        .checked_mul(height)
        .filter(|&n| n > 0)
        .ok_or(ImageError::InvalidSize { width, height })
}
