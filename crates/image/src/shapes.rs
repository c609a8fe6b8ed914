//! Synthetic binary test images
//!
//! Filled shapes on a black background (lit pixels are 255), used to
//! exercise the FPGA shape classifier without a real dataset.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ImageError, Result};
use crate::gray::GrayImage;

/// Default square image edge in pixels
pub const DEFAULT_SIZE: usize = 60;

const LIT: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestPattern {
    Circle,
    Square,
    Triangle,
    /// Checkerboard, exported under the `custom` name
    Checkerboard,
}

impl TestPattern {
    pub const ALL: [TestPattern; 4] = [
        TestPattern::Circle,
        TestPattern::Square,
        TestPattern::Triangle,
        TestPattern::Checkerboard,
    ];

    /// Output file stem
    pub fn stem(self) -> &'static str {
        match self {
            TestPattern::Circle => "circle",
            TestPattern::Square => "square",
            TestPattern::Triangle => "triangle",
            TestPattern::Checkerboard => "custom",
        }
    }

    /// Render with the default proportions for a `size`x`size` image
    pub fn render(self, size: usize) -> Result<GrayImage> {
        match self {
            TestPattern::Circle => circle(size, size * 5 / 12),
            TestPattern::Square => square(size, size * 2 / 3),
            TestPattern::Triangle => triangle(size),
            TestPattern::Checkerboard => checkerboard(size),
        }
    }
}

impl FromStr for TestPattern {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "circle" => Ok(TestPattern::Circle),
            "square" => Ok(TestPattern::Square),
            "triangle" => Ok(TestPattern::Triangle),
            "checkerboard" | "custom" => Ok(TestPattern::Checkerboard),
            _ => Err(ImageError::UnknownPattern(s.to_string())),
        }
    }
}

impl fmt::Display for TestPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stem())
    }
}

/// Disc of `radius` around the center pixel `(size/2, size/2)`
pub fn circle(size: usize, radius: usize) -> Result<GrayImage> {
    let mut img = GrayImage::blank(size, size)?;
    let c = (size / 2) as i64;
    let r2 = (radius * radius) as i64;
    for y in 0..size {
        for x in 0..size {
            let dx = x as i64 - c;
            let dy = y as i64 - c;
            if dx * dx + dy * dy <= r2 {
                img.set(x, y, LIT);
            }
        }
    }
    Ok(img)
}

/// Centered axis-aligned square with edge `side`
pub fn square(size: usize, side: usize) -> Result<GrayImage> {
    let mut img = GrayImage::blank(size, size)?;
    let side = side.min(size);
    let start = (size - side) / 2;
    for y in start..start + side {
        for x in start..start + side {
            img.set(x, y, LIT);
        }
    }
    Ok(img)
}

/// Upward-pointing triangle: apex at row `size/3`, widening one pixel per
/// side per row, `2*size/3` rows tall
pub fn triangle(size: usize) -> Result<GrayImage> {
    let mut img = GrayImage::blank(size, size)?;
    let top = (size / 3) as i64;
    let height = (size * 2 / 3) as i64;
    let mid = (size / 2) as i64;
    for y in 0..size as i64 {
        if y < top || y > top + height {
            continue;
        }
        let half = y - top;
        for x in 0..size as i64 {
            if x >= mid - half && x <= mid + half {
                img.set(x as usize, y as usize, LIT);
            }
        }
    }
    Ok(img)
}

/// Checkerboard of `size/10` cells, top-left cell lit
pub fn checkerboard(size: usize) -> Result<GrayImage> {
    let mut img = GrayImage::blank(size, size)?;
    let cell = (size / 10).max(1);
    for y in 0..size {
        for x in 0..size {
            if (y / cell + x / cell) % 2 == 0 {
                img.set(x, y, LIT);
            }
        }
    }
    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle() {
        let img = circle(60, 25).unwrap();
        assert_eq!(img.get(30, 30), Some(255));
        assert_eq!(img.get(55, 30), Some(255));
        assert_eq!(img.get(56, 30), Some(0));
        assert_eq!(img.get(0, 0), Some(0));
        // rows and columns through the center are symmetric
        assert_eq!(img.get(30, 5), Some(255));
        assert_eq!(img.get(30, 4), Some(0));
    }

    #[test]
    fn test_square() {
        let img = square(60, 40).unwrap();
        assert_eq!(img.lit_pixels(), 1600);
        assert_eq!(img.get(10, 10), Some(255));
        assert_eq!(img.get(49, 49), Some(255));
        assert_eq!(img.get(9, 10), Some(0));
        assert_eq!(img.get(50, 49), Some(0));
    }

    #[test]
    fn test_triangle() {
        let img = triangle(60).unwrap();
        // apex is a single pixel
        assert_eq!(img.row(20).iter().filter(|&&p| p != 0).count(), 1);
        assert_eq!(img.get(30, 20), Some(255));
        assert_eq!(img.get(30, 19), Some(0));
        // each row widens by two pixels
        assert_eq!(img.row(21).iter().filter(|&&p| p != 0).count(), 3);
        assert_eq!(img.row(59).iter().filter(|&&p| p != 0).count(), 60);
    }

    #[test]
    fn test_checkerboard() {
        let img = checkerboard(60).unwrap();
        assert_eq!(img.get(0, 0), Some(255));
        assert_eq!(img.get(6, 0), Some(0));
        assert_eq!(img.get(6, 6), Some(255));
        assert_eq!(img.lit_pixels(), 1800);
    }

    #[test]
    fn test_default_render_matches_reference_sizes() {
        assert_eq!(
            TestPattern::Circle.render(60).unwrap(),
            circle(60, 25).unwrap()
        );
        assert_eq!(
            TestPattern::Square.render(60).unwrap(),
            square(60, 40).unwrap()
        );
    }

    #[test]
    fn test_pattern_parse() {
        assert_eq!("custom".parse::<TestPattern>().unwrap(), TestPattern::Checkerboard);
        assert_eq!("Circle".parse::<TestPattern>().unwrap(), TestPattern::Circle);
        assert!("star".parse::<TestPattern>().is_err());
    }
}
