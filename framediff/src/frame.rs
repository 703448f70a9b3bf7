//! # Luminance frames and difference maps

use anyhow::{anyhow, Result};
use std::fmt;

/// Error returned when two frames of differing geometry are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionMismatch {
    /// Geometry of the older frame.
    pub previous: (usize, usize),
    /// Geometry of the newer frame.
    pub current: (usize, usize),
}

impl fmt::Display for DimensionMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frame dimensions changed from {}x{} to {}x{}",
            self.previous.0, self.previous.1, self.current.0, self.current.1
        )
    }
}

impl std::error::Error for DimensionMismatch {}

/// Single-channel luminance frame.
///
/// Pixels are unsigned 8-bit intensity samples stored in row-major order.
#[derive(Clone, Debug)]
pub struct LumaFrame {
    data: Vec<u8>,
    width: usize,
}

impl LumaFrame {
    /// Create a zeroed frame.
    ///
    /// # Arguments
    ///
    /// * `width` - width of the frame.
    /// * `height` - height of the frame.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: vec![0; width * height],
            width,
        }
    }

    /// Wrap raw luminance samples.
    ///
    /// Fails when the sample count does not match `width * height`.
    pub fn from_luma(data: Vec<u8>, width: usize, height: usize) -> Result<Self> {
        if data.len() != width * height {
            Err(anyhow!(
                "luminance buffer holds {} samples, expected {}x{}",
                data.len(),
                width,
                height
            ))
        } else {
            Ok(Self { data, width })
        }
    }

    /// Convert packed 8-bit RGB samples to luminance.
    ///
    /// Uses integer BT.601 weights.
    pub fn from_rgb(rgb: &[u8], width: usize, height: usize) -> Result<Self> {
        if rgb.len() != width * height * 3 {
            return Err(anyhow!(
                "rgb buffer holds {} bytes, expected {}x{}x3",
                rgb.len(),
                width,
                height
            ));
        }

        let data = rgb
            .chunks_exact(3)
            .map(|px| ((px[0] as u32 * 299 + px[1] as u32 * 587 + px[2] as u32 * 114) / 1000) as u8)
            .collect();

        Ok(Self { data, width })
    }

    /// Get width and height of the frame.
    pub fn dim(&self) -> (usize, usize) {
        if self.width == 0 {
            (0, 0)
        } else {
            (self.width, self.data.len() / self.width)
        }
    }

    /// Get size of the frame.
    ///
    /// This is the same as `width * height`.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Get the samples in row-major order.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Get intensity at coordinates.
    ///
    /// # Arguments
    ///
    /// * `x` - horizontal coordinate.
    /// * `y` - vertical coordinate.
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[self.width * y + x]
    }

    /// Set intensity at given position.
    ///
    /// # Arguments
    ///
    /// * `x` - horizontal coordinate to set at.
    /// * `y` - vertical coordinate to set at.
    /// * `value` - intensity to set.
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.data[self.width * y + x] = value;
    }

    /// Compute the absolute per-pixel difference against a newer frame.
    ///
    /// Fails with [`DimensionMismatch`] when the two frames disagree in geometry.
    ///
    /// # Arguments
    ///
    /// * `current` - the newer frame to compare against.
    pub fn abs_diff(&self, current: &LumaFrame) -> Result<DiffMap> {
        if self.dim() != current.dim() {
            return Err(DimensionMismatch {
                previous: self.dim(),
                current: current.dim(),
            }
            .into());
        }

        let data = self
            .data
            .iter()
            .zip(current.data.iter())
            .map(|(&a, &b)| if a > b { a - b } else { b - a })
            .collect();

        Ok(DiffMap {
            data,
            width: self.width,
        })
    }
}

/// Absolute per-pixel difference between two consecutive luminance frames.
///
/// Lives only for the duration of one detection step.
#[derive(Debug)]
pub struct DiffMap {
    data: Vec<u8>,
    width: usize,
}

impl DiffMap {
    /// Get width and height of the map.
    pub fn dim(&self) -> (usize, usize) {
        if self.width == 0 {
            (0, 0)
        } else {
            (self.width, self.data.len() / self.width)
        }
    }

    /// Get size of the map.
    ///
    /// This is the same as `width * height`.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Count deltas strictly greater than `threshold`.
    pub fn count_over(&self, threshold: u8) -> usize {
        self.data.iter().filter(|&&delta| delta > threshold).count()
    }

    /// Get the largest delta in the map.
    pub fn peak(&self) -> u8 {
        self.data.iter().copied().max().unwrap_or(0)
    }

    /// Get the delta at coordinates.
    ///
    /// # Arguments
    ///
    /// * `x` - horizontal coordinate.
    /// * `y` - vertical coordinate.
    pub fn get_delta(&self, x: usize, y: usize) -> u8 {
        self.data[self.width * y + x]
    }

    /// Get the deltas in row-major order.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}
