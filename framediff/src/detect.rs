//! # Pixel difference motion detection

use crate::prelude::v1::*;
use log::*;

/// Frame differencing motion detector.
///
/// Compares consecutive luminance frames pixel by pixel and declares motion when the
/// number of pixels whose intensity changed by more than `pixel_threshold` exceeds
/// `count_threshold`. The count threshold is conventionally quoted as a fraction of the
/// frame, but the decision compares it against the raw changed pixel count.
pub struct PixelDiffDetection {
    pixel_threshold: u8,
    count_threshold: f64,
}

impl Default for PixelDiffDetection {
    fn default() -> Self {
        Self {
            pixel_threshold: 10,
            count_threshold: 0.0004,
        }
    }
}

impl PixelDiffDetection {
    /// Create a detector with the given thresholds.
    ///
    /// # Arguments
    ///
    /// * `pixel_threshold` - intensity delta above which a pixel counts as changed.
    /// * `count_threshold` - changed pixel count above which a frame pair counts as motion.
    pub fn new(pixel_threshold: u8, count_threshold: f64) -> Self {
        Self {
            pixel_threshold,
            count_threshold,
        }
    }

    /// Decide whether a pair of consecutive frames constitutes motion.
    ///
    /// Returns `Ok(false)` when `previous` is `None`, since the first frame of a stream
    /// has no baseline to compare against. Fails when the two frames disagree in
    /// geometry.
    pub fn detect(&self, previous: Option<&LumaFrame>, current: &LumaFrame) -> Result<bool> {
        let previous = match previous {
            Some(previous) => previous,
            None => return Ok(false),
        };

        let diff = previous.abs_diff(current)?;
        let changed = diff.count_over(self.pixel_threshold);
        let fraction = changed as f64 / diff.size() as f64;

        debug!(
            "{} pixels changed (fraction {:.6}, peak delta {})",
            changed,
            fraction,
            diff.peak()
        );

        Ok(changed as f64 > self.count_threshold)
    }
}
