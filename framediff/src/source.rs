//! # Frame acquisition

use crate::prelude::v1::*;

/// Ordered source of luminance frames.
pub trait FrameSource {
    /// Read the next frame of the stream.
    ///
    /// Blocks until a frame is available. Any failure, including a clean end of stream,
    /// is terminal and the source must not be read again after returning `Err`.
    fn next_frame(&mut self) -> Result<LumaFrame>;

    /// Get the frame geometry of the stream.
    ///
    /// This will return `Some((width, height))` if it is known.
    fn dimensions(&self) -> Option<(usize, usize)>;

    /// Get the framerate of the stream.
    ///
    /// This will return `Some(framerate)` if it is known. On realtime streams it may
    /// not always be known. In such cases, `None` is returned.
    fn framerate(&self) -> Option<f64>;
}
