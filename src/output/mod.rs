#[cfg(feature = "camera")]
mod loopback;
mod png_sequence;

#[cfg(feature = "camera")]
pub use loopback::V4L2Output;
pub use png_sequence::PngSequenceOutput;

use anyhow::Result;

use crate::Frame;

/// Trait for output destinations
pub trait OutputSink {
    /// Write a frame to the output
    fn write_frame(&mut self, frame: &Frame) -> Result<()>;

    /// Get the expected output resolution
    fn resolution(&self) -> (u32, u32);
}

/// Resize a finished frame to the sink resolution when needed
pub(crate) fn fit_frame(frame: &Frame, width: u32, height: u32) -> std::borrow::Cow<'_, Frame> {
    if frame.dimensions() == (width, height) {
        std::borrow::Cow::Borrowed(frame)
    } else {
        std::borrow::Cow::Owned(image::imageops::resize(
            frame,
            width,
            height,
            image::imageops::FilterType::Lanczos3,
        ))
    }
}
