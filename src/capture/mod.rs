mod slot;
mod still;
#[cfg(feature = "camera")]
mod webcam;

pub use slot::{spawn_capture, FrameSlot, Taken};
pub use still::StillImageSource;
#[cfg(feature = "camera")]
pub use webcam::WebcamCapture;

use anyhow::Result;

use crate::Frame;

/// Trait for camera capture sources
pub trait CaptureSource {
    /// Capture a single frame
    ///
    /// Returns `Ok(None)` once the stream is exhausted.
    fn capture_frame(&mut self) -> Result<Option<Frame>>;

    /// Get the resolution of captured frames
    fn resolution(&self) -> (u32, u32);
}
