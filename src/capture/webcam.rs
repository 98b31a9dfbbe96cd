use super::CaptureSource;
use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::Camera;

use crate::Frame;

/// Live webcam frames, delivered at the pipeline resolution.
pub struct WebcamCapture {
    camera: Camera,
    width: u32,
    height: u32,
}

impl WebcamCapture {
    /// Open camera `device_index` in the mode closest to `width`x`height` at `fps`.
    pub fn new(device_index: u32, width: u32, height: u32, fps: u32) -> Result<Self> {
        let wanted = CameraFormat::new(Resolution::new(width, height), FrameFormat::MJPEG, fps);
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(wanted));

        let mut camera = Camera::new(CameraIndex::Index(device_index), requested)
            .with_context(|| format!("Failed to open camera {}", device_index))?;
        camera
            .open_stream()
            .context("Failed to open camera stream")?;

        let native = camera.resolution();
        tracing::info!(
            "Webcam {} streaming {}x{} @ {} fps, delivering {}x{}",
            device_index,
            native.width(),
            native.height(),
            camera.frame_rate(),
            width,
            height
        );

        Ok(Self {
            camera,
            width,
            height,
        })
    }
}

impl CaptureSource for WebcamCapture {
    fn capture_frame(&mut self) -> Result<Option<Frame>> {
        let buffer = self.camera.frame().context("Failed to capture frame")?;
        let frame = buffer
            .decode_image::<RgbFormat>()
            .context("Failed to decode frame")?;

        // Cameras may not offer the exact mode that was asked for
        if frame.dimensions() == (self.width, self.height) {
            Ok(Some(frame))
        } else {
            Ok(Some(imageops::resize(
                &frame,
                self.width,
                self.height,
                FilterType::Triangle,
            )))
        }
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Drop for WebcamCapture {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            tracing::warn!("Failed to stop camera stream: {}", e);
        }
    }
}
