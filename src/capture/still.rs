use super::CaptureSource;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::Frame;

/// Serves decoded image files as camera frames at a fixed rate
///
/// Every image is resized to the configured resolution. With `looped` the
/// sequence repeats forever; otherwise the stream ends after the last file.
pub struct StillImageSource {
    frames: Vec<Frame>,
    cursor: usize,
    looped: bool,
    interval: Duration,
    last: Option<Instant>,
    width: u32,
    height: u32,
}

impl StillImageSource {
    pub fn open(paths: &[PathBuf], width: u32, height: u32, fps: u32, looped: bool) -> Result<Self> {
        if paths.is_empty() {
            bail!("No input images given");
        }

        let mut frames = Vec::with_capacity(paths.len());
        for path in paths {
            let image = image::open(path)
                .with_context(|| format!("Failed to load {}", path.display()))?
                .to_rgb8();
            frames.push(image);
        }
        tracing::info!("Loaded {} still frames", frames.len());

        Ok(Self::from_frames(frames, width, height, fps, looped))
    }

    pub fn from_frames(frames: Vec<Frame>, width: u32, height: u32, fps: u32, looped: bool) -> Self {
        let frames = frames
            .into_iter()
            .map(|frame| {
                if frame.dimensions() == (width, height) {
                    frame
                } else {
                    image::imageops::resize(
                        &frame,
                        width,
                        height,
                        image::imageops::FilterType::Triangle,
                    )
                }
            })
            .collect();

        Self {
            frames,
            cursor: 0,
            looped,
            interval: Duration::from_secs_f32(1.0 / fps.max(1) as f32),
            last: None,
            width,
            height,
        }
    }
}

impl CaptureSource for StillImageSource {
    fn capture_frame(&mut self) -> Result<Option<Frame>> {
        if self.cursor >= self.frames.len() {
            if !self.looped || self.frames.is_empty() {
                return Ok(None);
            }
            self.cursor = 0;
        }

        // Pace like a camera would
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                std::thread::sleep(self.interval - elapsed);
            }
        }
        self.last = Some(Instant::now());

        let frame = self.frames[self.cursor].clone();
        self.cursor += 1;
        Ok(Some(frame))
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn ends_after_last_frame_unless_looped() {
        let frames = vec![Frame::from_pixel(4, 4, Rgb([1, 1, 1])), Frame::new(8, 8)];

        let mut once = StillImageSource::from_frames(frames.clone(), 4, 4, 1000, false);
        assert!(once.capture_frame().unwrap().is_some());
        let second = once.capture_frame().unwrap().unwrap();
        assert_eq!(second.dimensions(), (4, 4));
        assert!(once.capture_frame().unwrap().is_none());

        let mut looped = StillImageSource::from_frames(frames, 4, 4, 1000, true);
        for _ in 0..5 {
            assert!(looped.capture_frame().unwrap().is_some());
        }
    }

    #[test]
    fn open_requires_inputs() {
        assert!(StillImageSource::open(&[], 4, 4, 30, false).is_err());
    }
}
