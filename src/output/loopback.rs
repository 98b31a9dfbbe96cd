use super::{fit_frame, OutputSink};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use v4l::video::Output;
use v4l::{Device, Format, FourCC};

use crate::Frame;

/// Streams frames into a v4l2loopback device as YUYV.
pub struct V4L2Output {
    file: File,
    width: u32,
    height: u32,
    buffer: Vec<u8>,
}

impl V4L2Output {
    pub fn new<P: AsRef<Path>>(device_path: P, width: u32, height: u32) -> Result<Self> {
        let path = device_path.as_ref();
        tracing::info!(
            "Opening v4l2loopback device at {} ({}x{})",
            path.display(),
            width,
            height
        );

        // Announce the YUYV format so readers negotiate the right size
        let device = Device::with_path(path)
            .with_context(|| format!("Failed to open v4l2 device at {}", path.display()))?;
        let format = Format::new(width, height, FourCC::new(b"YUYV"));
        Output::set_format(&device, &format).context("Failed to set output format")?;

        // v4l2loopback accepts raw frame data written to the device file
        let file = File::options()
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open v4l2loopback device at {}", path.display()))?;

        tracing::info!("v4l2loopback device opened successfully");

        Ok(Self {
            file,
            width,
            height,
            buffer: Vec::with_capacity(width as usize * height as usize * 2),
        })
    }
}

/// Full-range BT.601 luma and chroma of one packed RGB pixel.
fn yuv(rgb: &[u8]) -> (f32, f32, f32) {
    let (r, g, b) = (f32::from(rgb[0]), f32::from(rgb[1]), f32::from(rgb[2]));
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let u = 128.0 - 0.168_736 * r - 0.331_264 * g + 0.5 * b;
    let v = 128.0 + 0.5 * r - 0.418_688 * g - 0.081_312 * b;
    (y, u, v)
}

fn to_byte(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Pack a frame as YUV 4:2:2 (`Y0 U Y1 V`), chroma averaged over each
/// horizontal pixel pair. An odd last column is paired with itself.
fn pack_yuyv(frame: &Frame, out: &mut Vec<u8>) {
    out.clear();
    let stride = frame.width() as usize * 3;
    if stride == 0 {
        return;
    }

    for row in frame.as_raw().chunks_exact(stride) {
        for pair in row.chunks(6) {
            let (y0, u0, v0) = yuv(&pair[..3]);
            let (y1, u1, v1) = if pair.len() == 6 {
                yuv(&pair[3..])
            } else {
                (y0, u0, v0)
            };
            out.extend_from_slice(&[
                to_byte(y0),
                to_byte((u0 + u1) / 2.0),
                to_byte(y1),
                to_byte((v0 + v1) / 2.0),
            ]);
        }
    }
}

impl OutputSink for V4L2Output {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let frame = fit_frame(frame, self.width, self.height);
        pack_yuyv(&frame, &mut self.buffer);

        self.file
            .write_all(&self.buffer)
            .context("Failed to write frame to v4l2loopback device")?;

        Ok(())
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
    fn yuyv_packs_two_pixels_per_four_bytes() {
        let frame = Frame::from_pixel(4, 2, Rgb([255, 255, 255]));
        let mut data = Vec::new();
        pack_yuyv(&frame, &mut data);
        assert_eq!(data.len(), 4 * 2 * 2);
        assert_eq!(data[0], 255);
        assert!((127..=129).contains(&data[1]));
        assert!((127..=129).contains(&data[3]));
    }

    #[test]
    fn odd_width_pairs_last_pixel_with_itself() {
        let frame = Frame::from_pixel(3, 1, Rgb([0, 0, 0]));
        let mut data = vec![9; 100];
        pack_yuyv(&frame, &mut data);
        assert_eq!(data, vec![0, 128, 0, 128, 0, 128, 0, 128]);
    }
}
