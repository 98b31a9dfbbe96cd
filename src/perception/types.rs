use anyhow::Result;
use image::{imageops, GrayImage, Luma};
use serde::{Deserialize, Serialize};

use crate::Frame;

/// A normalized landmark: `x`, `y` in [0, 1] relative to frame size, `z` depth.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }
}

/// Furthest a landmark may lie from the frame, in frame sizes.
pub const MAX_REACH: f32 = 4.0;

/// Pixel sums and differences of projected landmarks always fit in `i32`.
const MAX_PIXEL: f32 = (i32::MAX / 4) as f32;

fn project(normalized: f32, size: u32) -> Option<i32> {
    if !normalized.is_finite() || normalized.abs() > MAX_REACH {
        return None;
    }
    let pixel = normalized * size as f32;
    (pixel.abs() <= MAX_PIXEL).then_some(pixel as i32)
}

/// One detected face or hand, indexed by the detector's stable landmark ids
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    pub fn get(&self, index: usize) -> Option<Landmark> {
        self.points.get(index).copied()
    }

    /// Project a landmark to integer pixel coordinates of a `width`x`height` frame.
    ///
    /// Coordinates are truncated, matching how the detector's normalized
    /// output maps onto the pixel grid. Non-finite landmarks and landmarks
    /// more than [`MAX_REACH`] frame sizes from the origin project to `None`.
    pub fn pixel(&self, index: usize, width: u32, height: u32) -> Option<(i32, i32)> {
        let p = self.get(index)?;
        Some((project(p.x, width)?, project(p.y, height)?))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Foreground probability per pixel, 0.0 = background, 1.0 = subject.
/// Flattened in row-major order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMask")]
pub struct SegmentationMask {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct RawMask {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl TryFrom<RawMask> for SegmentationMask {
    type Error = String;

    fn try_from(raw: RawMask) -> std::result::Result<Self, Self::Error> {
        Self::new(raw.width, raw.height, raw.values).ok_or_else(|| {
            format!("mask values do not cover {}x{}", raw.width, raw.height)
        })
    }
}

impl SegmentationMask {
    /// Returns `None` when `values` does not hold exactly `width * height` entries.
    pub fn new(width: u32, height: u32, values: Vec<f32>) -> Option<Self> {
        if values.len() != (width as usize) * (height as usize) {
            return None;
        }
        Some(Self {
            width,
            height,
            values,
        })
    }

    pub fn filled(width: u32, height: u32, value: f32) -> Self {
        Self {
            width,
            height,
            values: vec![value; (width as usize) * (height as usize)],
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Resize the mask to the given frame dimensions
    ///
    /// Masks from lower-resolution models are stretched with a Lanczos
    /// filter through an 8-bit grayscale intermediate.
    pub fn fit_to(&self, target_width: u32, target_height: u32) -> SegmentationMask {
        let _span = tracing::debug_span!("mask_resize").entered();

        if self.dimensions() == (target_width, target_height) || self.is_empty() {
            return self.clone();
        }

        let gray = GrayImage::from_fn(self.width, self.height, |x, y| {
            let idx = (y * self.width + x) as usize;
            let value = (self.values[idx] * 255.0).clamp(0.0, 255.0) as u8;
            Luma([value])
        });

        let resized = imageops::resize(
            &gray,
            target_width,
            target_height,
            imageops::FilterType::Lanczos3,
        );

        SegmentationMask {
            width: target_width,
            height: target_height,
            values: resized.pixels().map(|p| p[0] as f32 / 255.0).collect(),
        }
    }
}

/// Everything the perception collaborator reports for one frame
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Perception {
    #[serde(default)]
    pub faces: Vec<LandmarkSet>,
    #[serde(default)]
    pub hands: Vec<LandmarkSet>,
    #[serde(default)]
    pub mask: Option<SegmentationMask>,
}

impl Perception {
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty() && self.hands.is_empty() && self.mask.is_none()
    }
}

/// Trait for perception backends (face mesh, hand tracker, selfie segmentation)
///
/// Implementations are called synchronously once per frame; the pipeline
/// blocks on the result before compositing.
pub trait PerceptionProvider {
    /// Analyse a frame and report landmarks and an optional segmentation mask
    fn perceive(&mut self, frame: &Frame) -> Result<Perception>;
}
