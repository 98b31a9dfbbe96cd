//! Compositing stages: overlay blending, background replacement and hand
//! occlusion restoration.

mod background;
mod occlusion;
mod overlay;

pub use background::replace_background;
pub use occlusion::{hand_alpha, restore_under_hands, restore_with_alpha};
pub use overlay::{blend_at, composite, rotate};

use image::{imageops, ImageBuffer, Luma};

/// Gaussian-smooth a single-channel mask and clamp it to [0, 1].
///
/// A non-positive `sigma` only clamps.
pub(crate) fn soften(values: &[f32], width: u32, height: u32, sigma: f32) -> Vec<f32> {
    let clamped = values.iter().map(|v| v.clamp(0.0, 1.0));
    if sigma <= 0.0 {
        return clamped.collect();
    }

    let mask: ImageBuffer<Luma<f32>, Vec<f32>> =
        match ImageBuffer::from_raw(width, height, clamped.collect()) {
            Some(mask) => mask,
            None => return values.iter().map(|v| v.clamp(0.0, 1.0)).collect(),
        };

    imageops::blur(&mask, sigma)
        .into_raw()
        .into_iter()
        .map(|v| v.clamp(0.0, 1.0))
        .collect()
}
