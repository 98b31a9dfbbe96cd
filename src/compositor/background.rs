use image::Rgb;

use super::soften;
use crate::perception::SegmentationMask;
use crate::Frame;

/// Replace background pixels with a solid `color`.
///
/// The foreground mask is smoothed with `sigma`, clamped to [0, 1] and used as
/// `out = frame * mask + color * (1 - mask)`. With no color (the "remove"
/// sentinel) or an empty mask the frame is left untouched.
pub fn replace_background(
    frame: &mut Frame,
    mask: &SegmentationMask,
    color: Option<Rgb<u8>>,
    sigma: f32,
) {
    let Some(color) = color else {
        return;
    };
    if mask.is_empty() {
        tracing::debug!("Background replacement skipped: empty mask");
        return;
    }

    let _span = tracing::debug_span!("segmentation").entered();

    let (width, height) = frame.dimensions();
    let mask = mask.fit_to(width, height);
    let alpha = soften(mask.values(), width, height, sigma);

    for (px, &fg) in frame.pixels_mut().zip(alpha.iter()) {
        let bg = 1.0 - fg;
        for c in 0..3 {
            let blended = f32::from(px[c]) * fg + f32::from(color[c]) * bg;
            px[c] = blended.round().clamp(0.0, 255.0) as u8;
        }
    }
}
