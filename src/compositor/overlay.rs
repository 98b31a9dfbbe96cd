use image::{imageops, Rgba, RgbaImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};

use crate::assets::Asset;
use crate::error::{Error, Result};
use crate::geometry::Placement;
use crate::Frame;

/// Overlays longer than this many frame sides are treated as degenerate.
const MAX_OVERLAY_FRAMES: u32 = 4;

/// Angles below this are drawn without resampling.
const MIN_ROTATION_DEGREES: f32 = 1e-3;

/// Blend `asset` into `frame` at `placement`.
///
/// The asset is resized to the placement box, rotated about its own center
/// with transparent fill, clipped to the frame and alpha-blended. Degenerate
/// placements, a missing asset or a box entirely off-frame leave the frame
/// untouched.
pub fn composite(frame: &mut Frame, asset: Option<&Asset>, placement: &Placement) {
    let Some(asset) = asset else {
        return;
    };
    if placement.is_degenerate() {
        return;
    }

    let _span = tracing::debug_span!("overlay").entered();
    if let Err(e) = try_composite(frame, asset.image(), placement) {
        tracing::debug!("Overlay skipped: {}", e);
    }
}

fn try_composite(frame: &mut Frame, image: &RgbaImage, placement: &Placement) -> Result<()> {
    let (width, height) = (placement.width(), placement.height());
    if i64::from(width.max(height)) > max_overlay_side(frame) {
        return Err(Error::DegenerateGeometry {
            width: width.into(),
            height: height.into(),
        });
    }

    if clip(frame.dimensions(), placement).is_none() {
        return Ok(());
    }

    let resized = imageops::resize(
        image,
        width as u32,
        height as u32,
        imageops::FilterType::Triangle,
    );
    let rotated = rotate(resized, placement.angle);

    blend_at(frame, &rotated, placement.x1, placement.y1);
    Ok(())
}

fn max_overlay_side(frame: &Frame) -> i64 {
    i64::from(frame.width().max(frame.height())) * i64::from(MAX_OVERLAY_FRAMES)
}

/// Rotate counter-clockwise by `degrees` about the center, keeping the canvas
/// size and filling exposed corners with transparent pixels.
pub fn rotate(image: RgbaImage, degrees: f32) -> RgbaImage {
    if degrees.abs() < MIN_ROTATION_DEGREES {
        return image;
    }
    // imageproc rotates clockwise for positive angles
    rotate_about_center(
        &image,
        -degrees.to_radians(),
        Interpolation::Bilinear,
        Rgba([0, 0, 0, 0]),
    )
}

/// Region of the frame covered by the box, as `(x1, y1, x2, y2)`.
fn clip((frame_w, frame_h): (u32, u32), placement: &Placement) -> Option<(u32, u32, u32, u32)> {
    let x1 = placement.x1.max(0);
    let y1 = placement.y1.max(0);
    let x2 = i64::from(placement.x2).min(i64::from(frame_w));
    let y2 = i64::from(placement.y2).min(i64::from(frame_h));

    if i64::from(x1) >= x2 || i64::from(y1) >= y2 {
        return None;
    }
    Some((x1 as u32, y1 as u32, x2 as u32, y2 as u32))
}

/// Alpha-blend an RGBA overlay whose top-left corner sits at `(x, y)`.
///
/// Only the part of the overlay inside the frame is read; pixels outside
/// the overlay's footprint are never written.
pub fn blend_at(frame: &mut Frame, overlay: &RgbaImage, x: i32, y: i32) {
    let (w, h) = overlay.dimensions();
    let placement = Placement::from_origin(x, y, w as i32, h as i32, 0.0);
    let Some((x1, y1, x2, y2)) = clip(frame.dimensions(), &placement) else {
        return;
    };

    // Offset into the overlay when the box starts left of or above the frame
    let crop_x = (x1 as i32 - x) as u32;
    let crop_y = (y1 as i32 - y) as u32;

    for fy in y1..y2 {
        for fx in x1..x2 {
            let fg = overlay.get_pixel(crop_x + fx - x1, crop_y + fy - y1);
            let alpha = f32::from(fg[3]) / 255.0;
            if alpha <= 0.0 {
                continue;
            }

            let bg = frame.get_pixel_mut(fx, fy);
            for c in 0..3 {
                let blended = alpha * f32::from(fg[c]) + (1.0 - alpha) * f32::from(bg[c]);
                bg[c] = blended.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const BG: Rgb<u8> = Rgb([10, 20, 30]);

    fn frame() -> Frame {
        Frame::from_pixel(64, 48, BG)
    }

    fn solid(width: u32, height: u32, color: Rgba<u8>) -> Asset {
        Asset::from_rgba(RgbaImage::from_pixel(width, height, color))
    }

    #[test]
    fn degenerate_placement_is_noop() {
        let asset = solid(8, 8, Rgba([255, 0, 0, 255]));
        for placement in [
            Placement::from_origin(5, 5, 0, 10, 0.0),
            Placement::from_origin(5, 5, 10, 0, 0.0),
            Placement::from_origin(5, 5, -3, 10, 0.0),
        ] {
            let mut out = frame();
            composite(&mut out, Some(&asset), &placement);
            assert_eq!(out, frame());
        }
    }

    #[test]
    fn missing_asset_is_noop() {
        let mut out = frame();
        composite(&mut out, None, &Placement::from_origin(0, 0, 10, 10, 0.0));
        assert_eq!(out, frame());
    }

    #[test]
    fn opaque_asset_replaces_covered_region() {
        let asset = solid(4, 4, Rgba([200, 100, 50, 255]));
        let mut out = frame();
        composite(&mut out, Some(&asset), &Placement::from_origin(10, 5, 20, 10, 0.0));

        for (x, y, px) in out.enumerate_pixels() {
            let inside = (10..30).contains(&x) && (5..15).contains(&y);
            let expected = if inside { Rgb([200, 100, 50]) } else { BG };
            assert_eq!(*px, expected, "pixel ({x},{y})");
        }
    }

    #[test]
    fn transparent_asset_is_invisible() {
        let asset = solid(16, 16, Rgba([255, 255, 255, 0]));
        let mut out = frame();
        composite(&mut out, Some(&asset), &Placement::from_origin(4, 4, 30, 30, 25.0));
        assert_eq!(out, frame());
    }

    #[test]
    fn half_alpha_mixes_evenly() {
        let asset = solid(2, 2, Rgba([210, 220, 230, 255 / 2 + 1]));
        let mut out = frame();
        composite(&mut out, Some(&asset), &Placement::from_origin(0, 0, 2, 2, 0.0));
        let px = out.get_pixel(0, 0);
        // alpha = 128/255
        assert_eq!(*px, Rgb([110, 120, 130]));
    }

    #[test]
    fn straddling_right_edge_writes_only_in_bounds_columns() {
        let asset = solid(8, 8, Rgba([0, 255, 0, 255]));
        let mut out = frame();
        composite(&mut out, Some(&asset), &Placement::from_origin(60, 0, 8, 8, 0.0));

        for y in 0..8 {
            for x in 56..64 {
                let expected = if x >= 60 { Rgb([0, 255, 0]) } else { BG };
                assert_eq!(*out.get_pixel(x, y), expected);
            }
        }
        assert_eq!(*out.get_pixel(60, 8), BG);
    }

    #[test]
    fn negative_origin_crops_from_overlay_offset() {
        // left half red, right half blue
        let mut image = RgbaImage::from_pixel(8, 2, Rgba([255, 0, 0, 255]));
        for x in 4..8 {
            for y in 0..2 {
                image.put_pixel(x, y, Rgba([0, 0, 255, 255]));
            }
        }
        let mut out = frame();
        blend_at(&mut out, &image, -4, 0);

        // only the blue half lands in the frame
        for x in 0..4 {
            assert_eq!(*out.get_pixel(x, 0), Rgb([0, 0, 255]));
        }
        assert_eq!(*out.get_pixel(4, 0), BG);
    }

    #[test]
    fn off_frame_box_is_noop() {
        let asset = solid(8, 8, Rgba([0, 255, 0, 255]));
        let mut out = frame();
        composite(&mut out, Some(&asset), &Placement::from_origin(100, 100, 8, 8, 0.0));
        composite(&mut out, Some(&asset), &Placement::from_origin(-20, -20, 8, 8, 0.0));
        assert_eq!(out, frame());
    }

    #[test]
    fn oversized_box_is_skipped() {
        let asset = solid(2, 2, Rgba([0, 255, 0, 255]));
        let mut out = frame();
        let limit = max_overlay_side(&out) as i32;
        assert_eq!(limit, 256);

        let huge = Placement::from_origin(-100, 0, limit + 1, 4, 0.0);
        composite(&mut out, Some(&asset), &huge);
        assert_eq!(out, frame());

        let tall = Placement::from_origin(0, -100, 4, limit + 1, 0.0);
        composite(&mut out, Some(&asset), &tall);
        assert_eq!(out, frame());
    }

    #[test]
    fn overlay_at_size_limit_is_drawn() {
        let asset = solid(2, 2, Rgba([0, 255, 0, 255]));
        let mut out = frame();
        let wide = Placement::from_origin(-100, 0, max_overlay_side(&out) as i32, 4, 0.0);
        composite(&mut out, Some(&asset), &wide);
        assert_eq!(*out.get_pixel(0, 0), Rgb([0, 255, 0]));
        assert_eq!(*out.get_pixel(0, 4), BG);
    }

    #[test]
    fn rotation_clears_corners() {
        let rotated = rotate(RgbaImage::from_pixel(20, 20, Rgba([255, 255, 255, 255])), 45.0);
        assert_eq!(rotated.dimensions(), (20, 20));
        assert_eq!(rotated.get_pixel(0, 0)[3], 0);
        assert_eq!(rotated.get_pixel(10, 10)[3], 255);
    }

    #[test]
    fn quarter_turn_is_counter_clockwise() {
        // opaque marker in the right half
        let mut image = RgbaImage::new(21, 21);
        for y in 8..13 {
            for x in 15..21 {
                image.put_pixel(x, y, Rgba([255, 0, 0, 255]));
            }
        }
        let rotated = rotate(image, 90.0);
        // counter-clockwise moves the right edge to the top
        assert!(rotated.get_pixel(10, 2)[3] > 200);
        assert_eq!(rotated.get_pixel(10, 18)[3], 0);
    }
}
