use image::{GrayImage, Luma};
use imageproc::drawing::draw_polygon_mut;
use imageproc::geometry::convex_hull;
use imageproc::point::Point;

use super::soften;
use crate::perception::LandmarkSet;
use crate::Frame;

/// Soft hand-coverage mask for a `width`x`height` frame.
///
/// For each hand the convex hull of the `outline` landmarks is filled, then
/// the combined mask is blurred with `sigma`. Returns `None` when no hull
/// could be drawn.
pub fn hand_alpha(
    hands: &[LandmarkSet],
    outline: &[usize],
    width: u32,
    height: u32,
    sigma: f32,
) -> Option<Vec<f32>> {
    if width == 0 || height == 0 {
        return None;
    }

    let mut mask = GrayImage::new(width, height);
    let mut drawn = 0;

    for hand in hands {
        let points: Vec<Point<i32>> = outline
            .iter()
            .filter_map(|&i| hand.pixel(i, width, height))
            .map(|(x, y)| {
                Point::new(
                    x.clamp(0, width as i32 - 1),
                    y.clamp(0, height as i32 - 1),
                )
            })
            .collect();

        let hull = convex_hull(points.as_slice());
        if hull.len() < 3 || hull.first() == hull.last() || twice_area(&hull) == 0 {
            tracing::debug!("Hand hull degenerate ({} points), skipped", hull.len());
            continue;
        }
        draw_polygon_mut(&mut mask, &hull, Luma([255u8]));
        drawn += 1;
    }

    if drawn == 0 {
        return None;
    }

    let values: Vec<f32> = mask.pixels().map(|p| f32::from(p[0]) / 255.0).collect();
    Some(soften(&values, width, height, sigma))
}

fn twice_area(polygon: &[Point<i32>]) -> i64 {
    let n = polygon.len();
    (0..n)
        .map(|i| {
            let (a, b) = (polygon[i], polygon[(i + 1) % n]);
            i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y)
        })
        .sum::<i64>()
        .abs()
}

/// `out = filtered * (1 - alpha) + original * alpha`, per pixel.
pub fn restore_with_alpha(filtered: &mut Frame, original: &Frame, alpha: &[f32]) {
    if filtered.dimensions() != original.dimensions() {
        tracing::debug!("Occlusion skipped: frame size mismatch");
        return;
    }

    for ((px, orig), &a) in filtered.pixels_mut().zip(original.pixels()).zip(alpha.iter()) {
        let a = a.clamp(0.0, 1.0);
        if a <= 0.0 {
            continue;
        }
        for c in 0..3 {
            let blended = f32::from(px[c]) * (1.0 - a) + f32::from(orig[c]) * a;
            px[c] = blended.round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Show the pristine camera image wherever a hand is detected.
pub fn restore_under_hands(
    filtered: &mut Frame,
    original: &Frame,
    hands: &[LandmarkSet],
    outline: &[usize],
    sigma: f32,
) {
    if hands.is_empty() {
        return;
    }

    let _span = tracing::debug_span!("occlusion").entered();
    let (width, height) = filtered.dimensions();
    if let Some(alpha) = hand_alpha(hands, outline, width, height, sigma) {
        restore_with_alpha(filtered, original, &alpha);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::Landmark;
    use image::Rgb;

    fn frames() -> (Frame, Frame) {
        (
            Frame::from_pixel(32, 32, Rgb([200, 0, 0])),
            Frame::from_fn(32, 32, |x, y| Rgb([x as u8, y as u8, 9])),
        )
    }

    fn square_hand(min: f32, max: f32) -> LandmarkSet {
        LandmarkSet::new(vec![
            Landmark::new(min, min),
            Landmark::new(max, min),
            Landmark::new(max, max),
            Landmark::new(min, max),
        ])
    }

    #[test]
    fn zero_alpha_keeps_filtered_frame() {
        let (mut filtered, original) = frames();
        restore_with_alpha(&mut filtered, &original, &[0.0; 32 * 32]);
        assert_eq!(filtered, frames().0);
    }

    #[test]
    fn full_alpha_restores_original() {
        let (mut filtered, original) = frames();
        restore_with_alpha(&mut filtered, &original, &[1.0; 32 * 32]);
        assert_eq!(filtered, original);
    }

    #[test]
    fn no_hands_is_noop() {
        let (mut filtered, original) = frames();
        restore_under_hands(&mut filtered, &original, &[], &[0, 1, 2, 3], 2.0);
        assert_eq!(filtered, frames().0);
    }

    #[test]
    fn hull_interior_is_restored() {
        let (mut filtered, original) = frames();
        let hand = square_hand(0.25, 0.75);
        restore_under_hands(&mut filtered, &original, &[hand], &[0, 1, 2, 3], 1.0);

        assert_eq!(filtered.get_pixel(16, 16), original.get_pixel(16, 16));
        assert_eq!(*filtered.get_pixel(1, 1), Rgb([200, 0, 0]));
    }

    #[test]
    fn alpha_covers_every_hand() {
        let hands = [square_hand(0.0, 0.25), square_hand(0.75, 1.0)];
        let alpha = hand_alpha(&hands, &[0, 1, 2, 3], 32, 32, 0.0).unwrap();
        assert_eq!(alpha[4 * 32 + 4], 1.0);
        assert_eq!(alpha[27 * 32 + 27], 1.0);
        assert_eq!(alpha[16 * 32 + 16], 0.0);
    }

    #[test]
    fn collinear_hand_draws_nothing() {
        let hand = LandmarkSet::new(vec![
            Landmark::new(0.1, 0.5),
            Landmark::new(0.5, 0.5),
            Landmark::new(0.9, 0.5),
        ]);
        assert!(hand_alpha(&[hand], &[0, 1, 2], 32, 32, 1.0).is_none());
    }
}
