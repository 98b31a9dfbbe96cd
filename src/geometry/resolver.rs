use super::anchor::{AnchorSpec, VerticalAlign};
use crate::perception::LandmarkSet;

/// Resolved box and rotation for one overlay in one frame.
///
/// Coordinates are in frame pixels and may extend past the frame edges;
/// the compositor clips.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    /// Counter-clockwise rotation in degrees.
    pub angle: f32,
}

impl Placement {
    /// Zero-size placement returned when geometry cannot be resolved.
    pub const EMPTY: Placement = Placement {
        x1: 0,
        y1: 0,
        x2: 0,
        y2: 0,
        angle: 0.0,
    };

    /// Box of `width`x`height` at `(x1, y1)`; the far corner saturates at `i32::MAX`.
    pub fn from_origin(x1: i32, y1: i32, width: i32, height: i32, angle: f32) -> Self {
        Self {
            x1,
            y1,
            x2: x1.saturating_add(width),
            y2: y1.saturating_add(height),
            angle,
        }
    }

    pub fn width(&self) -> i32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> i32 {
        self.y2.saturating_sub(self.y1)
    }

    /// A degenerate placement is never composited.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    pub fn center(&self) -> (i32, i32) {
        (self.x1 + self.width() / 2, self.y1 + self.height() / 2)
    }
}

/// Rotation that aligns an overlay's horizontal axis with the line `from → to`.
///
/// Image y grows downwards, so a right-hand point lower than the left one
/// yields a negative (clockwise) angle.
pub fn rotation_degrees(from: (i32, i32), to: (i32, i32)) -> f32 {
    let (dx, dy) = delta(from, to);
    -dy.atan2(dx).to_degrees()
}

fn delta(from: (i32, i32), to: (i32, i32)) -> (f32, f32) {
    (
        (i64::from(to.0) - i64::from(from.0)) as f32,
        (i64::from(to.1) - i64::from(from.1)) as f32,
    )
}

fn distance(a: (i32, i32), b: (i32, i32)) -> f32 {
    let (dx, dy) = delta(a, b);
    dx.hypot(dy)
}

/// Round to a pixel count, `None` if it does not fit in `i32`.
fn to_pixels(value: f64) -> Option<i32> {
    if !value.is_finite() {
        return None;
    }
    i32::try_from(value.round() as i64).ok()
}

/// Resolve an [`AnchorSpec`] against one landmark set.
///
/// `asset` is the overlay's native size, `frame` the size the landmarks are
/// projected onto. Returns [`Placement::EMPTY`] when a required landmark is
/// missing or far outside the frame, the asset has no area, or the box does
/// not fit in pixel coordinates.
pub fn resolve(
    spec: &AnchorSpec,
    asset: (u32, u32),
    landmarks: &LandmarkSet,
    frame: (u32, u32),
) -> Placement {
    resolve_checked(spec, asset, landmarks, frame).unwrap_or(Placement::EMPTY)
}

fn resolve_checked(
    spec: &AnchorSpec,
    (asset_w, asset_h): (u32, u32),
    landmarks: &LandmarkSet,
    (frame_w, frame_h): (u32, u32),
) -> Option<Placement> {
    if asset_w == 0 || asset_h == 0 {
        return None;
    }

    let left = landmarks.pixel(spec.basis[0], frame_w, frame_h)?;
    let right = landmarks.pixel(spec.basis[1], frame_w, frame_h)?;
    let basis_length = distance(left, right);

    let width = to_pixels(f64::from(spec.multiplier) * f64::from(basis_length))?;
    let height = to_pixels(f64::from(width) * f64::from(asset_h) / f64::from(asset_w))?;
    let angle = rotation_degrees(left, right);

    let anchor_x = i64::from(spec.anchor_x.x(landmarks, frame_w, frame_h)?);
    let anchor_y = i64::from(spec.anchor_y.y(landmarks, frame_w, frame_h)?)
        + i64::from(spec.offset.resolve(height, basis_length));

    let (w, h) = (i64::from(width), i64::from(height));
    let x1 = anchor_x - w / 2;
    let y1 = match spec.align {
        VerticalAlign::Center => anchor_y - h / 2,
        VerticalAlign::Bottom => anchor_y - h,
        VerticalAlign::Top => anchor_y,
    };

    // The far corner must be representable too
    let x1 = i32::try_from(x1).ok()?;
    let y1 = i32::try_from(y1).ok()?;
    x1.checked_add(width)?;
    y1.checked_add(height)?;

    Some(Placement::from_origin(x1, y1, width, height, angle))
}
