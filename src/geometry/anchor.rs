use serde::{Deserialize, Serialize};

use crate::perception::LandmarkSet;

/// How one overlay is positioned, sized and rotated from a landmark set.
///
/// The `basis` pair sets both scale (its length times `multiplier` is the
/// overlay width) and rotation (the overlay's horizontal axis follows the
/// line from `basis[0]` to `basis[1]`). Height always follows the asset's
/// aspect ratio.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnchorSpec {
    pub basis: [usize; 2],
    pub multiplier: f32,
    pub anchor_x: Coordinate,
    pub anchor_y: Coordinate,
    #[serde(default)]
    pub align: VerticalAlign,
    #[serde(default)]
    pub offset: Offset,
}

/// Source of one anchor coordinate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coordinate {
    /// Coordinate of a single landmark
    Landmark(usize),
    /// Integer midpoint of two landmarks
    Mean(usize, usize),
}

impl Coordinate {
    /// Pixel x of this coordinate, `None` if a landmark is missing.
    pub fn x(&self, landmarks: &LandmarkSet, width: u32, height: u32) -> Option<i32> {
        self.resolve(landmarks, width, height, |p| p.0)
    }

    /// Pixel y of this coordinate, `None` if a landmark is missing.
    pub fn y(&self, landmarks: &LandmarkSet, width: u32, height: u32) -> Option<i32> {
        self.resolve(landmarks, width, height, |p| p.1)
    }

    fn resolve(
        &self,
        landmarks: &LandmarkSet,
        width: u32,
        height: u32,
        axis: impl Fn((i32, i32)) -> i32,
    ) -> Option<i32> {
        match *self {
            Coordinate::Landmark(i) => landmarks.pixel(i, width, height).map(&axis),
            Coordinate::Mean(a, b) => {
                let a = axis(landmarks.pixel(a, width, height)?);
                let b = axis(landmarks.pixel(b, width, height)?);
                let mean = (i64::from(a) + i64::from(b)).div_euclid(2);
                i32::try_from(mean).ok()
            }
        }
    }
}

/// Which edge of the box sits on the anchor's y coordinate
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAlign {
    #[default]
    Center,
    /// Box hangs above the anchor (ears, hats)
    Bottom,
    /// Box hangs below the anchor (tongue)
    Top,
}

/// Vertical shift applied to the anchor before the box is laid out.
///
/// The shift is `pixels + of_height * overlay_height + of_basis * basis_length`;
/// negative values move the anchor up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    #[serde(default)]
    pub pixels: f32,
    #[serde(default)]
    pub of_height: f32,
    #[serde(default)]
    pub of_basis: f32,
}

impl Offset {
    pub fn pixels(pixels: f32) -> Self {
        Self {
            pixels,
            ..Self::default()
        }
    }

    pub fn of_height(of_height: f32) -> Self {
        Self {
            of_height,
            ..Self::default()
        }
    }

    pub fn of_basis(of_basis: f32) -> Self {
        Self {
            of_basis,
            ..Self::default()
        }
    }

    pub fn resolve(&self, overlay_height: i32, basis_length: f32) -> i32 {
        let shift =
            self.pixels + self.of_height * overlay_height as f32 + self.of_basis * basis_length;
        shift.round() as i32
    }
}

/// Shows a sub-part only while the mouth is open.
///
/// Openness is the vertical gap between the two lip landmarks, divided by
/// the distance of the `normalize_by` pair when one is given.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MouthGate {
    pub upper: usize,
    pub lower: usize,
    pub threshold: f32,
    #[serde(default)]
    pub normalize_by: Option<[usize; 2]>,
}

impl MouthGate {
    /// Openness signal for a face, `None` if a landmark is missing.
    pub fn openness(&self, landmarks: &LandmarkSet, width: u32, height: u32) -> Option<f32> {
        let (_, upper_y) = landmarks.pixel(self.upper, width, height)?;
        let (_, lower_y) = landmarks.pixel(self.lower, width, height)?;
        let gap = (i64::from(lower_y) - i64::from(upper_y)).abs() as f32;

        match self.normalize_by {
            None => Some(gap),
            Some([a, b]) => {
                let (ax, _) = landmarks.pixel(a, width, height)?;
                let (bx, _) = landmarks.pixel(b, width, height)?;
                let face_width = (i64::from(bx) - i64::from(ax)).abs() as f32;
                if face_width > 0.0 {
                    Some(gap / face_width)
                } else {
                    Some(0.0)
                }
            }
        }
    }

    pub fn is_open(&self, landmarks: &LandmarkSet, width: u32, height: u32) -> bool {
        self.openness(landmarks, width, height)
            .is_some_and(|openness| openness > self.threshold)
    }
}
