//! Perception collaborator interface
//!
//! Face/hand landmark detection and segmentation run outside this crate;
//! the compositor only consumes their results.

mod replay;
pub mod types;

pub use replay::ReplayPerception;
pub use types::{Landmark, LandmarkSet, Perception, PerceptionProvider, SegmentationMask};

use anyhow::Result;

use crate::Frame;

/// Passthrough provider: reports no faces, no hands and no mask.
#[derive(Debug, Default)]
pub struct NoPerception;

impl PerceptionProvider for NoPerception {
    fn perceive(&mut self, _frame: &Frame) -> Result<Perception> {
        Ok(Perception::default())
    }
}

/// Create the provider selected on the command line
pub fn create_provider(replay_path: Option<&str>) -> Result<Box<dyn PerceptionProvider>> {
    match replay_path {
        Some(path) => Ok(Box::new(ReplayPerception::open(path)?)),
        None => Ok(Box::new(NoPerception)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landmark_projection_truncates() {
        let set = LandmarkSet::new(vec![Landmark::new(0.5, 0.25), Landmark::new(0.999, 0.0)]);
        assert_eq!(set.pixel(0, 640, 480), Some((320, 120)));
        assert_eq!(set.pixel(1, 100, 100), Some((99, 0)));
        assert_eq!(set.pixel(2, 100, 100), None);
    }

    #[test]
    fn far_or_non_finite_landmarks_do_not_project() {
        let set = LandmarkSet::new(vec![
            Landmark::new(-1e10, 0.5),
            Landmark::new(1e10, 0.5),
            Landmark::new(f32::NAN, 0.5),
            Landmark::new(0.5, f32::INFINITY),
            Landmark::new(-4.0, 4.0),
        ]);
        for i in 0..4 {
            assert_eq!(set.pixel(i, 640, 480), None, "landmark {i}");
        }
        // a hand partly out of view still projects
        assert_eq!(set.pixel(4, 640, 480), Some((-2560, 1920)));
    }

    #[test]
    fn mask_rejects_wrong_length() {
        assert!(SegmentationMask::new(2, 2, vec![0.0; 3]).is_none());
        assert!(SegmentationMask::new(2, 2, vec![0.0; 4]).is_some());
    }

    #[test]
    fn mask_fit_to_resizes_uniform_mask() {
        let mask = SegmentationMask::filled(8, 8, 1.0);
        let fitted = mask.fit_to(16, 12);
        assert_eq!(fitted.dimensions(), (16, 12));
        assert!(fitted.values().iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn no_perception_is_empty() {
        let frame = Frame::new(4, 4);
        let result = NoPerception.perceive(&frame).unwrap();
        assert!(result.is_empty());
    }
}
