//! Filter, background and compositing configuration.
//!
//! Every scaling constant and landmark choice lives in this table rather than
//! in code. The built-in defaults describe the shipped filters; a JSON file
//! with the same shape replaces them.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::landmarks::*;
use crate::geometry::{AnchorSpec, Coordinate, MouthGate, Offset, VerticalAlign};

/// Top-level compositing configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Selectable filters, in selector order.
    pub filters: Vec<FilterConfig>,
    /// Background choices, in selector order.
    pub backgrounds: Vec<BackgroundConfig>,
    /// Gaussian sigma applied to the segmentation mask.
    pub segmentation_sigma: f32,
    /// Gaussian sigma applied to the hand mask.
    pub occlusion_sigma: f32,
    /// Hand landmarks whose hull defines the occluding region.
    pub hand_outline: Vec<usize>,
    /// Whether hands occlude filters at all.
    pub occlusion: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            filters: default_filters(),
            backgrounds: default_backgrounds(),
            // 11x11 kernel at OpenCV's automatic sigma
            segmentation_sigma: 2.0,
            occlusion_sigma: 4.0,
            hand_outline: HAND_OUTLINE.to_vec(),
            occlusion: true,
        }
    }
}

/// One selectable filter made of one or more overlay parts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub name: String,
    /// Selector icon; defaults to the first part's asset.
    #[serde(default)]
    pub icon: Option<String>,
    pub parts: Vec<PartConfig>,
}

/// One overlay of a filter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartConfig {
    /// Asset file name relative to the asset directory.
    pub asset: String,
    pub anchor: AnchorSpec,
    /// Only drawn while this gate is open.
    #[serde(default)]
    pub show_when: Option<MouthGate>,
    /// A missing optional asset drops the part instead of the filter.
    #[serde(default)]
    pub optional: bool,
}

/// A background choice; no color is the "remove" sentinel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackgroundConfig {
    pub name: String,
    #[serde(default)]
    pub color: Option<[u8; 3]>,
}

impl PipelineConfig {
    /// Read and validate a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] or [`Error::Json`] if the file cannot be read or
    /// parsed, and [`Error::Config`] if validation fails.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check names are unique and numeric parameters are usable.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for filter in &self.filters {
            if filter.name.is_empty() || !names.insert(filter.name.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate or empty filter name {:?}",
                    filter.name
                )));
            }
            if filter.parts.is_empty() {
                return Err(Error::Config(format!("filter {} has no parts", filter.name)));
            }
            for part in &filter.parts {
                let m = part.anchor.multiplier;
                if !m.is_finite() || m <= 0.0 {
                    return Err(Error::Config(format!(
                        "filter {}: multiplier {} must be positive",
                        filter.name, m
                    )));
                }
            }
        }

        let mut names = HashSet::new();
        for background in &self.backgrounds {
            if background.name.is_empty() || !names.insert(background.name.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate or empty background name {:?}",
                    background.name
                )));
            }
        }

        for (label, sigma) in [
            ("segmentation_sigma", self.segmentation_sigma),
            ("occlusion_sigma", self.occlusion_sigma),
        ] {
            if !sigma.is_finite() || sigma < 0.0 {
                return Err(Error::Config(format!("{label} must be >= 0")));
            }
        }
        Ok(())
    }
}

fn face_width(multiplier: f32, x: Coordinate, y: Coordinate) -> AnchorSpec {
    AnchorSpec {
        basis: [LEFT_FACE, RIGHT_FACE],
        multiplier,
        anchor_x: x,
        anchor_y: y,
        align: VerticalAlign::Center,
        offset: Offset::default(),
    }
}

fn part(asset: &str, anchor: AnchorSpec) -> PartConfig {
    PartConfig {
        asset: asset.to_string(),
        anchor,
        show_when: None,
        optional: false,
    }
}

fn filter(name: &str, parts: Vec<PartConfig>) -> FilterConfig {
    FilterConfig {
        name: name.to_string(),
        icon: None,
        parts,
    }
}

/// The shipped filter set.
pub fn default_filters() -> Vec<FilterConfig> {
    use Coordinate::{Landmark, Mean};

    let dog_ears = AnchorSpec {
        align: VerticalAlign::Bottom,
        offset: Offset::of_height(-0.1),
        ..face_width(1.5, Landmark(TOP_OF_HEAD), Landmark(TOP_OF_HEAD))
    };
    let dog_nose = face_width(1.5, Landmark(NOSE_TIP), Landmark(NOSE_TIP));
    let tongue = PartConfig {
        show_when: Some(MouthGate {
            upper: UPPER_LIP,
            lower: LOWER_LIP,
            threshold: 0.05,
            normalize_by: Some([LEFT_FACE, RIGHT_FACE]),
        }),
        optional: true,
        ..part(
            "dog_tongue.png",
            AnchorSpec {
                align: VerticalAlign::Top,
                offset: Offset::pixels(-10.0),
                ..face_width(0.6, Landmark(NOSE_TIP), Landmark(LOWER_LIP))
            },
        )
    };

    let cat = AnchorSpec {
        offset: Offset::pixels(30.0),
        ..face_width(1.1, Landmark(NOSE_TIP), Landmark(TOP_OF_HEAD))
    };
    let sunglasses = AnchorSpec {
        basis: [LEFT_EYE_INNER, RIGHT_EYE_INNER],
        ..face_width(
            5.5,
            Landmark(NOSE_TIP),
            Mean(LEFT_EYE_INNER, RIGHT_EYE_INNER),
        )
    };
    let headband = face_width(2.2, Landmark(TOP_OF_HEAD), Landmark(TOP_OF_HEAD));
    let shark = AnchorSpec {
        offset: Offset::of_basis(-0.2),
        ..face_width(3.2, Landmark(NOSE_TIP), Landmark(NOSE_TIP))
    };
    let beard = face_width(1.1, Landmark(CHIN), Mean(CHIN, UPPER_LIP));
    let mask = AnchorSpec {
        basis: [LEFT_CHEEK, RIGHT_CHEEK],
        ..face_width(1.1, Mean(LEFT_CHEEK, RIGHT_CHEEK), Mean(CHIN, UPPER_LIP))
    };

    vec![
        filter(
            "dog",
            vec![
                part("dog_ears.png", dog_ears),
                part("dog_nose.png", dog_nose),
                tongue,
            ],
        ),
        filter("cat", vec![part("cat.png", cat)]),
        filter("sunglasses", vec![part("sunglasses.png", sunglasses)]),
        filter("headband", vec![part("headband.png", headband)]),
        filter("shark", vec![part("shark.png", shark)]),
        filter("beard", vec![part("beard.png", beard)]),
        filter("mask", vec![part("mask.png", mask)]),
    ]
}

/// The shipped background colors (RGB).
pub fn default_backgrounds() -> Vec<BackgroundConfig> {
    [
        ("remove", None),
        ("light-pink", Some([255, 192, 203])),
        ("light-blue", Some([200, 230, 255])),
        ("light-violet", Some([238, 130, 238])),
        ("mint-green", Some([189, 252, 201])),
        ("soft-yellow", Some([255, 255, 200])),
    ]
    .into_iter()
    .map(|(name, color)| BackgroundConfig {
        name: name.to_string(),
        color,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PipelineConfig::default();
        config.validate().unwrap();
        let names: Vec<_> = config.filters.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            ["dog", "cat", "sunglasses", "headband", "shark", "beard", "mask"]
        );
        assert_eq!(config.backgrounds[0].color, None);
    }

    #[test]
    fn defaults_survive_json_round_trip() {
        let config = PipelineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(PipelineConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = PipelineConfig::from_json(r#"{"occlusion": false}"#).unwrap();
        assert!(!config.occlusion);
        assert_eq!(config.filters, default_filters());
    }

    #[test]
    fn rejects_duplicate_filter_names() {
        let mut config = PipelineConfig::default();
        config.filters.push(config.filters[0].clone());
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_non_positive_multiplier() {
        let mut config = PipelineConfig::default();
        config.filters[1].parts[0].anchor.multiplier = 0.0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_negative_sigma() {
        let config = PipelineConfig {
            occlusion_sigma: -1.0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
