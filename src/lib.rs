//! Real-time face filter compositing for camera frames.
//!
//! Given a frame, face and hand landmarks and an optional segmentation mask
//! from an external perception model, the pipeline replaces the background,
//! draws decorative overlays (ears, glasses, masks, ...) that follow head
//! position, scale and tilt, and restores the camera image under hands so
//! overlays appear behind them.
//!
//! # Quick Start
//!
//! ```no_run
//! use snapbits_fx::assets::{AssetStore, FsAssetLoader};
//! use snapbits_fx::config::PipelineConfig;
//! use snapbits_fx::perception::Perception;
//! use snapbits_fx::registry::{BackgroundTable, FilterRegistry};
//! use snapbits_fx::selection::{Selection, SelectionState};
//! use snapbits_fx::{CompositeSettings, Pipeline};
//!
//! let config = PipelineConfig::default();
//! let mut store = AssetStore::new(FsAssetLoader::new("assets/filters"));
//! let registry = FilterRegistry::load(&config.filters, &mut store);
//! let selection = SelectionState::new(Selection {
//!     filter: Some("sunglasses".into()),
//!     background: None,
//! });
//! let pipeline = Pipeline::new(
//!     registry,
//!     BackgroundTable::new(&config.backgrounds),
//!     selection,
//!     CompositeSettings::from(&config),
//! );
//!
//! let frame = image::open("frame.png").unwrap().to_rgb8();
//! let finished = pipeline.process(frame, &Perception::default());
//! finished.save("out.png").unwrap();
//! ```

pub mod assets;
pub mod capture;
pub mod compositor;
pub mod config;
pub mod control;
pub mod error;
pub mod geometry;
pub mod output;
pub mod perception;
mod pipeline;
pub mod registry;
pub mod runner;
pub mod selection;
pub mod ui;

pub use error::{Error, Result};
pub use pipeline::{CompositeSettings, Pipeline};

/// An RGB camera frame, composited in place.
pub type Frame = image::RgbImage;
