//! Per-frame orchestration.
//!
//! Order: background replacement, face filters, hand occlusion. Each stage
//! that cannot run (nothing selected, no landmarks, no mask, degenerate
//! geometry) is skipped on its own; the frame always comes back complete.

use crate::compositor;
use crate::config::PipelineConfig;
use crate::error::Error;
use crate::perception::Perception;
use crate::registry::{BackgroundTable, FilterRegistry};
use crate::selection::{Selection, SelectionState};
use crate::Frame;

/// Compositing parameters that are not part of the filter table.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeSettings {
    pub segmentation_sigma: f32,
    pub occlusion_sigma: f32,
    pub hand_outline: Vec<usize>,
    pub occlusion: bool,
}

impl From<&PipelineConfig> for CompositeSettings {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            segmentation_sigma: config.segmentation_sigma,
            occlusion_sigma: config.occlusion_sigma,
            hand_outline: config.hand_outline.clone(),
            occlusion: config.occlusion,
        }
    }
}

impl Default for CompositeSettings {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

pub struct Pipeline {
    registry: FilterRegistry,
    backgrounds: BackgroundTable,
    selection: SelectionState,
    settings: CompositeSettings,
}

impl Pipeline {
    pub fn new(
        registry: FilterRegistry,
        backgrounds: BackgroundTable,
        selection: SelectionState,
        settings: CompositeSettings,
    ) -> Self {
        Self {
            registry,
            backgrounds,
            selection,
            settings,
        }
    }

    pub fn registry(&self) -> &FilterRegistry {
        &self.registry
    }

    pub fn backgrounds(&self) -> &BackgroundTable {
        &self.backgrounds
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Composite one frame with the current selection.
    pub fn process(&self, frame: Frame, perception: &Perception) -> Frame {
        let selection = self.selection.snapshot();
        self.process_with(frame, perception, &selection)
    }

    /// Composite one frame with an explicit selection.
    pub fn process_with(
        &self,
        mut frame: Frame,
        perception: &Perception,
        selection: &Selection,
    ) -> Frame {
        if perception.is_empty() {
            tracing::debug!("{}, frame passed through", Error::EmptyPerceptionResult);
            return frame;
        }

        self.replace_background(&mut frame, perception, selection);

        let occlude = self.settings.occlusion && !perception.hands.is_empty();
        let original = occlude.then(|| frame.clone());

        self.apply_filters(&mut frame, perception, selection);

        if let Some(original) = original {
            compositor::restore_under_hands(
                &mut frame,
                &original,
                &perception.hands,
                &self.settings.hand_outline,
                self.settings.occlusion_sigma,
            );
        }

        frame
    }

    fn replace_background(
        &self,
        frame: &mut Frame,
        perception: &Perception,
        selection: &Selection,
    ) {
        let Some(name) = selection.background.as_deref() else {
            return;
        };
        let Some(color) = self.backgrounds.color(name) else {
            return;
        };
        match &perception.mask {
            Some(mask) => compositor::replace_background(
                frame,
                mask,
                Some(color),
                self.settings.segmentation_sigma,
            ),
            None => tracing::debug!("Background {} selected but no mask this frame", name),
        }
    }

    fn apply_filters(&self, frame: &mut Frame, perception: &Perception, selection: &Selection) {
        let Some(name) = selection.filter.as_deref() else {
            return;
        };
        let Some(filter) = self.registry.get(name) else {
            tracing::debug!("Filter {} is not registered", name);
            return;
        };

        let _span = tracing::debug_span!("filters", filter = name).entered();
        let dimensions = frame.dimensions();
        for face in &perception.faces {
            for (asset, placement) in filter.placements(face, dimensions) {
                compositor::composite(frame, Some(asset), &placement);
            }
        }
    }
}
