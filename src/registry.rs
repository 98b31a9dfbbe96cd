//! Selectable filters and backgrounds.
//!
//! Only filters whose required assets loaded are registered. A failing asset
//! removes its filter from the registry and leaves every other filter usable.

use image::Rgb;

use crate::assets::{Asset, AssetLoader, AssetStore};
use crate::config::{BackgroundConfig, FilterConfig};
use crate::error::{Error, Result};
use crate::geometry::{self, AnchorSpec, MouthGate, Placement};
use crate::perception::LandmarkSet;

/// One overlay of a registered filter.
#[derive(Clone, Debug)]
pub struct FilterPart {
    pub asset: Asset,
    pub anchor: AnchorSpec,
    pub show_when: Option<MouthGate>,
}

impl FilterPart {
    /// Placement for this part, or `None` while its gate is closed.
    pub fn placement(&self, landmarks: &LandmarkSet, frame: (u32, u32)) -> Option<Placement> {
        if let Some(gate) = &self.show_when {
            if !gate.is_open(landmarks, frame.0, frame.1) {
                return None;
            }
        }
        Some(geometry::resolve(
            &self.anchor,
            self.asset.dimensions(),
            landmarks,
            frame,
        ))
    }
}

/// A registered filter.
#[derive(Clone, Debug)]
pub struct Filter {
    name: String,
    icon: Asset,
    parts: Vec<FilterPart>,
}

impl Filter {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn icon(&self) -> &Asset {
        &self.icon
    }

    pub fn parts(&self) -> &[FilterPart] {
        &self.parts
    }

    /// Resolve every visible part against one face, in drawing order.
    pub fn placements(
        &self,
        landmarks: &LandmarkSet,
        frame: (u32, u32),
    ) -> Vec<(&Asset, Placement)> {
        self.parts
            .iter()
            .filter_map(|part| {
                part.placement(landmarks, frame)
                    .map(|placement| (&part.asset, placement))
            })
            .collect()
    }
}

/// Ordered set of selectable filters.
#[derive(Clone, Debug, Default)]
pub struct FilterRegistry {
    filters: Vec<Filter>,
}

impl FilterRegistry {
    /// Register every filter whose required assets load.
    pub fn load<L: AssetLoader>(configs: &[FilterConfig], store: &mut AssetStore<L>) -> Self {
        let mut filters = Vec::with_capacity(configs.len());
        for config in configs {
            match Self::build(config, store) {
                Ok(filter) => {
                    tracing::info!(
                        "Registered filter {} ({} parts)",
                        filter.name,
                        filter.parts.len()
                    );
                    filters.push(filter);
                }
                Err(e) => tracing::warn!("Filter {} unavailable: {}", config.name, e),
            }
        }
        Self { filters }
    }

    fn build<L: AssetLoader>(config: &FilterConfig, store: &mut AssetStore<L>) -> Result<Filter> {
        let mut parts = Vec::with_capacity(config.parts.len());
        for part in &config.parts {
            match store.fetch(&part.asset) {
                Ok(asset) => parts.push(FilterPart {
                    asset,
                    anchor: part.anchor.clone(),
                    show_when: part.show_when.clone(),
                }),
                Err(e) if part.optional => {
                    tracing::warn!("Filter {}: optional part dropped: {}", config.name, e);
                }
                Err(e) => return Err(e),
            }
        }

        let icon = match &config.icon {
            Some(name) => store.fetch(name)?,
            None => parts
                .first()
                .map(|part| part.asset.clone())
                .ok_or_else(|| Error::Config(format!("filter {} has no parts", config.name)))?,
        };

        Ok(Filter {
            name: config.name.clone(),
            icon,
            parts,
        })
    }

    pub fn get(&self, name: &str) -> Option<&Filter> {
        self.filters.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// A background choice; `color == None` keeps the camera background.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Background {
    pub name: String,
    pub color: Option<Rgb<u8>>,
}

/// Ordered background choices.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BackgroundTable {
    entries: Vec<Background>,
}

impl BackgroundTable {
    pub fn new(configs: &[BackgroundConfig]) -> Self {
        Self {
            entries: configs
                .iter()
                .map(|c| Background {
                    name: c.name.clone(),
                    color: c.color.map(Rgb),
                })
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Background> {
        self.entries.iter().find(|b| b.name == name)
    }

    /// Replacement color for a background name, `None` for unknown names
    /// and for the "remove" sentinel.
    pub fn color(&self, name: &str) -> Option<Rgb<u8>> {
        self.get(name).and_then(|b| b.color)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|b| b.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{default_backgrounds, default_filters};
    use crate::perception::Landmark;
    use image::{Rgba, RgbaImage};
    use std::path::PathBuf;

    /// Serves a 10x10 asset for every name except those listed as missing.
    struct FakeLoader {
        missing: Vec<&'static str>,
    }

    impl AssetLoader for FakeLoader {
        fn load(&self, name: &str) -> Result<Asset> {
            if self.missing.contains(&name) {
                return Err(Error::MissingAsset {
                    path: PathBuf::from(name),
                });
            }
            Ok(Asset::from_rgba(RgbaImage::from_pixel(10, 10, Rgba([1, 2, 3, 255]))))
        }
    }

    fn registry(missing: Vec<&'static str>) -> FilterRegistry {
        let mut store = AssetStore::new(FakeLoader { missing });
        FilterRegistry::load(&default_filters(), &mut store)
    }

    #[test]
    fn all_filters_register_when_assets_load() {
        let registry = registry(vec![]);
        assert_eq!(registry.len(), 7);
        assert_eq!(registry.get("dog").map(|f| f.parts().len()), Some(3));
    }

    #[test]
    fn missing_asset_excludes_only_its_filter() {
        let registry = registry(vec!["cat.png"]);
        assert!(!registry.contains("cat"));
        assert!(registry.contains("sunglasses"));
        assert_eq!(registry.len(), 6);
        assert_eq!(registry.names()[1], "sunglasses");
    }

    #[test]
    fn missing_optional_part_keeps_filter() {
        let registry = registry(vec!["dog_tongue.png"]);
        let dog = registry.get("dog").unwrap();
        assert_eq!(dog.parts().len(), 2);
    }

    #[test]
    fn missing_required_part_drops_composite_filter() {
        let registry = registry(vec!["dog_nose.png"]);
        assert!(!registry.contains("dog"));
    }

    fn face(lip_gap: f32) -> LandmarkSet {
        let mut points = vec![Landmark::new(0.5, 0.5); 468];
        points[10] = Landmark::new(0.5, 0.25);
        points[13] = Landmark::new(0.5, 0.625);
        points[14] = Landmark::new(0.5, 0.625 + lip_gap);
        points[234] = Landmark::new(0.25, 0.5);
        points[454] = Landmark::new(0.75, 0.5);
        LandmarkSet::new(points)
    }

    #[test]
    fn tongue_only_when_mouth_open() {
        let registry = registry(vec![]);
        let dog = registry.get("dog").unwrap();

        assert_eq!(dog.placements(&face(0.0), (256, 256)).len(), 2);
        // 16px gap over a 128px face
        assert_eq!(dog.placements(&face(0.0625), (256, 256)).len(), 3);
    }

    #[test]
    fn background_table_lookup() {
        let table = BackgroundTable::new(&default_backgrounds());
        assert_eq!(table.len(), 6);
        assert_eq!(table.color("remove"), None);
        assert!(table.get("remove").is_some());
        assert_eq!(table.color("light-pink"), Some(Rgb([255, 192, 203])));
        assert_eq!(table.color("plaid"), None);
    }
}
