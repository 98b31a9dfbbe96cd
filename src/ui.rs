//! On-screen filter selector drawn across the top of the frame.

use image::Rgb;
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::assets::Asset;
use crate::compositor;
use crate::geometry::Placement;
use crate::registry::FilterRegistry;
use crate::Frame;

const BAR_HEIGHT: u32 = 80;
const ICON_SIZE: i32 = 50;
const ICON_GAP: i32 = 20;
const START_X: i32 = 20;
const ICON_Y: i32 = 15;
const HIGHLIGHT: Rgb<u8> = Rgb([0, 255, 0]);

/// Row of filter icons with the active one outlined.
pub struct SelectorStrip {
    icons: Vec<(String, Asset)>,
}

impl SelectorStrip {
    pub fn new(registry: &FilterRegistry) -> Self {
        Self {
            icons: registry
                .iter()
                .map(|f| (f.name().to_string(), f.icon().clone()))
                .collect(),
        }
    }

    fn icon_x(index: usize) -> i32 {
        START_X + index as i32 * (ICON_SIZE + ICON_GAP)
    }

    pub fn draw(&self, frame: &mut Frame, selected: Option<&str>) {
        let bar = BAR_HEIGHT.min(frame.height());
        for y in 0..bar {
            for x in 0..frame.width() {
                let px = frame.get_pixel_mut(x, y);
                for c in 0..3 {
                    px[c] = (f32::from(px[c]) * 0.5).round() as u8;
                }
            }
        }

        for (i, (name, icon)) in self.icons.iter().enumerate() {
            let x = Self::icon_x(i);
            if selected == Some(name.as_str()) {
                let outer = ICON_SIZE as u32 + 10;
                draw_hollow_rect_mut(
                    frame,
                    Rect::at(x - 5, ICON_Y - 5).of_size(outer, outer),
                    HIGHLIGHT,
                );
                draw_hollow_rect_mut(
                    frame,
                    Rect::at(x - 4, ICON_Y - 4).of_size(outer - 2, outer - 2),
                    HIGHLIGHT,
                );
            }
            let placement = Placement::from_origin(x, ICON_Y, ICON_SIZE, ICON_SIZE, 0.0);
            compositor::composite(frame, Some(icon), &placement);
        }
    }

    /// Filter whose icon column contains a click at `(x, y)` inside the bar.
    pub fn hit_test(&self, x: i32, y: i32) -> Option<&str> {
        if y <= 0 || y >= BAR_HEIGHT as i32 {
            return None;
        }
        self.icons
            .iter()
            .enumerate()
            .find(|(i, _)| {
                let x1 = Self::icon_x(*i);
                (x1..=x1 + ICON_SIZE).contains(&x)
            })
            .map(|(_, (name, _))| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetLoader, AssetStore};
    use crate::config::default_filters;
    use crate::error::Result;
    use image::{Rgba, RgbaImage};

    struct SolidLoader;

    impl AssetLoader for SolidLoader {
        fn load(&self, _name: &str) -> Result<Asset> {
            Ok(Asset::from_rgba(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 255, 255]))))
        }
    }

    fn strip() -> SelectorStrip {
        let mut store = AssetStore::new(SolidLoader);
        SelectorStrip::new(&FilterRegistry::load(&default_filters(), &mut store))
    }

    #[test]
    fn hit_test_maps_columns_to_filters() {
        let strip = strip();
        assert_eq!(strip.hit_test(20, 40), Some("dog"));
        assert_eq!(strip.hit_test(70, 40), Some("dog"));
        assert_eq!(strip.hit_test(80, 40), None);
        assert_eq!(strip.hit_test(90, 40), Some("cat"));
        assert_eq!(strip.hit_test(90, 80), None);
        assert_eq!(strip.hit_test(90, 0), None);
    }

    #[test]
    fn draw_darkens_bar_and_places_icons() {
        let strip = strip();
        let mut frame = Frame::from_pixel(600, 120, Rgb([200, 200, 200]));
        strip.draw(&mut frame, Some("cat"));

        // darkened bar between icons
        assert_eq!(*frame.get_pixel(5, 5), Rgb([100, 100, 100]));
        // icon body
        assert_eq!(*frame.get_pixel(40, 40), Rgb([0, 0, 255]));
        // highlight around the second icon
        assert_eq!(*frame.get_pixel(85, 40), HIGHLIGHT);
        // below the bar is untouched
        assert_eq!(*frame.get_pixel(5, 100), Rgb([200, 200, 200]));
    }
}
