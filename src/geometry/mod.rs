//! Landmark geometry: from named face points to overlay placements.

mod anchor;
pub mod landmarks;
mod resolver;

pub use anchor::{AnchorSpec, Coordinate, MouthGate, Offset, VerticalAlign};
pub use resolver::{resolve, rotation_degrees, Placement};
