//! Stroke expansion: flattened contours to a triangle soup.
//!
//! The stroker walks each contour's polyline, emitting a quad per edge plus
//! joins at segment boundaries, bevel gap fills inside curves, caps at open
//! ends, and dash on-intervals when a dash pattern is active.

mod dash;
mod stroker;
mod style;

pub use dash::DashPattern;
pub use stroker::{stroke, MAX_DASH_STEPS};
pub use style::{CapStyle, JoinStyle, StrokeStyle};
