//! Paint model: colors, gradient stops, baked color ramps and paint objects.
//!
//! Scope:
//! - straight-alpha color representation
//! - stop normalization and spread-mode stop generation
//! - granularity-quantized ramp baking
//! - the registry-owned [`Paint`] object
//!
//! Geometry types remain in `coords`.

pub mod color;
pub mod gradient;
mod paint;
mod ramp;

pub use color::Color;
pub use gradient::{ColorStop, LinearGradient, RadialGradient, SpreadMode};
pub use paint::{Paint, PaintType, DEFAULT_GRANULARITY};
pub use ramp::{ColorRamp, GRADIENT_TEX_SIZE};
