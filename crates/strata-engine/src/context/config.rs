use crate::path::{DEFAULT_FLATNESS, DEFAULT_MAX_VERTICES};

/// How linear-gradient texture coordinates are laid over the paint quad.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum GradientMapping {
    /// The ramp runs along the quad axis picked from the signs of the
    /// gradient end points (right, left, down or up).
    #[default]
    Quadrant,
    /// Each quad corner is projected onto the gradient axis.
    Projected,
}

/// Construction parameters for a [`Context`](super::Context).
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Drawing surface size in pixels.
    pub surface_width: u32,
    pub surface_height: u32,
    /// Maximum deviation, in surface pixels, of a flattened curve from the
    /// true curve.
    pub flatness: f32,
    /// Per-path cap on flattened vertices.
    pub max_vertices: usize,
    pub gradient_mapping: GradientMapping,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            surface_width: 640,
            surface_height: 480,
            flatness: DEFAULT_FLATNESS,
            max_vertices: DEFAULT_MAX_VERTICES,
            gradient_mapping: GradientMapping::Quadrant,
        }
    }
}
