use super::dash::DashPattern;

/// Shape added at the open ends of a stroked contour (and at dash ends).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum CapStyle {
    #[default]
    Butt,
    Round,
    Square,
}

/// Shape filling the gap between two stroked segments.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum JoinStyle {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Stroke parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub width: f32,
    pub cap: CapStyle,
    pub join: JoinStyle,
    pub miter_limit: f32,
    /// Raw dash entries as supplied; see [`DashPattern::new`] for how they
    /// are interpreted.
    pub dash: Vec<f32>,
    pub dash_phase: f32,
    /// Restart the dash pattern at every contour rather than only the first.
    pub dash_phase_reset: bool,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            cap: CapStyle::Butt,
            join: JoinStyle::Miter,
            miter_limit: 4.0,
            dash: Vec::new(),
            dash_phase: 0.0,
            dash_phase_reset: false,
        }
    }
}

impl StrokeStyle {
    /// Effective dash pattern, or `None` when the stroke is solid.
    #[inline]
    pub fn dash_pattern(&self) -> Option<DashPattern> {
        DashPattern::new(&self.dash)
    }

    /// True when two styles produce the same geometry for an undashed stroke.
    pub(crate) fn same_outline(&self, other: &StrokeStyle) -> bool {
        self.width == other.width
            && self.cap == other.cap
            && self.join == other.join
            && self.miter_limit == other.miter_limit
    }
}
