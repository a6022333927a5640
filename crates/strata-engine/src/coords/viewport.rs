/// Drawing surface size in pixels.
///
/// Plans map surface coordinates to NDC against this size; the scissor box
/// is clipped to its extent.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Physical extent clamped to at least one pixel per axis.
    #[inline]
    pub fn extent(self) -> (u32, u32) {
        (self.width.max(1.0) as u32, self.height.max(1.0) as u32)
    }
}
