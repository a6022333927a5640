use super::Vec2;

/// Axis-aligned rectangle stored as origin (minimum corner) plus size.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub const fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    #[inline]
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self::from_origin_size(min, max - min)
    }

    /// Tight bounds of a point set; `(0,0)-(0,0)` when empty.
    pub fn bounding(points: impl IntoIterator<Item = Vec2>) -> Self {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return Rect::default();
        };
        let (min, max) = iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Rect::from_min_max(min, max)
    }

    #[inline]
    pub fn min(self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        Vec2::new(self.origin.x + self.size.x, self.origin.y + self.size.y)
    }

    /// Corners in winding order: min, (max.x, min.y), max, (min.x, max.y).
    #[inline]
    pub fn corners(self) -> [Vec2; 4] {
        let lo = self.min();
        let hi = self.max();
        [lo, Vec2::new(hi.x, lo.y), hi, Vec2::new(lo.x, hi.y)]
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.origin.is_finite() && self.size.is_finite()
    }

    /// Normalizes the rectangle so width/height are non-negative.
    #[inline]
    pub fn normalized(self) -> Self {
        let mut x = self.origin.x;
        let mut y = self.origin.y;
        let mut w = self.size.x;
        let mut h = self.size.y;

        if w < 0.0 {
            x += w;
            w = -w;
        }
        if h < 0.0 {
            y += h;
            h = -h;
        }

        Rect::new(x, y, w, h)
    }

    /// Grows the rectangle by `k` on every side.
    #[inline]
    pub fn inflate(self, k: f32) -> Self {
        Rect::new(
            self.origin.x - k,
            self.origin.y - k,
            self.size.x + 2.0 * k,
            self.size.y + 2.0 * k,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect { Rect::new(x, y, w, h) }

    // ── normalized ────────────────────────────────────────────────────────

    #[test]
    fn normalized_positive_is_identity() {
        let rect = r(1.0, 2.0, 10.0, 20.0);
        assert_eq!(rect.normalized(), rect);
    }

    #[test]
    fn normalized_negative_width() {
        let n = r(10.0, 0.0, -4.0, 5.0).normalized();
        assert_eq!(n.origin.x, 6.0);
        assert_eq!(n.size.x, 4.0);
    }

    // ── bounding ──────────────────────────────────────────────────────────

    #[test]
    fn bounding_empty_is_degenerate_origin() {
        assert_eq!(Rect::bounding(std::iter::empty()), r(0.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn bounding_is_tight() {
        let pts = [Vec2::new(3.0, -1.0), Vec2::new(-2.0, 4.0), Vec2::new(0.0, 0.0)];
        assert_eq!(Rect::bounding(pts), r(-2.0, -1.0, 5.0, 5.0));
    }

    // ── inflate ───────────────────────────────────────────────────────────

    #[test]
    fn inflate_pads_every_side() {
        assert_eq!(r(1.0, 1.0, 2.0, 2.0).inflate(1.0), r(0.0, 0.0, 4.0, 4.0));
    }
}
