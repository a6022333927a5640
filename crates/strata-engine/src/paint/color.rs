/// Non-premultiplied RGBA color with `f32` channels.
///
/// Paint colors, gradient stops, clear colors and image pixels all travel in
/// this straight-alpha form. Premultiplication happens at the GPU boundary
/// ([`premultiplied`](Self::premultiplied)).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn transparent() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    #[inline]
    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    #[inline]
    pub const fn white() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }

    /// Unpacks `0xRRGGBBAA`.
    #[inline]
    pub fn from_rgba_u32(rgba: u32) -> Self {
        let ch = |shift: u32| ((rgba >> shift) & 0xFF) as f32 / 255.0;
        Self::new(ch(24), ch(16), ch(8), ch(0))
    }

    /// Packs to `0xRRGGBBAA`, clamping and rounding each channel.
    #[inline]
    pub fn to_rgba_u32(self) -> u32 {
        let ch = |v: f32| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u32;
        (ch(self.r) << 24) | (ch(self.g) << 16) | (ch(self.b) << 8) | ch(self.a)
    }

    /// Creates a color from straight sRGB bytes.
    #[inline]
    pub fn from_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a as f32 / 255.0)
    }

    /// Converts to RGBA bytes with rounding.
    #[inline]
    pub fn to_u8(self) -> [u8; 4] {
        let ch = |v: f32| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
        [ch(self.r), ch(self.g), ch(self.b), ch(self.a)]
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }

    /// Clamps all channels to [0, 1].
    #[inline]
    pub fn clamped(self) -> Self {
        Self::new(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
            self.a.clamp(0.0, 1.0),
        )
    }

    /// Premultiplied `[r, g, b, a]` for GPU upload.
    #[inline]
    pub fn premultiplied(self) -> [f32; 4] {
        let c = self.clamped();
        [c.r * c.a, c.g * c.a, c.b * c.a, c.a]
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[inline]
    pub fn lerp(self, other: Color, t: f32) -> Color {
        Color::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
            self.a + (other.a - self.a) * t,
        )
    }
}
