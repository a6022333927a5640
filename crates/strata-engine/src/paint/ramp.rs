use super::{Color, ColorStop};

/// Texel count of a fully baked color ramp.
pub const GRADIENT_TEX_SIZE: usize = 1024;

/// 1D color strip baked from normalized stops.
///
/// Texel `x` of a stop at offset `o` is `⌊o · (GRADIENT_TEX_SIZE - 1)⌋`.
/// Between consecutive stops the interpolation factor is snapped down to a
/// multiple of the paint granularity before blending, so coarse granularity
/// produces visible bands.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRamp {
    texels: Vec<[u8; 4]>,
}

impl ColorRamp {
    /// Bakes `stops` (already normalized) with the given granularity.
    ///
    /// A granularity `<= 0` disables quantization.
    pub fn bake(stops: &[ColorStop], granularity: f32) -> Self {
        let mut texels = Vec::with_capacity(GRADIENT_TEX_SIZE);
        let Some(first) = stops.first() else {
            return Self { texels };
        };

        texels.push(first.color.to_u8());

        let last_texel = (GRADIENT_TEX_SIZE - 1) as f32;
        let mut x1 = texel_of(first.offset, last_texel);
        let mut c1 = first.color;

        for stop in &stops[1..] {
            let x2 = texel_of(stop.offset, last_texel).max(x1);
            let dx = (x2 - x1) as f32;
            for x in (x1 + 1)..=x2 {
                let mut k = (x - x1) as f32 / dx;
                if granularity > 0.0 {
                    k -= k % granularity;
                }
                texels.push(c1.lerp(stop.color, k).to_u8());
            }
            x1 = x2;
            c1 = stop.color;
        }

        Self { texels }
    }

    /// Number of baked texels (the GPU texture width).
    #[inline]
    pub fn width(&self) -> usize {
        self.texels.len()
    }

    #[inline]
    pub fn texels(&self) -> &[[u8; 4]] {
        &self.texels
    }

    /// Texel color as a straight-alpha [`Color`].
    #[inline]
    pub fn color_at(&self, x: usize) -> Option<Color> {
        self.texels.get(x).map(|t| Color::from_u8(t[0], t[1], t[2], t[3]))
    }

    /// True when every texel is fully opaque.
    #[inline]
    pub fn is_opaque(&self) -> bool {
        self.texels.iter().all(|t| t[3] == 255)
    }

    /// Raw RGBA8 bytes for texture upload.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }
}

#[inline]
fn texel_of(offset: f32, last_texel: f32) -> usize {
    (offset.clamp(0.0, 1.0) * last_texel) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::gradient::normalize_stops;
    use std::collections::HashSet;

    fn black_to_white() -> Vec<ColorStop> {
        vec![ColorStop::new(0.0, Color::black()), ColorStop::new(1.0, Color::white())]
    }

    fn distinct(ramp: &ColorRamp) -> usize {
        ramp.texels().iter().copied().collect::<HashSet<_>>().len()
    }

    // ── size ──────────────────────────────────────────────────────────────

    #[test]
    fn full_ramp_spans_texture_width() {
        let ramp = ColorRamp::bake(&black_to_white(), 0.01);
        assert_eq!(ramp.width(), GRADIENT_TEX_SIZE);
    }

    #[test]
    fn first_texel_is_first_stop_color() {
        let ramp = ColorRamp::bake(&black_to_white(), 0.5);
        assert_eq!(ramp.texels()[0], [0, 0, 0, 255]);
        assert_eq!(ramp.texels()[GRADIENT_TEX_SIZE - 1], [255, 255, 255, 255]);
    }

    // ── granularity ───────────────────────────────────────────────────────

    #[test]
    fn half_granularity_yields_at_most_three_colors() {
        let ramp = ColorRamp::bake(&black_to_white(), 0.5);
        assert!(distinct(&ramp) <= 3, "got {}", distinct(&ramp));
    }

    #[test]
    fn unit_granularity_is_a_hard_step() {
        let ramp = ColorRamp::bake(&black_to_white(), 1.0);
        assert_eq!(distinct(&ramp), 2);
        assert_eq!(ramp.texels()[GRADIENT_TEX_SIZE - 2], [0, 0, 0, 255]);
    }

    #[test]
    fn fine_granularity_is_smooth() {
        let ramp = ColorRamp::bake(&black_to_white(), 0.001);
        assert!(distinct(&ramp) > 200);
    }

    // ── multi-stop ────────────────────────────────────────────────────────

    #[test]
    fn coincident_stops_make_a_sharp_edge() {
        let red = Color::new(1.0, 0.0, 0.0, 1.0);
        let blue = Color::new(0.0, 0.0, 1.0, 1.0);
        let stops = normalize_stops(&[
            ColorStop::new(0.0, red),
            ColorStop::new(0.5, red),
            ColorStop::new(0.5, blue),
            ColorStop::new(1.0, blue),
        ]);
        let ramp = ColorRamp::bake(&stops, 0.01);
        assert_eq!(ramp.width(), GRADIENT_TEX_SIZE);
        assert_eq!(ramp.texels()[100], [255, 0, 0, 255]);
        assert_eq!(ramp.texels()[900], [0, 0, 255, 255]);
        assert_eq!(ramp.color_at(GRADIENT_TEX_SIZE - 1), Some(blue));
        assert_eq!(ramp.color_at(GRADIENT_TEX_SIZE), None);
    }

    #[test]
    fn opaque_detection() {
        assert!(ColorRamp::bake(&black_to_white(), 0.01).is_opaque());
        let faded = [
            ColorStop::new(0.0, Color::black()),
            ColorStop::new(1.0, Color::transparent()),
        ];
        assert!(!ColorRamp::bake(&faded, 0.01).is_opaque());
    }
}
