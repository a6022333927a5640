use crate::context::ImageHandle;
use crate::image::TilingMode;
use crate::render::TextureMirror;

use super::gradient::{generate_stops, normalize_stops};
use super::{Color, ColorRamp, ColorStop, LinearGradient, RadialGradient, SpreadMode};

/// Default interpolation quantization step.
pub const DEFAULT_GRANULARITY: f32 = 0.01;

/// Paint source variant.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum PaintType {
    #[default]
    Color,
    LinearGradient,
    RadialGradient,
    Pattern,
}

/// A paint object owned by the context registry.
///
/// Gradient stops are kept twice: the user's input (returned verbatim by
/// [`input_stops`](Self::input_stops)) and the normalized sequence the ramp is
/// baked from. Every change affecting the ramp re-bakes it and bumps
/// [`ramp_revision`](Self::ramp_revision) so the GPU mirror re-uploads.
#[derive(Debug)]
pub struct Paint {
    kind: PaintType,
    color: Color,
    input_stops: Vec<ColorStop>,
    stops: Vec<ColorStop>,
    spread: SpreadMode,
    linear: LinearGradient,
    radial: RadialGradient,
    tiling: TilingMode,
    granularity: f32,
    pattern: Option<ImageHandle>,

    ramp: ColorRamp,
    ramp_revision: u64,

    pub(crate) texture: TextureMirror,
}

impl Default for Paint {
    fn default() -> Self {
        Self::new()
    }
}

impl Paint {
    /// Opaque black color paint with pad spread, fill tiling and default granularity.
    pub fn new() -> Self {
        let stops = normalize_stops(&[]);
        let ramp = ColorRamp::bake(&stops, DEFAULT_GRANULARITY);
        Self {
            kind: PaintType::Color,
            color: Color::black(),
            input_stops: Vec::new(),
            stops,
            spread: SpreadMode::Pad,
            linear: LinearGradient::default(),
            radial: RadialGradient::default(),
            tiling: TilingMode::Fill,
            granularity: DEFAULT_GRANULARITY,
            pattern: None,
            ramp,
            ramp_revision: 0,
            texture: TextureMirror::default(),
        }
    }

    #[inline]
    pub fn paint_type(&self) -> PaintType {
        self.kind
    }

    #[inline]
    pub fn set_paint_type(&mut self, kind: PaintType) {
        self.kind = kind;
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    #[inline]
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Stops exactly as supplied by the caller.
    #[inline]
    pub fn input_stops(&self) -> &[ColorStop] {
        &self.input_stops
    }

    /// Normalized stops the ramp is baked from.
    #[inline]
    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    pub fn set_color_ramp_stops(&mut self, stops: &[ColorStop]) {
        self.input_stops = stops
            .iter()
            .take(super::gradient::MAX_COLOR_RAMP_STOPS)
            .copied()
            .collect();
        self.stops = normalize_stops(&self.input_stops);
        self.rebake();
    }

    #[inline]
    pub fn spread_mode(&self) -> SpreadMode {
        self.spread
    }

    #[inline]
    pub fn set_spread_mode(&mut self, spread: SpreadMode) {
        self.spread = spread;
    }

    #[inline]
    pub fn linear_gradient(&self) -> LinearGradient {
        self.linear
    }

    #[inline]
    pub fn set_linear_gradient(&mut self, g: LinearGradient) {
        self.linear = g;
    }

    #[inline]
    pub fn radial_gradient(&self) -> RadialGradient {
        self.radial
    }

    #[inline]
    pub fn set_radial_gradient(&mut self, g: RadialGradient) {
        self.radial = g;
    }

    #[inline]
    pub fn tiling_mode(&self) -> TilingMode {
        self.tiling
    }

    #[inline]
    pub fn set_tiling_mode(&mut self, tiling: TilingMode) {
        self.tiling = tiling;
    }

    #[inline]
    pub fn granularity(&self) -> f32 {
        self.granularity
    }

    /// Sets the quantization step. Callers validate the range `(0, 1]`.
    pub fn set_granularity(&mut self, granularity: f32) {
        if self.granularity != granularity {
            self.granularity = granularity;
            self.rebake();
        }
    }

    #[inline]
    pub fn pattern(&self) -> Option<ImageHandle> {
        self.pattern
    }

    #[inline]
    pub fn set_pattern(&mut self, image: Option<ImageHandle>) {
        self.pattern = image;
    }

    #[inline]
    pub fn ramp(&self) -> &ColorRamp {
        &self.ramp
    }

    #[inline]
    pub fn ramp_revision(&self) -> u64 {
        self.ramp_revision
    }

    /// Stops covering `[min_offset, max_offset]` under the current spread mode.
    ///
    /// Rendering samples the baked ramp with a wrapping sampler instead; this
    /// is the explicit stop list for callers that need it on the CPU.
    pub fn stops_for_range(&self, min_offset: f32, max_offset: f32) -> Vec<ColorStop> {
        generate_stops(&self.stops, self.spread, min_offset, max_offset)
    }

    /// True when every color this paint can produce has alpha 1.
    ///
    /// Patterns are never considered opaque.
    pub fn is_opaque(&self) -> bool {
        match self.kind {
            PaintType::Color => self.color.a >= 1.0,
            PaintType::LinearGradient | PaintType::RadialGradient => self.ramp.is_opaque(),
            PaintType::Pattern => false,
        }
    }

    /// Uploads the ramp if it changed since the last upload.
    pub(crate) fn sync_texture(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let ramp = &self.ramp;
        self.texture.sync(
            device,
            queue,
            "strata paint ramp",
            ramp.width() as u32,
            1,
            self.ramp_revision,
            || ramp.as_bytes().to_vec(),
        );
    }

    fn rebake(&mut self) {
        self.ramp = ColorRamp::bake(&self.stops, self.granularity);
        self.ramp_revision = self.ramp_revision.wrapping_add(1);
        log::debug!(
            "paint ramp rebaked: {} stops, {} texels, granularity {}",
            self.stops.len(),
            self.ramp.width(),
            self.granularity
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── defaults ──────────────────────────────────────────────────────────

    #[test]
    fn new_paint_is_opaque_black_color() {
        let p = Paint::new();
        assert_eq!(p.paint_type(), PaintType::Color);
        assert_eq!(p.color(), Color::black());
        assert_eq!(p.spread_mode(), SpreadMode::Pad);
        assert_eq!(p.tiling_mode(), TilingMode::Fill);
        assert_eq!(p.granularity(), DEFAULT_GRANULARITY);
        assert!(p.pattern().is_none());
        assert_eq!(p.stops().len(), 2);
    }

    // ── ramp maintenance ──────────────────────────────────────────────────

    #[test]
    fn setting_stops_rebakes_and_bumps_revision() {
        let mut p = Paint::new();
        let before = p.ramp_revision();
        p.set_color_ramp_stops(&[ColorStop::new(0.5, Color::white())]);
        assert_ne!(p.ramp_revision(), before);
        assert_eq!(p.input_stops().len(), 1);
        assert_eq!(p.stops().len(), 3);
        assert_eq!(p.ramp().texels()[0], [255, 255, 255, 255]);
    }

    #[test]
    fn same_granularity_does_not_rebake() {
        let mut p = Paint::new();
        let before = p.ramp_revision();
        p.set_granularity(DEFAULT_GRANULARITY);
        assert_eq!(p.ramp_revision(), before);
        p.set_granularity(0.5);
        assert_ne!(p.ramp_revision(), before);
    }

    #[test]
    fn input_stops_are_capped() {
        let mut p = Paint::new();
        let many: Vec<_> = (0..300).map(|i| ColorStop::new(i as f32 / 300.0, Color::white())).collect();
        p.set_color_ramp_stops(&many);
        assert_eq!(p.input_stops().len(), super::super::gradient::MAX_COLOR_RAMP_STOPS);
    }

    // ── opacity ───────────────────────────────────────────────────────────

    #[test]
    fn repeat_spread_tiles_the_ramp() {
        let mut p = Paint::new();
        p.set_spread_mode(SpreadMode::Repeat);
        let stops = p.stops_for_range(0.0, 2.0);
        assert_eq!(stops.first().map(|s| s.offset), Some(0.0));
        assert!(stops.last().is_some_and(|s| s.offset >= 2.0));
        assert!(stops.windows(2).all(|w| w[0].offset <= w[1].offset));
    }

    #[test]
    fn opacity_by_variant() {
        let mut p = Paint::new();
        assert!(p.is_opaque());
        p.set_color(Color::new(1.0, 1.0, 1.0, 0.5));
        assert!(!p.is_opaque());
        p.set_paint_type(PaintType::LinearGradient);
        assert!(p.is_opaque());
        p.set_paint_type(PaintType::Pattern);
        assert!(!p.is_opaque());
    }
}
