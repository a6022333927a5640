use crate::image::TilingMode;
use crate::paint::{Color, ColorStop, LinearGradient, Paint, PaintType, RadialGradient, SpreadMode};

use super::context::Context;
use super::error::VgError;
use super::state::PaintModes;
use super::{ImageHandle, PaintHandle};

impl Context {
    pub fn create_paint(&mut self) -> PaintHandle {
        self.paints.insert(Paint::new())
    }

    /// Destroys a paint. Bindings to it fall back to the default paint;
    /// queued draws still see it until the next render.
    pub fn destroy_paint(&mut self, h: PaintHandle) {
        let Some(paint) = self.paints.remove(h) else {
            self.errors.record(VgError::BadHandle);
            return;
        };
        if self.state.fill_paint == Some(h) {
            self.state.fill_paint = None;
        }
        if self.state.stroke_paint == Some(h) {
            self.state.stroke_paint = None;
        }
        if !self.plans.is_empty() {
            self.retired_paints.push((h, paint));
        }
    }

    #[inline]
    pub fn paint(&self, h: PaintHandle) -> Option<&Paint> {
        self.paints.get(h)
    }

    /// Binds `paint` to the slots in `modes`; `None` restores the default
    /// paint.
    pub fn set_paint(&mut self, paint: Option<PaintHandle>, modes: PaintModes) {
        if paint.is_some_and(|h| !self.paints.contains(h)) {
            self.errors.record(VgError::BadHandle);
            return;
        }
        if modes.is_empty() {
            self.errors.record(VgError::IllegalArgument);
            return;
        }
        if modes.contains(PaintModes::FILL) {
            self.state.fill_paint = paint;
        }
        if modes.contains(PaintModes::STROKE) {
            self.state.stroke_paint = paint;
        }
    }

    /// Paint bound to a single slot; `None` when the default paint is in use.
    pub fn get_paint(&mut self, mode: PaintModes) -> Option<PaintHandle> {
        if mode == PaintModes::FILL {
            self.state.fill_paint
        } else if mode == PaintModes::STROKE {
            self.state.stroke_paint
        } else {
            self.errors.record(VgError::IllegalArgument);
            None
        }
    }

    /// Runs `f` on the paint, routing its error into the error slot.
    pub fn with_paint<T>(&mut self, h: PaintHandle, f: impl FnOnce(&mut Paint) -> Result<T, VgError>) -> Option<T> {
        let Some(paint) = self.paints.get_mut(h) else {
            self.errors.record(VgError::BadHandle);
            return None;
        };
        let result = f(paint);
        self.errors.check(result)
    }

    pub fn set_paint_type(&mut self, h: PaintHandle, kind: PaintType) {
        self.with_paint(h, |p| {
            p.set_paint_type(kind);
            Ok(())
        });
    }

    /// Sets the flat color; channels are clamped to [0, 1].
    pub fn set_paint_color(&mut self, h: PaintHandle, color: Color) {
        if !self.paints.contains(h) {
            self.errors.record(VgError::BadHandle);
            return;
        }
        let Some(color) = self.checked_color(color) else { return };
        self.with_paint(h, |p| {
            p.set_color(color);
            Ok(())
        });
    }

    /// Sets the flat color from packed `0xRRGGBBAA`.
    pub fn set_color(&mut self, h: PaintHandle, rgba: u32) {
        self.set_paint_color(h, Color::from_rgba_u32(rgba));
    }

    /// Flat color packed as `0xRRGGBBAA`; zero for an invalid handle.
    pub fn get_color(&mut self, h: PaintHandle) -> u32 {
        self.with_paint(h, |p| Ok(p.color().to_rgba_u32())).unwrap_or(0)
    }

    /// Replaces the color ramp stops. Stop colors are clamped; offsets are
    /// validated when the ramp is normalized.
    pub fn set_color_ramp_stops(&mut self, h: PaintHandle, stops: &[ColorStop]) {
        if stops.iter().any(|s| !s.color.is_finite()) {
            self.errors.record(VgError::IllegalArgument);
            return;
        }
        let clamped: Vec<ColorStop> = stops.iter().map(|s| ColorStop::new(s.offset, s.color.clamped())).collect();
        self.with_paint(h, |p| {
            p.set_color_ramp_stops(&clamped);
            Ok(())
        });
    }

    pub fn set_color_ramp_spread_mode(&mut self, h: PaintHandle, spread: SpreadMode) {
        self.with_paint(h, |p| {
            p.set_spread_mode(spread);
            Ok(())
        });
    }

    /// `[x0, y0, x1, y1]` in paint space.
    pub fn set_linear_gradient(&mut self, h: PaintHandle, params: [f32; 4]) {
        self.with_paint(h, |p| {
            if params.iter().any(|v| !v.is_finite()) {
                return Err(VgError::IllegalArgument);
            }
            p.set_linear_gradient(LinearGradient::from_params(params));
            Ok(())
        });
    }

    /// `[x0, y0, x1, y1]`; zeros on error.
    pub fn linear_gradient(&mut self, h: PaintHandle) -> [f32; 4] {
        self.with_paint(h, |p| Ok(p.linear_gradient().to_params())).unwrap_or_default()
    }

    /// `[cx, cy, fx, fy, r]` in paint space.
    pub fn set_radial_gradient(&mut self, h: PaintHandle, params: [f32; 5]) {
        self.with_paint(h, |p| {
            if params.iter().any(|v| !v.is_finite()) {
                return Err(VgError::IllegalArgument);
            }
            p.set_radial_gradient(RadialGradient::from_params(params));
            Ok(())
        });
    }

    pub fn radial_gradient(&mut self, h: PaintHandle) -> [f32; 5] {
        self.with_paint(h, |p| Ok(p.radial_gradient().to_params())).unwrap_or_default()
    }

    /// Ramp quantization step, in `(0, 1]`.
    pub fn set_granularity(&mut self, h: PaintHandle, granularity: f32) {
        self.with_paint(h, |p| {
            if !(granularity > 0.0 && granularity <= 1.0) {
                return Err(VgError::IllegalArgument);
            }
            p.set_granularity(granularity);
            Ok(())
        });
    }

    /// Sets (or with `None` clears) the pattern image.
    pub fn paint_pattern(&mut self, h: PaintHandle, image: Option<ImageHandle>) {
        if image.is_some_and(|i| !self.images.contains(i)) {
            self.errors.record(VgError::BadHandle);
            return;
        }
        self.with_paint(h, |p| {
            p.set_pattern(image);
            Ok(())
        });
    }

    pub fn set_pattern_tiling_mode(&mut self, h: PaintHandle, tiling: TilingMode) {
        self.with_paint(h, |p| {
            p.set_tiling_mode(tiling);
            Ok(())
        });
    }
}
