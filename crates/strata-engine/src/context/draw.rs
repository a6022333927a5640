use crate::coords::Rect;
use crate::image::ImageQuality;
use crate::paint::Paint;
use crate::render::{shade, update_fill, update_stroke, DrawPlan, PaintShading, PlanEnv, ScissorBox, HAIRLINE_WIDTH};

use super::context::Context;
use super::error::VgError;
use super::state::PaintModes;
use super::{ImageHandle, PaintHandle, PathHandle};

impl Context {
    /// Plans a fill and/or stroke of `h` with the bound paints. The fill is
    /// drawn first.
    pub fn draw_path(&mut self, h: PathHandle, modes: PaintModes) {
        if !self.paths.contains(h) {
            self.errors.record(VgError::BadHandle);
            return;
        }
        if modes.is_empty() {
            self.errors.record(VgError::IllegalArgument);
            return;
        }
        let Some(env) = self.plan_env() else { return };

        let params = self.flatten_params();
        let transform = self.state.path_matrix;
        let width = self.state.stroke.width;
        let fill = modes.contains(PaintModes::FILL);
        let stroke = modes.contains(PaintModes::STROKE) && width > 0.0;
        let wide = width > HAIRLINE_WIDTH;

        if let Some(path) = self.paths.get_mut(h) {
            if stroke && wide {
                update_stroke(path, &transform, params, &self.state.stroke);
            } else {
                update_fill(path, &transform, params);
            }
        }
        let Some(path) = self.paths.get(h) else { return };
        let tess = path.cache.tessellation();

        if fill {
            let shading = self.shading(PaintModes::FILL, path.cache.bounds());
            if let Some(plan) = DrawPlan::fill(&env, &transform, tess, self.state.fill_rule, &shading) {
                self.plans.push(plan);
            }
        }
        if stroke {
            let plan = if wide {
                let mesh = path.cache.stroke_mesh();
                let shading = self.shading(PaintModes::STROKE, Rect::bounding(mesh.iter().copied()));
                DrawPlan::stroke(&env, &transform, mesh, &shading)
            } else {
                let shading = self.shading(PaintModes::STROKE, path.cache.bounds());
                DrawPlan::hairline(&env, &transform, tess, width, &shading)
            };
            if let Some(plan) = plan {
                self.plans.push(plan);
            }
        }
    }

    /// Plans `h` as a textured quad `(0,0)-(w,h)` through the image matrix,
    /// combined with the fill paint per the image mode.
    pub fn draw_image(&mut self, h: ImageHandle) {
        let Some(image) = self.images.get(h) else {
            self.errors.record(VgError::BadHandle);
            return;
        };
        let Some(env) = self.plan_env() else { return };

        let rect = Rect::new(0.0, 0.0, image.width() as f32, image.height() as f32);
        let shading = self.shading(PaintModes::FILL, rect);
        let paint_type = self.bound_paint(PaintModes::FILL).0.paint_type();
        let nearest = self.state.image_quality == ImageQuality::NONANTIALIASED
            || image.allowed_quality() == ImageQuality::NONANTIALIASED;

        let plan = DrawPlan::image(
            &env,
            &self.state.image_matrix,
            h,
            image,
            self.state.image_mode,
            paint_type,
            &shading,
            !nearest,
        );
        if let Some(plan) = plan {
            self.plans.push(plan);
        }
    }

    /// Fills a surface-space rect with the clear color, ignoring blending.
    /// Honors the scissor.
    pub fn clear(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if !(width > 0.0 && height > 0.0) || !x.is_finite() || !y.is_finite() {
            self.errors.record(VgError::IllegalArgument);
            return;
        }
        let Some(env) = self.plan_env() else { return };
        if let Some(plan) = DrawPlan::clear(&env, Rect::new(x, y, width, height), self.state.clear_color) {
            self.plans.push(plan);
        }
    }

    /// Plan environment, or `None` when the scissor hides everything.
    fn plan_env(&self) -> Option<PlanEnv> {
        let scissor = if self.state.scissoring {
            let first = self.state.scissor_rects.first()?;
            Some(ScissorBox::from_surface_rect(*first, self.viewport)?)
        } else {
            None
        };
        Some(PlanEnv { viewport: self.viewport, blend: self.state.blend_mode, scissor })
    }

    /// Paint bound to one slot, or the default paint.
    fn bound_paint(&self, slot: PaintModes) -> (&Paint, Option<PaintHandle>) {
        let bound = if slot == PaintModes::STROKE { self.state.stroke_paint } else { self.state.fill_paint };
        match bound.and_then(|h| self.paints.get(h).map(|p| (p, h))) {
            Some((p, h)) => (p, Some(h)),
            None => (&self.default_paint, None),
        }
    }

    fn shading(&self, slot: PaintModes, bounds: Rect) -> PaintShading {
        let (paint, handle) = self.bound_paint(slot);
        let matrix = if slot == PaintModes::STROKE {
            &self.state.stroke_paint_matrix
        } else {
            &self.state.fill_paint_matrix
        };
        let pattern = paint.pattern().and_then(|ih| self.images.get(ih).map(|img| (ih, img)));
        shade(paint, handle, pattern, matrix, bounds, self.config.gradient_mapping, self.state.tile_fill_color)
    }
}

#[cfg(test)]
mod tests {
    use crate::context::{Context, ContextConfig, ImageMode, PaintModes, PathHandle, VgError};
    use crate::coords::Rect;
    use crate::image::{ImageFormat, ImageQuality};
    use crate::paint::{Color, PaintType};
    use crate::path::{builder, PathCapabilities, PathDatatype};
    use crate::render::{ShaderMode, StencilMode, TextureRef, Topology};

    fn ctx() -> Context {
        Context::new(ContextConfig { surface_width: 100, surface_height: 100, ..Default::default() })
    }

    fn square(c: &mut Context) -> PathHandle {
        let h = c.create_path(PathDatatype::F32, 1.0, 0.0, PathCapabilities::ALL).unwrap();
        c.with_path(h, |p| builder::rect(p, 10.0, 10.0, 50.0, 50.0));
        h
    }

    fn stencils(c: &Context, plan: usize) -> Vec<StencilMode> {
        c.queued_plans()[plan].passes.iter().map(|p| p.stencil).collect()
    }

    // ── validation ───────────────────────────────────────────────────────

    #[test]
    fn draw_requires_mode_and_handle() {
        let mut c = ctx();
        let h = square(&mut c);
        c.draw_path(h, PaintModes::from_bits_truncate(0));
        assert_eq!(c.take_error(), Some(VgError::IllegalArgument));
        c.destroy_path(h);
        c.draw_path(h, PaintModes::FILL);
        assert_eq!(c.take_error(), Some(VgError::BadHandle));
        assert_eq!(c.queued_draws(), 0);
    }

    // ── fill and stroke ──────────────────────────────────────────────────

    #[test]
    fn fill_then_stroke() {
        let mut c = ctx();
        let h = square(&mut c);
        c.set_stroke_width(4.0);
        c.draw_path(h, PaintModes::BOTH);
        assert_eq!(c.queued_draws(), 2);
        assert_eq!(stencils(&c, 0), vec![StencilMode::FillEvenOdd, StencilMode::CoverEqualOne, StencilMode::Clear]);
        assert_eq!(stencils(&c, 1)[0], StencilMode::Stroke);
        assert_eq!(c.take_error(), None);
    }

    #[test]
    fn non_zero_rule_selects_non_zero_cover() {
        let mut c = ctx();
        let h = square(&mut c);
        c.set_fill_rule(crate::context::FillRule::NonZero);
        c.draw_path(h, PaintModes::FILL);
        assert_eq!(stencils(&c, 0)[..2], [StencilMode::FillNonZero, StencilMode::CoverNonZero]);
    }

    #[test]
    fn zero_width_stroke_draws_nothing() {
        let mut c = ctx();
        let h = square(&mut c);
        c.set_stroke_width(0.0);
        c.draw_path(h, PaintModes::STROKE);
        assert_eq!(c.queued_draws(), 0);
        assert_eq!(c.take_error(), None);
    }

    #[test]
    fn thin_stroke_uses_lines() {
        let mut c = ctx();
        let h = square(&mut c);
        c.set_stroke_width(0.05);
        c.draw_path(h, PaintModes::STROKE);
        let pass = &c.queued_plans()[0].passes[0];
        assert_eq!(pass.topology, Topology::Lines);
        assert!((pass.uniform.viewport_mode[3] - 0.5).abs() < 1e-5);
    }

    #[test]
    fn bound_paint_shades_the_fill() {
        let mut c = ctx();
        let h = square(&mut c);
        let p = c.create_paint();
        c.set_paint_color(p, Color::new(0.0, 1.0, 0.0, 1.0));
        c.set_paint(Some(p), PaintModes::FILL);
        c.draw_path(h, PaintModes::FILL);
        let cover = &c.queued_plans()[0].passes[1];
        assert_eq!(cover.uniform.color, [0.0, 1.0, 0.0, 1.0]);

        c.set_paint_type(p, PaintType::LinearGradient);
        c.set_linear_gradient(p, [10.0, 0.0, 60.0, 0.0]);
        c.draw_path(h, PaintModes::FILL);
        let cover = &c.queued_plans()[1].passes[1];
        assert_eq!(cover.texture, TextureRef::Ramp(p));
    }

    // ── scissor ──────────────────────────────────────────────────────────

    #[test]
    fn scissor_uses_first_rect() {
        let mut c = ctx();
        let h = square(&mut c);
        c.set_scissoring(true);
        c.draw_path(h, PaintModes::FILL);
        assert_eq!(c.queued_draws(), 0);

        c.set_scissor_rects(&[Rect::new(0.0, 0.0, 20.0, 30.0), Rect::new(50.0, 50.0, 10.0, 10.0)]);
        c.draw_path(h, PaintModes::FILL);
        let sc = c.queued_plans()[0].scissor.unwrap();
        assert_eq!((sc.x, sc.y, sc.width, sc.height), (0, 70, 20, 30));
    }

    // ── images and clear ─────────────────────────────────────────────────

    #[test]
    fn draw_image_normal_and_stencil() {
        let mut c = ctx();
        let img = c.create_image(ImageFormat::SRGBA_8888, 8, 4, ImageQuality::ALL).unwrap();
        c.draw_image(img);
        let pass = &c.queued_plans()[0].passes[0];
        assert_eq!(pass.texture, TextureRef::Image(img));
        assert_eq!(pass.uniform.color, [1.0, 1.0, 1.0, 1.0]);
        assert!(c.queued_plans()[0].vertices.iter().any(|v| v.pos == [8.0, 4.0]));

        c.set_image_mode(ImageMode::Stencil);
        c.draw_image(img);
        let pass = &c.queued_plans()[1].passes[0];
        assert_eq!(pass.uniform.color, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn multiply_with_gradient_goes_through_stencil() {
        let mut c = ctx();
        let img = c.create_image(ImageFormat::SRGBA_8888, 8, 8, ImageQuality::ALL).unwrap();
        let p = c.create_paint();
        c.set_paint_type(p, PaintType::RadialGradient);
        c.set_paint(Some(p), PaintModes::FILL);
        c.set_image_mode(ImageMode::Multiply);
        c.draw_image(img);
        assert_eq!(stencils(&c, 0)[0], StencilMode::FillEvenOdd);
        let cover = &c.queued_plans()[0].passes[1];
        assert_eq!(cover.uniform.viewport_mode[2], ShaderMode::Radial.code());
    }

    #[test]
    fn clear_validates_and_queues() {
        let mut c = ctx();
        c.clear(0.0, 0.0, -1.0, 5.0);
        assert_eq!(c.take_error(), Some(VgError::IllegalArgument));
        c.set_clear_color(Color::white());
        c.clear(0.0, 0.0, 100.0, 100.0);
        assert_eq!(c.queued_draws(), 1);
    }

    // ── retired resources ────────────────────────────────────────────────

    #[test]
    fn destroyed_paint_outlives_queued_plans() {
        let mut c = ctx();
        let h = square(&mut c);
        let p = c.create_paint();
        c.set_paint_type(p, PaintType::LinearGradient);
        c.set_paint(Some(p), PaintModes::FILL);
        c.draw_path(h, PaintModes::FILL);
        c.destroy_paint(p);
        assert!(c.paint(p).is_none());
        assert!(c.paint_resource(p).is_some());

        let plans = c.take_plans();
        assert_eq!(plans.len(), 1);
        c.release_retired();
        assert!(c.paint_resource(p).is_none());
    }
}
