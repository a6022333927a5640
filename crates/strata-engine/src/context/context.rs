use crate::coords::{Matrix, Rect, Viewport};
use crate::image::{ChannelMask, Image, ImageQuality};
use crate::paint::{Color, Paint};
use crate::path::{FlattenParams, Path};
use crate::render::{BlendMode, DrawPlan};
use crate::stroke::{CapStyle, JoinStyle, StrokeStyle};

use super::arena::Arena;
use super::config::ContextConfig;
use super::error::{ErrorSlot, VgError};
use super::state::{FillRule, ImageMode, MatrixMode, RenderingQuality, State, MAX_SCISSOR_RECTS};
use super::{ImageHandle, PaintHandle};

/// Rendering context: drawing state, the path/paint/image registries and the
/// queue of planned draws awaiting a [`PathRenderer`](crate::render::PathRenderer).
///
/// Public operations never fail loudly. A rejected call records a [`VgError`]
/// (first error wins), returns a sentinel and leaves state unmodified.
pub struct Context {
    pub(super) config: ContextConfig,
    pub(super) viewport: Viewport,

    pub(super) paths: Arena<Path>,
    pub(super) paints: Arena<Paint>,
    pub(super) images: Arena<Image>,

    // Destroyed while still referenced by queued plans; freed after render.
    pub(super) retired_paints: Vec<(PaintHandle, Paint)>,
    pub(super) retired_images: Vec<(ImageHandle, Image)>,

    /// Used by draws while no paint is bound (opaque black).
    pub(super) default_paint: Paint,
    pub(super) state: State,
    pub(super) errors: ErrorSlot,
    pub(super) plans: Vec<DrawPlan>,
}

impl Context {
    pub fn new(config: ContextConfig) -> Self {
        let viewport = Viewport::new(config.surface_width.max(1) as f32, config.surface_height.max(1) as f32);
        log::debug!(
            "context created: surface {}x{}, flatness {}",
            viewport.width,
            viewport.height,
            config.flatness
        );
        Self {
            config,
            viewport,
            paths: Arena::new(),
            paints: Arena::new(),
            images: Arena::new(),
            retired_paints: Vec::new(),
            retired_images: Vec::new(),
            default_paint: Paint::new(),
            state: State::default(),
            errors: ErrorSlot::default(),
            plans: Vec::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Surface size in pixels.
    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Resizes the drawing surface. Zero extents are rejected.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            self.errors.record(VgError::IllegalArgument);
            return;
        }
        self.config.surface_width = width;
        self.config.surface_height = height;
        self.viewport = Viewport::new(width as f32, height as f32);
    }

    /// Reads and clears the pending error.
    #[inline]
    pub fn take_error(&mut self) -> Option<VgError> {
        self.errors.take()
    }

    #[inline]
    pub fn peek_error(&self) -> Option<VgError> {
        self.errors.peek()
    }

    pub(super) fn flatten_params(&self) -> FlattenParams {
        FlattenParams { tolerance: self.config.flatness, max_vertices: self.config.max_vertices }
    }

    // ── matrices ─────────────────────────────────────────────────────────

    #[inline]
    pub fn set_matrix_mode(&mut self, mode: MatrixMode) {
        self.state.matrix_mode = mode;
    }

    #[inline]
    pub fn matrix_mode(&self) -> MatrixMode {
        self.state.matrix_mode
    }

    pub fn load_identity(&mut self) {
        *self.state.current_matrix_mut() = Matrix::identity();
    }

    /// Loads a column-major matrix into the current slot. Every mode but the
    /// image mode drops the projective row.
    pub fn load_matrix(&mut self, values: &[f32; 9]) {
        if values.iter().any(|v| !v.is_finite()) {
            self.errors.record(VgError::IllegalArgument);
            return;
        }
        let mut m = Matrix::from_column_major(values);
        if self.state.current_is_affine_only() {
            m.force_affine();
        }
        *self.state.current_matrix_mut() = m;
    }

    /// Column-major copy of the current matrix.
    pub fn get_matrix(&self) -> [f32; 9] {
        self.state.current_matrix().to_column_major()
    }

    /// Right-multiplies the current matrix.
    pub fn mult_matrix(&mut self, values: &[f32; 9]) {
        if values.iter().any(|v| !v.is_finite()) {
            self.errors.record(VgError::IllegalArgument);
            return;
        }
        let mut rhs = Matrix::from_column_major(values);
        let affine_only = self.state.current_is_affine_only();
        if affine_only {
            rhs.force_affine();
        }
        let current = self.state.current_matrix_mut();
        *current = current.mul(&rhs);
        if affine_only {
            current.force_affine();
        }
    }

    pub fn translate(&mut self, tx: f32, ty: f32) {
        self.state.current_matrix_mut().translate(tx, ty);
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.state.current_matrix_mut().scale(sx, sy);
    }

    pub fn shear(&mut self, shx: f32, shy: f32) {
        self.state.current_matrix_mut().shear(shx, shy);
    }

    /// Rotates counter-clockwise by `degrees`.
    pub fn rotate(&mut self, degrees: f32) {
        self.state.current_matrix_mut().rotate(degrees);
    }

    // ── drawing parameters ───────────────────────────────────────────────

    #[inline]
    pub fn set_fill_rule(&mut self, rule: FillRule) {
        self.state.fill_rule = rule;
    }

    #[inline]
    pub fn fill_rule(&self) -> FillRule {
        self.state.fill_rule
    }

    #[inline]
    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.state.blend_mode = mode;
    }

    #[inline]
    pub fn blend_mode(&self) -> BlendMode {
        self.state.blend_mode
    }

    #[inline]
    pub fn set_image_mode(&mut self, mode: ImageMode) {
        self.state.image_mode = mode;
    }

    #[inline]
    pub fn image_mode(&self) -> ImageMode {
        self.state.image_mode
    }

    /// Sets the resampling quality used by draw-image; exactly one quality
    /// bit must be set.
    pub fn set_image_quality(&mut self, quality: ImageQuality) {
        let single = [ImageQuality::NONANTIALIASED, ImageQuality::FASTER, ImageQuality::BETTER].contains(&quality);
        if !single {
            self.errors.record(VgError::IllegalArgument);
            return;
        }
        self.state.image_quality = quality;
    }

    #[inline]
    pub fn image_quality(&self) -> ImageQuality {
        self.state.image_quality
    }

    #[inline]
    pub fn set_rendering_quality(&mut self, quality: RenderingQuality) {
        self.state.rendering_quality = quality;
    }

    #[inline]
    pub fn rendering_quality(&self) -> RenderingQuality {
        self.state.rendering_quality
    }

    // ── stroke parameters ────────────────────────────────────────────────

    /// Negative or non-finite widths are rejected; zero disables stroking.
    pub fn set_stroke_width(&mut self, width: f32) {
        if !width.is_finite() || width < 0.0 {
            self.errors.record(VgError::IllegalArgument);
            return;
        }
        self.state.stroke.width = width;
    }

    #[inline]
    pub fn set_stroke_cap(&mut self, cap: CapStyle) {
        self.state.stroke.cap = cap;
    }

    #[inline]
    pub fn set_stroke_join(&mut self, join: JoinStyle) {
        self.state.stroke.join = join;
    }

    pub fn set_miter_limit(&mut self, limit: f32) {
        if !limit.is_finite() || limit < 1.0 {
            self.errors.record(VgError::IllegalArgument);
            return;
        }
        self.state.stroke.miter_limit = limit;
    }

    /// Replaces the dash entries; an empty slice disables dashing.
    pub fn set_dash_pattern(&mut self, dash: &[f32]) {
        if dash.iter().any(|d| !d.is_finite()) {
            self.errors.record(VgError::IllegalArgument);
            return;
        }
        self.state.stroke.dash = dash.to_vec();
    }

    pub fn set_dash_phase(&mut self, phase: f32) {
        if !phase.is_finite() {
            self.errors.record(VgError::IllegalArgument);
            return;
        }
        self.state.stroke.dash_phase = phase;
    }

    #[inline]
    pub fn set_dash_phase_reset(&mut self, reset: bool) {
        self.state.stroke.dash_phase_reset = reset;
    }

    #[inline]
    pub fn stroke_style(&self) -> &StrokeStyle {
        &self.state.stroke
    }

    // ── scissoring ───────────────────────────────────────────────────────

    #[inline]
    pub fn set_scissoring(&mut self, enabled: bool) {
        self.state.scissoring = enabled;
    }

    #[inline]
    pub fn scissoring(&self) -> bool {
        self.state.scissoring
    }

    /// Replaces the scissor rect list (surface space). Rects past
    /// [`MAX_SCISSOR_RECTS`] are dropped.
    pub fn set_scissor_rects(&mut self, rects: &[Rect]) {
        if rects.iter().any(|r| !r.is_finite()) {
            self.errors.record(VgError::IllegalArgument);
            return;
        }
        if rects.len() > MAX_SCISSOR_RECTS {
            log::warn!("{} scissor rects given, keeping {MAX_SCISSOR_RECTS}", rects.len());
        }
        self.state.scissor_rects = rects.iter().take(MAX_SCISSOR_RECTS).copied().collect();
    }

    #[inline]
    pub fn scissor_rects(&self) -> &[Rect] {
        &self.state.scissor_rects
    }

    // ── colors and filter state ──────────────────────────────────────────

    pub fn set_tile_fill_color(&mut self, color: Color) {
        if let Some(c) = self.checked_color(color) {
            self.state.tile_fill_color = c;
        }
    }

    #[inline]
    pub fn tile_fill_color(&self) -> Color {
        self.state.tile_fill_color
    }

    pub fn set_clear_color(&mut self, color: Color) {
        if let Some(c) = self.checked_color(color) {
            self.state.clear_color = c;
        }
    }

    #[inline]
    pub fn clear_color(&self) -> Color {
        self.state.clear_color
    }

    #[inline]
    pub fn set_filter_channel_mask(&mut self, mask: ChannelMask) {
        self.state.filter_channel_mask = mask;
    }

    #[inline]
    pub fn filter_channel_mask(&self) -> ChannelMask {
        self.state.filter_channel_mask
    }

    /// Clamps a finite color into [0, 1]; non-finite input is rejected.
    pub(super) fn checked_color(&mut self, color: Color) -> Option<Color> {
        if !color.is_finite() {
            self.errors.record(VgError::IllegalArgument);
            return None;
        }
        Some(color.clamped())
    }

    // ── renderer hooks ───────────────────────────────────────────────────

    /// Number of draws planned since the last render.
    #[inline]
    pub fn queued_draws(&self) -> usize {
        self.plans.len()
    }

    #[inline]
    pub fn queued_plans(&self) -> &[DrawPlan] {
        &self.plans
    }

    pub(crate) fn take_plans(&mut self) -> Vec<DrawPlan> {
        std::mem::take(&mut self.plans)
    }

    /// Frees resources destroyed while plans still referenced them.
    pub(crate) fn release_retired(&mut self) {
        if !self.retired_paints.is_empty() || !self.retired_images.is_empty() {
            log::debug!(
                "releasing {} retired paints, {} retired images",
                self.retired_paints.len(),
                self.retired_images.len()
            );
        }
        self.retired_paints.clear();
        self.retired_images.clear();
    }

    pub(crate) fn paint_resource(&self, h: PaintHandle) -> Option<&Paint> {
        self.paints
            .get(h)
            .or_else(|| self.retired_paints.iter().find(|(rh, _)| *rh == h).map(|(_, p)| p))
    }

    pub(crate) fn paint_resource_mut(&mut self, h: PaintHandle) -> Option<&mut Paint> {
        match self.paints.get_mut(h) {
            Some(p) => Some(p),
            None => self.retired_paints.iter_mut().find(|(rh, _)| *rh == h).map(|(_, p)| p),
        }
    }

    pub(crate) fn image_resource(&self, h: ImageHandle) -> Option<&Image> {
        self.images
            .get(h)
            .or_else(|| self.retired_images.iter().find(|(rh, _)| *rh == h).map(|(_, i)| i))
    }

    pub(crate) fn image_resource_mut(&mut self, h: ImageHandle) -> Option<&mut Image> {
        match self.images.get_mut(h) {
            Some(i) => Some(i),
            None => self.retired_images.iter_mut().find(|(rh, _)| *rh == h).map(|(_, i)| i),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(ContextConfig::default())
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        log::debug!(
            "context dropped: {} paths, {} paints, {} images, {} queued draws",
            self.paths.len(),
            self.paints.len(),
            self.images.len(),
            self.plans.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> Context {
        Context::new(ContextConfig { surface_width: 100, surface_height: 80, ..Default::default() })
    }

    // ── errors ───────────────────────────────────────────────────────────

    #[test]
    fn first_error_wins_until_taken() {
        let mut c = ctx();
        c.resize(0, 10);
        c.set_image_quality(ImageQuality::ALL);
        assert_eq!(c.peek_error(), Some(VgError::IllegalArgument));
        assert_eq!(c.take_error(), Some(VgError::IllegalArgument));
        assert_eq!(c.take_error(), None);
    }

    #[test]
    fn resize_updates_viewport() {
        let mut c = ctx();
        c.resize(320, 200);
        assert_eq!(c.viewport(), Viewport::new(320.0, 200.0));
        assert_eq!(c.config().surface_width, 320);
        c.resize(0, 0);
        assert_eq!(c.viewport(), Viewport::new(320.0, 200.0));
    }

    // ── matrices ─────────────────────────────────────────────────────────

    #[test]
    fn load_forces_affine_outside_image_mode() {
        let mut c = ctx();
        let projective = [1.0, 0.0, 0.5, 0.0, 1.0, 0.5, 3.0, 4.0, 2.0];
        c.load_matrix(&projective);
        assert_eq!(c.get_matrix(), [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 3.0, 4.0, 1.0]);

        c.set_matrix_mode(MatrixMode::ImageUserToSurface);
        c.load_matrix(&projective);
        assert_eq!(c.get_matrix(), projective);
    }

    #[test]
    fn non_finite_matrix_is_rejected() {
        let mut c = ctx();
        c.translate(1.0, 2.0);
        let before = c.get_matrix();
        c.load_matrix(&[f32::NAN, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
        assert_eq!(c.take_error(), Some(VgError::IllegalArgument));
        assert_eq!(c.get_matrix(), before);
    }

    #[test]
    fn mult_right_multiplies() {
        let mut c = ctx();
        c.translate(10.0, 0.0);
        c.mult_matrix(&[2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 1.0]);
        // translate · scale: scale applies first.
        assert_eq!(c.get_matrix(), [2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 10.0, 0.0, 1.0]);
    }

    #[test]
    fn operations_target_selected_matrix() {
        let mut c = ctx();
        c.set_matrix_mode(MatrixMode::FillPaintToUser);
        c.scale(3.0, 3.0);
        c.set_matrix_mode(MatrixMode::PathUserToSurface);
        assert_eq!(c.get_matrix(), Matrix::identity().to_column_major());
        c.set_matrix_mode(MatrixMode::FillPaintToUser);
        assert_eq!(c.get_matrix()[0], 3.0);
        c.load_identity();
        assert_eq!(c.get_matrix(), Matrix::identity().to_column_major());
    }

    // ── parameters ───────────────────────────────────────────────────────

    #[test]
    fn image_quality_needs_a_single_bit() {
        let mut c = ctx();
        c.set_image_quality(ImageQuality::BETTER);
        assert_eq!(c.image_quality(), ImageQuality::BETTER);
        c.set_image_quality(ImageQuality::FASTER | ImageQuality::BETTER);
        assert_eq!(c.take_error(), Some(VgError::IllegalArgument));
        assert_eq!(c.image_quality(), ImageQuality::BETTER);
    }

    #[test]
    fn defaults_and_plain_setters() {
        let mut c = ctx();
        assert_eq!(c.fill_rule(), FillRule::EvenOdd);
        assert_eq!(c.blend_mode(), BlendMode::SrcOver);
        assert_eq!(c.rendering_quality(), RenderingQuality::Better);

        c.set_blend_mode(BlendMode::Screen);
        c.set_rendering_quality(RenderingQuality::NonAntialiased);
        c.set_stroke_join(JoinStyle::Bevel);
        c.set_dash_phase_reset(true);
        assert_eq!(c.blend_mode(), BlendMode::Screen);
        assert_eq!(c.rendering_quality(), RenderingQuality::NonAntialiased);
        assert_eq!(c.stroke_style().join, JoinStyle::Bevel);
        assert!(c.stroke_style().dash_phase_reset);
        assert_eq!(c.take_error(), None);
    }

    #[test]
    fn stroke_parameter_validation() {
        let mut c = ctx();
        c.set_stroke_width(3.0);
        c.set_stroke_width(-1.0);
        assert_eq!(c.take_error(), Some(VgError::IllegalArgument));
        c.set_miter_limit(0.5);
        assert_eq!(c.take_error(), Some(VgError::IllegalArgument));
        c.set_dash_pattern(&[4.0, 2.0]);
        c.set_dash_phase(1.0);
        c.set_stroke_cap(CapStyle::Round);
        let s = c.stroke_style();
        assert_eq!(s.width, 3.0);
        assert_eq!(s.miter_limit, 4.0);
        assert_eq!(s.dash, vec![4.0, 2.0]);
        assert_eq!(s.dash_phase, 1.0);
        assert_eq!(s.cap, CapStyle::Round);
    }

    #[test]
    fn scissor_rects_are_capped() {
        let mut c = ctx();
        let rects = vec![Rect::new(0.0, 0.0, 1.0, 1.0); MAX_SCISSOR_RECTS + 5];
        c.set_scissor_rects(&rects);
        assert_eq!(c.scissor_rects().len(), MAX_SCISSOR_RECTS);
        assert_eq!(c.take_error(), None);
    }

    #[test]
    fn colors_are_clamped() {
        let mut c = ctx();
        c.set_clear_color(Color::new(2.0, -1.0, 0.5, 1.0));
        assert_eq!(c.clear_color(), Color::new(1.0, 0.0, 0.5, 1.0));
        c.set_tile_fill_color(Color::new(f32::INFINITY, 0.0, 0.0, 1.0));
        assert_eq!(c.take_error(), Some(VgError::IllegalArgument));
        assert_eq!(c.tile_fill_color(), Color::transparent());
    }
}
