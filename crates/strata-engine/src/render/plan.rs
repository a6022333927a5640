//! Draw planning: turns one draw call into GPU-ready vertices and passes.
//!
//! Planning is pure CPU work. Paths are drawn with the two-pass coverage
//! contract: a stencil pass marks covered pixels with color writes off, a
//! cover pass paints the bounds quad where the stencil says "inside" (and
//! zeroes it), and a final pass clears the stencil under the bounds quad.

use std::ops::Range;

use bytemuck::{Pod, Zeroable};

use crate::context::{FillRule, ImageHandle, ImageMode};
use crate::coords::{Matrix, Rect, Vec2, Viewport};
use crate::image::Image;
use crate::paint::{Color, PaintType};
use crate::path::Tessellation;

use super::blend::BlendMode;
use super::mesh::{PaintShading, SamplerKey, ShaderMode, TextureRef};

/// Strokes at or below this width are drawn as hairlines.
pub const HAIRLINE_WIDTH: f32 = 0.1;

/// Extra user-space margin around cover quads.
const COVER_PADDING: f32 = 1.0;

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct PathVertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
}

impl PathVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2, // pos (user space)
        1 => Float32x2  // uv
    ];

    #[inline]
    pub fn new(p: Vec2, uv: [f32; 2]) -> Self {
        Self { pos: [p.x, p.y], uv }
    }

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PathVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Per-pass uniform block. Every member is a `vec4` so the WGSL layout
/// matches without padding rules.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct DrawUniform {
    /// `[surface width, surface height, shader mode, alpha scale]`
    pub viewport_mode: [f32; 4],
    /// User-to-surface matrix columns.
    pub transform: [[f32; 4]; 3],
    pub color: [f32; 4],
    /// `[cx, cy, r, fill]`; `fill` is 1 when `tile_fill` replaces samples
    /// outside the unit tile.
    pub radial: [f32; 4],
    pub tile_fill: [f32; 4],
}

/// Stencil behavior of a pass.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum StencilMode {
    /// Stencil untouched and ignored.
    #[default]
    None,
    /// `Always`, invert bit 0 (even-odd parity).
    FillEvenOdd,
    /// `Always`, increment on front faces and decrement on back faces.
    FillNonZero,
    /// `NotEqual 1`, increment-clamp: each pixel counted once.
    Stroke,
    /// Paint where stencil is 1, then zero it.
    CoverEqualOne,
    /// Paint where stencil is non-zero, then zero it.
    CoverNonZero,
    /// Zero the stencil.
    Clear,
}

impl StencilMode {
    /// Reference value the pass runs with.
    pub fn reference(self) -> u32 {
        match self {
            StencilMode::Stroke | StencilMode::CoverEqualOne => 1,
            _ => 0,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum Topology {
    #[default]
    Triangles,
    Lines,
}

/// Color output of a pass: blend mode plus whether the source is known opaque.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ColorOutput {
    pub blend: BlendMode,
    pub opaque: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawPass {
    pub stencil: StencilMode,
    /// `None` disables color writes.
    pub color: Option<ColorOutput>,
    pub topology: Topology,
    pub vertices: Range<u32>,
    pub uniform: DrawUniform,
    pub texture: TextureRef,
    pub sampler: SamplerKey,
}

/// Scissor box in framebuffer pixels (top-left origin).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ScissorBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ScissorBox {
    /// Converts a surface-space rect (bottom-left origin) into a box clamped
    /// to the surface, or `None` when nothing of it is visible.
    pub fn from_surface_rect(rect: Rect, viewport: Viewport) -> Option<Self> {
        let (w, h) = viewport.extent();
        let r = rect.normalized();
        if !r.is_finite() {
            return None;
        }
        let clamp = |v: f32, hi: u32| v.clamp(0.0, hi as f32) as u32;
        let x0 = clamp(r.min().x.floor(), w);
        let x1 = clamp(r.max().x.ceil(), w);
        let y0 = clamp(r.min().y.floor(), h);
        let y1 = clamp(r.max().y.ceil(), h);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Self { x: x0, y: h - y1, width: x1 - x0, height: y1 - y0 })
    }
}

/// Context state a plan is built against.
#[derive(Debug, Copy, Clone)]
pub struct PlanEnv {
    pub viewport: Viewport,
    pub blend: BlendMode,
    pub scissor: Option<ScissorBox>,
}

/// GPU work for one draw call, executed in order by the renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawPlan {
    pub vertices: Vec<PathVertex>,
    pub passes: Vec<DrawPass>,
    pub scissor: Option<ScissorBox>,
}

impl DrawPlan {
    fn new(env: &PlanEnv) -> Self {
        Self { vertices: Vec::new(), passes: Vec::new(), scissor: env.scissor }
    }

    fn push(&mut self, vertices: impl IntoIterator<Item = PathVertex>) -> Range<u32> {
        let start = self.vertices.len() as u32;
        self.vertices.extend(vertices);
        start..self.vertices.len() as u32
    }

    fn into_option(self) -> Option<Self> {
        (!self.passes.is_empty()).then_some(self)
    }

    /// Fills the contours of `tess` under `rule`.
    pub fn fill(
        env: &PlanEnv,
        transform: &Matrix,
        tess: &Tessellation,
        rule: FillRule,
        shading: &PaintShading,
    ) -> Option<Self> {
        let mut plan = Self::new(env);
        let fans = plan.push(fan_triangles(tess).map(|p| PathVertex::new(p, [0.0; 2])));
        if fans.is_empty() {
            return None;
        }
        let (mark, cover) = match rule {
            FillRule::EvenOdd => (StencilMode::FillEvenOdd, StencilMode::CoverEqualOne),
            FillRule::NonZero => (StencilMode::FillNonZero, StencilMode::CoverNonZero),
        };
        plan.coverage(env, transform, fans, mark, cover, tess.bounds(), shading);
        plan.into_option()
    }

    /// Strokes with a prebuilt triangle soup (three points per triangle).
    pub fn stroke(env: &PlanEnv, transform: &Matrix, mesh: &[Vec2], shading: &PaintShading) -> Option<Self> {
        let mut plan = Self::new(env);
        let tris = plan.push(mesh.iter().map(|&p| PathVertex::new(p, [0.0; 2])));
        if tris.is_empty() {
            return None;
        }
        let bounds = Rect::bounding(mesh.iter().copied());
        plan.coverage(env, transform, tris, StencilMode::Stroke, StencilMode::CoverEqualOne, bounds, shading);
        plan.into_option()
    }

    /// Strokes `tess` as single-pixel lines, fading alpha with `width`.
    pub fn hairline(
        env: &PlanEnv,
        transform: &Matrix,
        tess: &Tessellation,
        width: f32,
        shading: &PaintShading,
    ) -> Option<Self> {
        if !(width > 0.0) {
            return None;
        }
        let alpha = (width / HAIRLINE_WIDTH).min(1.0);
        let mut plan = Self::new(env);
        let lines = plan.push(line_segments(tess).map(|p| shading.vertex(p)));
        if lines.is_empty() {
            return None;
        }
        plan.passes.push(DrawPass {
            stencil: StencilMode::None,
            color: Some(ColorOutput { blend: env.blend, opaque: shading.opaque && alpha >= 1.0 }),
            topology: Topology::Lines,
            vertices: lines,
            uniform: uniform(env, transform, shading, alpha),
            texture: shading.texture,
            sampler: shading.sampler,
        });
        plan.into_option()
    }

    /// Draws `image` over `(0,0)-(w,h)` in image-user space.
    ///
    /// `paint` is the fill paint shading used by the multiply and stencil
    /// modes, built over the image rect.
    #[allow(clippy::too_many_arguments)]
    pub fn image(
        env: &PlanEnv,
        transform: &Matrix,
        handle: ImageHandle,
        image: &Image,
        mode: ImageMode,
        paint_type: PaintType,
        paint: &PaintShading,
        linear: bool,
    ) -> Option<Self> {
        let (w, h) = (image.width() as f32, image.height() as f32);
        let rect = Rect::new(0.0, 0.0, w, h);
        let tint = match mode {
            ImageMode::Normal => Color::white(),
            ImageMode::Multiply if paint_type != PaintType::Color => {
                return Self::image_through_stencil(env, transform, rect, paint);
            }
            ImageMode::Multiply | ImageMode::Stencil => paint.color,
        };

        let shading = PaintShading::image(handle, w, h, tint, linear);
        let mut plan = Self::new(env);
        let quad = plan.push(shading.quad(rect));
        plan.passes.push(DrawPass {
            stencil: StencilMode::None,
            color: Some(ColorOutput { blend: env.blend, opaque: false }),
            topology: Topology::Triangles,
            vertices: quad,
            uniform: uniform(env, transform, &shading, 1.0),
            texture: shading.texture,
            sampler: shading.sampler,
        });
        plan.into_option()
    }

    fn image_through_stencil(env: &PlanEnv, transform: &Matrix, rect: Rect, paint: &PaintShading) -> Option<Self> {
        let mut plan = Self::new(env);
        let quad = plan.push(PaintShading::solid(Color::white()).quad(rect));
        plan.coverage(env, transform, quad, StencilMode::FillEvenOdd, StencilMode::CoverEqualOne, rect, paint);
        plan.into_option()
    }

    /// Writes `color` over a surface-space rect, ignoring blending.
    pub fn clear(env: &PlanEnv, rect: Rect, color: Color) -> Option<Self> {
        let rect = rect.normalized();
        if rect.is_empty() {
            return None;
        }
        let shading = PaintShading::solid(color);
        let mut plan = Self::new(env);
        let quad = plan.push(shading.quad(rect));
        plan.passes.push(DrawPass {
            stencil: StencilMode::None,
            color: Some(ColorOutput { blend: BlendMode::Src, opaque: true }),
            topology: Topology::Triangles,
            vertices: quad,
            uniform: uniform(env, &Matrix::identity(), &shading, 1.0),
            texture: TextureRef::None,
            sampler: SamplerKey::default(),
        });
        plan.into_option()
    }

    /// Stencil mark, paint cover, stencil clear.
    #[allow(clippy::too_many_arguments)]
    fn coverage(
        &mut self,
        env: &PlanEnv,
        transform: &Matrix,
        marks: Range<u32>,
        mark: StencilMode,
        cover: StencilMode,
        bounds: Rect,
        shading: &PaintShading,
    ) {
        let plain = PaintShading::solid(Color::white());
        let quad = self.push(shading.quad(bounds.inflate(COVER_PADDING)));

        self.passes.push(DrawPass {
            stencil: mark,
            color: None,
            topology: Topology::Triangles,
            vertices: marks,
            uniform: uniform(env, transform, &plain, 1.0),
            texture: TextureRef::None,
            sampler: SamplerKey::default(),
        });
        self.passes.push(DrawPass {
            stencil: cover,
            color: Some(ColorOutput { blend: env.blend, opaque: shading.opaque }),
            topology: Topology::Triangles,
            vertices: quad.clone(),
            uniform: uniform(env, transform, shading, 1.0),
            texture: shading.texture,
            sampler: shading.sampler,
        });
        self.passes.push(DrawPass {
            stencil: StencilMode::Clear,
            color: None,
            topology: Topology::Triangles,
            vertices: quad,
            uniform: uniform(env, transform, &plain, 1.0),
            texture: TextureRef::None,
            sampler: SamplerKey::default(),
        });
    }

    /// Texture sources sampled by any pass.
    pub fn textures(&self) -> impl Iterator<Item = TextureRef> + '_ {
        self.passes.iter().map(|p| p.texture).filter(|t| *t != TextureRef::None)
    }
}

fn uniform(env: &PlanEnv, transform: &Matrix, shading: &PaintShading, alpha_scale: f32) -> DrawUniform {
    let mode = match shading.texture {
        TextureRef::None => ShaderMode::Solid,
        _ => shading.mode,
    };
    let fill_flag = if mode == ShaderMode::Texture && shading.tile_fill.is_some() { 1.0 } else { 0.0 };
    DrawUniform {
        viewport_mode: [env.viewport.width.max(1.0), env.viewport.height.max(1.0), mode.code(), alpha_scale],
        transform: transform.to_gpu_columns(),
        color: shading.color.to_array(),
        radial: [shading.radial[0], shading.radial[1], shading.radial[2], fill_flag],
        tile_fill: shading.tile_fill.unwrap_or_default().to_array(),
    }
}

/// Triangle-list expansion of every contour's fan around its first vertex.
fn fan_triangles(tess: &Tessellation) -> impl Iterator<Item = Vec2> + '_ {
    tess.contours().iter().flat_map(move |c| {
        let verts = tess.contour_vertices(c);
        let pivot = verts.first().map(|v| v.point);
        verts
            .windows(2)
            .skip(1)
            .filter_map(move |w| pivot.map(|p0| [p0, w[0].point, w[1].point]))
            .flatten()
    })
}

/// Line-list expansion of every contour, closing closed ones.
fn line_segments(tess: &Tessellation) -> impl Iterator<Item = Vec2> + '_ {
    tess.contours().iter().flat_map(move |c| {
        let verts = tess.contour_vertices(c);
        let closing = match (c.closed, verts.first(), verts.last()) {
            (true, Some(first), Some(last)) if verts.len() > 2 && first.point != last.point => {
                Some([last.point, first.point])
            }
            _ => None,
        };
        verts
            .windows(2)
            .map(|w| [w[0].point, w[1].point])
            .chain(closing)
            .flatten()
    })
}
