//! Paint meshes: how a paint is spread over the area it covers.
//!
//! Every paint resolves to a [`PaintShading`]: a fragment mode, a base color,
//! an optional texture and an affine texture-coordinate map evaluated at
//! user-space positions. Cover quads and hairlines both read texture
//! coordinates from the same map.

use crate::context::{GradientMapping, ImageHandle, PaintHandle};
use crate::coords::{Matrix, Rect, Vec2};
use crate::image::{Image, TilingMode};
use crate::paint::{Color, LinearGradient, Paint, PaintType, SpreadMode};

use super::plan::PathVertex;

/// Fragment evaluation mode, uploaded as a float in the draw uniform.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum ShaderMode {
    #[default]
    Solid,
    /// `color · texture(uv)`.
    Texture,
    /// `color · ramp(|uv - center| / radius)`.
    Radial,
}

impl ShaderMode {
    #[inline]
    pub fn code(self) -> f32 {
        match self {
            ShaderMode::Solid => 0.0,
            ShaderMode::Texture => 1.0,
            ShaderMode::Radial => 2.0,
        }
    }
}

/// Texture a pass samples from, resolved against the context at render time.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum TextureRef {
    #[default]
    None,
    /// The color ramp of a paint.
    Ramp(PaintHandle),
    /// The pixels of an image (draw-image source or pattern).
    Image(ImageHandle),
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum Wrap {
    #[default]
    Clamp,
    Repeat,
    Mirror,
}

impl Wrap {
    pub fn from_spread(spread: SpreadMode) -> Self {
        match spread {
            SpreadMode::Pad => Wrap::Clamp,
            SpreadMode::Repeat => Wrap::Repeat,
            SpreadMode::Reflect => Wrap::Mirror,
        }
    }

    /// Fill tiling clamps; the shader swaps in the tile fill color outside the tile.
    pub fn from_tiling(tiling: TilingMode) -> Self {
        match tiling {
            TilingMode::Fill | TilingMode::Pad => Wrap::Clamp,
            TilingMode::Repeat => Wrap::Repeat,
            TilingMode::Reflect => Wrap::Mirror,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct SamplerKey {
    pub wrap: Wrap,
    pub linear: bool,
}

/// Gradient axis orientation picked from the quantized axis endpoints.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Quadrant {
    Right,
    Left,
    Down,
    Up,
}

impl Quadrant {
    fn of(g: LinearGradient) -> Self {
        let q = |v: f32| if v > 0.0 { 1.0 } else { v };
        let (x1, y1, x2, y2) = (q(g.start.x), q(g.start.y), q(g.end.x), q(g.end.y));
        if x1 == 0.0 && x2 == 1.0 {
            Quadrant::Right
        } else if x1 == 1.0 && x2 == 0.0 {
            Quadrant::Left
        } else if y1 == 1.0 && y2 == 0.0 {
            Quadrant::Down
        } else {
            Quadrant::Up
        }
    }
}

#[derive(Debug, Copy, Clone)]
enum UvMap {
    Zero,
    Constant([f32; 2]),
    /// Ramp runs across the bounds box along one axis.
    Box { origin: Vec2, size: Vec2, quadrant: Quadrant },
    /// `u` is the projection onto the gradient axis in paint space;
    /// `axis` is pre-divided by its squared length.
    Projected { inverse: Matrix, start: Vec2, axis: Vec2 },
    /// Raw paint-space position.
    PaintSpace { inverse: Matrix },
    /// Pattern tiles over the bounds box, `scale` repeats per side.
    Pattern { origin: Vec2, size: Vec2, scale: f32 },
}

/// Resolved paint for one draw.
#[derive(Debug, Copy, Clone)]
pub struct PaintShading {
    pub mode: ShaderMode,
    pub color: Color,
    /// `[cx, cy, r, 0]` for radial gradients.
    pub radial: [f32; 4],
    pub texture: TextureRef,
    pub sampler: SamplerKey,
    pub opaque: bool,
    /// Color outside `[0, 1]` texture coordinates, for fill-tiled patterns.
    pub tile_fill: Option<Color>,
    uv: UvMap,
}

impl PaintShading {
    /// Flat color, no texture.
    pub fn solid(color: Color) -> Self {
        Self {
            mode: ShaderMode::Solid,
            color,
            radial: [0.0; 4],
            texture: TextureRef::None,
            sampler: SamplerKey::default(),
            opaque: color.a >= 1.0,
            tile_fill: None,
            uv: UvMap::Zero,
        }
    }

    /// Image texture stretched over `(0,0)-(w,h)`.
    pub fn image(handle: ImageHandle, width: f32, height: f32, tint: Color, linear: bool) -> Self {
        Self {
            mode: ShaderMode::Texture,
            color: tint,
            radial: [0.0; 4],
            texture: TextureRef::Image(handle),
            sampler: SamplerKey { wrap: Wrap::Clamp, linear },
            opaque: false,
            tile_fill: None,
            uv: UvMap::Pattern { origin: Vec2::zero(), size: Vec2::new(width, height), scale: 1.0 },
        }
    }

    /// Texture coordinate at user-space point `p`.
    pub fn uv(&self, p: Vec2) -> [f32; 2] {
        let frac = |origin: Vec2, size: Vec2| {
            let f = |v: f32, o: f32, s: f32| if s != 0.0 { (v - o) / s } else { 0.0 };
            (f(p.x, origin.x, size.x), f(p.y, origin.y, size.y))
        };
        match self.uv {
            UvMap::Zero => [0.0, 0.0],
            UvMap::Constant(uv) => uv,
            UvMap::Box { origin, size, quadrant } => {
                let (fx, fy) = frac(origin, size);
                let u = match quadrant {
                    Quadrant::Right => fx,
                    Quadrant::Left => 1.0 - fx,
                    Quadrant::Down => 1.0 - fy,
                    Quadrant::Up => fy,
                };
                [u, 0.5]
            }
            UvMap::Projected { inverse, start, axis } => {
                let q = inverse.transform_point(p);
                [(q - start).dot(axis), 0.5]
            }
            UvMap::PaintSpace { inverse } => {
                let q = inverse.transform_point(p);
                [q.x, q.y]
            }
            UvMap::Pattern { origin, size, scale } => {
                let (fx, fy) = frac(origin, size);
                [fx * scale, fy * scale]
            }
        }
    }

    #[inline]
    pub fn vertex(&self, p: Vec2) -> PathVertex {
        PathVertex::new(p, self.uv(p))
    }

    /// Two triangles covering `rect`.
    pub fn quad(&self, rect: Rect) -> [PathVertex; 6] {
        let [c0, c1, c2, c3] = rect.corners();
        [c0, c1, c2, c0, c2, c3].map(|p| self.vertex(p))
    }
}

/// Resolves `paint` over `bounds` (user space).
///
/// `paint_matrix` maps paint space to user space. `pattern` is the paint's
/// pattern image, already looked up; a pattern paint without one shades with
/// its flat color. `tile_fill` shows outside the tile of a fill-tiled pattern.
pub fn shade(
    paint: &Paint,
    handle: Option<PaintHandle>,
    pattern: Option<(ImageHandle, &Image)>,
    paint_matrix: &Matrix,
    bounds: Rect,
    mapping: GradientMapping,
    tile_fill: Color,
) -> PaintShading {
    let ramp_sampler = SamplerKey { wrap: Wrap::from_spread(paint.spread_mode()), linear: true };
    let ramp = |uv: UvMap, mode: ShaderMode, radial: [f32; 4]| match handle {
        Some(h) => PaintShading {
            mode,
            color: Color::white(),
            radial,
            texture: TextureRef::Ramp(h),
            sampler: ramp_sampler,
            opaque: paint.is_opaque(),
            tile_fill: None,
            uv,
        },
        None => PaintShading::solid(paint.color()),
    };
    // A singular paint matrix collapses paint space; sample the ramp's end.
    let inverse = paint_matrix.inverse();
    let last_stop = || {
        let width = paint.ramp().width().max(1) as f32;
        UvMap::Constant([1.0 - 0.5 / width, 0.5])
    };

    match paint.paint_type() {
        PaintType::Color => PaintShading::solid(paint.color()),

        PaintType::LinearGradient => {
            let g = paint.linear_gradient();
            let uv = match (mapping, inverse) {
                (GradientMapping::Quadrant, _) => {
                    UvMap::Box { origin: bounds.min(), size: bounds.size, quadrant: Quadrant::of(g) }
                }
                (GradientMapping::Projected, Some(inverse)) => {
                    let d = g.end - g.start;
                    let len2 = d.dot(d);
                    if len2 > 0.0 {
                        UvMap::Projected { inverse, start: g.start, axis: d / len2 }
                    } else {
                        last_stop()
                    }
                }
                (GradientMapping::Projected, None) => last_stop(),
            };
            ramp(uv, ShaderMode::Texture, [0.0; 4])
        }

        PaintType::RadialGradient => {
            let g = paint.radial_gradient();
            match inverse {
                Some(inverse) if g.radius > 0.0 => ramp(
                    UvMap::PaintSpace { inverse },
                    ShaderMode::Radial,
                    [g.center.x, g.center.y, g.radius, 0.0],
                ),
                _ => ramp(last_stop(), ShaderMode::Texture, [0.0; 4]),
            }
        }

        PaintType::Pattern => {
            let Some((image_handle, _)) = pattern else {
                return PaintShading::solid(paint.color());
            };
            let g = paint.granularity();
            let scale = if g > 0.0 { 1.0 / g } else { 1.0 };
            let tiling = paint.tiling_mode();
            PaintShading {
                mode: ShaderMode::Texture,
                color: Color::white(),
                radial: [0.0; 4],
                texture: TextureRef::Image(image_handle),
                sampler: SamplerKey { wrap: Wrap::from_tiling(tiling), linear: true },
                opaque: false,
                tile_fill: (tiling == TilingMode::Fill).then_some(tile_fill),
                uv: UvMap::Pattern { origin: bounds.min(), size: bounds.size, scale },
            }
        }
    }
}
