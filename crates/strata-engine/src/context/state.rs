use crate::coords::{Matrix, Rect};
use crate::image::{ChannelMask, ImageQuality};
use crate::paint::Color;
use crate::render::BlendMode;
use crate::stroke::StrokeStyle;

use super::PaintHandle;

/// Scissor rectangles beyond this count are ignored.
pub const MAX_SCISSOR_RECTS: usize = 32;

/// Which matrix the matrix operations act on.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum MatrixMode {
    #[default]
    PathUserToSurface,
    ImageUserToSurface,
    FillPaintToUser,
    StrokePaintToUser,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum FillRule {
    #[default]
    EvenOdd,
    NonZero,
}

/// How draw-image combines the image with the fill paint.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum ImageMode {
    #[default]
    Normal,
    Multiply,
    Stencil,
}

/// Requested rendering quality. Stored and reported; coverage is always
/// resolved at one sample per pixel.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum RenderingQuality {
    NonAntialiased,
    Faster,
    #[default]
    Better,
}

/// Paint slots a draw or bind applies to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PaintModes(u32);

impl PaintModes {
    pub const STROKE: Self = Self(1 << 0);
    pub const FILL: Self = Self(1 << 1);
    pub const BOTH: Self = Self(0b11);

    #[inline]
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::BOTH.0)
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for PaintModes {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Mutable drawing state of a context.
#[derive(Debug, Clone)]
pub(crate) struct State {
    pub matrix_mode: MatrixMode,
    pub path_matrix: Matrix,
    pub image_matrix: Matrix,
    pub fill_paint_matrix: Matrix,
    pub stroke_paint_matrix: Matrix,

    pub fill_rule: FillRule,
    pub blend_mode: BlendMode,
    pub image_mode: ImageMode,
    pub image_quality: ImageQuality,
    pub rendering_quality: RenderingQuality,

    pub stroke: StrokeStyle,
    pub fill_paint: Option<PaintHandle>,
    pub stroke_paint: Option<PaintHandle>,

    pub scissoring: bool,
    pub scissor_rects: Vec<Rect>,

    pub tile_fill_color: Color,
    pub clear_color: Color,
    pub filter_channel_mask: ChannelMask,
}

impl Default for State {
    fn default() -> Self {
        Self {
            matrix_mode: MatrixMode::default(),
            path_matrix: Matrix::identity(),
            image_matrix: Matrix::identity(),
            fill_paint_matrix: Matrix::identity(),
            stroke_paint_matrix: Matrix::identity(),
            fill_rule: FillRule::default(),
            blend_mode: BlendMode::default(),
            image_mode: ImageMode::default(),
            image_quality: ImageQuality::FASTER,
            rendering_quality: RenderingQuality::default(),
            stroke: StrokeStyle::default(),
            fill_paint: None,
            stroke_paint: None,
            scissoring: false,
            scissor_rects: Vec::new(),
            tile_fill_color: Color::transparent(),
            clear_color: Color::transparent(),
            filter_channel_mask: ChannelMask::ALL,
        }
    }
}

impl State {
    /// The matrix selected by the current matrix mode.
    pub fn current_matrix(&self) -> &Matrix {
        match self.matrix_mode {
            MatrixMode::PathUserToSurface => &self.path_matrix,
            MatrixMode::ImageUserToSurface => &self.image_matrix,
            MatrixMode::FillPaintToUser => &self.fill_paint_matrix,
            MatrixMode::StrokePaintToUser => &self.stroke_paint_matrix,
        }
    }

    pub fn current_matrix_mut(&mut self) -> &mut Matrix {
        match self.matrix_mode {
            MatrixMode::PathUserToSurface => &mut self.path_matrix,
            MatrixMode::ImageUserToSurface => &mut self.image_matrix,
            MatrixMode::FillPaintToUser => &mut self.fill_paint_matrix,
            MatrixMode::StrokePaintToUser => &mut self.stroke_paint_matrix,
        }
    }

    /// Only the image matrix may carry a projective last row.
    #[inline]
    pub fn current_is_affine_only(&self) -> bool {
        self.matrix_mode != MatrixMode::ImageUserToSurface
    }
}
