use crate::context::VgError;
use crate::paint::Color;
use crate::render::TextureMirror;

use super::format::{FormatDesc, ImageFormat};

/// Largest accepted image edge, matching the default wgpu 2D texture limit.
pub const MAX_IMAGE_DIMENSION: i32 = 8192;

/// How samples outside an image (or a filter's source region) are produced.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum TilingMode {
    /// The context's tile fill color.
    #[default]
    Fill,
    /// The nearest edge pixel.
    Pad,
    Repeat,
    Reflect,
}

/// Allowed resampling qualities, as a bitset.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ImageQuality(u32);

impl ImageQuality {
    pub const NONANTIALIASED: Self = Self(1 << 0);
    pub const FASTER: Self = Self(1 << 1);
    pub const BETTER: Self = Self(1 << 2);
    pub const ALL: Self = Self(0b111);

    /// `None` when unknown bits are set.
    #[inline]
    pub const fn from_bits(bits: u32) -> Option<Self> {
        if bits & !Self::ALL.0 != 0 { None } else { Some(Self(bits)) }
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for ImageQuality {
    fn default() -> Self {
        Self::ALL
    }
}

impl std::ops::BitOr for ImageQuality {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Borrowed pixel buffer with its layout.
#[derive(Copy, Clone)]
pub(crate) struct Pixels<'a> {
    pub data: &'a [u8],
    pub desc: &'a FormatDesc,
    pub stride: usize,
    pub width: i32,
    pub height: i32,
}

pub(crate) struct PixelsMut<'a> {
    pub data: &'a mut [u8],
    pub desc: &'a FormatDesc,
    pub stride: usize,
    pub width: i32,
    pub height: i32,
}

/// Copies a `width × height` block from `(sx, sy)` in `src` to `(dx, dy)` in
/// `dst`, clipped against both buffers and converting between formats.
///
/// Clipping runs in `i64`, so any `i32` rectangle is accepted.
#[allow(clippy::too_many_arguments)]
pub(crate) fn copy_pixels(
    dst: PixelsMut<'_>,
    src: Pixels<'_>,
    dx: i32,
    dy: i32,
    sx: i32,
    sy: i32,
    width: i32,
    height: i32,
) {
    let (mut dx, mut dy) = (i64::from(dx), i64::from(dy));
    let (mut sx, mut sy) = (i64::from(sx), i64::from(sy));
    let (mut width, mut height) = (i64::from(width), i64::from(height));
    let (src_w, src_h) = (i64::from(src.width), i64::from(src.height));
    let (dst_w, dst_h) = (i64::from(dst.width), i64::from(dst.height));

    if sx >= src_w || sy >= src_h || sx + width <= 0 || sy + height <= 0 {
        return;
    }
    if sx < 0 {
        dx -= sx;
        width += sx;
        sx = 0;
    }
    if sy < 0 {
        dy -= sy;
        height += sy;
        sy = 0;
    }
    width = width.min(src_w - sx);
    height = height.min(src_h - sy);

    if dx >= dst_w || dy >= dst_h || dx + width <= 0 || dy + height <= 0 {
        return;
    }
    if dx < 0 {
        sx -= dx;
        width += dx;
        dx = 0;
    }
    if dy < 0 {
        sy -= dy;
        height += dy;
        dy = 0;
    }
    width = width.min(dst_w - dx);
    height = height.min(dst_h - dy);
    if width <= 0 || height <= 0 {
        return;
    }

    let (sb, db) = (src.desc.bytes, dst.desc.bytes);
    let (w, h) = (width as usize, height as usize);
    for row in 0..h {
        let s_off = (sy as usize + row) * src.stride + sx as usize * sb;
        let d_off = (dy as usize + row) * dst.stride + dx as usize * db;
        if src.desc.format == dst.desc.format {
            dst.data[d_off..d_off + w * db].copy_from_slice(&src.data[s_off..s_off + w * sb]);
            continue;
        }
        for col in 0..w {
            let word = src.desc.load(&src.data[s_off + col * sb..]);
            let c = src.desc.unpack(word);
            dst.desc.store(&mut dst.data[d_off + col * db..], dst.desc.pack(c));
        }
    }
}

/// Bytes a caller buffer must hold for a `width × height` block at `stride`.
/// Saturates instead of overflowing; an oversized block fails the length check.
fn required_len(stride: usize, width: i32, height: i32, bytes: usize) -> usize {
    (height as usize - 1)
        .saturating_mul(stride)
        .saturating_add((width as usize).saturating_mul(bytes))
}

/// A CPU pixel buffer with a lazily synchronized GPU texture.
///
/// Every mutation ends in [`update_texture`](Self::update_texture), which
/// bumps the revision the renderer compares against its uploaded copy.
#[derive(Debug)]
pub struct Image {
    desc: FormatDesc,
    width: i32,
    height: i32,
    stride: usize,
    quality: ImageQuality,
    data: Vec<u8>,
    revision: u64,

    pub(crate) texture: TextureMirror,
}

impl Image {
    /// Allocates a zeroed image.
    ///
    /// Unsupported formats are `UnsupportedImageFormat`; sizes outside
    /// `1..=MAX_IMAGE_DIMENSION` are `IllegalArgument`.
    pub fn new(format: ImageFormat, width: i32, height: i32, quality: ImageQuality) -> Result<Self, VgError> {
        let desc = format.descriptor()?;
        if !(1..=MAX_IMAGE_DIMENSION).contains(&width) || !(1..=MAX_IMAGE_DIMENSION).contains(&height) {
            return Err(VgError::IllegalArgument);
        }
        let stride = width as usize * desc.bytes;
        let len = stride
            .checked_mul(height as usize)
            .ok_or(VgError::OutOfMemory)?;

        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|_| VgError::OutOfMemory)?;
        data.resize(len, 0);

        Ok(Self {
            desc,
            width,
            height,
            stride,
            quality,
            data,
            revision: 0,
            texture: TextureMirror::default(),
        })
    }

    #[inline]
    pub fn format(&self) -> ImageFormat {
        self.desc.format
    }

    #[inline]
    pub fn descriptor(&self) -> &FormatDesc {
        &self.desc
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn allowed_quality(&self) -> ImageQuality {
        self.quality
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Incremented by every mutation.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Pixel at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some(self.load(x as usize, y as usize))
    }

    #[inline]
    pub(crate) fn load(&self, x: usize, y: usize) -> Color {
        let off = y * self.stride + x * self.desc.bytes;
        self.desc.unpack(self.desc.load(&self.data[off..]))
    }

    #[inline]
    pub(crate) fn store(&mut self, x: usize, y: usize, c: Color) {
        let off = y * self.stride + x * self.desc.bytes;
        let word = self.desc.pack(c);
        self.desc.store(&mut self.data[off..], word);
    }

    /// Fills a rectangle (clipped to the image) with `color`.
    pub fn clear(&mut self, x: i32, y: i32, width: i32, height: i32, color: Color) -> Result<(), VgError> {
        if width <= 0 || height <= 0 {
            return Err(VgError::IllegalArgument);
        }
        let (x, y) = (i64::from(x), i64::from(y));
        let (w, h) = (i64::from(self.width), i64::from(self.height));
        let x1 = (x + i64::from(width)).min(w);
        let y1 = (y + i64::from(height)).min(h);
        if x >= w || y >= h || x1 <= 0 || y1 <= 0 {
            return Ok(());
        }
        let (x0, y0) = (x.max(0), y.max(0));

        let word = self.desc.pack(color);
        let bytes = self.desc.bytes;
        for py in y0..y1 {
            let row = py as usize * self.stride;
            for px in x0..x1 {
                let off = row + px as usize * bytes;
                self.desc.store(&mut self.data[off..], word);
            }
        }
        self.update_texture();
        Ok(())
    }

    /// Writes caller pixels in `format` into the image at `(x, y)`.
    ///
    /// `data` holds `height` rows of `stride` bytes; the block is clipped to
    /// the image.
    #[allow(clippy::too_many_arguments)]
    pub fn sub_data(
        &mut self,
        data: &[u8],
        stride: usize,
        format: ImageFormat,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> Result<(), VgError> {
        let src_desc = format.descriptor()?;
        if width <= 0 || height <= 0 {
            return Err(VgError::IllegalArgument);
        }
        if stride < width as usize * src_desc.bytes || data.len() < required_len(stride, width, height, src_desc.bytes) {
            return Err(VgError::IllegalArgument);
        }

        let src = Pixels { data, desc: &src_desc, stride, width, height };
        let dst = PixelsMut {
            data: &mut self.data,
            desc: &self.desc,
            stride: self.stride,
            width: self.width,
            height: self.height,
        };
        copy_pixels(dst, src, x, y, 0, 0, width, height);
        self.update_texture();
        Ok(())
    }

    /// Reads the block at `(x, y)` into caller memory in `format`.
    ///
    /// Only the part of the block inside the image is written.
    #[allow(clippy::too_many_arguments)]
    pub fn get_sub_data(
        &self,
        out: &mut [u8],
        stride: usize,
        format: ImageFormat,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> Result<(), VgError> {
        let dst_desc = format.descriptor()?;
        if width <= 0 || height <= 0 {
            return Err(VgError::IllegalArgument);
        }
        if stride < width as usize * dst_desc.bytes || out.len() < required_len(stride, width, height, dst_desc.bytes) {
            return Err(VgError::IllegalArgument);
        }

        let dst = PixelsMut { data: out, desc: &dst_desc, stride, width, height };
        copy_pixels(dst, self.pixels(), 0, 0, x, y, width, height);
        Ok(())
    }

    /// Copies a block from another image.
    #[allow(clippy::too_many_arguments)]
    pub fn copy_from(
        &mut self,
        dx: i32,
        dy: i32,
        src: &Image,
        sx: i32,
        sy: i32,
        width: i32,
        height: i32,
    ) -> Result<(), VgError> {
        if width <= 0 || height <= 0 {
            return Err(VgError::IllegalArgument);
        }
        let dst = PixelsMut {
            data: &mut self.data,
            desc: &self.desc,
            stride: self.stride,
            width: self.width,
            height: self.height,
        };
        copy_pixels(dst, src.pixels(), dx, dy, sx, sy, width, height);
        self.update_texture();
        Ok(())
    }

    /// Copies a block within this image; overlapping regions go through a
    /// temporary buffer.
    pub fn copy_within(&mut self, dx: i32, dy: i32, sx: i32, sy: i32, width: i32, height: i32) -> Result<(), VgError> {
        if width <= 0 || height <= 0 {
            return Err(VgError::IllegalArgument);
        }
        let snapshot = self.data.clone();
        let src = Pixels {
            data: &snapshot,
            desc: &self.desc,
            stride: self.stride,
            width: self.width,
            height: self.height,
        };
        let dst = PixelsMut {
            data: &mut self.data,
            desc: &self.desc,
            stride: self.stride,
            width: self.width,
            height: self.height,
        };
        copy_pixels(dst, src, dx, dy, sx, sy, width, height);
        self.update_texture();
        Ok(())
    }

    /// Straight-alpha RGBA8 rows for texture upload.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for y in 0..self.height as usize {
            for x in 0..self.width as usize {
                out.extend_from_slice(&self.load(x, y).to_u8());
            }
        }
        out
    }

    /// Marks the GPU copy stale.
    #[inline]
    pub(crate) fn update_texture(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Uploads the pixels if they changed since the last upload.
    pub(crate) fn sync_texture(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        if self.texture.is_current(self.revision) {
            return;
        }
        let rgba = self.to_rgba8();
        let (w, h) = (self.width as u32, self.height as u32);
        self.texture.sync(device, queue, "strata image", w, h, self.revision, move || rgba);
    }

    #[inline]
    pub(crate) fn pixels(&self) -> Pixels<'_> {
        Pixels {
            data: &self.data,
            desc: &self.desc,
            stride: self.stride,
            width: self.width,
            height: self.height,
        }
    }
}
