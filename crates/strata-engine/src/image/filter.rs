//! CPU image filters.
//!
//! Each filter reads `src` into a float buffer over the intersection of the
//! two images, computes new colors, and writes them to `dst` through the
//! destination format. Channels excluded by the [`ChannelMask`] keep the
//! source value. The caller guarantees `dst` and `src` are different images.

use crate::context::VgError;
use crate::paint::Color;

use super::{Image, TilingMode};

/// Largest accepted convolution kernel edge.
pub const MAX_KERNEL_SIZE: usize = 256;

/// Largest accepted gaussian standard deviation.
pub const MAX_GAUSSIAN_STD_DEVIATION: f32 = 16.0;

/// Channels a filter may write.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ChannelMask(u32);

impl ChannelMask {
    pub const RED: Self = Self(1 << 3);
    pub const GREEN: Self = Self(1 << 2);
    pub const BLUE: Self = Self(1 << 1);
    pub const ALPHA: Self = Self(1 << 0);
    pub const ALL: Self = Self(0b1111);

    #[inline]
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::ALL.0)
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// `computed` where this mask is set, `source` elsewhere.
    fn select(self, source: Color, computed: Color) -> Color {
        Color::new(
            if self.contains(Self::RED) { computed.r } else { source.r },
            if self.contains(Self::GREEN) { computed.g } else { source.g },
            if self.contains(Self::BLUE) { computed.b } else { source.b },
            if self.contains(Self::ALPHA) { computed.a } else { source.a },
        )
    }
}

impl Default for ChannelMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl std::ops::BitOr for ChannelMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Single source channel for [`lookup_single`].
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum ImageChannel {
    #[default]
    Red,
    Green,
    Blue,
    Alpha,
}

/// Context state shared by all filters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FilterOptions {
    pub channel_mask: ChannelMask,
    /// Color fetched outside the source under [`TilingMode::Fill`].
    pub tile_fill: Color,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self { channel_mask: ChannelMask::ALL, tile_fill: Color::transparent() }
    }
}

/// Parameters of [`convolve`].
#[derive(Debug, Copy, Clone)]
pub struct Convolution<'a> {
    /// Row-major `width × height` kernel.
    pub kernel: &'a [i16],
    pub width: usize,
    pub height: usize,
    pub shift_x: i32,
    pub shift_y: i32,
    pub scale: f32,
    pub bias: f32,
    pub tiling: TilingMode,
}

/// Parameters of [`separable_convolve`].
#[derive(Debug, Copy, Clone)]
pub struct SeparableConvolution<'a> {
    pub kernel_x: &'a [i16],
    pub kernel_y: &'a [i16],
    pub shift_x: i32,
    pub shift_y: i32,
    pub scale: f32,
    pub bias: f32,
    pub tiling: TilingMode,
}

/// Float copy of the filtered region.
struct Region {
    w: i32,
    h: i32,
    colors: Vec<Color>,
}

impl Region {
    fn read(dst: &Image, src: &Image) -> Self {
        let w = dst.width().min(src.width());
        let h = dst.height().min(src.height());
        let mut colors = Vec::with_capacity((w * h) as usize);
        for y in 0..h as usize {
            for x in 0..w as usize {
                colors.push(src.load(x, y));
            }
        }
        Self { w, h, colors }
    }

    #[inline]
    fn at(&self, x: i32, y: i32) -> Color {
        self.colors[(y * self.w + x) as usize]
    }

    /// Sample with out-of-range coordinates resolved by `tiling`.
    ///
    /// Coordinates are `i64` so kernel offsets with any `i32` shift stay exact.
    fn tiled(&self, x: i64, y: i64, tiling: TilingMode, fill: Color) -> Color {
        let (w, h) = (i64::from(self.w), i64::from(self.h));
        let (x, y) = if x >= 0 && x < w && y >= 0 && y < h {
            (x, y)
        } else {
            match tiling {
                TilingMode::Fill => return fill,
                TilingMode::Pad => (x.clamp(0, w - 1), y.clamp(0, h - 1)),
                TilingMode::Repeat => (x.rem_euclid(w), y.rem_euclid(h)),
                TilingMode::Reflect => {
                    let mut x = x.rem_euclid(w * 2);
                    let mut y = y.rem_euclid(h * 2);
                    if x >= w {
                        x = w * 2 - 1 - x;
                    }
                    if y >= h {
                        y = h * 2 - 1 - y;
                    }
                    (x, y)
                }
            }
        };
        self.at(x as i32, y as i32)
    }

    fn write(&self, dst: &mut Image, mut f: impl FnMut(i32, i32, Color) -> Color) {
        for y in 0..self.h {
            for x in 0..self.w {
                let c = f(x, y, self.at(x, y));
                dst.store(x as usize, y as usize, c.clamped());
            }
        }
        dst.update_texture();
    }
}

#[inline]
fn mul_add(sum: Color, c: Color, k: f32) -> Color {
    Color::new(sum.r + c.r * k, sum.g + c.g * k, sum.b + c.b * k, sum.a + c.a * k)
}

#[inline]
fn scale_bias(c: Color, scale: f32, bias: f32) -> Color {
    Color::new(c.r * scale + bias, c.g * scale + bias, c.b * scale + bias, c.a * scale + bias)
}

/// Float channel to an 8-bit table index.
#[inline]
fn to_index(v: f32) -> usize {
    (v * 255.0 + 0.5).floor().clamp(0.0, 255.0) as usize
}

#[inline]
fn byte(v: u32) -> f32 {
    (v & 0xFF) as f32 / 255.0
}

/// Applies a 4×5 row-major color matrix (the fifth column is a bias).
pub fn color_matrix(dst: &mut Image, src: &Image, matrix: &[f32; 20], opts: FilterOptions) {
    let mask = if src.descriptor().luminance { ChannelMask::ALL } else { opts.channel_mask };
    let m = matrix;
    let region = Region::read(dst, src);
    region.write(dst, |_, _, s| {
        let row = |i: usize| m[i] * s.r + m[i + 1] * s.g + m[i + 2] * s.b + m[i + 3] * s.a + m[i + 4];
        let t = Color::new(row(0), row(5), row(10), row(15)).clamped();
        mask.select(s, t)
    });
}

/// General 2D convolution.
///
/// The kernel is applied flipped, centred by `(shift_x, shift_y)`; the sum is
/// then scaled and biased.
pub fn convolve(dst: &mut Image, src: &Image, conv: &Convolution<'_>, opts: FilterOptions) -> Result<(), VgError> {
    let (kw, kh) = (conv.width, conv.height);
    if kw == 0 || kh == 0 || kw > MAX_KERNEL_SIZE || kh > MAX_KERNEL_SIZE || conv.kernel.len() < kw * kh {
        return Err(VgError::IllegalArgument);
    }

    let region = Region::read(dst, src);
    region.write(dst, |x, y, s| {
        let mut sum = Color::transparent();
        for ki in 0..kh {
            for kj in 0..kw {
                let c = region.tiled(
                    i64::from(x) + kj as i64 - i64::from(conv.shift_x),
                    i64::from(y) + ki as i64 - i64::from(conv.shift_y),
                    conv.tiling,
                    opts.tile_fill,
                );
                let k = conv.kernel[(kh - ki - 1) * kw + (kw - kj - 1)] as f32;
                sum = mul_add(sum, c, k);
            }
        }
        let t = scale_bias(sum, conv.scale, conv.bias).clamped();
        opts.channel_mask.select(s, t)
    });
    Ok(())
}

/// Horizontal then vertical 1D convolution.
pub fn separable_convolve(
    dst: &mut Image,
    src: &Image,
    conv: &SeparableConvolution<'_>,
    opts: FilterOptions,
) -> Result<(), VgError> {
    let (kx, ky) = (conv.kernel_x, conv.kernel_y);
    if kx.is_empty() || ky.is_empty() || kx.len() > MAX_KERNEL_SIZE || ky.len() > MAX_KERNEL_SIZE {
        return Err(VgError::IllegalArgument);
    }

    let region = Region::read(dst, src);
    let horizontal = horizontal_pass(&region, kx, conv.shift_x, conv.tiling, opts.tile_fill);

    let mut fill = opts.tile_fill;
    if conv.tiling == TilingMode::Fill {
        fill = kx.iter().fold(Color::transparent(), |sum, &k| mul_add(sum, fill, k as f32)).clamped();
    }

    region.write(dst, |x, y, s| {
        let mut sum = Color::transparent();
        for k in 0..ky.len() {
            let sy = i64::from(y) + k as i64 - i64::from(conv.shift_y);
            let c = horizontal.tiled(i64::from(x), sy, conv.tiling, fill);
            sum = mul_add(sum, c, ky[ky.len() - k - 1] as f32);
        }
        let t = scale_bias(sum, conv.scale, conv.bias).clamped();
        opts.channel_mask.select(s, t)
    });
    Ok(())
}

/// One flipped horizontal pass over `region`, clamped per texel.
fn horizontal_pass(region: &Region, kernel: &[i16], shift: i32, tiling: TilingMode, fill: Color) -> Region {
    let n = kernel.len();
    let mut colors = Vec::with_capacity(region.colors.len());
    for y in 0..region.h {
        for x in 0..region.w {
            let mut sum = Color::transparent();
            for k in 0..n {
                let sx = i64::from(x) + k as i64 - i64::from(shift);
                let c = region.tiled(sx, i64::from(y), tiling, fill);
                sum = mul_add(sum, c, kernel[n - k - 1] as f32);
            }
            colors.push(sum.clamped());
        }
    }
    Region { w: region.w, h: region.h, colors }
}

/// Normalized gaussian weights for standard deviation `sigma`.
///
/// The kernel spans `2·half + 1` taps with `half = ⌊4σ + 1⌋`.
pub(crate) fn gaussian_kernel(sigma: f32) -> (Vec<f32>, i32) {
    let half = (sigma * 4.0 + 1.0) as i32;
    let exp_scale = -1.0 / (2.0 * sigma * sigma);
    let mut kernel: Vec<f32> = (-half..=half).map(|i| ((i * i) as f32 * exp_scale).exp()).collect();
    let sum: f32 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= sum;
    }
    (kernel, half)
}

/// Separable gaussian blur with independent deviations per axis.
///
/// Deviations must lie in `(0, MAX_GAUSSIAN_STD_DEVIATION]`.
pub fn gaussian_blur(
    dst: &mut Image,
    src: &Image,
    std_dev_x: f32,
    std_dev_y: f32,
    tiling: TilingMode,
    opts: FilterOptions,
) -> Result<(), VgError> {
    let valid = |s: f32| s > 0.0 && s <= MAX_GAUSSIAN_STD_DEVIATION;
    if !valid(std_dev_x) || !valid(std_dev_y) {
        return Err(VgError::IllegalArgument);
    }
    let (kx, hx) = gaussian_kernel(std_dev_x);
    let (ky, hy) = gaussian_kernel(std_dev_y);

    let region = Region::read(dst, src);
    let mut colors = Vec::with_capacity(region.colors.len());
    for y in 0..region.h {
        for x in 0..region.w {
            let sum = kx.iter().enumerate().fold(Color::transparent(), |sum, (k, &w)| {
                let sx = i64::from(x) + k as i64 - i64::from(hx);
                mul_add(sum, region.tiled(sx, i64::from(y), tiling, opts.tile_fill), w)
            });
            colors.push(sum);
        }
    }
    let horizontal = Region { w: region.w, h: region.h, colors };

    region.write(dst, |x, y, s| {
        let sum = ky.iter().enumerate().fold(Color::transparent(), |sum, (k, &w)| {
            let sy = i64::from(y) + k as i64 - i64::from(hy);
            mul_add(sum, horizontal.tiled(i64::from(x), sy, tiling, opts.tile_fill), w)
        });
        opts.channel_mask.select(s, sum.clamped())
    });
    Ok(())
}

/// Per-channel 8-bit lookup tables.
pub fn lookup(
    dst: &mut Image,
    src: &Image,
    red: &[u8; 256],
    green: &[u8; 256],
    blue: &[u8; 256],
    alpha: &[u8; 256],
    opts: FilterOptions,
) {
    let mask = if src.descriptor().luminance { ChannelMask::ALL } else { opts.channel_mask };
    let region = Region::read(dst, src);
    region.write(dst, |_, _, s| {
        let t = Color::new(
            byte(red[to_index(s.r)] as u32),
            byte(green[to_index(s.g)] as u32),
            byte(blue[to_index(s.b)] as u32),
            byte(alpha[to_index(s.a)] as u32),
        );
        mask.select(s, t)
    });
}

/// Maps one source channel through a table of packed `0xRRGGBBAA` colors.
///
/// Single-channel sources override `channel`: luminance and other 8-bit
/// color formats read red, alpha-only formats read alpha.
pub fn lookup_single(dst: &mut Image, src: &Image, table: &[u32; 256], channel: ImageChannel, opts: FilterOptions) {
    let desc = src.descriptor();
    let channel = if desc.luminance {
        ImageChannel::Red
    } else if desc.bytes == 1 {
        if desc.r.mask == 0 { ImageChannel::Alpha } else { ImageChannel::Red }
    } else {
        channel
    };

    let region = Region::read(dst, src);
    region.write(dst, |_, _, s| {
        let v = match channel {
            ImageChannel::Red => s.r,
            ImageChannel::Green => s.g,
            ImageChannel::Blue => s.b,
            ImageChannel::Alpha => s.a,
        };
        let packed = table[to_index(v)];
        let t = Color::new(byte(packed >> 24), byte(packed >> 16), byte(packed >> 8), byte(packed));
        opts.channel_mask.select(s, t)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{ImageFormat, ImageQuality};

    fn rgba(w: i32, h: i32) -> Image {
        Image::new(ImageFormat::SRGBA_8888, w, h, ImageQuality::default()).unwrap()
    }

    fn near(a: f32, b: f32) -> bool {
        (a - b).abs() < 1.0 / 255.0 + 1e-4
    }

    const RED: Color = Color::new(1.0, 0.0, 0.0, 1.0);
    const WHITE: Color = Color::white();

    // ── masks ─────────────────────────────────────────────────────────────

    #[test]
    fn mask_selects_per_channel() {
        let m = ChannelMask::RED | ChannelMask::ALPHA;
        let c = m.select(Color::new(0.1, 0.2, 0.3, 0.4), Color::new(0.9, 0.8, 0.7, 0.6));
        assert_eq!(c, Color::new(0.9, 0.2, 0.3, 0.6));
    }

    // ── color matrix ──────────────────────────────────────────────────────

    #[test]
    fn color_matrix_swaps_red_and_blue() {
        let mut src = rgba(2, 2);
        src.clear(0, 0, 2, 2, RED).unwrap();
        let mut dst = rgba(3, 1);
        #[rustfmt::skip]
        let m = [
            0.0, 0.0, 1.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0, 0.0,
            1.0, 0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0, 0.0,
        ];
        color_matrix(&mut dst, &src, &m, FilterOptions::default());
        assert_eq!(dst.pixel(0, 0), Some(Color::new(0.0, 0.0, 1.0, 1.0)));
        assert_eq!(dst.pixel(1, 0), Some(Color::new(0.0, 0.0, 1.0, 1.0)));
        // Outside the intersection of the two images.
        assert_eq!(dst.pixel(2, 0), Some(Color::transparent()));
        assert_eq!(dst.revision(), 1);
    }

    #[test]
    fn color_matrix_respects_mask() {
        let mut src = rgba(1, 1);
        src.clear(0, 0, 1, 1, RED).unwrap();
        let mut dst = rgba(1, 1);
        let mut m = [0.0; 20];
        m[9] = 1.0;
        let opts = FilterOptions { channel_mask: ChannelMask::GREEN, ..Default::default() };
        color_matrix(&mut dst, &src, &m, opts);
        assert_eq!(dst.pixel(0, 0), Some(Color::new(1.0, 1.0, 0.0, 1.0)));
    }

    // ── convolution ───────────────────────────────────────────────────────

    #[test]
    fn identity_kernel_copies() {
        let mut src = rgba(3, 3);
        src.clear(1, 1, 1, 1, RED).unwrap();
        let mut dst = rgba(3, 3);
        let k = [0, 0, 0, 0, 1, 0, 0, 0, 0];
        let conv = Convolution {
            kernel: &k,
            width: 3,
            height: 3,
            shift_x: 1,
            shift_y: 1,
            scale: 1.0,
            bias: 0.0,
            tiling: TilingMode::Pad,
        };
        convolve(&mut dst, &src, &conv, FilterOptions::default()).unwrap();
        assert_eq!(dst.pixel(1, 1), Some(RED));
        assert_eq!(dst.pixel(0, 0), Some(Color::transparent()));
    }

    #[test]
    fn kernel_is_applied_flipped() {
        // 1×3 kernel [1, 0, 0] with shift 1 reads the right neighbour.
        let mut src = rgba(3, 1);
        src.clear(2, 0, 1, 1, RED).unwrap();
        let mut dst = rgba(3, 1);
        let k = [1, 0, 0];
        let conv = Convolution {
            kernel: &k,
            width: 3,
            height: 1,
            shift_x: 1,
            shift_y: 0,
            scale: 1.0,
            bias: 0.0,
            tiling: TilingMode::Fill,
        };
        convolve(&mut dst, &src, &conv, FilterOptions::default()).unwrap();
        assert_eq!(dst.pixel(1, 0), Some(RED));
        assert_eq!(dst.pixel(2, 0), Some(Color::transparent()));
    }

    #[test]
    fn extreme_shift_samples_the_tiling() {
        let mut src = rgba(2, 2);
        src.clear(0, 0, 2, 2, RED).unwrap();
        let k = [1];
        let mut conv = Convolution {
            kernel: &k,
            width: 1,
            height: 1,
            shift_x: i32::MIN,
            shift_y: i32::MAX,
            scale: 1.0,
            bias: 0.0,
            tiling: TilingMode::Fill,
        };
        let opts = FilterOptions { tile_fill: WHITE, ..FilterOptions::default() };
        let mut dst = rgba(2, 2);
        convolve(&mut dst, &src, &conv, opts).unwrap();
        assert_eq!(dst.pixel(1, 1), Some(WHITE));

        conv.tiling = TilingMode::Reflect;
        convolve(&mut dst, &src, &conv, opts).unwrap();
        assert_eq!(dst.pixel(0, 0), Some(RED));
    }

    #[test]
    fn oversized_or_empty_kernels_are_illegal() {
        let src = rgba(1, 1);
        let mut dst = rgba(1, 1);
        let big = vec![1i16; MAX_KERNEL_SIZE + 1];
        let conv = Convolution {
            kernel: &big,
            width: MAX_KERNEL_SIZE + 1,
            height: 1,
            shift_x: 0,
            shift_y: 0,
            scale: 1.0,
            bias: 0.0,
            tiling: TilingMode::Fill,
        };
        assert_eq!(convolve(&mut dst, &src, &conv, FilterOptions::default()), Err(VgError::IllegalArgument));
        let sep = SeparableConvolution {
            kernel_x: &[],
            kernel_y: &[1],
            shift_x: 0,
            shift_y: 0,
            scale: 1.0,
            bias: 0.0,
            tiling: TilingMode::Fill,
        };
        assert_eq!(separable_convolve(&mut dst, &src, &sep, FilterOptions::default()), Err(VgError::IllegalArgument));
    }

    #[test]
    fn fill_tiling_uses_tile_color() {
        let src = rgba(2, 1);
        let mut dst = rgba(2, 1);
        let k = [1, 0];
        let conv = Convolution {
            kernel: &k,
            width: 2,
            height: 1,
            shift_x: 0,
            shift_y: 0,
            scale: 1.0,
            bias: 0.0,
            tiling: TilingMode::Fill,
        };
        let opts = FilterOptions { tile_fill: WHITE, ..Default::default() };
        convolve(&mut dst, &src, &conv, opts).unwrap();
        assert_eq!(dst.pixel(0, 0), Some(Color::transparent()));
        assert_eq!(dst.pixel(1, 0), Some(WHITE));
    }

    #[test]
    fn separable_box_blur_spreads_evenly() {
        let mut src = rgba(3, 3);
        src.clear(0, 0, 3, 3, WHITE).unwrap();
        let mut dst = rgba(3, 3);
        let sep = SeparableConvolution {
            kernel_x: &[1, 1, 1],
            kernel_y: &[1, 1, 1],
            shift_x: 1,
            shift_y: 1,
            scale: 1.0 / 9.0,
            bias: 0.0,
            tiling: TilingMode::Repeat,
        };
        // The horizontal pass clamps to 1, so a white source ends at 3/9.
        separable_convolve(&mut dst, &src, &sep, FilterOptions::default()).unwrap();
        let c = dst.pixel(1, 1).unwrap();
        assert!(near(c.r, 1.0 / 3.0));
        assert!(near(c.a, 1.0 / 3.0));
    }

    // ── gaussian ──────────────────────────────────────────────────────────

    #[test]
    fn gaussian_kernel_is_normalized_and_sized() {
        let (k, half) = gaussian_kernel(1.0);
        assert_eq!(half, 5);
        assert_eq!(k.len(), 11);
        assert!((k.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!(k[5] > k[4] && k[4] > k[3]);
    }

    #[test]
    fn gaussian_keeps_flat_images_flat() {
        let mut src = rgba(4, 4);
        src.clear(0, 0, 4, 4, RED).unwrap();
        let mut dst = rgba(4, 4);
        gaussian_blur(&mut dst, &src, 1.5, 0.5, TilingMode::Pad, FilterOptions::default()).unwrap();
        let c = dst.pixel(0, 3).unwrap();
        assert!(near(c.r, 1.0) && near(c.g, 0.0) && near(c.a, 1.0));
    }

    #[test]
    fn gaussian_deviation_range() {
        let src = rgba(1, 1);
        let mut dst = rgba(1, 1);
        let o = FilterOptions::default();
        assert_eq!(gaussian_blur(&mut dst, &src, 0.0, 1.0, TilingMode::Pad, o), Err(VgError::IllegalArgument));
        assert_eq!(gaussian_blur(&mut dst, &src, 1.0, 16.5, TilingMode::Pad, o), Err(VgError::IllegalArgument));
        assert!(gaussian_blur(&mut dst, &src, 16.0, 16.0, TilingMode::Pad, o).is_ok());
    }

    // ── lookup ────────────────────────────────────────────────────────────

    #[test]
    fn lookup_inverts_masked_channels() {
        let mut src = rgba(1, 1);
        src.clear(0, 0, 1, 1, RED).unwrap();
        let mut dst = rgba(1, 1);
        let mut inv = [0u8; 256];
        for (i, v) in inv.iter_mut().enumerate() {
            *v = 255 - i as u8;
        }
        let opts = FilterOptions { channel_mask: ChannelMask::RED | ChannelMask::GREEN, ..Default::default() };
        lookup(&mut dst, &src, &inv, &inv, &inv, &inv, opts);
        assert_eq!(dst.pixel(0, 0), Some(Color::new(0.0, 1.0, 0.0, 1.0)));
    }

    #[test]
    fn lookup_single_reads_alpha_of_alpha_only_source() {
        let mut src = Image::new(ImageFormat::A_8, 1, 1, ImageQuality::default()).unwrap();
        src.clear(0, 0, 1, 1, Color::new(0.0, 0.0, 0.0, 1.0)).unwrap();
        let mut dst = rgba(1, 1);
        let mut table = [0u32; 256];
        table[255] = 0x00FF_00FF;
        lookup_single(&mut dst, &src, &table, ImageChannel::Red, FilterOptions::default());
        assert_eq!(dst.pixel(0, 0), Some(Color::new(0.0, 1.0, 0.0, 1.0)));
    }
}
