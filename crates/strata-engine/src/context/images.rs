use crate::image::filter::{self, Convolution, FilterOptions, ImageChannel, SeparableConvolution};
use crate::image::{Image, ImageFormat, ImageQuality, TilingMode};

use super::context::Context;
use super::error::VgError;
use super::ImageHandle;

impl Context {
    /// Registers a zero-filled image.
    pub fn create_image(
        &mut self,
        format: ImageFormat,
        width: i32,
        height: i32,
        quality: ImageQuality,
    ) -> Option<ImageHandle> {
        let image = self.errors.check(Image::new(format, width, height, quality))?;
        Some(self.images.insert(image))
    }

    /// Destroys an image. Queued draws still see it until the next render.
    pub fn destroy_image(&mut self, h: ImageHandle) {
        let Some(image) = self.images.remove(h) else {
            self.errors.record(VgError::BadHandle);
            return;
        };
        if !self.plans.is_empty() {
            self.retired_images.push((h, image));
        }
    }

    #[inline]
    pub fn image(&self, h: ImageHandle) -> Option<&Image> {
        self.images.get(h)
    }

    fn with_image<T>(&mut self, h: ImageHandle, f: impl FnOnce(&mut Image) -> Result<T, VgError>) -> Option<T> {
        let Some(image) = self.images.get_mut(h) else {
            self.errors.record(VgError::BadHandle);
            return None;
        };
        let result = f(image);
        self.errors.check(result)
    }

    /// Fills a region with the context clear color.
    pub fn clear_image(&mut self, h: ImageHandle, x: i32, y: i32, width: i32, height: i32) {
        let color = self.state.clear_color;
        self.with_image(h, |i| i.clear(x, y, width, height, color));
    }

    /// Writes `height` rows of `stride` bytes in `format` at `(x, y)`.
    #[allow(clippy::too_many_arguments)]
    pub fn image_sub_data(
        &mut self,
        h: ImageHandle,
        data: &[u8],
        stride: usize,
        format: ImageFormat,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) {
        self.with_image(h, |i| i.sub_data(data, stride, format, x, y, width, height));
    }

    /// Reads a block of the image into `out` in `format`.
    #[allow(clippy::too_many_arguments)]
    pub fn get_image_sub_data(
        &mut self,
        h: ImageHandle,
        out: &mut [u8],
        stride: usize,
        format: ImageFormat,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) {
        self.with_image(h, |i| i.get_sub_data(out, stride, format, x, y, width, height));
    }

    #[allow(clippy::too_many_arguments)]
    pub fn copy_image(
        &mut self,
        dst: ImageHandle,
        dx: i32,
        dy: i32,
        src: ImageHandle,
        sx: i32,
        sy: i32,
        width: i32,
        height: i32,
    ) {
        if dst == src {
            self.with_image(dst, |i| i.copy_within(dx, dy, sx, sy, width, height));
            return;
        }
        let Some((d, s)) = self.images.get_pair(dst, src) else {
            self.errors.record(VgError::BadHandle);
            return;
        };
        let result = d.copy_from(dx, dy, s, sx, sy, width, height);
        self.errors.check(result);
    }

    // ── filters ──────────────────────────────────────────────────────────

    /// Runs a filter from `src` into `dst` with the context filter state.
    fn filter<T>(
        &mut self,
        dst: ImageHandle,
        src: ImageHandle,
        f: impl FnOnce(&mut Image, &Image, FilterOptions) -> Result<T, VgError>,
    ) -> Option<T> {
        let opts = FilterOptions { channel_mask: self.state.filter_channel_mask, tile_fill: self.state.tile_fill_color };
        let Some((d, s)) = self.images.get_pair(dst, src) else {
            let err = if dst == src { VgError::IllegalArgument } else { VgError::BadHandle };
            self.errors.record(err);
            return None;
        };
        let result = f(d, s, opts);
        self.errors.check(result)
    }

    /// Applies a 4×5 row-major color matrix.
    pub fn color_matrix(&mut self, dst: ImageHandle, src: ImageHandle, matrix: &[f32; 20]) {
        if matrix.iter().any(|v| !v.is_finite()) {
            self.errors.record(VgError::IllegalArgument);
            return;
        }
        self.filter(dst, src, |d, s, opts| {
            filter::color_matrix(d, s, matrix, opts);
            Ok(())
        });
    }

    pub fn convolve(&mut self, dst: ImageHandle, src: ImageHandle, conv: &Convolution<'_>) {
        self.filter(dst, src, |d, s, opts| filter::convolve(d, s, conv, opts));
    }

    pub fn separable_convolve(&mut self, dst: ImageHandle, src: ImageHandle, conv: &SeparableConvolution<'_>) {
        self.filter(dst, src, |d, s, opts| filter::separable_convolve(d, s, conv, opts));
    }

    pub fn gaussian_blur(&mut self, dst: ImageHandle, src: ImageHandle, std_dev_x: f32, std_dev_y: f32, tiling: TilingMode) {
        self.filter(dst, src, |d, s, opts| filter::gaussian_blur(d, s, std_dev_x, std_dev_y, tiling, opts));
    }

    #[allow(clippy::too_many_arguments)]
    pub fn lookup(
        &mut self,
        dst: ImageHandle,
        src: ImageHandle,
        red: &[u8; 256],
        green: &[u8; 256],
        blue: &[u8; 256],
        alpha: &[u8; 256],
    ) {
        self.filter(dst, src, |d, s, opts| {
            filter::lookup(d, s, red, green, blue, alpha, opts);
            Ok(())
        });
    }

    pub fn lookup_single(&mut self, dst: ImageHandle, src: ImageHandle, table: &[u32; 256], channel: ImageChannel) {
        self.filter(dst, src, |d, s, opts| {
            filter::lookup_single(d, s, table, channel, opts);
            Ok(())
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::context::{Context, ContextConfig, VgError};
    use crate::image::{ChannelMask, ImageChannel, ImageFormat, ImageQuality, TilingMode};
    use crate::paint::Color;

    fn ctx() -> Context {
        Context::new(ContextConfig::default())
    }

    fn rgba(c: &mut Context, w: i32, h: i32) -> crate::context::ImageHandle {
        c.create_image(ImageFormat::SRGBA_8888, w, h, ImageQuality::ALL).unwrap()
    }

    fn pixel(c: &Context, h: crate::context::ImageHandle, x: i32, y: i32) -> [u8; 4] {
        c.image(h).unwrap().pixel(x, y).unwrap().to_u8()
    }

    // ── lifecycle ────────────────────────────────────────────────────────

    #[test]
    fn create_validates() {
        let mut c = ctx();
        assert!(c.create_image(ImageFormat::SRGBA_8888, 0, 4, ImageQuality::ALL).is_none());
        assert_eq!(c.take_error(), Some(VgError::IllegalArgument));
        let h = rgba(&mut c, 2, 2);
        assert_eq!(pixel(&c, h, 1, 1), [0, 0, 0, 0]);
        c.destroy_image(h);
        c.destroy_image(h);
        assert_eq!(c.take_error(), Some(VgError::BadHandle));
    }

    // ── pixel access ─────────────────────────────────────────────────────

    #[test]
    fn clear_uses_clear_color() {
        let mut c = ctx();
        let h = rgba(&mut c, 4, 4);
        c.set_clear_color(Color::new(1.0, 0.0, 0.0, 1.0));
        c.clear_image(h, 1, 1, 2, 2);
        assert_eq!(pixel(&c, h, 1, 1), [255, 0, 0, 255]);
        assert_eq!(pixel(&c, h, 0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn sub_data_round_trip() {
        let mut c = ctx();
        let h = rgba(&mut c, 2, 1);
        let data = [10u8, 20, 30, 255, 40, 50, 60, 255];
        c.image_sub_data(h, &data, 8, ImageFormat::SRGBA_8888, 0, 0, 2, 1);
        let mut out = [0u8; 8];
        c.get_image_sub_data(h, &mut out, 8, ImageFormat::SRGBA_8888, 0, 0, 2, 1);
        assert_eq!(out, data);

        c.get_image_sub_data(h, &mut out, 2, ImageFormat::SRGBA_8888, 0, 0, 2, 1);
        assert_eq!(c.take_error(), Some(VgError::IllegalArgument));
    }

    #[test]
    fn copy_between_and_within() {
        let mut c = ctx();
        let a = rgba(&mut c, 4, 1);
        let b = rgba(&mut c, 4, 1);
        c.set_clear_color(Color::white());
        c.clear_image(a, 0, 0, 1, 1);
        c.copy_image(b, 2, 0, a, 0, 0, 1, 1);
        assert_eq!(pixel(&c, b, 2, 0), [255, 255, 255, 255]);
        c.copy_image(b, 3, 0, b, 2, 0, 1, 1);
        assert_eq!(pixel(&c, b, 3, 0), [255, 255, 255, 255]);
        assert_eq!(c.take_error(), None);
    }

    // ── filters ──────────────────────────────────────────────────────────

    #[test]
    fn filter_rejects_aliasing() {
        let mut c = ctx();
        let a = rgba(&mut c, 2, 2);
        c.gaussian_blur(a, a, 1.0, 1.0, TilingMode::Pad);
        assert_eq!(c.take_error(), Some(VgError::IllegalArgument));
    }

    #[test]
    fn filter_honors_channel_mask() {
        let mut c = ctx();
        let src = rgba(&mut c, 1, 1);
        let dst = rgba(&mut c, 1, 1);
        c.set_clear_color(Color::new(0.2, 0.4, 0.6, 1.0));
        c.clear_image(src, 0, 0, 1, 1);
        c.set_filter_channel_mask(ChannelMask::RED);
        let mut invert = [0u8; 256];
        for (i, v) in invert.iter_mut().enumerate() {
            *v = 255 - i as u8;
        }
        let identity: [u8; 256] = std::array::from_fn(|i| i as u8);
        c.lookup(dst, src, &invert, &identity, &identity, &identity);
        let p = pixel(&c, dst, 0, 0);
        let s = pixel(&c, src, 0, 0);
        assert_eq!(p[0], 255 - s[0]);
        assert_eq!(&p[1..], &s[1..]);
        assert_eq!(c.take_error(), None);
    }

    #[test]
    fn lookup_single_reads_channel() {
        let mut c = ctx();
        let src = rgba(&mut c, 1, 1);
        let dst = rgba(&mut c, 1, 1);
        c.set_clear_color(Color::white());
        c.clear_image(src, 0, 0, 1, 1);
        let mut table = [0u32; 256];
        table[255] = 0x00FF00FF;
        c.lookup_single(dst, src, &table, ImageChannel::Green);
        assert_eq!(pixel(&c, dst, 0, 0), [0, 255, 0, 255]);
    }

    #[test]
    fn blur_deviation_is_bounded() {
        let mut c = ctx();
        let a = rgba(&mut c, 2, 2);
        let b = rgba(&mut c, 2, 2);
        c.gaussian_blur(b, a, 0.0, 1.0, TilingMode::Fill);
        assert_eq!(c.take_error(), Some(VgError::IllegalArgument));
        c.gaussian_blur(b, a, 2.0, 2.0, TilingMode::Fill);
        assert_eq!(c.take_error(), None);
    }
}
