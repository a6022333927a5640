use crate::context::VgError;
use crate::paint::Color;

/// Storage layout ignoring channel order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BaseFormat {
    Srgbx8888,
    Srgba8888,
    Srgba8888Pre,
    Srgb565,
    Srgba5551,
    Srgba4444,
    Sl8,
    Lrgbx8888,
    Lrgba8888,
    Lrgba8888Pre,
    Ll8,
    A8,
    Bw1,
}

impl BaseFormat {
    const ALL: [BaseFormat; 13] = [
        BaseFormat::Srgbx8888,
        BaseFormat::Srgba8888,
        BaseFormat::Srgba8888Pre,
        BaseFormat::Srgb565,
        BaseFormat::Srgba5551,
        BaseFormat::Srgba4444,
        BaseFormat::Sl8,
        BaseFormat::Lrgbx8888,
        BaseFormat::Lrgba8888,
        BaseFormat::Lrgba8888Pre,
        BaseFormat::Ll8,
        BaseFormat::A8,
        BaseFormat::Bw1,
    ];

    #[inline]
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Formats that accept the channel-order bits.
    #[inline]
    fn is_orderable(self) -> bool {
        !matches!(self, BaseFormat::Sl8 | BaseFormat::Ll8 | BaseFormat::A8 | BaseFormat::Bw1)
    }
}

/// Position of alpha and order of the color channels within a pixel word.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum ChannelOrder {
    #[default]
    Rgba,
    Argb,
    Bgra,
    Abgr,
}

impl ChannelOrder {
    #[inline]
    fn alpha_msb(self) -> bool {
        matches!(self, ChannelOrder::Argb | ChannelOrder::Abgr)
    }

    #[inline]
    fn bgr(self) -> bool {
        matches!(self, ChannelOrder::Bgra | ChannelOrder::Abgr)
    }
}

/// Pixel format: a base layout plus channel order.
///
/// The numeric form is the base code in the low five bits, bit 6 for
/// alpha-first and bit 7 for BGR order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ImageFormat {
    pub base: BaseFormat,
    pub order: ChannelOrder,
}

impl ImageFormat {
    pub const SRGBA_8888: ImageFormat = ImageFormat::new(BaseFormat::Srgba8888, ChannelOrder::Rgba);
    pub const SRGBX_8888: ImageFormat = ImageFormat::new(BaseFormat::Srgbx8888, ChannelOrder::Rgba);
    pub const SRGB_565: ImageFormat = ImageFormat::new(BaseFormat::Srgb565, ChannelOrder::Rgba);
    pub const SRGBA_5551: ImageFormat = ImageFormat::new(BaseFormat::Srgba5551, ChannelOrder::Rgba);
    pub const SRGBA_4444: ImageFormat = ImageFormat::new(BaseFormat::Srgba4444, ChannelOrder::Rgba);
    pub const SL_8: ImageFormat = ImageFormat::new(BaseFormat::Sl8, ChannelOrder::Rgba);
    pub const LRGBA_8888: ImageFormat = ImageFormat::new(BaseFormat::Lrgba8888, ChannelOrder::Rgba);
    pub const LL_8: ImageFormat = ImageFormat::new(BaseFormat::Ll8, ChannelOrder::Rgba);
    pub const A_8: ImageFormat = ImageFormat::new(BaseFormat::A8, ChannelOrder::Rgba);

    #[inline]
    pub const fn new(base: BaseFormat, order: ChannelOrder) -> Self {
        Self { base, order }
    }

    /// Decodes a numeric format. Unknown codes and order bits on
    /// single-channel formats are `UnsupportedImageFormat`.
    pub fn from_raw(raw: u32) -> Result<Self, VgError> {
        if raw & !0xDF != 0 {
            return Err(VgError::UnsupportedImageFormat);
        }
        let base = BaseFormat::ALL
            .get((raw & 0x1F) as usize)
            .copied()
            .ok_or(VgError::UnsupportedImageFormat)?;
        let order = match (raw & (1 << 6) != 0, raw & (1 << 7) != 0) {
            (false, false) => ChannelOrder::Rgba,
            (true, false) => ChannelOrder::Argb,
            (false, true) => ChannelOrder::Bgra,
            (true, true) => ChannelOrder::Abgr,
        };
        if order != ChannelOrder::Rgba && !base.is_orderable() {
            return Err(VgError::UnsupportedImageFormat);
        }
        Ok(Self { base, order })
    }

    pub fn to_raw(self) -> u32 {
        let mut raw = self.base.code();
        if self.order.alpha_msb() {
            raw |= 1 << 6;
        }
        if self.order.bgr() {
            raw |= 1 << 7;
        }
        raw
    }

    /// Premultiplied and 1-bit formats are recognized but not stored.
    #[inline]
    pub fn is_supported(self) -> bool {
        !matches!(self.base, BaseFormat::Srgba8888Pre | BaseFormat::Lrgba8888Pre | BaseFormat::Bw1)
    }

    /// Pack/unpack descriptor, or `UnsupportedImageFormat`.
    pub fn descriptor(self) -> Result<FormatDesc, VgError> {
        if !self.is_supported() {
            return Err(VgError::UnsupportedImageFormat);
        }
        Ok(FormatDesc::build(self))
    }
}

/// One channel inside a packed pixel word.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Channel {
    pub mask: u32,
    pub shift: u32,
    pub max: u32,
}

impl Channel {
    const NONE: Channel = Channel { mask: 0, shift: 0, max: 1 };

    #[inline]
    const fn new(mask: u32, shift: u32, max: u32) -> Self {
        Self { mask, shift, max }
    }

    #[inline]
    fn pack(self, v: f32) -> u32 {
        ((v * self.max as f32 + 0.5) as u32) << self.shift & self.mask
    }

    #[inline]
    fn unpack(self, word: u32) -> f32 {
        ((word & self.mask) >> self.shift) as f32 / self.max as f32
    }
}

/// Masks, shifts and maxima for one supported format.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FormatDesc {
    pub format: ImageFormat,
    pub bytes: usize,
    pub r: Channel,
    pub g: Channel,
    pub b: Channel,
    pub a: Channel,
    pub linear: bool,
    pub luminance: bool,
}

impl FormatDesc {
    fn build(format: ImageFormat) -> Self {
        use BaseFormat::*;

        let c8888 = |alpha: bool| {
            (
                4usize,
                Channel::new(0xFF00_0000, 24, 255),
                Channel::new(0x00FF_0000, 16, 255),
                Channel::new(0x0000_FF00, 8, 255),
                if alpha { Channel::new(0xFF, 0, 255) } else { Channel::NONE },
            )
        };
        let lum = (
            1,
            Channel::new(0xFF, 0, 255),
            Channel::new(0xFF, 0, 255),
            Channel::new(0xFF, 0, 255),
            Channel::NONE,
        );

        let (bytes, mut r, mut g, mut b, mut a) = match format.base {
            Srgbx8888 | Lrgbx8888 => c8888(false),
            Srgba8888 | Srgba8888Pre | Lrgba8888 | Lrgba8888Pre => c8888(true),
            Srgb565 => (
                2,
                Channel::new(0xF800, 11, 31),
                Channel::new(0x07E0, 5, 63),
                Channel::new(0x001F, 0, 31),
                Channel::NONE,
            ),
            Srgba5551 => (
                2,
                Channel::new(0xF800, 11, 31),
                Channel::new(0x07C0, 6, 31),
                Channel::new(0x003E, 1, 31),
                Channel::new(0x0001, 0, 1),
            ),
            Srgba4444 => (
                2,
                Channel::new(0xF000, 12, 15),
                Channel::new(0x0F00, 8, 15),
                Channel::new(0x00F0, 4, 15),
                Channel::new(0x000F, 0, 15),
            ),
            Sl8 | Ll8 => lum,
            A8 => (1, Channel::NONE, Channel::NONE, Channel::NONE, Channel::new(0xFF, 0, 255)),
            Bw1 => (1, Channel::NONE, Channel::NONE, Channel::NONE, Channel::NONE),
        };

        if format.order.alpha_msb() {
            let abits = b.shift;
            let word_bits = bytes as u32 * 8;
            for ch in [&mut r, &mut g, &mut b] {
                ch.shift -= abits;
                ch.mask >>= abits;
            }
            a.shift = word_bits - abits;
            a.mask <<= word_bits - abits;
        }
        if format.order.bgr() {
            std::mem::swap(&mut r, &mut b);
        }

        Self {
            format,
            bytes,
            r,
            g,
            b,
            a,
            linear: matches!(format.base, Lrgbx8888 | Lrgba8888 | Lrgba8888Pre | Ll8),
            luminance: matches!(format.base, Sl8 | Ll8),
        }
    }

    /// Packs a straight-alpha color into a pixel word.
    pub fn pack(&self, c: Color) -> u32 {
        let c = c.clamped();
        if self.luminance {
            let l = 0.2126 * c.r + 0.7152 * c.g + 0.0722 * c.b;
            return self.r.pack(l);
        }
        self.r.pack(c.r) | self.g.pack(c.g) | self.b.pack(c.b) | self.a.pack(c.a)
    }

    /// Unpacks a pixel word. Channels the format lacks load as 1.
    pub fn unpack(&self, word: u32) -> Color {
        let mut c = Color::new(self.r.unpack(word), self.g.unpack(word), self.b.unpack(word), self.a.unpack(word));
        if self.a.mask == 0 {
            c.a = 1.0;
        }
        if self.r.mask == 0 {
            c.r = 1.0;
            c.g = 1.0;
            c.b = 1.0;
        }
        c
    }

    /// Reads one pixel word from the start of `bytes` (native endian).
    #[inline]
    pub fn load(&self, bytes: &[u8]) -> u32 {
        match self.bytes {
            4 => u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            2 => u16::from_ne_bytes([bytes[0], bytes[1]]) as u32,
            _ => bytes[0] as u32,
        }
    }

    /// Writes one pixel word to the start of `bytes` (native endian).
    #[inline]
    pub fn store(&self, bytes: &mut [u8], word: u32) {
        match self.bytes {
            4 => bytes[..4].copy_from_slice(&word.to_ne_bytes()),
            2 => bytes[..2].copy_from_slice(&(word as u16).to_ne_bytes()),
            _ => bytes[0] = word as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(raw: u32) -> FormatDesc {
        ImageFormat::from_raw(raw).unwrap().descriptor().unwrap()
    }

    // ── decoding ──────────────────────────────────────────────────────────

    #[test]
    fn raw_codes_round_trip() {
        for raw in [0, 1, 3, 4, 5, 6, 7, 8, 10, 11, 1 | 64, 1 | 128, 1 | 192, 5 | 64] {
            assert_eq!(ImageFormat::from_raw(raw).unwrap().to_raw(), raw);
        }
    }

    #[test]
    fn unknown_and_misordered_codes_are_rejected() {
        assert_eq!(ImageFormat::from_raw(13), Err(VgError::UnsupportedImageFormat));
        assert_eq!(ImageFormat::from_raw(1 | 32), Err(VgError::UnsupportedImageFormat));
        assert_eq!(ImageFormat::from_raw(11 | 64), Err(VgError::UnsupportedImageFormat));
        assert_eq!(ImageFormat::from_raw(6 | 128), Err(VgError::UnsupportedImageFormat));
    }

    #[test]
    fn premultiplied_and_bw_are_unsupported() {
        for raw in [2, 9, 12] {
            let f = ImageFormat::from_raw(raw).unwrap();
            assert!(!f.is_supported());
            assert_eq!(f.descriptor(), Err(VgError::UnsupportedImageFormat));
        }
    }

    // ── layout ────────────────────────────────────────────────────────────

    #[test]
    fn argb_moves_alpha_to_the_top_byte() {
        let d = desc(1 | 64);
        assert_eq!((d.r.mask, d.r.shift), (0x00FF_0000, 16));
        assert_eq!((d.b.mask, d.b.shift), (0x0000_00FF, 0));
        assert_eq!((d.a.mask, d.a.shift), (0xFF00_0000, 24));
    }

    #[test]
    fn bgra_swaps_red_and_blue() {
        let d = desc(1 | 128);
        assert_eq!((d.r.mask, d.r.shift), (0x0000_FF00, 8));
        assert_eq!((d.b.mask, d.b.shift), (0xFF00_0000, 24));
    }

    #[test]
    fn argb_5551_layout() {
        let d = desc(4 | 64);
        assert_eq!((d.r.mask, d.r.shift), (0x7C00, 10));
        assert_eq!((d.a.mask, d.a.shift), (0x8000, 15));
    }

    // ── packing ───────────────────────────────────────────────────────────

    #[test]
    fn pack_rgba8888() {
        let d = desc(1);
        assert_eq!(d.pack(Color::new(1.0, 0.0, 0.5, 1.0)), 0xFF00_80FF);
        assert_eq!(d.unpack(0xFF00_80FF), Color::new(1.0, 0.0, 128.0 / 255.0, 1.0));
    }

    #[test]
    fn pack_565_rounds_to_channel_width() {
        let d = desc(3);
        assert_eq!(d.pack(Color::white()), 0xFFFF);
        assert_eq!(d.pack(Color::new(1.0, 0.0, 0.0, 0.3)), 0xF800);
        assert_eq!(d.unpack(0xF800).a, 1.0);
    }

    #[test]
    fn luminance_weights_all_three_channels() {
        let d = desc(6);
        assert_eq!(d.pack(Color::new(0.0, 0.0, 1.0, 1.0)), (0.0722f32 * 255.0 + 0.5) as u32);
        assert_eq!(d.pack(Color::white()), 255);
        let c = d.unpack(128);
        assert_eq!(c.r, c.b);
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn alpha_only_loads_white() {
        let d = desc(11);
        assert_eq!(d.unpack(0x80), Color::new(1.0, 1.0, 1.0, 128.0 / 255.0));
        assert_eq!(d.pack(Color::new(0.2, 0.3, 0.4, 1.0)), 0xFF);
    }

    #[test]
    fn out_of_range_colors_clamp() {
        let d = desc(1);
        assert_eq!(d.pack(Color::new(2.0, -1.0, 0.0, 1.0)), 0xFF00_00FF);
    }

    #[test]
    fn store_and_load_words() {
        let d = desc(5);
        let mut buf = [0u8; 2];
        d.store(&mut buf, 0xABCD);
        assert_eq!(d.load(&buf), 0xABCD);
    }
}
