/// Segment kind of a path command, independent of absolute/relative mode.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Segment {
    Close,
    MoveTo,
    LineTo,
    HLineTo,
    VLineTo,
    QuadTo,
    CubicTo,
    SQuadTo,
    SCubicTo,
    SccwArcTo,
    ScwArcTo,
    LccwArcTo,
    LcwArcTo,
}

impl Segment {
    const ALL: [Segment; 13] = [
        Segment::Close,
        Segment::MoveTo,
        Segment::LineTo,
        Segment::HLineTo,
        Segment::VLineTo,
        Segment::QuadTo,
        Segment::CubicTo,
        Segment::SQuadTo,
        Segment::SCubicTo,
        Segment::SccwArcTo,
        Segment::ScwArcTo,
        Segment::LccwArcTo,
        Segment::LcwArcTo,
    ];

    /// Wire code (even numbers 0..=24).
    #[inline]
    pub const fn code(self) -> u8 {
        match self {
            Segment::Close => 0,
            Segment::MoveTo => 2,
            Segment::LineTo => 4,
            Segment::HLineTo => 6,
            Segment::VLineTo => 8,
            Segment::QuadTo => 10,
            Segment::CubicTo => 12,
            Segment::SQuadTo => 14,
            Segment::SCubicTo => 16,
            Segment::SccwArcTo => 18,
            Segment::ScwArcTo => 20,
            Segment::LccwArcTo => 22,
            Segment::LcwArcTo => 24,
        }
    }

    /// Number of coordinates the segment consumes from the data stream.
    #[inline]
    pub const fn coord_count(self) -> usize {
        match self {
            Segment::Close => 0,
            Segment::MoveTo | Segment::LineTo => 2,
            Segment::HLineTo | Segment::VLineTo => 1,
            Segment::QuadTo => 4,
            Segment::CubicTo => 6,
            Segment::SQuadTo => 2,
            Segment::SCubicTo => 4,
            Segment::SccwArcTo | Segment::ScwArcTo | Segment::LccwArcTo | Segment::LcwArcTo => 5,
        }
    }
}

/// One path command: a segment plus its coordinate mode.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Command {
    pub segment: Segment,
    pub relative: bool,
}

impl Command {
    pub const CLOSE: Command = Command::abs(Segment::Close);

    #[inline]
    pub const fn abs(segment: Segment) -> Self {
        Self { segment, relative: false }
    }

    #[inline]
    pub const fn rel(segment: Segment) -> Self {
        Self { segment, relative: true }
    }

    /// Encoded byte: segment code with the low bit set for relative mode.
    #[inline]
    pub const fn to_byte(self) -> u8 {
        self.segment.code() | self.relative as u8
    }

    /// Decodes a command byte; `None` for bytes outside the vocabulary.
    pub fn from_byte(byte: u8) -> Option<Command> {
        let code = byte & !1;
        let segment = Segment::ALL.into_iter().find(|s| s.code() == code)?;
        Some(Command { segment, relative: byte & 1 == 1 })
    }

    #[inline]
    pub const fn coord_count(self) -> usize {
        self.segment.coord_count()
    }
}

/// Coordinate storage type of a path.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum PathDatatype {
    S8,
    S16,
    S32,
    #[default]
    F32,
}

impl PathDatatype {
    /// Bytes per coordinate.
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            PathDatatype::S8 => 1,
            PathDatatype::S16 => 2,
            PathDatatype::S32 | PathDatatype::F32 => 4,
        }
    }
}

/// Coordinate data handed to [`Path::append`](super::Path::append); the
/// variant must match the path's datatype.
#[derive(Debug, Copy, Clone)]
pub enum PathData<'a> {
    S8(&'a [i8]),
    S16(&'a [i16]),
    S32(&'a [i32]),
    F32(&'a [f32]),
}

impl PathData<'_> {
    #[inline]
    pub fn datatype(&self) -> PathDatatype {
        match self {
            PathData::S8(_) => PathDatatype::S8,
            PathData::S16(_) => PathDatatype::S16,
            PathData::S32(_) => PathDatatype::S32,
            PathData::F32(_) => PathDatatype::F32,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        match self {
            PathData::S8(d) => d.len(),
            PathData::S16(d) => d.len(),
            PathData::S32(d) => d.len(),
            PathData::F32(d) => d.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Operations a path permits. Bits outside [`ALL`](Self::ALL) are ignored.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PathCapabilities(u32);

impl PathCapabilities {
    pub const NONE: Self = Self(0);
    pub const APPEND_FROM: Self = Self(1 << 0);
    pub const APPEND_TO: Self = Self(1 << 1);
    pub const MODIFY: Self = Self(1 << 2);
    pub const TRANSFORM_FROM: Self = Self(1 << 3);
    pub const TRANSFORM_TO: Self = Self(1 << 4);
    pub const INTERPOLATE_FROM: Self = Self(1 << 5);
    pub const INTERPOLATE_TO: Self = Self(1 << 6);
    pub const PATH_LENGTH: Self = Self(1 << 7);
    pub const POINT_ALONG_PATH: Self = Self(1 << 8);
    pub const TANGENT_ALONG_PATH: Self = Self(1 << 9);
    pub const PATH_BOUNDS: Self = Self(1 << 10);
    pub const PATH_TRANSFORMED_BOUNDS: Self = Self(1 << 11);
    pub const ALL: Self = Self((1 << 12) - 1);

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

    #[inline]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    #[inline]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }
}

impl Default for PathCapabilities {
    fn default() -> Self {
        Self::ALL
    }
}

impl std::ops::BitOr for PathCapabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── command bytes ─────────────────────────────────────────────────────

    #[test]
    fn every_valid_byte_round_trips() {
        for byte in 0u8..=25 {
            let cmd = Command::from_byte(byte).unwrap();
            assert_eq!(cmd.to_byte(), byte);
        }
    }

    #[test]
    fn bytes_past_the_vocabulary_are_rejected() {
        assert!(Command::from_byte(26).is_none());
        assert!(Command::from_byte(255).is_none());
    }

    #[test]
    fn relative_bit_is_low_bit() {
        let cmd = Command::from_byte(5).unwrap();
        assert_eq!(cmd.segment, Segment::LineTo);
        assert!(cmd.relative);
    }

    #[test]
    fn coordinate_counts() {
        assert_eq!(Segment::Close.coord_count(), 0);
        assert_eq!(Segment::HLineTo.coord_count(), 1);
        assert_eq!(Segment::CubicTo.coord_count(), 6);
        assert_eq!(Segment::LcwArcTo.coord_count(), 5);
    }

    // ── capabilities ──────────────────────────────────────────────────────

    #[test]
    fn unknown_capability_bits_are_dropped() {
        let caps = PathCapabilities::from_bits_truncate(u32::MAX);
        assert_eq!(caps, PathCapabilities::ALL);
    }

    #[test]
    fn difference_removes_bits() {
        let caps = PathCapabilities::ALL.difference(PathCapabilities::PATH_LENGTH);
        assert!(!caps.contains(PathCapabilities::PATH_LENGTH));
        assert!(caps.contains(PathCapabilities::PATH_BOUNDS | PathCapabilities::APPEND_TO));
    }
}
