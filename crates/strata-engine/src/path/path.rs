use crate::context::VgError;
use crate::render::GeometryCache;

use super::command::{Command, PathCapabilities, PathData, PathDatatype};
use super::process::Segments;

/// Raw coordinate storage in the path's datatype.
#[derive(Debug, Clone)]
enum Coords {
    S8(Vec<i8>),
    S16(Vec<i16>),
    S32(Vec<i32>),
    F32(Vec<f32>),
}

impl Coords {
    fn new(datatype: PathDatatype) -> Self {
        match datatype {
            PathDatatype::S8 => Coords::S8(Vec::new()),
            PathDatatype::S16 => Coords::S16(Vec::new()),
            PathDatatype::S32 => Coords::S32(Vec::new()),
            PathDatatype::F32 => Coords::F32(Vec::new()),
        }
    }

    fn len(&self) -> usize {
        match self {
            Coords::S8(v) => v.len(),
            Coords::S16(v) => v.len(),
            Coords::S32(v) => v.len(),
            Coords::F32(v) => v.len(),
        }
    }

    #[inline]
    fn raw(&self, i: usize) -> f32 {
        match self {
            Coords::S8(v) => v[i] as f32,
            Coords::S16(v) => v[i] as f32,
            Coords::S32(v) => v[i] as f32,
            Coords::F32(v) => v[i],
        }
    }

    /// Appends typed data; false when the variant does not match.
    fn extend(&mut self, data: PathData<'_>) -> bool {
        match (self, data) {
            (Coords::S8(v), PathData::S8(d)) => v.extend_from_slice(d),
            (Coords::S16(v), PathData::S16(d)) => v.extend_from_slice(d),
            (Coords::S32(v), PathData::S32(d)) => v.extend_from_slice(d),
            (Coords::F32(v), PathData::F32(d)) => v.extend_from_slice(d),
            _ => return false,
        }
        true
    }

    /// Encodes user-space values as `(v - bias) / scale`, rounding to
    /// nearest for integer types. Integer casts saturate.
    fn extend_encoded(&mut self, values: &[f32], scale: f32, bias: f32) {
        let enc = |v: f32| (v - bias) / scale;
        let round = |v: f32| (enc(v) + 0.5).floor();
        match self {
            Coords::S8(out) => out.extend(values.iter().map(|&v| round(v) as i8)),
            Coords::S16(out) => out.extend(values.iter().map(|&v| round(v) as i16)),
            Coords::S32(out) => out.extend(values.iter().map(|&v| round(v) as i32)),
            Coords::F32(out) => out.extend(values.iter().map(|&v| enc(v))),
        }
    }

    fn truncate(&mut self, len: usize) {
        match self {
            Coords::S8(v) => v.truncate(len),
            Coords::S16(v) => v.truncate(len),
            Coords::S32(v) => v.truncate(len),
            Coords::F32(v) => v.truncate(len),
        }
    }
}

/// A path object: typed segment commands plus encoded coordinates.
///
/// Paths only grow (append) or reset (clear). Every mutation invalidates the
/// flattened geometry cached for rendering.
#[derive(Debug)]
pub struct Path {
    datatype: PathDatatype,
    scale: f32,
    bias: f32,
    caps: PathCapabilities,
    commands: Vec<Command>,
    coords: Coords,

    pub(crate) cache: GeometryCache,
}

impl Path {
    /// Creates an empty path. A zero or non-finite scale, or a non-finite
    /// bias, is rejected.
    pub fn new(
        datatype: PathDatatype,
        scale: f32,
        bias: f32,
        caps: PathCapabilities,
    ) -> Result<Self, VgError> {
        if scale == 0.0 || !scale.is_finite() || !bias.is_finite() {
            return Err(VgError::IllegalArgument);
        }
        Ok(Self {
            datatype,
            scale,
            bias,
            caps: PathCapabilities::from_bits_truncate(caps.bits()),
            commands: Vec::new(),
            coords: Coords::new(datatype),
            cache: GeometryCache::default(),
        })
    }

    /// F32 path with unit scale, zero bias and every capability.
    pub fn with_defaults() -> Self {
        Self {
            datatype: PathDatatype::F32,
            scale: 1.0,
            bias: 0.0,
            caps: PathCapabilities::ALL,
            commands: Vec::new(),
            coords: Coords::new(PathDatatype::F32),
            cache: GeometryCache::default(),
        }
    }

    #[inline]
    pub fn datatype(&self) -> PathDatatype {
        self.datatype
    }

    #[inline]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    #[inline]
    pub fn bias(&self) -> f32 {
        self.bias
    }

    #[inline]
    pub fn capabilities(&self) -> PathCapabilities {
        self.caps
    }

    pub fn remove_capabilities(&mut self, caps: PathCapabilities) {
        self.caps = self.caps.difference(caps);
    }

    pub(crate) fn require(&self, caps: PathCapabilities) -> Result<(), VgError> {
        if self.caps.contains(caps) {
            Ok(())
        } else {
            Err(VgError::PathCapability)
        }
    }

    #[inline]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Number of segment commands (the unit of path-length windows).
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.commands.len()
    }

    #[inline]
    pub fn coord_count(&self) -> usize {
        self.coords.len()
    }

    /// Decoded coordinate `i`: `raw · scale + bias`.
    #[inline]
    pub fn coord(&self, i: usize) -> f32 {
        self.coords.raw(i) * self.scale + self.bias
    }

    /// Appends encoded command bytes and coordinates in the path datatype.
    ///
    /// Fails without modifying the path on unknown command bytes, a data
    /// variant that differs from the datatype, or a coordinate count that
    /// differs from what the commands consume.
    pub fn append(&mut self, commands: &[u8], data: PathData<'_>) -> Result<(), VgError> {
        self.require(PathCapabilities::APPEND_TO)?;
        if data.datatype() != self.datatype {
            return Err(VgError::IllegalArgument);
        }
        let decoded = decode_commands(commands)?;
        if coords_needed(&decoded) != data.len() {
            return Err(VgError::IllegalArgument);
        }
        if !self.coords.extend(data) {
            return Err(VgError::IllegalArgument);
        }
        self.commands.extend(decoded);
        self.cache.invalidate();
        Ok(())
    }

    /// Appends commands with user-space `f32` coordinates, encoding them into
    /// the path datatype.
    pub fn append_f32(&mut self, commands: &[Command], data: &[f32]) -> Result<(), VgError> {
        self.require(PathCapabilities::APPEND_TO)?;
        if coords_needed(commands) != data.len() {
            return Err(VgError::IllegalArgument);
        }
        self.coords.extend_encoded(data, self.scale, self.bias);
        self.commands.extend_from_slice(commands);
        self.cache.invalidate();
        Ok(())
    }

    /// Appends every segment of `src`, re-encoding its decoded coordinates.
    pub fn append_path(&mut self, src: &Path) -> Result<(), VgError> {
        src.require(PathCapabilities::APPEND_FROM)?;
        self.require(PathCapabilities::APPEND_TO)?;
        let values: Vec<f32> = (0..src.coord_count()).map(|i| src.coord(i)).collect();
        self.coords.extend_encoded(&values, self.scale, self.bias);
        self.commands.extend_from_slice(&src.commands);
        self.cache.invalidate();
        Ok(())
    }

    /// Appends a copy of the path's own segments.
    pub fn append_self(&mut self) -> Result<(), VgError> {
        self.require(PathCapabilities::APPEND_FROM | PathCapabilities::APPEND_TO)?;
        let values: Vec<f32> = (0..self.coord_count()).map(|i| self.coord(i)).collect();
        let commands = self.commands.clone();
        self.coords.extend_encoded(&values, self.scale, self.bias);
        self.commands.extend_from_slice(&commands);
        self.cache.invalidate();
        Ok(())
    }

    /// Removes all segments. Capabilities are left untouched.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.coords.truncate(0);
        self.cache.invalidate();
    }

    /// Normalized absolute segments (see [`Segments`]).
    #[inline]
    pub fn segments(&self) -> Segments<'_> {
        Segments::new(self)
    }
}

fn decode_commands(bytes: &[u8]) -> Result<Vec<Command>, VgError> {
    bytes
        .iter()
        .map(|&b| Command::from_byte(b).ok_or(VgError::IllegalArgument))
        .collect()
}

fn coords_needed(commands: &[Command]) -> usize {
    commands.iter().map(|c| c.coord_count()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Segment;

    fn bytes(cmds: &[Command]) -> Vec<u8> {
        cmds.iter().map(|c| c.to_byte()).collect()
    }

    // ── creation ──────────────────────────────────────────────────────────

    #[test]
    fn zero_scale_is_rejected() {
        let err = Path::new(PathDatatype::F32, 0.0, 0.0, PathCapabilities::ALL).unwrap_err();
        assert_eq!(err, VgError::IllegalArgument);
    }

    // ── append ────────────────────────────────────────────────────────────

    #[test]
    fn append_decodes_with_scale_and_bias() {
        let mut p = Path::new(PathDatatype::S16, 0.5, 10.0, PathCapabilities::ALL).unwrap();
        let cmds = bytes(&[Command::abs(Segment::MoveTo)]);
        p.append(&cmds, PathData::S16(&[4, -2])).unwrap();
        assert_eq!(p.coord(0), 12.0);
        assert_eq!(p.coord(1), 9.0);
    }

    #[test]
    fn append_rejects_mismatched_datatype() {
        let mut p = Path::new(PathDatatype::S8, 1.0, 0.0, PathCapabilities::ALL).unwrap();
        let cmds = bytes(&[Command::abs(Segment::MoveTo)]);
        assert_eq!(p.append(&cmds, PathData::F32(&[0.0, 0.0])), Err(VgError::IllegalArgument));
        assert_eq!(p.segment_count(), 0);
    }

    #[test]
    fn append_is_atomic_on_bad_command_byte() {
        let mut p = Path::with_defaults();
        let err = p.append(&[2, 99], PathData::F32(&[0.0, 0.0]));
        assert_eq!(err, Err(VgError::IllegalArgument));
        assert_eq!(p.segment_count(), 0);
        assert_eq!(p.coord_count(), 0);
    }

    #[test]
    fn append_rejects_short_data() {
        let mut p = Path::with_defaults();
        let cmds = bytes(&[Command::abs(Segment::MoveTo), Command::abs(Segment::LineTo)]);
        assert_eq!(p.append(&cmds, PathData::F32(&[0.0, 0.0, 1.0])), Err(VgError::IllegalArgument));
    }

    #[test]
    fn append_requires_capability() {
        let mut p = Path::with_defaults();
        p.remove_capabilities(PathCapabilities::APPEND_TO);
        let err = p.append_f32(&[Command::abs(Segment::MoveTo)], &[0.0, 0.0]);
        assert_eq!(err, Err(VgError::PathCapability));
    }

    #[test]
    fn float_encoder_rounds_for_integer_paths() {
        let mut p = Path::new(PathDatatype::S32, 2.0, 1.0, PathCapabilities::ALL).unwrap();
        p.append_f32(&[Command::abs(Segment::MoveTo)], &[4.0, -4.0]).unwrap();
        // (4 - 1) / 2 = 1.5 rounds to 2; (-4 - 1) / 2 = -2.5 rounds to -2.
        assert_eq!(p.coord(0), 5.0);
        assert_eq!(p.coord(1), -3.0);
    }

    #[test]
    fn integer_encoding_saturates() {
        let mut p = Path::new(PathDatatype::S8, 1.0, 0.0, PathCapabilities::ALL).unwrap();
        p.append_f32(&[Command::abs(Segment::MoveTo)], &[1000.0, -1000.0]).unwrap();
        assert_eq!(p.coord(0), 127.0);
        assert_eq!(p.coord(1), -128.0);
    }

    // ── append_path / clear ───────────────────────────────────────────────

    #[test]
    fn append_path_reencodes_values() {
        let mut src = Path::new(PathDatatype::S8, 2.0, 0.0, PathCapabilities::ALL).unwrap();
        src.append_f32(&[Command::abs(Segment::MoveTo)], &[10.0, 20.0]).unwrap();
        let mut dst = Path::with_defaults();
        dst.append_path(&src).unwrap();
        assert_eq!(dst.segment_count(), 1);
        assert_eq!((dst.coord(0), dst.coord(1)), (10.0, 20.0));
    }

    #[test]
    fn append_path_requires_source_capability() {
        let mut src = Path::with_defaults();
        src.remove_capabilities(PathCapabilities::APPEND_FROM);
        let mut dst = Path::with_defaults();
        assert_eq!(dst.append_path(&src), Err(VgError::PathCapability));
    }

    #[test]
    fn clear_keeps_capabilities() {
        let mut p = Path::with_defaults();
        p.remove_capabilities(PathCapabilities::PATH_LENGTH);
        p.append_f32(&[Command::abs(Segment::MoveTo)], &[1.0, 1.0]).unwrap();
        p.clear();
        assert_eq!(p.segment_count(), 0);
        assert!(!p.capabilities().contains(PathCapabilities::PATH_LENGTH));
    }
}
