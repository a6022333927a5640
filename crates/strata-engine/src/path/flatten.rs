//! Adaptive curve flattening.
//!
//! Curves are subdivided with bounded explicit stacks rather than recursion.
//! Each stack slot holds one sub-curve; a flat (or depth-capped) sub-curve
//! emits its end point and is popped, otherwise it is split in half with the
//! left half pushed on top. The bottom slot never emits its end point: the
//! caller appends the segment end itself, flagged as a segment boundary.

use crate::coords::{Matrix, Rect, Vec2};

use super::process::{ArcGeometry, Geometry};
use super::Path;

/// Maximum subdivision depth for any curve.
pub const MAX_SUBDIVISION_DEPTH: usize = 16;

/// Default flatness tolerance in flattening-space units.
pub const DEFAULT_FLATNESS: f32 = 0.1;

/// Default cap on vertices produced for one path.
pub const DEFAULT_MAX_VERTICES: usize = 1 << 20;

/// Per-vertex flag bits.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct VertexFlags(u8);

impl VertexFlags {
    pub const NONE: Self = Self(0);
    /// Vertex ends an input segment (joins are placed here).
    pub const SEGEND: Self = Self(1);
    /// Vertex closes its contour back to the start point.
    pub const CLOSE: Self = Self(2);

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for VertexFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Vertex {
    pub point: Vec2,
    pub flags: VertexFlags,
}

/// Entry of the contour table: a contiguous run of vertices.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Contour {
    pub start: usize,
    pub len: usize,
    pub closed: bool,
}

impl Contour {
    #[inline]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.len
    }
}

/// Flattened path: vertices plus the contour table describing them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tessellation {
    vertices: Vec<Vertex>,
    contours: Vec<Contour>,
}

impl Tessellation {
    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[inline]
    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    #[inline]
    pub fn contour_vertices(&self, contour: &Contour) -> &[Vertex] {
        &self.vertices[contour.range()]
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.contours.clear();
    }

    /// Tight bounds of all vertices; the zero rect when empty.
    pub fn bounds(&self) -> Rect {
        Rect::bounding(self.vertices.iter().map(|v| v.point))
    }

    /// Applies `m` to every vertex in place.
    pub fn transform(&mut self, m: &Matrix) {
        for v in &mut self.vertices {
            v.point = m.transform_point(v.point);
        }
    }

    /// True when contours tile the vertex list exactly, in order.
    pub fn is_consistent(&self) -> bool {
        let mut next = 0;
        for c in &self.contours {
            if c.start != next || c.len == 0 {
                return false;
            }
            next = c.start + c.len;
        }
        next == self.vertices.len()
    }

    fn begin_contour(&mut self, p: Vec2) {
        self.contours.push(Contour { start: self.vertices.len(), len: 0, closed: false });
        self.push(p, VertexFlags::NONE);
    }

    fn push(&mut self, p: Vec2, flags: VertexFlags) {
        debug_assert!(!self.contours.is_empty(), "vertex pushed without an open contour");
        self.vertices.push(Vertex { point: p, flags });
        if let Some(c) = self.contours.last_mut() {
            c.len += 1;
        }
    }

    fn close_contour(&mut self) {
        if let Some(c) = self.contours.last_mut() {
            c.closed = true;
        }
    }
}

/// Flattening parameters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FlattenParams {
    pub tolerance: f32,
    pub max_vertices: usize,
}

impl Default for FlattenParams {
    fn default() -> Self {
        Self { tolerance: DEFAULT_FLATNESS, max_vertices: DEFAULT_MAX_VERTICES }
    }
}

/// Flattens `path` into `out`.
///
/// With `transform`, every control point is mapped into that space before
/// subdivision so the tolerance is measured there. Returns `false` when the
/// vertex cap cut the tessellation short.
pub fn flatten(path: &Path, transform: Option<&Matrix>, params: FlattenParams, out: &mut Tessellation) -> bool {
    out.clear();
    let tp = |p: Vec2| transform.map_or(p, |m| m.transform_point(p));
    let tv = |v: Vec2| transform.map_or(v, |m| m.transform_vector(v));
    let tol = params.tolerance;
    let room = |out: &Tessellation, n: usize| out.vertices.len() + n <= params.max_vertices;

    for seg in path.segments() {
        match seg.geometry {
            Geometry::Move { to } => {
                if !room(out, 1) {
                    return truncated(params);
                }
                out.begin_contour(tp(to));
            }
            Geometry::Line { to, .. } => {
                if !room(out, 1) {
                    return truncated(params);
                }
                out.push(tp(to), VertexFlags::SEGEND);
            }
            Geometry::Close { to, .. } => {
                if !room(out, 1) {
                    return truncated(params);
                }
                out.push(tp(to), VertexFlags::SEGEND | VertexFlags::CLOSE);
                out.close_contour();
            }
            Geometry::Quad { from, ctrl, to } => {
                let ok = subdivide_quad([tp(from), tp(ctrl), tp(to)], tol, &mut |p| {
                    room(out, 2) && {
                        out.push(p, VertexFlags::NONE);
                        true
                    }
                });
                if !ok || !room(out, 1) {
                    return truncated(params);
                }
                out.push(tp(to), VertexFlags::SEGEND);
            }
            Geometry::Cubic { from, ctrl1, ctrl2, to } => {
                let pts = [tp(from), tp(ctrl1), tp(ctrl2), tp(to)];
                let ok = subdivide_cubic(pts, tol, &mut |p| {
                    room(out, 2) && {
                        out.push(p, VertexFlags::NONE);
                        true
                    }
                });
                if !ok || !room(out, 1) {
                    return truncated(params);
                }
                out.push(tp(to), VertexFlags::SEGEND);
            }
            Geometry::Arc { from, arc, to } => {
                let arc = ArcGeometry { center: tp(arc.center), ux: tv(arc.ux), uy: tv(arc.uy), ..arc };
                let ok = subdivide_arc(&arc, tp(from), tp(to), tol, &mut |p| {
                    room(out, 2) && {
                        out.push(p, VertexFlags::NONE);
                        true
                    }
                });
                if !ok || !room(out, 1) {
                    return truncated(params);
                }
                out.push(tp(to), VertexFlags::SEGEND);
            }
        }
    }

    debug_assert!(out.is_consistent());
    true
}

fn truncated(params: FlattenParams) -> bool {
    log::warn!("path flattening stopped at the {}-vertex limit", params.max_vertices);
    false
}

/// Subdivides a quadratic bezier, emitting interior points in order.
///
/// `emit` returns `false` to abort; the function then returns `false`.
pub(crate) fn subdivide_quad(p: [Vec2; 3], tol: f32, emit: &mut impl FnMut(Vec2) -> bool) -> bool {
    let mut stack = [[Vec2::zero(); 3]; MAX_SUBDIVISION_DEPTH];
    let mut top = 0usize;
    stack[0] = p;

    loop {
        let [p1, p2, p3] = stack[top];
        let dev = p2 - (p1 + p3) * 0.5;
        if dev.x.abs() + dev.y.abs() <= tol || top == MAX_SUBDIVISION_DEPTH - 1 {
            if top == 0 {
                return true;
            }
            if !emit(p3) {
                return false;
            }
            top -= 1;
        } else {
            let c1 = (p1 + p2) * 0.5;
            let c3 = (p2 + p3) * 0.5;
            let c2 = (c1 + c3) * 0.5;
            stack[top] = [c2, c3, p3];
            top += 1;
            stack[top] = [p1, c1, c2];
        }
    }
}

/// Subdivides a cubic bezier; see [`subdivide_quad`].
pub(crate) fn subdivide_cubic(p: [Vec2; 4], tol: f32, emit: &mut impl FnMut(Vec2) -> bool) -> bool {
    let mut stack = [[Vec2::zero(); 4]; MAX_SUBDIVISION_DEPTH];
    let mut top = 0usize;
    stack[0] = p;

    loop {
        let [p1, p2, p3, p4] = stack[top];
        let a = p2 * 3.0 - p1 * 2.0 - p4;
        let b = p3 * 3.0 - p4 * 2.0 - p1;
        let flat = (a.x * a.x).max(b.x * b.x) + (a.y * a.y).max(b.y * b.y);
        if flat <= tol || top == MAX_SUBDIVISION_DEPTH - 1 {
            if top == 0 {
                return true;
            }
            if !emit(p4) {
                return false;
            }
            top -= 1;
        } else {
            let c1 = (p1 + p2) * 0.5;
            let mm = (p2 + p3) * 0.5;
            let c6 = (p3 + p4) * 0.5;
            let c2 = (c1 + mm) * 0.5;
            let c5 = (mm + c6) * 0.5;
            let c3 = (c2 + c5) * 0.5;
            stack[top] = [c3, c5, c6, p4];
            top += 1;
            stack[top] = [p1, c1, c2, c3];
        }
    }
}

/// Subdivides an arc between angles `arc.a1` and `arc.a2`.
///
/// A flat sub-arc emits its angular midpoint; a non-bottom one also emits its
/// end point.
pub(crate) fn subdivide_arc(
    arc: &ArcGeometry,
    from: Vec2,
    to: Vec2,
    tol: f32,
    emit: &mut impl FnMut(Vec2) -> bool,
) -> bool {
    #[derive(Copy, Clone)]
    struct Sub {
        p1: Vec2,
        a1: f32,
        p2: Vec2,
        a2: f32,
    }

    let mut stack = [Sub { p1: from, a1: 0.0, p2: to, a2: 0.0 }; MAX_SUBDIVISION_DEPTH];
    let mut top = 0usize;
    stack[0] = Sub { p1: from, a1: arc.a1, p2: to, a2: arc.a2 };

    loop {
        let s = stack[top];
        let am = (s.a1 + s.a2) * 0.5;
        let mid = arc.point_at(am);
        let dev = mid - (s.p1 + s.p2) * 0.5;
        if dev.x.abs() + dev.y.abs() <= tol || top == MAX_SUBDIVISION_DEPTH - 1 {
            if !emit(mid) {
                return false;
            }
            if top == 0 {
                return true;
            }
            if !emit(s.p2) {
                return false;
            }
            top -= 1;
        } else {
            stack[top] = Sub { p1: mid, a1: am, p2: s.p2, a2: s.a2 };
            top += 1;
            stack[top] = Sub { p1: s.p1, a1: s.a1, p2: mid, a2: am };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::{Command, Segment, builder};

    fn flat(path: &Path) -> Tessellation {
        let mut out = Tessellation::default();
        assert!(flatten(path, None, FlattenParams::default(), &mut out));
        out
    }

    fn points(t: &Tessellation) -> Vec<Vec2> {
        t.vertices().iter().map(|v| v.point).collect()
    }

    // ── rectangles ────────────────────────────────────────────────────────

    #[test]
    fn rect_flattens_to_its_corners() {
        let mut p = Path::with_defaults();
        builder::rect(&mut p, 20.0, 15.0, 60.0, 45.0).unwrap();
        let t = flat(&p);
        let pts = points(&t);
        assert_eq!(&pts[..4], &[
            Vec2::new(20.0, 15.0),
            Vec2::new(80.0, 15.0),
            Vec2::new(80.0, 60.0),
            Vec2::new(20.0, 60.0),
        ]);
        // The close vertex returns to the start.
        assert_eq!(pts[4], Vec2::new(20.0, 15.0));
        assert!(t.vertices()[4].flags.contains(VertexFlags::CLOSE));
        assert_eq!(t.contours(), &[Contour { start: 0, len: 5, closed: true }]);
    }

    #[test]
    fn bounds_are_tight() {
        let mut p = Path::with_defaults();
        builder::rect(&mut p, 20.0, 15.0, 60.0, 45.0).unwrap();
        assert_eq!(flat(&p).bounds(), Rect::new(20.0, 15.0, 60.0, 45.0));
    }

    #[test]
    fn empty_path_has_zero_bounds() {
        assert_eq!(flat(&Path::with_defaults()).bounds(), Rect::default());
    }

    // ── contour table ─────────────────────────────────────────────────────

    #[test]
    fn contour_lengths_match_vertex_runs() {
        let mut p = Path::with_defaults();
        builder::rect(&mut p, 0.0, 0.0, 10.0, 10.0).unwrap();
        builder::ellipse(&mut p, 50.0, 50.0, 30.0, 20.0).unwrap();
        builder::line(&mut p, 0.0, 0.0, 5.0, 5.0).unwrap();
        let t = flat(&p);
        assert_eq!(t.contours().len(), 3);
        assert!(t.is_consistent());
        let total: usize = t.contours().iter().map(|c| c.len).sum();
        assert_eq!(total, t.vertices().len());
        assert!(!t.contours()[2].closed);
    }

    // ── curves ────────────────────────────────────────────────────────────

    #[test]
    fn degenerate_cubic_terminates() {
        let mut p = Path::with_defaults();
        p.append_f32(
            &[Command::abs(Segment::MoveTo), Command::abs(Segment::CubicTo)],
            &[5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0],
        )
        .unwrap();
        let t = flat(&p);
        assert_eq!(t.vertices().len(), 2);
    }

    #[test]
    fn depth_cap_bounds_vertex_count() {
        let mut p = Path::with_defaults();
        p.append_f32(
            &[Command::abs(Segment::MoveTo), Command::abs(Segment::CubicTo)],
            &[0.0, 0.0, 1e6, 1e6, -1e6, 1e6, 0.0, 0.0],
        )
        .unwrap();
        let mut out = Tessellation::default();
        let params = FlattenParams { tolerance: 0.0, ..FlattenParams::default() };
        assert!(flatten(&p, None, params, &mut out));
        assert!(out.vertices().len() <= (1 << (MAX_SUBDIVISION_DEPTH - 1)) + 2);
    }

    #[test]
    fn nan_control_points_terminate() {
        let mut emitted = 0;
        let nan = Vec2::new(f32::NAN, f32::NAN);
        subdivide_quad([Vec2::zero(), nan, Vec2::new(1.0, 0.0)], 0.1, &mut |_| {
            emitted += 1;
            true
        });
        assert!(emitted < 1 << MAX_SUBDIVISION_DEPTH);
    }

    #[test]
    fn quad_points_lie_within_control_hull() {
        let mut pts = Vec::new();
        subdivide_quad([Vec2::zero(), Vec2::new(50.0, 100.0), Vec2::new(100.0, 0.0)], 0.1, &mut |p| {
            pts.push(p);
            true
        });
        assert!(!pts.is_empty());
        assert!(pts.iter().all(|p| p.y >= 0.0 && p.y <= 50.0 && p.x > 0.0 && p.x < 100.0));
        assert!(pts.windows(2).all(|w| w[0].x < w[1].x));
    }

    #[test]
    fn arc_points_lie_on_circle() {
        let mut p = Path::with_defaults();
        builder::ellipse(&mut p, 0.0, 0.0, 20.0, 20.0).unwrap();
        let t = flat(&p);
        assert!(t.vertices().len() > 8);
        for v in t.vertices() {
            assert!((v.point.length() - 10.0).abs() < 1e-3, "{:?}", v.point);
        }
    }

    #[test]
    fn surface_space_flattening_transforms_points() {
        let mut p = Path::with_defaults();
        builder::rect(&mut p, 0.0, 0.0, 10.0, 10.0).unwrap();
        let m = Matrix::affine(2.0, 0.0, 5.0, 0.0, 2.0, 5.0);
        let mut out = Tessellation::default();
        assert!(flatten(&p, Some(&m), FlattenParams::default(), &mut out));
        assert_eq!(out.bounds(), Rect::new(5.0, 5.0, 20.0, 20.0));
    }

    // ── vertex cap ────────────────────────────────────────────────────────

    #[test]
    fn vertex_cap_truncates_cleanly() {
        let mut p = Path::with_defaults();
        builder::ellipse(&mut p, 0.0, 0.0, 200.0, 200.0).unwrap();
        let mut out = Tessellation::default();
        let params = FlattenParams { tolerance: 0.01, max_vertices: 10 };
        assert!(!flatten(&p, None, params, &mut out));
        assert!(out.vertices().len() <= 10);
        assert!(out.is_consistent());
    }
}
