//! Segment normalization.
//!
//! Turns the raw command stream into absolute, simplified geometry:
//! relative coordinates become absolute, horizontal/vertical lines become
//! plain lines, smooth curves get their reflected control point, and arcs are
//! converted from endpoint form to center form.

use std::f32::consts::TAU;

use crate::coords::Vec2;

use super::command::Segment;
use super::Path;

/// Center parametrization of an elliptical arc.
///
/// A point at angle `a` is `center + ux·cos(a) + uy·sin(a)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ArcGeometry {
    pub center: Vec2,
    pub ux: Vec2,
    pub uy: Vec2,
    pub a1: f32,
    pub a2: f32,
}

impl ArcGeometry {
    #[inline]
    pub fn point_at(&self, angle: f32) -> Vec2 {
        let (s, c) = angle.sin_cos();
        self.center + self.ux * c + self.uy * s
    }
}

/// Absolute segment geometry.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Geometry {
    Move { to: Vec2 },
    Line { from: Vec2, to: Vec2 },
    Quad { from: Vec2, ctrl: Vec2, to: Vec2 },
    Cubic { from: Vec2, ctrl1: Vec2, ctrl2: Vec2, to: Vec2 },
    Arc { from: Vec2, arc: ArcGeometry, to: Vec2 },
    Close { from: Vec2, to: Vec2 },
}

impl Geometry {
    /// Point the segment ends at.
    #[inline]
    pub fn end(&self) -> Vec2 {
        match *self {
            Geometry::Move { to }
            | Geometry::Line { to, .. }
            | Geometry::Quad { to, .. }
            | Geometry::Cubic { to, .. }
            | Geometry::Arc { to, .. }
            | Geometry::Close { to, .. } => to,
        }
    }
}

/// One normalized segment.
///
/// `index` is the command it came from. Implicit moves (inserted before a
/// drawing command that has no open contour) carry the index of that command
/// and `implicit == true`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Processed {
    pub index: usize,
    pub implicit: bool,
    pub geometry: Geometry,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum LastCurve {
    Quad,
    Cubic,
    Other,
}

/// Iterator over a path's normalized segments.
///
/// A close with no open contour (a leading close or a repeated close) yields
/// nothing. A drawing command following a close, or opening the path, is
/// preceded by an implicit move to the current point.
pub struct Segments<'a> {
    path: &'a Path,
    cmd: usize,
    coord: usize,
    pen: Vec2,
    start: Vec2,
    ctrl: Vec2,
    last: LastCurve,
    open: bool,
    pending: Option<Processed>,
}

impl<'a> Segments<'a> {
    pub(crate) fn new(path: &'a Path) -> Self {
        Self {
            path,
            cmd: 0,
            coord: 0,
            pen: Vec2::zero(),
            start: Vec2::zero(),
            ctrl: Vec2::zero(),
            last: LastCurve::Other,
            open: false,
            pending: None,
        }
    }

    #[inline]
    fn c(&self, base: usize, k: usize) -> f32 {
        self.path.coord(base + k)
    }

    #[inline]
    fn pt(&self, base: usize, k: usize, rel: Vec2) -> Vec2 {
        Vec2::new(self.c(base, k), self.c(base, k + 1)) + rel
    }
}

impl Iterator for Segments<'_> {
    type Item = Processed;

    fn next(&mut self) -> Option<Processed> {
        if let Some(p) = self.pending.take() {
            return Some(p);
        }

        loop {
            let cmd = *self.path.commands().get(self.cmd)?;
            let index = self.cmd;
            let base = self.coord;
            self.cmd += 1;
            self.coord += cmd.coord_count();

            let pen = self.pen;
            let rel = if cmd.relative { pen } else { Vec2::zero() };
            let mut last = LastCurve::Other;
            let mut ctrl = None;

            let geometry = match cmd.segment {
                Segment::Close => {
                    if !self.open {
                        continue;
                    }
                    self.open = false;
                    Geometry::Close { from: pen, to: self.start }
                }
                Segment::MoveTo => {
                    let to = self.pt(base, 0, rel);
                    self.start = to;
                    self.open = true;
                    Geometry::Move { to }
                }
                Segment::LineTo => Geometry::Line { from: pen, to: self.pt(base, 0, rel) },
                Segment::HLineTo => {
                    Geometry::Line { from: pen, to: Vec2::new(self.c(base, 0) + rel.x, pen.y) }
                }
                Segment::VLineTo => {
                    Geometry::Line { from: pen, to: Vec2::new(pen.x, self.c(base, 0) + rel.y) }
                }
                Segment::QuadTo | Segment::SQuadTo => {
                    let (c, to) = if cmd.segment == Segment::QuadTo {
                        (self.pt(base, 0, rel), self.pt(base, 2, rel))
                    } else {
                        let c = if self.last == LastCurve::Quad { pen * 2.0 - self.ctrl } else { pen };
                        (c, self.pt(base, 0, rel))
                    };
                    last = LastCurve::Quad;
                    ctrl = Some(c);
                    Geometry::Quad { from: pen, ctrl: c, to }
                }
                Segment::CubicTo | Segment::SCubicTo => {
                    let (c1, c2, to) = if cmd.segment == Segment::CubicTo {
                        (self.pt(base, 0, rel), self.pt(base, 2, rel), self.pt(base, 4, rel))
                    } else {
                        let c1 = if self.last == LastCurve::Cubic { pen * 2.0 - self.ctrl } else { pen };
                        (c1, self.pt(base, 0, rel), self.pt(base, 2, rel))
                    };
                    last = LastCurve::Cubic;
                    ctrl = Some(c2);
                    Geometry::Cubic { from: pen, ctrl1: c1, ctrl2: c2, to }
                }
                seg => {
                    let to = self.pt(base, 3, rel);
                    let (rh, rv, rot) = (self.c(base, 0), self.c(base, 1), self.c(base, 2));
                    match centralize_arc(seg, rh, rv, rot, pen, to) {
                        Some(arc) => Geometry::Arc { from: pen, arc, to },
                        None => Geometry::Line { from: pen, to },
                    }
                }
            };

            let end = geometry.end();
            self.pen = end;
            self.ctrl = ctrl.unwrap_or(end);
            self.last = last;

            let processed = Processed { index, implicit: false, geometry };
            if !self.open {
                if matches!(geometry, Geometry::Close { .. }) {
                    return Some(processed);
                }
                // Drawing without an open contour starts one at the pen.
                self.open = true;
                self.start = pen;
                self.pending = Some(processed);
                return Some(Processed { index, implicit: true, geometry: Geometry::Move { to: pen } });
            }
            return Some(processed);
        }
    }
}

/// Converts an endpoint-form arc to center form.
///
/// Returns `None` when the arc degenerates to a line (a zero radius or
/// coincident endpoints). Radii too small to span the endpoints are scaled up
/// uniformly until they do.
pub fn centralize_arc(
    segment: Segment,
    rh: f32,
    rv: f32,
    rot_degrees: f32,
    p1: Vec2,
    p2: Vec2,
) -> Option<ArcGeometry> {
    let (mut rh, mut rv) = (rh.abs(), rv.abs());
    if rh == 0.0 || rv == 0.0 || p1 == p2 || !(rh.is_finite() && rv.is_finite()) {
        return None;
    }

    let rot = rot_degrees.to_radians();
    let to_unit = |p: Vec2, rh: f32, rv: f32| {
        let r = p.rotated(-rot);
        Vec2::new(r.x / rh, r.y / rv)
    };

    let mut u1 = to_unit(p1, rh, rv);
    let mut u2 = to_unit(p2, rh, rv);
    let mut d = u2 - u1;
    let mut dsq = d.dot(d);
    if !(dsq > 0.0) {
        return None;
    }

    let mut disc = 1.0 / dsq - 0.25;
    if disc < 0.0 {
        let grow = dsq.sqrt() * 0.5;
        rh *= grow;
        rv *= grow;
        u1 = to_unit(p1, rh, rv);
        u2 = to_unit(p2, rh, rv);
        d = u2 - u1;
        dsq = d.dot(d);
        disc = (1.0 / dsq - 0.25).max(0.0);
    }

    let s = disc.sqrt();
    let mid = (u1 + u2) * 0.5;
    let ca = Vec2::new(mid.x + s * d.y, mid.y - s * d.x);
    let cb = Vec2::new(mid.x - s * d.y, mid.y + s * d.x);

    let ccw = matches!(segment, Segment::SccwArcTo | Segment::LccwArcTo);
    let large = matches!(segment, Segment::LccwArcTo | Segment::LcwArcTo);
    let c = if ccw != large { cb } else { ca };

    let v1 = u1 - c;
    let v2 = u2 - c;
    let a1 = v1.y.atan2(v1.x);
    let mut a2 = v2.y.atan2(v2.x);
    if ccw && a2 <= a1 {
        a2 += TAU;
    } else if !ccw && a2 >= a1 {
        a2 -= TAU;
    }

    let back = |v: Vec2| v.rotated(rot);
    Some(ArcGeometry {
        center: back(Vec2::new(c.x * rh, c.y * rv)),
        ux: back(Vec2::new(rh, 0.0)),
        uy: back(Vec2::new(0.0, rv)),
        a1,
        a2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Command;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-3
    }

    fn path(cmds: &[Command], data: &[f32]) -> Path {
        let mut p = Path::with_defaults();
        p.append_f32(cmds, data).unwrap();
        p
    }

    // ── normalization ─────────────────────────────────────────────────────

    #[test]
    fn relative_and_axis_lines_become_absolute_lines() {
        let p = path(
            &[
                Command::abs(Segment::MoveTo),
                Command::rel(Segment::HLineTo),
                Command::rel(Segment::VLineTo),
                Command::rel(Segment::LineTo),
            ],
            &[1.0, 2.0, 3.0, 4.0, -1.0, -1.0],
        );
        let ends: Vec<Vec2> = p.segments().map(|s| s.geometry.end()).collect();
        assert_eq!(ends, vec![
            Vec2::new(1.0, 2.0),
            Vec2::new(4.0, 2.0),
            Vec2::new(4.0, 6.0),
            Vec2::new(3.0, 5.0),
        ]);
    }

    #[test]
    fn path_without_leading_move_starts_at_origin() {
        let p = path(&[Command::abs(Segment::LineTo)], &[5.0, 5.0]);
        let segs: Vec<Processed> = p.segments().collect();
        assert_eq!(segs.len(), 2);
        assert!(segs[0].implicit);
        assert_eq!(segs[0].geometry, Geometry::Move { to: Vec2::zero() });
        assert_eq!(segs[1].index, 0);
    }

    #[test]
    fn drawing_after_close_reopens_at_contour_start() {
        let p = path(
            &[
                Command::abs(Segment::MoveTo),
                Command::abs(Segment::LineTo),
                Command::CLOSE,
                Command::abs(Segment::LineTo),
            ],
            &[1.0, 1.0, 5.0, 1.0, 1.0, 9.0],
        );
        let segs: Vec<Processed> = p.segments().collect();
        assert_eq!(segs[3].geometry, Geometry::Move { to: Vec2::new(1.0, 1.0) });
        assert!(segs[3].implicit);
        assert_eq!(segs[4].geometry, Geometry::Line { from: Vec2::new(1.0, 1.0), to: Vec2::new(1.0, 9.0) });
    }

    #[test]
    fn repeated_close_is_dropped() {
        let p = path(
            &[Command::abs(Segment::MoveTo), Command::abs(Segment::LineTo), Command::CLOSE, Command::CLOSE],
            &[0.0, 0.0, 1.0, 0.0],
        );
        assert_eq!(p.segments().count(), 3);
    }

    #[test]
    fn smooth_quad_reflects_previous_control() {
        let p = path(
            &[Command::abs(Segment::MoveTo), Command::abs(Segment::QuadTo), Command::abs(Segment::SQuadTo)],
            &[0.0, 0.0, 1.0, 1.0, 2.0, 0.0, 4.0, 0.0],
        );
        let segs: Vec<Processed> = p.segments().collect();
        match segs[2].geometry {
            Geometry::Quad { ctrl, .. } => assert_eq!(ctrl, Vec2::new(3.0, -1.0)),
            other => panic!("expected quad, got {other:?}"),
        }
    }

    #[test]
    fn smooth_cubic_without_previous_cubic_uses_pen() {
        let p = path(
            &[Command::abs(Segment::MoveTo), Command::abs(Segment::SCubicTo)],
            &[1.0, 1.0, 2.0, 2.0, 3.0, 1.0],
        );
        let segs: Vec<Processed> = p.segments().collect();
        match segs[1].geometry {
            Geometry::Cubic { ctrl1, .. } => assert_eq!(ctrl1, Vec2::new(1.0, 1.0)),
            other => panic!("expected cubic, got {other:?}"),
        }
    }

    // ── arcs ──────────────────────────────────────────────────────────────

    #[test]
    fn small_ccw_quarter_arc_is_centered_at_origin() {
        let arc = centralize_arc(Segment::SccwArcTo, 1.0, 1.0, 0.0, Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0))
            .unwrap();
        assert!(close(arc.center, Vec2::zero()));
        assert!((arc.a2 - arc.a1 - std::f32::consts::FRAC_PI_2).abs() < 1e-4);
    }

    #[test]
    fn large_ccw_arc_sweeps_three_quarters() {
        let arc = centralize_arc(Segment::LccwArcTo, 1.0, 1.0, 0.0, Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0))
            .unwrap();
        assert!(close(arc.center, Vec2::new(1.0, 1.0)));
        assert!((arc.a2 - arc.a1 - 1.5 * std::f32::consts::PI).abs() < 1e-4);
    }

    #[test]
    fn clockwise_arc_has_decreasing_angle() {
        let arc = centralize_arc(Segment::ScwArcTo, 1.0, 1.0, 0.0, Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0))
            .unwrap();
        assert!(arc.a2 < arc.a1);
    }

    #[test]
    fn endpoints_lie_on_the_arc() {
        let p1 = Vec2::new(3.0, 1.0);
        let p2 = Vec2::new(-2.0, 4.0);
        let arc = centralize_arc(Segment::LcwArcTo, 4.0, 2.5, 30.0, p1, p2).unwrap();
        assert!(close(arc.point_at(arc.a1), p1));
        assert!(close(arc.point_at(arc.a2), p2));
    }

    #[test]
    fn undersized_radii_are_scaled_up() {
        let p1 = Vec2::new(0.0, 0.0);
        let p2 = Vec2::new(10.0, 0.0);
        let arc = centralize_arc(Segment::SccwArcTo, 1.0, 1.0, 0.0, p1, p2).unwrap();
        assert!((arc.ux.length() - 5.0).abs() < 1e-3);
        assert!(close(arc.center, Vec2::new(5.0, 0.0)));
    }

    #[test]
    fn zero_radius_arc_degenerates_to_line() {
        let p = path(&[Command::abs(Segment::MoveTo), Command::abs(Segment::SccwArcTo)], &[0.0, 0.0, 0.0, 3.0, 0.0, 4.0, 4.0]);
        let segs: Vec<Processed> = p.segments().collect();
        assert!(matches!(segs[1].geometry, Geometry::Line { .. }));
    }
}
