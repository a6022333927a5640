use std::f32::consts::PI;

use crate::coords::Vec2;
use crate::path::{Tessellation, Vertex, VertexFlags};

use super::dash::{DashCursor, DashPattern};
use super::{CapStyle, JoinStyle, StrokeStyle};

/// Angular step of round joins and caps.
const ROUND_STEP: f32 = PI / 12.0;
/// Fan triangles in a round cap (a half turn).
const ROUND_CAP_STEPS: u32 = 12;
/// Hard ceiling on dash entries walked along one edge. Bounds the geometry a
/// very fine pattern can emit; the rest of the edge is skipped.
pub const MAX_DASH_STEPS: usize = 4096;

/// Expands a flattened path into a triangle soup (three points per
/// triangle) covering the stroke outline.
///
/// Every edge becomes a quad; joins, caps and dashes add triangles or quads.
/// Contours with fewer than two vertices produce nothing, as does a
/// non-positive width.
pub fn stroke(tess: &Tessellation, style: &StrokeStyle) -> Vec<Vec2> {
    let mut out = Vec::new();
    if !(style.width > 0.0) {
        return out;
    }

    let mut s = Stroker {
        out: &mut out,
        style,
        half: style.width * 0.5,
        dash: style.dash_pattern(),
        cursor: None,
        walked: 0.0,
        dprev: Vec2::zero(),
    };
    for (n, contour) in tess.contours().iter().enumerate() {
        let verts = tess.contour_vertices(contour);
        if verts.len() <= 1 {
            continue;
        }
        s.contour(verts, contour.closed, n == 0);
    }

    debug_assert_eq!(out.len() % 3, 0);
    out
}

/// Offset geometry of one polyline edge.
#[derive(Debug, Copy, Clone)]
struct Edge {
    p1: Vec2,
    p2: Vec2,
    norm: f32,
    /// Unit direction.
    d: Vec2,
    /// Left perpendicular scaled to half the width.
    t: Vec2,
}

impl Edge {
    #[inline]
    fn l1(&self) -> Vec2 {
        self.p1 + self.t
    }
    #[inline]
    fn r1(&self) -> Vec2 {
        self.p1 - self.t
    }
    #[inline]
    fn l2(&self) -> Vec2 {
        self.p2 + self.t
    }
    #[inline]
    fn r2(&self) -> Vec2 {
        self.p2 - self.t
    }
}

struct Stroker<'a> {
    out: &'a mut Vec<Vec2>,
    style: &'a StrokeStyle,
    half: f32,
    dash: Option<DashPattern>,
    cursor: Option<DashCursor>,
    /// Stroke distance walked since the dash cursor was last reset.
    walked: f32,
    /// Direction reused by zero-length edges.
    dprev: Vec2,
}

impl Stroker<'_> {
    fn edge(&self, a: &Vertex, b: &Vertex) -> Edge {
        let delta = b.point - a.point;
        let norm = delta.length();
        let d = if norm == 0.0 { self.dprev } else { delta / norm };
        Edge { p1: a.point, p2: b.point, norm, d, t: d.perp() * self.half }
    }

    fn dash_on(&self) -> bool {
        self.cursor.is_none_or(|c| c.on)
    }

    fn contour(&mut self, verts: &[Vertex], closed: bool, first: bool) {
        if let Some(pattern) = &self.dash {
            if first || self.style.dash_phase_reset || self.cursor.is_none() {
                self.cursor = Some(DashCursor::at_phase(pattern, self.style.dash_phase));
                self.walked = 0.0;
            }
        }

        let dashing = self.dash.is_some();
        let last = verts.len() - 1;
        let start_on = self.dash_on();
        let mut end_on = start_on;
        let mut prev: Option<Edge> = None;

        for i in 0..last {
            let e = self.edge(&verts[i], &verts[i + 1]);
            let end = i + 1 == last;

            if let Some(p) = prev {
                if self.dash_on() {
                    if verts[i].flags.contains(VertexFlags::SEGEND) {
                        self.join(&p, &e);
                    } else {
                        self.bevel(&p, &e);
                    }
                }
            }

            if dashing && i == 0 && start_on && !closed {
                self.cap(e.p1, e.t, true);
            }

            if dashing {
                end_on = self.dash_edge(&e, end);
            } else {
                self.quad(e.l2(), e.l1(), e.r1(), e.r2());
            }

            if end && end_on && !closed {
                self.cap(e.p2, e.t, false);
            }

            self.walked += e.norm;
            self.dprev = e.d;
            prev = Some(e);
        }

        let first_edge = self.edge(&verts[0], &verts[1]);
        if !closed {
            if !dashing {
                self.cap(first_edge.p1, first_edge.t, true);
            }
            return;
        }
        // A closed contour only has ends where a dash starts or stops at the
        // first vertex.
        match (start_on, end_on, prev) {
            (true, true, Some(p)) => self.join(&p, &first_edge),
            (true, false, _) => self.cap(first_edge.p1, first_edge.t, true),
            (false, true, Some(p)) => self.cap(p.p2, p.t, false),
            _ => {}
        }
    }

    /// Join at `e.p1` between the previous edge `p` and `e`.
    fn join(&mut self, p: &Edge, e: &Edge) {
        let cross = e.t.cross(p.t);
        match self.style.join {
            JoinStyle::Round => {
                if cross >= 0.0 {
                    self.round_join(e.p1, p.l2(), p.t, e.l1(), e.t);
                } else {
                    self.round_join(e.p1, e.r1(), -e.t, p.r2(), -p.t);
                }
            }
            JoinStyle::Miter => {
                let miter = 1.0 / (e.t.angle_to(p.t) * 0.5).cos();
                if miter <= self.style.miter_limit {
                    if cross > 0.0 {
                        let x = intersect(p.l2(), p.d, e.l1(), e.d);
                        self.quad(x, p.l2(), e.p1, e.l1());
                    } else if cross < 0.0 {
                        let x = intersect(p.r2(), p.d, e.r1(), e.d);
                        self.quad(x, p.r2(), e.p1, e.r1());
                    }
                } else {
                    self.bevel(p, e);
                }
            }
            JoinStyle::Bevel => self.bevel(p, e),
        }
    }

    /// Single triangle closing the outer gap between `p` and `e`.
    fn bevel(&mut self, p: &Edge, e: &Edge) {
        let cross = e.t.cross(p.t);
        if cross > 0.0 {
            self.tri(e.l1(), p.l2(), e.p1);
        } else if cross < 0.0 {
            self.tri(e.r1(), p.r2(), e.p1);
        }
    }

    /// Fan around `c` from `from` (offset `t_from`) clockwise to `to`.
    fn round_join(&mut self, c: Vec2, from: Vec2, t_from: Vec2, to: Vec2, t_to: Vec2) {
        let angle = t_from.angle_to(t_to);
        let mut a1 = from;
        let mut k = 0u32;
        while (k as f32) * ROUND_STEP < angle {
            let a2 = c + t_from.rotated(-(k as f32) * ROUND_STEP);
            self.tri(a1, a2, c);
            a1 = a2;
            k += 1;
        }
        self.tri(a1, to, c);
    }

    /// Cap at `c`. `t` is the edge's left offset; start caps face backward.
    fn cap(&mut self, c: Vec2, t: Vec2, start: bool) {
        let tt = if start { -t } else { t };
        match self.style.cap {
            CapStyle::Butt => {}
            CapStyle::Round => {
                let mut a1 = c + tt;
                for k in 1..=ROUND_CAP_STEPS {
                    let a2 = c + tt.rotated(-(k as f32) * ROUND_STEP);
                    self.tri(a1, a2, c);
                    a1 = a2;
                }
            }
            CapStyle::Square => {
                let q1 = c + tt;
                let q2 = q1 + Vec2::new(tt.y, -tt.x);
                let q3 = q2 - tt * 2.0;
                let q4 = q3 + Vec2::new(-tt.y, tt.x);
                self.quad(q1, q2, q3, q4);
            }
        }
    }

    /// Emits the "on" parts of `e` under the current dash cursor, capping
    /// every dash boundary crossed.
    ///
    /// Returns whether the dash covering the end of the edge is on. A
    /// boundary exactly at the end of the contour (`last`) is crossed without
    /// a cap; the contour end decides it.
    fn dash_edge(&mut self, e: &Edge, last: bool) -> bool {
        let Some(mut cursor) = self.cursor else {
            return true;
        };
        if e.norm == 0.0 {
            return cursor.on;
        }
        let Some(pattern) = self.dash.take() else {
            return true;
        };

        let edge_end = self.walked + e.norm;
        let (mut l1, mut r1) = (e.l1(), e.r1());
        let limit = pattern.max_steps(e.norm).min(MAX_DASH_STEPS);
        let mut ended_on = cursor.on;
        let mut steps = 0;

        loop {
            let next = cursor.end(&pattern);
            let k = ((next - self.walked) / e.norm).min(1.0);
            let p = e.p1 + (e.p2 - e.p1) * k;
            let (l2, r2) = (p + e.t, p - e.t);

            if cursor.on {
                self.quad(l2, l1, r1, r2);
            }
            ended_on = cursor.on;

            if next <= edge_end {
                cursor.advance(&pattern);
                l1 = l2;
                r1 = r2;
                if !(last && next == edge_end) {
                    self.cap(p, e.t, cursor.on);
                }
            }

            if next >= edge_end {
                break;
            }
            steps += 1;
            if steps >= limit {
                log::warn!("dash walk stopped after {limit} steps on a {:.3}-unit edge", e.norm);
                // Skip whole cycles so the next edge starts near its own distance.
                let behind = (edge_end - cursor.start) / pattern.cycle();
                if behind.is_finite() && behind > 0.0 {
                    cursor.start += behind.floor() * pattern.cycle();
                }
                ended_on = cursor.on;
                break;
            }
        }

        self.cursor = Some(cursor);
        self.dash = Some(pattern);
        ended_on
    }

    #[inline]
    fn tri(&mut self, a: Vec2, b: Vec2, c: Vec2) {
        self.out.extend([a, b, c]);
    }

    /// Quad as two triangles `(p1, p2, p3)` and `(p3, p4, p1)`.
    #[inline]
    fn quad(&mut self, p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2) {
        self.out.extend([p1, p2, p3, p3, p4, p1]);
    }
}

/// Intersection of lines `o1 + s·d1` and `o2 + u·d2`; `o1` when parallel.
fn intersect(o1: Vec2, d1: Vec2, o2: Vec2, d2: Vec2) -> Vec2 {
    let denom = d1.cross(d2);
    if denom.abs() <= f32::EPSILON {
        return o1;
    }
    let s = (o2 - o1).cross(d2) / denom;
    o1 + d1 * s
}
