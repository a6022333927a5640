//! Convenience shape builders that append onto an existing path.
//!
//! All coordinates are user-space floats; they go through the path's float
//! encoder, so integer paths receive rounded data.

use std::f32::consts::PI;

use crate::context::VgError;
use crate::coords::Vec2;

use super::command::{Command, Segment};
use super::Path;

/// How [`arc`] finishes the outline.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum ArcKind {
    /// The arc alone.
    #[default]
    Open,
    /// Closed by a straight chord.
    Chord,
    /// Closed through the center.
    Pie,
}

pub fn line(path: &mut Path, x0: f32, y0: f32, x1: f32, y1: f32) -> Result<(), VgError> {
    path.append_f32(
        &[Command::abs(Segment::MoveTo), Command::abs(Segment::LineTo)],
        &[x0, y0, x1, y1],
    )
}

/// Polyline through `points`, closed when `closed`. Empty input is illegal.
pub fn polygon(path: &mut Path, points: &[Vec2], closed: bool) -> Result<(), VgError> {
    if points.is_empty() {
        return Err(VgError::IllegalArgument);
    }
    let mut cmds = Vec::with_capacity(points.len() + 1);
    cmds.push(Command::abs(Segment::MoveTo));
    cmds.extend(std::iter::repeat_n(Command::abs(Segment::LineTo), points.len() - 1));
    if closed {
        cmds.push(Command::CLOSE);
    }
    let data: Vec<f32> = points.iter().flat_map(|p| [p.x, p.y]).collect();
    path.append_f32(&cmds, &data)
}

pub fn rect(path: &mut Path, x: f32, y: f32, width: f32, height: f32) -> Result<(), VgError> {
    if !(width > 0.0 && height > 0.0) {
        return Err(VgError::IllegalArgument);
    }
    path.append_f32(
        &[
            Command::abs(Segment::MoveTo),
            Command::rel(Segment::HLineTo),
            Command::rel(Segment::VLineTo),
            Command::rel(Segment::HLineTo),
            Command::CLOSE,
        ],
        &[x, y, width, height, -width],
    )
}

/// Rectangle with elliptical corners of total size `arc_w × arc_h`
/// (clamped to the rectangle).
pub fn round_rect(
    path: &mut Path,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    arc_w: f32,
    arc_h: f32,
) -> Result<(), VgError> {
    if !(width > 0.0 && height > 0.0) {
        return Err(VgError::IllegalArgument);
    }
    let arc_w = arc_w.clamp(0.0, width);
    let arc_h = arc_h.clamp(0.0, height);
    let (rx, ry) = (arc_w / 2.0, arc_h / 2.0);
    let (hw, hh) = (width - arc_w, height - arc_h);

    let h = Command::rel(Segment::HLineTo);
    let v = Command::rel(Segment::VLineTo);
    let a = Command::rel(Segment::SccwArcTo);
    path.append_f32(
        &[Command::abs(Segment::MoveTo), h, a, v, a, h, a, v, a, Command::CLOSE],
        &[
            x + rx, y,
            hw, rx, ry, 0.0, rx, ry,
            hh, rx, ry, 0.0, -rx, ry,
            -hw, rx, ry, 0.0, -rx, -ry,
            -hh, rx, ry, 0.0, rx, -ry,
        ],
    )
}

/// Ellipse centered at `(cx, cy)` built from two half arcs.
pub fn ellipse(path: &mut Path, cx: f32, cy: f32, width: f32, height: f32) -> Result<(), VgError> {
    if !(width > 0.0 && height > 0.0) {
        return Err(VgError::IllegalArgument);
    }
    let (rx, ry) = (width / 2.0, height / 2.0);
    let a = Command::rel(Segment::SccwArcTo);
    path.append_f32(
        &[Command::abs(Segment::MoveTo), a, a, Command::CLOSE],
        &[cx + rx, cy, rx, ry, 0.0, -width, 0.0, rx, ry, 0.0, width, 0.0],
    )
}

/// Elliptical arc around `(x, y)` from `start_deg` sweeping `extent_deg`
/// (positive is counter-clockwise). Sweeps are split into half turns so each
/// arc segment is unambiguous.
pub fn arc(
    path: &mut Path,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    start_deg: f32,
    extent_deg: f32,
    kind: ArcKind,
) -> Result<(), VgError> {
    if !(width > 0.0 && height > 0.0) {
        return Err(VgError::IllegalArgument);
    }
    let (rx, ry) = (width / 2.0, height / 2.0);
    let start = start_deg.to_radians();
    let last = start + extent_deg.to_radians();
    let at = |a: f32| [x + a.cos() * rx, y + a.sin() * ry];

    let mut cmds = vec![Command::abs(Segment::MoveTo)];
    let mut data = at(start).to_vec();

    let (seg, step) = if extent_deg > 0.0 { (Segment::SccwArcTo, PI) } else { (Segment::ScwArcTo, -PI) };
    let mut a = start + step;
    while (step > 0.0 && a < last) || (step < 0.0 && a > last) {
        cmds.push(Command::abs(seg));
        data.extend([rx, ry, 0.0]);
        data.extend(at(a));
        a += step;
    }
    cmds.push(Command::abs(seg));
    data.extend([rx, ry, 0.0]);
    data.extend(at(last));

    match kind {
        ArcKind::Open => {}
        ArcKind::Chord => cmds.push(Command::CLOSE),
        ArcKind::Pie => {
            cmds.extend([Command::abs(Segment::LineTo), Command::CLOSE]);
            data.extend([x, y]);
        }
    }
    path.append_f32(&cmds, &data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::{flatten, FlattenParams, Tessellation};
    use crate::coords::Rect;

    fn bounds(p: &Path) -> Rect {
        let mut t = Tessellation::default();
        flatten(p, None, FlattenParams::default(), &mut t);
        t.bounds()
    }

    fn near_rect(a: Rect, b: Rect) -> bool {
        let d = |x: f32, y: f32| (x - y).abs() < 1e-2;
        d(a.origin.x, b.origin.x) && d(a.origin.y, b.origin.y) && d(a.size.x, b.size.x) && d(a.size.y, b.size.y)
    }

    // ── validation ────────────────────────────────────────────────────────

    #[test]
    fn non_positive_sizes_are_illegal() {
        let mut p = Path::with_defaults();
        assert_eq!(rect(&mut p, 0.0, 0.0, 0.0, 5.0), Err(VgError::IllegalArgument));
        assert_eq!(ellipse(&mut p, 0.0, 0.0, 5.0, -1.0), Err(VgError::IllegalArgument));
        assert_eq!(round_rect(&mut p, 0.0, 0.0, 5.0, f32::NAN, 1.0, 1.0), Err(VgError::IllegalArgument));
        assert_eq!(polygon(&mut p, &[], true), Err(VgError::IllegalArgument));
        assert_eq!(p.segment_count(), 0);
    }

    // ── shapes ────────────────────────────────────────────────────────────

    #[test]
    fn polygon_commands() {
        let mut p = Path::with_defaults();
        let pts = [Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0), Vec2::new(4.0, 3.0)];
        polygon(&mut p, &pts, true).unwrap();
        assert_eq!(p.segment_count(), 4);
        assert_eq!(p.commands()[3], Command::CLOSE);
        polygon(&mut p, &pts, false).unwrap();
        assert_eq!(p.segment_count(), 7);
    }

    #[test]
    fn round_rect_stays_inside_its_box() {
        let mut p = Path::with_defaults();
        round_rect(&mut p, 10.0, 10.0, 100.0, 50.0, 20.0, 10.0).unwrap();
        assert_eq!(p.segment_count(), 10);
        assert!(near_rect(bounds(&p), Rect::new(10.0, 10.0, 100.0, 50.0)));
    }

    #[test]
    fn ellipse_bounds() {
        let mut p = Path::with_defaults();
        ellipse(&mut p, 50.0, 40.0, 30.0, 20.0).unwrap();
        assert!(near_rect(bounds(&p), Rect::new(35.0, 30.0, 30.0, 20.0)));
    }

    #[test]
    fn pie_arc_returns_to_center() {
        let mut p = Path::with_defaults();
        arc(&mut p, 0.0, 0.0, 20.0, 20.0, 0.0, 90.0, ArcKind::Pie).unwrap();
        let cmds = p.commands();
        assert_eq!(cmds.len(), 4);
        assert_eq!(cmds[2], Command::abs(Segment::LineTo));
        assert!(near_rect(bounds(&p), Rect::new(0.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn long_arc_is_split_into_half_turns() {
        let mut p = Path::with_defaults();
        arc(&mut p, 0.0, 0.0, 20.0, 20.0, 0.0, 270.0, ArcKind::Open).unwrap();
        assert_eq!(p.segment_count(), 3);
        arc(&mut p, 0.0, 0.0, 20.0, 20.0, 0.0, -400.0, ArcKind::Chord).unwrap();
        assert_eq!(p.segment_count(), 3 + 1 + 3 + 1);
    }
}
