//! Path length and point-at-distance queries.
//!
//! Both work on a window of `num` segment commands starting at `start`, in
//! the path's own coordinate system.

use crate::context::VgError;
use crate::coords::Vec2;

use super::command::{PathCapabilities, Segment};
use super::flatten::{subdivide_arc, subdivide_cubic, subdivide_quad};
use super::process::Geometry;
use super::Path;

/// Position and unit tangent at a distance along a path.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PathPoint {
    pub point: Vec2,
    pub tangent: Vec2,
}

impl PathPoint {
    /// Value reported for a window with no drawable segments.
    pub const EMPTY: PathPoint = PathPoint { point: Vec2::new(0.0, 0.0), tangent: Vec2::new(1.0, 0.0) };
}

/// Length of segments `start..start + num`.
///
/// Lines and closes contribute their exact length, quadratics the
/// closed-form arc length, cubics and arcs the length of their flattened
/// polyline; moves contribute nothing.
pub fn path_length(path: &Path, start: usize, num: usize, tolerance: f32) -> Result<f32, VgError> {
    path.require(PathCapabilities::PATH_LENGTH)?;
    if num == 0 || start >= path.segment_count() || start.saturating_add(num) > path.segment_count() {
        return Err(VgError::IllegalArgument);
    }
    let window = start..start + num;

    let mut sum = 0.0f32;
    for seg in path.segments().filter(|s| !s.implicit && window.contains(&s.index)) {
        sum += match seg.geometry {
            Geometry::Move { .. } => 0.0,
            Geometry::Line { from, to } | Geometry::Close { from, to } => from.distance(to),
            Geometry::Quad { from, ctrl, to } => quad_length(from, ctrl, to, tolerance),
            Geometry::Cubic { from, ctrl1, ctrl2, to } => {
                let mut poly = vec![from];
                subdivide_cubic([from, ctrl1, ctrl2, to], tolerance, &mut |p| {
                    poly.push(p);
                    true
                });
                poly.push(to);
                polyline_length(&poly)
            }
            Geometry::Arc { from, arc, to } => {
                let mut poly = vec![from];
                subdivide_arc(&arc, from, to, tolerance, &mut |p| {
                    poly.push(p);
                    true
                });
                poly.push(to);
                polyline_length(&poly)
            }
        };
    }
    Ok(sum)
}

/// Closed-form arc length of a quadratic bezier.
///
/// Falls back to the flattened polyline where the formula degenerates.
pub fn quad_length(p0: Vec2, p1: Vec2, p2: Vec2, tolerance: f32) -> f32 {
    let a = p0 - p1 * 2.0 + p2;
    let b = (p1 - p0) * 2.0;
    let aa = 4.0 * a.dot(a);
    if aa <= f32::EPSILON {
        return p0.distance(p2);
    }
    let bb = 4.0 * a.dot(b);
    let cc = b.dot(b);

    let sabc = 2.0 * (aa + bb + cc).sqrt();
    let a2 = aa.sqrt();
    let a32 = 2.0 * aa * a2;
    let c2 = 2.0 * cc.sqrt();
    let ba = bb / a2;

    let len = (a32 * sabc
        + a2 * bb * (sabc - c2)
        + (4.0 * cc * aa - bb * bb) * ((2.0 * a2 + ba + sabc) / (ba + c2)).ln())
        / (4.0 * a32);
    if len.is_finite() {
        return len;
    }

    let mut poly = vec![p0];
    subdivide_quad([p0, p1, p2], tolerance, &mut |p| {
        poly.push(p);
        true
    });
    poly.push(p2);
    polyline_length(&poly)
}

fn polyline_length(points: &[Vec2]) -> f32 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// One flattened vertex with its distance from the window start.
#[derive(Debug, Copy, Clone)]
struct Station {
    point: Vec2,
    distance: f32,
    /// Inside a curve (not a segment boundary): tangent is the average of
    /// the neighbouring edge directions.
    interior: bool,
}

/// Point and tangent at `distance` along segments `start..start + num`.
///
/// `outputs` names the results wanted: [`PathCapabilities::POINT_ALONG_PATH`]
/// for the point, [`PathCapabilities::TANGENT_ALONG_PATH`] for the tangent.
/// Each one needs only its own capability; a result not asked for holds the
/// [`PathPoint::EMPTY`] value. Move segments at either end of the window are
/// skipped; if nothing drawable remains, [`PathPoint::EMPTY`] is returned.
/// Distances outside the window's length clamp to its first or last vertex.
pub fn point_along_path(
    path: &Path,
    start: usize,
    num: usize,
    distance: f32,
    tolerance: f32,
    outputs: PathCapabilities,
) -> Result<PathPoint, VgError> {
    let outputs = outputs.intersection(PathCapabilities::POINT_ALONG_PATH | PathCapabilities::TANGENT_ALONG_PATH);
    path.require(outputs)?;
    if num == 0 || start.saturating_add(num) > path.segment_count() {
        return Err(VgError::IllegalArgument);
    }

    let found = locate(path, start, num, distance, tolerance);
    Ok(PathPoint {
        point: if outputs.contains(PathCapabilities::POINT_ALONG_PATH) { found.point } else { PathPoint::EMPTY.point },
        tangent: if outputs.contains(PathCapabilities::TANGENT_ALONG_PATH) {
            found.tangent
        } else {
            PathPoint::EMPTY.tangent
        },
    })
}

fn locate(path: &Path, start: usize, num: usize, distance: f32, tolerance: f32) -> PathPoint {
    let commands = path.commands();
    let (mut lo, mut hi) = (start, start + num);
    while lo < hi && commands[lo].segment == Segment::MoveTo {
        lo += 1;
    }
    while hi > lo && commands[hi - 1].segment == Segment::MoveTo {
        hi -= 1;
    }
    if lo == hi {
        return PathPoint::EMPTY;
    }

    let stations = stations(path, lo..hi, tolerance);
    let (Some(first), Some(last)) = (stations.first(), stations.last()) else {
        return PathPoint::EMPTY;
    };

    if distance <= 0.0 || stations.len() == 1 {
        return PathPoint { point: first.point, tangent: tangent_at(&stations, 0, true) };
    }
    if distance >= last.distance {
        let i = stations.len() - 1;
        return PathPoint { point: last.point, tangent: tangent_at(&stations, i, false) };
    }

    // First station strictly beyond `distance`; its predecessor brackets it.
    let end = stations.partition_point(|s| s.distance <= distance);
    let begin = end - 1;
    let (s0, s1) = (stations[begin], stations[end]);
    let span = s1.distance - s0.distance;
    let r = if span > 0.0 { (distance - s0.distance) / span } else { 0.0 };

    let t0 = tangent_at(&stations, begin, true);
    let t1 = tangent_at(&stations, end, false);
    let tangent = t0.lerp(t1, r).normalized().unwrap_or(t1);
    PathPoint { point: s0.point.lerp(s1.point, r), tangent }
}

fn stations(path: &Path, window: std::ops::Range<usize>, tolerance: f32) -> Vec<Station> {
    let mut out: Vec<Station> = Vec::new();
    let mut total = 0.0f32;
    let mut broken = true;

    let mut push = |out: &mut Vec<Station>, p: Vec2, interior: bool, broken: &mut bool| {
        if *broken {
            // A move breaks continuity: the jump adds no distance.
            out.push(Station { point: p, distance: total, interior: false });
            *broken = false;
            return;
        }
        if let Some(prev) = out.last() {
            total += prev.point.distance(p);
        }
        out.push(Station { point: p, distance: total, interior });
    };

    for seg in path.segments().filter(|s| window.contains(&s.index)) {
        let from = match seg.geometry {
            Geometry::Move { .. } => {
                broken = true;
                continue;
            }
            Geometry::Line { from, .. }
            | Geometry::Close { from, .. }
            | Geometry::Quad { from, .. }
            | Geometry::Cubic { from, .. }
            | Geometry::Arc { from, .. } => from,
        };
        if broken {
            push(&mut out, from, false, &mut broken);
        }

        let mut interior = Vec::new();
        match seg.geometry {
            Geometry::Quad { from, ctrl, to } => {
                subdivide_quad([from, ctrl, to], tolerance, &mut |p| {
                    interior.push(p);
                    true
                });
            }
            Geometry::Cubic { from, ctrl1, ctrl2, to } => {
                subdivide_cubic([from, ctrl1, ctrl2, to], tolerance, &mut |p| {
                    interior.push(p);
                    true
                });
            }
            Geometry::Arc { from, arc, to } => {
                subdivide_arc(&arc, from, to, tolerance, &mut |p| {
                    interior.push(p);
                    true
                });
            }
            _ => {}
        }
        for p in interior {
            push(&mut out, p, true, &mut broken);
        }
        push(&mut out, seg.geometry.end(), false, &mut broken);
    }
    out
}

/// Tangent at station `i`. Interior curve stations average their two edge
/// directions; boundary stations use the edge on the requested side
/// (`outgoing`), falling back to the other side at the ends.
fn tangent_at(stations: &[Station], i: usize, outgoing: bool) -> Vec2 {
    let edge = |a: usize, b: usize| -> Option<Vec2> {
        let (pa, pb) = (stations.get(a)?, stations.get(b)?);
        // Edges across a continuity break carry no distance.
        if pb.distance <= pa.distance {
            return None;
        }
        (pb.point - pa.point).normalized()
    };
    let incoming = if i > 0 { edge(i - 1, i) } else { None };
    let outgoing_dir = edge(i, i + 1);

    if stations[i].interior {
        if let (Some(a), Some(b)) = (incoming, outgoing_dir) {
            if let Some(avg) = (a + b).normalized() {
                return avg;
            }
        }
    }
    let pick = if outgoing { outgoing_dir.or(incoming) } else { incoming.or(outgoing_dir) };
    pick.unwrap_or(PathPoint::EMPTY.tangent)
}
