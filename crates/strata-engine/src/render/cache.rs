use crate::coords::{Matrix, Rect, Vec2};
use crate::path::{flatten, FlattenParams, Path, Tessellation};
use crate::stroke::{stroke, StrokeStyle};

/// Relative scale change tolerated before a path is re-flattened.
const RESCALE_TOLERANCE: f32 = 0.01;

/// Flattened geometry cached on a path between draws.
///
/// The tessellation is produced in surface space (so flatness is measured in
/// pixels) and mapped back to user space. It stays valid while the path is
/// untouched and the path-to-surface scale stays within 1% of the one it was
/// built for. The stroke mesh is derived from the tessellation and is reused
/// only for undashed strokes with the same outline parameters.
#[derive(Debug, Default)]
pub struct GeometryCache {
    tess: Tessellation,
    tess_valid: bool,
    transform: Matrix,
    bounds: Rect,

    stroke: Vec<Vec2>,
    stroke_style: Option<StrokeStyle>,
}

impl GeometryCache {
    /// Drops every cached product; the next draw re-flattens.
    pub fn invalidate(&mut self) {
        self.tess_valid = false;
        self.stroke_style = None;
        self.stroke.clear();
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.tess_valid
    }

    #[inline]
    pub fn tessellation(&self) -> &Tessellation {
        &self.tess
    }

    /// User-space bounds of the cached tessellation.
    #[inline]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    #[inline]
    pub fn stroke_mesh(&self) -> &[Vec2] {
        &self.stroke
    }

    /// True when geometry flattened for the cached transform is still
    /// accurate under `transform`.
    pub fn fits(&self, transform: &Matrix) -> bool {
        if !self.tess_valid {
            return false;
        }
        let Some(inv) = self.transform.inverse() else {
            return self.transform == *transform;
        };
        let (sx, sy) = transform.mul(&inv).axis_scales();
        let ok = |s: f32| (s - 1.0).abs() <= RESCALE_TOLERANCE;
        ok(sx) && ok(sy)
    }

    /// Re-flattens `path` unless the cached tessellation still fits.
    /// Returns whether new geometry was produced.
    fn refresh(&mut self, path: &Path, transform: &Matrix, params: FlattenParams) -> bool {
        if self.fits(transform) {
            return false;
        }
        match transform.inverse() {
            Some(inv) => {
                flatten(path, Some(transform), params, &mut self.tess);
                self.tess.transform(&inv);
            }
            None => {
                flatten(path, None, params, &mut self.tess);
            }
        }
        debug_assert!(self.tess.is_consistent());

        self.bounds = self.tess.bounds();
        self.transform = *transform;
        self.tess_valid = true;
        self.stroke_style = None;
        self.stroke.clear();
        true
    }

    fn refresh_stroke(&mut self, style: &StrokeStyle) {
        let reusable = style.dash_pattern().is_none()
            && self.stroke_style.as_ref().is_some_and(|s| s.same_outline(style));
        if reusable {
            return;
        }
        self.stroke = stroke(&self.tess, style);
        self.stroke_style = Some(style.clone());
    }
}

/// Brings `path`'s cached tessellation up to date for `transform`.
pub(crate) fn update_fill(path: &mut Path, transform: &Matrix, params: FlattenParams) -> bool {
    let mut cache = std::mem::take(&mut path.cache);
    let rebuilt = cache.refresh(path, transform, params);
    path.cache = cache;
    rebuilt
}

/// Brings both the tessellation and the stroke mesh up to date.
pub(crate) fn update_stroke(path: &mut Path, transform: &Matrix, params: FlattenParams, style: &StrokeStyle) {
    update_fill(path, transform, params);
    path.cache.refresh_stroke(style);
}
