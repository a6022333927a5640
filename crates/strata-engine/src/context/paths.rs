use crate::coords::Rect;
use crate::path::{self, Path, PathCapabilities, PathData, PathDatatype, PathPoint};
use crate::render::update_fill;

use super::context::Context;
use super::error::VgError;
use super::PathHandle;

impl Context {
    /// Registers a new empty path.
    pub fn create_path(
        &mut self,
        datatype: PathDatatype,
        scale: f32,
        bias: f32,
        capabilities: PathCapabilities,
    ) -> Option<PathHandle> {
        let path = self.errors.check(Path::new(datatype, scale, bias, capabilities))?;
        Some(self.paths.insert(path))
    }

    pub fn destroy_path(&mut self, h: PathHandle) {
        if self.paths.remove(h).is_none() {
            self.errors.record(VgError::BadHandle);
        }
    }

    #[inline]
    pub fn path(&self, h: PathHandle) -> Option<&Path> {
        self.paths.get(h)
    }

    /// Runs `f` on the path, routing its error into the error slot. Used
    /// with the [`path::builder`] functions.
    pub fn with_path<T>(&mut self, h: PathHandle, f: impl FnOnce(&mut Path) -> Result<T, VgError>) -> Option<T> {
        let Some(path) = self.paths.get_mut(h) else {
            self.errors.record(VgError::BadHandle);
            return None;
        };
        let result = f(path);
        self.errors.check(result)
    }

    /// Appends encoded command bytes with coordinates in the path datatype.
    pub fn append_path_data(&mut self, h: PathHandle, commands: &[u8], data: PathData<'_>) {
        self.with_path(h, |p| p.append(commands, data));
    }

    /// Appends the segments of `src` to `dst`; the two may be the same path.
    pub fn append_path(&mut self, dst: PathHandle, src: PathHandle) {
        if dst == src {
            self.with_path(dst, Path::append_self);
            return;
        }
        let Some((d, s)) = self.paths.get_pair(dst, src) else {
            self.errors.record(VgError::BadHandle);
            return;
        };
        let result = d.append_path(s);
        self.errors.check(result);
    }

    /// Removes every segment, keeping datatype and capabilities.
    pub fn clear_path(&mut self, h: PathHandle) {
        self.with_path(h, |p| {
            p.clear();
            Ok(())
        });
    }

    pub fn remove_path_capabilities(&mut self, h: PathHandle, caps: PathCapabilities) {
        self.with_path(h, |p| {
            p.remove_capabilities(caps);
            Ok(())
        });
    }

    /// Capabilities of `h`, or none for an invalid handle.
    pub fn path_capabilities(&mut self, h: PathHandle) -> PathCapabilities {
        self.with_path(h, |p| Ok(p.capabilities())).unwrap_or(PathCapabilities::NONE)
    }

    /// Tight user-space bounds of the flattened path; an empty path yields a
    /// zero rect.
    pub fn path_bounds(&mut self, h: PathHandle) -> Option<Rect> {
        let params = self.flatten_params();
        let transform = self.state.path_matrix;
        self.with_path(h, |p| {
            p.require(PathCapabilities::PATH_BOUNDS)?;
            update_fill(p, &transform, params);
            Ok(p.cache.bounds())
        })
    }

    /// Bounds of the path after the path-user-to-surface transform.
    pub fn path_transformed_bounds(&mut self, h: PathHandle) -> Option<Rect> {
        let params = self.flatten_params();
        let transform = self.state.path_matrix;
        self.with_path(h, |p| {
            p.require(PathCapabilities::PATH_TRANSFORMED_BOUNDS)?;
            update_fill(p, &transform, params);
            let tess = p.cache.tessellation();
            if tess.is_empty() {
                return Ok(Rect::default());
            }
            Ok(Rect::bounding(p.cache.bounds().corners().map(|c| transform.transform_point(c))))
        })
    }

    /// Length of segments `start..start + num`, or `-1.0` on error.
    pub fn path_length(&mut self, h: PathHandle, start: usize, num: usize) -> f32 {
        let tolerance = self.config.flatness;
        self.with_path(h, |p| path::path_length(p, start, num, tolerance)).unwrap_or(-1.0)
    }

    /// Position and unit tangent at `distance` along segments `start..start + num`.
    ///
    /// `outputs` selects the point, the tangent or both; each needs its own
    /// path capability.
    pub fn point_along_path(
        &mut self,
        h: PathHandle,
        start: usize,
        num: usize,
        distance: f32,
        outputs: PathCapabilities,
    ) -> Option<PathPoint> {
        let tolerance = self.config.flatness;
        self.with_path(h, |p| path::point_along_path(p, start, num, distance, tolerance, outputs))
    }
}
