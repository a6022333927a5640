//! Path objects and the geometry engine.
//!
//! - [`Path`]: encoded segment commands with typed coordinate storage
//! - [`Segments`]: normalization to absolute lines, curves and center-form arcs
//! - [`flatten`]: adaptive subdivision into a [`Tessellation`] (vertices plus
//!   contour table)
//! - [`path_length`] / [`point_along_path`]: distance queries
//! - [`builder`]: line, polygon, rect, round rect, ellipse and arc helpers

pub mod builder;
mod command;
mod flatten;
mod measure;
mod path;
mod process;

pub use command::{Command, PathCapabilities, PathData, PathDatatype, Segment};
pub use flatten::{
    flatten, Contour, FlattenParams, Tessellation, Vertex, VertexFlags, DEFAULT_FLATNESS,
    DEFAULT_MAX_VERTICES, MAX_SUBDIVISION_DEPTH,
};
pub use measure::{path_length, point_along_path, quad_length, PathPoint};
pub use path::Path;
pub use process::{centralize_arc, ArcGeometry, Geometry, Processed, Segments};
