//! Rendering context: drawing state, object registries and the draw API.
//!
//! Paths, paints and images live in generational arenas owned by the
//! [`Context`] and are addressed by copyable handles. Every public operation
//! validates locally; failures land in the context's error slot.

mod arena;
mod config;
#[allow(clippy::module_inception)]
mod context;
mod draw;
mod error;
mod images;
mod paints;
mod paths;
mod state;

pub use arena::{Arena, Handle};
pub use config::{ContextConfig, GradientMapping};
pub use context::Context;
pub use error::{ErrorSlot, VgError};
pub use state::{FillRule, ImageMode, MatrixMode, PaintModes, RenderingQuality, MAX_SCISSOR_RECTS};

use crate::image::Image;
use crate::paint::Paint;
use crate::path::Path;

pub type PathHandle = Handle<Path>;
pub type PaintHandle = Handle<Paint>;
pub type ImageHandle = Handle<Image>;
