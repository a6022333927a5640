//! Coordinate and geometry types shared by the geometry engine and renderers.
//!
//! Canonical space follows the vector-graphics convention:
//! - user space is mapped to surface pixels by a 3×3 [`Matrix`]
//! - surface origin bottom-left, +X right, +Y up
//!
//! Renderers convert surface coordinates to NDC in shaders using a viewport uniform.

mod matrix;
mod rect;
mod vec2;
mod viewport;

pub use matrix::Matrix;
pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::Viewport;
